#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A reading or configuration value was malformed. No state was changed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Contamination state was found in a combination that should be
    /// unreachable.
    #[error("State invariant violated: {0}")]
    InvariantViolation(String),
}
