//! External delivery channels for contamination alerts.

pub mod email;
