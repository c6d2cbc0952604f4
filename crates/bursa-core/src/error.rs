use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Malformed or missing input. The message is safe to echo to clients.
    #[error("{0}")]
    Validation(String),

    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl CoreError {
    pub fn missing_field(field: &str) -> Self {
        CoreError::Validation(format!("Field '{}' wajib diisi", field))
    }
}
