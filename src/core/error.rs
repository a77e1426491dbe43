use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("Model '{0}' not found")]
    ModelNotFound(String),

    #[error("Property '{0}' not found in model '{1}'")]
    PropertyNotFound(String, String),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Coercion error: {0}")]
    Coercion(String),

    #[error("Invalid declaration: {0}")]
    InvalidDeclaration(String),

    #[error("Adapter '{0}' not found")]
    AdapterNotFound(String),

    #[error("Adapter error: {0}")]
    Adapter(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;

impl<T> From<std::sync::PoisonError<T>> for SchemaError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}
