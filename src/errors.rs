use std::fmt::{Display, Formatter};

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum RuntimeErrorCode {
    OperationNotFound,
    SwapNotFound,
    IncomingSwapNotFound,
}

impl Display for RuntimeErrorCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

pub type Error = perro::Error<RuntimeErrorCode>;
pub type Result<T> = std::result::Result<T, Error>;

/// A value that is well formed but names something this library doesn't know how to handle.
///
/// These are never substituted with a default. Callers get them wrapped in
/// [`perro::Error::InvalidInput`].
#[derive(Debug, PartialEq, Eq, Clone, thiserror::Error)]
pub enum DomainError {
    #[error("Unknown debt type: {value}")]
    UnknownDebtType { value: String },
    #[error("Unsupported swap script version: {version}")]
    UnsupportedScriptVersion { version: i64 },
    #[error("Unknown operation status code: {code}")]
    UnknownOperationStatus { code: i64 },
    #[error("Unknown operation direction code: {code}")]
    UnknownOperationDirection { code: i64 },
    #[error("Unknown utxo status: {value}")]
    UnknownUtxoStatus { value: String },
}

impl From<DomainError> for Error {
    fn from(error: DomainError) -> Self {
        perro::Error::InvalidInput {
            msg: error.to_string(),
        }
    }
}
