/// Error taxonomy for the x/wasm module
///
/// Every registry, encoder and proposal operation returns a `WasmResult`. Errors
/// are never retried here; the caller aborts the enclosing transaction.

use thiserror::Error;

use crate::types::CodeID;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WasmError {
    /// Amount string is not a non-negative integer
    #[error("invalid amount: {0:?}")]
    InvalidAmount(String),
    /// Abstract message variant the encoder does not translate
    #[error("unsupported message kind: {0}")]
    UnsupportedMessageKind(String),
    #[error("wasm byte code cannot be empty")]
    EmptyCode,
    #[error("wasm byte code of {size} bytes exceeds the {max} byte limit")]
    CodeTooLarge { size: usize, max: u64 },
    #[error("code {0} not found")]
    CodeNotFound(CodeID),
    #[error("contract {0} not found")]
    ContractNotFound(String),
    /// Access config or admin check failed
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Access config carries an invalid identity
    #[error("malformed permission: {0}")]
    MalformedPermission(String),
    #[error("invalid address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("invalid denom {0:?}")]
    InvalidDenom(String),
    #[error("invalid proposal: {0}")]
    InvalidProposal(String),
    #[error("invalid genesis: {0}")]
    InvalidGenesis(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("contract {0} already exists")]
    DuplicateContract(String),
}

impl WasmError {
    pub fn invalid_address(address: &str, reason: impl Into<String>) -> Self {
        WasmError::InvalidAddress {
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code, used in logs and by callers that need to
    /// tell data problems from policy problems.
    pub fn kind(&self) -> &'static str {
        match self {
            WasmError::InvalidAmount(_) => "invalid_amount",
            WasmError::UnsupportedMessageKind(_) => "unsupported_message_kind",
            WasmError::EmptyCode => "empty_code",
            WasmError::CodeTooLarge { .. } => "code_too_large",
            WasmError::CodeNotFound(_) => "code_not_found",
            WasmError::ContractNotFound(_) => "contract_not_found",
            WasmError::Unauthorized(_) => "unauthorized",
            WasmError::MalformedPermission(_) => "malformed_permission",
            WasmError::InvalidAddress { .. } => "invalid_address",
            WasmError::InvalidDenom(_) => "invalid_denom",
            WasmError::InvalidProposal(_) => "invalid_proposal",
            WasmError::InvalidGenesis(_) => "invalid_genesis",
            WasmError::InvalidRequest(_) => "invalid_request",
            WasmError::DuplicateContract(_) => "duplicate_contract",
        }
    }
}

/// Result type for x/wasm operations
pub type WasmResult<T> = Result<T, WasmError>;
