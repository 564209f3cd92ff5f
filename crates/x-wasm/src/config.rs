/// Module configuration
///
/// `ModuleConfig` is passed once to the contract's init. `Params` are the
/// chain parameters of the module and can later be replaced by governance.

use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::AccountId;
use serde::{Deserialize, Serialize};

use crate::access::{AccessConfig, AccessType};
use crate::address::DEFAULT_BECH32_PREFIX;
use crate::encoder::AUTO_LABEL_PREFIX;
use crate::error::{WasmError, WasmResult};
use crate::registry::MAX_LABEL_SIZE;

/// Longest accepted bech32 prefix. A 20-byte address adds 39 characters
/// (separator, 32 data, 6 checksum), and `"Auto-created by <address>"` must
/// still fit in a contract label.
pub const MAX_BECH32_PREFIX_LEN: usize = MAX_LABEL_SIZE - AUTO_LABEL_PREFIX.len() - 39;

/// Default upper bound on uploaded code (1.2 MB)
pub const DEFAULT_MAX_WASM_CODE_SIZE: u64 = 600 * 1024 * 2;

#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Params {
    /// Who may upload code directly
    pub code_upload_access: AccessConfig,
    /// Instantiate permission given to code uploaded without one
    pub instantiate_default_permission: AccessType,
    pub max_wasm_code_size: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            code_upload_access: AccessConfig::Everybody {},
            instantiate_default_permission: AccessType::Everybody,
            max_wasm_code_size: DEFAULT_MAX_WASM_CODE_SIZE,
        }
    }
}

impl Params {
    pub fn validate(&self, prefix: &str) -> WasmResult<()> {
        self.code_upload_access.validate(prefix)?;
        if self.max_wasm_code_size == 0 {
            return Err(WasmError::InvalidRequest(
                "max_wasm_code_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_prefix() -> String {
    DEFAULT_BECH32_PREFIX.to_string()
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ModuleConfig {
    /// Human-readable part of every identity this module accepts
    #[serde(default = "default_prefix")]
    pub bech32_prefix: String,
    /// Router contract allowed to make direct calls
    pub router: AccountId,
    /// Governance contract allowed to execute proposals
    pub governance: AccountId,
    #[serde(default)]
    pub params: Params,
}

impl ModuleConfig {
    pub fn new(router: AccountId, governance: AccountId) -> Self {
        Self {
            bech32_prefix: default_prefix(),
            router,
            governance,
            params: Params::default(),
        }
    }

    pub fn validate(&self) -> WasmResult<()> {
        let prefix = &self.bech32_prefix;
        if prefix.is_empty()
            || prefix.len() > MAX_BECH32_PREFIX_LEN
            || !prefix.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        {
            return Err(WasmError::InvalidRequest(format!("invalid bech32 prefix {:?}", prefix)));
        }
        self.params.validate(prefix)
    }
}
