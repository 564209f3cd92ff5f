/// Access control for code instantiation and contract administration
///
/// `AccessConfig` says who may instantiate a code. `AuthorizationPolicy` decides
/// whether an actor passes a given check; the registry is always called with a
/// policy so direct calls and governance proposals share one code path.

use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::address::validate_address;
use crate::error::{WasmError, WasmResult};

/// AccessConfig defines instantiation permissions
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccessConfig {
    Nobody {},
    OnlyAddress { address: String },
    Everybody {},
}

impl AccessConfig {
    /// Build an `OnlyAddress` config, rejecting malformed identities
    pub fn only_address(address: &str, prefix: &str) -> WasmResult<Self> {
        let config = AccessConfig::OnlyAddress {
            address: address.to_string(),
        };
        config.validate(prefix)?;
        Ok(config)
    }

    pub fn validate(&self, prefix: &str) -> WasmResult<()> {
        match self {
            AccessConfig::OnlyAddress { address } => validate_address(address, prefix)
                .map_err(|e| WasmError::MalformedPermission(e.to_string())),
            AccessConfig::Nobody {} | AccessConfig::Everybody {} => Ok(()),
        }
    }

    pub fn allowed(&self, actor: &str) -> bool {
        match self {
            AccessConfig::Nobody {} => false,
            AccessConfig::OnlyAddress { address } => address == actor,
            AccessConfig::Everybody {} => true,
        }
    }

    /// True when everything this config permits is also permitted by `other`
    pub fn is_subset_of(&self, other: &AccessConfig) -> bool {
        match (self, other) {
            (AccessConfig::Nobody {}, _) => true,
            (_, AccessConfig::Everybody {}) => true,
            (AccessConfig::OnlyAddress { address }, AccessConfig::OnlyAddress { address: other }) => {
                address == other
            }
            _ => false,
        }
    }
}

/// Access type without an address, used for the default instantiate permission
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    Nobody,
    OnlyAddress,
    Everybody,
}

impl AccessType {
    /// Concrete config for `creator`; `OnlyAddress` binds to the creator
    pub fn with(self, creator: &str) -> AccessConfig {
        match self {
            AccessType::Nobody => AccessConfig::Nobody {},
            AccessType::OnlyAddress => AccessConfig::OnlyAddress {
                address: creator.to_string(),
            },
            AccessType::Everybody => AccessConfig::Everybody {},
        }
    }
}

/// Authorization checks consulted by the registry
pub trait AuthorizationPolicy {
    /// May `creator` upload code under the module's upload config
    fn can_create_code(&self, upload_config: &AccessConfig, creator: &str) -> bool;

    /// May `creator` assign `requested` as the instantiate config of new code
    fn can_assign_instantiate_config(&self, default_config: &AccessConfig, requested: &AccessConfig) -> bool;

    fn can_instantiate_contract(&self, config: &AccessConfig, actor: &str) -> bool;

    /// May `actor` migrate the contract or change its admin
    fn can_modify_contract(&self, admin: Option<&str>, actor: &str) -> bool;

    /// May `actor` change the instantiate config of code uploaded by `creator`
    fn can_modify_code_access_config(&self, creator: &str, actor: &str) -> bool;

    fn name(&self) -> &'static str;
}

/// Checks applied to direct calls
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultAuthorizationPolicy;

impl AuthorizationPolicy for DefaultAuthorizationPolicy {
    fn can_create_code(&self, upload_config: &AccessConfig, creator: &str) -> bool {
        upload_config.allowed(creator)
    }

    fn can_assign_instantiate_config(&self, default_config: &AccessConfig, requested: &AccessConfig) -> bool {
        requested.is_subset_of(default_config)
    }

    fn can_instantiate_contract(&self, config: &AccessConfig, actor: &str) -> bool {
        config.allowed(actor)
    }

    fn can_modify_contract(&self, admin: Option<&str>, actor: &str) -> bool {
        admin == Some(actor)
    }

    fn can_modify_code_access_config(&self, creator: &str, actor: &str) -> bool {
        creator == actor
    }

    fn name(&self) -> &'static str {
        "default"
    }
}

/// Checks applied when a passed governance proposal executes: all of them pass
#[derive(Clone, Copy, Debug, Default)]
pub struct GovAuthorizationPolicy;

impl AuthorizationPolicy for GovAuthorizationPolicy {
    fn can_create_code(&self, _upload_config: &AccessConfig, _creator: &str) -> bool {
        true
    }

    fn can_assign_instantiate_config(&self, _default_config: &AccessConfig, _requested: &AccessConfig) -> bool {
        true
    }

    fn can_instantiate_contract(&self, _config: &AccessConfig, _actor: &str) -> bool {
        true
    }

    fn can_modify_contract(&self, _admin: Option<&str>, _actor: &str) -> bool {
        true
    }

    fn can_modify_code_access_config(&self, _creator: &str, _actor: &str) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "governance"
    }
}
