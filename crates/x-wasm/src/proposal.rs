/// Governance proposals
///
/// A passed proposal runs the matching registry operation with its `run_as`
/// identity as the actor and the governance policy in place of the default
/// one, so upload, instantiate and admin checks are bypassed. Payloads are
/// still checked for well-formedness before anything executes.

use serde::{Deserialize, Serialize};

use crate::access::{AccessConfig, GovAuthorizationPolicy};
use crate::address::validate_address;
use crate::coins::validate_coins;
use crate::error::{WasmError, WasmResult};
use crate::events::WasmEvent;
use crate::registry::{Registry, MAX_LABEL_SIZE};
use crate::types::{base64_bytes, AbsoluteTxPosition, CodeID, Coin, ContractAddress};

pub const MAX_TITLE_LENGTH: usize = 140;
pub const MAX_DESCRIPTION_LENGTH: usize = 5000;
/// Upper bound on code submitted through a proposal
pub const MAX_WASM_SIZE: usize = 500 * 1024;
pub const MAX_SOURCE_LENGTH: usize = 256;
pub const MAX_BUILDER_LENGTH: usize = 128;

fn invalid(msg: impl Into<String>) -> WasmError {
    WasmError::InvalidProposal(msg.into())
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StoreCodeProposal {
    pub title: String,
    pub description: String,
    pub run_as: String,
    #[serde(with = "base64_bytes")]
    pub wasm_byte_code: Vec<u8>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub builder: String,
    #[serde(default)]
    pub instantiate_permission: Option<AccessConfig>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct InstantiateContractProposal {
    pub title: String,
    pub description: String,
    pub run_as: String,
    #[serde(default)]
    pub admin: Option<String>,
    pub code_id: CodeID,
    pub label: String,
    #[serde(with = "base64_bytes")]
    pub init_msg: Vec<u8>,
    #[serde(default)]
    pub funds: Vec<Coin>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MigrateContractProposal {
    pub title: String,
    pub description: String,
    pub run_as: String,
    pub contract: ContractAddress,
    pub code_id: CodeID,
    #[serde(with = "base64_bytes")]
    pub migrate_msg: Vec<u8>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct UpdateAdminProposal {
    pub title: String,
    pub description: String,
    pub run_as: String,
    pub new_admin: String,
    pub contract: ContractAddress,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ClearAdminProposal {
    pub title: String,
    pub description: String,
    pub run_as: String,
    pub contract: ContractAddress,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum WasmProposal {
    StoreCode(StoreCodeProposal),
    InstantiateContract(InstantiateContractProposal),
    MigrateContract(MigrateContractProposal),
    UpdateAdmin(UpdateAdminProposal),
    ClearAdmin(ClearAdminProposal),
}

/// What an executed proposal produced
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum ProposalOutcome {
    CodeStored { code_id: CodeID },
    ContractInstantiated { contract: ContractAddress },
    ContractMigrated { contract: ContractAddress, code_id: CodeID },
    AdminUpdated { contract: ContractAddress, new_admin: String },
    AdminCleared { contract: ContractAddress },
}

fn validate_header(title: &str, description: &str, run_as: &str, prefix: &str) -> WasmResult<()> {
    if title.trim().is_empty() {
        return Err(invalid("proposal title cannot be blank"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(invalid(format!("proposal title is longer than {}", MAX_TITLE_LENGTH)));
    }
    if description.trim().is_empty() {
        return Err(invalid("proposal description cannot be blank"));
    }
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(invalid(format!(
            "proposal description is longer than {}",
            MAX_DESCRIPTION_LENGTH
        )));
    }
    validate_address(run_as, prefix)
}

fn validate_json(msg: &[u8], field: &str) -> WasmResult<()> {
    serde_json::from_slice::<serde_json::Value>(msg)
        .map(|_| ())
        .map_err(|e| invalid(format!("{} is not valid json: {}", field, e)))
}

fn validate_code_id(code_id: CodeID) -> WasmResult<()> {
    if code_id == 0 {
        return Err(invalid("code id is required"));
    }
    Ok(())
}

fn validate_source(source: &str) -> WasmResult<()> {
    if source.is_empty() {
        return Ok(());
    }
    if source.len() > MAX_SOURCE_LENGTH {
        return Err(invalid(format!("source is longer than {}", MAX_SOURCE_LENGTH)));
    }
    match source.strip_prefix("https://") {
        Some(rest) if !rest.is_empty() && !rest.contains(char::is_whitespace) => Ok(()),
        _ => Err(invalid(format!("source {:?} must be an https url", source))),
    }
}

/// Builders are docker image references: `name[/name...]:tag`
fn validate_builder(builder: &str) -> WasmResult<()> {
    if builder.is_empty() {
        return Ok(());
    }
    if builder.len() > MAX_BUILDER_LENGTH {
        return Err(invalid(format!("builder is longer than {}", MAX_BUILDER_LENGTH)));
    }
    let bad = || invalid(format!("builder {:?} is not a docker image reference", builder));
    let (name, tag) = builder.rsplit_once(':').ok_or_else(bad)?;
    let name_ok = name.split('/').all(|part| {
        part.bytes().next().is_some_and(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
            && part
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || matches!(b, b'.' | b'_' | b'-'))
    });
    let tag_ok = !tag.is_empty()
        && tag
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'));
    if name_ok && tag_ok {
        Ok(())
    } else {
        Err(bad())
    }
}

impl StoreCodeProposal {
    pub fn validate_basic(&self, prefix: &str) -> WasmResult<()> {
        validate_header(&self.title, &self.description, &self.run_as, prefix)?;
        if self.wasm_byte_code.is_empty() {
            return Err(WasmError::EmptyCode);
        }
        if self.wasm_byte_code.len() > MAX_WASM_SIZE {
            return Err(WasmError::CodeTooLarge {
                size: self.wasm_byte_code.len(),
                max: MAX_WASM_SIZE as u64,
            });
        }
        validate_source(&self.source)?;
        validate_builder(&self.builder)?;
        if let Some(permission) = &self.instantiate_permission {
            permission.validate(prefix)?;
        }
        Ok(())
    }
}

impl InstantiateContractProposal {
    pub fn validate_basic(&self, prefix: &str) -> WasmResult<()> {
        validate_header(&self.title, &self.description, &self.run_as, prefix)?;
        validate_code_id(self.code_id)?;
        if self.label.trim().is_empty() {
            return Err(invalid("label is required"));
        }
        if self.label.len() > MAX_LABEL_SIZE {
            return Err(invalid(format!("label is longer than {}", MAX_LABEL_SIZE)));
        }
        if let Some(admin) = &self.admin {
            validate_address(admin, prefix)?;
        }
        validate_json(&self.init_msg, "init msg")?;
        validate_coins(&self.funds)
    }
}

impl MigrateContractProposal {
    pub fn validate_basic(&self, prefix: &str) -> WasmResult<()> {
        validate_header(&self.title, &self.description, &self.run_as, prefix)?;
        validate_code_id(self.code_id)?;
        validate_address(&self.contract, prefix)?;
        validate_json(&self.migrate_msg, "migrate msg")
    }
}

impl UpdateAdminProposal {
    pub fn validate_basic(&self, prefix: &str) -> WasmResult<()> {
        validate_header(&self.title, &self.description, &self.run_as, prefix)?;
        validate_address(&self.contract, prefix)?;
        validate_address(&self.new_admin, prefix)
    }
}

impl ClearAdminProposal {
    pub fn validate_basic(&self, prefix: &str) -> WasmResult<()> {
        validate_header(&self.title, &self.description, &self.run_as, prefix)?;
        validate_address(&self.contract, prefix)
    }
}

impl WasmProposal {
    pub fn proposal_type(&self) -> &'static str {
        match self {
            WasmProposal::StoreCode(_) => "store_code",
            WasmProposal::InstantiateContract(_) => "instantiate_contract",
            WasmProposal::MigrateContract(_) => "migrate_contract",
            WasmProposal::UpdateAdmin(_) => "update_admin",
            WasmProposal::ClearAdmin(_) => "clear_admin",
        }
    }

    pub fn title(&self) -> &str {
        match self {
            WasmProposal::StoreCode(p) => &p.title,
            WasmProposal::InstantiateContract(p) => &p.title,
            WasmProposal::MigrateContract(p) => &p.title,
            WasmProposal::UpdateAdmin(p) => &p.title,
            WasmProposal::ClearAdmin(p) => &p.title,
        }
    }

    pub fn run_as(&self) -> &str {
        match self {
            WasmProposal::StoreCode(p) => &p.run_as,
            WasmProposal::InstantiateContract(p) => &p.run_as,
            WasmProposal::MigrateContract(p) => &p.run_as,
            WasmProposal::UpdateAdmin(p) => &p.run_as,
            WasmProposal::ClearAdmin(p) => &p.run_as,
        }
    }

    pub fn validate_basic(&self, prefix: &str) -> WasmResult<()> {
        match self {
            WasmProposal::StoreCode(p) => p.validate_basic(prefix),
            WasmProposal::InstantiateContract(p) => p.validate_basic(prefix),
            WasmProposal::MigrateContract(p) => p.validate_basic(prefix),
            WasmProposal::UpdateAdmin(p) => p.validate_basic(prefix),
            WasmProposal::ClearAdmin(p) => p.validate_basic(prefix),
        }
    }

    /// Run a passed proposal against the registry
    ///
    /// `position` is only used by instantiation.
    pub fn execute(&self, registry: &mut Registry, position: AbsoluteTxPosition) -> WasmResult<ProposalOutcome> {
        self.validate_basic(registry.prefix())?;
        let gov = GovAuthorizationPolicy;

        let outcome = match self {
            WasmProposal::StoreCode(p) => {
                let code_id = registry.store_code(
                    &p.run_as,
                    p.wasm_byte_code.clone(),
                    p.source.clone(),
                    p.builder.clone(),
                    p.instantiate_permission.clone(),
                    &gov,
                )?;
                ProposalOutcome::CodeStored { code_id }
            }
            WasmProposal::InstantiateContract(p) => {
                let contract = registry.instantiate(
                    p.code_id,
                    &p.run_as,
                    p.admin.as_deref(),
                    &p.label,
                    &p.init_msg,
                    &p.funds,
                    position,
                    &gov,
                )?;
                ProposalOutcome::ContractInstantiated { contract }
            }
            WasmProposal::MigrateContract(p) => {
                registry.migrate(&p.contract, p.code_id, &p.migrate_msg, &p.run_as, &gov)?;
                ProposalOutcome::ContractMigrated {
                    contract: p.contract.clone(),
                    code_id: p.code_id,
                }
            }
            WasmProposal::UpdateAdmin(p) => {
                registry.update_admin(&p.contract, &p.new_admin, &p.run_as, &gov)?;
                ProposalOutcome::AdminUpdated {
                    contract: p.contract.clone(),
                    new_admin: p.new_admin.clone(),
                }
            }
            WasmProposal::ClearAdmin(p) => {
                registry.clear_admin(&p.contract, &p.run_as, &gov)?;
                ProposalOutcome::AdminCleared {
                    contract: p.contract.clone(),
                }
            }
        };

        WasmEvent::ExecuteProposal {
            proposal_type: self.proposal_type(),
            title: self.title(),
            run_as: self.run_as(),
        }
        .emit();
        Ok(outcome)
    }
}
