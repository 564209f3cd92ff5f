/// Genesis import and export
///
/// A chain can start with codes and contracts already in place. Export writes
/// the registry back out in key order, so two nodes with the same state produce
/// byte-identical genesis files.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::address::validate_address;
use crate::config::Params;
use crate::error::{WasmError, WasmResult};
use crate::registry::{validate_label, Registry};
use crate::sequence::{KEY_LAST_CODE_ID, KEY_LAST_INSTANCE_ID};
use crate::types::{Code, Contract, Sequence};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct GenesisState {
    pub params: Params,
    #[serde(default)]
    pub codes: Vec<Code>,
    #[serde(default)]
    pub contracts: Vec<Contract>,
    #[serde(default)]
    pub sequences: Vec<Sequence>,
}

fn invalid(msg: impl Into<String>) -> WasmError {
    WasmError::InvalidGenesis(msg.into())
}

impl Code {
    fn validate(&self, prefix: &str) -> WasmResult<()> {
        if self.code_id == 0 {
            return Err(invalid("code id must be positive"));
        }
        if self.code_bytes.is_empty() {
            return Err(invalid(format!("code {} has no bytes", self.code_id)));
        }
        if !self.code_info.matches(&self.code_bytes) {
            return Err(invalid(format!("code {} hash does not match its bytes", self.code_id)));
        }
        validate_address(&self.code_info.creator, prefix)?;
        self.code_info.instantiate_config.validate(prefix)
    }
}

impl Contract {
    fn validate(&self, prefix: &str) -> WasmResult<()> {
        validate_address(&self.contract_address, prefix)?;
        let info = &self.contract_info;
        if info.code_id == 0 {
            return Err(invalid(format!("contract {} has code id 0", self.contract_address)));
        }
        validate_address(&info.creator, prefix)?;
        if let Some(admin) = &info.admin {
            validate_address(admin, prefix)?;
        }
        validate_label(&info.label)?;

        let mut keys = BTreeSet::new();
        for model in &self.contract_state {
            if model.key.is_empty() {
                return Err(invalid(format!("contract {} has an empty state key", self.contract_address)));
            }
            if !keys.insert(model.key.as_slice()) {
                return Err(invalid(format!(
                    "contract {} has duplicate state key {}",
                    self.contract_address,
                    hex::encode(&model.key)
                )));
            }
        }
        Ok(())
    }
}

impl GenesisState {
    /// Stateless checks on every record
    pub fn validate(&self, prefix: &str) -> WasmResult<()> {
        self.params.validate(prefix)?;

        let mut code_ids = BTreeSet::new();
        for code in &self.codes {
            code.validate(prefix)?;
            if !code_ids.insert(code.code_id) {
                return Err(invalid(format!("duplicate code id {}", code.code_id)));
            }
        }

        let mut addresses = BTreeSet::new();
        for contract in &self.contracts {
            contract.validate(prefix)?;
            if !addresses.insert(contract.contract_address.as_str()) {
                return Err(invalid(format!("duplicate contract {}", contract.contract_address)));
            }
        }

        let mut namespaces = BTreeSet::new();
        for seq in &self.sequences {
            if seq.id_key.is_empty() {
                return Err(invalid("sequence with empty key"));
            }
            if !namespaces.insert(seq.id_key.as_slice()) {
                return Err(invalid(format!(
                    "duplicate sequence {}",
                    String::from_utf8_lossy(&seq.id_key)
                )));
            }
        }
        Ok(())
    }

    fn sequence_value(&self, namespace: &[u8]) -> u64 {
        self.sequences
            .iter()
            .find(|seq| seq.id_key == namespace)
            .map(|seq| seq.value)
            .unwrap_or(1)
    }
}

impl Registry {
    /// Load a genesis state into an empty registry
    pub fn init_genesis(&mut self, genesis: &GenesisState) -> WasmResult<()> {
        if !self.is_empty() {
            return Err(invalid("registry already holds codes or contracts"));
        }
        genesis.validate(self.prefix())?;

        let code_ids: BTreeSet<u64> = genesis.codes.iter().map(|code| code.code_id).collect();
        for contract in &genesis.contracts {
            if !code_ids.contains(&contract.contract_info.code_id) {
                return Err(WasmError::CodeNotFound(contract.contract_info.code_id));
            }
        }

        let max_code_id = code_ids.iter().next_back().copied().unwrap_or(0);
        let next_code_id = genesis.sequence_value(KEY_LAST_CODE_ID);
        if next_code_id <= max_code_id {
            return Err(invalid(format!(
                "code sequence {} must be greater than max code id {}",
                next_code_id, max_code_id
            )));
        }
        let contract_count = genesis.contracts.len() as u64;
        let next_instance_id = genesis.sequence_value(KEY_LAST_INSTANCE_ID);
        if next_instance_id <= contract_count {
            return Err(invalid(format!(
                "instance sequence {} must be greater than contract count {}",
                next_instance_id, contract_count
            )));
        }

        self.set_params(genesis.params.clone())?;
        for code in &genesis.codes {
            self.import_code(code.code_id, &code.code_info, &code.code_bytes);
        }
        for contract in &genesis.contracts {
            self.import_contract(
                &contract.contract_address,
                &contract.contract_info,
                &contract.contract_state,
            )?;
        }
        for seq in &genesis.sequences {
            self.sequences_mut().set(&seq.id_key, seq.value);
        }
        // Namespaces absent from the file still have to clear imported IDs
        self.sequences_mut().set(KEY_LAST_CODE_ID, next_code_id);
        self.sequences_mut().set(KEY_LAST_INSTANCE_ID, next_instance_id);
        Ok(())
    }

    pub fn export_genesis(&self) -> GenesisState {
        let codes = self
            .code_ids()
            .into_iter()
            .filter_map(|code_id| self.get_code(code_id))
            .collect();

        let contracts = self
            .contract_addresses()
            .into_iter()
            .filter_map(|address| {
                let mut contract_info = self.get_contract_info(&address)?;
                contract_info.created = None;
                let contract_state = self.contract_state(&address);
                Some(Contract {
                    contract_address: address,
                    contract_info,
                    contract_state,
                })
            })
            .collect();

        GenesisState {
            params: self.params().clone(),
            codes,
            contracts,
            sequences: self.sequences().export(),
        }
    }
}
