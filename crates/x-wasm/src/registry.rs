/// Code & Contract Registry
///
/// Authoritative record of uploaded code, contract instances, their state and
/// the ID sequences. Every mutating operation checks all of its preconditions
/// before the first write, so a failed call leaves storage untouched.

use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::collections::TreeMap;
use serde::{Deserialize, Serialize};

use crate::access::{AccessConfig, AuthorizationPolicy};
use crate::address::{contract_address, validate_address};
use crate::coins::validate_coins;
use crate::config::Params;
use crate::error::{WasmError, WasmResult};
use crate::events::WasmEvent;
use crate::sequence::{Sequences, KEY_LAST_CODE_ID, KEY_LAST_INSTANCE_ID};
use crate::types::{
    code_hash, AbsoluteTxPosition, Code, CodeHistoryOperation, CodeID, CodeInfo, Coin, Contract, ContractAddress,
    ContractCodeHistoryEntry, ContractInfo, Model,
};

pub const MAX_LABEL_SIZE: usize = 128;
pub const DEFAULT_PAGE_LIMIT: u32 = 30;
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CodeInfoResponse {
    pub code_id: CodeID,
    #[serde(flatten)]
    pub info: CodeInfo,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ContractInfoResponse {
    pub address: ContractAddress,
    #[serde(flatten)]
    pub info: ContractInfo,
}

#[derive(BorshDeserialize, BorshSerialize)]
pub struct Registry {
    /// bech32 prefix every identity must carry
    prefix: String,
    params: Params,
    /// Stored WASM code by CodeID
    codes: TreeMap<CodeID, Vec<u8>>,
    /// Code metadata by CodeID
    code_infos: TreeMap<CodeID, CodeInfo>,
    /// Contract instances by address
    contracts: TreeMap<ContractAddress, ContractInfo>,
    /// (code id, address) -> address, for listing contracts of a code
    contracts_by_code: TreeMap<Vec<u8>, ContractAddress>,
    /// (address, key) -> value
    contract_state: TreeMap<Vec<u8>, Vec<u8>>,
    /// (address, index) -> history entry
    code_history: TreeMap<Vec<u8>, ContractCodeHistoryEntry>,
    sequences: Sequences,
}

fn by_code_key(code_id: CodeID, address: &str) -> Vec<u8> {
    let mut key = code_id.to_be_bytes().to_vec();
    key.extend_from_slice(address.as_bytes());
    key
}

/// Length-prefixed address, so no address is a prefix of another's keys
fn contract_prefix(address: &str) -> WasmResult<Vec<u8>> {
    let len = u16::try_from(address.len())
        .map_err(|_| WasmError::invalid_address(address, "address too long for a storage key"))?;
    let mut key = len.to_be_bytes().to_vec();
    key.extend_from_slice(address.as_bytes());
    Ok(key)
}

fn state_key(address: &str, key: &[u8]) -> WasmResult<Vec<u8>> {
    let mut full = contract_prefix(address)?;
    full.extend_from_slice(key);
    Ok(full)
}

fn history_key(address: &str, index: u64) -> WasmResult<Vec<u8>> {
    let mut full = contract_prefix(address)?;
    full.extend_from_slice(&index.to_be_bytes());
    Ok(full)
}

fn page_limit(limit: Option<u32>) -> usize {
    limit.unwrap_or(DEFAULT_PAGE_LIMIT).min(MAX_PAGE_LIMIT) as usize
}

pub(crate) fn validate_label(label: &str) -> WasmResult<()> {
    if label.trim().is_empty() {
        return Err(WasmError::InvalidRequest("label is required".to_string()));
    }
    if label.len() > MAX_LABEL_SIZE {
        return Err(WasmError::InvalidRequest(format!(
            "label cannot be longer than {} bytes",
            MAX_LABEL_SIZE
        )));
    }
    Ok(())
}

impl Registry {
    pub fn new(prefix: &str, params: Params) -> Self {
        Self {
            prefix: prefix.to_string(),
            params,
            codes: TreeMap::new(b"xw_codes".to_vec()),
            code_infos: TreeMap::new(b"xw_code_infos".to_vec()),
            contracts: TreeMap::new(b"xw_contracts".to_vec()),
            contracts_by_code: TreeMap::new(b"xw_by_code".to_vec()),
            contract_state: TreeMap::new(b"xw_state".to_vec()),
            code_history: TreeMap::new(b"xw_history".to_vec()),
            sequences: Sequences::new(b"xw_seq"),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn set_params(&mut self, params: Params) -> WasmResult<()> {
        params.validate(&self.prefix)?;
        self.params = params;
        Ok(())
    }

    pub fn sequences(&self) -> &Sequences {
        &self.sequences
    }

    pub(crate) fn sequences_mut(&mut self) -> &mut Sequences {
        &mut self.sequences
    }

    // ------------------------------------------------------------------------
    // Code
    // ------------------------------------------------------------------------

    /// Store WASM code and return its CodeID
    pub fn store_code(
        &mut self,
        creator: &str,
        wasm_byte_code: Vec<u8>,
        source: String,
        builder: String,
        instantiate_permission: Option<AccessConfig>,
        policy: &dyn AuthorizationPolicy,
    ) -> WasmResult<CodeID> {
        validate_address(creator, &self.prefix)?;
        if wasm_byte_code.is_empty() {
            return Err(WasmError::EmptyCode);
        }
        if wasm_byte_code.len() as u64 > self.params.max_wasm_code_size {
            return Err(WasmError::CodeTooLarge {
                size: wasm_byte_code.len(),
                max: self.params.max_wasm_code_size,
            });
        }
        if !policy.can_create_code(&self.params.code_upload_access, creator) {
            return Err(WasmError::Unauthorized(format!("{} may not upload code", creator)));
        }

        let default_config = self.params.instantiate_default_permission.with(creator);
        let instantiate_config = match instantiate_permission {
            Some(config) => {
                config.validate(&self.prefix)?;
                if !policy.can_assign_instantiate_config(&default_config, &config) {
                    return Err(WasmError::Unauthorized(
                        "instantiate permission is wider than the default".to_string(),
                    ));
                }
                config
            }
            None => default_config,
        };

        let code_info = CodeInfo {
            code_hash: code_hash(&wasm_byte_code),
            creator: creator.to_string(),
            source,
            builder,
            instantiate_config,
        };

        let code_id = self.sequences.next(KEY_LAST_CODE_ID)?;
        self.codes.insert(&code_id, &wasm_byte_code);
        self.code_infos.insert(&code_id, &code_info);

        WasmEvent::StoreCode {
            code_id,
            creator,
            code_hash: hex::encode(&code_info.code_hash),
            instantiate_config: &code_info.instantiate_config,
        }
        .emit();
        Ok(code_id)
    }

    /// Change who may instantiate a code; only its creator under the default policy
    pub fn update_instantiate_config(
        &mut self,
        code_id: CodeID,
        caller: &str,
        config: AccessConfig,
        policy: &dyn AuthorizationPolicy,
    ) -> WasmResult<()> {
        config.validate(&self.prefix)?;
        let mut code_info = self
            .code_infos
            .get(&code_id)
            .ok_or(WasmError::CodeNotFound(code_id))?;
        if !policy.can_modify_code_access_config(&code_info.creator, caller) {
            return Err(WasmError::Unauthorized(format!(
                "{} may not change the instantiate config of code {}",
                caller, code_id
            )));
        }

        code_info.instantiate_config = config;
        self.code_infos.insert(&code_id, &code_info);

        WasmEvent::UpdateInstantiateConfig {
            code_id,
            instantiate_config: &code_info.instantiate_config,
            caller,
        }
        .emit();
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Contracts
    // ------------------------------------------------------------------------

    /// Instantiate a contract from stored code
    #[allow(clippy::too_many_arguments)]
    pub fn instantiate(
        &mut self,
        code_id: CodeID,
        creator: &str,
        admin: Option<&str>,
        label: &str,
        init_msg: &[u8],
        funds: &[Coin],
        position: AbsoluteTxPosition,
        policy: &dyn AuthorizationPolicy,
    ) -> WasmResult<ContractAddress> {
        validate_address(creator, &self.prefix)?;
        if let Some(admin) = admin {
            validate_address(admin, &self.prefix)?;
        }
        validate_label(label)?;
        validate_coins(funds)?;

        let code_info = self
            .code_infos
            .get(&code_id)
            .ok_or(WasmError::CodeNotFound(code_id))?;
        if !policy.can_instantiate_contract(&code_info.instantiate_config, creator) {
            return Err(WasmError::Unauthorized(format!(
                "{} may not instantiate code {}",
                creator, code_id
            )));
        }

        let instance_id = self.sequences.peek(KEY_LAST_INSTANCE_ID);
        let address = contract_address(code_id, instance_id, &self.prefix)?;
        if self.contracts.contains_key(&address) {
            return Err(WasmError::DuplicateContract(address));
        }
        let history = self.next_history_key(&address)?;
        self.sequences.next(KEY_LAST_INSTANCE_ID)?;

        let contract_info = ContractInfo {
            code_id,
            creator: creator.to_string(),
            admin: admin.map(str::to_string),
            label: label.to_string(),
            created: Some(position),
        };
        self.contracts.insert(&address, &contract_info);
        self.contracts_by_code.insert(&by_code_key(code_id, &address), &address);
        self.append_history(&history, CodeHistoryOperation::Init, code_id, init_msg);

        WasmEvent::Instantiate {
            code_id,
            contract: &address,
            creator,
            admin,
            label,
            funds,
        }
        .emit();
        Ok(address)
    }

    /// Point a contract at new code; only its admin under the default policy
    pub fn migrate(
        &mut self,
        contract: &str,
        new_code_id: CodeID,
        migrate_msg: &[u8],
        caller: &str,
        policy: &dyn AuthorizationPolicy,
    ) -> WasmResult<()> {
        let mut info = self.load_contract(contract)?;
        if !self.code_infos.contains_key(&new_code_id) {
            return Err(WasmError::CodeNotFound(new_code_id));
        }
        self.authorize_admin(&info, contract, caller, policy)?;
        let history = self.next_history_key(contract)?;

        let old_code_id = info.code_id;
        info.code_id = new_code_id;
        self.contracts.insert(&contract.to_string(), &info);
        self.contracts_by_code.remove(&by_code_key(old_code_id, contract));
        self.contracts_by_code
            .insert(&by_code_key(new_code_id, contract), &contract.to_string());
        self.append_history(&history, CodeHistoryOperation::Migrate, new_code_id, migrate_msg);

        WasmEvent::Migrate {
            contract,
            old_code_id,
            new_code_id,
            caller,
        }
        .emit();
        Ok(())
    }

    pub fn update_admin(
        &mut self,
        contract: &str,
        new_admin: &str,
        caller: &str,
        policy: &dyn AuthorizationPolicy,
    ) -> WasmResult<()> {
        validate_address(new_admin, &self.prefix)?;
        let mut info = self.load_contract(contract)?;
        self.authorize_admin(&info, contract, caller, policy)?;

        info.admin = Some(new_admin.to_string());
        self.contracts.insert(&contract.to_string(), &info);

        WasmEvent::UpdateAdmin {
            contract,
            new_admin,
            caller,
        }
        .emit();
        Ok(())
    }

    /// Remove the admin; afterwards only governance can migrate or set one
    pub fn clear_admin(
        &mut self,
        contract: &str,
        caller: &str,
        policy: &dyn AuthorizationPolicy,
    ) -> WasmResult<()> {
        let mut info = self.load_contract(contract)?;
        self.authorize_admin(&info, contract, caller, policy)?;

        info.admin = None;
        self.contracts.insert(&contract.to_string(), &info);

        WasmEvent::ClearAdmin { contract, caller }.emit();
        Ok(())
    }

    fn load_contract(&self, contract: &str) -> WasmResult<ContractInfo> {
        self.contracts
            .get(&contract.to_string())
            .ok_or_else(|| WasmError::ContractNotFound(contract.to_string()))
    }

    fn authorize_admin(
        &self,
        info: &ContractInfo,
        contract: &str,
        caller: &str,
        policy: &dyn AuthorizationPolicy,
    ) -> WasmResult<()> {
        if policy.can_modify_contract(info.admin.as_deref(), caller) {
            Ok(())
        } else {
            Err(WasmError::Unauthorized(format!(
                "{} is not the admin of {}",
                caller, contract
            )))
        }
    }

    fn next_history_key(&self, contract: &str) -> WasmResult<Vec<u8>> {
        history_key(contract, self.contract_history(contract).len() as u64)
    }

    fn append_history(&mut self, key: &[u8], operation: CodeHistoryOperation, code_id: CodeID, msg: &[u8]) {
        let entry = ContractCodeHistoryEntry {
            operation,
            code_id,
            msg: msg.to_vec(),
        };
        self.code_history.insert(&key.to_vec(), &entry);
    }

    // ------------------------------------------------------------------------
    // Contract state
    // ------------------------------------------------------------------------

    pub fn set_contract_state(&mut self, contract: &str, key: &[u8], value: &[u8]) -> WasmResult<()> {
        if key.is_empty() {
            return Err(WasmError::InvalidRequest("state key cannot be empty".to_string()));
        }
        self.load_contract(contract)?;
        let full_key = state_key(contract, key)?;
        self.contract_state.insert(&full_key, &value.to_vec());
        Ok(())
    }

    pub fn remove_contract_state(&mut self, contract: &str, key: &[u8]) -> WasmResult<Option<Vec<u8>>> {
        self.load_contract(contract)?;
        Ok(self.contract_state.remove(&state_key(contract, key)?))
    }

    pub fn query_raw(&self, contract: &str, key: &[u8]) -> Option<Vec<u8>> {
        if key.is_empty() {
            return None;
        }
        self.contract_state.get(&state_key(contract, key).ok()?)
    }

    /// All state of a contract in key order
    pub fn contract_state(&self, contract: &str) -> Vec<Model> {
        let Ok(prefix) = contract_prefix(contract) else {
            return Vec::new();
        };
        self.contract_state
            .iter_from(prefix.clone())
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(k, value)| Model {
                key: k[prefix.len()..].to_vec(),
                value,
            })
            .collect()
    }

    pub fn contract_history(&self, contract: &str) -> Vec<ContractCodeHistoryEntry> {
        let Ok(prefix) = contract_prefix(contract) else {
            return Vec::new();
        };
        self.code_history
            .iter_from(prefix.clone())
            .take_while(|(k, _)| k.starts_with(&prefix))
            .map(|(_, entry)| entry)
            .collect()
    }

    // ------------------------------------------------------------------------
    // Read path
    // ------------------------------------------------------------------------

    pub fn get_code_info(&self, code_id: CodeID) -> Option<CodeInfo> {
        self.code_infos.get(&code_id)
    }

    pub fn get_code_bytes(&self, code_id: CodeID) -> Option<Vec<u8>> {
        self.codes.get(&code_id)
    }

    pub fn get_code(&self, code_id: CodeID) -> Option<Code> {
        let code_info = self.code_infos.get(&code_id)?;
        let code_bytes = self.codes.get(&code_id)?;
        Some(Code {
            code_id,
            code_info,
            code_bytes,
        })
    }

    pub fn get_contract_info(&self, contract: &str) -> Option<ContractInfo> {
        self.contracts.get(&contract.to_string())
    }

    /// Contract metadata together with its full state
    pub fn get_contract(&self, contract: &str) -> Option<Contract> {
        let contract_info = self.get_contract_info(contract)?;
        Some(Contract {
            contract_address: contract.to_string(),
            contract_info,
            contract_state: self.contract_state(contract),
        })
    }

    pub fn code_ids(&self) -> Vec<CodeID> {
        self.code_infos.iter().map(|(code_id, _)| code_id).collect()
    }

    pub fn code_count(&self) -> u64 {
        self.code_infos.len()
    }

    pub fn contract_count(&self) -> u64 {
        self.contracts.len()
    }

    /// List stored codes in ID order
    pub fn list_codes(&self, start_after: Option<CodeID>, limit: Option<u32>) -> Vec<CodeInfoResponse> {
        let limit = page_limit(limit);
        let to_response = |(code_id, info): (CodeID, CodeInfo)| CodeInfoResponse { code_id, info };
        match start_after {
            Some(start) => self.code_infos.iter_from(start).take(limit).map(to_response).collect(),
            None => self.code_infos.iter().take(limit).map(to_response).collect(),
        }
    }

    /// List contracts currently running `code_id`, in address order
    pub fn list_contracts_by_code(
        &self,
        code_id: CodeID,
        start_after: Option<String>,
        limit: Option<u32>,
    ) -> Vec<ContractInfoResponse> {
        let limit = page_limit(limit);
        let prefix = code_id.to_be_bytes().to_vec();
        let start = match start_after {
            Some(address) => by_code_key(code_id, &address),
            None => prefix.clone(),
        };
        self.contracts_by_code
            .iter_from(start)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter_map(|(_, address)| {
                self.contracts
                    .get(&address)
                    .map(|info| ContractInfoResponse { address, info })
            })
            .take(limit)
            .collect()
    }

    /// Iterate all contract addresses in order
    pub fn contract_addresses(&self) -> Vec<ContractAddress> {
        self.contracts.iter().map(|(address, _)| address).collect()
    }

    // ------------------------------------------------------------------------
    // Raw writes for genesis import; callers validate beforehand
    // ------------------------------------------------------------------------

    pub(crate) fn import_code(&mut self, code_id: CodeID, code_info: &CodeInfo, code_bytes: &[u8]) {
        self.codes.insert(&code_id, &code_bytes.to_vec());
        self.code_infos.insert(&code_id, code_info);
    }

    pub(crate) fn import_contract(&mut self, address: &str, info: &ContractInfo, state: &[Model]) -> WasmResult<()> {
        let history = self.next_history_key(address)?;
        let prefix = contract_prefix(address)?;
        self.contracts.insert(&address.to_string(), info);
        self.contracts_by_code
            .insert(&by_code_key(info.code_id, address), &address.to_string());
        for model in state {
            let mut full_key = prefix.clone();
            full_key.extend_from_slice(&model.key);
            self.contract_state.insert(&full_key, &model.value);
        }
        self.append_history(&history, CodeHistoryOperation::Genesis, info.code_id, &[]);
        Ok(())
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.code_infos.len() == 0 && self.contracts.len() == 0
    }
}
