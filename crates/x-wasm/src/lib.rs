use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::json_types::Base64VecU8;
use near_sdk::{env, near_bindgen, require, AccountId, PanicOnDefault};
use serde::{Deserialize, Serialize};

pub mod access;
pub mod address;
pub mod coins;
pub mod config;
pub mod encoder;
pub mod error;
pub mod events;
pub mod genesis;
pub mod messages;
pub mod proposal;
pub mod registry;
pub mod sequence;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use access::{AccessConfig, AccessType, AuthorizationPolicy, DefaultAuthorizationPolicy, GovAuthorizationPolicy};
pub use config::{ModuleConfig, Params};
pub use encoder::{CustomEncoder, MessageEncoder};
pub use error::{WasmError, WasmResult};
pub use genesis::GenesisState;
pub use messages::{CosmosMsg, NativeMsg, NativeMsgKind};
pub use proposal::{ProposalOutcome, WasmProposal};
pub use registry::{CodeInfoResponse, ContractInfoResponse, Registry};
pub use types::*;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StoreCodeResponse {
    pub code_id: CodeID,
    /// Hex sha256 of the stored bytes
    pub checksum: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct InstantiateResponse {
    pub address: ContractAddress,
}

/// Turn a core error into a receipt failure; NEAR reverts every write made so far
fn or_panic<T>(result: WasmResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => env::panic_str(&format!("{}: {}", err.kind(), err)),
    }
}

/// The x/wasm module contract: code and contract registry plus the message encoder
#[near_bindgen]
#[derive(BorshDeserialize, BorshSerialize, PanicOnDefault)]
pub struct WasmModuleContract {
    registry: Registry,
    /// Router contract allowed to make direct calls
    router_contract: AccountId,
    /// Governance contract allowed to execute proposals
    governance_contract: AccountId,
    /// Position handed to the most recent instantiation
    last_position: AbsoluteTxPosition,
}

#[near_bindgen]
impl WasmModuleContract {
    #[init]
    pub fn new(config: ModuleConfig) -> Self {
        or_panic(config.validate());
        env::log_str(&format!(
            "WASM: module initialized, prefix {}, router {}, governance {}",
            config.bech32_prefix, config.router, config.governance
        ));
        Self {
            registry: Registry::new(&config.bech32_prefix, config.params),
            router_contract: config.router,
            governance_contract: config.governance,
            last_position: AbsoluteTxPosition::default(),
        }
    }

    /// Initialize with codes and contracts from a genesis file
    #[init]
    pub fn new_from_genesis(config: ModuleConfig, genesis: GenesisState) -> Self {
        let mut contract = Self::new(config);
        or_panic(contract.registry.init_genesis(&genesis));
        env::log_str(&format!(
            "WASM: imported {} codes and {} contracts from genesis",
            genesis.codes.len(),
            genesis.contracts.len()
        ));
        contract
    }

    fn assert_router(&self) {
        require!(
            env::predecessor_account_id() == self.router_contract,
            "Only router can call"
        );
    }

    fn assert_governance(&self) {
        require!(
            env::predecessor_account_id() == self.governance_contract,
            "Only governance can call"
        );
    }

    /// Instantiations within one block get increasing tx indexes
    fn next_position(&mut self) -> AbsoluteTxPosition {
        let block_height = env::block_height();
        let position = if self.last_position.block_height == block_height {
            AbsoluteTxPosition::new(block_height, self.last_position.tx_index + 1)
        } else {
            AbsoluteTxPosition::new(block_height, 0)
        };
        self.last_position = position;
        position
    }

    // ------------------------------------------------------------------------
    // Direct calls, forwarded by the router on behalf of `sender`
    // ------------------------------------------------------------------------

    pub fn store_code(
        &mut self,
        sender: String,
        wasm_byte_code: Base64VecU8,
        source: Option<String>,
        builder: Option<String>,
        instantiate_permission: Option<AccessConfig>,
    ) -> StoreCodeResponse {
        self.assert_router();
        let code_id = or_panic(self.registry.store_code(
            &sender,
            wasm_byte_code.into(),
            source.unwrap_or_default(),
            builder.unwrap_or_default(),
            instantiate_permission,
            &DefaultAuthorizationPolicy,
        ));
        let checksum = self
            .registry
            .get_code_info(code_id)
            .map(|info| hex::encode(info.code_hash))
            .unwrap_or_default();

        env::log_str(&format!("WASM: stored code {} from {}", code_id, sender));
        StoreCodeResponse { code_id, checksum }
    }

    pub fn instantiate(
        &mut self,
        sender: String,
        code_id: CodeID,
        msg: Base64VecU8,
        funds: Option<Vec<Coin>>,
        label: String,
        admin: Option<String>,
    ) -> InstantiateResponse {
        self.assert_router();
        let position = self.next_position();
        let address = or_panic(self.registry.instantiate(
            code_id,
            &sender,
            admin.as_deref(),
            &label,
            &msg.0,
            &funds.unwrap_or_default(),
            position,
            &DefaultAuthorizationPolicy,
        ));

        env::log_str(&format!("WASM: instantiated {} from code {}", address, code_id));
        InstantiateResponse { address }
    }

    pub fn migrate(&mut self, sender: String, contract: String, new_code_id: CodeID, msg: Base64VecU8) {
        self.assert_router();
        or_panic(self.registry.migrate(
            &contract,
            new_code_id,
            &msg.0,
            &sender,
            &DefaultAuthorizationPolicy,
        ));
        env::log_str(&format!("WASM: migrated {} to code {}", contract, new_code_id));
    }

    pub fn update_admin(&mut self, sender: String, contract: String, new_admin: String) {
        self.assert_router();
        or_panic(self.registry.update_admin(
            &contract,
            &new_admin,
            &sender,
            &DefaultAuthorizationPolicy,
        ));
        env::log_str(&format!("WASM: admin of {} set to {}", contract, new_admin));
    }

    pub fn clear_admin(&mut self, sender: String, contract: String) {
        self.assert_router();
        or_panic(self.registry.clear_admin(&contract, &sender, &DefaultAuthorizationPolicy));
        env::log_str(&format!("WASM: admin of {} cleared", contract));
    }

    pub fn update_instantiate_config(&mut self, sender: String, code_id: CodeID, config: AccessConfig) {
        self.assert_router();
        or_panic(self.registry.update_instantiate_config(
            code_id,
            &sender,
            config,
            &DefaultAuthorizationPolicy,
        ));
        env::log_str(&format!("WASM: instantiate config of code {} updated", code_id));
    }

    /// Write a state entry on behalf of the execution engine
    pub fn set_contract_state(&mut self, contract: String, key: Base64VecU8, value: Base64VecU8) {
        self.assert_router();
        or_panic(self.registry.set_contract_state(&contract, &key.0, &value.0));
    }

    pub fn remove_contract_state(&mut self, contract: String, key: Base64VecU8) -> Option<Base64VecU8> {
        self.assert_router();
        or_panic(self.registry.remove_contract_state(&contract, &key.0)).map(Base64VecU8::from)
    }

    // ------------------------------------------------------------------------
    // Governance
    // ------------------------------------------------------------------------

    pub fn execute_proposal(&mut self, proposal: WasmProposal) -> ProposalOutcome {
        self.assert_governance();
        let position = match proposal {
            WasmProposal::InstantiateContract(_) => self.next_position(),
            _ => AbsoluteTxPosition::new(env::block_height(), 0),
        };
        let outcome = or_panic(proposal.execute(&mut self.registry, position));

        env::log_str(&format!(
            "WASM: executed {} proposal {:?} as {}",
            proposal.proposal_type(),
            proposal.title(),
            proposal.run_as()
        ));
        outcome
    }

    pub fn update_params(&mut self, params: Params) {
        self.assert_governance();
        or_panic(self.registry.set_params(params));
        env::log_str("WASM: params updated");
    }

    // ------------------------------------------------------------------------
    // Views
    // ------------------------------------------------------------------------

    /// Translate messages emitted by the contract at `sender`
    pub fn encode_messages(&self, sender: String, msgs: Vec<CosmosMsg>) -> Vec<NativeMsg> {
        or_panic(MessageEncoder::new().encode_all(&sender, &msgs))
    }

    /// Identity the module assigns to a NEAR account
    pub fn account_address(&self, account_id: AccountId) -> String {
        or_panic(address::account_address(&account_id, self.registry.prefix()))
    }

    pub fn get_code(&self, code_id: CodeID) -> Option<Code> {
        self.registry.get_code(code_id)
    }

    pub fn get_code_info(&self, code_id: CodeID) -> Option<CodeInfo> {
        self.registry.get_code_info(code_id)
    }

    pub fn get_contract_info(&self, contract: String) -> Option<ContractInfo> {
        self.registry.get_contract_info(&contract)
    }

    pub fn get_contract(&self, contract: String) -> Option<Contract> {
        self.registry.get_contract(&contract)
    }

    pub fn query_raw(&self, contract: String, key: Base64VecU8) -> Option<Base64VecU8> {
        self.registry.query_raw(&contract, &key.0).map(Base64VecU8::from)
    }

    pub fn contract_history(&self, contract: String) -> Vec<ContractCodeHistoryEntry> {
        self.registry.contract_history(&contract)
    }

    pub fn list_codes(&self, start_after: Option<CodeID>, limit: Option<u32>) -> Vec<CodeInfoResponse> {
        self.registry.list_codes(start_after, limit)
    }

    pub fn list_contracts_by_code(
        &self,
        code_id: CodeID,
        start_after: Option<String>,
        limit: Option<u32>,
    ) -> Vec<ContractInfoResponse> {
        self.registry.list_contracts_by_code(code_id, start_after, limit)
    }

    pub fn get_params(&self) -> Params {
        self.registry.params().clone()
    }

    pub fn export_genesis(&self) -> GenesisState {
        self.registry.export_genesis()
    }

    /// Health check
    pub fn health_check(&self) -> serde_json::Value {
        serde_json::json!({
            "module": "wasm",
            "status": "healthy",
            "codes_count": self.registry.code_count(),
            "contracts_count": self.registry.contract_count(),
            "next_code_id": self.registry.sequences().peek(sequence::KEY_LAST_CODE_ID),
        })
    }
}
