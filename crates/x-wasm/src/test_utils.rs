/// Test fixtures
///
/// Fixture randomness comes from a `ByteSource` so a test can pick fastrand for
/// variety or `FixedBytes` when it needs to predict the output.

use near_sdk::test_utils::VMContextBuilder;
use near_sdk::testing_env;

use crate::access::AccessConfig;
use crate::address::{bech32_encode, ADDRESS_LEN, DEFAULT_BECH32_PREFIX};
use crate::config::Params;
use crate::genesis::GenesisState;
use crate::proposal::{
    ClearAdminProposal, InstantiateContractProposal, MigrateContractProposal, StoreCodeProposal,
    UpdateAdminProposal,
};
use crate::sequence::{KEY_LAST_CODE_ID, KEY_LAST_INSTANCE_ID};
use crate::types::{code_hash, Code, CodeID, CodeInfo, Contract, ContractInfo, Model, Sequence};

pub trait ByteSource {
    fn fill(&mut self, buf: &mut [u8]);

    fn bytes(&mut self, len: usize) -> Vec<u8> {
        let mut buf = vec![0; len];
        self.fill(&mut buf);
        buf
    }
}

pub struct FastrandBytes(fastrand::Rng);

impl FastrandBytes {
    pub fn new() -> Self {
        Self(fastrand::Rng::new())
    }
}

impl ByteSource for FastrandBytes {
    fn fill(&mut self, buf: &mut [u8]) {
        for b in buf.iter_mut() {
            *b = self.0.u8(..);
        }
    }
}

/// Counts up from `seed`, wrapping
pub struct FixedBytes(u8);

impl FixedBytes {
    pub fn new(seed: u8) -> Self {
        Self(seed)
    }
}

impl ByteSource for FixedBytes {
    fn fill(&mut self, buf: &mut [u8]) {
        for b in buf.iter_mut() {
            *b = self.0;
            self.0 = self.0.wrapping_add(1);
        }
    }
}

pub fn setup_test_env() {
    let context = VMContextBuilder::new()
        .current_account_id("wasm.testnet".parse().unwrap())
        .block_height(100)
        .build();
    testing_env!(context);
}

/// Address whose 20 byte payload is `byte` repeated
pub fn addr(byte: u8) -> String {
    bech32_encode(DEFAULT_BECH32_PREFIX, &[byte; ADDRESS_LEN]).unwrap()
}

pub fn random_address(source: &mut impl ByteSource) -> String {
    bech32_encode(DEFAULT_BECH32_PREFIX, &source.bytes(ADDRESS_LEN)).unwrap()
}

pub fn code_fixture(source: &mut impl ByteSource, code_id: CodeID) -> Code {
    let code_bytes = source.bytes(100);
    Code {
        code_id,
        code_info: CodeInfo {
            code_hash: code_hash(&code_bytes),
            creator: random_address(source),
            source: "https://example.com".to_string(),
            builder: "my/builder:tag".to_string(),
            instantiate_config: AccessConfig::Everybody {},
        },
        code_bytes,
    }
}

/// Contract as it appears in genesis: no created position
pub fn contract_fixture(source: &mut impl ByteSource, code_id: CodeID) -> Contract {
    Contract {
        contract_address: random_address(source),
        contract_info: ContractInfo {
            code_id,
            creator: random_address(source),
            admin: None,
            label: "any".to_string(),
            created: None,
        },
        contract_state: vec![Model {
            key: b"anyKey".to_vec(),
            value: b"anyValue".to_vec(),
        }],
    }
}

pub fn genesis_fixture(source: &mut impl ByteSource) -> GenesisState {
    GenesisState {
        params: Params::default(),
        codes: vec![code_fixture(source, 1), code_fixture(source, 2)],
        contracts: vec![contract_fixture(source, 1), contract_fixture(source, 2)],
        sequences: vec![
            Sequence {
                id_key: KEY_LAST_CODE_ID.to_vec(),
                value: 3,
            },
            Sequence {
                id_key: KEY_LAST_INSTANCE_ID.to_vec(),
                value: 3,
            },
        ],
    }
}

pub fn store_code_proposal_fixture() -> StoreCodeProposal {
    StoreCodeProposal {
        title: "Foo".to_string(),
        description: "Bar".to_string(),
        run_as: addr(0),
        wasm_byte_code: b"\0asm\x01\0\0\0".to_vec(),
        source: "https://example.com/code".to_string(),
        builder: "foo/bar:latest".to_string(),
        instantiate_permission: None,
    }
}

pub fn instantiate_proposal_fixture(code_id: CodeID) -> InstantiateContractProposal {
    let init_msg = serde_json::json!({ "verifier": addr(1), "beneficiary": addr(1) });
    InstantiateContractProposal {
        title: "Foo".to_string(),
        description: "Bar".to_string(),
        run_as: addr(0),
        admin: Some(addr(0)),
        code_id,
        label: "testing".to_string(),
        init_msg: init_msg.to_string().into_bytes(),
        funds: vec![],
    }
}

pub fn migrate_proposal_fixture(contract: &str, code_id: CodeID) -> MigrateContractProposal {
    let migrate_msg = serde_json::json!({ "verifier": addr(1) });
    MigrateContractProposal {
        title: "Foo".to_string(),
        description: "Bar".to_string(),
        run_as: addr(0),
        contract: contract.to_string(),
        code_id,
        migrate_msg: migrate_msg.to_string().into_bytes(),
    }
}

pub fn update_admin_proposal_fixture(contract: &str) -> UpdateAdminProposal {
    UpdateAdminProposal {
        title: "Foo".to_string(),
        description: "Bar".to_string(),
        run_as: addr(0),
        new_admin: addr(2),
        contract: contract.to_string(),
    }
}

pub fn clear_admin_proposal_fixture(contract: &str) -> ClearAdminProposal {
    ClearAdminProposal {
        title: "Foo".to_string(),
        description: "Bar".to_string(),
        run_as: addr(0),
        contract: contract.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::is_valid_address;

    #[test]
    fn test_fixed_bytes_are_predictable() {
        let mut source = FixedBytes::new(254);
        assert_eq!(source.bytes(4), vec![254, 255, 0, 1]);
        assert_eq!(source.bytes(1), vec![2]);
    }

    #[test]
    fn test_fixtures_are_valid() {
        let mut source = FastrandBytes::new();
        let code = code_fixture(&mut source, 1);
        assert!(code.code_info.matches(&code.code_bytes));
        assert!(is_valid_address(&code.code_info.creator, DEFAULT_BECH32_PREFIX));

        let genesis = genesis_fixture(&mut source);
        assert!(genesis.validate(DEFAULT_BECH32_PREFIX).is_ok());
    }
}
