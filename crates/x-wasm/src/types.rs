/// CosmWasm Module Types
///
/// Following Cosmos SDK x/wasm module architecture for contract deployment and management

use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::json_types::U128;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::access::AccessConfig;

/// CodeID uniquely identifies stored WASM code
pub type CodeID = u64;

/// ContractAddress is the unique bech32 address of an instantiated contract
pub type ContractAddress = String;

/// Coin represents a parsed token amount in the smallest unit
///
/// The amount crosses JSON as a decimal string.
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Coin {
    pub denom: String,
    pub amount: U128,
}

impl Coin {
    pub fn new(denom: &str, amount: u128) -> Self {
        Self {
            denom: denom.to_string(),
            amount: U128(amount),
        }
    }
}

/// Block height plus intra-block index at which a contract was created
#[derive(
    BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Default,
)]
pub struct AbsoluteTxPosition {
    pub block_height: u64,
    pub tx_index: u64,
}

impl AbsoluteTxPosition {
    pub fn new(block_height: u64, tx_index: u64) -> Self {
        Self { block_height, tx_index }
    }
}

/// CodeInfo stores metadata about uploaded WASM code
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CodeInfo {
    /// sha256 of the exact uploaded bytes
    #[serde(with = "hex_bytes")]
    pub code_hash: Vec<u8>,
    pub creator: String,
    pub source: String,
    pub builder: String,
    pub instantiate_config: AccessConfig,
}

impl CodeInfo {
    pub fn matches(&self, wasm_code: &[u8]) -> bool {
        self.code_hash == code_hash(wasm_code)
    }
}

/// Digest stored in `CodeInfo::code_hash`
pub fn code_hash(wasm_code: &[u8]) -> Vec<u8> {
    Sha256::digest(wasm_code).to_vec()
}

/// Code is stored bytecode together with its metadata
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Code {
    pub code_id: CodeID,
    pub code_info: CodeInfo,
    #[serde(with = "base64_bytes")]
    pub code_bytes: Vec<u8>,
}

/// ContractInfo stores metadata about an instantiated contract
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ContractInfo {
    pub code_id: CodeID,
    pub creator: String,
    pub admin: Option<String>,
    pub label: String,
    /// Set on instantiation, never changed afterwards. Absent for contracts
    /// imported from genesis.
    pub created: Option<AbsoluteTxPosition>,
}

/// One key/value pair of contract state
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Model {
    #[serde(with = "base64_bytes")]
    pub key: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub value: Vec<u8>,
}

/// Contract is an instance address with its metadata and state
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Contract {
    pub contract_address: ContractAddress,
    pub contract_info: ContractInfo,
    pub contract_state: Vec<Model>,
}

/// Sequence is the persisted value of one ID allocator namespace
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Sequence {
    #[serde(with = "base64_bytes")]
    pub id_key: Vec<u8>,
    pub value: u64,
}

#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CodeHistoryOperation {
    Init,
    Migrate,
    Genesis,
}

/// Entry in a contract's code history
#[derive(BorshDeserialize, BorshSerialize, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ContractCodeHistoryEntry {
    pub operation: CodeHistoryOperation,
    pub code_id: CodeID,
    #[serde(with = "base64_bytes")]
    pub msg: Vec<u8>,
}

/// Serde adapter writing byte fields as standard base64 strings
pub mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<T: AsRef<[u8]>, S: Serializer>(bytes: T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes.as_ref()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

/// Serde adapter writing digests as lowercase hex
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<T: AsRef<[u8]>, S: Serializer>(bytes: T, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes.as_ref()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        hex::decode(encoded).map_err(serde::de::Error::custom)
    }
}
