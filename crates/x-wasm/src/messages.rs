/// Message types on both sides of the encoder
///
/// `CosmosMsg` is what a contract emits: untrusted, amounts still strings.
/// `NativeMsg` is what the host's handlers accept: amounts parsed and the
/// sender fixed to the emitting contract.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::types::{base64_bytes, CodeID, Coin};

// ============================================================================
// CONTRACT-EMITTED MESSAGES
// ============================================================================

/// CosmWasm coin representation, amount as a decimal string
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WasmCoin {
    pub denom: String,
    pub amount: String,
}

impl WasmCoin {
    pub fn new(denom: &str, amount: &str) -> Self {
        Self {
            denom: denom.to_string(),
            amount: amount.to_string(),
        }
    }
}

/// CosmWasm message types
///
/// Kinds this module does not model (`stargate`, `ibc`, `gov`, ...) still
/// decode, as `Unknown`, so the encoder can reject them by name.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum CosmosMsg {
    Bank(BankMsg),
    Wasm(WasmMsg),
    Staking(StakingMsg),
    Custom(Value),
    #[serde(untagged)]
    Unknown(Map<String, Value>),
}

const KNOWN_KINDS: &[&str] = &["bank", "wasm", "staking", "custom"];

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum KnownMsg {
    Bank(BankMsg),
    Wasm(WasmMsg),
    Staking(StakingMsg),
    Custom(Value),
}

impl From<KnownMsg> for CosmosMsg {
    fn from(msg: KnownMsg) -> Self {
        match msg {
            KnownMsg::Bank(msg) => CosmosMsg::Bank(msg),
            KnownMsg::Wasm(msg) => CosmosMsg::Wasm(msg),
            KnownMsg::Staking(msg) => CosmosMsg::Staking(msg),
            KnownMsg::Custom(msg) => CosmosMsg::Custom(msg),
        }
    }
}

impl<'de> Deserialize<'de> for CosmosMsg {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = Map::<String, Value>::deserialize(deserializer)?;
        let known = match map.keys().next() {
            Some(kind) if map.len() == 1 => KNOWN_KINDS.contains(&kind.as_str()),
            _ => return Err(de::Error::custom("message must carry exactly one kind")),
        };
        if known {
            KnownMsg::deserialize(Value::Object(map))
                .map(CosmosMsg::from)
                .map_err(de::Error::custom)
        } else {
            Ok(CosmosMsg::Unknown(map))
        }
    }
}

impl CosmosMsg {
    /// Short name of the variant, used in errors and logs
    pub fn kind(&self) -> &str {
        match self {
            CosmosMsg::Bank(BankMsg::Send { .. }) => "bank/send",
            CosmosMsg::Bank(BankMsg::Burn { .. }) => "bank/burn",
            CosmosMsg::Wasm(WasmMsg::Execute { .. }) => "wasm/execute",
            CosmosMsg::Wasm(WasmMsg::Instantiate { .. }) => "wasm/instantiate",
            CosmosMsg::Wasm(WasmMsg::Migrate { .. }) => "wasm/migrate",
            CosmosMsg::Wasm(WasmMsg::UpdateAdmin { .. }) => "wasm/update_admin",
            CosmosMsg::Wasm(WasmMsg::ClearAdmin { .. }) => "wasm/clear_admin",
            CosmosMsg::Staking(_) => "staking",
            CosmosMsg::Custom(_) => "custom",
            CosmosMsg::Unknown(map) => map.keys().next().map(String::as_str).unwrap_or("unknown"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum BankMsg {
    Send {
        from_address: String,
        to_address: String,
        amount: Vec<WasmCoin>,
    },
    Burn {
        amount: Vec<WasmCoin>,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum WasmMsg {
    Execute {
        contract_addr: String,
        #[serde(with = "base64_bytes")]
        msg: Vec<u8>,
        send: Vec<WasmCoin>,
    },
    Instantiate {
        code_id: CodeID,
        #[serde(with = "base64_bytes")]
        msg: Vec<u8>,
        send: Vec<WasmCoin>,
    },
    Migrate {
        contract_addr: String,
        new_code_id: CodeID,
        #[serde(with = "base64_bytes")]
        msg: Vec<u8>,
    },
    UpdateAdmin {
        contract_addr: String,
        admin: String,
    },
    ClearAdmin {
        contract_addr: String,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StakingMsg {
    Delegate { validator: String, amount: WasmCoin },
    Undelegate { validator: String, amount: WasmCoin },
    Redelegate { src_validator: String, dst_validator: String, amount: WasmCoin },
    Withdraw { validator: String, recipient: Option<String> },
}

// ============================================================================
// NATIVE MESSAGES
// ============================================================================

/// MsgSend represents a message to send coins from one account to another.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MsgSend {
    pub from_address: String,
    pub to_address: String,
    pub amount: Vec<Coin>,
}

/// MsgExecuteContract calls a contract with a raw message and attached funds.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MsgExecuteContract {
    pub sender: String,
    pub contract: String,
    #[serde(with = "base64_bytes")]
    pub msg: Vec<u8>,
    pub funds: Vec<Coin>,
}

/// MsgInstantiateContract creates a contract instance from stored code.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MsgInstantiateContract {
    pub sender: String,
    pub code_id: CodeID,
    pub label: String,
    #[serde(with = "base64_bytes")]
    pub init_msg: Vec<u8>,
    pub funds: Vec<Coin>,
}

/// Native message handed to the host dispatcher, tagged by handler
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type_url", content = "value")]
pub enum NativeMsg {
    #[serde(rename = "/cosmos.bank.v1beta1.MsgSend")]
    Send(MsgSend),
    #[serde(rename = "/cosmwasm.wasm.v1.MsgExecuteContract")]
    ExecuteContract(MsgExecuteContract),
    #[serde(rename = "/cosmwasm.wasm.v1.MsgInstantiateContract")]
    InstantiateContract(MsgInstantiateContract),
}

/// Which native handler a message is routed to
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NativeMsgKind {
    Transfer,
    ExecuteContract,
    InstantiateContract,
}

impl NativeMsg {
    pub fn kind(&self) -> NativeMsgKind {
        match self {
            NativeMsg::Send(_) => NativeMsgKind::Transfer,
            NativeMsg::ExecuteContract(_) => NativeMsgKind::ExecuteContract,
            NativeMsg::InstantiateContract(_) => NativeMsgKind::InstantiateContract,
        }
    }

    /// Protobuf type URL the host router dispatches on
    pub fn type_url(&self) -> &'static str {
        match self {
            NativeMsg::Send(_) => "/cosmos.bank.v1beta1.MsgSend",
            NativeMsg::ExecuteContract(_) => "/cosmwasm.wasm.v1.MsgExecuteContract",
            NativeMsg::InstantiateContract(_) => "/cosmwasm.wasm.v1.MsgInstantiateContract",
        }
    }
}
