/// Message Encoder
///
/// Translates messages a contract emits into native host messages. Translation
/// is pure and all-or-nothing: either every resulting message is returned or
/// an error is, never a prefix.
///
/// Addresses inside the messages are passed through as given. Whether a
/// destination exists or a sender may spend is for the native handlers to
/// decide.

use serde_json::Value;

use crate::coins::parse_coins;
use crate::error::{WasmError, WasmResult};
use crate::messages::{
    BankMsg, CosmosMsg, MsgExecuteContract, MsgInstantiateContract, MsgSend, NativeMsg, WasmMsg,
};

/// Encoder for `CosmosMsg::Custom` payloads, supplied by the embedding chain
pub trait CustomEncoder: Send + Sync {
    fn encode(&self, sender: &str, msg: &Value) -> WasmResult<Vec<NativeMsg>>;
}

pub const AUTO_LABEL_PREFIX: &str = "Auto-created by ";

/// Label given to contracts instantiated by other contracts
pub fn auto_label(sender: &str) -> String {
    format!("{}{}", AUTO_LABEL_PREFIX, sender)
}

#[derive(Default)]
pub struct MessageEncoder {
    custom: Option<Box<dyn CustomEncoder>>,
}

impl MessageEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_custom(custom: Box<dyn CustomEncoder>) -> Self {
        Self { custom: Some(custom) }
    }

    /// Encode one message emitted by the contract at `sender`
    pub fn encode(&self, sender: &str, msg: &CosmosMsg) -> WasmResult<Vec<NativeMsg>> {
        match msg {
            CosmosMsg::Bank(bank) => encode_bank_msg(bank),
            CosmosMsg::Wasm(wasm) => encode_wasm_msg(sender, wasm),
            CosmosMsg::Custom(custom) => match &self.custom {
                Some(encoder) => encoder.encode(sender, custom),
                None => Err(WasmError::UnsupportedMessageKind(msg.kind().to_string())),
            },
            _ => Err(WasmError::UnsupportedMessageKind(msg.kind().to_string())),
        }
    }

    /// Encode a batch; one failure discards the whole batch
    pub fn encode_all(&self, sender: &str, msgs: &[CosmosMsg]) -> WasmResult<Vec<NativeMsg>> {
        let mut out = Vec::with_capacity(msgs.len());
        for msg in msgs {
            out.extend(self.encode(sender, msg)?);
        }
        Ok(out)
    }
}

fn encode_bank_msg(msg: &BankMsg) -> WasmResult<Vec<NativeMsg>> {
    match msg {
        BankMsg::Send {
            from_address,
            to_address,
            amount,
        } => Ok(vec![NativeMsg::Send(MsgSend {
            from_address: from_address.clone(),
            to_address: to_address.clone(),
            amount: parse_coins(amount)?,
        })]),
        BankMsg::Burn { .. } => Err(WasmError::UnsupportedMessageKind("bank/burn".to_string())),
    }
}

fn encode_wasm_msg(sender: &str, msg: &WasmMsg) -> WasmResult<Vec<NativeMsg>> {
    match msg {
        WasmMsg::Execute {
            contract_addr,
            msg,
            send,
        } => Ok(vec![NativeMsg::ExecuteContract(MsgExecuteContract {
            sender: sender.to_string(),
            contract: contract_addr.clone(),
            msg: msg.clone(),
            funds: parse_coins(send)?,
        })]),
        WasmMsg::Instantiate { code_id, msg, send } => {
            Ok(vec![NativeMsg::InstantiateContract(MsgInstantiateContract {
                sender: sender.to_string(),
                code_id: *code_id,
                label: auto_label(sender),
                init_msg: msg.clone(),
                funds: parse_coins(send)?,
            })])
        }
        other => Err(WasmError::UnsupportedMessageKind(
            CosmosMsg::Wasm(other.clone()).kind().to_string(),
        )),
    }
}
