/// Structured events
///
/// Every successful registry mutation logs one NEP-297 event
/// (`EVENT_JSON:{...}`) so indexers can follow codes and contracts without
/// reading contract state.

use near_sdk::env;
use serde::Serialize;

use crate::access::AccessConfig;
use crate::types::{CodeID, Coin};

pub const EVENT_STANDARD: &str = "xwasm";
pub const EVENT_VERSION: &str = "1.0.0";

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum WasmEvent<'a> {
    StoreCode {
        code_id: CodeID,
        creator: &'a str,
        code_hash: String,
        instantiate_config: &'a AccessConfig,
    },
    Instantiate {
        code_id: CodeID,
        contract: &'a str,
        creator: &'a str,
        admin: Option<&'a str>,
        label: &'a str,
        funds: &'a [Coin],
    },
    Migrate {
        contract: &'a str,
        old_code_id: CodeID,
        new_code_id: CodeID,
        caller: &'a str,
    },
    UpdateAdmin {
        contract: &'a str,
        new_admin: &'a str,
        caller: &'a str,
    },
    ClearAdmin {
        contract: &'a str,
        caller: &'a str,
    },
    UpdateInstantiateConfig {
        code_id: CodeID,
        instantiate_config: &'a AccessConfig,
        caller: &'a str,
    },
    ExecuteProposal {
        proposal_type: &'a str,
        title: &'a str,
        run_as: &'a str,
    },
}

#[derive(Serialize)]
struct EventLog<'a> {
    standard: &'static str,
    version: &'static str,
    #[serde(flatten)]
    event: &'a WasmEvent<'a>,
}

impl WasmEvent<'_> {
    pub fn to_log_string(&self) -> String {
        let log = EventLog {
            standard: EVENT_STANDARD,
            version: EVENT_VERSION,
            event: self,
        };
        // Serializing plain strings and numbers cannot fail
        format!("EVENT_JSON:{}", serde_json::to_string(&log).unwrap_or_default())
    }

    pub fn emit(&self) {
        env::log_str(&self.to_log_string());
    }
}
