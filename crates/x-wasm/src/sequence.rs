/// Namespaced monotonic ID allocation
///
/// Counters start at 1 and the stored value is always the next ID to hand out.
/// Allocation takes `&mut self`; inside a NEAR receipt that exclusive borrow is
/// the whole of the read-increment-write atomicity this needs.

use near_sdk::borsh::{self, BorshDeserialize, BorshSerialize};
use near_sdk::collections::TreeMap;

use crate::error::{WasmError, WasmResult};
use crate::types::Sequence;

/// Namespace for code IDs
pub const KEY_LAST_CODE_ID: &[u8] = b"lastCodeId";

/// Namespace for contract instance ordinals
pub const KEY_LAST_INSTANCE_ID: &[u8] = b"lastContractId";

const FIRST_ID: u64 = 1;

#[derive(BorshDeserialize, BorshSerialize)]
pub struct Sequences {
    counters: TreeMap<Vec<u8>, u64>,
}

impl Sequences {
    pub fn new(prefix: &[u8]) -> Self {
        Self {
            counters: TreeMap::new(prefix.to_vec()),
        }
    }

    /// Value the next allocation in `namespace` will return
    pub fn peek(&self, namespace: &[u8]) -> u64 {
        self.counters.get(&namespace.to_vec()).unwrap_or(FIRST_ID)
    }

    /// Allocate the next ID in `namespace`
    pub fn next(&mut self, namespace: &[u8]) -> WasmResult<u64> {
        let id = self.peek(namespace);
        let following = id
            .checked_add(1)
            .ok_or_else(|| WasmError::InvalidRequest(format!("sequence {} exhausted", String::from_utf8_lossy(namespace))))?;
        self.counters.insert(&namespace.to_vec(), &following);
        Ok(id)
    }

    /// Overwrite a namespace, used by genesis import only
    pub(crate) fn set(&mut self, namespace: &[u8], value: u64) {
        self.counters.insert(&namespace.to_vec(), &value);
    }

    /// All namespaces in key order
    pub fn export(&self) -> Vec<Sequence> {
        self.counters
            .iter()
            .map(|(id_key, value)| Sequence { id_key, value })
            .collect()
    }
}
