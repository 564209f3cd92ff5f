/// Address handling
///
/// Identities are bech32 strings carrying a 20 byte payload under the module's
/// configured human-readable prefix. Format checks live here; whether an
/// identity is *allowed* to do something is decided by the access model.

use bech32::{FromBase32, ToBase32, Variant};
use near_sdk::AccountId;
use sha2::{Digest, Sha256};

use crate::error::{WasmError, WasmResult};
use crate::types::CodeID;

/// Default bech32 prefix for addresses in our system
pub const DEFAULT_BECH32_PREFIX: &str = "proxima";

/// Length of an account or contract address payload
pub const ADDRESS_LEN: usize = 20;

/// Encode bytes as bech32 address with given prefix
pub fn bech32_encode(hrp: &str, data: &[u8]) -> WasmResult<String> {
    bech32::encode(hrp, data.to_base32(), Variant::Bech32)
        .map_err(|e| WasmError::invalid_address(hrp, format!("cannot encode: {}", e)))
}

/// Decode bech32 address to get the prefix and raw bytes
pub fn bech32_decode(addr: &str) -> Result<(String, Vec<u8>), String> {
    let (hrp, data, variant) = bech32::decode(addr)
        .map_err(|e| format!("invalid bech32: {}", e))?;

    if variant != Variant::Bech32 {
        return Err("invalid bech32 variant".to_string());
    }

    let bytes = Vec::<u8>::from_base32(&data)
        .map_err(|e| format!("invalid base32 data: {}", e))?;

    Ok((hrp, bytes))
}

/// Check that `addr` is a well-formed identity under `prefix`
pub fn validate_address(addr: &str, prefix: &str) -> WasmResult<()> {
    if addr.is_empty() {
        return Err(WasmError::invalid_address(addr, "empty address"));
    }
    let (hrp, bytes) = bech32_decode(addr).map_err(|e| WasmError::invalid_address(addr, e))?;
    if hrp != prefix {
        return Err(WasmError::invalid_address(
            addr,
            format!("expected prefix {}, got {}", prefix, hrp),
        ));
    }
    if bytes.len() != ADDRESS_LEN {
        return Err(WasmError::invalid_address(
            addr,
            format!("expected {} bytes, got {}", ADDRESS_LEN, bytes.len()),
        ));
    }
    Ok(())
}

pub fn is_valid_address(addr: &str, prefix: &str) -> bool {
    validate_address(addr, prefix).is_ok()
}

/// Derive the identity of a NEAR account
///
/// First 20 bytes of sha256(account id), bech32 encoded. Deterministic, so the
/// router and this module agree on who a NEAR caller is.
pub fn account_address(account: &AccountId, prefix: &str) -> WasmResult<String> {
    let hash = Sha256::digest(account.as_str().as_bytes());
    bech32_encode(prefix, &hash[..ADDRESS_LEN])
}

/// Contract address for the `instance_id`-th instantiation of `code_id`
///
/// The pair is hashed as two big-endian u64 values so distinct pairs never
/// share a preimage.
pub fn contract_address(code_id: CodeID, instance_id: u64, prefix: &str) -> WasmResult<String> {
    let mut hasher = Sha256::new();
    hasher.update(code_id.to_be_bytes());
    hasher.update(instance_id.to_be_bytes());
    let hash = hasher.finalize();

    bech32_encode(prefix, &hash[..ADDRESS_LEN])
}
