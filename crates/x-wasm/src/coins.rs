/// Amount and coin validation
///
/// Contracts emit amounts as decimal strings in the smallest unit. They are
/// parsed into `u128` here; anything that is not a plain run of ASCII digits is
/// rejected.

use near_sdk::json_types::U128;

use crate::error::{WasmError, WasmResult};
use crate::messages::WasmCoin;
use crate::types::Coin;

/// Parse a non-negative integer amount
///
/// `str::parse::<u128>` alone would accept a leading `+`, so the digits are
/// checked first.
pub fn parse_amount(amount: &str) -> WasmResult<u128> {
    if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
        return Err(WasmError::InvalidAmount(amount.to_string()));
    }
    amount
        .parse::<u128>()
        .map_err(|_| WasmError::InvalidAmount(amount.to_string()))
}

pub fn parse_coin(coin: &WasmCoin) -> WasmResult<Coin> {
    Ok(Coin {
        denom: coin.denom.clone(),
        amount: U128(parse_amount(&coin.amount)?),
    })
}

/// Parse every coin in order, stopping at the first bad amount
pub fn parse_coins(coins: &[WasmCoin]) -> WasmResult<Vec<Coin>> {
    coins.iter().map(parse_coin).collect()
}

/// Denoms are 3-128 chars: a letter followed by letters, digits or `/:._-`
pub fn validate_denom(denom: &str) -> WasmResult<()> {
    let bytes = denom.as_bytes();
    let valid = (3..=128).contains(&bytes.len())
        && bytes[0].is_ascii_alphabetic()
        && bytes[1..]
            .iter()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'/' | b':' | b'.' | b'_' | b'-'));
    if valid {
        Ok(())
    } else {
        Err(WasmError::InvalidDenom(denom.to_string()))
    }
}

/// Funds attached to an instantiation must be positive, with valid denoms,
/// sorted by denom and free of duplicates.
pub fn validate_coins(coins: &[Coin]) -> WasmResult<()> {
    for coin in coins {
        validate_denom(&coin.denom)?;
        if coin.amount.0 == 0 {
            return Err(WasmError::InvalidAmount(format!("0{}", coin.denom)));
        }
    }
    for pair in coins.windows(2) {
        if pair[0].denom >= pair[1].denom {
            return Err(WasmError::InvalidDenom(format!(
                "coins must be sorted and unique: {} before {}",
                pair[0].denom, pair[1].denom
            )));
        }
    }
    Ok(())
}
