// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Conversion of dynamically decoded values into typed entities.

use alloy_primitives::U256;
use ewx_rewards::ChainError;
use subxt::ext::scale_value::{At, Composite, Value, ValueDef};

fn decode_err(what: &str, reason: impl Into<String>) -> ChainError {
    ChainError::Decode { what: what.to_string(), reason: reason.into() }
}

/// Unwrap single-field wrappers such as `Percent(u8)` or `Balance { amount }`.
fn inner<T>(value: &Value<T>) -> &Value<T> {
    match &value.value {
        ValueDef::Composite(Composite::Unnamed(values)) if values.len() == 1 => inner(&values[0]),
        ValueDef::Composite(Composite::Named(fields)) if fields.len() == 1 => inner(&fields[0].1),
        _ => value,
    }
}

pub(crate) fn field<'a, T>(value: &'a Value<T>, name: &str, what: &str) -> Result<&'a Value<T>, ChainError> {
    value.at(name).ok_or_else(|| decode_err(what, format!("missing field `{name}`")))
}

pub(crate) fn u128_of<T>(value: &Value<T>, what: &str) -> Result<u128, ChainError> {
    inner(value).as_u128().ok_or_else(|| decode_err(what, "expected an unsigned integer"))
}

pub(crate) fn u64_of<T>(value: &Value<T>, what: &str) -> Result<u64, ChainError> {
    let raw = u128_of(value, what)?;
    u64::try_from(raw).map_err(|_| decode_err(what, format!("{raw} does not fit in 64 bits")))
}

pub(crate) fn amount_of<T>(value: &Value<T>, what: &str) -> Result<U256, ChainError> {
    u128_of(value, what).map(U256::from)
}

/// First field of an event or tuple payload.
pub(crate) fn first_field<'a, T>(fields: &'a Composite<T>, what: &str) -> Result<&'a Value<T>, ChainError> {
    let first = match fields {
        Composite::Named(named) => named.first().map(|(_, value)| value),
        Composite::Unnamed(values) => values.first(),
    };
    first.ok_or_else(|| decode_err(what, "payload has no fields"))
}

/// Period encoded as the last key of a concat-hashed storage key.
pub(crate) fn trailing_u64_key(key: &[u8], what: &str) -> Result<u64, ChainError> {
    let tail = key
        .len()
        .checked_sub(8)
        .and_then(|start| key.get(start..))
        .ok_or_else(|| decode_err(what, format!("storage key of {} bytes is too short", key.len())))?;
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(tail);
    Ok(u64::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_integers() {
        let plain = Value::u128(60);
        let wrapped = Value::unnamed_composite([Value::u128(60)]);
        let named = Value::named_composite([("amount", Value::u128(60))]);
        for value in [plain, wrapped, named] {
            assert_eq!(u64_of(&value, "threshold").unwrap(), 60);
        }
        assert!(u64_of(&Value::bool(true), "threshold").is_err());
        assert!(u64_of(&Value::u128(u128::from(u64::MAX) + 1), "threshold").is_err());
    }

    #[test]
    fn test_named_fields() {
        let period = Value::named_composite([
            ("current", Value::u128(120)),
            ("first_block", Value::u128(864_000)),
            ("length", Value::u128(7_200)),
        ]);
        assert_eq!(u64_of(field(&period, "length", "period").unwrap(), "length").unwrap(), 7_200);
        assert!(field(&period, "missing", "period").is_err());
    }

    #[test]
    fn test_trailing_key() {
        let mut key = vec![0xaa; 48];
        key.extend_from_slice(&42u64.to_le_bytes());
        assert_eq!(trailing_u64_key(&key, "stake record").unwrap(), 42);
        assert!(trailing_u64_key(&[1, 2, 3], "stake record").is_err());
    }
}
