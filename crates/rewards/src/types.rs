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

//! Typed projections of the chain state read during an analysis run.

use std::{collections::BTreeMap, fmt, str::FromStr};

use alloy_primitives::{B256, I256, U256};

use crate::error::AuditError;

/// The reward period descriptor as exposed by the chain.
///
/// Only the currently active descriptor is stored on chain. Past periods are derived from it
/// assuming `length` never changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodDescriptor {
    /// Index of the period.
    pub index: u64,
    /// Number of the first block of the period.
    pub first_block: u64,
    /// Length of the period in blocks.
    pub length: u64,
}

/// A block identifier, optionally with its resolved number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRef {
    pub hash: B256,
    pub number: Option<u64>,
}

impl BlockRef {
    pub fn new(hash: B256, number: u64) -> Self {
        Self { hash, number: Some(number) }
    }

    /// A block known only by its hash.
    pub fn from_hash(hash: B256) -> Self {
        Self { hash, number: None }
    }
}

impl fmt::Display for BlockRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.number {
            Some(number) => write!(f, "#{number} ({:#x})", self.hash),
            None => write!(f, "{:#x}", self.hash),
        }
    }
}

/// Stake records of one address in one solution group, keyed by the period in which the stake
/// was last changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StakeLedger {
    entries: BTreeMap<u64, U256>,
}

impl StakeLedger {
    pub fn new(entries: impl IntoIterator<Item = (u64, U256)>) -> Self {
        Self { entries: entries.into_iter().collect() }
    }

    /// The entry with the highest update period, which is the only one in effect.
    pub fn latest(&self) -> Option<(u64, U256)> {
        self.entries.last_key_value().map(|(period, stake)| (*period, *stake))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(u64, U256)> for StakeLedger {
    fn from_iter<T: IntoIterator<Item = (u64, U256)>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// Namespace identifying a solution group.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupNamespace(String);

impl GroupNamespace {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for GroupNamespace {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(AuditError::Validation {
                field: "group namespace",
                reason: "must not be empty".into(),
            });
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl fmt::Display for GroupNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An SS58-encoded participant address.
///
/// Only the shape is checked here (base58 alphabet, payload length of a 32-byte account with a
/// one or two byte prefix and a two byte checksum). The transport re-parses the address with full
/// checksum validation before using it as a storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let decoded = bs58::decode(trimmed).into_vec().map_err(|err| AuditError::Validation {
            field: "address",
            reason: format!("not valid base58: {err}"),
        })?;
        // 1 or 2 prefix bytes + 32 account bytes + 2 checksum bytes.
        if !matches!(decoded.len(), 35 | 36) {
            return Err(AuditError::Validation {
                field: "address",
                reason: format!("unexpected SS58 payload length {}", decoded.len()),
            });
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Solution group configuration relevant to the SLA check.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupConfig {
    pub namespace: GroupNamespace,
    /// Minimum share of eligible rounds, in percent, a participant must vote in.
    pub sla_voting_threshold_percent: f64,
}

/// Accumulated rewards of an address within a group, in minor units (10^18 per EWT).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewardTotals {
    pub subscription: U256,
    pub voting: U256,
}

impl RewardTotals {
    pub const ZERO: Self = Self { subscription: U256::ZERO, voting: U256::ZERO };

    pub fn new(subscription: U256, voting: U256) -> Self {
        Self { subscription, voting }
    }

    /// Component-wise `later - self`. The result is signed; nothing is clamped.
    pub fn delta_to(&self, later: &RewardTotals) -> RewardDelta {
        RewardDelta {
            subscription: signed_sub(later.subscription, self.subscription),
            voting: signed_sub(later.voting, self.voting),
        }
    }
}

/// Signed difference between two [RewardTotals].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewardDelta {
    pub subscription: I256,
    pub voting: I256,
}

impl RewardDelta {
    /// True if any component went backwards, which means the two blocks were chosen wrongly.
    pub fn is_negative(&self) -> bool {
        self.subscription.is_negative() || self.voting.is_negative()
    }
}

fn signed_sub(lhs: U256, rhs: U256) -> I256 {
    if lhs >= rhs {
        I256::try_from(lhs - rhs).unwrap_or(I256::MAX)
    } else {
        -I256::try_from(rhs - lhs).unwrap_or(I256::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_latest_is_highest_period() {
        let ledger: StakeLedger =
            [(7, U256::from(10)), (3, U256::from(99)), (5, U256::from(1))].into_iter().collect();
        assert_eq!(ledger.latest(), Some((7, U256::from(10))));
        assert_eq!(ledger.len(), 3);
        assert!(StakeLedger::default().latest().is_none());
    }

    #[test]
    fn namespace_rejects_blank() {
        assert!("  ".parse::<GroupNamespace>().is_err());
        assert_eq!("energyweb.smartflow ".parse::<GroupNamespace>().unwrap().as_str(), "energyweb.smartflow");
    }

    #[test]
    fn address_shape() {
        // Well-known development account (Alice), generic substrate prefix.
        assert!("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY".parse::<Address>().is_ok());
        assert!("not-an-address".parse::<Address>().is_err());
        assert!("5Grwva".parse::<Address>().is_err());
    }

    #[test]
    fn delta_is_signed() {
        let before = RewardTotals::new(U256::from(10), U256::from(5));
        let after = RewardTotals::new(U256::from(15), U256::from(3));
        let delta = before.delta_to(&after);
        assert_eq!(delta.subscription, I256::try_from(5i64).unwrap());
        assert_eq!(delta.voting, I256::try_from(-2i64).unwrap());
        assert!(delta.is_negative());
    }
}
