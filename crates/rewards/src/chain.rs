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

//! The chain access boundary.
//!
//! Implementations decode raw storage and event payloads into the typed entities of
//! [crate::types]; nothing past this trait ever inspects an encoded value.

use alloy_primitives::B256;
use async_trait::async_trait;

use crate::{
    error::ChainError,
    types::{Address, BlockRef, GroupConfig, GroupNamespace, PeriodDescriptor, RewardTotals, StakeLedger},
};

/// Name of the event that marks reward distribution for a period.
pub const REWARDS_CALCULATED_EVENT: &str = "RewardsCalculatedForPeriod";
/// Name of the per-address event written while a distribution round is processed.
pub const EARNED_REWARD_EVENT: &str = "EarnedRewardCalculated";

/// An event of interest emitted at a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainEvent {
    /// Rewards for `period` have been calculated.
    RewardsCalculatedForPeriod { period: u64 },
    /// A reward was written for one address.
    EarnedRewardCalculated,
    /// Anything else, kept for logging.
    Other { pallet: String, variant: String },
}

impl ChainEvent {
    pub fn is_distribution_for(&self, target: u64) -> bool {
        matches!(self, ChainEvent::RewardsCalculatedForPeriod { period } if *period == target)
    }

    pub fn is_earned_reward(&self) -> bool {
        matches!(self, ChainEvent::EarnedRewardCalculated)
    }
}

/// True if `events` contain the distribution event for `target`.
pub fn contains_distribution(events: &[ChainEvent], target: u64) -> bool {
    events.iter().any(|event| event.is_distribution_for(target))
}

/// Per-period, per-group voting round counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodCounter {
    /// All voting rounds of the group in the period.
    TotalVotingRounds,
    /// Rounds in which the participant was represented through a nomination.
    RoundsWithNomination,
    /// Nominated rounds that were still the operator's own obligation.
    OperatorRoundsWithNomination,
}

/// Optional storage that only some runtimes carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    OperatorNominationCounter,
}

/// Read-only, block-pinned access to the worker node pallet state.
///
/// Every storage read takes an explicit block so concurrent reads never race on the chain head.
/// `Ok(None)` means the storage item is absent at that block.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Number of the current best block.
    async fn best_block_number(&self) -> Result<u64, ChainError>;

    async fn block_hash(&self, number: u64) -> Result<BlockRef, ChainError>;

    async fn block_number(&self, hash: B256) -> Result<u64, ChainError>;

    async fn events_at(&self, block: &BlockRef) -> Result<Vec<ChainEvent>, ChainError>;

    /// Active reward period at the best block.
    async fn current_period(&self) -> Result<PeriodDescriptor, ChainError>;

    /// Reward period that was active at `block`.
    async fn period_at(&self, block: &BlockRef) -> Result<PeriodDescriptor, ChainError>;

    async fn stake_ledger(
        &self,
        block: &BlockRef,
        group: &GroupNamespace,
        address: &Address,
    ) -> Result<Option<StakeLedger>, ChainError>;

    async fn group_config(
        &self,
        block: &BlockRef,
        group: &GroupNamespace,
    ) -> Result<Option<GroupConfig>, ChainError>;

    async fn period_counter(
        &self,
        block: &BlockRef,
        counter: PeriodCounter,
        group: &GroupNamespace,
        period: u64,
    ) -> Result<Option<u64>, ChainError>;

    async fn correct_votes(
        &self,
        block: &BlockRef,
        group: &GroupNamespace,
        period: u64,
        address: &Address,
    ) -> Result<Option<u64>, ChainError>;

    async fn reward_totals(
        &self,
        block: &BlockRef,
        group: &GroupNamespace,
        address: &Address,
    ) -> Result<Option<RewardTotals>, ChainError>;

    /// Number of system voting round records stored for `period`.
    async fn system_voting_rounds(&self, block: &BlockRef, period: u64) -> Result<u64, ChainError>;

    /// Whether the connected runtime exposes `capability`.
    async fn supports(&self, capability: Capability) -> Result<bool, ChainError>;
}
