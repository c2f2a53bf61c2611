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

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use alloy_primitives::{keccak256, B256};
use async_trait::async_trait;
use ewx_rewards::{
    Address, BlockRef, Capability, ChainClient, ChainError, ChainEvent, GroupConfig,
    GroupNamespace, PeriodCounter, PeriodDescriptor, RewardTotals, StakeLedger,
};

/// Deterministic hash of block `number` on a [MockChain].
pub fn block_hash(number: u64) -> B256 {
    keccak256(number.to_be_bytes())
}

/// Storage values that take effect at a block and stay until overwritten.
#[derive(Debug)]
struct History<T>(BTreeMap<u64, T>);

impl<T> Default for History<T> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<T: Clone> History<T> {
    fn set(&mut self, from_block: u64, value: T) {
        self.0.insert(from_block, value);
    }

    fn at(&self, block: u64) -> Option<T> {
        self.0.range(..=block).next_back().map(|(_, value)| value.clone())
    }
}

/// An in-memory chain of `best + 1` blocks holding the state of a single participant.
///
/// Group and address keys are ignored: every read returns the participant's state as of the
/// requested block.
#[derive(Debug)]
pub struct MockChain {
    current: PeriodDescriptor,
    best: u64,
    events: HashMap<u64, Vec<ChainEvent>>,
    failing_blocks: HashSet<u64>,
    read_delay: Option<Duration>,
    stake_ledger: History<StakeLedger>,
    group_config: History<f64>,
    counters: HashMap<PeriodCounter, History<u64>>,
    votes: History<u64>,
    rewards: History<RewardTotals>,
    system_voting_rounds: HashMap<u64, u64>,
    operator_counter: bool,
    events_calls: AtomicUsize,
    supports_calls: AtomicUsize,
}

impl MockChain {
    pub fn new(current: PeriodDescriptor, best: u64) -> Self {
        Self {
            current,
            best,
            events: HashMap::new(),
            failing_blocks: HashSet::new(),
            read_delay: None,
            stake_ledger: History::default(),
            group_config: History::default(),
            counters: HashMap::new(),
            votes: History::default(),
            rewards: History::default(),
            system_voting_rounds: HashMap::new(),
            operator_counter: true,
            events_calls: AtomicUsize::new(0),
            supports_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_event(mut self, block: u64, event: ChainEvent) -> Self {
        self.events.entry(block).or_default().push(event);
        self
    }

    /// Emit `EarnedRewardCalculated` at every block in `blocks`.
    pub fn with_earned_rewards(mut self, blocks: impl IntoIterator<Item = u64>) -> Self {
        for block in blocks {
            self = self.with_event(block, ChainEvent::EarnedRewardCalculated);
        }
        self
    }

    /// Make every read of `block`'s events fail.
    pub fn with_failing_block(mut self, block: u64) -> Self {
        self.failing_blocks.insert(block);
        self
    }

    /// Make every read of a block's events take `delay`.
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub fn with_stake_ledger(mut self, from_block: u64, ledger: StakeLedger) -> Self {
        self.stake_ledger.set(from_block, ledger);
        self
    }

    pub fn with_sla_threshold(mut self, from_block: u64, percent: f64) -> Self {
        self.group_config.set(from_block, percent);
        self
    }

    pub fn with_counter(mut self, from_block: u64, counter: PeriodCounter, value: u64) -> Self {
        self.counters.entry(counter).or_default().set(from_block, value);
        self
    }

    pub fn with_votes(mut self, from_block: u64, votes: u64) -> Self {
        self.votes.set(from_block, votes);
        self
    }

    pub fn with_rewards(mut self, from_block: u64, rewards: RewardTotals) -> Self {
        self.rewards.set(from_block, rewards);
        self
    }

    pub fn with_system_voting_rounds(mut self, period: u64, rounds: u64) -> Self {
        self.system_voting_rounds.insert(period, rounds);
        self
    }

    pub fn with_operator_counter(mut self, supported: bool) -> Self {
        self.operator_counter = supported;
        self
    }

    /// Number of [ChainClient::events_at] calls so far.
    pub fn events_calls(&self) -> usize {
        self.events_calls.load(Ordering::SeqCst)
    }

    /// Number of [ChainClient::supports] calls so far.
    pub fn supports_calls(&self) -> usize {
        self.supports_calls.load(Ordering::SeqCst)
    }

    fn number_of(&self, block: &BlockRef) -> Result<u64, ChainError> {
        match block.number {
            Some(number) if number <= self.best => Ok(number),
            Some(number) => Err(ChainError::UnknownBlock(number)),
            None => (0..=self.best)
                .find(|number| block_hash(*number) == block.hash)
                .ok_or(ChainError::UnknownHash(block.hash)),
        }
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn best_block_number(&self) -> Result<u64, ChainError> {
        Ok(self.best)
    }

    async fn block_hash(&self, number: u64) -> Result<BlockRef, ChainError> {
        if number > self.best {
            return Err(ChainError::UnknownBlock(number));
        }
        Ok(BlockRef::new(block_hash(number), number))
    }

    async fn block_number(&self, hash: B256) -> Result<u64, ChainError> {
        self.number_of(&BlockRef::from_hash(hash))
    }

    async fn events_at(&self, block: &BlockRef) -> Result<Vec<ChainEvent>, ChainError> {
        self.events_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        let number = self.number_of(block)?;
        if self.failing_blocks.contains(&number) {
            return Err(ChainError::Rpc(format!("connection reset reading block #{number}")));
        }
        Ok(self.events.get(&number).cloned().unwrap_or_default())
    }

    async fn current_period(&self) -> Result<PeriodDescriptor, ChainError> {
        Ok(self.current)
    }

    /// Periods before the current one are derived from its geometry.
    async fn period_at(&self, block: &BlockRef) -> Result<PeriodDescriptor, ChainError> {
        let number = self.number_of(block)?;
        let PeriodDescriptor { index, first_block, length } = self.current;
        if number >= first_block {
            return Ok(self.current);
        }
        let back = (first_block - number).div_ceil(length).min(index);
        Ok(PeriodDescriptor {
            index: index - back,
            first_block: first_block.saturating_sub(back * length),
            length,
        })
    }

    async fn stake_ledger(
        &self,
        block: &BlockRef,
        _group: &GroupNamespace,
        _address: &Address,
    ) -> Result<Option<StakeLedger>, ChainError> {
        Ok(self.stake_ledger.at(self.number_of(block)?))
    }

    async fn group_config(
        &self,
        block: &BlockRef,
        group: &GroupNamespace,
    ) -> Result<Option<GroupConfig>, ChainError> {
        let threshold = self.group_config.at(self.number_of(block)?);
        Ok(threshold.map(|percent| GroupConfig {
            namespace: group.clone(),
            sla_voting_threshold_percent: percent,
        }))
    }

    async fn period_counter(
        &self,
        block: &BlockRef,
        counter: PeriodCounter,
        _group: &GroupNamespace,
        _period: u64,
    ) -> Result<Option<u64>, ChainError> {
        let number = self.number_of(block)?;
        Ok(self.counters.get(&counter).and_then(|history| history.at(number)))
    }

    async fn correct_votes(
        &self,
        block: &BlockRef,
        _group: &GroupNamespace,
        _period: u64,
        _address: &Address,
    ) -> Result<Option<u64>, ChainError> {
        Ok(self.votes.at(self.number_of(block)?))
    }

    async fn reward_totals(
        &self,
        block: &BlockRef,
        _group: &GroupNamespace,
        _address: &Address,
    ) -> Result<Option<RewardTotals>, ChainError> {
        Ok(self.rewards.at(self.number_of(block)?))
    }

    async fn system_voting_rounds(&self, block: &BlockRef, period: u64) -> Result<u64, ChainError> {
        self.number_of(block)?;
        Ok(self.system_voting_rounds.get(&period).copied().unwrap_or_default())
    }

    async fn supports(&self, capability: Capability) -> Result<bool, ChainError> {
        self.supports_calls.fetch_add(1, Ordering::SeqCst);
        match capability {
            Capability::OperatorNominationCounter => Ok(self.operator_counter),
        }
    }
}
