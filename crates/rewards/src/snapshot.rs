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

//! Block-pinned reads of the state the analysis compares.

use tokio::sync::OnceCell;

use crate::{
    chain::{Capability, ChainClient, PeriodCounter},
    error::AuditError,
    types::{Address, BlockRef, GroupConfig, GroupNamespace, PeriodDescriptor, RewardTotals},
};

/// Voting round counters of one group in one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EligibleRounds {
    pub total: u64,
    pub with_nomination: u64,
    pub operator_with_nomination: u64,
}

impl EligibleRounds {
    /// Rounds the participant had to vote in: `total - (with_nomination - operator_with_nomination)`.
    ///
    /// Counters that would make the result negative are treated as inconsistent and the
    /// subtraction saturates at zero.
    pub fn eligible(&self) -> u64 {
        let excluded = self.with_nomination.saturating_sub(self.operator_with_nomination);
        self.total.saturating_sub(excluded)
    }
}

/// State of one participant at one block.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub block: BlockRef,
    /// Reward period active at `block`.
    pub period: PeriodDescriptor,
    pub group: GroupConfig,
    pub rounds: EligibleRounds,
    pub votes: u64,
    pub rewards: RewardTotals,
}

/// Reads [Snapshot]s of one participant for one period.
///
/// Whether the chain carries the operator nomination counter is asked once per reader and reused
/// for every snapshot.
pub struct SnapshotReader<'a> {
    chain: &'a dyn ChainClient,
    group: &'a GroupNamespace,
    address: &'a Address,
    period: u64,
    operator_counter: OnceCell<bool>,
}

impl<'a> SnapshotReader<'a> {
    pub fn new(
        chain: &'a dyn ChainClient,
        group: &'a GroupNamespace,
        address: &'a Address,
        period: u64,
    ) -> Self {
        Self { chain, group, address, period, operator_counter: OnceCell::new() }
    }

    async fn has_operator_counter(&self) -> Result<bool, AuditError> {
        self.operator_counter
            .get_or_try_init(|| async {
                let supported = self
                    .chain
                    .supports(Capability::OperatorNominationCounter)
                    .await
                    .map_err(AuditError::query("runtime capabilities"))?;
                tracing::debug!("Operator nomination counter supported: {supported}");
                Ok(supported)
            })
            .await
            .copied()
    }

    async fn counter(&self, block: &BlockRef, counter: PeriodCounter) -> Result<u64, AuditError> {
        let value = self
            .chain
            .period_counter(block, counter, self.group, self.period)
            .await
            .map_err(AuditError::query(format!("{counter:?} at {block}")))?;
        Ok(value.unwrap_or_default())
    }

    async fn rounds(&self, block: &BlockRef) -> Result<EligibleRounds, AuditError> {
        let operator = async {
            if self.has_operator_counter().await? {
                self.counter(block, PeriodCounter::OperatorRoundsWithNomination).await
            } else {
                Ok(0)
            }
        };
        let (total, with_nomination, operator_with_nomination) = tokio::try_join!(
            self.counter(block, PeriodCounter::TotalVotingRounds),
            self.counter(block, PeriodCounter::RoundsWithNomination),
            operator,
        )?;
        let rounds = EligibleRounds { total, with_nomination, operator_with_nomination };
        if with_nomination.saturating_sub(operator_with_nomination) > total {
            tracing::warn!("Inconsistent round counters at {block}: {rounds:?}");
        }
        Ok(rounds)
    }

    async fn votes(&self, block: &BlockRef) -> Result<u64, AuditError> {
        let votes = self
            .chain
            .correct_votes(block, self.group, self.period, self.address)
            .await
            .map_err(AuditError::query(format!("correct votes at {block}")))?;
        Ok(votes.unwrap_or_default())
    }

    async fn period(&self, block: &BlockRef) -> Result<PeriodDescriptor, AuditError> {
        self.chain
            .period_at(block)
            .await
            .map_err(AuditError::query(format!("reward period at {block}")))
    }

    async fn group_config(&self, block: &BlockRef) -> Result<GroupConfig, AuditError> {
        self.chain
            .group_config(block, self.group)
            .await
            .map_err(AuditError::query(format!("group configuration at {block}")))?
            .ok_or_else(|| AuditError::GroupNotFound { group: self.group.clone(), block: *block })
    }

    async fn rewards(&self, block: &BlockRef, allow_missing: bool) -> Result<RewardTotals, AuditError> {
        let totals = self
            .chain
            .reward_totals(block, self.group, self.address)
            .await
            .map_err(AuditError::query(format!("reward totals at {block}")))?;
        match totals {
            Some(totals) => Ok(totals),
            None if allow_missing => {
                tracing::warn!("No reward totals at {block}, counting from zero");
                Ok(RewardTotals::ZERO)
            }
            None => Err(AuditError::MissingState { what: "reward totals", block: *block }),
        }
    }

    /// Read the snapshot at `block`. Absent reward totals read as zero only if `allow_missing_rewards`.
    pub async fn read(
        &self,
        block: &BlockRef,
        allow_missing_rewards: bool,
    ) -> Result<Snapshot, AuditError> {
        let (period, group, rounds, votes, rewards) = tokio::try_join!(
            self.period(block),
            self.group_config(block),
            self.rounds(block),
            self.votes(block),
            self.rewards(block, allow_missing_rewards),
        )?;
        tracing::debug!(
            "Snapshot at {block} (period {}): {} eligible rounds, {votes} votes, rewards {rewards:?}",
            period.index,
            rounds.eligible()
        );
        Ok(Snapshot { block: *block, period, group, rounds, votes, rewards })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligible_rounds() {
        let rounds = EligibleRounds { total: 96, with_nomination: 50, operator_with_nomination: 3 };
        assert_eq!(rounds.eligible(), 49);

        let no_nomination = EligibleRounds { total: 87, ..Default::default() };
        assert_eq!(no_nomination.eligible(), 87);
    }

    #[test]
    fn test_eligible_rounds_saturate() {
        let rounds = EligibleRounds { total: 10, with_nomination: 30, operator_with_nomination: 5 };
        assert_eq!(rounds.eligible(), 0);

        let operator_exceeds = EligibleRounds { total: 10, with_nomination: 2, operator_with_nomination: 5 };
        assert_eq!(operator_exceeds.eligible(), 10);
    }
}
