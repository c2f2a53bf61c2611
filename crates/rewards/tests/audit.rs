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

//! End-to-end runs of the analysis pipeline against an in-memory chain.

use alloy_primitives::{I256, U256};
use ewx_rewards::{
    run_audit, AnalysisConfig, AnalysisConfigBuilder, AuditError, BlockRef, ChainEvent, Confidence,
    PeriodCounter, PeriodDescriptor, RewardTotals, SlaVerdict, SnapshotReader, Stage, StageError,
    StakeLedger, StrategyKind,
};
use ewx_test_utils::{block_hash, MockChain, MockIndexer, ALICE, GROUP};
use tracing_test::traced_test;

// Period 8 spans blocks 800..=899. Its rewards are written over blocks 925..=929 and the
// distribution event is emitted at block 930.
const CURRENT: PeriodDescriptor = PeriodDescriptor { index: 10, first_block: 1_000, length: 100 };
const TARGET: u64 = 8;
const DISTRIBUTION: u64 = 930;
const INITIAL: u64 = 924;

fn totals(subscription: &str, voting: &str) -> RewardTotals {
    RewardTotals::new(subscription.parse().unwrap(), voting.parse().unwrap())
}

fn chain() -> MockChain {
    MockChain::new(CURRENT, 1_050)
        .with_event(DISTRIBUTION, ChainEvent::RewardsCalculatedForPeriod { period: TARGET })
        .with_earned_rewards(925..DISTRIBUTION)
        .with_system_voting_rounds(TARGET - 1, 20)
        .with_stake_ledger(0, StakeLedger::new([(3, U256::from(10_000))]))
        .with_sla_threshold(0, 60.0)
        // Raised during distribution; the period is judged under the old value.
        .with_sla_threshold(927, 90.0)
        .with_counter(890, PeriodCounter::TotalVotingRounds, 96)
        .with_counter(890, PeriodCounter::RoundsWithNomination, 50)
        .with_counter(890, PeriodCounter::OperatorRoundsWithNomination, 3)
        .with_votes(890, 61)
        .with_rewards(0, totals("7982644892450463358", "30299138028873089534"))
        .with_rewards(927, totals("8206437276591532332", "31834395275802910556"))
}

fn config() -> AnalysisConfigBuilder {
    let mut builder = AnalysisConfig::builder();
    builder.period(TARGET).group(GROUP.parse().unwrap()).address(ALICE.parse().unwrap());
    builder
}

#[tokio::test]
#[traced_test]
async fn test_full_audit() {
    let chain = chain();
    let report = run_audit(&chain, None, &config().build().unwrap()).await.unwrap();

    assert_eq!((report.bounds.start, report.bounds.end), (800, 899));
    assert_eq!(report.subscription.stake, U256::from(10_000));
    assert_eq!(report.distribution.strategy, StrategyKind::ChainScan);
    assert_eq!(report.distribution.block.number, Some(DISTRIBUTION));
    assert_eq!(report.initial.block.number, Some(INITIAL));
    assert_eq!(report.initial.confidence, Confidence::Exact);

    let result = report.result;
    assert_eq!(result.period_rewards.subscription, "223792384141068974".parse::<I256>().unwrap());
    assert_eq!(result.period_rewards.voting, "1535257246929821022".parse::<I256>().unwrap());
    assert_eq!(result.eligible_rounds, 49);
    assert_eq!(result.votes, 61);
    assert!((result.vote_ratio_percent.unwrap() - 124.49).abs() < 0.01);
    assert_eq!(result.sla_threshold_percent, 60.0);
    assert_eq!(result.group.namespace.as_str(), GROUP);
    assert_eq!(result.period, PeriodDescriptor { index: 9, first_block: 900, length: 100 });
    assert_eq!(result.sla, SlaVerdict::Met);
    assert!(logs_contain("Analysis of period 8 complete"));
}

#[tokio::test]
async fn test_snapshots_read_state_at_their_own_block() {
    let chain = chain();
    let (group, address) = (GROUP.parse().unwrap(), ALICE.parse().unwrap());
    let reader = SnapshotReader::new(&chain, &group, &address, TARGET);

    let before = reader.read(&BlockRef::new(block_hash(899), 899), false).await.unwrap();
    let after = reader.read(&BlockRef::new(block_hash(DISTRIBUTION), DISTRIBUTION), false).await.unwrap();

    assert_eq!(before.period, PeriodDescriptor { index: 8, first_block: 800, length: 100 });
    assert_eq!(after.period, PeriodDescriptor { index: 9, first_block: 900, length: 100 });
    assert_eq!(before.group.sla_voting_threshold_percent, 60.0);
    assert_eq!(after.group.sla_voting_threshold_percent, 90.0);
    assert_eq!(after.group.namespace, group);
}

#[tokio::test]
async fn test_audit_is_idempotent() {
    let chain = chain();
    let config = config().pinned_block(block_hash(DISTRIBUTION)).build().unwrap();
    let first = run_audit(&chain, None, &config).await.unwrap();
    let second = run_audit(&chain, None, &config).await.unwrap();
    assert_eq!(first.distribution.strategy, StrategyKind::PinnedHash);
    assert_eq!(first.result, second.result);
    assert_eq!(first.initial, second.initial);
}

#[tokio::test]
async fn test_pinned_mismatch_skips_other_strategies() {
    let chain = chain();
    let indexer = MockIndexer::with_events([DISTRIBUTION]);
    let config = config().pinned_block(block_hash(DISTRIBUTION - 1)).build().unwrap();

    let err = run_audit(&chain, Some(&indexer), &config).await.unwrap_err();
    assert_eq!(err.stage, Stage::Discovery);
    assert!(matches!(err.source, AuditError::PinnedBlockMismatch { .. }));
    assert_eq!(indexer.calls(), 0);
    assert_eq!(chain.events_calls(), 1);
}

#[tokio::test]
async fn test_indexer_result_used() {
    let chain = chain();
    let indexer = MockIndexer::with_events([DISTRIBUTION]);
    let report = run_audit(&chain, Some(&indexer), &config().build().unwrap()).await.unwrap();
    assert_eq!(report.distribution.strategy, StrategyKind::Indexer);
    assert_eq!(report.distribution.block.number, Some(DISTRIBUTION));
    // Only the initial block search read events: blocks 929 down to 924.
    assert_eq!(chain.events_calls(), 6);
}

#[tokio::test]
async fn test_indexer_failure_falls_back() {
    let chain = chain();
    let indexer = MockIndexer::failing();
    let report = run_audit(&chain, Some(&indexer), &config().build().unwrap()).await.unwrap();
    assert_eq!(report.distribution.strategy, StrategyKind::ChainScan);
    assert_eq!(report.result.eligible_rounds, 49);
}

#[tokio::test]
async fn test_not_subscribed() {
    let chain = chain().with_stake_ledger(0, StakeLedger::new([(9, U256::from(10_000))]));
    let err = run_audit(&chain, None, &config().build().unwrap()).await.unwrap_err();
    assert_eq!(err.stage, Stage::Subscription);
    assert!(matches!(err.source, AuditError::NotSubscribed { last_update_period: Some(9), .. }));
    assert_eq!(chain.events_calls(), 0);
}

#[tokio::test]
async fn test_future_period() {
    let chain = chain();
    let err = run_audit(&chain, None, &config().period(11).build().unwrap()).await.unwrap_err();
    assert_eq!(err.stage, Stage::Setup);
    assert!(matches!(err.source, AuditError::FutureOrCurrentPeriod { target: 11, current: 10 }));
}

#[tokio::test]
async fn test_current_period_not_finalized() {
    let chain = chain();
    let err = run_audit(&chain, None, &config().period(10).build().unwrap()).await.unwrap_err();
    assert_eq!(err.stage, Stage::Discovery);
    assert!(matches!(err.source, AuditError::CurrentPeriodNotFinalized { .. }));
}

#[tokio::test]
async fn test_group_not_found() {
    let chain = MockChain::new(CURRENT, 1_050)
        .with_event(DISTRIBUTION, ChainEvent::RewardsCalculatedForPeriod { period: TARGET })
        .with_stake_ledger(0, StakeLedger::new([(3, U256::from(1))]))
        .with_rewards(0, RewardTotals::ZERO);
    let err = run_audit(&chain, None, &config().build().unwrap()).await.unwrap_err();
    assert_eq!(err.stage, Stage::Snapshot);
    assert!(matches!(err.source, AuditError::GroupNotFound { .. }));
}

#[tokio::test]
async fn test_missing_rewards_is_an_error() {
    let chain = MockChain::new(CURRENT, 1_050)
        .with_event(DISTRIBUTION, ChainEvent::RewardsCalculatedForPeriod { period: TARGET })
        .with_stake_ledger(0, StakeLedger::new([(3, U256::from(1))]))
        .with_sla_threshold(0, 60.0);
    let err = run_audit(&chain, None, &config().build().unwrap()).await.unwrap_err();
    let StageError { stage, source } = err;
    assert_eq!(stage, Stage::Snapshot);
    assert!(matches!(source, AuditError::MissingState { what: "reward totals", .. }));
}

#[tokio::test]
async fn test_missing_initial_rewards_allowed_on_last_resort() {
    let chain = MockChain::new(CURRENT, 1_050)
        .with_event(DISTRIBUTION, ChainEvent::RewardsCalculatedForPeriod { period: TARGET })
        .with_earned_rewards(0..DISTRIBUTION)
        .with_stake_ledger(0, StakeLedger::new([(3, U256::from(1))]))
        .with_sla_threshold(0, 60.0)
        .with_rewards(DISTRIBUTION, totals("5", "7"));
    let config = config().initial_window(1_000).build().unwrap();

    let report = run_audit(&chain, None, &config).await.unwrap();
    assert_eq!(report.initial.confidence, Confidence::LastResort);
    assert_eq!(report.initial.block.number, Some(DISTRIBUTION - 1));
    assert_eq!(report.result.initial_rewards, RewardTotals::ZERO);
    assert_eq!(report.result.period_rewards.voting, I256::try_from(7i64).unwrap());
    assert_eq!(report.result.sla, SlaVerdict::NotApplicable);
}

#[tokio::test]
async fn test_failed_reads_before_distribution_abort() {
    let chain = (880..DISTRIBUTION)
        .fold(chain(), MockChain::with_failing_block)
        .with_rewards(0, totals("100", "100"))
        .with_rewards(927, totals("500", "900"));
    let config = config().pinned_block(block_hash(DISTRIBUTION)).build().unwrap();

    let err = run_audit(&chain, None, &config).await.unwrap_err();
    assert_eq!(err.stage, Stage::InitialState);
    assert!(matches!(err.source, AuditError::TransientQuery { .. }));
}

#[tokio::test]
#[traced_test]
async fn test_negative_delta_surfaced() {
    let chain = chain().with_rewards(927, totals("1", "31834395275802910556"));
    let report = run_audit(&chain, None, &config().build().unwrap()).await.unwrap();
    assert!(report.result.period_rewards.is_negative());
    assert!(report.result.period_rewards.subscription < I256::ZERO);
    assert!(logs_contain("Rewards decreased"));
}

#[tokio::test]
async fn test_capability_checked_once() {
    let chain = chain();
    run_audit(&chain, None, &config().build().unwrap()).await.unwrap();
    assert_eq!(chain.supports_calls(), 1);
}

#[tokio::test]
async fn test_without_operator_counter() {
    let chain = chain().with_operator_counter(false);
    let report = run_audit(&chain, None, &config().build().unwrap()).await.unwrap();
    // 96 - 50, the operator term is taken as zero.
    assert_eq!(report.result.eligible_rounds, 46);
}
