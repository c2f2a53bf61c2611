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

//! Reward period resolution and SLA analysis for Energy Web X worker node operators.
//!
//! Given a past reward period, a solution group and an operator address, the engine finds the
//! block in which rewards for the period were distributed and the last block before distribution
//! began, reads the operator's state at both and reports the rewards earned in the period together
//! with the SLA participation check.

pub mod analysis;
pub mod chain;
pub mod config;
pub mod engine;
pub mod error;
pub mod indexer;
pub mod initial;
pub mod locator;
pub mod period;
pub mod snapshot;
pub mod subscription;
pub mod types;
pub mod units;

pub use analysis::{analyze, AnalysisResult, SlaVerdict};

pub use chain::{
    contains_distribution, Capability, ChainClient, ChainEvent, PeriodCounter,
    EARNED_REWARD_EVENT, REWARDS_CALCULATED_EVENT,
};

pub use config::{
    AnalysisConfig, AnalysisConfigBuilder, LocateOptions, DEFAULT_INDEXER_WINDOW, DEFAULT_INITIAL_WINDOW,
};

pub use engine::{current_period, locate_blocks, run_audit, AuditReport};

pub use error::{AuditError, ChainError, Stage, StageError, StageExt};

pub use indexer::{GraphqlIndexer, IndexedEvent, Indexer, IndexerError};

pub use initial::{locate_initial_block, Confidence, InitialBlock};

pub use locator::{
    ChainScan, EventLocator, IndexerLookup, LocateStrategy, LocatedBlock, PinnedHash,
    StrategyKind, StrategyOutcome,
};

pub use period::{period_bounds, PeriodBounds};

pub use snapshot::{EligibleRounds, Snapshot, SnapshotReader};

pub use subscription::{evaluate_ledger, validate_subscription, Subscription};

pub use types::{
    Address, BlockRef, GroupConfig, GroupNamespace, PeriodDescriptor, RewardDelta, RewardTotals,
    StakeLedger,
};

pub use units::{format_ewt, format_signed_ewt};
