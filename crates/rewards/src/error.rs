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

use std::{fmt, ops::RangeInclusive, time::Duration};

use alloy_primitives::{B256, U256};
use thiserror::Error;

use crate::types::{Address, BlockRef, GroupNamespace};

/// Failure of a single read against the chain client.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("failed to decode {what}: {reason}")]
    Decode { what: String, reason: String },

    #[error("block #{0} not found")]
    UnknownBlock(u64),

    #[error("block {0:#x} not found")]
    UnknownHash(B256),
}

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error(
        "{address} has no qualifying stake in group {group} for period {period} (stake: {stake}, last update period: {})",
        .last_update_period.map_or_else(|| String::from("none"), |p| p.to_string())
    )]
    NotSubscribed {
        group: GroupNamespace,
        address: Address,
        period: u64,
        stake: U256,
        last_update_period: Option<u64>,
    },

    #[error("period {target} has not ended yet (current period is {current})")]
    FutureOrCurrentPeriod { target: u64, current: u64 },

    #[error("period {target} is not finalized: period {next} has not started (current period is {current})")]
    CurrentPeriodNotFinalized { target: u64, next: u64, current: u64 },

    #[error("invalid geometry for period {target}: {reason}")]
    InvalidPeriodGeometry { target: u64, reason: String },

    #[error("block {hash:#x} does not contain the reward distribution event for period {target}")]
    PinnedBlockMismatch { hash: B256, target: u64 },

    #[error("reward distribution event for period {target} not found{}", fmt_range(.scanned))]
    EventNotFound { target: u64, scanned: Option<RangeInclusive<u64>> },

    #[error("scan for period {target} exceeded its {budget:?} budget after block #{last_scanned}")]
    ScanBudgetExhausted { target: u64, last_scanned: u64, budget: Duration },

    #[error("solution group {group} not found at block {block}")]
    GroupNotFound { group: GroupNamespace, block: BlockRef },

    #[error("{what} not found at block {block}")]
    MissingState { what: &'static str, block: BlockRef },

    #[error("failed to read {what}")]
    TransientQuery {
        what: String,
        #[source]
        source: ChainError,
    },
}

impl AuditError {
    /// Closure adapter wrapping a [ChainError] with a description of the read that failed.
    pub fn query(what: impl Into<String>) -> impl FnOnce(ChainError) -> AuditError {
        let what = what.into();
        move |source| AuditError::TransientQuery { what, source }
    }
}

fn fmt_range(range: &Option<RangeInclusive<u64>>) -> String {
    match range {
        Some(range) if range.is_empty() => String::from(" (nothing to scan)"),
        Some(range) => format!(" in blocks #{}..=#{}", range.start(), range.end()),
        None => String::new(),
    }
}

/// Stage of the analysis pipeline a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Setup,
    Subscription,
    Discovery,
    InitialState,
    Snapshot,
    Analysis,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Setup => "setup",
            Stage::Subscription => "subscription check",
            Stage::Discovery => "distribution block discovery",
            Stage::InitialState => "initial block discovery",
            Stage::Snapshot => "state snapshot",
            Stage::Analysis => "analysis",
        };
        f.write_str(name)
    }
}

/// An [AuditError] tagged with the [Stage] it came from.
#[derive(Error, Debug)]
#[error("{stage} failed")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: AuditError,
}

/// Attach a [Stage] to a failed result.
pub trait StageExt<T> {
    fn stage(self, stage: Stage) -> Result<T, StageError>;
}

impl<T> StageExt<T> for Result<T, AuditError> {
    fn stage(self, stage: Stage) -> Result<T, StageError> {
        self.map_err(|source| StageError { stage, source })
    }
}
