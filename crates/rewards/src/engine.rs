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

//! End-to-end analysis of one participant in one reward period.
//!
//! The run is all-or-nothing: validate the subscription, locate the distribution block and the
//! block before it, read both snapshots and compare them. Any failure ends the run tagged with
//! the [Stage] it came from.

use crate::{
    analysis::{analyze, AnalysisResult},
    chain::ChainClient,
    config::AnalysisConfig,
    error::{AuditError, Stage, StageError, StageExt},
    indexer::Indexer,
    initial::{locate_initial_block, Confidence, InitialBlock},
    locator::{EventLocator, LocatedBlock},
    period::{period_bounds, PeriodBounds},
    snapshot::SnapshotReader,
    subscription::{validate_subscription, Subscription},
    types::PeriodDescriptor,
    units::format_signed_ewt,
};

/// Everything a completed run found out.
#[derive(Debug, Clone)]
pub struct AuditReport {
    pub bounds: PeriodBounds,
    pub subscription: Subscription,
    pub distribution: LocatedBlock,
    pub initial: InitialBlock,
    pub result: AnalysisResult,
}

/// Read the active period descriptor at the chain head.
pub async fn current_period(chain: &dyn ChainClient) -> Result<PeriodDescriptor, StageError> {
    let current = chain
        .current_period()
        .await
        .map_err(AuditError::query("current reward period"))
        .stage(Stage::Setup)?;
    tracing::debug!("Current reward period: {current:?}");
    Ok(current)
}

/// Locate the distribution block of `target` and the pre-distribution block before it.
pub async fn locate_blocks(
    chain: &dyn ChainClient,
    locator: &EventLocator<'_>,
    current: &PeriodDescriptor,
    target: u64,
    initial_window: u64,
) -> Result<(LocatedBlock, InitialBlock), StageError> {
    let distribution = locator.locate(chain, current, target).await.stage(Stage::Discovery)?;
    let initial = locate_initial_block(chain, &distribution.block, initial_window)
        .await
        .stage(Stage::InitialState)?;
    Ok((distribution, initial))
}

/// Run the full analysis described by `config`.
pub async fn run_audit(
    chain: &dyn ChainClient,
    indexer: Option<&dyn Indexer>,
    config: &AnalysisConfig,
) -> Result<AuditReport, StageError> {
    let target = config.period;
    let current = current_period(chain).await?;
    let bounds = period_bounds(&current, target).stage(Stage::Setup)?;
    tracing::info!(
        "Analyzing {} in {} for period {target} (blocks #{}..=#{})",
        config.address,
        config.group,
        bounds.start,
        bounds.end
    );

    let subscription =
        validate_subscription(chain, &current, &config.group, &config.address, target)
            .await
            .stage(Stage::Subscription)?;

    let locator = EventLocator::from_config(config, indexer);
    let (distribution, initial) =
        locate_blocks(chain, &locator, &current, target, config.initial_window).await?;

    let reader = SnapshotReader::new(chain, &config.group, &config.address, target);
    let allow_missing = initial.confidence == Confidence::LastResort;
    let (initial_snapshot, final_snapshot) = tokio::try_join!(
        reader.read(&initial.block, allow_missing),
        reader.read(&distribution.block, false),
    )
    .stage(Stage::Snapshot)?;

    let result = analyze(&initial_snapshot, &final_snapshot);
    if result.period_rewards.is_negative() {
        tracing::warn!(
            "Rewards decreased between {} and {} (subscription {}, voting {}); block selection is suspect",
            initial.block,
            distribution.block,
            format_signed_ewt(result.period_rewards.subscription),
            format_signed_ewt(result.period_rewards.voting)
        );
    }
    tracing::info!("Analysis of period {target} complete: SLA {}", result.sla);

    Ok(AuditReport { bounds, subscription, distribution, initial, result })
}
