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

//! Discovery of the block in which rewards for a period were distributed.
//!
//! The [EventLocator] runs an ordered list of [LocateStrategy] implementations. Each one either
//! finds the block, passes to the next strategy, or aborts the whole lookup:
//!
//! 1. [PinnedHash]: a block supplied by the caller. A mismatch aborts.
//! 2. [IndexerLookup]: a query to the external indexer. Any failure passes.
//! 3. [ChainScan]: a sequential scan of the following period, always available.

use std::{fmt, time::Duration};

use alloy_primitives::B256;
use async_trait::async_trait;
use tokio::time::Instant;

use crate::{
    chain::{contains_distribution, ChainClient},
    config::{AnalysisConfig, LocateOptions},
    error::AuditError,
    indexer::Indexer,
    period::period_bounds,
    types::{BlockRef, PeriodDescriptor},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    PinnedHash,
    Indexer,
    ChainScan,
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StrategyKind::PinnedHash => "pinned block hash",
            StrategyKind::Indexer => "indexer lookup",
            StrategyKind::ChainScan => "chain scan",
        };
        f.write_str(name)
    }
}

/// Result of a strategy that did not abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    Found(BlockRef),
    /// The strategy could not decide; the next one should run.
    Pass { reason: String },
}

/// The distribution block and the strategy that found it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatedBlock {
    pub block: BlockRef,
    pub strategy: StrategyKind,
}

#[async_trait]
pub trait LocateStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Look for the distribution block of period `target`. An `Err` aborts the lookup.
    async fn locate(
        &self,
        chain: &dyn ChainClient,
        current: &PeriodDescriptor,
        target: u64,
    ) -> Result<StrategyOutcome, AuditError>;
}

/// Accepts a caller-supplied block only if it carries the distribution event.
pub struct PinnedHash {
    pub hash: B256,
}

#[async_trait]
impl LocateStrategy for PinnedHash {
    fn kind(&self) -> StrategyKind {
        StrategyKind::PinnedHash
    }

    async fn locate(
        &self,
        chain: &dyn ChainClient,
        _current: &PeriodDescriptor,
        target: u64,
    ) -> Result<StrategyOutcome, AuditError> {
        let unresolved = BlockRef::from_hash(self.hash);
        let events = chain
            .events_at(&unresolved)
            .await
            .map_err(AuditError::query(format!("events at pinned block {unresolved}")))?;
        if !contains_distribution(&events, target) {
            return Err(AuditError::PinnedBlockMismatch { hash: self.hash, target });
        }
        let number = chain
            .block_number(self.hash)
            .await
            .map_err(AuditError::query(format!("number of pinned block {unresolved}")))?;
        Ok(StrategyOutcome::Found(BlockRef::new(self.hash, number)))
    }
}

/// Looks the distribution block up in the external indexer.
///
/// The first indexed event that lies within `window` blocks after the start of the period
/// following `target` is accepted. Its event log is only re-read when `verify` is set.
pub struct IndexerLookup<'a> {
    pub indexer: &'a dyn Indexer,
    pub window: u64,
    pub verify: bool,
}

#[async_trait]
impl LocateStrategy for IndexerLookup<'_> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Indexer
    }

    async fn locate(
        &self,
        chain: &dyn ChainClient,
        current: &PeriodDescriptor,
        target: u64,
    ) -> Result<StrategyOutcome, AuditError> {
        let bounds = period_bounds(current, target)?;
        let next_start = bounds.end + 1;
        let window = next_start..=next_start.saturating_add(self.window);

        let events = match self.indexer.distribution_events().await {
            Ok(events) => events,
            Err(err) => {
                return Ok(StrategyOutcome::Pass { reason: format!("indexer unavailable: {err}") })
            }
        };
        let Some(hit) = events.iter().find(|event| window.contains(&event.block_number)) else {
            return Ok(StrategyOutcome::Pass {
                reason: format!(
                    "none of {} indexed events lies in blocks #{}..=#{}",
                    events.len(),
                    window.start(),
                    window.end()
                ),
            });
        };

        let block = match chain.block_hash(hit.block_number).await {
            Ok(block) => block,
            Err(err) => {
                return Ok(StrategyOutcome::Pass {
                    reason: format!("indexed block #{} not resolvable: {err}", hit.block_number),
                })
            }
        };

        if self.verify {
            match chain.events_at(&block).await {
                Ok(events) if contains_distribution(&events, target) => {}
                Ok(_) => {
                    return Ok(StrategyOutcome::Pass {
                        reason: format!("indexed block {block} has no event for period {target}"),
                    })
                }
                Err(err) => {
                    return Ok(StrategyOutcome::Pass {
                        reason: format!("could not verify indexed block {block}: {err}"),
                    })
                }
            }
        }
        Ok(StrategyOutcome::Found(block))
    }
}

/// Scans the period after `target` block by block.
///
/// Distribution handles one voting round per block, so it cannot finish before as many blocks as
/// the preceding period had system voting rounds. The scan skips that many blocks.
#[derive(Debug, Default)]
pub struct ChainScan {
    pub budget: Option<Duration>,
}

impl ChainScan {
    async fn skip_offset(
        &self,
        chain: &dyn ChainClient,
        current: &PeriodDescriptor,
        target: u64,
    ) -> u64 {
        let Some(previous) = target.checked_sub(1) else {
            return 0;
        };
        let offset = async {
            let bounds = period_bounds(current, previous)?;
            let block = chain
                .block_hash(bounds.end)
                .await
                .map_err(AuditError::query(format!("hash of block #{}", bounds.end)))?;
            chain
                .system_voting_rounds(&block, previous)
                .await
                .map_err(AuditError::query(format!("system voting rounds at {block}")))
        };
        match offset.await {
            Ok(rounds) => rounds,
            Err(err) => {
                tracing::warn!("Scanning without skip offset: {err}");
                0
            }
        }
    }
}

#[async_trait]
impl LocateStrategy for ChainScan {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ChainScan
    }

    async fn locate(
        &self,
        chain: &dyn ChainClient,
        current: &PeriodDescriptor,
        target: u64,
    ) -> Result<StrategyOutcome, AuditError> {
        let next = target + 1;
        if next > current.index {
            return Err(AuditError::CurrentPeriodNotFinalized {
                target,
                next,
                current: current.index,
            });
        }
        let next_bounds = period_bounds(current, next)?;
        let head = chain
            .best_block_number()
            .await
            .map_err(AuditError::query("best block number"))?;

        let offset = self.skip_offset(chain, current, target).await;
        let mut start = next_bounds.start.saturating_add(offset);
        if start > next_bounds.end {
            start = next_bounds.start;
        }
        let end = next_bounds.end.min(head);
        tracing::info!(
            "Scanning blocks #{start}..=#{end} for period {target} distribution (skipped {} blocks)",
            start - next_bounds.start
        );

        let started = Instant::now();
        for number in start..=end {
            if let Some(budget) = self.budget {
                if started.elapsed() > budget {
                    return Err(AuditError::ScanBudgetExhausted {
                        target,
                        last_scanned: number.saturating_sub(1),
                        budget,
                    });
                }
            }

            let block = match chain.block_hash(number).await {
                Ok(block) => block,
                Err(err) => {
                    tracing::warn!("Skipping block #{number}: {err}");
                    continue;
                }
            };
            let events = match chain.events_at(&block).await {
                Ok(events) => events,
                Err(err) => {
                    tracing::warn!("Skipping block {block}: {err}");
                    continue;
                }
            };
            if contains_distribution(&events, target) {
                tracing::debug!("Found distribution event at {block}");
                return Ok(StrategyOutcome::Found(block));
            }
        }

        Err(AuditError::EventNotFound { target, scanned: Some(start..=end) })
    }
}

/// Ordered list of strategies for locating the distribution block.
pub struct EventLocator<'a> {
    strategies: Vec<Box<dyn LocateStrategy + 'a>>,
}

impl<'a> EventLocator<'a> {
    pub fn new(strategies: Vec<Box<dyn LocateStrategy + 'a>>) -> Self {
        Self { strategies }
    }

    /// The default strategy order: a pinned block alone, otherwise the indexer (if any) followed
    /// by a chain scan.
    pub fn standard(pinned: Option<B256>, indexer: Option<IndexerLookup<'a>>, scan: ChainScan) -> Self {
        if let Some(hash) = pinned {
            return Self::new(vec![Box::new(PinnedHash { hash })]);
        }
        let mut strategies: Vec<Box<dyn LocateStrategy + 'a>> = Vec::new();
        if let Some(indexer) = indexer {
            strategies.push(Box::new(indexer));
        }
        strategies.push(Box::new(scan));
        Self::new(strategies)
    }

    pub fn from_options(options: &LocateOptions, indexer: Option<&'a dyn Indexer>) -> Self {
        let indexer = indexer.map(|indexer| IndexerLookup {
            indexer,
            window: options.indexer_window,
            verify: options.verify_indexer,
        });
        Self::standard(options.pinned_block, indexer, ChainScan { budget: options.scan_budget })
    }

    pub fn from_config(config: &AnalysisConfig, indexer: Option<&'a dyn Indexer>) -> Self {
        Self::from_options(&config.locate_options(), indexer)
    }

    pub fn kinds(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|strategy| strategy.kind()).collect()
    }

    pub async fn locate(
        &self,
        chain: &dyn ChainClient,
        current: &PeriodDescriptor,
        target: u64,
    ) -> Result<LocatedBlock, AuditError> {
        for strategy in &self.strategies {
            let kind = strategy.kind();
            tracing::debug!("Locating distribution block for period {target} via {kind}");
            match strategy.locate(chain, current, target).await? {
                StrategyOutcome::Found(block) => {
                    tracing::info!("Distribution block for period {target}: {block} (via {kind})");
                    return Ok(LocatedBlock { block, strategy: kind });
                }
                StrategyOutcome::Pass { reason } => {
                    tracing::warn!("{kind} did not locate period {target}: {reason}");
                }
            }
        }
        Err(AuditError::EventNotFound { target, scanned: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::{IndexedEvent, IndexerError};

    struct EmptyIndexer;

    #[async_trait]
    impl Indexer for EmptyIndexer {
        async fn distribution_events(&self) -> Result<Vec<IndexedEvent>, IndexerError> {
            Ok(Vec::new())
        }
    }

    fn config() -> crate::config::AnalysisConfigBuilder {
        let mut builder = AnalysisConfig::builder();
        builder
            .period(3)
            .group("energyweb.smartflow".parse().unwrap())
            .address("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY".parse().unwrap());
        builder
    }

    #[test]
    fn test_strategy_order() {
        let indexer = EmptyIndexer;
        let config = config().build().unwrap();

        let locator = EventLocator::from_config(&config, Some(&indexer));
        assert_eq!(locator.kinds(), vec![StrategyKind::Indexer, StrategyKind::ChainScan]);

        let locator = EventLocator::from_config(&config, None);
        assert_eq!(locator.kinds(), vec![StrategyKind::ChainScan]);
    }

    #[test]
    fn test_pinned_block_excludes_fallbacks() {
        let indexer = EmptyIndexer;
        let config = config().pinned_block(B256::repeat_byte(7)).build().unwrap();
        let locator = EventLocator::from_config(&config, Some(&indexer));
        assert_eq!(locator.kinds(), vec![StrategyKind::PinnedHash]);
    }
}
