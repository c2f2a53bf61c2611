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

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use ewx_rewards::{IndexedEvent, Indexer, IndexerError, REWARDS_CALCULATED_EVENT};

/// An [Indexer] answering from a fixed list of block numbers, or always failing.
#[derive(Debug)]
pub struct MockIndexer {
    blocks: Option<Vec<u64>>,
    calls: AtomicUsize,
}

impl MockIndexer {
    /// Report a distribution event at each of `blocks`.
    pub fn with_events(blocks: impl IntoIterator<Item = u64>) -> Self {
        let mut blocks: Vec<_> = blocks.into_iter().collect();
        blocks.sort_unstable_by(|a, b| b.cmp(a));
        Self { blocks: Some(blocks), calls: AtomicUsize::new(0) }
    }

    pub fn failing() -> Self {
        Self { blocks: None, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Indexer for MockIndexer {
    async fn distribution_events(&self) -> Result<Vec<IndexedEvent>, IndexerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let blocks = self.blocks.as_ref().ok_or_else(|| IndexerError::Query("indexer is down".into()))?;
        Ok(blocks
            .iter()
            .map(|block_number| IndexedEvent {
                name: REWARDS_CALCULATED_EVENT.to_string(),
                block_number: *block_number,
            })
            .collect())
    }
}
