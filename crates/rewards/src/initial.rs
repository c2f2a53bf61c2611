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

//! Heuristic search for the last block before reward distribution started writing state.
//!
//! Distribution writes one `EarnedRewardCalculated` event per rewarded address over the blocks
//! leading up to the distribution event. Walking back from the distribution block, the first block
//! without such an event is taken as the pre-distribution state. This is an approximation; nothing
//! on chain marks the boundary.

use std::fmt;

use crate::{chain::ChainClient, error::AuditError, types::BlockRef};

/// How much the chosen initial block can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// A block without any per-address reward event was found.
    Exact,
    /// Every block in the window had reward events; the oldest one was used.
    Degraded,
    /// The window reached genesis with reward events on every block; the block before
    /// distribution was used.
    LastResort,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Confidence::Exact => "exact",
            Confidence::Degraded => "degraded",
            Confidence::LastResort => "last resort",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitialBlock {
    pub block: BlockRef,
    pub confidence: Confidence,
}

/// Walk back at most `window` blocks from `distribution` looking for pre-distribution state.
pub async fn locate_initial_block(
    chain: &dyn ChainClient,
    distribution: &BlockRef,
    window: u64,
) -> Result<InitialBlock, AuditError> {
    let distribution_number = match distribution.number {
        Some(number) => number,
        None => chain
            .block_number(distribution.hash)
            .await
            .map_err(AuditError::query(format!("number of block {distribution}")))?,
    };
    if distribution_number == 0 {
        return Err(AuditError::Validation {
            field: "distribution block",
            reason: "the genesis block has no predecessor".into(),
        });
    }

    let mut oldest_with_rewards = None;
    for offset in 1..=window {
        let Some(number) = distribution_number.checked_sub(offset) else {
            break;
        };
        let block = chain
            .block_hash(number)
            .await
            .map_err(AuditError::query(format!("hash of block #{number}")))?;
        let events = chain
            .events_at(&block)
            .await
            .map_err(AuditError::query(format!("events at {block}")))?;
        if !events.iter().any(|event| event.is_earned_reward()) {
            tracing::info!("Initial block: {block}, {offset} blocks before distribution");
            return Ok(InitialBlock { block, confidence: Confidence::Exact });
        }
        oldest_with_rewards = Some(block);
    }

    // Reward events reach back to genesis, so no earlier state exists.
    if window >= distribution_number {
        let number = distribution_number - 1;
        let block = chain
            .block_hash(number)
            .await
            .map_err(AuditError::query(format!("hash of block #{number}")))?;
        tracing::warn!("Reward events reach back to genesis; falling back to {block}");
        return Ok(InitialBlock { block, confidence: Confidence::LastResort });
    }

    match oldest_with_rewards {
        Some(block) => {
            tracing::warn!(
                "Every block within {window} blocks of the distribution has reward events; using {block}"
            );
            Ok(InitialBlock { block, confidence: Confidence::Degraded })
        }
        None => Err(AuditError::Validation {
            field: "initial window",
            reason: "must be at least one block".into(),
        }),
    }
}
