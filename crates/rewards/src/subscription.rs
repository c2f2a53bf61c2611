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

//! Stake ledger check gating the analysis.

use alloy_primitives::U256;

use crate::{
    chain::ChainClient,
    error::AuditError,
    period::period_bounds,
    types::{Address, GroupNamespace, PeriodDescriptor, StakeLedger},
};

/// A stake that qualifies the address for the target period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subscription {
    pub stake: U256,
    /// Period in which the stake was last changed.
    pub last_update_period: u64,
}

/// Decide whether `ledger` grants a qualifying stake for period `target`.
///
/// Only the entry with the highest update period is in effect, and it covers `target` only if it
/// was written in or before `target` and holds a non-zero stake.
pub fn evaluate_ledger(
    ledger: Option<&StakeLedger>,
    group: &GroupNamespace,
    address: &Address,
    target: u64,
) -> Result<Subscription, AuditError> {
    let not_subscribed = |stake: U256, last_update_period: Option<u64>| AuditError::NotSubscribed {
        group: group.clone(),
        address: address.clone(),
        period: target,
        stake,
        last_update_period,
    };

    let Some((last_update_period, stake)) = ledger.and_then(StakeLedger::latest) else {
        return Err(not_subscribed(U256::ZERO, None));
    };
    if target < last_update_period || stake.is_zero() {
        return Err(not_subscribed(stake, Some(last_update_period)));
    }
    Ok(Subscription { stake, last_update_period })
}

/// Read the stake ledger at the first block of period `target` and validate it.
pub async fn validate_subscription(
    chain: &dyn ChainClient,
    current: &PeriodDescriptor,
    group: &GroupNamespace,
    address: &Address,
    target: u64,
) -> Result<Subscription, AuditError> {
    let bounds = period_bounds(current, target)?;
    let block = chain
        .block_hash(bounds.start)
        .await
        .map_err(AuditError::query(format!("hash of period {target} start block #{}", bounds.start)))?;
    let ledger = chain
        .stake_ledger(&block, group, address)
        .await
        .map_err(AuditError::query(format!("stake ledger at {block}")))?;

    tracing::debug!(
        "Stake ledger for {address} in {group} at {block}: {} entries",
        ledger.as_ref().map_or(0, StakeLedger::len)
    );
    let subscription = evaluate_ledger(ledger.as_ref(), group, address, target)?;
    tracing::info!(
        "{address} is subscribed to {group} for period {target} (stake {}, updated in period {})",
        subscription.stake,
        subscription.last_update_period
    );
    Ok(subscription)
}
