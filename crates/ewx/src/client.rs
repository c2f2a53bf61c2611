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

use std::{collections::BTreeMap, str::FromStr};

use alloy_primitives::B256;
use anyhow::Context;
use async_trait::async_trait;
use ewx_rewards::{
    Address, BlockRef, Capability, ChainClient, ChainError, ChainEvent, GroupConfig,
    GroupNamespace, PeriodCounter, PeriodDescriptor, RewardTotals, StakeLedger,
};
use subxt::{
    backend::{legacy::LegacyRpcMethods, rpc::RpcClient},
    dynamic::Value,
    utils::{AccountId32, H256},
    OnlineClient, SubstrateConfig,
};
use url::Url;

use crate::{
    decode::{amount_of, field, first_field, trailing_u64_key, u64_of},
    schema,
};

fn rpc_err(err: impl std::fmt::Display) -> ChainError {
    ChainError::Rpc(err.to_string())
}

fn to_h256(hash: B256) -> H256 {
    H256(hash.0)
}

fn account(address: &Address) -> Result<AccountId32, ChainError> {
    AccountId32::from_str(address.as_str()).map_err(|err| ChainError::Decode {
        what: format!("address {address}"),
        reason: err.to_string(),
    })
}

fn namespace_key(group: &GroupNamespace) -> Value {
    Value::from_bytes(group.as_str().as_bytes())
}

fn counter_item(counter: PeriodCounter) -> &'static str {
    match counter {
        PeriodCounter::TotalVotingRounds => schema::TOTAL_VOTING_ROUNDS,
        PeriodCounter::RoundsWithNomination => schema::ROUNDS_WITH_NOMINATION,
        PeriodCounter::OperatorRoundsWithNomination => schema::OPERATOR_ROUNDS_WITH_NOMINATION,
    }
}

/// [ChainClient] over a Substrate node's JSON-RPC interface.
///
/// Historical blocks are decoded with the metadata of the runtime the client connected to.
pub struct SubxtChainClient {
    url: Url,
    api: OnlineClient<SubstrateConfig>,
    rpc: LegacyRpcMethods<SubstrateConfig>,
}

impl SubxtChainClient {
    /// Connect to the node at `url`.
    pub async fn connect(url: &Url) -> anyhow::Result<Self> {
        let rpc_client = RpcClient::from_url(url.as_str())
            .await
            .with_context(|| format!("failed to connect to {url}"))?;
        let api = OnlineClient::<SubstrateConfig>::from_rpc_client(rpc_client.clone())
            .await
            .context("failed to fetch runtime metadata")?;
        let rpc = LegacyRpcMethods::<SubstrateConfig>::new(rpc_client);
        tracing::debug!(
            "Connected to {url} (spec version {})",
            api.runtime_version().spec_version
        );
        Ok(Self { url: url.clone(), api, rpc })
    }

    async fn fetch(
        &self,
        block: &BlockRef,
        item: &str,
        keys: Vec<Value>,
    ) -> Result<Option<Value<u32>>, ChainError> {
        let query = subxt::dynamic::storage(schema::PALLET, item, keys);
        let Some(thunk) = self
            .api
            .storage()
            .at(to_h256(block.hash))
            .fetch(&query)
            .await
            .map_err(rpc_err)?
        else {
            return Ok(None);
        };
        thunk.to_value().map(Some).map_err(rpc_err)
    }

    async fn fetch_u64(
        &self,
        block: &BlockRef,
        item: &str,
        keys: Vec<Value>,
    ) -> Result<Option<u64>, ChainError> {
        self.fetch(block, item, keys).await?.map(|value| u64_of(&value, item)).transpose()
    }
}

impl Drop for SubxtChainClient {
    fn drop(&mut self) {
        tracing::debug!("Closing connection to {}", self.url);
    }
}

#[async_trait]
impl ChainClient for SubxtChainClient {
    async fn best_block_number(&self) -> Result<u64, ChainError> {
        let header = self
            .rpc
            .chain_get_header(None)
            .await
            .map_err(rpc_err)?
            .ok_or_else(|| ChainError::Rpc("node returned no best header".into()))?;
        Ok(header.number.into())
    }

    async fn block_hash(&self, number: u64) -> Result<BlockRef, ChainError> {
        let hash = self
            .rpc
            .chain_get_block_hash(Some(number.into()))
            .await
            .map_err(rpc_err)?
            .ok_or(ChainError::UnknownBlock(number))?;
        Ok(BlockRef::new(B256::from(hash.0), number))
    }

    async fn block_number(&self, hash: B256) -> Result<u64, ChainError> {
        let header = self
            .rpc
            .chain_get_header(Some(to_h256(hash)))
            .await
            .map_err(rpc_err)?
            .ok_or(ChainError::UnknownHash(hash))?;
        Ok(header.number.into())
    }

    async fn events_at(&self, block: &BlockRef) -> Result<Vec<ChainEvent>, ChainError> {
        let events = self.api.events().at(to_h256(block.hash)).await.map_err(rpc_err)?;
        let mut decoded = Vec::new();
        for event in events.iter() {
            let event = event.map_err(rpc_err)?;
            let (pallet, variant) = (event.pallet_name(), event.variant_name());
            let typed = match (pallet, variant) {
                (schema::PALLET, ewx_rewards::REWARDS_CALCULATED_EVENT) => {
                    let fields = event.field_values().map_err(rpc_err)?;
                    let period = u64_of(first_field(&fields, variant)?, variant)?;
                    ChainEvent::RewardsCalculatedForPeriod { period }
                }
                (schema::PALLET, ewx_rewards::EARNED_REWARD_EVENT) => ChainEvent::EarnedRewardCalculated,
                _ => ChainEvent::Other { pallet: pallet.to_string(), variant: variant.to_string() },
            };
            decoded.push(typed);
        }
        Ok(decoded)
    }

    async fn current_period(&self) -> Result<PeriodDescriptor, ChainError> {
        let best = self.best_block_number().await?;
        let block = self.block_hash(best).await?;
        self.period_at(&block).await
    }

    async fn period_at(&self, block: &BlockRef) -> Result<PeriodDescriptor, ChainError> {
        let what = schema::REWARD_PERIOD;
        let value = self.fetch(block, what, vec![]).await?.ok_or_else(|| ChainError::Decode {
            what: what.into(),
            reason: format!("storage item is empty at {block}"),
        })?;
        Ok(PeriodDescriptor {
            index: u64_of(field(&value, schema::REWARD_PERIOD_INDEX, what)?, what)?,
            first_block: u64_of(field(&value, schema::REWARD_PERIOD_FIRST_BLOCK, what)?, what)?,
            length: u64_of(field(&value, schema::REWARD_PERIOD_LENGTH, what)?, what)?,
        })
    }

    async fn stake_ledger(
        &self,
        block: &BlockRef,
        group: &GroupNamespace,
        address: &Address,
    ) -> Result<Option<StakeLedger>, ChainError> {
        let keys = vec![namespace_key(group), Value::from_bytes(account(address)?.0)];
        let query = subxt::dynamic::storage(schema::PALLET, schema::STAKE_RECORDS, keys);
        let mut entries = self
            .api
            .storage()
            .at(to_h256(block.hash))
            .iter(query)
            .await
            .map_err(rpc_err)?;

        let mut ledger = BTreeMap::new();
        while let Some(entry) = entries.next().await {
            let entry = entry.map_err(rpc_err)?;
            let period = trailing_u64_key(&entry.key_bytes, schema::STAKE_RECORDS)?;
            let stake = amount_of(&entry.value.to_value().map_err(rpc_err)?, schema::STAKE_RECORDS)?;
            ledger.insert(period, stake);
        }
        Ok((!ledger.is_empty()).then(|| StakeLedger::new(ledger)))
    }

    async fn group_config(
        &self,
        block: &BlockRef,
        group: &GroupNamespace,
    ) -> Result<Option<GroupConfig>, ChainError> {
        let Some(value) = self.fetch(block, schema::SOLUTION_GROUPS, vec![namespace_key(group)]).await?
        else {
            return Ok(None);
        };
        let what = schema::SOLUTION_GROUPS;
        let operators = field(&value, schema::OPERATORS_CONFIG, what)?;
        let threshold = u64_of(field(operators, schema::SLA_VOTING_THRESHOLD, what)?, what)?;
        Ok(Some(GroupConfig {
            namespace: group.clone(),
            sla_voting_threshold_percent: threshold as f64,
        }))
    }

    async fn period_counter(
        &self,
        block: &BlockRef,
        counter: PeriodCounter,
        group: &GroupNamespace,
        period: u64,
    ) -> Result<Option<u64>, ChainError> {
        let keys = vec![namespace_key(group), Value::u128(period.into())];
        self.fetch_u64(block, counter_item(counter), keys).await
    }

    async fn correct_votes(
        &self,
        block: &BlockRef,
        group: &GroupNamespace,
        period: u64,
        address: &Address,
    ) -> Result<Option<u64>, ChainError> {
        let keys = vec![
            namespace_key(group),
            Value::u128(period.into()),
            Value::from_bytes(account(address)?.0),
        ];
        self.fetch_u64(block, schema::CORRECT_VOTES, keys).await
    }

    async fn reward_totals(
        &self,
        block: &BlockRef,
        group: &GroupNamespace,
        address: &Address,
    ) -> Result<Option<RewardTotals>, ChainError> {
        let keys = vec![namespace_key(group), Value::from_bytes(account(address)?.0)];
        let Some(value) = self.fetch(block, schema::REWARD_TOTALS, keys).await? else {
            return Ok(None);
        };
        let what = schema::REWARD_TOTALS;
        Ok(Some(RewardTotals {
            subscription: amount_of(field(&value, schema::SUBSCRIPTION_REWARD, what)?, what)?,
            voting: amount_of(field(&value, schema::VOTING_REWARD, what)?, what)?,
        }))
    }

    async fn system_voting_rounds(&self, block: &BlockRef, period: u64) -> Result<u64, ChainError> {
        let query = subxt::dynamic::storage(
            schema::PALLET,
            schema::SYSTEM_VOTING_ROUNDS,
            vec![Value::u128(period.into())],
        );
        let mut entries = self
            .api
            .storage()
            .at(to_h256(block.hash))
            .iter(query)
            .await
            .map_err(rpc_err)?;
        let mut count = 0u64;
        while let Some(entry) = entries.next().await {
            entry.map_err(rpc_err)?;
            count += 1;
        }
        Ok(count)
    }

    async fn supports(&self, capability: Capability) -> Result<bool, ChainError> {
        let item = match capability {
            Capability::OperatorNominationCounter => schema::OPERATOR_ROUNDS_WITH_NOMINATION,
        };
        let metadata = self.api.metadata();
        let supported = metadata
            .pallet_by_name(schema::PALLET)
            .and_then(|pallet| pallet.storage())
            .and_then(|storage| storage.entry_by_name(item))
            .is_some();
        Ok(supported)
    }
}

impl std::fmt::Debug for SubxtChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubxtChainClient").field("url", &self.url.as_str()).finish()
    }
}
