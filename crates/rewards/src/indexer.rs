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

//! Client for the optional GraphQL event indexer.
//!
//! Indexer data is advisory. Nothing it returns is treated as authoritative, and any failure here
//! only makes the caller fall back to scanning the chain.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::chain::REWARDS_CALCULATED_EVENT;

/// Query returning every indexed distribution event, newest first.
pub const DISTRIBUTION_EVENTS_QUERY: &str = r#"query DistributionEvents {
  events(where: {name_eq: "RewardsCalculatedForPeriod"}, orderBy: blockNumber_DESC) {
    name
    blockNumber
  }
}"#;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("indexer request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("indexer returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("indexer query failed: {0}")]
    Query(String),
}

/// An event as recorded by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedEvent {
    pub name: String,
    pub block_number: u64,
}

/// Source of indexed distribution events.
#[async_trait]
pub trait Indexer: Send + Sync {
    /// All indexed emissions of the distribution event, ordered by block number descending.
    async fn distribution_events(&self) -> Result<Vec<IndexedEvent>, IndexerError>;
}

#[derive(Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    data: Option<EventsData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Deserialize)]
struct EventsData {
    events: Vec<IndexedEvent>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

/// [Indexer] backed by a GraphQL endpoint.
pub struct GraphqlIndexer {
    client: Client,
    url: Url,
}

impl GraphqlIndexer {
    pub fn new(url: Url) -> Result<Self, IndexerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("ewx-rewards/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl Indexer for GraphqlIndexer {
    async fn distribution_events(&self) -> Result<Vec<IndexedEvent>, IndexerError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&GraphqlRequest { query: DISTRIBUTION_EVENTS_QUERY })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IndexerError::Status(response.status()));
        }

        let body: GraphqlResponse = response.json().await?;
        if !body.errors.is_empty() {
            let messages: Vec<_> = body.errors.into_iter().map(|e| e.message).collect();
            return Err(IndexerError::Query(messages.join("; ")));
        }
        let mut events = body
            .data
            .ok_or_else(|| IndexerError::Query("response has no data".into()))?
            .events;

        events.retain(|event| event.name == REWARDS_CALCULATED_EVENT);
        events.sort_by(|a, b| b.block_number.cmp(&a.block_number));
        tracing::debug!("Indexer at {} returned {} distribution events", self.url, events.len());
        Ok(events)
    }
}
