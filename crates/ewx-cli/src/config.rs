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

//! Common configuration options for commands in the EWX rewards CLI.

use std::{num::ParseIntError, time::Duration};

use alloy_primitives::B256;
use anyhow::{Context, Result};
use clap::Args;
use ewx_chain::{Network, NetworkName, SubxtChainClient};
use ewx_rewards::{GraphqlIndexer, LocateOptions, DEFAULT_INDEXER_WINDOW, DEFAULT_INITIAL_WINDOW};
use tracing::level_filters::LevelFilter;
use url::Url;

fn parse_secs(arg: &str) -> Result<Duration, ParseIntError> {
    Ok(Duration::from_secs(arg.parse()?))
}

/// Common configuration options for all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalConfig {
    /// URL of the Energy Web X RPC endpoint
    #[clap(short, long, env = "RPC_URL", global = true)]
    pub rpc_url: Option<Url>,

    /// Network whose defaults to use when no RPC URL is given
    #[clap(long, env = "EWX_NETWORK", global = true, value_enum)]
    pub network: Option<NetworkName>,

    /// Log level (error, warn, info, debug, trace)
    #[clap(long, env = "LOG_LEVEL", global = true, default_value = "info")]
    pub log_level: LevelFilter,

    /// Whether to log in JSON format.
    #[clap(long, env, global = true, default_value_t = false)]
    pub log_json: bool,
}

impl GlobalConfig {
    fn network(&self) -> Option<Network> {
        self.network.map(Network::from_name)
    }

    /// Resolve the RPC URL from `--rpc-url` or the selected network, or return an error that can
    /// be shown to the user.
    pub fn require_rpc_url(&self) -> Result<Url> {
        if let Some(url) = &self.rpc_url {
            return Ok(url.clone());
        }
        self.network()
            .context("RPC URL not provided; please set --rpc-url, the RPC_URL env var or --network")?
            .rpc_url()
    }

    /// Indexer endpoint of the selected network, if it has one.
    pub fn default_indexer_url(&self) -> Result<Option<Url>> {
        match self.network() {
            Some(network) => network.indexer_url(),
            None => Ok(None),
        }
    }

    /// Connect to the chain. The connection is closed when the client is dropped.
    pub async fn connect(&self) -> Result<SubxtChainClient> {
        let rpc_url = self.require_rpc_url()?;
        SubxtChainClient::connect(&rpc_url).await
    }
}

/// Options controlling how the distribution and initial blocks are found.
#[derive(Args, Debug, Clone)]
pub struct LocateConfig {
    /// Hash of the block known to contain the distribution event. Disables every other lookup.
    #[clap(long, env = "BLOCK_HASH")]
    pub block_hash: Option<B256>,

    /// GraphQL endpoint of an event indexer to query before scanning the chain.
    #[clap(long, env = "INDEXER_URL")]
    pub indexer_url: Option<Url>,

    /// Re-check the event log at the block reported by the indexer.
    #[clap(long, default_value_t = false)]
    pub verify_indexer: bool,

    /// Number of blocks after the start of the next period in which an indexed event is accepted.
    #[clap(long, default_value_t = DEFAULT_INDEXER_WINDOW)]
    pub indexer_window: u64,

    /// Number of blocks to walk back from the distribution block.
    #[clap(long, default_value_t = DEFAULT_INITIAL_WINDOW, value_parser = clap::value_parser!(u64).range(1..))]
    pub initial_window: u64,

    /// Give up scanning the chain after this many seconds.
    #[clap(long, value_parser = parse_secs)]
    pub scan_timeout: Option<Duration>,
}

impl LocateConfig {
    /// Build the indexer client from `--indexer-url` or the network default.
    pub fn indexer(&self, global_config: &GlobalConfig) -> Result<Option<GraphqlIndexer>> {
        let url = match &self.indexer_url {
            Some(url) => Some(url.clone()),
            None => global_config.default_indexer_url()?,
        };
        url.map(|url| GraphqlIndexer::new(url).context("failed to build indexer client")).transpose()
    }

    /// Block discovery settings shared by every command that locates blocks.
    pub fn options(&self) -> Result<LocateOptions> {
        let options = LocateOptions {
            pinned_block: self.block_hash,
            indexer_window: self.indexer_window,
            verify_indexer: self.verify_indexer,
            initial_window: self.initial_window,
            scan_budget: self.scan_timeout,
        };
        options.validate().context("invalid block discovery options")?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use ewx_rewards::{AnalysisConfig, EventLocator};

    use super::*;

    fn global(rpc_url: Option<&str>, network: Option<NetworkName>) -> GlobalConfig {
        GlobalConfig {
            rpc_url: rpc_url.map(|url| Url::parse(url).unwrap()),
            network,
            log_level: LevelFilter::INFO,
            log_json: false,
        }
    }

    #[test]
    fn test_rpc_url_precedence() {
        let explicit = global(Some("ws://127.0.0.1:9944"), Some(NetworkName::Mainnet));
        assert_eq!(explicit.require_rpc_url().unwrap().as_str(), "ws://127.0.0.1:9944/");

        let preset = global(None, Some(NetworkName::Testnet));
        assert_eq!(preset.require_rpc_url().unwrap().host_str(), Some("public-rpc.testnet.energywebx.com"));

        let err = global(None, None).require_rpc_url().unwrap_err();
        assert!(err.to_string().contains("RPC URL not provided"));
    }

    fn locate_config() -> LocateConfig {
        LocateConfig {
            block_hash: Some(B256::repeat_byte(1)),
            indexer_url: None,
            verify_indexer: true,
            indexer_window: 300,
            initial_window: DEFAULT_INITIAL_WINDOW,
            scan_timeout: Some(Duration::from_secs(5)),
        }
    }

    #[test]
    fn test_options_match_analysis_config() {
        let locate = locate_config();
        assert!(locate.indexer(&global(None, None)).unwrap().is_none());

        let options = locate.options().unwrap();
        let mut builder = AnalysisConfig::builder();
        builder
            .period(8)
            .group("energyweb.smartflow".parse().unwrap())
            .address("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY".parse().unwrap())
            .locate_options(options);
        let config = builder.build().unwrap();
        assert_eq!(config.locate_options(), options);
        assert_eq!(
            EventLocator::from_options(&options, None).kinds(),
            EventLocator::from_config(&config, None).kinds()
        );
    }

    #[test]
    fn test_zero_scan_timeout_rejected() {
        let locate = LocateConfig { scan_timeout: Some(Duration::ZERO), ..locate_config() };
        assert!(locate.options().is_err());
    }
}
