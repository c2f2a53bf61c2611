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

use std::borrow::Cow;

use anyhow::Context;
use clap::ValueEnum;
use derive_builder::Builder;
use url::Url;

/// Connection defaults for an Energy Web X network.
#[non_exhaustive]
#[derive(Clone, Debug, Builder)]
pub struct Network {
    #[builder(setter(into))]
    pub name: Cow<'static, str>,

    /// WebSocket JSON-RPC endpoint of a public archive node.
    #[builder(setter(into))]
    pub rpc_url: Cow<'static, str>,

    /// GraphQL endpoint of an event indexer, if one is operated for the network.
    #[builder(setter(into, strip_option), default)]
    pub indexer_url: Option<Cow<'static, str>>,
}

impl Network {
    /// Create a new [NetworkBuilder].
    pub fn builder() -> NetworkBuilder {
        Default::default()
    }

    /// Lookup the [Network] for a known name.
    pub const fn from_name(name: NetworkName) -> Network {
        match name {
            NetworkName::Mainnet => MAINNET,
            NetworkName::Testnet => TESTNET,
        }
    }

    pub fn rpc_url(&self) -> anyhow::Result<Url> {
        Url::parse(&self.rpc_url).with_context(|| format!("invalid RPC URL for {}", self.name))
    }

    pub fn indexer_url(&self) -> anyhow::Result<Option<Url>> {
        self.indexer_url
            .as_deref()
            .map(|url| Url::parse(url).with_context(|| format!("invalid indexer URL for {}", self.name)))
            .transpose()
    }
}

/// Networks with built-in defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum NetworkName {
    Mainnet,
    Testnet,
}

/// [Network] for Energy Web X mainnet.
pub const MAINNET: Network = Network {
    name: Cow::Borrowed("mainnet"),
    rpc_url: Cow::Borrowed("wss://public-rpc.mainnet.energywebx.com"),
    indexer_url: None,
};

/// [Network] for the Energy Web X testnet.
pub const TESTNET: Network = Network {
    name: Cow::Borrowed("testnet"),
    rpc_url: Cow::Borrowed("wss://public-rpc.testnet.energywebx.com"),
    indexer_url: None,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_parse() {
        for name in [NetworkName::Mainnet, NetworkName::Testnet] {
            let network = Network::from_name(name);
            assert_eq!(network.rpc_url().unwrap().scheme(), "wss");
            assert!(network.indexer_url().unwrap().is_none());
        }
    }

    #[test]
    fn test_builder() {
        let network = Network::builder()
            .name("local")
            .rpc_url("ws://127.0.0.1:9944")
            .indexer_url("http://127.0.0.1:4350/graphql")
            .build()
            .unwrap();
        assert_eq!(network.rpc_url().unwrap().port(), Some(9944));
        assert_eq!(network.indexer_url().unwrap().unwrap().path(), "/graphql");
    }
}
