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

//! Energy Web X chain access.
//!
//! [SubxtChainClient] implements [ewx_rewards::ChainClient] over a Substrate JSON-RPC connection.
//! Storage and events are read through the dynamic API of `subxt` and decoded into the typed
//! entities of [ewx_rewards::types] right here, so no encoded value leaves this crate.

mod client;
mod decode;
pub mod networks;
pub mod schema;

pub use client::SubxtChainClient;
pub use networks::{Network, NetworkBuilder, NetworkName};
