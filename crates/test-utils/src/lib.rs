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

//! Test utilities for the EWX rewards engine.
//!
//! [MockChain] and [MockIndexer] implement the engine's chain and indexer traits over in-memory
//! data and count the calls made against them.

pub mod chain;
pub mod indexer;

pub use chain::{block_hash, MockChain};
pub use indexer::MockIndexer;

/// SS58 address of the well-known development account used across tests.
pub const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";

/// Solution group namespace used across tests.
pub const GROUP: &str = "energyweb.smartflow";
