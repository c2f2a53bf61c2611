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

use clap::Args;
use ewx_rewards::{current_period, locate_blocks, EventLocator, Indexer};

use crate::{
    config::{GlobalConfig, LocateConfig},
    display::DisplayManager,
};

/// Command to find the distribution block of a reward period and the block before it.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct Locate {
    /// Index of a reward period that has already ended.
    pub period: u64,
    #[clap(flatten, next_help_heading = "Block Discovery")]
    pub locate: LocateConfig,
}

impl Locate {
    /// Run the [Locate] command.
    pub async fn run(&self, global_config: &GlobalConfig) -> anyhow::Result<()> {
        let options = self.locate.options()?;
        let indexer = self.locate.indexer(global_config)?;
        let locator =
            EventLocator::from_options(&options, indexer.as_ref().map(|i| i as &dyn Indexer));
        tracing::debug!("Lookup strategies: {:?}", locator.kinds());

        let chain = global_config.connect().await?;
        let current = current_period(&chain).await?;
        let (distribution, initial) =
            locate_blocks(&chain, &locator, &current, self.period, options.initial_window)
                .await?;

        let display = DisplayManager::new();
        display.header(&format!("Reward period {}", self.period));
        display.block("Distribution", &distribution.block);
        display.item("Found by", distribution.strategy);
        display.block("Initial", &initial.block);
        display.confidence(initial.confidence);
        Ok(())
    }
}
