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
use ewx_rewards::{current_period, period_bounds, Stage, StageExt};

use crate::{config::GlobalConfig, display::DisplayManager};

/// Command to print the block range of a reward period.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct PeriodBounds {
    /// Index of the reward period.
    pub period: u64,
}

impl PeriodBounds {
    /// Run the [PeriodBounds] command.
    pub async fn run(&self, global_config: &GlobalConfig) -> anyhow::Result<()> {
        let chain = global_config.connect().await?;
        let current = current_period(&chain).await?;
        let bounds = period_bounds(&current, self.period).stage(Stage::Setup)?;

        let display = DisplayManager::new();
        display.header(&format!("Reward period {}", self.period));
        display.item("First block", format!("#{}", bounds.start));
        display.item("Last block", format!("#{}", bounds.end));
        display.item("Blocks", bounds.block_count());
        display.item("Current period", current.index);
        Ok(())
    }
}
