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

//! Commands of the EWX rewards CLI.

mod analyze;
mod check_subscription;
mod locate;
mod period_bounds;

pub use analyze::Analyze;
pub use check_subscription::CheckSubscription;
pub use locate::Locate;
pub use period_bounds::PeriodBounds;

use clap::Subcommand;

use crate::config::GlobalConfig;

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Analyze the rewards and SLA compliance of an operator for a past reward period.
    Analyze(Analyze),
    /// Print the block range of a reward period.
    PeriodBounds(PeriodBounds),
    /// Check that an operator had a qualifying stake in a reward period.
    CheckSubscription(CheckSubscription),
    /// Find the distribution block of a reward period and the block before distribution began.
    Locate(Locate),
}

impl Command {
    /// Run the command.
    pub async fn run(&self, global_config: &GlobalConfig) -> anyhow::Result<()> {
        match self {
            Self::Analyze(cmd) => cmd.run(global_config).await,
            Self::PeriodBounds(cmd) => cmd.run(global_config).await,
            Self::CheckSubscription(cmd) => cmd.run(global_config).await,
            Self::Locate(cmd) => cmd.run(global_config).await,
        }
    }
}
