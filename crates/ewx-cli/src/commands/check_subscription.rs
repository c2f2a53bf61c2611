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
use ewx_rewards::{
    current_period, format_ewt, validate_subscription, Address, GroupNamespace, Stage, StageExt,
};

use crate::{config::GlobalConfig, display::DisplayManager};

/// Command to check that an operator had a qualifying stake in a reward period.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct CheckSubscription {
    /// Index of the reward period.
    pub period: u64,
    /// Namespace of the solution group.
    pub group: GroupNamespace,
    /// SS58 address of the operator.
    pub address: Address,
}

impl CheckSubscription {
    /// Run the [CheckSubscription] command.
    pub async fn run(&self, global_config: &GlobalConfig) -> anyhow::Result<()> {
        let chain = global_config.connect().await?;
        let current = current_period(&chain).await?;
        let subscription =
            validate_subscription(&chain, &current, &self.group, &self.address, self.period)
                .await
                .stage(Stage::Subscription)?;

        let display = DisplayManager::new();
        display.header("Subscription");
        display.item("Group", &self.group);
        display.address("Operator", &self.address);
        display.balance("Stake", &format_ewt(subscription.stake), "EWT", "cyan");
        display.item("Updated in", format!("period {}", subscription.last_update_period));
        display.success(&format!("Subscribed for period {}", self.period));
        Ok(())
    }
}
