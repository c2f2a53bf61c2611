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

use anyhow::Context;
use clap::Args;
use ewx_rewards::{run_audit, Address, AnalysisConfig, GroupNamespace, Indexer};

use crate::{
    config::{GlobalConfig, LocateConfig},
    display::{print_report, ReportView},
};

/// Command to run the full reward and SLA analysis.
#[non_exhaustive]
#[derive(Args, Clone, Debug)]
pub struct Analyze {
    /// Index of a reward period that has already ended.
    #[clap(value_parser = clap::value_parser!(u64).range(1..))]
    pub period: u64,
    /// Namespace of the solution group.
    pub group: GroupNamespace,
    /// SS58 address of the operator.
    pub address: Address,
    #[clap(flatten, next_help_heading = "Block Discovery")]
    pub locate: LocateConfig,
    /// Print the report as JSON.
    #[clap(long, default_value_t = false)]
    pub json: bool,
}

impl Analyze {
    /// Run the [Analyze] command.
    pub async fn run(&self, global_config: &GlobalConfig) -> anyhow::Result<()> {
        let mut builder = AnalysisConfig::builder();
        builder
            .period(self.period)
            .group(self.group.clone())
            .address(self.address.clone())
            .locate_options(self.locate.options()?);
        let config = builder.build().context("invalid analysis parameters")?;
        let indexer = self.locate.indexer(global_config)?;

        let chain = global_config.connect().await?;
        let report = run_audit(&chain, indexer.as_ref().map(|i| i as &dyn Indexer), &config).await?;

        if self.json {
            let view = ReportView::new(&config, &report);
            println!("{}", serde_json::to_string_pretty(&view)?);
        } else {
            print_report(&config, &report);
        }
        Ok(())
    }
}
