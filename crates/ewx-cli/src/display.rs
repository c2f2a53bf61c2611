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

//! Display utilities for consistent CLI output formatting

use std::fmt::Display;

use alloy_primitives::{I256, U256};
use colored::Colorize;
use ewx_rewards::{
    format_ewt, format_signed_ewt, Address, AnalysisConfig, AuditReport, BlockRef, Confidence,
    RewardTotals, SlaVerdict,
};
use serde::Serialize;

/// Standard display formatter for CLI output
pub struct DisplayManager;

impl DisplayManager {
    pub fn new() -> Self {
        Self
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        println!("\n{}", title.bold());
    }

    /// Print a labeled value with standard indentation
    pub fn item(&self, label: &str, value: impl Display) {
        println!("  {:<16} {}", format!("{}:", label), value);
    }

    /// Print a labeled value with custom color
    pub fn item_colored(&self, label: &str, value: impl Display, color: &str) {
        let colored_value = match color {
            "green" => value.to_string().green().to_string(),
            "cyan" => value.to_string().cyan().to_string(),
            "yellow" => value.to_string().yellow().to_string(),
            "red" => value.to_string().red().to_string(),
            "dimmed" => value.to_string().dimmed().to_string(),
            _ => value.to_string(),
        };
        println!("  {:<16} {}", format!("{}:", label), colored_value);
    }

    pub fn address(&self, label: &str, address: &Address) {
        self.item_colored(label, address, "dimmed");
    }

    pub fn block(&self, label: &str, block: &BlockRef) {
        self.item_colored(label, block, "cyan");
    }

    /// Print a balance with token symbol
    pub fn balance(&self, label: &str, amount: &str, symbol: &str, color: &str) {
        let colored_amount = match color {
            "green" => amount.green().bold().to_string(),
            "cyan" => amount.cyan().bold().to_string(),
            "yellow" => amount.yellow().bold().to_string(),
            "red" => amount.red().bold().to_string(),
            _ => amount.to_string(),
        };
        println!("  {:<16} {} {}", format!("{}:", label), colored_amount, symbol);
    }

    /// Print how the initial block was chosen
    pub fn confidence(&self, confidence: Confidence) {
        let color = match confidence {
            Confidence::Exact => "green",
            Confidence::Degraded | Confidence::LastResort => "yellow",
        };
        self.item_colored("Confidence", confidence, color);
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        println!("\n{} {}", "✓".green().bold(), message.green().bold());
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        println!("\n{} {}", "⚠".yellow(), message.yellow());
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        println!("\n{} {}", "✗".red().bold(), message.red());
    }

    /// Print a note or additional info
    pub fn note(&self, message: &str) {
        println!("  {}", message.dimmed());
    }
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}

fn delta_color(delta: I256) -> &'static str {
    if delta.is_negative() {
        "red"
    } else {
        "green"
    }
}

/// Render an [AuditReport] for a terminal.
pub fn print_report(config: &AnalysisConfig, report: &AuditReport) {
    let display = DisplayManager::new();
    let result = &report.result;

    display.header(&format!("Reward period {}", report.bounds.index));
    display.item("Blocks", format!("#{}..=#{}", report.bounds.start, report.bounds.end));
    display.item("Group", &config.group);
    display.address("Operator", &config.address);
    display.balance("Stake", &format_ewt(report.subscription.stake), "EWT", "cyan");

    display.header("Blocks");
    display.block("Distribution", &report.distribution.block);
    display.item("Found by", report.distribution.strategy);
    display.item("In period", result.period.index);
    display.block("Initial", &report.initial.block);
    display.confidence(report.initial.confidence);
    if report.initial.confidence != Confidence::Exact {
        display.note("The initial block may already include part of this distribution.");
    }

    display.header("Rewards");
    display.balance("Subscription", &format_ewt(result.initial_rewards.subscription), "EWT", "");
    display.balance("  at distribution", &format_ewt(result.final_rewards.subscription), "EWT", "");
    let subscription = result.period_rewards.subscription;
    display.balance(
        "  earned",
        &format_signed_ewt(subscription),
        "EWT",
        delta_color(subscription),
    );
    display.balance("Voting", &format_ewt(result.initial_rewards.voting), "EWT", "");
    display.balance("  at distribution", &format_ewt(result.final_rewards.voting), "EWT", "");
    let voting = result.period_rewards.voting;
    display.balance("  earned", &format_signed_ewt(voting), "EWT", delta_color(voting));

    display.header("SLA");
    display.item("Eligible rounds", result.eligible_rounds);
    display.item("Correct votes", result.votes);
    match result.vote_ratio_percent {
        Some(ratio) => display.item("Vote ratio", format!("{ratio:.2}%")),
        None => display.item_colored("Vote ratio", "n/a", "dimmed"),
    }
    display.item("Threshold", format!("{}%", result.sla_threshold_percent));

    if result.period_rewards.is_negative() {
        display.warning("Rewards decreased between the initial and distribution blocks");
    }
    match result.sla {
        SlaVerdict::Met => display.success("SLA met"),
        SlaVerdict::Missed => display.error("SLA missed"),
        SlaVerdict::NotApplicable => display.note("No eligible voting rounds in this period"),
    }
}

/// Block as shown in JSON output.
#[derive(Debug, Serialize)]
pub struct BlockView {
    pub number: Option<u64>,
    pub hash: String,
}

impl From<&BlockRef> for BlockView {
    fn from(block: &BlockRef) -> Self {
        Self { number: block.number, hash: format!("{:#x}", block.hash) }
    }
}

/// Amount in minor units and in EWT. Both are strings so no precision is lost.
#[derive(Debug, Serialize)]
pub struct AmountView {
    pub raw: String,
    pub ewt: String,
}

impl AmountView {
    fn unsigned(amount: U256) -> Self {
        Self { raw: amount.to_string(), ewt: format_ewt(amount) }
    }

    fn signed(amount: I256) -> Self {
        Self { raw: amount.to_string(), ewt: format_signed_ewt(amount) }
    }
}

#[derive(Debug, Serialize)]
pub struct RewardsView {
    pub subscription: AmountView,
    pub voting: AmountView,
}

impl From<&RewardTotals> for RewardsView {
    fn from(totals: &RewardTotals) -> Self {
        Self {
            subscription: AmountView::unsigned(totals.subscription),
            voting: AmountView::unsigned(totals.voting),
        }
    }
}

/// JSON form of an [AuditReport].
#[derive(Debug, Serialize)]
pub struct ReportView {
    pub period: u64,
    pub first_block: u64,
    pub last_block: u64,
    pub group: String,
    pub address: String,
    pub stake: AmountView,
    pub stake_updated_in_period: u64,
    pub distribution_block: BlockView,
    pub distribution_found_by: String,
    pub distribution_period: u64,
    pub initial_block: BlockView,
    pub initial_confidence: String,
    pub initial_rewards: RewardsView,
    pub final_rewards: RewardsView,
    pub period_rewards: RewardsView,
    pub rewards_decreased: bool,
    pub eligible_rounds: u64,
    pub votes: u64,
    pub vote_ratio_percent: Option<f64>,
    pub sla_threshold_percent: f64,
    pub sla: String,
}

impl ReportView {
    pub fn new(config: &AnalysisConfig, report: &AuditReport) -> Self {
        let result = &report.result;
        Self {
            period: report.bounds.index,
            first_block: report.bounds.start,
            last_block: report.bounds.end,
            group: config.group.to_string(),
            address: config.address.to_string(),
            stake: AmountView::unsigned(report.subscription.stake),
            stake_updated_in_period: report.subscription.last_update_period,
            distribution_block: (&report.distribution.block).into(),
            distribution_found_by: report.distribution.strategy.to_string(),
            distribution_period: result.period.index,
            initial_block: (&report.initial.block).into(),
            initial_confidence: report.initial.confidence.to_string(),
            initial_rewards: (&result.initial_rewards).into(),
            final_rewards: (&result.final_rewards).into(),
            period_rewards: RewardsView {
                subscription: AmountView::signed(result.period_rewards.subscription),
                voting: AmountView::signed(result.period_rewards.voting),
            },
            rewards_decreased: result.period_rewards.is_negative(),
            eligible_rounds: result.eligible_rounds,
            votes: result.votes,
            vote_ratio_percent: result.vote_ratio_percent,
            sla_threshold_percent: result.sla_threshold_percent,
            sla: result.sla.to_string(),
        }
    }
}
