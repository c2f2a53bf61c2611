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

//! Comparison of the pre- and post-distribution snapshots.

use std::fmt;

use crate::{
    snapshot::Snapshot,
    types::{GroupConfig, PeriodDescriptor, RewardDelta, RewardTotals},
};

/// Outcome of the SLA participation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlaVerdict {
    Met,
    Missed,
    /// No eligible rounds, so no ratio exists.
    NotApplicable,
}

impl fmt::Display for SlaVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SlaVerdict::Met => "met",
            SlaVerdict::Missed => "missed",
            SlaVerdict::NotApplicable => "n/a",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    /// Reward period active at the distribution block.
    pub period: PeriodDescriptor,
    /// Group configuration before distribution.
    pub group: GroupConfig,
    pub initial_rewards: RewardTotals,
    pub final_rewards: RewardTotals,
    /// `final_rewards - initial_rewards`, possibly negative.
    pub period_rewards: RewardDelta,
    pub eligible_rounds: u64,
    pub votes: u64,
    /// `votes / eligible_rounds * 100`, or `None` without eligible rounds.
    pub vote_ratio_percent: Option<f64>,
    /// Threshold in effect before distribution.
    pub sla_threshold_percent: f64,
    pub sla: SlaVerdict,
}

impl AnalysisResult {
    pub fn meets_sla(&self) -> Option<bool> {
        match self.sla {
            SlaVerdict::Met => Some(true),
            SlaVerdict::Missed => Some(false),
            SlaVerdict::NotApplicable => None,
        }
    }
}

/// Compute the period result from the snapshots taken before and after distribution.
///
/// Round and vote counters come from the `final` snapshot, where the period is complete. The group
/// configuration and SLA threshold come from `initial`, the configuration the period was judged
/// under.
pub fn analyze(initial: &Snapshot, final_: &Snapshot) -> AnalysisResult {
    let eligible_rounds = final_.rounds.eligible();
    let votes = final_.votes;
    let vote_ratio_percent =
        (eligible_rounds > 0).then(|| votes as f64 / eligible_rounds as f64 * 100.0);
    let sla_threshold_percent = initial.group.sla_voting_threshold_percent;
    let sla = match vote_ratio_percent {
        Some(ratio) if ratio >= sla_threshold_percent => SlaVerdict::Met,
        Some(_) => SlaVerdict::Missed,
        None => SlaVerdict::NotApplicable,
    };

    AnalysisResult {
        period: final_.period,
        group: initial.group.clone(),
        initial_rewards: initial.rewards,
        final_rewards: final_.rewards,
        period_rewards: initial.rewards.delta_to(&final_.rewards),
        eligible_rounds,
        votes,
        vote_ratio_percent,
        sla_threshold_percent,
        sla,
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{B256, I256, U256};

    use super::*;
    use crate::{snapshot::EligibleRounds, types::BlockRef};

    const PERIOD: PeriodDescriptor = PeriodDescriptor { index: 9, first_block: 900, length: 100 };

    fn snapshot(number: u64, eligible: u64, votes: u64, threshold: f64, rewards: (&str, &str)) -> Snapshot {
        Snapshot {
            block: BlockRef::new(B256::with_last_byte(number as u8), number),
            period: PERIOD,
            group: GroupConfig {
                namespace: "energyweb.smartflow".parse().unwrap(),
                sla_voting_threshold_percent: threshold,
            },
            rounds: EligibleRounds { total: eligible, ..Default::default() },
            votes,
            rewards: RewardTotals::new(rewards.0.parse().unwrap(), rewards.1.parse().unwrap()),
        }
    }

    #[test]
    fn test_reward_delta() {
        let initial = snapshot(1, 49, 0, 60.0, ("7982644892450463358", "30299138028873089534"));
        let final_ = snapshot(2, 49, 61, 60.0, ("8206437276591532332", "31834395275802910556"));
        let result = analyze(&initial, &final_);
        assert_eq!(result.period_rewards.subscription, "223792384141068974".parse::<I256>().unwrap());
        assert_eq!(result.period_rewards.voting, "1535257246929821022".parse::<I256>().unwrap());
        assert!(!result.period_rewards.is_negative());
        assert_eq!(result.final_rewards.voting, "31834395275802910556".parse::<U256>().unwrap());
    }

    #[test]
    fn test_sla_met_above_hundred_percent() {
        let initial = snapshot(1, 0, 0, 60.0, ("0", "0"));
        let final_ = snapshot(2, 49, 61, 75.0, ("0", "0"));
        let result = analyze(&initial, &final_);
        let ratio = result.vote_ratio_percent.unwrap();
        assert!((ratio - 124.49).abs() < 0.01, "ratio {ratio}");
        assert_eq!(result.sla, SlaVerdict::Met);
        // The threshold before distribution applies.
        assert_eq!(result.sla_threshold_percent, 60.0);
        assert_eq!(result.group.sla_voting_threshold_percent, 60.0);
        assert_eq!(result.period, PERIOD);
    }

    #[test]
    fn test_sla_met() {
        let initial = snapshot(1, 0, 0, 60.0, ("0", "0"));
        let final_ = snapshot(2, 87, 61, 60.0, ("0", "0"));
        let result = analyze(&initial, &final_);
        assert!((result.vote_ratio_percent.unwrap() - 70.11).abs() < 0.01);
        assert_eq!(result.meets_sla(), Some(true));
    }

    #[test]
    fn test_sla_missed() {
        let initial = snapshot(1, 0, 0, 80.0, ("0", "0"));
        let final_ = snapshot(2, 87, 61, 60.0, ("0", "0"));
        assert_eq!(analyze(&initial, &final_).sla, SlaVerdict::Missed);
    }

    #[test]
    fn test_no_eligible_rounds() {
        let initial = snapshot(1, 0, 0, 60.0, ("0", "0"));
        let final_ = snapshot(2, 0, 12, 60.0, ("0", "0"));
        let result = analyze(&initial, &final_);
        assert_eq!(result.vote_ratio_percent, None);
        assert_eq!(result.sla, SlaVerdict::NotApplicable);
        assert_eq!(result.meets_sla(), None);
    }

    #[test]
    fn test_negative_delta_not_clamped() {
        let initial = snapshot(1, 10, 0, 60.0, ("500", "100"));
        let final_ = snapshot(2, 10, 10, 60.0, ("400", "100"));
        let result = analyze(&initial, &final_);
        assert_eq!(result.period_rewards.subscription, I256::try_from(-100i64).unwrap());
        assert_eq!(result.period_rewards.voting, I256::ZERO);
        assert!(result.period_rewards.is_negative());
    }

    #[test]
    fn test_idempotent() {
        let initial = snapshot(1, 0, 0, 60.0, ("7982644892450463358", "30299138028873089534"));
        let final_ = snapshot(2, 49, 61, 60.0, ("8206437276591532332", "31834395275802910556"));
        assert_eq!(analyze(&initial, &final_), analyze(&initial, &final_));
    }
}
