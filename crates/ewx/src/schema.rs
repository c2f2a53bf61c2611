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

//! Names of the worker node pallet items read by [crate::SubxtChainClient].

/// Pallet holding solution groups, stakes, votes and rewards.
pub const PALLET: &str = "WorkerNodePallet";

/// Active reward period descriptor. Plain value.
pub const REWARD_PERIOD: &str = "RewardPeriod";
pub const REWARD_PERIOD_INDEX: &str = "current";
pub const REWARD_PERIOD_FIRST_BLOCK: &str = "first_block";
pub const REWARD_PERIOD_LENGTH: &str = "length";

/// Stake per update period. Keys: `(namespace, account, period)`.
pub const STAKE_RECORDS: &str = "SolutionGroupStakeRecords";

/// Solution group definitions. Key: `namespace`.
pub const SOLUTION_GROUPS: &str = "SolutionGroups";
pub const OPERATORS_CONFIG: &str = "operators_config";
/// Minimum share of eligible rounds, as a whole percent, within [OPERATORS_CONFIG].
pub const SLA_VOTING_THRESHOLD: &str = "start_block_voting_threshold";

/// Voting rounds of a group in a period. Keys: `(namespace, period)`.
pub const TOTAL_VOTING_ROUNDS: &str = "TotalVotingRoundsPerPeriod";
/// Nominated voting rounds of a group in a period. Keys: `(namespace, period)`.
pub const ROUNDS_WITH_NOMINATION: &str = "VotingRoundsWithNominationPerPeriod";
/// Nominated rounds still owed by the operator. Keys: `(namespace, period)`. Not on every runtime.
pub const OPERATOR_ROUNDS_WITH_NOMINATION: &str = "OperatorVotingRoundsWithNominationPerPeriod";

/// Correct votes of an operator. Keys: `(namespace, period, account)`.
pub const CORRECT_VOTES: &str = "CorrectVotesPerPeriod";

/// Accumulated rewards of an operator. Keys: `(namespace, account)`.
pub const REWARD_TOTALS: &str = "OperatorRewards";
pub const SUBSCRIPTION_REWARD: &str = "subscription_reward";
pub const VOTING_REWARD: &str = "voting_reward";

/// System voting round records. Keys: `(period, round)`.
pub const SYSTEM_VOTING_ROUNDS: &str = "SystemVotingRounds";
