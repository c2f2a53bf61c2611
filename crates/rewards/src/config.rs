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

use std::time::Duration;

use alloy_primitives::B256;
use derive_builder::{Builder, UninitializedFieldError};

use crate::{
    error::AuditError,
    types::{Address, GroupNamespace},
};

/// Blocks after the start of the next period in which an indexed distribution event is accepted.
pub const DEFAULT_INDEXER_WINDOW: u64 = 2_000;
/// Blocks walked back from the distribution block looking for pre-distribution state.
pub const DEFAULT_INITIAL_WINDOW: u64 = 50;

/// Parameters of one analysis run. Built once and passed by reference to every stage.
#[non_exhaustive]
#[derive(Debug, Clone, Builder)]
#[builder(build_fn(validate = "Self::validate", error = "AuditError"))]
pub struct AnalysisConfig {
    /// Index of the reward period to analyze.
    pub period: u64,

    /// Solution group the participant is subscribed to.
    pub group: GroupNamespace,

    /// Participant address.
    pub address: Address,

    /// Block asserted to hold the distribution event. Disables every other lookup strategy.
    #[builder(setter(into, strip_option), default)]
    pub pinned_block: Option<B256>,

    #[builder(default = "DEFAULT_INDEXER_WINDOW")]
    pub indexer_window: u64,

    /// Re-check the event log at blocks reported by the indexer.
    #[builder(default)]
    pub verify_indexer: bool,

    #[builder(default = "DEFAULT_INITIAL_WINDOW")]
    pub initial_window: u64,

    /// Wall-clock limit for the block-by-block scan.
    #[builder(setter(into, strip_option), default)]
    pub scan_budget: Option<Duration>,
}

impl AnalysisConfig {
    pub fn builder() -> AnalysisConfigBuilder {
        Default::default()
    }

    /// The block discovery settings of this run.
    pub fn locate_options(&self) -> LocateOptions {
        LocateOptions {
            pinned_block: self.pinned_block,
            indexer_window: self.indexer_window,
            verify_indexer: self.verify_indexer,
            initial_window: self.initial_window,
            scan_budget: self.scan_budget,
        }
    }
}

impl AnalysisConfigBuilder {
    /// Set every block discovery field from `options`.
    pub fn locate_options(&mut self, options: LocateOptions) -> &mut Self {
        self.pinned_block = Some(options.pinned_block);
        self.indexer_window = Some(options.indexer_window);
        self.verify_indexer = Some(options.verify_indexer);
        self.initial_window = Some(options.initial_window);
        self.scan_budget = Some(options.scan_budget);
        self
    }

    fn validate(&self) -> Result<(), AuditError> {
        if let Some(window) = self.initial_window {
            check_initial_window(window)?;
        }
        if let Some(budget) = self.scan_budget {
            check_scan_budget(budget)?;
        }
        Ok(())
    }
}

/// Settings for finding the distribution block and the block before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocateOptions {
    /// Block asserted to hold the distribution event. Disables every other lookup.
    pub pinned_block: Option<B256>,
    pub indexer_window: u64,
    /// Re-check the event log at blocks reported by the indexer.
    pub verify_indexer: bool,
    pub initial_window: u64,
    /// Wall-clock limit for the block-by-block scan.
    pub scan_budget: Option<Duration>,
}

impl Default for LocateOptions {
    fn default() -> Self {
        Self {
            pinned_block: None,
            indexer_window: DEFAULT_INDEXER_WINDOW,
            verify_indexer: false,
            initial_window: DEFAULT_INITIAL_WINDOW,
            scan_budget: None,
        }
    }
}

impl LocateOptions {
    pub fn validate(&self) -> Result<(), AuditError> {
        check_initial_window(self.initial_window)?;
        check_scan_budget(self.scan_budget)
    }
}

fn check_initial_window(window: u64) -> Result<(), AuditError> {
    if window == 0 {
        return Err(AuditError::Validation {
            field: "initial window",
            reason: "must be at least one block".into(),
        });
    }
    Ok(())
}

fn check_scan_budget(budget: Option<Duration>) -> Result<(), AuditError> {
    if budget.is_some_and(|budget| budget.is_zero()) {
        return Err(AuditError::Validation {
            field: "scan budget",
            reason: "must be greater than zero".into(),
        });
    }
    Ok(())
}

impl From<UninitializedFieldError> for AuditError {
    fn from(err: UninitializedFieldError) -> Self {
        AuditError::Validation { field: err.field_name(), reason: "must be provided".into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> AnalysisConfigBuilder {
        let mut builder = AnalysisConfig::builder();
        builder
            .period(42)
            .group("energyweb.smartflow".parse().unwrap())
            .address("5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY".parse().unwrap());
        builder
    }

    #[test]
    fn test_defaults() {
        let config = builder().build().unwrap();
        assert_eq!(config.indexer_window, DEFAULT_INDEXER_WINDOW);
        assert_eq!(config.initial_window, DEFAULT_INITIAL_WINDOW);
        assert!(config.pinned_block.is_none());
        assert!(config.scan_budget.is_none());
        assert!(!config.verify_indexer);
    }

    #[test]
    fn test_validation() {
        let err = builder().initial_window(0).build().unwrap_err();
        assert!(matches!(err, AuditError::Validation { field: "initial window", .. }));

        let err = builder().scan_budget(Duration::ZERO).build().unwrap_err();
        assert!(matches!(err, AuditError::Validation { field: "scan budget", .. }));

        let err = AnalysisConfig::builder().period(1).build().unwrap_err();
        assert!(matches!(err, AuditError::Validation { field: "group", .. }));
    }

    #[test]
    fn test_locate_options_round_trip() {
        let options = LocateOptions {
            pinned_block: Some(B256::repeat_byte(3)),
            indexer_window: 500,
            verify_indexer: true,
            initial_window: 20,
            scan_budget: Some(Duration::from_secs(30)),
        };
        let config = builder().locate_options(options).build().unwrap();
        assert_eq!(config.locate_options(), options);
        assert_eq!(builder().build().unwrap().locate_options(), LocateOptions::default());
    }

    #[test]
    fn test_locate_options_validation() {
        let options = LocateOptions { initial_window: 0, ..Default::default() };
        assert!(matches!(options.validate(), Err(AuditError::Validation { field: "initial window", .. })));
        assert!(builder().locate_options(options).build().is_err());

        let options = LocateOptions { scan_budget: Some(Duration::ZERO), ..Default::default() };
        assert!(matches!(options.validate(), Err(AuditError::Validation { field: "scan budget", .. })));
        assert!(LocateOptions::default().validate().is_ok());
    }
}
