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

//! Reward period boundary calculation.
//!
//! The chain only stores the active period, so the boundaries of a past period are computed by
//! walking back whole period lengths from the active one:
//! - `start(target) = current.first_block - (current.index - target) * current.length`
//! - `end(target) = start(target) + current.length - 1`

use crate::{error::AuditError, types::PeriodDescriptor};

/// Inclusive block range of a single reward period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodBounds {
    pub index: u64,
    pub start: u64,
    pub end: u64,
}

impl PeriodBounds {
    /// Number of blocks in the period.
    pub fn block_count(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn contains(&self, block: u64) -> bool {
        (self.start..=self.end).contains(&block)
    }
}

/// Get the block range of period `target` given the active period descriptor.
pub fn period_bounds(current: &PeriodDescriptor, target: u64) -> Result<PeriodBounds, AuditError> {
    if target > current.index {
        return Err(AuditError::FutureOrCurrentPeriod { target, current: current.index });
    }
    let geometry = |reason: String| AuditError::InvalidPeriodGeometry { target, reason };
    if current.length == 0 {
        return Err(geometry("period length is zero".into()));
    }

    let periods_back = current.index - target;
    let start = periods_back
        .checked_mul(current.length)
        .and_then(|offset| current.first_block.checked_sub(offset))
        .ok_or_else(|| {
            geometry(format!(
                "{periods_back} periods of {} blocks before block #{} is before genesis",
                current.length, current.first_block
            ))
        })?;
    let end = start
        .checked_add(current.length - 1)
        .ok_or_else(|| geometry(format!("end block overflows from start #{start}")))?;

    Ok(PeriodBounds { index: target, start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURRENT: PeriodDescriptor = PeriodDescriptor { index: 120, first_block: 864_000, length: 7_200 };

    #[test]
    fn test_current_period() {
        let bounds = period_bounds(&CURRENT, 120).unwrap();
        assert_eq!(bounds, PeriodBounds { index: 120, start: 864_000, end: 871_199 });
    }

    #[test]
    fn test_past_period() {
        let bounds = period_bounds(&CURRENT, 118).unwrap();
        assert_eq!(bounds.start, 864_000 - 2 * 7_200);
        assert_eq!(bounds.end, 864_000 - 7_200 - 1);
        assert!(bounds.contains(bounds.start));
        assert!(!bounds.contains(bounds.end + 1));
    }

    #[test]
    fn test_future_period_rejected() {
        let err = period_bounds(&CURRENT, 121).unwrap_err();
        assert!(matches!(err, AuditError::FutureOrCurrentPeriod { target: 121, current: 120 }));
    }

    #[test]
    fn test_length_is_preserved() {
        for target in 0..=CURRENT.index {
            let bounds = period_bounds(&CURRENT, target).unwrap();
            assert_eq!(bounds.end - bounds.start + 1, CURRENT.length);
            assert_eq!(bounds.block_count(), CURRENT.length);
        }
    }

    #[test]
    fn test_periods_are_monotonic() {
        for target in 1..=CURRENT.index {
            let earlier = period_bounds(&CURRENT, target - 1).unwrap();
            let later = period_bounds(&CURRENT, target).unwrap();
            assert!(earlier.end < later.start);
            assert_eq!(earlier.end + 1, later.start);
        }
    }

    #[test]
    fn test_invalid_geometry() {
        let zero_length = PeriodDescriptor { length: 0, ..CURRENT };
        assert!(matches!(
            period_bounds(&zero_length, 3),
            Err(AuditError::InvalidPeriodGeometry { target: 3, .. })
        ));

        // Period 0 would have to start before genesis.
        let short_history = PeriodDescriptor { index: 10, first_block: 100, length: 50 };
        assert!(matches!(
            period_bounds(&short_history, 0),
            Err(AuditError::InvalidPeriodGeometry { target: 0, .. })
        ));
        assert_eq!(period_bounds(&short_history, 8).unwrap().start, 0);
    }
}
