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

use alloy_primitives::{I256, U256};

/// Minor units per EWT.
pub const EWT_DECIMALS: u8 = 18;

/// Fractional digits shown by [format_ewt].
pub const DISPLAY_DECIMALS: u8 = 6;

/// Format a minor unit amount as EWT with six fractional digits, truncated.
pub fn format_ewt(amount: U256) -> String {
    let unit = U256::from(10u64).pow(U256::from(EWT_DECIMALS));
    let step = U256::from(10u64).pow(U256::from(EWT_DECIMALS - DISPLAY_DECIMALS));
    let whole = amount / unit;
    // Always below 10^6.
    let frac = (amount % unit) / step;
    format!("{whole}.{:06}", frac.to::<u64>())
}

/// Signed variant of [format_ewt].
pub fn format_signed_ewt(amount: I256) -> String {
    let formatted = format_ewt(amount.unsigned_abs());
    if amount.is_negative() {
        format!("-{formatted}")
    } else {
        formatted
    }
}
