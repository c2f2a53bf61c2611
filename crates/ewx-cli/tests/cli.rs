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

use assert_cmd::Command;
use predicates::str::contains;

const ALICE: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";

fn cli() -> Command {
    let mut cmd = Command::cargo_bin("ewx-rewards").unwrap();
    cmd.env_remove("RPC_URL")
        .env_remove("EWX_NETWORK")
        .env_remove("BLOCK_HASH")
        .env_remove("INDEXER_URL");
    cmd
}

#[test]
fn test_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("analyze"))
        .stdout(contains("period-bounds"))
        .stdout(contains("check-subscription"))
        .stdout(contains("locate"));
}

#[test]
fn test_analyze_help_lists_discovery_options() {
    cli()
        .args(["analyze", "--help"])
        .assert()
        .success()
        .stdout(contains("--block-hash"))
        .stdout(contains("--indexer-url"))
        .stdout(contains("--scan-timeout"));
}

#[test]
fn test_empty_group_rejected() {
    cli()
        .args(["analyze", "12", "", ALICE])
        .assert()
        .failure()
        .stderr(contains("group namespace"));
}

#[test]
fn test_bad_address_rejected() {
    cli()
        .args(["analyze", "12", "energyweb.smartflow", "0xnotanaddress"])
        .assert()
        .failure()
        .stderr(contains("invalid address"));
}

#[test]
fn test_period_zero_rejected() {
    cli().args(["analyze", "0", "energyweb.smartflow", ALICE]).assert().failure();
}

#[test]
fn test_zero_initial_window_rejected() {
    cli()
        .args(["analyze", "12", "energyweb.smartflow", ALICE, "--initial-window", "0"])
        .assert()
        .failure();
}

#[test]
fn test_missing_rpc_url() {
    cli()
        .args(["analyze", "12", "energyweb.smartflow", ALICE])
        .assert()
        .failure()
        .stderr(contains("RPC URL not provided"));
}

#[test]
fn test_invalid_block_hash() {
    cli()
        .args(["locate", "12", "--block-hash", "0x1234"])
        .assert()
        .failure()
        .stderr(contains("--block-hash"));
}

#[test]
fn test_zero_scan_timeout_rejected() {
    cli()
        .args(["locate", "12", "--scan-timeout", "0"])
        .assert()
        .failure()
        .stderr(contains("invalid block discovery options"));
}
