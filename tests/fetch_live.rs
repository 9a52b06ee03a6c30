// Live tests (opt-in): cargo test --features online
#![cfg(feature = "online")]

use assert_cmd::prelude::*;
use medstat_rs::{QueryBuilder, scrape};
use std::process::Command;

#[test]
fn live_scrape_antidepressants() {
    let url = QueryBuilder::new(["N06A"])
        .years(["2022", "2023"])
        .generate_url()
        .expect("url");
    let table = scrape::scrape(&url).expect("scrape medstat.dk");
    assert!(!table.is_empty());
    assert!(table.rows.iter().any(|r| r.atc_code.starts_with("N06A")));
}

#[test]
fn live_cli_get_with_stats() {
    let mut cmd = Command::cargo_bin("medstat").unwrap();
    cmd.args(["get", "--atc", "N06A", "--years", "2023", "--stats", "--timeout", "60"]);
    cmd.assert().success();
}
