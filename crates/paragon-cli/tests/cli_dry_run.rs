//! Runs the `paragon` binary end to end without a printer

use paragon_storage::Inventory;
use std::fs;
use std::process::Command;
use tempfile::TempDir;

fn paragon() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_paragon"));
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn test_create_config_then_dry_run() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    let data = dir.path().join("data.json");
    let csv = dir.path().join("sales.csv");

    let status = paragon()
        .arg("--create-config")
        .arg("--config")
        .arg(&config)
        .arg("--data")
        .arg(&data)
        .status()
        .unwrap();
    assert!(status.success());
    assert!(config.exists());

    let stock_before: u64 = Inventory::load(&data)
        .unwrap()
        .products
        .iter()
        .map(|p| u64::from(p.stock))
        .sum();

    fs::write(&csv, "2025-12-01; 197,99\n2025-12-01; 45,50\n2025-12-02; 320,00\n").unwrap();

    let status = paragon()
        .arg("--config")
        .arg(&config)
        .arg("--data")
        .arg(&data)
        .arg("--csv")
        .arg(&csv)
        .arg("--dry-run")
        .arg("--daily-report-mode")
        .arg("never")
        .arg("--seed")
        .arg("11")
        .status()
        .unwrap();
    assert!(status.success());

    let inventory = Inventory::load(&data).unwrap();
    let stock_after: u64 = inventory.products.iter().map(|p| u64::from(p.stock)).sum();
    let used: u64 = inventory.products.iter().map(|p| u64::from(p.used)).sum();
    assert!(stock_after < stock_before);
    assert_eq!(stock_before - stock_after, used);
}

#[test]
fn test_missing_csv_argument_fails() {
    let dir = TempDir::new().unwrap();
    let status = paragon()
        .arg("--config")
        .arg(dir.path().join("config.json"))
        .status()
        .unwrap();
    assert!(!status.success());
}

#[test]
fn test_dry_run_reports_need_valid_config() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, "{}").unwrap();

    let status = paragon()
        .arg("--config")
        .arg(&config)
        .arg("--daily-report")
        .arg("--dry-run")
        .status()
        .unwrap();
    assert!(!status.success());
}
