//! `paragon` command line driver.
//!
//! Modes, checked in this order:
//!
//! 1. `--create-config`: write sample `config.json` and `data.json`
//! 2. `--daily-report` / `--monthly-report`: print reports and exit
//! 3. `--csv`: print one receipt per imported sale

mod args;
mod batch;
mod setup;

use anyhow::{Context, Result, bail};
use clap::Parser;
use paragon_fiscal::FiscalSession;
use paragon_network::PrinterClient;
use paragon_selector::ProductSelector;
use paragon_storage::{Config, Inventory, group_by_date, load_path, transactions::total_amount};
use std::path::Path;
use std::process::ExitCode;
use tokio::io::BufReader;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::args::Cli;
use crate::batch::{BatchOptions, RunSummary, process_days};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging();

    info!(version = paragon_core::VERSION, "paragon starting");

    if cli.create_config {
        create_config(&cli.config, &cli.data)?;
        return Ok(ExitCode::SUCCESS);
    }

    if cli.wants_reports() {
        print_reports(&cli).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(csv) = cli.csv.as_deref() else {
        bail!("--csv is required (or use --create-config, --daily-report, --monthly-report)");
    };

    let summary = run_batch(&cli, csv).await?;
    if summary.is_success() {
        info!("Finished successfully");
        Ok(ExitCode::SUCCESS)
    } else {
        warn!(failed = summary.failed, "Finished with errors");
        Ok(ExitCode::FAILURE)
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn create_config(config_path: &Path, data_path: &Path) -> Result<()> {
    Config::example()
        .save(config_path)
        .context("writing sample configuration")?;
    info!(path = %config_path.display(), "Sample configuration written");

    Inventory::example()
        .save(data_path)
        .context("writing sample stock file")?;
    info!(path = %data_path.display(), "Sample stock file written");

    info!("Edit both files before the first run");
    Ok(())
}

async fn connect(config: &Config) -> Result<PrinterClient> {
    info!(address = %config.printer_address(), "Connecting to printer");
    let client = PrinterClient::open(setup::client_config(config))
        .await
        .with_context(|| format!("connecting to printer at {}", config.printer_address()))?;
    info!("Connected to printer");
    Ok(client)
}

async fn print_reports(cli: &Cli) -> Result<()> {
    let config = Config::load(&cli.config).context("loading configuration")?;
    let monthly_date = cli.monthly_report.as_deref().filter(|d| !d.is_empty());

    if cli.dry_run {
        if cli.daily_report {
            info!("Dry run, daily report not printed");
        }
        if cli.monthly_report.is_some() {
            info!(date = ?monthly_date, summary = cli.monthly_report_summary, "Dry run, monthly report not printed");
        }
        return Ok(());
    }

    let mut client = connect(&config).await?;
    {
        let mut session = FiscalSession::new(&mut client, setup::fiscal_settings(&config)?);

        if cli.daily_report {
            session.daily_report(None).await.context("daily report")?;
            info!("Daily report printed");
        }

        if cli.monthly_report.is_some() {
            session
                .monthly_report(monthly_date, cli.monthly_report_summary)
                .await
                .context("monthly report")?;
            info!("Monthly report printed");
        }
    }

    if let Err(e) = client.close().await {
        warn!(error = %e, "Closing printer connection failed");
    }
    Ok(())
}

async fn run_batch(cli: &Cli, csv: &Path) -> Result<RunSummary> {
    let config = Config::load(&cli.config).context("loading configuration")?;
    let mut catalog = Inventory::load(&cli.data)
        .context("loading stock file")?
        .into_catalog();

    let transactions = load_path(csv).context("loading transactions")?;
    if transactions.is_empty() {
        bail!("no transactions found in {}", csv.display());
    }
    let days = group_by_date(&transactions);
    info!(
        transactions = transactions.len(),
        days = days.len(),
        total = %paragon_core::format_amount(total_amount(&transactions)),
        "Transactions loaded"
    );

    let mut selector = ProductSelector::new(setup::selector_settings(&config), setup::rng(cli.seed));
    let options = BatchOptions {
        report_mode: cli.daily_report_mode,
        ..BatchOptions::default()
    };

    let mut answers = BufReader::new(tokio::io::stdin());

    let summary = if cli.dry_run {
        warn!("Dry run, nothing will be sent to the printer");
        process_days::<PrinterClient, _, _>(None, &mut selector, &mut catalog, &days, &options, &mut answers)
            .await
    } else {
        let mut client = connect(&config).await?;
        let summary = {
            let mut session = FiscalSession::new(&mut client, setup::fiscal_settings(&config)?);
            process_days(
                Some(&mut session),
                &mut selector,
                &mut catalog,
                &days,
                &options,
                &mut answers,
            )
            .await
        };
        if let Err(e) = client.close().await {
            warn!(error = %e, "Closing printer connection failed");
        }
        summary
    };

    for product in catalog.products() {
        if product.in_stock() {
            info!(product = %product.name, stock = product.stock, used = product.used, "Stock");
        } else {
            warn!(product = %product.name, used = product.used, "Out of stock");
        }
    }

    match Inventory::from(catalog).save(&cli.data) {
        Ok(()) => info!(path = %cli.data.display(), "Stock saved"),
        Err(e) => {
            error!(error = %e, "Saving stock failed");
        }
    }

    info!(
        printed = summary.printed,
        failed = summary.failed,
        days = summary.days,
        "Summary"
    );
    Ok(summary)
}
