use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Print fiscal receipts for imported sales on a networked fiscal printer.
#[derive(Parser, Debug)]
#[command(name = "paragon", version)]
pub struct Cli {
    /// Configuration file
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,

    /// Stock file with the product catalog
    #[arg(long, default_value = "data.json")]
    pub data: PathBuf,

    /// CSV file, or directory of CSV files, with the sales to print
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Write sample configuration and stock files, then exit
    #[arg(long)]
    pub create_config: bool,

    /// Do everything except talking to the printer
    #[arg(long)]
    pub dry_run: bool,

    /// Print the daily report and exit
    #[arg(long)]
    pub daily_report: bool,

    /// Print the monthly report and exit; DATE selects the month
    #[arg(long, value_name = "DATE", num_args = 0..=1, default_missing_value = "")]
    pub monthly_report: Option<String>,

    /// Print the summary variant of the monthly report
    #[arg(long)]
    pub monthly_report_summary: bool,

    /// When to print a daily report after each day of receipts
    #[arg(long, value_enum, default_value_t = DailyReportMode::Ask)]
    pub daily_report_mode: DailyReportMode,

    /// Seed for product selection, for reproducible receipts
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Cli {
    /// Report-only invocation.
    pub fn wants_reports(&self) -> bool {
        self.daily_report || self.monthly_report.is_some()
    }
}

/// Daily report policy for the batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DailyReportMode {
    /// Ask on the terminal after each day
    Ask,
    /// Print after each day without asking
    Always,
    /// Never print
    Never,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["paragon", "--csv", "reports"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert_eq!(cli.data, PathBuf::from("data.json"));
        assert_eq!(cli.csv, Some(PathBuf::from("reports")));
        assert_eq!(cli.daily_report_mode, DailyReportMode::Ask);
        assert!(!cli.dry_run);
        assert!(!cli.wants_reports());
    }

    #[test]
    fn test_monthly_report_without_date() {
        let cli = Cli::try_parse_from(["paragon", "--monthly-report"]).unwrap();
        assert_eq!(cli.monthly_report.as_deref(), Some(""));
        assert!(cli.wants_reports());
    }

    #[test]
    fn test_monthly_report_with_date() {
        let cli = Cli::try_parse_from([
            "paragon",
            "--monthly-report",
            "2025-02-01",
            "--monthly-report-summary",
        ])
        .unwrap();
        assert_eq!(cli.monthly_report.as_deref(), Some("2025-02-01"));
        assert!(cli.monthly_report_summary);
    }

    #[test]
    fn test_report_mode_and_seed() {
        let cli = Cli::try_parse_from([
            "paragon",
            "--csv",
            "a.csv",
            "--daily-report-mode",
            "never",
            "--seed",
            "42",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(cli.daily_report_mode, DailyReportMode::Never);
        assert_eq!(cli.seed, Some(42));
        assert!(cli.dry_run);
    }

    #[test]
    fn test_unknown_report_mode_rejected() {
        assert!(Cli::try_parse_from(["paragon", "--daily-report-mode", "sometimes"]).is_err());
    }
}
