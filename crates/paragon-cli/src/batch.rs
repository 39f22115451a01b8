//! Batch printing of imported sales, one day at a time.

use chrono::NaiveDate;
use paragon_core::{Receipt, format_amount};
use paragon_fiscal::FiscalSession;
use paragon_network::FrameTransport;
use paragon_selector::{Catalog, ProductSelector};
use paragon_storage::Transaction;
use rand::Rng;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt};
use tracing::{error, info, warn};

use crate::args::DailyReportMode;

/// Pause between receipts so the printer can finish the previous one.
pub const RECEIPT_PAUSE: Duration = Duration::from_millis(500);

/// Pause after a daily report.
pub const REPORT_PAUSE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub report_mode: DailyReportMode,
    pub receipt_pause: Duration,
    pub report_pause: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            report_mode: DailyReportMode::Ask,
            receipt_pause: RECEIPT_PAUSE,
            report_pause: REPORT_PAUSE,
        }
    }
}

/// Outcome counters of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Receipts printed (or simulated in a dry run)
    pub printed: usize,
    /// Receipts or reports that failed
    pub failed: usize,
    /// Days processed
    pub days: usize,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Select products and print a receipt for every transaction.
///
/// Without a session nothing is sent (dry run) but selection and stock
/// bookkeeping run as usual. A failed receipt is counted and skipped; the
/// run always goes on with the next transaction.
///
/// `answers` feeds the daily report prompts of the whole run, so text typed
/// ahead for later days is kept.
pub async fn process_days<T, R, I>(
    mut session: Option<&mut FiscalSession<'_, T>>,
    selector: &mut ProductSelector<R>,
    catalog: &mut Catalog,
    days: &BTreeMap<NaiveDate, Vec<Transaction>>,
    options: &BatchOptions,
    answers: &mut I,
) -> RunSummary
where
    T: FrameTransport,
    R: Rng,
    I: AsyncBufRead + Unpin,
{
    let mut summary = RunSummary::default();

    for (date, transactions) in days {
        info!(%date, receipts = transactions.len(), "Processing day");

        for (i, transaction) in transactions.iter().enumerate() {
            let amount = format_amount(transaction.amount);

            let selection = match selector.select_products(catalog, transaction.amount) {
                Ok(selection) => selection,
                Err(e) => {
                    error!(%date, receipt = i + 1, %amount, error = %e, "Product selection failed");
                    summary.failed += 1;
                    continue;
                }
            };

            let receipt = Receipt::from_selection(&selection, None);
            for line in &receipt.lines {
                info!(name = %line.name, price = %format_amount(line.price), "Receipt line");
            }

            if let Some(session) = session.as_deref_mut() {
                if let Err(e) = session.print_receipt(&receipt).await {
                    error!(%date, receipt = i + 1, %amount, error = %e, "Receipt printing failed");
                    session.abandon_transaction();
                    summary.failed += 1;
                    continue;
                }
            }

            if let Err(e) = catalog.commit(&selection) {
                warn!(error = %e, "Stock update failed after printing");
            }

            summary.printed += 1;
            info!(
                %date,
                receipt = %format!("{}/{}", i + 1, transactions.len()),
                %amount,
                "Receipt done"
            );

            if session.is_some() {
                tokio::time::sleep(options.receipt_pause).await;
            }
        }

        summary.days += 1;

        match session.as_deref_mut() {
            Some(session) => {
                if daily_report_wanted(options.report_mode, *date, answers).await {
                    info!("Printing daily report");
                    match session.daily_report(None).await {
                        Ok(()) => info!("Daily report printed"),
                        Err(e) => {
                            error!(error = %e, "Daily report failed");
                            summary.failed += 1;
                        }
                    }
                    tokio::time::sleep(options.report_pause).await;
                } else {
                    info!(%date, "Daily report skipped");
                }
            }
            None => info!(%date, "Dry run, daily report not printed"),
        }
    }

    summary
}

async fn daily_report_wanted<I>(mode: DailyReportMode, date: NaiveDate, answers: &mut I) -> bool
where
    I: AsyncBufRead + Unpin,
{
    match mode {
        DailyReportMode::Always => true,
        DailyReportMode::Never => false,
        DailyReportMode::Ask => match ask_yes_no(&format!("Print daily report for {date}? [y/N]: "), answers).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "Could not read answer, skipping daily report");
                false
            }
        },
    }
}

async fn ask_yes_no<I>(prompt: &str, answers: &mut I) -> std::io::Result<bool>
where
    I: AsyncBufRead + Unpin,
{
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;

    let mut line = String::new();
    answers.read_line(&mut line).await?;
    Ok(is_yes(&line))
}

fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "t" | "tak"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use paragon_core::Product;
    use paragon_fiscal::FiscalSettings;
    use paragon_network::TransportError;
    use paragon_selector::SelectorSettings;
    use rand::{SeedableRng, rngs::StdRng};
    use rstest::rstest;
    use tokio::time::Instant;

    /// Acknowledges everything, except one chosen request.
    struct AckTransport {
        sent: Vec<String>,
        fail_on: Option<usize>,
        pending: Option<Bytes>,
    }

    impl AckTransport {
        fn new(fail_on: Option<usize>) -> Self {
            Self {
                sent: Vec::new(),
                fail_on,
                pending: None,
            }
        }
    }

    impl FrameTransport for AckTransport {
        async fn send(&mut self, payload: &[u8]) -> Result<(), TransportError> {
            let answer = if self.fail_on == Some(self.sent.len()) {
                Bytes::from_static(b"ERR")
            } else {
                Bytes::new()
            };
            self.sent.push(String::from_utf8_lossy(payload).into_owned());
            self.pending = Some(answer);
            Ok(())
        }

        async fn receive(&mut self, _deadline: Option<Instant>) -> Result<Bytes, TransportError> {
            self.pending.take().ok_or(TransportError::ReadTimeout(0))
        }
    }

    fn day(date: &str, amounts: &[i64]) -> (NaiveDate, Vec<Transaction>) {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap();
        let transactions = amounts
            .iter()
            .map(|&amount| Transaction { date, amount })
            .collect();
        (date, transactions)
    }

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Product::new("Bluzka", 10.0, 60.0, 50),
            Product::new("Guzik", 0.5, 3.0, 50),
        ])
    }

    fn selector() -> ProductSelector<StdRng> {
        ProductSelector::new(
            SelectorSettings {
                shipping_chance: 0,
                shipping_price: 1999,
            },
            StdRng::seed_from_u64(3),
        )
    }

    fn options(report_mode: DailyReportMode) -> BatchOptions {
        BatchOptions {
            report_mode,
            receipt_pause: Duration::ZERO,
            report_pause: Duration::ZERO,
        }
    }

    #[rstest]
    #[case("y", true)]
    #[case("TAK\n", true)]
    #[case(" t ", true)]
    #[case("yes", true)]
    #[case("", false)]
    #[case("n", false)]
    #[case("nope", false)]
    fn test_is_yes(#[case] answer: &str, #[case] expected: bool) {
        assert_eq!(is_yes(answer), expected);
    }

    #[tokio::test]
    async fn test_dry_run_commits_stock() {
        let days = BTreeMap::from([day("2025-12-01", &[1999, 2500]), day("2025-12-02", &[999])]);
        let mut catalog = catalog();
        let before = catalog.total_stock();

        let summary = process_days::<AckTransport, _, _>(
            None,
            &mut selector(),
            &mut catalog,
            &days,
            &options(DailyReportMode::Always),
            &mut tokio::io::empty(),
        )
        .await;

        assert_eq!(
            summary,
            RunSummary {
                printed: 3,
                failed: 0,
                days: 2
            }
        );
        assert!(catalog.total_stock() < before);
    }

    #[tokio::test]
    async fn test_prints_receipts_and_daily_reports() {
        let days = BTreeMap::from([day("2025-12-01", &[1999]), day("2025-12-02", &[4000])]);
        let mut transport = AckTransport::new(None);
        let mut catalog = catalog();

        let summary = {
            let mut session = FiscalSession::new(&mut transport, FiscalSettings::default());
            process_days(
                Some(&mut session),
                &mut selector(),
                &mut catalog,
                &days,
                &options(DailyReportMode::Always),
                &mut tokio::io::empty(),
            )
            .await
        };

        assert!(summary.is_success());
        assert_eq!(summary.printed, 2);
        let reports = transport.sent.iter().filter(|p| p.starts_with("dailyrep")).count();
        assert_eq!(reports, 2);
        assert_eq!(transport.sent.first().map(String::as_str), Some("trinit\tbm0\t"));
        assert_eq!(transport.sent.last().map(String::as_str), Some("dailyrep\t"));
    }

    #[tokio::test]
    async fn test_failed_receipt_keeps_stock_and_continues() {
        let days = BTreeMap::from([day("2025-12-01", &[1999, 2999])]);
        // Request 0 is the first trinit.
        let mut transport = AckTransport::new(Some(0));
        let mut catalog = catalog();
        let before = catalog.total_stock();

        let summary = {
            let mut session = FiscalSession::new(&mut transport, FiscalSettings::default());
            process_days(
                Some(&mut session),
                &mut selector(),
                &mut catalog,
                &days,
                &options(DailyReportMode::Never),
                &mut tokio::io::empty(),
            )
            .await
        };

        assert_eq!(
            summary,
            RunSummary {
                printed: 1,
                failed: 1,
                days: 1
            }
        );
        assert!(!summary.is_success());
        assert!(catalog.total_stock() < before);
        assert!(transport.sent.iter().all(|p| !p.starts_with("dailyrep")));
        assert_eq!(transport.sent.iter().filter(|p| p.starts_with("trinit")).count(), 2);
    }

    #[tokio::test]
    async fn test_selection_failure_is_counted() {
        let days = BTreeMap::from([day("2025-12-01", &[10])]);
        let mut catalog = Catalog::new(vec![Product::new("Bluzka", 10.0, 60.0, 5)]);

        let summary = process_days::<AckTransport, _, _>(
            None,
            &mut selector(),
            &mut catalog,
            &days,
            &options(DailyReportMode::Never),
            &mut tokio::io::empty(),
        )
        .await;

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.printed, 0);
        assert_eq!(catalog.total_stock(), 5);
    }

    #[tokio::test]
    async fn test_typed_ahead_answers_reach_later_days() {
        let days = BTreeMap::from([
            day("2025-12-01", &[1999]),
            day("2025-12-02", &[2500]),
            day("2025-12-03", &[999]),
        ]);
        let mut transport = AckTransport::new(None);
        let mut catalog = catalog();
        let mut answers: &[u8] = b"n\ntak\ny\n";

        let summary = {
            let mut session = FiscalSession::new(&mut transport, FiscalSettings::default());
            process_days(
                Some(&mut session),
                &mut selector(),
                &mut catalog,
                &days,
                &options(DailyReportMode::Ask),
                &mut answers,
            )
            .await
        };

        assert!(summary.is_success());
        assert!(answers.is_empty());
        let sent = &transport.sent;
        let reports: Vec<usize> = sent
            .iter()
            .enumerate()
            .filter(|(_, p)| p.starts_with("dailyrep"))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(reports.len(), 2);
        // Day one was declined, so no report precedes the second receipt.
        let second_receipt = sent
            .iter()
            .enumerate()
            .filter(|(_, p)| p.starts_with("trinit"))
            .nth(1)
            .map(|(i, _)| i)
            .unwrap();
        assert!(reports.iter().all(|&i| i > second_receipt));
    }
}
