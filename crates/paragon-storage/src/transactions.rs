//! Transaction import from CSV exports.
//!
//! Each line holds a date and an amount separated by `;`:
//!
//! ```text
//! 2025-12-01; 197,99
//! 2025-12-01; 45.50
//! ```
//!
//! The amount may use a decimal comma or point. Blank lines and lines
//! without exactly two fields are skipped silently; lines with an unreadable
//! date or amount are skipped with a warning.

use chrono::NaiveDate;
use paragon_core::{format_amount, to_minor_units};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One imported sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    pub date: NaiveDate,
    /// Amount in minor units.
    pub amount: i64,
}

/// Parse one CSV line.
///
/// `Ok(None)` for lines that are not transactions at all (blank, wrong field
/// count).
///
/// # Errors
/// `Parse` when the date or amount cannot be read.
pub fn parse_line(path: &Path, line_no: usize, line: &str) -> StorageResult<Option<Transaction>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split(';').map(str::trim).collect();
    let [date, amount] = fields.as_slice() else {
        return Ok(None);
    };

    let parse_error = |message: String| StorageError::Parse {
        path: path.to_path_buf(),
        line: line_no,
        message,
    };

    let date = NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|e| parse_error(format!("invalid date {date:?}: {e}")))?;

    let major: f64 = amount
        .replace(',', ".")
        .parse()
        .map_err(|e| parse_error(format!("invalid amount {amount:?}: {e}")))?;
    if !major.is_finite() {
        return Err(parse_error(format!("invalid amount {amount:?}")));
    }

    Ok(Some(Transaction {
        date,
        amount: to_minor_units(major),
    }))
}

/// Parse CSV `content` read from `path`, skipping bad lines.
pub fn parse_content(path: &Path, content: &str) -> Vec<Transaction> {
    content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| match parse_line(path, i + 1, line) {
            Ok(transaction) => transaction,
            Err(e) => {
                warn!(error = %e, "Skipping transaction line");
                None
            }
        })
        .collect()
}

/// Load one CSV file.
///
/// # Errors
/// `Io` if the file cannot be read.
pub fn load_file(path: impl AsRef<Path>) -> StorageResult<Vec<Transaction>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
    let transactions = parse_content(path, &content);
    debug!(path = %path.display(), count = transactions.len(), "CSV file parsed");
    Ok(transactions)
}

/// Load every `*.csv` file in `dir`, in file name order.
///
/// Unreadable files are skipped with a warning.
///
/// # Errors
/// `Io` if the directory cannot be listed, `NoTransactions` if it holds no
/// CSV files.
pub fn load_dir(dir: impl AsRef<Path>) -> StorageResult<Vec<Transaction>> {
    let dir = dir.as_ref();
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| StorageError::io(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();

    if files.is_empty() {
        return Err(StorageError::NoTransactions(dir.to_path_buf()));
    }
    files.sort();

    let mut transactions = Vec::new();
    for file in &files {
        match load_file(file) {
            Ok(parsed) => transactions.extend(parsed),
            Err(e) => warn!(error = %e, "Skipping CSV file"),
        }
    }

    info!(
        dir = %dir.display(),
        files = files.len(),
        count = transactions.len(),
        "Transactions loaded"
    );
    Ok(transactions)
}

/// Load a CSV file or a directory of CSV files.
pub fn load_path(path: impl AsRef<Path>) -> StorageResult<Vec<Transaction>> {
    let path = path.as_ref();
    if path.is_dir() {
        load_dir(path)
    } else {
        let transactions = load_file(path)?;
        info!(path = %path.display(), count = transactions.len(), "Transactions loaded");
        Ok(transactions)
    }
}

/// Group transactions by day, days in ascending order, file order kept
/// within a day.
pub fn group_by_date(transactions: &[Transaction]) -> BTreeMap<NaiveDate, Vec<Transaction>> {
    let mut grouped: BTreeMap<NaiveDate, Vec<Transaction>> = BTreeMap::new();
    for transaction in transactions {
        grouped.entry(transaction.date).or_default().push(*transaction);
    }
    grouped
}

/// Sum of amounts in minor units.
pub fn total_amount(transactions: &[Transaction]) -> i64 {
    transactions.iter().map(|t| t.amount).sum()
}

impl std::fmt::Display for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.date.format(DATE_FORMAT), format_amount(self.amount))
    }
}
