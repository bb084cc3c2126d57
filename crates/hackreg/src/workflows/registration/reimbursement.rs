use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use crate::config::DEFAULT_REIMBURSEMENT;

/// Country to travel-grant lookup.
pub trait ReimbursementLookup: Send + Sync {
    fn lookup(&self, country: &str) -> u32;
}

#[derive(Debug)]
pub enum ReimbursementTableError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for ReimbursementTableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReimbursementTableError::Io(err) => {
                write!(f, "failed to read reimbursement table: {}", err)
            }
            ReimbursementTableError::Csv(err) => {
                write!(f, "invalid reimbursement table data: {}", err)
            }
        }
    }
}

impl std::error::Error for ReimbursementTableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReimbursementTableError::Io(err) => Some(err),
            ReimbursementTableError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ReimbursementTableError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ReimbursementTableError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct ReimbursementRow {
    country: String,
    amount: u32,
}

/// Headerless `country,amount` table. A row matches when the queried country appears
/// inside its country column; the first matching row wins.
#[derive(Debug, Clone)]
pub struct ReimbursementTable {
    rows: Vec<ReimbursementRow>,
    default_amount: u32,
}

impl ReimbursementTable {
    pub fn empty() -> Self {
        Self {
            rows: Vec::new(),
            default_amount: DEFAULT_REIMBURSEMENT,
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ReimbursementTableError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReimbursementTableError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for record in csv_reader.deserialize::<ReimbursementRow>() {
            rows.push(record?);
        }

        Ok(Self {
            rows,
            default_amount: DEFAULT_REIMBURSEMENT,
        })
    }

    pub fn with_default(mut self, amount: u32) -> Self {
        self.default_amount = amount;
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Default for ReimbursementTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl ReimbursementLookup for ReimbursementTable {
    fn lookup(&self, country: &str) -> u32 {
        let country = country.trim();
        if country.is_empty() {
            return self.default_amount;
        }

        self.rows
            .iter()
            .find(|row| row.country.contains(country))
            .map(|row| row.amount)
            .unwrap_or(self.default_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const TABLE: &str = "Spain,50\nFrance / Portugal,80\nUnited Kingdom,120\n";

    #[test]
    fn finds_amount_for_listed_country() {
        let table = ReimbursementTable::from_reader(Cursor::new(TABLE)).expect("table parses");
        assert_eq!(table.len(), 3);
        assert_eq!(table.lookup("Spain"), 50);
        assert_eq!(table.lookup("Portugal"), 80);
    }

    #[test]
    fn falls_back_to_default_amount() {
        let table = ReimbursementTable::from_reader(Cursor::new(TABLE)).expect("table parses");
        assert_eq!(table.lookup("Japan"), DEFAULT_REIMBURSEMENT);
        assert_eq!(table.lookup("   "), DEFAULT_REIMBURSEMENT);
        assert_eq!(ReimbursementTable::empty().lookup("Spain"), 100);
        assert_eq!(ReimbursementTable::empty().with_default(70).lookup("Spain"), 70);
    }

    #[test]
    fn rejects_non_numeric_amounts() {
        let err = ReimbursementTable::from_reader(Cursor::new("Spain,fifty\n"))
            .expect_err("amount must be numeric");
        assert!(matches!(err, ReimbursementTableError::Csv(_)));
        assert!(err.to_string().contains("invalid reimbursement table data"));
    }
}
