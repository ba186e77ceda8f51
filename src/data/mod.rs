//! Typed in-memory tables for the five input CSVs. Everything here is
//! loaded once at startup and read-only afterwards; query code gets an
//! `Arc<Dataset>` and never mutates it.

mod load;
mod types;

pub use load::load_dataset;
pub use types::{FinancialRecord, HrRecord, RdRecord, SecurityRecord, SupplyRecord};

use std::collections::HashSet;

pub const FINANCIAL_CSV: &str = "financial_data.csv";
pub const HR_CSV: &str = "hr_analytics.csv";
pub const SUPPLY_CSV: &str = "supply_chain.csv";
pub const RD_CSV: &str = "rd_portfolio.csv";
pub const SECURITY_CSV: &str = "security_data.csv";

/// Rows of one CSV plus the set of headers that were actually present,
/// so handlers can report a missing optional column instead of crashing.
#[derive(Debug, Clone)]
pub struct Table<T> {
    pub rows: Vec<T>,
    columns: HashSet<String>,
}

impl<T> Table<T> {
    pub fn new(rows: Vec<T>, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            rows,
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    /// Names from `required` that the source CSV did not carry.
    pub fn missing_columns(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|name| !self.columns.contains(**name))
            .map(|name| name.to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The immutable data handle passed into every query function.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub financial: Table<FinancialRecord>,
    pub hr: Table<HrRecord>,
    pub supply: Table<SupplyRecord>,
    pub rd: Table<RdRecord>,
    pub security: Table<SecurityRecord>,
}
