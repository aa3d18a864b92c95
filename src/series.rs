// 📈 Monthly Series - sales per calendar month, in calendar order
//
// Periods sort by (year, month). Labels like "2023 : Jan" are produced only
// for display and are never used as a sort key, so December 2022 always
// precedes January 2023.

use crate::record::SalesRecord;
use chrono::{Datelike, Month, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// YEAR-MONTH PERIOD
// ============================================================================

/// A calendar month. Field order matters: the derived `Ord` is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Returns `None` when `month` is outside 1..=12.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(YearMonth { year, month })
        } else {
            None
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Display label, e.g. "2023 : Jan".
    pub fn label(&self) -> String {
        self.first_day().format("%Y : %b").to_string()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Full English name of a 1-based month number; "" when out of range.
pub fn month_name(month: u32) -> &'static str {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
        .unwrap_or("")
}

// ============================================================================
// MONTHLY SERIES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyPoint {
    pub period: YearMonth,
    pub label: String,
    pub sales: Decimal,
}

/// Total sales per month, ordered chronologically.
///
/// Months with no records are absent; an empty input gives an empty series.
pub fn monthly_series(records: &[SalesRecord]) -> Vec<MonthlyPoint> {
    let mut totals: BTreeMap<YearMonth, Decimal> = BTreeMap::new();

    for record in records {
        *totals.entry(record.period()).or_insert(Decimal::ZERO) += record.sales;
    }

    totals
        .into_iter()
        .map(|(period, sales)| MonthlyPoint {
            label: period.label(),
            period,
            sales,
        })
        .collect()
}
