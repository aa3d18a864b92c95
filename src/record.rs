// 🧾 Sales Records - one row of the sales dataset
// Raw CSV rows are kept as text until validated into typed records

use crate::error::LoadError;
use crate::series::YearMonth;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ============================================================================
// COLUMN NAMES
// ============================================================================

pub const COL_ORDER_DATE: &str = "Order Date";
pub const COL_REGION: &str = "Region";
pub const COL_STATE: &str = "State";
pub const COL_CITY: &str = "City";
pub const COL_CATEGORY: &str = "Category";
pub const COL_SUB_CATEGORY: &str = "Sub-Category";
pub const COL_SEGMENT: &str = "Segment";
pub const COL_SALES: &str = "Sales";
pub const COL_PROFIT: &str = "Profit";
pub const COL_QUANTITY: &str = "Quantity";

/// Columns every input file must carry. Anything else in the file is ignored.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    COL_ORDER_DATE,
    COL_REGION,
    COL_STATE,
    COL_CITY,
    COL_CATEGORY,
    COL_SUB_CATEGORY,
    COL_SEGMENT,
    COL_SALES,
    COL_PROFIT,
    COL_QUANTITY,
];

/// Date formats tried in order when no configuration overrides them.
pub const DEFAULT_DATE_FORMATS: [&str; 3] = ["%m/%d/%Y", "%Y-%m-%d", "%d-%m-%Y"];

/// Earliest year an order date may carry. chrono's `%Y` also accepts one to
/// three digit years, so "1/5/23" would otherwise load as year 23.
pub const MIN_ORDER_YEAR: i32 = 1000;

// ============================================================================
// RAW ROW
// ============================================================================

/// RawSalesRow - one CSV row before validation.
/// Everything is text so that a bad cell becomes a `LoadError` naming the
/// field instead of an opaque deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSalesRow {
    #[serde(rename = "Order Date")]
    pub order_date: String,

    #[serde(rename = "Region")]
    pub region: String,

    #[serde(rename = "State")]
    pub state: String,

    #[serde(rename = "City")]
    pub city: String,

    #[serde(rename = "Category")]
    pub category: String,

    #[serde(rename = "Sub-Category")]
    pub sub_category: String,

    #[serde(rename = "Segment")]
    pub segment: String,

    #[serde(rename = "Sales")]
    pub sales: String,

    #[serde(rename = "Profit")]
    pub profit: String,

    #[serde(rename = "Quantity")]
    pub quantity: String,
}

impl RawSalesRow {
    /// Validate this row into a `SalesRecord`.
    ///
    /// # Arguments
    /// * `row` - 1-based data row, used in error messages
    /// * `date_formats` - chrono formats tried in order for `Order Date`
    pub fn into_record<S: AsRef<str>>(
        self,
        row: usize,
        date_formats: &[S],
    ) -> Result<SalesRecord, LoadError> {
        let order_date = parse_order_date(&self.order_date, date_formats).ok_or_else(|| {
            LoadError::InvalidDate {
                row,
                value: self.order_date.clone(),
            }
        })?;

        let sales = parse_amount(&self.sales, row, COL_SALES)?;
        let profit = parse_amount(&self.profit, row, COL_PROFIT)?;
        let quantity = parse_quantity(&self.quantity, row)?;

        Ok(SalesRecord {
            order_date,
            region: required(self.region, row, COL_REGION)?,
            state: required(self.state, row, COL_STATE)?,
            city: required(self.city, row, COL_CITY)?,
            category: required(self.category, row, COL_CATEGORY)?,
            sub_category: required(self.sub_category, row, COL_SUB_CATEGORY)?,
            segment: required(self.segment, row, COL_SEGMENT)?,
            sales,
            profit,
            quantity,
        })
    }
}

// ============================================================================
// SALES RECORD
// ============================================================================

/// SalesRecord - one validated sales transaction.
/// Loaded once, never mutated; filters produce new vectors of clones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesRecord {
    pub order_date: NaiveDate,
    pub region: String,
    pub state: String,
    pub city: String,
    pub category: String,
    pub sub_category: String,
    pub segment: String,
    pub sales: Decimal,
    pub profit: Decimal,
    pub quantity: u32,
}

impl SalesRecord {
    /// Calendar month the order falls in.
    pub fn period(&self) -> YearMonth {
        YearMonth::from_date(self.order_date)
    }
}

// ============================================================================
// FIELD PARSERS
// ============================================================================

/// Parse an order date with the first matching format.
///
/// A trailing time component ("2016-11-08 00:00:00", "2016-11-08T10:00")
/// is dropped before the formats are tried again. Dates before
/// `MIN_ORDER_YEAR` never match, so short years are rejected.
pub fn parse_order_date<S: AsRef<str>>(value: &str, formats: &[S]) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let try_all = |text: &str| {
        formats
            .iter()
            .filter_map(|fmt| NaiveDate::parse_from_str(text, fmt.as_ref()).ok())
            .find(|date| date.year() >= MIN_ORDER_YEAR)
    };

    try_all(value).or_else(|| {
        let date_part = value.split(|c: char| c == ' ' || c == 'T').next()?;
        if date_part.len() == value.len() {
            return None;
        }
        try_all(date_part)
    })
}

fn parse_amount(value: &str, row: usize, field: &'static str) -> Result<Decimal, LoadError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LoadError::EmptyField { row, field });
    }

    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| LoadError::InvalidNumber {
            row,
            field,
            value: value.to_string(),
        })
}

fn parse_quantity(value: &str, row: usize) -> Result<u32, LoadError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LoadError::EmptyField {
            row,
            field: COL_QUANTITY,
        });
    }

    let parsed: i64 = trimmed.parse().map_err(|_| LoadError::InvalidNumber {
        row,
        field: COL_QUANTITY,
        value: value.to_string(),
    })?;

    if parsed <= 0 {
        return Err(LoadError::NonPositiveQuantity {
            row,
            value: value.to_string(),
        });
    }

    u32::try_from(parsed).map_err(|_| LoadError::InvalidNumber {
        row,
        field: COL_QUANTITY,
        value: value.to_string(),
    })
}

fn required(value: String, row: usize, field: &'static str) -> Result<String, LoadError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LoadError::EmptyField { row, field });
    }
    if trimmed.len() == value.len() {
        Ok(value)
    } else {
        Ok(trimmed.to_string())
    }
}
