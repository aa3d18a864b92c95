// 📊 Aggregation Engine - group-by sums over filtered records
// Keys are typed so month keys sort by month number, not by name.

use crate::record::{
    SalesRecord, COL_CATEGORY, COL_CITY, COL_REGION, COL_SEGMENT, COL_STATE, COL_SUB_CATEGORY,
};
use crate::series::{month_name, YearMonth};
use anyhow::{anyhow, Result};
use chrono::Datelike;
use rust_decimal::Decimal;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ============================================================================
// KEY FIELDS
// ============================================================================

/// Categorical fields a table can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyField {
    Region,
    State,
    City,
    Category,
    SubCategory,
    Segment,
    /// Month of year (January..December), all years folded together
    Month,
    /// Calendar month including the year
    Period,
}

impl KeyField {
    /// Column header used in exported tables
    pub fn column_name(&self) -> &'static str {
        match self {
            KeyField::Region => COL_REGION,
            KeyField::State => COL_STATE,
            KeyField::City => COL_CITY,
            KeyField::Category => COL_CATEGORY,
            KeyField::SubCategory => COL_SUB_CATEGORY,
            KeyField::Segment => COL_SEGMENT,
            KeyField::Month => "Month",
            KeyField::Period => "Period",
        }
    }

    /// Extract this field's grouping key from a record
    pub fn key_of(&self, record: &SalesRecord) -> GroupKey {
        match self {
            KeyField::Region => GroupKey::Text(record.region.clone()),
            KeyField::State => GroupKey::Text(record.state.clone()),
            KeyField::City => GroupKey::Text(record.city.clone()),
            KeyField::Category => GroupKey::Text(record.category.clone()),
            KeyField::SubCategory => GroupKey::Text(record.sub_category.clone()),
            KeyField::Segment => GroupKey::Text(record.segment.clone()),
            KeyField::Month => GroupKey::Month(record.order_date.month()),
            KeyField::Period => GroupKey::Period(record.period()),
        }
    }
}

impl fmt::Display for KeyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for KeyField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "region" => Ok(KeyField::Region),
            "state" => Ok(KeyField::State),
            "city" => Ok(KeyField::City),
            "category" => Ok(KeyField::Category),
            "sub_category" | "subcategory" => Ok(KeyField::SubCategory),
            "segment" => Ok(KeyField::Segment),
            "month" => Ok(KeyField::Month),
            "period" | "month_year" | "year_month" => Ok(KeyField::Period),
            _ => Err(anyhow!("Unknown key field: {}", s)),
        }
    }
}

/// One component of a group key.
///
/// All keys produced by the same `KeyField` share a variant, so the derived
/// ordering is alphabetical for text and chronological for months.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    Text(String),
    Month(u32),
    Period(YearMonth),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Text(s) => f.write_str(s),
            GroupKey::Month(m) => f.write_str(month_name(*m)),
            GroupKey::Period(p) => write!(f, "{}", p),
        }
    }
}

impl Serialize for GroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ============================================================================
// AGGREGATE TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateRow {
    pub key: Vec<GroupKey>,
    pub sales: Decimal,
    pub profit: Decimal,
    pub quantity: u64,
    pub count: usize,
}

impl AggregateRow {
    fn empty(key: Vec<GroupKey>) -> Self {
        AggregateRow {
            key,
            sales: Decimal::ZERO,
            profit: Decimal::ZERO,
            quantity: 0,
            count: 0,
        }
    }

    fn add(&mut self, record: &SalesRecord) {
        self.sales += record.sales;
        self.profit += record.profit;
        self.quantity += u64::from(record.quantity);
        self.count += 1;
    }
}

/// AggregateTable - one row per distinct key tuple, sorted by key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateTable {
    pub key_fields: Vec<KeyField>,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn total_sales(&self) -> Decimal {
        self.rows.iter().map(|r| r.sales).sum()
    }

    /// Row for a single-field key, looked up by its display text.
    pub fn get(&self, key: &str) -> Option<&AggregateRow> {
        self.rows
            .iter()
            .find(|row| row.key.len() == 1 && row.key[0].to_string() == key)
    }
}

/// Group `records` by the tuple of `key_fields` and sum the measures.
///
/// Only key tuples present in the input appear in the output. With no key
/// fields the result is a single grand-total row (or nothing for no records).
pub fn aggregate_by(records: &[SalesRecord], key_fields: &[KeyField]) -> AggregateTable {
    let mut groups: BTreeMap<Vec<GroupKey>, AggregateRow> = BTreeMap::new();

    for record in records {
        let key: Vec<GroupKey> = key_fields.iter().map(|f| f.key_of(record)).collect();
        groups
            .entry(key)
            .or_insert_with_key(|k| AggregateRow::empty(k.clone()))
            .add(record);
    }

    AggregateTable {
        key_fields: key_fields.to_vec(),
        rows: groups.into_values().collect(),
    }
}

pub fn by_category(records: &[SalesRecord]) -> AggregateTable {
    aggregate_by(records, &[KeyField::Category])
}

pub fn by_region(records: &[SalesRecord]) -> AggregateTable {
    aggregate_by(records, &[KeyField::Region])
}

pub fn by_segment(records: &[SalesRecord]) -> AggregateTable {
    aggregate_by(records, &[KeyField::Segment])
}

/// Region > Category > Sub-Category breakdown
pub fn by_hierarchy(records: &[SalesRecord]) -> AggregateTable {
    aggregate_by(
        records,
        &[KeyField::Region, KeyField::Category, KeyField::SubCategory],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_record, dec, sample_records};

    #[test]
    fn test_conservation_of_totals() {
        let records = sample_records();
        let total: Decimal = records.iter().map(|r| r.sales).sum();

        for field in [
            KeyField::Region,
            KeyField::State,
            KeyField::City,
            KeyField::Category,
            KeyField::SubCategory,
            KeyField::Segment,
            KeyField::Month,
            KeyField::Period,
        ] {
            let table = aggregate_by(&records, &[field]);
            assert_eq!(table.total_sales(), total, "totals differ for {}", field);
        }
    }

    #[test]
    fn test_each_key_once() {
        let table = by_category(&sample_records());
        let keys: Vec<String> = table.rows.iter().map(|r| r.key[0].to_string()).collect();
        assert_eq!(keys, vec!["Furniture", "Office Supplies", "Technology"]);
        assert_eq!(table.get("Furniture").unwrap().sales, dec("225.50"));
        assert_eq!(table.get("Furniture").unwrap().count, 3);
    }

    #[test]
    fn test_exact_decimal_sums() {
        let records: Vec<SalesRecord> = (0..10)
            .map(|_| create_test_record("2023-01-01", "East", "A", "a", "C", "S", "0.1"))
            .collect();
        let table = by_region(&records);
        assert_eq!(table.rows[0].sales, dec("1.0"));
    }

    #[test]
    fn test_measures_profit_and_quantity() {
        let mut records = sample_records();
        records[0].profit = dec("12.5");
        records[0].quantity = 3;
        records[5].profit = dec("-2.5");
        records[5].quantity = 4;

        let tech = by_category(&records);
        let row = tech.get("Technology").unwrap();
        assert_eq!(row.profit, dec("10.0"));
        assert_eq!(row.quantity, 7);
    }

    #[test]
    fn test_multi_key_grouping() {
        let table = aggregate_by(&sample_records(), &[KeyField::SubCategory, KeyField::Month]);
        let sales_of = |sub_category: &str, month: u32| {
            table
                .rows
                .iter()
                .find(|row| {
                    row.key
                        == vec![
                            GroupKey::Text(sub_category.to_string()),
                            GroupKey::Month(month),
                        ]
                })
                .map(|row| row.sales)
        };
        assert_eq!(sales_of("Chairs", 1), Some(dec("100.00")));
        assert_eq!(sales_of("Chairs", 2), Some(dec("75.50")));
        assert_eq!(sales_of("Phones", 12), Some(dec("200.00")));
        assert_eq!(sales_of("Phones", 1), None);
    }

    #[test]
    fn test_month_keys_sort_by_number() {
        let table = aggregate_by(&sample_records(), &[KeyField::Month]);
        let names: Vec<String> = table.rows.iter().map(|r| r.key[0].to_string()).collect();
        assert_eq!(names, vec!["January", "February", "March", "December"]);
    }

    #[test]
    fn test_hierarchy() {
        let table = by_hierarchy(&sample_records());
        assert_eq!(table.key_fields.len(), 3);
        assert_eq!(table.rows[0].key[0].to_string(), "East");
        assert_eq!(table.rows[0].key[1].to_string(), "Furniture");
    }

    #[test]
    fn test_empty_input_gives_empty_table() {
        let table = by_region(&[]);
        assert!(table.is_empty());
        assert_eq!(table.total_sales(), Decimal::ZERO);
        assert!(aggregate_by(&[], &[]).is_empty());
    }

    #[test]
    fn test_no_key_fields_is_grand_total() {
        let table = aggregate_by(&sample_records(), &[]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].count, 6);
    }

    #[test]
    fn test_key_field_from_str() {
        assert_eq!("Sub-Category".parse::<KeyField>().unwrap(), KeyField::SubCategory);
        assert_eq!("region".parse::<KeyField>().unwrap(), KeyField::Region);
        assert_eq!("month_year".parse::<KeyField>().unwrap(), KeyField::Period);
        assert!("profit".parse::<KeyField>().is_err());
    }
}
