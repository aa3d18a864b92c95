// 🧮 Pivot Table - cross-tabulation of one measure over two keys
//
// Cells with no contributing records are `None`, never zero: a zero cell
// means records exist and their values cancel out.

use crate::aggregate::{GroupKey, KeyField};
use crate::record::{SalesRecord, COL_PROFIT, COL_QUANTITY, COL_SALES};
use anyhow::{anyhow, Result};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

// ============================================================================
// MEASURES
// ============================================================================

/// Numeric field summarised in a pivot cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    Sales,
    Profit,
    Quantity,
}

impl Measure {
    pub fn column_name(&self) -> &'static str {
        match self {
            Measure::Sales => COL_SALES,
            Measure::Profit => COL_PROFIT,
            Measure::Quantity => COL_QUANTITY,
        }
    }

    pub fn value_of(&self, record: &SalesRecord) -> Decimal {
        match self {
            Measure::Sales => record.sales,
            Measure::Profit => record.profit,
            Measure::Quantity => Decimal::from(record.quantity),
        }
    }
}

impl FromStr for Measure {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sales" => Ok(Measure::Sales),
            "profit" => Ok(Measure::Profit),
            "quantity" => Ok(Measure::Quantity),
            _ => Err(anyhow!("Unknown measure: {}", s)),
        }
    }
}

/// How contributing values are combined into one cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotAgg {
    #[default]
    Sum,
    Mean,
}

impl FromStr for PivotAgg {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sum" => Ok(PivotAgg::Sum),
            "mean" | "avg" | "average" => Ok(PivotAgg::Mean),
            _ => Err(anyhow!("Unknown pivot aggregation: {}", s)),
        }
    }
}

// ============================================================================
// PIVOT TABLE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotRow {
    pub key: GroupKey,
    /// One cell per entry of `PivotTable::columns`
    pub cells: Vec<Option<Decimal>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PivotTable {
    pub row_field: KeyField,
    pub column_field: KeyField,
    pub measure: Measure,
    pub agg: PivotAgg,
    pub columns: Vec<GroupKey>,
    pub rows: Vec<PivotRow>,
}

impl PivotTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell addressed by the display text of its row and column keys.
    /// `None` both for unknown keys and for empty combinations.
    pub fn cell(&self, row: &str, column: &str) -> Option<Decimal> {
        let col_idx = self.columns.iter().position(|c| c.to_string() == column)?;
        self.rows
            .iter()
            .find(|r| r.key.to_string() == row)
            .and_then(|r| r.cells[col_idx])
    }
}

/// Sum of `measure` for every (row_key, column_key) combination.
pub fn pivot(
    records: &[SalesRecord],
    row_key: KeyField,
    column_key: KeyField,
    measure: Measure,
) -> PivotTable {
    pivot_with(records, row_key, column_key, measure, PivotAgg::Sum)
}

/// Like [`pivot`] with an explicit cell aggregation.
pub fn pivot_with(
    records: &[SalesRecord],
    row_key: KeyField,
    column_key: KeyField,
    measure: Measure,
    agg: PivotAgg,
) -> PivotTable {
    let mut columns: BTreeSet<GroupKey> = BTreeSet::new();
    let mut cells: BTreeMap<GroupKey, BTreeMap<GroupKey, (Decimal, u32)>> = BTreeMap::new();

    for record in records {
        let row = row_key.key_of(record);
        let col = column_key.key_of(record);
        columns.insert(col.clone());

        let cell = cells
            .entry(row)
            .or_default()
            .entry(col)
            .or_insert((Decimal::ZERO, 0));
        cell.0 += measure.value_of(record);
        cell.1 += 1;
    }

    let columns: Vec<GroupKey> = columns.into_iter().collect();
    let rows = cells
        .into_iter()
        .map(|(key, by_col)| PivotRow {
            key,
            cells: columns
                .iter()
                .map(|c| {
                    by_col.get(c).map(|(total, n)| match agg {
                        PivotAgg::Sum => *total,
                        PivotAgg::Mean => *total / Decimal::from(*n),
                    })
                })
                .collect(),
        })
        .collect();

    PivotTable {
        row_field: row_key,
        column_field: column_key,
        measure,
        agg,
        columns,
        rows,
    }
}

/// Sub-Category x month-of-year sales pivot
pub fn sub_category_by_month(records: &[SalesRecord]) -> PivotTable {
    pivot(records, KeyField::SubCategory, KeyField::Month, Measure::Sales)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{create_test_record, dec, sample_records};

    #[test]
    fn test_missing_combination_is_none() {
        let table = sub_category_by_month(&sample_records());

        let columns: Vec<String> = table.columns.iter().map(|c| c.to_string()).collect();
        assert_eq!(columns, vec!["January", "February", "March", "December"]);

        assert_eq!(table.cell("Chairs", "January"), Some(dec("100.00")));
        assert_eq!(table.cell("Chairs", "February"), Some(dec("75.50")));
        assert_eq!(table.cell("Chairs", "March"), None);
        assert_eq!(table.cell("Paper", "December"), None);
    }

    #[test]
    fn test_zero_net_is_not_none() {
        let mut records = vec![
            create_test_record("2023-01-01", "East", "A", "a", "C", "Binders", "0"),
            create_test_record("2023-01-02", "East", "A", "a", "C", "Binders", "0"),
        ];
        records[0].profit = dec("5");
        records[1].profit = dec("-5");

        let table = pivot(&records, KeyField::SubCategory, KeyField::Month, Measure::Profit);
        assert_eq!(table.cell("Binders", "January"), Some(Decimal::ZERO));
    }

    #[test]
    fn test_rows_sorted_and_complete() {
        let table = sub_category_by_month(&sample_records());
        let rows: Vec<String> = table.rows.iter().map(|r| r.key.to_string()).collect();
        assert_eq!(rows, vec!["Chairs", "Paper", "Phones", "Tables"]);
        for row in &table.rows {
            assert_eq!(row.cells.len(), table.columns.len());
        }
    }

    #[test]
    fn test_mean_aggregation() {
        let records = vec![
            create_test_record("2023-01-01", "East", "A", "a", "C", "Paper", "10"),
            create_test_record("2023-01-09", "East", "A", "a", "C", "Paper", "20"),
        ];
        let table = pivot_with(
            &records,
            KeyField::SubCategory,
            KeyField::Month,
            Measure::Sales,
            PivotAgg::Mean,
        );
        assert_eq!(table.cell("Paper", "January"), Some(dec("15")));
    }

    #[test]
    fn test_quantity_measure() {
        let mut records = sample_records();
        records[1].quantity = 4;
        let table = pivot(&records, KeyField::Region, KeyField::Category, Measure::Quantity);
        assert_eq!(table.cell("East", "Furniture"), Some(dec("5")));
    }

    #[test]
    fn test_empty_pivot() {
        let table = sub_category_by_month(&[]);
        assert!(table.is_empty());
        assert!(table.columns.is_empty());
    }

    #[test]
    fn test_parse_measure_and_agg() {
        assert_eq!("Sales".parse::<Measure>().unwrap(), Measure::Sales);
        assert_eq!("avg".parse::<PivotAgg>().unwrap(), PivotAgg::Mean);
        assert!("median".parse::<PivotAgg>().is_err());
    }
}
