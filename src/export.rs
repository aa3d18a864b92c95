// 💾 CSV Export - any output table → UTF-8 comma separated text
//
// Every table is written with a header row and no index column. Decimal
// values are written with their full precision so re-reading them gives
// back the same numbers.

use crate::aggregate::AggregateTable;
use crate::dashboard::{Dashboard, PreviewRow};
use crate::pivot::PivotTable;
use crate::record::{
    SalesRecord, COL_CATEGORY, COL_CITY, COL_PROFIT, COL_QUANTITY, COL_REGION, COL_SALES,
    COL_STATE, REQUIRED_COLUMNS,
};
use crate::series::MonthlyPoint;
use anyhow::{anyhow, Context, Result};
use rust_decimal::Decimal;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

// ============================================================================
// TABULAR TRAIT
// ============================================================================

/// Tabular - anything that can be laid out as header + string rows.
pub trait Tabular {
    fn headers(&self) -> Vec<String>;
    fn rows(&self) -> Vec<Vec<String>>;
}

impl Tabular for AggregateTable {
    fn headers(&self) -> Vec<String> {
        self.key_fields
            .iter()
            .map(|f| f.column_name().to_string())
            .chain(
                [COL_SALES, COL_PROFIT, COL_QUANTITY, "Count"]
                    .into_iter()
                    .map(String::from),
            )
            .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut cells: Vec<String> = row.key.iter().map(|k| k.to_string()).collect();
                cells.push(row.sales.to_string());
                cells.push(row.profit.to_string());
                cells.push(row.quantity.to_string());
                cells.push(row.count.to_string());
                cells
            })
            .collect()
    }
}

impl Tabular for [MonthlyPoint] {
    fn headers(&self) -> Vec<String> {
        vec!["Period".to_string(), "month_year".to_string(), COL_SALES.to_string()]
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.iter()
            .map(|p| vec![p.period.to_string(), p.label.clone(), p.sales.to_string()])
            .collect()
    }
}

impl Tabular for PivotTable {
    fn headers(&self) -> Vec<String> {
        std::iter::once(self.row_field.column_name().to_string())
            .chain(self.columns.iter().map(|c| c.to_string()))
            .collect()
    }

    /// Empty combinations are written as empty cells, not "0".
    fn rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                std::iter::once(row.key.to_string())
                    .chain(
                        row.cells
                            .iter()
                            .map(|c| c.map(|v| v.to_string()).unwrap_or_default()),
                    )
                    .collect()
            })
            .collect()
    }
}

impl Tabular for [SalesRecord] {
    fn headers(&self) -> Vec<String> {
        REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.iter()
            .map(|r| {
                vec![
                    r.order_date.format("%Y-%m-%d").to_string(),
                    r.region.clone(),
                    r.state.clone(),
                    r.city.clone(),
                    r.category.clone(),
                    r.sub_category.clone(),
                    r.segment.clone(),
                    r.sales.to_string(),
                    r.profit.to_string(),
                    r.quantity.to_string(),
                ]
            })
            .collect()
    }
}

impl Tabular for [PreviewRow] {
    fn headers(&self) -> Vec<String> {
        [
            COL_REGION,
            COL_STATE,
            COL_CITY,
            COL_CATEGORY,
            COL_SALES,
            COL_PROFIT,
            COL_QUANTITY,
        ]
        .iter()
        .map(|c| c.to_string())
        .collect()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.iter()
            .map(|r| {
                vec![
                    r.region.clone(),
                    r.state.clone(),
                    r.city.clone(),
                    r.category.clone(),
                    r.sales.to_string(),
                    r.profit.to_string(),
                    r.quantity.to_string(),
                ]
            })
            .collect()
    }
}

// ============================================================================
// WRITING
// ============================================================================

/// Serialize a table to UTF-8 CSV bytes.
pub fn to_csv_bytes<T: Tabular + ?Sized>(table: &T) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(table.headers())
        .context("Failed to write CSV header")?;
    for row in table.rows() {
        wtr.write_record(&row).context("Failed to write CSV row")?;
    }
    wtr.into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV buffer: {}", e))
}

/// Write a table to `path` as CSV.
pub fn write_csv<T: Tabular + ?Sized>(path: &Path, table: &T) -> Result<()> {
    let bytes = to_csv_bytes(table)?;
    fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))
}

/// File names of the standard exports.
pub const CATEGORY_FILE: &str = "Category.csv";
pub const REGION_FILE: &str = "Region.csv";
pub const TIME_SERIES_FILE: &str = "TimeSeries.csv";
pub const PIVOT_FILE: &str = "SubCategoryMonth.csv";
pub const DATA_FILE: &str = "Data.csv";

/// Write every standard export for a dashboard into `dir`, creating it if needed.
/// Returns the written paths in a stable order.
pub fn export_dashboard(dashboard: &Dashboard, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;

    let mut written = Vec::new();
    let mut emit = |name: &str, bytes: Vec<u8>| -> Result<()> {
        let path = dir.join(name);
        fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
        Ok(())
    };

    emit(CATEGORY_FILE, to_csv_bytes(&dashboard.by_category)?)?;
    emit(REGION_FILE, to_csv_bytes(&dashboard.by_region)?)?;
    emit(TIME_SERIES_FILE, to_csv_bytes(dashboard.monthly.as_slice())?)?;
    emit(PIVOT_FILE, to_csv_bytes(&dashboard.sub_category_by_month)?)?;
    emit(DATA_FILE, to_csv_bytes(dashboard.records.as_slice())?)?;

    info!(dir = %dir.display(), files = written.len(), "Exported dashboard tables");
    Ok(written)
}

// ============================================================================
// READING BACK
// ============================================================================

/// Re-read an exported aggregate table as (key tuple, sales) pairs.
///
/// Key columns are every column before `Sales`.
pub fn read_aggregate_csv<R: Read>(reader: R) -> Result<Vec<(Vec<String>, Decimal)>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let headers = rdr.headers().context("Failed to read CSV header")?.clone();
    let sales_idx = headers
        .iter()
        .position(|h| h == COL_SALES)
        .ok_or_else(|| anyhow!("CSV has no '{}' column", COL_SALES))?;

    let mut pairs = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Failed to read CSV row {}", idx + 1))?;
        let key: Vec<String> = record.iter().take(sales_idx).map(String::from).collect();
        let raw = record.get(sales_idx).unwrap_or_default();
        let sales = Decimal::from_str(raw)
            .with_context(|| format!("Row {}: invalid Sales value '{}'", idx + 1, raw))?;
        pairs.push((key, sales));
    }

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate_by, by_category, by_region, KeyField};
    use crate::filter::FilterCriteria;
    use crate::pivot::sub_category_by_month;
    use crate::series::monthly_series;
    use crate::test_support::{create_test_record, date, dec, sample_records};

    #[test]
    fn test_round_trip_single_key() {
        let table = by_region(&sample_records());
        let bytes = to_csv_bytes(&table).unwrap();
        let parsed = read_aggregate_csv(bytes.as_slice()).unwrap();

        let expected: Vec<(Vec<String>, Decimal)> = table
            .rows
            .iter()
            .map(|r| (vec![r.key[0].to_string()], r.sales))
            .collect();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_round_trip_multi_key_with_commas() {
        let records = vec![
            create_test_record("2023-01-01", "East", "A", "a", "Furniture", "Chairs, Stacking", "12.345"),
            create_test_record("2023-02-01", "East", "A", "a", "Furniture", "Chairs, Stacking", "0.005"),
        ];
        let table = aggregate_by(&records, &[KeyField::SubCategory, KeyField::Month]);
        let parsed = read_aggregate_csv(to_csv_bytes(&table).unwrap().as_slice()).unwrap();

        assert_eq!(
            parsed,
            vec![
                (vec!["Chairs, Stacking".to_string(), "January".to_string()], dec("12.345")),
                (vec!["Chairs, Stacking".to_string(), "February".to_string()], dec("0.005")),
            ]
        );
    }

    #[test]
    fn test_category_header() {
        let bytes = to_csv_bytes(&by_category(&sample_records())).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("Category,Sales,Profit,Quantity,Count\n"));
        assert!(text.contains("Furniture,225.50,0,3,3\n"));
    }

    #[test]
    fn test_empty_table_has_header_only() {
        let text = String::from_utf8(to_csv_bytes(&by_region(&[])).unwrap()).unwrap();
        assert_eq!(text, "Region,Sales,Profit,Quantity,Count\n");
    }

    #[test]
    fn test_pivot_blank_cells() {
        let text = String::from_utf8(to_csv_bytes(&sub_category_by_month(&sample_records())).unwrap())
            .unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Sub-Category,January,February,March,December"));
        assert_eq!(lines.next(), Some("Chairs,100.00,75.50,,"));
    }

    #[test]
    fn test_monthly_series_csv() {
        let series = monthly_series(&sample_records());
        let text = String::from_utf8(to_csv_bytes(series.as_slice()).unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Period,month_year,Sales");
        assert_eq!(lines[1], "2022-12,2022 : Dec,200.00");
    }

    #[test]
    fn test_records_csv_reloads() {
        let records = sample_records();
        let bytes = to_csv_bytes(records.as_slice()).unwrap();
        let reloaded =
            crate::loader::load_from_reader(bytes.as_slice(), &Default::default()).unwrap();
        assert_eq!(reloaded.records(), records.as_slice());
    }

    #[test]
    fn test_export_dashboard_writes_all_files() {
        let records = sample_records();
        let criteria = FilterCriteria::new(date("2023-01-01"), date("2023-12-31"));
        let dashboard = Dashboard::compute(&records, &criteria);

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("exports");
        let written = export_dashboard(&dashboard, &out).unwrap();

        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec![CATEGORY_FILE, REGION_FILE, TIME_SERIES_FILE, PIVOT_FILE, DATA_FILE]
        );

        let data = fs::read_to_string(out.join(DATA_FILE)).unwrap();
        // Header + the five 2023 records
        assert_eq!(data.lines().count(), 6);
    }
}
