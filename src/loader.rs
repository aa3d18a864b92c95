// 📂 CSV Loader - delimited sales file → validated in-memory dataset
// Fails fast on the first malformed row; nothing is silently dropped.

use crate::error::LoadError;
use crate::record::{RawSalesRow, SalesRecord, DEFAULT_DATE_FORMATS, REQUIRED_COLUMNS};
use chrono::NaiveDate;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

// ============================================================================
// LOAD OPTIONS
// ============================================================================

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// chrono formats tried in order for the `Order Date` column
    pub date_formats: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        LoadOptions {
            date_formats: DEFAULT_DATE_FORMATS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl LoadOptions {
    pub fn with_date_formats(date_formats: Vec<String>) -> Self {
        if date_formats.is_empty() {
            return LoadOptions::default();
        }
        LoadOptions { date_formats }
    }
}

// ============================================================================
// DATASET
// ============================================================================

/// Dataset - the immutable source record set for a session.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<SalesRecord>,
}

impl Dataset {
    pub fn from_records(records: Vec<SalesRecord>) -> Self {
        Dataset { records }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest order date; `None` for an empty dataset.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.order_date).min()?;
        let max = self.records.iter().map(|r| r.order_date).max()?;
        Some((min, max))
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Load and validate a sales CSV file.
pub fn load_csv(path: &Path, options: &LoadOptions) -> Result<Dataset, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let dataset = load_from_reader(file, options).map_err(|err| {
        warn!(path = %path.display(), row = ?err.row(), "Rejected sales file: {}", err);
        err
    })?;

    info!(
        path = %path.display(),
        records = dataset.len(),
        "Loaded sales dataset"
    );
    Ok(dataset)
}

/// Load and validate sales rows from any reader (file, upload buffer, test string).
pub fn load_from_reader<R: Read>(reader: R, options: &LoadOptions) -> Result<Dataset, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|source| LoadError::Csv { row: 0, source })?
        .clone();
    check_required_columns(&headers)?;
    debug!(columns = headers.len(), "Header row validated");

    let mut records = Vec::new();
    for (idx, result) in rdr.deserialize::<RawSalesRow>().enumerate() {
        let row = idx + 1;
        let raw = result.map_err(|source| LoadError::Csv { row, source })?;
        records.push(raw.into_record(row, &options.date_formats)?);
    }

    let dataset = Dataset::from_records(records);
    if let Some((from, to)) = dataset.date_bounds() {
        debug!(%from, %to, "Order date range");
    }
    Ok(dataset)
}

/// Every absent required column is reported, in `REQUIRED_COLUMNS` order.
fn check_required_columns(headers: &csv::StringRecord) -> Result<(), LoadError> {
    let columns: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();

    if columns.is_empty() {
        Ok(())
    } else {
        Err(LoadError::MissingColumns { columns })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{date, dec};
    use std::io::Write;

    const SUPERSTORE_SAMPLE: &str = "\
Row ID,Order ID,Order Date,Ship Date,Ship Mode,Customer ID,Customer Name,Segment,Country,City,State,Postal Code,Region,Product ID,Category,Sub-Category,Product Name,Sales,Quantity,Discount,Profit
1,CA-2016-152156,11/8/2016,11/11/2016,Second Class,CG-12520,Claire Gute,Consumer,United States,Henderson,Kentucky,42420,South,FUR-BO-10001798,Furniture,Bookcases,\"Bush Somerset Collection Bookcase\",261.96,2,0,41.9136
2,CA-2016-152156,11/8/2016,11/11/2016,Second Class,CG-12520,Claire Gute,Consumer,United States,Henderson,Kentucky,42420,South,FUR-CH-10000454,Furniture,Chairs,\"Hon Deluxe Fabric Upholstered Stacking Chairs, Rounded Back\",731.94,3,0,219.582
3,CA-2016-138688,6/12/2016,6/16/2016,Second Class,DV-13045,Darrin Van Huff,Corporate,United States,Los Angeles,California,90036,West,OFF-LA-10000240,Office Supplies,Labels,\"Self-Adhesive Address Labels for Typewriters by Universal\",14.62,2,0,6.8714
";

    #[test]
    fn test_load_superstore_layout() {
        let dataset = load_from_reader(SUPERSTORE_SAMPLE.as_bytes(), &LoadOptions::default()).unwrap();

        assert_eq!(dataset.len(), 3);
        let first = &dataset.records()[0];
        assert_eq!(first.order_date, date("2016-11-08"));
        assert_eq!(first.region, "South");
        assert_eq!(first.sub_category, "Bookcases");
        assert_eq!(first.sales, dec("261.96"));
        assert_eq!(first.quantity, 2);
        assert_eq!(dataset.records()[2].profit, dec("6.8714"));
    }

    #[test]
    fn test_date_bounds() {
        let dataset = load_from_reader(SUPERSTORE_SAMPLE.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(
            dataset.date_bounds(),
            Some((date("2016-06-12"), date("2016-11-08")))
        );
        assert_eq!(Dataset::default().date_bounds(), None);
    }

    #[test]
    fn test_missing_column() {
        let csv = "Order Date,Region,State,City,Category,Sub-Category,Segment,Sales,Quantity\n";
        let err = load_from_reader(csv.as_bytes(), &LoadOptions::default()).unwrap_err();
        match err {
            LoadError::MissingColumns { columns } => assert_eq!(columns, vec!["Profit"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_all_missing_columns_reported() {
        let csv = "Order Date,State,City,Category,Sub-Category,Segment,Sales,Profit\n";
        let err = load_from_reader(csv.as_bytes(), &LoadOptions::default()).unwrap_err();
        match err {
            LoadError::MissingColumns { columns } => {
                assert_eq!(columns, vec!["Region", "Quantity"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_short_year_dates_fail_to_load() {
        let csv = "\
Order Date,Region,State,City,Category,Sub-Category,Segment,Sales,Profit,Quantity
1/5/23,East,New York,Buffalo,Furniture,Chairs,Consumer,100,10,1
08-11-16,East,New York,Buffalo,Furniture,Chairs,Consumer,50,5,1
";
        let err = load_from_reader(csv.as_bytes(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::InvalidDate { row: 1, .. }));
    }

    #[test]
    fn test_bad_date_fails_fast_with_row() {
        let csv = "\
Order Date,Region,State,City,Category,Sub-Category,Segment,Sales,Profit,Quantity
2023-01-05,East,New York,Buffalo,Furniture,Chairs,Consumer,100,10,1
yesterday,East,New York,Buffalo,Furniture,Chairs,Consumer,50,5,1
";
        let err = load_from_reader(csv.as_bytes(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::InvalidDate { row: 2, .. }));
        assert!(err.to_string().contains("Order Date"));
    }

    #[test]
    fn test_ragged_row_is_csv_error() {
        let csv = "\
Order Date,Region,State,City,Category,Sub-Category,Segment,Sales,Profit,Quantity
2023-01-05,East,New York
";
        let err = load_from_reader(csv.as_bytes(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::Csv { row: 1, .. }));
    }

    #[test]
    fn test_header_only_is_empty_dataset() {
        let csv = "Order Date,Region,State,City,Category,Sub-Category,Segment,Sales,Profit,Quantity\n";
        let dataset = load_from_reader(csv.as_bytes(), &LoadOptions::default()).unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_custom_date_formats() {
        let csv = "\
Order Date,Region,State,City,Category,Sub-Category,Segment,Sales,Profit,Quantity
05.01.2023,East,New York,Buffalo,Furniture,Chairs,Consumer,100,10,1
";
        let options = LoadOptions::with_date_formats(vec!["%d.%m.%Y".to_string()]);
        let dataset = load_from_reader(csv.as_bytes(), &options).unwrap();
        assert_eq!(dataset.records()[0].order_date, date("2023-01-05"));

        assert!(load_from_reader(csv.as_bytes(), &LoadOptions::default()).is_err());
    }

    #[test]
    fn test_load_csv_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Superstore.csv");
        let mut file = File::create(&path).unwrap();
        file.write_all(SUPERSTORE_SAMPLE.as_bytes()).unwrap();

        let dataset = load_csv(&path, &LoadOptions::default()).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.records()[0].city, "Henderson");
    }

    #[test]
    fn test_load_csv_missing_file() {
        let err = load_csv(Path::new("/nonexistent/Superstore.csv"), &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
