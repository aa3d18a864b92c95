// Shared fixtures for unit tests

use crate::record::SalesRecord;
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// Helper function to create test records with all required fields
pub fn create_test_record(
    order_date: &str,
    region: &str,
    state: &str,
    city: &str,
    category: &str,
    sub_category: &str,
    sales: &str,
) -> SalesRecord {
    SalesRecord {
        order_date: date(order_date),
        region: region.to_string(),
        state: state.to_string(),
        city: city.to_string(),
        category: category.to_string(),
        sub_category: sub_category.to_string(),
        segment: "Consumer".to_string(),
        sales: dec(sales),
        profit: Decimal::ZERO,
        quantity: 1,
    }
}

/// Small mixed dataset spanning a year boundary and three regions.
pub fn sample_records() -> Vec<SalesRecord> {
    vec![
        create_test_record("2022-12-15", "East", "New York", "New York City", "Technology", "Phones", "200.00"),
        create_test_record("2023-01-05", "East", "New York", "Buffalo", "Furniture", "Chairs", "100.00"),
        create_test_record("2023-01-20", "West", "California", "Los Angeles", "Office Supplies", "Paper", "30.00"),
        create_test_record("2023-02-10", "East", "Pennsylvania", "Philadelphia", "Furniture", "Tables", "50.00"),
        create_test_record("2023-02-14", "South", "Kentucky", "Henderson", "Furniture", "Chairs", "75.50"),
        create_test_record("2023-03-01", "West", "Washington", "Seattle", "Technology", "Phones", "19.99"),
    ]
}
