// 🔎 Filter Pipeline - date range + cascading region/state/city selection
//
// Filtering is pure: inputs are borrowed, outputs are new vectors that keep
// the input order. The cascade is plain function composition over the
// previous stage's output, with no shared selection state.

use crate::loader::Dataset;
use crate::record::SalesRecord;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

// ============================================================================
// FILTER CRITERIA
// ============================================================================

/// FilterCriteria - inclusive date bounds plus optional location selections.
///
/// An empty selection set means "no restriction"; a non-empty one means the
/// record's field must be a member. Values are built once and not mutated:
/// the `with_*` methods return a new criteria.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FilterCriteria {
    date_from: NaiveDate,
    date_to: NaiveDate,
    #[serde(default)]
    regions: BTreeSet<String>,
    #[serde(default)]
    states: BTreeSet<String>,
    #[serde(default)]
    cities: BTreeSet<String>,
}

impl FilterCriteria {
    /// Date range only, no location restriction.
    pub fn new(date_from: NaiveDate, date_to: NaiveDate) -> Self {
        FilterCriteria {
            date_from,
            date_to,
            regions: BTreeSet::new(),
            states: BTreeSet::new(),
            cities: BTreeSet::new(),
        }
    }

    /// Criteria covering the dataset's whole date range.
    /// `None` when the dataset is empty.
    pub fn spanning(dataset: &Dataset) -> Option<Self> {
        dataset
            .date_bounds()
            .map(|(from, to)| FilterCriteria::new(from, to))
    }

    /// Criteria with the given bounds, falling back to the dataset's own
    /// bounds for whichever side is `None`. An empty dataset falls back to
    /// the widest representable range.
    pub fn within(dataset: &Dataset, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        let (min, max) = dataset
            .date_bounds()
            .unwrap_or((NaiveDate::MIN, NaiveDate::MAX));
        FilterCriteria::new(from.unwrap_or(min), to.unwrap_or(max))
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = regions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.states = states.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_cities<I, S>(mut self, cities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cities = cities.into_iter().map(Into::into).collect();
        self
    }

    pub fn date_from(&self) -> NaiveDate {
        self.date_from
    }

    pub fn date_to(&self) -> NaiveDate {
        self.date_to
    }

    pub fn regions(&self) -> &BTreeSet<String> {
        &self.regions
    }

    pub fn states(&self) -> &BTreeSet<String> {
        &self.states
    }

    pub fn cities(&self) -> &BTreeSet<String> {
        &self.cities
    }

    /// True when `from > to`; such criteria match nothing.
    pub fn is_inverted(&self) -> bool {
        self.date_from > self.date_to
    }

    pub fn matches_date(&self, record: &SalesRecord) -> bool {
        self.date_from <= record.order_date && record.order_date <= self.date_to
    }

    pub fn matches_region(&self, record: &SalesRecord) -> bool {
        selected(&self.regions, &record.region)
    }

    pub fn matches_state(&self, record: &SalesRecord) -> bool {
        selected(&self.states, &record.state)
    }

    pub fn matches_city(&self, record: &SalesRecord) -> bool {
        selected(&self.cities, &record.city)
    }

    /// Full conjunction of all restrictions.
    pub fn matches(&self, record: &SalesRecord) -> bool {
        self.matches_date(record)
            && self.matches_region(record)
            && self.matches_state(record)
            && self.matches_city(record)
    }
}

fn selected(selection: &BTreeSet<String>, value: &str) -> bool {
    selection.is_empty() || selection.contains(value)
}

/// Parse a comma separated selection ("East, West,") into a set.
/// Blank entries are dropped, so "" yields the empty (unrestricted) set.
pub fn parse_selection(text: &str) -> BTreeSet<String> {
    text.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

// ============================================================================
// FILTER
// ============================================================================

/// Keep the records matching `criteria`, in input order.
pub fn filter(records: &[SalesRecord], criteria: &FilterCriteria) -> Vec<SalesRecord> {
    if criteria.is_inverted() {
        return Vec::new();
    }

    records
        .iter()
        .filter(|r| criteria.matches(r))
        .cloned()
        .collect()
}

fn keep(records: &[SalesRecord], pred: impl Fn(&SalesRecord) -> bool) -> Vec<SalesRecord> {
    records.iter().filter(|r| pred(r)).cloned().collect()
}

// ============================================================================
// CASCADE
// ============================================================================

/// CascadeView - every intermediate stage of the cascading filter.
///
/// `by_city` is always equal to `filter(records, criteria)`; the earlier
/// stages exist so the option lists for the next selector can be computed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CascadeView {
    pub by_date: Vec<SalesRecord>,
    pub by_region: Vec<SalesRecord>,
    pub by_state: Vec<SalesRecord>,
    pub by_city: Vec<SalesRecord>,
}

impl CascadeView {
    pub fn build(records: &[SalesRecord], criteria: &FilterCriteria) -> Self {
        let by_date = if criteria.is_inverted() {
            Vec::new()
        } else {
            keep(records, |r| criteria.matches_date(r))
        };
        let by_region = keep(&by_date, |r| criteria.matches_region(r));
        let by_state = keep(&by_region, |r| criteria.matches_state(r));
        let by_city = keep(&by_state, |r| criteria.matches_city(r));

        CascadeView {
            by_date,
            by_region,
            by_state,
            by_city,
        }
    }

    /// Regions present in the date range.
    pub fn region_options(&self) -> Vec<String> {
        distinct_values(&self.by_date, |r| &r.region)
    }

    /// States present in the selected regions.
    pub fn state_options(&self) -> Vec<String> {
        distinct_values(&self.by_region, |r| &r.state)
    }

    /// Cities present in the selected regions and states.
    pub fn city_options(&self) -> Vec<String> {
        distinct_values(&self.by_state, |r| &r.city)
    }

    pub fn options(&self) -> FilterOptions {
        FilterOptions {
            regions: self.region_options(),
            states: self.state_options(),
            cities: self.city_options(),
        }
    }

    /// Final filtered set.
    pub fn into_filtered(self) -> Vec<SalesRecord> {
        self.by_city
    }
}

/// Candidate values for each selector, in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub regions: Vec<String>,
    pub states: Vec<String>,
    pub cities: Vec<String>,
}

/// Distinct values of one field, in the order they first appear.
pub fn distinct_values<'a>(
    records: &'a [SalesRecord],
    field: impl Fn(&'a SalesRecord) -> &'a String,
) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut values = Vec::new();

    for record in records {
        let value = field(record);
        if seen.insert(value.as_str()) {
            values.push(value.clone());
        }
    }

    values
}
