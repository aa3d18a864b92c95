// 🖥️ Dashboard - every output the presentation layer needs, in one value
//
// One criteria change = one full recompute from the immutable dataset.
// `Session` memoizes the last result; the cache never changes what is returned.

use crate::aggregate::{by_category, by_hierarchy, by_region, by_segment, AggregateTable};
use crate::filter::{CascadeView, FilterCriteria, FilterOptions};
use crate::loader::Dataset;
use crate::pivot::{sub_category_by_month, PivotTable};
use crate::record::SalesRecord;
use crate::series::{monthly_series, MonthlyPoint};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Rows shown in the summary preview table.
pub const PREVIEW_ROWS: usize = 5;

// ============================================================================
// OUTPUT TYPES
// ============================================================================

/// Totals over the filtered record set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub records: usize,
    pub sales: Decimal,
    pub profit: Decimal,
    pub quantity: u64,
}

impl Totals {
    pub fn of(records: &[SalesRecord]) -> Self {
        records.iter().fold(Totals::default(), |mut acc, r| {
            acc.records += 1;
            acc.sales += r.sales;
            acc.profit += r.profit;
            acc.quantity += u64::from(r.quantity);
            acc
        })
    }
}

/// Projection of a record used by the summary preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewRow {
    pub region: String,
    pub state: String,
    pub city: String,
    pub category: String,
    pub sales: Decimal,
    pub profit: Decimal,
    pub quantity: u32,
}

impl From<&SalesRecord> for PreviewRow {
    fn from(r: &SalesRecord) -> Self {
        PreviewRow {
            region: r.region.clone(),
            state: r.state.clone(),
            city: r.city.clone(),
            category: r.category.clone(),
            sales: r.sales,
            profit: r.profit,
            quantity: r.quantity,
        }
    }
}

/// Sales vs profit, sized by quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScatterPoint {
    pub sales: Decimal,
    pub profit: Decimal,
    pub quantity: u32,
}

// ============================================================================
// DASHBOARD
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub criteria: FilterCriteria,
    /// Candidate values for the region/state/city selectors
    pub options: FilterOptions,
    pub totals: Totals,
    /// Filtered record set, in load order
    pub records: Vec<SalesRecord>,
    pub by_category: AggregateTable,
    pub by_region: AggregateTable,
    pub by_segment: AggregateTable,
    pub by_hierarchy: AggregateTable,
    pub monthly: Vec<MonthlyPoint>,
    pub sub_category_by_month: PivotTable,
    /// First rows of the date-filtered set, before location filters
    pub preview: Vec<PreviewRow>,
    pub scatter: Vec<ScatterPoint>,
}

impl Dashboard {
    pub fn compute(records: &[SalesRecord], criteria: &FilterCriteria) -> Self {
        let cascade = CascadeView::build(records, criteria);
        let options = cascade.options();
        let preview: Vec<PreviewRow> = cascade
            .by_date
            .iter()
            .take(PREVIEW_ROWS)
            .map(PreviewRow::from)
            .collect();

        let filtered = cascade.into_filtered();
        debug!(
            input = records.len(),
            filtered = filtered.len(),
            "Recomputed dashboard"
        );

        let scatter = filtered
            .iter()
            .map(|r| ScatterPoint {
                sales: r.sales,
                profit: r.profit,
                quantity: r.quantity,
            })
            .collect();

        Dashboard {
            criteria: criteria.clone(),
            options,
            totals: Totals::of(&filtered),
            by_category: by_category(&filtered),
            by_region: by_region(&filtered),
            by_segment: by_segment(&filtered),
            by_hierarchy: by_hierarchy(&filtered),
            monthly: monthly_series(&filtered),
            sub_category_by_month: sub_category_by_month(&filtered),
            preview,
            scatter,
            records: filtered,
        }
    }
}

// ============================================================================
// SESSION
// ============================================================================

/// Session - the loaded dataset plus the most recently computed dashboard.
pub struct Session {
    dataset: Arc<Dataset>,
    last: Option<(FilterCriteria, Arc<Dashboard>)>,
}

impl Session {
    /// Accepts an owned `Dataset` or one already shared behind an `Arc`.
    pub fn new(dataset: impl Into<Arc<Dataset>>) -> Self {
        Session {
            dataset: dataset.into(),
            last: None,
        }
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    /// Whole date range, no location restriction.
    pub fn default_criteria(&self) -> Option<FilterCriteria> {
        FilterCriteria::spanning(&self.dataset)
    }

    /// Dashboard for `criteria`, reusing the previous result when the
    /// criteria are unchanged.
    pub fn dashboard(&mut self, criteria: &FilterCriteria) -> Arc<Dashboard> {
        if let Some((cached, dashboard)) = &self.last {
            if cached == criteria {
                debug!("Dashboard cache hit");
                return Arc::clone(dashboard);
            }
        }

        let dashboard = Arc::new(Dashboard::compute(self.dataset.records(), criteria));
        self.last = Some((criteria.clone(), Arc::clone(&dashboard)));
        dashboard
    }
}
