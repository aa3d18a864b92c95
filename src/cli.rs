//! Command-line interface argument parsing.
//!
//! All subcommands share the dataset/config/verbosity flags; the ones that
//! compute tables also share the filter flags.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use sales_explorer::{Dataset, FilterCriteria};
use std::path::PathBuf;

/// Sales Explorer - filter and aggregate a sales CSV
///
/// Examples:
///   sales-explorer summary --data Superstore.csv
///   sales-explorer summary --from 2016-01-01 --to 2016-12-31 --region East,West
///   sales-explorer options --region East
///   sales-explorer export --out exports --state California
///   sales-explorer init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Sales CSV to load
    ///
    /// Falls back to `data.path` in the config file, then Superstore.csv.
    #[arg(short, long, value_name = "FILE", global = true, env = "SALES_EXPLORER_DATA")]
    pub data: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .sales-explorer.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print totals, category/region/segment tables, monthly series and pivot
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Print the region/state/city values available under the current selection
    Options {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Write Category.csv, Region.csv, TimeSeries.csv, SubCategoryMonth.csv and Data.csv
    Export {
        #[command(flatten)]
        filter: FilterArgs,

        /// Output directory (defaults to `export.output_dir` from config)
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Generate a default .sales-explorer.toml in the current directory
    InitConfig,
}

/// Date range and location selection.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// First order date to include (defaults to the earliest in the data)
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub from: Option<NaiveDate>,

    /// Last order date to include (defaults to the latest in the data)
    #[arg(long, value_name = "YYYY-MM-DD", value_parser = parse_date)]
    pub to: Option<NaiveDate>,

    /// Regions to keep (repeatable or comma separated)
    #[arg(long = "region", value_name = "REGION", value_delimiter = ',')]
    pub regions: Vec<String>,

    /// States to keep (repeatable or comma separated)
    #[arg(long = "state", value_name = "STATE", value_delimiter = ',')]
    pub states: Vec<String>,

    /// Cities to keep (repeatable or comma separated)
    #[arg(long = "city", value_name = "CITY", value_delimiter = ',')]
    pub cities: Vec<String>,
}

impl FilterArgs {
    /// Build criteria, filling missing date bounds from the dataset.
    pub fn criteria(&self, dataset: &Dataset) -> FilterCriteria {
        let clean = |values: &[String]| -> Vec<String> {
            values
                .iter()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .collect()
        };

        FilterCriteria::within(dataset, self.from, self.to)
            .with_regions(clean(&self.regions))
            .with_states(clean(&self.states))
            .with_cities(clean(&self.cities))
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got '{}': {}", s, e))
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate argument combinations.
    pub fn validate(&self) -> Result<()> {
        if self.verbose && self.quiet {
            return Err(anyhow!("Cannot use both --verbose and --quiet"));
        }
        Ok(())
    }

    /// Get the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_summary_with_filters() {
        let args = Args::try_parse_from([
            "sales-explorer",
            "summary",
            "--from",
            "2016-01-01",
            "--to",
            "2016-12-31",
            "--region",
            "East,West",
            "--region",
            "South",
            "--city",
            "Seattle",
        ])
        .unwrap();

        match args.command {
            Command::Summary { filter } => {
                assert_eq!(filter.from, NaiveDate::from_ymd_opt(2016, 1, 1));
                assert_eq!(filter.to, NaiveDate::from_ymd_opt(2016, 12, 31));
                assert_eq!(filter.regions, vec!["East", "West", "South"]);
                assert_eq!(filter.cities, vec!["Seattle"]);
                assert!(filter.states.is_empty());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_bad_date_rejected() {
        let result = Args::try_parse_from(["sales-explorer", "summary", "--from", "01/02/2016"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args =
            Args::try_parse_from(["sales-explorer", "export", "--data", "x.csv", "-o", "out", "-v"])
                .unwrap();
        assert_eq!(args.data, Some(PathBuf::from("x.csv")));
        assert!(args.verbose);
        assert!(matches!(args.command, Command::Export { out: Some(_), .. }));
    }

    #[test]
    fn test_validation_conflicting_options() {
        let args = Args::try_parse_from(["sales-explorer", "init-config", "-v", "-q"]).unwrap();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = Args::try_parse_from(["sales-explorer", "options"]).unwrap();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_filter_args_criteria_defaults_to_dataset_range() {
        let filter = FilterArgs {
            regions: vec![" East ".to_string(), "".to_string()],
            ..Default::default()
        };
        let criteria = filter.criteria(&Dataset::default());
        assert_eq!(criteria.regions().len(), 1);
        assert!(criteria.regions().contains("East"));
        assert!(!criteria.is_inverted());
    }
}
