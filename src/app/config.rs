//! Command line interface and validated run settings

#![warn(clippy::all, rust_2018_idioms)]

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;

use super::error::ReportError;
use super::health::DEFAULT_MAX_PAGES;
use super::period::{ReportPeriod, TimeWindow};

pub const DEFAULT_CONCURRENCY: usize = 4;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("HEALTHREPORT_GIT_BRANCH"),
    "@",
    env!("HEALTHREPORT_GIT_COMMIT"),
    ")"
);

#[derive(Parser, Debug, Clone)]
#[command(name = "healthreport", version, long_version = LONG_VERSION)]
#[command(about = "Export AWS Health events of one account or a whole organization to an Excel report")]
pub struct Cli {
    /// The output filename, default: phd_<DDMMYYYY>.xlsx
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Fetch events from all linked accounts. Requires --role
    #[arg(short, long)]
    pub all: bool,

    /// The role to be assumed to access AWS Health in other accounts
    #[arg(short, long)]
    pub role: Option<String>,

    /// Report period as <number>m|d, e.g. 30d for the last 30 days or 1m for the last month
    #[arg(short, long, default_value = "30d")]
    pub period: String,

    /// Number of accounts harvested at the same time
    #[arg(long, env = "HEALTHREPORT_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Upper bound on result pages fetched per listing before the account is failed
    #[arg(long, default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: usize,
}

/// Which accounts a run covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportMode {
    /// The caller's own account, using its ambient identity.
    SingleAccount,
    /// Every organization account, through `role_name` in each.
    Organization { role_name: String },
}

impl ReportMode {
    pub fn role_name(&self) -> Option<&str> {
        match self {
            ReportMode::SingleAccount => None,
            ReportMode::Organization { role_name } => Some(role_name),
        }
    }
}

/// Validated settings of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportConfig {
    pub output: PathBuf,
    pub mode: ReportMode,
    pub window: TimeWindow,
    pub concurrency: usize,
    pub max_pages: usize,
}

/// `phd_<DDMMYYYY>.xlsx` for the given day.
pub fn default_output_path(now: DateTime<Utc>) -> PathBuf {
    PathBuf::from(format!("phd_{}.xlsx", now.format("%d%m%Y")))
}

impl Cli {
    /// Validate flag combinations and resolve the period against `now`.
    pub fn into_config(self, now: DateTime<Utc>) -> Result<ReportConfig, ReportError> {
        let role = self.role.map(|r| r.trim().to_string());

        let mode = match (self.all, role) {
            (true, Some(role_name)) if !role_name.is_empty() => {
                ReportMode::Organization { role_name }
            }
            (true, Some(_)) => return Err(ReportError::config("--role must not be empty")),
            (true, None) => return Err(ReportError::config("--all requires --role")),
            (false, Some(_)) => {
                return Err(ReportError::config(
                    "--role makes sense only in combination with --all",
                ))
            }
            (false, None) => ReportMode::SingleAccount,
        };

        if self.concurrency == 0 {
            return Err(ReportError::config("--concurrency must be at least 1"));
        }
        if self.max_pages == 0 {
            return Err(ReportError::config("--max-pages must be at least 1"));
        }

        let window = ReportPeriod::parse(&self.period)?.window(now)?;

        Ok(ReportConfig {
            output: self.output.unwrap_or_else(|| default_output_path(now)),
            mode,
            window,
            concurrency: self.concurrency,
            max_pages: self.max_pages,
        })
    }
}
