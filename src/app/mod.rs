//! Core modules of the health report.
//!
//! # Module Organization
//!
//! ## Invocation
//! - [`config`] - command line flags and validated run settings
//! - [`period`] - `<number>d|m` report windows
//! - [`runner`] - drives a run across accounts
//!
//! ## AWS Integration
//! - [`accounts`] - organization and caller account enumeration
//! - [`credentials`] - per-account Health API access, optionally through an assumed role
//! - [`health`] - paginated event retrieval and enrichment
//!
//! ## Output
//! - [`report`] - report model, assembler, and spreadsheet sinks
//!
//! ## Shared
//! - [`error`] - error taxonomy and exit codes

pub mod accounts;
pub mod config;
pub mod credentials;
pub mod error;
pub mod health;
pub mod period;
pub mod report;
pub mod runner;
