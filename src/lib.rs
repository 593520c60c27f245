//! AWS Health Report - operational health events of one account or a whole organization, in one workbook
//!
//! The tool lists every AWS Health event whose start time falls inside a
//! requested window, enriches each with its latest description and its affected
//! resources, and writes the result as an Excel workbook.
//!
//! # Modes
//!
//! - **Single account**: the caller's own account, using its ambient credentials.
//!   The account name is looked up once and written on every row.
//! - **Organization-wide** (`--all --role <name>`): every account listed by AWS
//!   Organizations is accessed by assuming `<name>` in it. An `Accounts` sheet
//!   holds the organization's account attributes as the keyed `AccountTable`, and
//!   the Events sheet looks account names up from it.
//!
//! # Architecture Overview
//!
//! - **Credential resolution** ([`app::credentials`]): ambient identity or STS role assumption
//! - **Event harvesting** ([`app::health`]): complete pagination, then ARN-keyed enrichment
//! - **Report assembly** ([`app::report`]): format-agnostic rows plus a key-based join,
//!   rendered into a tabular sink
//! - **Orchestration** ([`app::runner`]): bounded concurrency across accounts with
//!   deterministic output order
//!
//! Failures are classified by [`app::error::ReportError`]: configuration and sink
//! errors abort the run, a denied role skips only that account.

#![warn(clippy::all, rust_2018_idioms)]

#[macro_use]
pub mod logging_macros;

pub mod app;
