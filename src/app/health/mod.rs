//! AWS Health event harvesting
//!
//! Retrieves every health event of one account within a time window and
//! enriches each with its latest description and its affected resources.
//!
//! ## Architecture
//!
//! ```text
//! EventHarvester ──> dyn HealthApi ──> SdkHealthApi ──> aws-sdk-health
//!       │
//!       └──> Vec<HealthEvent> (one account, fully enriched)
//! ```
//!
//! ## Pagination
//!
//! `DescribeEvents` returns at most 100 events per call. The harvester follows
//! continuation tokens in order until none is returned, and gives up with an
//! error after a configurable number of pages or when a token repeats.
//!
//! ## Enrichment
//!
//! `DescribeEventDetails` and `DescribeAffectedEntities` accept at most 10 event
//! ARNs per call, so the accumulated ARN list is processed in batches of 10.
//! Responses are joined back onto events by ARN; a response that omits, adds, or
//! fails an ARN fails the whole account instead of shifting data between rows.

#![warn(clippy::all, rust_2018_idioms)]

pub mod client;
pub mod harvester;
pub mod types;

pub use client::{HealthApi, SdkHealthApi, HEALTH_REGION};
pub use harvester::{EventHarvester, DEFAULT_MAX_PAGES};
pub use types::{
    AffectedEntity, EntityPage, EventDetail, EventDetailFailure, EventDetailsResponse, EventPage,
    EventSummary, HealthEvent,
};
