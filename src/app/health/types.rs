//! Data types for AWS Health event harvesting

#![warn(clippy::all, rust_2018_idioms)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event as listed by `DescribeEvents`, before enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSummary {
    pub arn: String,
    pub service: String,
    pub event_type_code: String,
    pub event_type_category: String,
    pub region: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub last_updated_time: Option<DateTime<Utc>>,
    pub status_code: String,
}

/// One page of `DescribeEvents` results
#[derive(Debug, Clone, Default)]
pub struct EventPage {
    pub events: Vec<EventSummary>,
    pub next_token: Option<String>,
}

/// Successful item of a `DescribeEventDetails` response.
///
/// `arn` is the key echoed back by the service; it is `None` only when the
/// response omitted the embedded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetail {
    pub arn: Option<String>,
    pub latest_description: Option<String>,
}

/// Failed item of a `DescribeEventDetails` response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDetailFailure {
    pub arn: Option<String>,
    pub error_name: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EventDetailsResponse {
    pub successful: Vec<EventDetail>,
    pub failed: Vec<EventDetailFailure>,
}

/// Resource reported as impacted by an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffectedEntity {
    pub event_arn: Option<String>,
    pub entity_value: Option<String>,
}

/// One page of `DescribeAffectedEntities` results
#[derive(Debug, Clone, Default)]
pub struct EntityPage {
    pub entities: Vec<AffectedEntity>,
    pub next_token: Option<String>,
}

/// Fully enriched health event for one account.
///
/// `description` and `affected_resources` are always present; an event without
/// a description or without affected entities carries an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthEvent {
    pub arn: String,
    pub account_id: String,
    pub service: String,
    pub event_type_code: String,
    pub event_type_category: String,
    pub region: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub last_updated_time: Option<DateTime<Utc>>,
    pub status_code: String,
    pub description: String,
    pub affected_resources: String,
}

impl HealthEvent {
    pub fn enrich(
        summary: EventSummary,
        account_id: &str,
        description: String,
        affected_resources: String,
    ) -> Self {
        Self {
            arn: summary.arn,
            account_id: account_id.to_string(),
            service: summary.service,
            event_type_code: summary.event_type_code,
            event_type_category: summary.event_type_category,
            region: summary.region,
            start_time: summary.start_time,
            end_time: summary.end_time,
            last_updated_time: summary.last_updated_time,
            status_code: summary.status_code,
            description,
            affected_resources,
        }
    }
}
