//! AWS SDK client wrapper for the AWS Health API

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_health as health_sdk;
use aws_sdk_health::types::{DateTimeRange, EntityFilter, EventFilter};
use chrono::{DateTime, Utc};

use super::types::{
    AffectedEntity, EntityPage, EventDetail, EventDetailFailure, EventDetailsResponse, EventPage,
    EventSummary,
};
use crate::app::period::TimeWindow;

/// The Health API is served from a single global endpoint region.
pub const HEALTH_REGION: &str = "us-east-1";

/// Maximum `DescribeEvents` page size accepted by the service.
pub const EVENTS_PAGE_SIZE: i32 = 100;

/// Maximum number of event ARNs per details / affected-entities request.
pub const LOOKUP_BATCH_SIZE: usize = 10;

/// Health API operations the harvester depends on.
///
/// Implemented by [`SdkHealthApi`] for real accounts and by in-memory fakes in tests.
#[async_trait]
pub trait HealthApi: Send + Sync {
    /// One page of events whose start time falls inside `window`.
    async fn describe_events(
        &self,
        window: &TimeWindow,
        next_token: Option<String>,
    ) -> Result<EventPage>;

    /// Details for at most [`LOOKUP_BATCH_SIZE`] events.
    async fn describe_event_details(&self, arns: &[String]) -> Result<EventDetailsResponse>;

    /// One page of affected entities for at most [`LOOKUP_BATCH_SIZE`] events.
    async fn describe_affected_entities(
        &self,
        arns: &[String],
        next_token: Option<String>,
    ) -> Result<EntityPage>;
}

/// [`HealthApi`] on top of `aws-sdk-health`
#[derive(Clone)]
pub struct SdkHealthApi {
    client: health_sdk::Client,
}

impl SdkHealthApi {
    /// `config` must already be pinned to [`HEALTH_REGION`].
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: health_sdk::Client::new(config),
        }
    }
}

#[async_trait]
impl HealthApi for SdkHealthApi {
    async fn describe_events(
        &self,
        window: &TimeWindow,
        next_token: Option<String>,
    ) -> Result<EventPage> {
        let filter = EventFilter::builder()
            .start_times(
                DateTimeRange::builder()
                    .from(to_smithy(window.start))
                    .to(to_smithy(window.end))
                    .build(),
            )
            .build();

        let response = self
            .client
            .describe_events()
            .filter(filter)
            .max_results(EVENTS_PAGE_SIZE)
            .set_next_token(next_token)
            .send()
            .await
            .context("Failed to describe health events")?;

        let events = response
            .events()
            .iter()
            .map(|event| -> Result<EventSummary> {
                Ok(EventSummary {
                    arn: event
                        .arn()
                        .context("Health event without an ARN")?
                        .to_string(),
                    service: event.service().unwrap_or_default().to_string(),
                    event_type_code: event.event_type_code().unwrap_or_default().to_string(),
                    event_type_category: event
                        .event_type_category()
                        .map(|c| c.as_str().to_string())
                        .unwrap_or_default(),
                    region: event.region().unwrap_or_default().to_string(),
                    start_time: event.start_time().and_then(to_chrono),
                    end_time: event.end_time().and_then(to_chrono),
                    last_updated_time: event.last_updated_time().and_then(to_chrono),
                    status_code: event
                        .status_code()
                        .map(|s| s.as_str().to_string())
                        .unwrap_or_default(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(EventPage {
            events,
            next_token: response.next_token().map(str::to_string),
        })
    }

    async fn describe_event_details(&self, arns: &[String]) -> Result<EventDetailsResponse> {
        let response = self
            .client
            .describe_event_details()
            .set_event_arns(Some(arns.to_vec()))
            .send()
            .await
            .with_context(|| format!("Failed to describe details of {} events", arns.len()))?;

        let successful = response
            .successful_set()
            .iter()
            .map(|item| EventDetail {
                arn: item.event().and_then(|e| e.arn()).map(str::to_string),
                latest_description: item
                    .event_description()
                    .and_then(|d| d.latest_description())
                    .map(str::to_string),
            })
            .collect();

        let failed = response
            .failed_set()
            .iter()
            .map(|item| EventDetailFailure {
                arn: item.event_arn().map(str::to_string),
                error_name: item.error_name().map(str::to_string),
                error_message: item.error_message().map(str::to_string),
            })
            .collect();

        Ok(EventDetailsResponse { successful, failed })
    }

    async fn describe_affected_entities(
        &self,
        arns: &[String],
        next_token: Option<String>,
    ) -> Result<EntityPage> {
        let filter = EntityFilter::builder()
            .set_event_arns(Some(arns.to_vec()))
            .build()
            .context("Failed to build affected entity filter")?;

        let response = self
            .client
            .describe_affected_entities()
            .filter(filter)
            .set_next_token(next_token)
            .send()
            .await
            .with_context(|| {
                format!("Failed to describe affected entities of {} events", arns.len())
            })?;

        let entities = response
            .entities()
            .iter()
            .map(|entity| AffectedEntity {
                event_arn: entity.event_arn().map(str::to_string),
                entity_value: entity.entity_value().map(str::to_string),
            })
            .collect();

        Ok(EntityPage {
            entities,
            next_token: response.next_token().map(str::to_string),
        })
    }
}

fn to_smithy(time: DateTime<Utc>) -> aws_smithy_types::DateTime {
    aws_smithy_types::DateTime::from_millis(time.timestamp_millis())
}

fn to_chrono(time: &aws_smithy_types::DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.secs(), time.subsec_nanos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_time_conversion_round_trip() {
        let time = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 58).unwrap();
        assert_eq!(to_chrono(&to_smithy(time)), Some(time));
    }

    // Calls against the real service belong in tests/ behind #[ignore]
}
