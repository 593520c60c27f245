//! Complete retrieval of one account's health events.
//!
//! The harvest is all-or-nothing: every page of `DescribeEvents` is fetched in
//! order, then descriptions and affected resources are joined onto the events by
//! ARN. Only when both enrichments succeed for every event does the account
//! yield any rows.

#![warn(clippy::all, rust_2018_idioms)]

use std::collections::{HashMap, HashSet};

use super::client::{HealthApi, LOOKUP_BATCH_SIZE};
use super::types::{EntityPage, EventDetailsResponse, EventSummary, HealthEvent};
use crate::app::error::ReportError;
use crate::app::period::TimeWindow;
use crate::{log_debug, log_info};

/// Default cap on pagination iterations per listing.
pub const DEFAULT_MAX_PAGES: usize = 500;

/// Separator between affected entity values in the resource summary.
const ENTITY_SEPARATOR: &str = ", ";

/// Retrieves and enriches the health events of one account.
#[derive(Debug, Clone)]
pub struct EventHarvester {
    max_pages: usize,
}

impl Default for EventHarvester {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PAGES)
    }
}

impl EventHarvester {
    pub fn new(max_pages: usize) -> Self {
        Self {
            max_pages: max_pages.max(1),
        }
    }

    pub async fn harvest(
        &self,
        api: &dyn HealthApi,
        account_id: &str,
        window: &TimeWindow,
    ) -> Result<Vec<HealthEvent>, ReportError> {
        let summaries = self
            .fetch_all_events(api, window)
            .await
            .map_err(|msg| ReportError::api(account_id, msg))?;

        let arns: Vec<String> = summaries.iter().map(|s| s.arn.clone()).collect();

        let descriptions = self
            .fetch_descriptions(api, &arns)
            .await
            .map_err(|msg| ReportError::api(account_id, msg))?;
        let resources = self
            .fetch_affected_resources(api, &arns)
            .await
            .map_err(|msg| ReportError::api(account_id, msg))?;

        let events: Vec<HealthEvent> = summaries
            .into_iter()
            .map(|summary| {
                let description = descriptions.get(&summary.arn).cloned().unwrap_or_default();
                let affected = resources
                    .get(&summary.arn)
                    .map(|values| values.join(ENTITY_SEPARATOR))
                    .unwrap_or_default();
                HealthEvent::enrich(summary, account_id, description, affected)
            })
            .collect();

        log_info!(
            "Harvested {} health events for account {}",
            events.len(),
            account_id
        );
        Ok(events)
    }

    /// Accumulate every `DescribeEvents` page in retrieval order.
    async fn fetch_all_events(
        &self,
        api: &dyn HealthApi,
        window: &TimeWindow,
    ) -> Result<Vec<EventSummary>, String> {
        let mut events = Vec::new();
        let mut next_token: Option<String> = None;
        let mut pages_fetched = 0;

        loop {
            if pages_fetched >= self.max_pages {
                return Err(format!(
                    "event listing did not finish after {} pages",
                    self.max_pages
                ));
            }

            let page = api
                .describe_events(window, next_token.clone())
                .await
                .map_err(|e| format!("{:#}", e))?;
            pages_fetched += 1;

            log_debug!(
                "Event page {} returned {} events (more: {})",
                pages_fetched,
                page.events.len(),
                page.next_token.is_some()
            );
            events.extend(page.events);

            match page.next_token {
                Some(token) if next_token.as_deref() == Some(token.as_str()) => {
                    return Err(format!(
                        "event listing returned the same continuation token twice after page {}",
                        pages_fetched
                    ));
                }
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        Ok(events)
    }

    /// Latest description per ARN, one request per batch of ARNs.
    async fn fetch_descriptions(
        &self,
        api: &dyn HealthApi,
        arns: &[String],
    ) -> Result<HashMap<String, String>, String> {
        let mut descriptions = HashMap::with_capacity(arns.len());

        for batch in arns.chunks(LOOKUP_BATCH_SIZE) {
            let response = api
                .describe_event_details(batch)
                .await
                .map_err(|e| format!("{:#}", e))?;
            for (arn, description) in join_descriptions(batch, response)? {
                descriptions.insert(arn, description);
            }
        }

        Ok(descriptions)
    }

    /// Affected entity values per ARN, following entity pagination per batch.
    async fn fetch_affected_resources(
        &self,
        api: &dyn HealthApi,
        arns: &[String],
    ) -> Result<HashMap<String, Vec<String>>, String> {
        let mut resources: HashMap<String, Vec<String>> = HashMap::with_capacity(arns.len());

        for batch in arns.chunks(LOOKUP_BATCH_SIZE) {
            let mut next_token: Option<String> = None;
            let mut pages_fetched = 0;

            loop {
                if pages_fetched >= self.max_pages {
                    return Err(format!(
                        "affected entity listing did not finish after {} pages",
                        self.max_pages
                    ));
                }

                let page = api
                    .describe_affected_entities(batch, next_token.clone())
                    .await
                    .map_err(|e| format!("{:#}", e))?;
                pages_fetched += 1;

                let page_token = page.next_token.clone();
                merge_entities(batch, page, &mut resources)?;

                match page_token {
                    Some(token) if next_token.as_deref() == Some(token.as_str()) => {
                        return Err(
                            "affected entity listing returned the same continuation token twice"
                                .to_string(),
                        );
                    }
                    Some(token) => next_token = Some(token),
                    None => break,
                }
            }
        }

        Ok(resources)
    }
}

/// Correlate a details response with the ARNs it was requested for.
///
/// Items are matched by the ARN the service echoes back. Only when no successful
/// item carries an ARN are they matched by position, and then only if the
/// response holds exactly one item per requested ARN.
pub fn join_descriptions(
    requested: &[String],
    response: EventDetailsResponse,
) -> Result<Vec<(String, String)>, String> {
    if let Some(failure) = response.failed.first() {
        return Err(format!(
            "description lookup failed for {}: {} {}",
            failure.arn.as_deref().unwrap_or("<unknown event>"),
            failure.error_name.as_deref().unwrap_or("UnknownError"),
            failure.error_message.as_deref().unwrap_or_default()
        ));
    }

    let keyed = response.successful.iter().all(|item| item.arn.is_some());
    let unkeyed = response.successful.iter().all(|item| item.arn.is_none());

    if keyed {
        let wanted: HashSet<&str> = requested.iter().map(String::as_str).collect();
        let mut found: HashMap<String, String> = HashMap::with_capacity(requested.len());

        for item in response.successful {
            let arn = item.arn.unwrap_or_default();
            if !wanted.contains(arn.as_str()) {
                return Err(format!("description lookup returned unrequested event {}", arn));
            }
            if found.contains_key(&arn) {
                return Err(format!("description lookup returned event {} twice", arn));
            }
            found.insert(arn, item.latest_description.unwrap_or_default());
        }

        requested
            .iter()
            .map(|arn| {
                found
                    .get(arn)
                    .cloned()
                    .map(|description| (arn.clone(), description))
                    .ok_or_else(|| format!("description lookup omitted event {}", arn))
            })
            .collect()
    } else if unkeyed {
        if response.successful.len() != requested.len() {
            return Err(format!(
                "description lookup returned {} items for {} requested events",
                response.successful.len(),
                requested.len()
            ));
        }

        Ok(requested
            .iter()
            .cloned()
            .zip(
                response
                    .successful
                    .into_iter()
                    .map(|item| item.latest_description.unwrap_or_default()),
            )
            .collect())
    } else {
        Err("description lookup mixed keyed and unkeyed items".to_string())
    }
}

/// Append one entity page onto the per-ARN resource lists.
pub fn merge_entities(
    requested: &[String],
    page: EntityPage,
    resources: &mut HashMap<String, Vec<String>>,
) -> Result<(), String> {
    for entity in page.entities {
        let arn = entity
            .event_arn
            .ok_or_else(|| "affected entity without an event ARN".to_string())?;
        if !requested.contains(&arn) {
            return Err(format!(
                "affected entity lookup returned unrequested event {}",
                arn
            ));
        }
        if let Some(value) = entity.entity_value {
            resources.entry(arn).or_default().push(value);
        }
    }
    Ok(())
}
