//! In-memory stand-ins for the AWS services a report run talks to.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use healthreport::app::accounts::{Account, AccountDirectory};
use healthreport::app::credentials::CredentialResolver;
use healthreport::app::error::ReportError;
use healthreport::app::health::{
    AffectedEntity, EntityPage, EventDetail, EventDetailsResponse, EventPage, EventSummary,
    HealthApi,
};
use healthreport::app::period::TimeWindow;

pub fn window() -> TimeWindow {
    TimeWindow {
        start: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        end: Utc.with_ymd_and_hms(2024, 5, 31, 0, 0, 0).unwrap(),
    }
}

pub fn summary(arn: &str) -> EventSummary {
    EventSummary {
        arn: arn.to_string(),
        service: "EC2".to_string(),
        event_type_code: "AWS_EC2_INSTANCE_RETIREMENT_SCHEDULED".to_string(),
        event_type_category: "scheduledChange".to_string(),
        region: "eu-west-1".to_string(),
        start_time: Some(Utc.with_ymd_and_hms(2024, 5, 3, 10, 0, 0).unwrap()),
        end_time: None,
        last_updated_time: Some(Utc.with_ymd_and_hms(2024, 5, 4, 11, 30, 0).unwrap()),
        status_code: "upcoming".to_string(),
    }
}

/// How the fake answers `DescribeEventDetails`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailsMode {
    /// Items carry ARNs, returned in reverse request order.
    KeyedReversed,
    /// Items carry no ARNs, one per requested event.
    Positional,
    /// Items carry no ARNs and the last one is missing.
    PositionalShort,
}

/// Health API serving fixed pages of events.
pub struct FakeHealthApi {
    pages: Vec<Vec<EventSummary>>,
    descriptions: HashMap<String, String>,
    entities: HashMap<String, Vec<String>>,
    details_mode: DetailsMode,
    /// Entities returned per `DescribeAffectedEntities` page.
    entity_page_size: usize,
    /// When set, every event page hands out this token and never finishes.
    stuck_token: Option<String>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeHealthApi {
    pub fn new(pages: Vec<Vec<EventSummary>>) -> Self {
        Self {
            pages,
            descriptions: HashMap::new(),
            entities: HashMap::new(),
            details_mode: DetailsMode::KeyedReversed,
            entity_page_size: 2,
            stuck_token: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Events named `<prefix>-<n>` spread over pages of the given sizes.
    pub fn with_page_sizes(prefix: &str, sizes: &[usize]) -> Self {
        let mut counter = 0;
        let pages = sizes
            .iter()
            .map(|size| {
                (0..*size)
                    .map(|_| {
                        counter += 1;
                        summary(&format!("{}-{}", prefix, counter))
                    })
                    .collect()
            })
            .collect();
        Self::new(pages)
    }

    pub fn describe(mut self, arn: &str, text: &str) -> Self {
        self.descriptions.insert(arn.to_string(), text.to_string());
        self
    }

    pub fn affect(mut self, arn: &str, values: &[&str]) -> Self {
        self.entities.insert(
            arn.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        );
        self
    }

    pub fn details_mode(mut self, mode: DetailsMode) -> Self {
        self.details_mode = mode;
        self
    }

    pub fn stuck_on(mut self, token: &str) -> Self {
        self.stuck_token = Some(token.to_string());
        self
    }

    pub fn call_log(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl HealthApi for FakeHealthApi {
    async fn describe_events(
        &self,
        _window: &TimeWindow,
        next_token: Option<String>,
    ) -> Result<EventPage> {
        self.record(format!("events:{}", next_token.as_deref().unwrap_or("-")));

        if let Some(token) = &self.stuck_token {
            return Ok(EventPage {
                events: vec![],
                next_token: Some(token.clone()),
            });
        }

        let index = match next_token {
            None => 0,
            Some(token) => match token.strip_prefix("page-") {
                Some(n) => n.parse::<usize>()?,
                None => bail!("unknown token {}", token),
            },
        };
        let events = self.pages.get(index).cloned().unwrap_or_default();
        let next_token = (index + 1 < self.pages.len()).then(|| format!("page-{}", index + 1));
        Ok(EventPage { events, next_token })
    }

    async fn describe_event_details(&self, arns: &[String]) -> Result<EventDetailsResponse> {
        self.record(format!("details:{}", arns.len()));
        if arns.len() > 10 {
            bail!("at most 10 ARNs per details request");
        }

        let describe = |arn: &String| self.descriptions.get(arn).cloned();
        let successful = match self.details_mode {
            DetailsMode::KeyedReversed => arns
                .iter()
                .rev()
                .map(|arn| EventDetail {
                    arn: Some(arn.clone()),
                    latest_description: describe(arn),
                })
                .collect(),
            DetailsMode::Positional => arns
                .iter()
                .map(|arn| EventDetail {
                    arn: None,
                    latest_description: describe(arn),
                })
                .collect(),
            DetailsMode::PositionalShort => arns
                .iter()
                .take(arns.len().saturating_sub(1))
                .map(|arn| EventDetail {
                    arn: None,
                    latest_description: describe(arn),
                })
                .collect(),
        };

        Ok(EventDetailsResponse {
            successful,
            failed: vec![],
        })
    }

    async fn describe_affected_entities(
        &self,
        arns: &[String],
        next_token: Option<String>,
    ) -> Result<EntityPage> {
        self.record(format!("entities:{}", arns.len()));
        if arns.len() > 10 {
            bail!("at most 10 ARNs per entity request");
        }

        let all: Vec<AffectedEntity> = arns
            .iter()
            .flat_map(|arn| {
                self.entities
                    .get(arn)
                    .into_iter()
                    .flatten()
                    .map(move |value| AffectedEntity {
                        event_arn: Some(arn.clone()),
                        entity_value: Some(value.clone()),
                    })
            })
            .collect();

        let offset: usize = next_token.as_deref().unwrap_or("0").parse()?;
        let end = (offset + self.entity_page_size).min(all.len());
        let next_token = (end < all.len()).then(|| end.to_string());

        Ok(EntityPage {
            entities: all.get(offset..end).map(<[_]>::to_vec).unwrap_or_default(),
            next_token,
        })
    }
}

/// Resolver handing out a prepared API per account; listed accounts are denied.
pub struct FakeResolver {
    apis: HashMap<String, Arc<FakeHealthApi>>,
    denied: HashSet<String>,
    pub resolved: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self {
            apis: HashMap::new(),
            denied: HashSet::new(),
            resolved: Mutex::new(Vec::new()),
        }
    }

    pub fn account(mut self, account_id: &str, api: FakeHealthApi) -> Self {
        self.apis.insert(account_id.to_string(), Arc::new(api));
        self
    }

    pub fn deny(mut self, account_id: &str) -> Self {
        self.denied.insert(account_id.to_string());
        self
    }
}

#[async_trait]
impl CredentialResolver for FakeResolver {
    async fn resolve(
        &self,
        account_id: &str,
        role_name: Option<&str>,
    ) -> Result<Arc<dyn HealthApi>, ReportError> {
        self.resolved
            .lock()
            .unwrap()
            .push((account_id.to_string(), role_name.map(str::to_string)));

        if self.denied.contains(account_id) {
            return Err(ReportError::auth(
                account_id,
                "Not authorized to perform sts:AssumeRole (AccessDenied)",
            ));
        }
        match self.apis.get(account_id) {
            Some(api) => Ok(api.clone() as Arc<dyn HealthApi>),
            None => Err(ReportError::auth(account_id, "role does not exist")),
        }
    }
}

/// Directory with a fixed caller account and organization listing.
pub struct FakeDirectory {
    pub caller: Account,
    pub organization: Vec<Account>,
}

impl FakeDirectory {
    pub fn organization(ids_and_names: &[(&str, &str)]) -> Self {
        let organization: Vec<Account> = ids_and_names
            .iter()
            .map(|(id, name)| Account {
                name: name.to_string(),
                email: Some(format!("{}@example.com", name)),
                status: Some("ACTIVE".to_string()),
                ..Account::from_id(id)
            })
            .collect();
        Self {
            caller: organization[0].clone(),
            organization,
        }
    }
}

#[async_trait]
impl AccountDirectory for FakeDirectory {
    async fn caller_account(&self) -> Result<Account, ReportError> {
        Ok(self.caller.clone())
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, ReportError> {
        Ok(self.organization.clone())
    }
}

/// Formatted log output of the current thread, collected while the guard from
/// [`LogCapture::install`] is alive.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Captured lines at `level` (e.g. "WARN").
    pub fn lines_at(&self, level: &str) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.split_whitespace().any(|word| word == level))
            .map(str::to_string)
            .collect()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
