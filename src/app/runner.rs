//! Drives one report run.
//!
//! ```text
//! AccountDirectory ──> accounts (listing order)
//!        │
//!        ├─ per account, at most `concurrency` at a time:
//!        │     CredentialResolver ──> HealthApi ──> EventHarvester
//!        │
//!        └─ results re-ordered by listing order ──> ReportAssembler ──> Report
//! ```
//!
//! Accounts are independent: an account whose role cannot be assumed is
//! skipped with a warning, an account whose harvest fails is recorded as failed,
//! and neither stops the others.

#![warn(clippy::all, rust_2018_idioms)]

use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;

use super::accounts::{Account, AccountDirectory};
use super::config::{ReportConfig, ReportMode};
use super::credentials::CredentialResolver;
use super::error::ReportError;
use super::health::{EventHarvester, HealthEvent};
use super::period::TimeWindow;
use super::report::{Report, ReportAssembler};
use crate::{log_error, log_info, log_warn};

/// Result of a run: the report plus the accounts it could not cover.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: Report,
    /// Accounts skipped because credentials could not be obtained.
    pub skipped: Vec<ReportError>,
    /// Accounts whose harvest failed.
    pub failed: Vec<ReportError>,
}

impl RunOutcome {
    /// True when every enumerated account except auth-skipped ones made it into the report.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct ReportRunner {
    directory: Arc<dyn AccountDirectory>,
    resolver: Arc<dyn CredentialResolver>,
}

impl ReportRunner {
    pub fn new(directory: Arc<dyn AccountDirectory>, resolver: Arc<dyn CredentialResolver>) -> Self {
        Self {
            directory,
            resolver,
        }
    }

    pub async fn run(&self, config: &ReportConfig) -> Result<RunOutcome, ReportError> {
        let (accounts, mut assembler) = match &config.mode {
            ReportMode::SingleAccount => {
                let account = self.directory.caller_account().await?;
                let assembler = ReportAssembler::single_account(account.name.clone());
                (vec![account], assembler)
            }
            ReportMode::Organization { .. } => {
                let accounts = self.directory.list_accounts().await?;
                let assembler = ReportAssembler::organization(accounts.clone());
                (accounts, assembler)
            }
        };

        log_info!(
            "Harvesting {} account(s) from {} to {}",
            accounts.len(),
            config.window.start,
            config.window.end
        );

        let results = self.harvest_accounts(&accounts, config).await;

        let mut skipped = Vec::new();
        let mut failed = Vec::new();
        for (account, result) in accounts.iter().zip(results) {
            match result {
                Ok(events) => assembler.append_account(events),
                Err(err) if err.is_recoverable() => {
                    log_warn!("Skipping account {}: {}", account.id, err);
                    skipped.push(err);
                }
                Err(err) => {
                    log_error!("No events reported for account {}: {}", account.id, err);
                    failed.push(err);
                }
            }
        }

        Ok(RunOutcome {
            report: assembler.finish(),
            skipped,
            failed,
        })
    }

    /// Harvest every account through a bounded pool; results come back in
    /// `accounts` order regardless of completion order.
    async fn harvest_accounts(
        &self,
        accounts: &[Account],
        config: &ReportConfig,
    ) -> Vec<Result<Vec<HealthEvent>, ReportError>> {
        let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
        let harvester = EventHarvester::new(config.max_pages);
        let role_name = config.mode.role_name().map(str::to_string);

        let mut futures: FuturesUnordered<_> = accounts
            .iter()
            .enumerate()
            .map(|(index, account)| {
                let semaphore = semaphore.clone();
                let resolver = self.resolver.clone();
                let harvester = harvester.clone();
                let role_name = role_name.clone();
                let account_id = account.id.clone();
                let window = config.window;

                async move {
                    let result = match semaphore.acquire().await {
                        Ok(_permit) => {
                            harvest_account(
                                resolver.as_ref(),
                                &harvester,
                                &account_id,
                                role_name.as_deref(),
                                &window,
                            )
                            .await
                        }
                        Err(_) => Err(ReportError::api(&account_id, "worker pool closed")),
                    };
                    (index, result)
                }
            })
            .collect();

        let mut results: Vec<Option<Result<Vec<HealthEvent>, ReportError>>> =
            accounts.iter().map(|_| None).collect();
        while let Some((index, result)) = futures.next().await {
            results[index] = Some(result);
        }

        results
            .into_iter()
            .zip(accounts)
            .map(|(result, account)| {
                result.unwrap_or_else(|| Err(ReportError::api(&account.id, "harvest did not run")))
            })
            .collect()
    }
}

async fn harvest_account(
    resolver: &dyn CredentialResolver,
    harvester: &EventHarvester,
    account_id: &str,
    role_name: Option<&str>,
    window: &TimeWindow,
) -> Result<Vec<HealthEvent>, ReportError> {
    let api = resolver.resolve(account_id, role_name).await?;
    harvester.harvest(api.as_ref(), account_id, window).await
}
