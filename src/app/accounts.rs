//! Account enumeration.
//!
//! In organization-wide mode every member account is listed from AWS
//! Organizations. In single-account mode the caller's own account is derived
//! from its identity and its display name looked up once.

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_organizations as organizations;
use aws_sdk_sts::Client as StsClient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::ReportError;

/// Attribute names of an organization account, in the directory's native order.
pub const ACCOUNT_ATTRIBUTES: [&str; 7] = [
    "Id",
    "Arn",
    "Email",
    "Name",
    "Status",
    "JoinedMethod",
    "JoinedTimestamp",
];

/// 1-based position of `Name` within [`ACCOUNT_ATTRIBUTES`].
pub const ACCOUNT_NAME_POSITION: usize = 4;

/// An AWS account as reported by the organization directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub arn: Option<String>,
    pub email: Option<String>,
    pub name: String,
    pub status: Option<String>,
    pub joined_method: Option<String>,
    pub joined_timestamp: Option<DateTime<Utc>>,
}

impl Account {
    /// Account known only by its id; the id doubles as display name.
    pub fn from_id(id: &str) -> Self {
        Self {
            id: id.to_string(),
            arn: None,
            email: None,
            name: id.to_string(),
            status: None,
            joined_method: None,
            joined_timestamp: None,
        }
    }

    #[allow(deprecated)]
    fn from_sdk(account: &organizations::types::Account) -> Option<Self> {
        let id = account.id()?.to_string();
        Some(Self {
            name: account.name().unwrap_or(&id).to_string(),
            arn: account.arn().map(str::to_string),
            email: account.email().map(str::to_string),
            status: account.status().map(|s| s.as_str().to_string()),
            joined_method: account.joined_method().map(|m| m.as_str().to_string()),
            joined_timestamp: account
                .joined_timestamp()
                .and_then(|ts| DateTime::from_timestamp(ts.secs(), ts.subsec_nanos())),
            id,
        })
    }
}

/// Source of the accounts a report covers.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// The account the ambient credentials belong to, with its display name.
    async fn caller_account(&self) -> Result<Account, ReportError>;

    /// Every account of the organization, in listing order.
    async fn list_accounts(&self) -> Result<Vec<Account>, ReportError>;
}

/// [`AccountDirectory`] backed by STS and AWS Organizations.
pub struct SdkAccountDirectory {
    sts: StsClient,
    organizations: organizations::Client,
}

impl SdkAccountDirectory {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            sts: StsClient::new(config),
            organizations: organizations::Client::new(config),
        }
    }

    async fn caller_account_id(&self) -> Result<String> {
        let identity = self
            .sts
            .get_caller_identity()
            .send()
            .await
            .context("Failed to get caller identity")?;

        identity
            .account()
            .map(str::to_string)
            .context("No account found in caller identity")
    }

    async fn describe_account(&self, account_id: &str) -> Result<Account> {
        let response = self
            .organizations
            .describe_account()
            .account_id(account_id)
            .send()
            .await
            .with_context(|| format!("Failed to describe account {}", account_id))?;

        response
            .account()
            .and_then(Account::from_sdk)
            .with_context(|| format!("Account {} not found", account_id))
    }

    async fn list_all_accounts(&self) -> Result<Vec<Account>> {
        let mut accounts = Vec::new();
        let mut paginator = self.organizations.list_accounts().into_paginator().send();

        while let Some(page) = paginator.next().await {
            let page = page.context("Failed to list organization accounts")?;
            for account in page.accounts() {
                match Account::from_sdk(account) {
                    Some(account) => accounts.push(account),
                    None => warn!("Ignoring organization account without an id"),
                }
            }
        }

        Ok(accounts)
    }
}

#[async_trait]
impl AccountDirectory for SdkAccountDirectory {
    async fn caller_account(&self) -> Result<Account, ReportError> {
        let account_id = self
            .caller_account_id()
            .await
            .map_err(|e| ReportError::auth("caller", format!("{:#}", e)))?;
        debug!("Caller identity resolved to account {}", account_id);

        match self.describe_account(&account_id).await {
            Ok(account) => Ok(account),
            Err(e) => {
                warn!(
                    "Could not look up the name of account {}, using its id instead: {:#}",
                    account_id, e
                );
                Ok(Account::from_id(&account_id))
            }
        }
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, ReportError> {
        let accounts = self
            .list_all_accounts()
            .await
            .map_err(|e| ReportError::api("organization", format!("{:#}", e)))?;
        info!("Organization lists {} accounts", accounts.len());
        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_position_matches_attributes() {
        assert_eq!(ACCOUNT_ATTRIBUTES[ACCOUNT_NAME_POSITION - 1], "Name");
    }

    #[test]
    fn test_from_id_uses_id_as_name() {
        let account = Account::from_id("123456789012");
        assert_eq!(account.name, "123456789012");
        assert!(account.email.is_none());
    }

    #[test]
    fn test_from_sdk_copies_native_attributes() {
        let sdk = organizations::types::Account::builder()
            .id("111111111111")
            .name("payments-prod")
            .email("payments@example.com")
            .arn("arn:aws:organizations::999999999999:account/o-abc/111111111111")
            .joined_method(organizations::types::AccountJoinedMethod::Created)
            .joined_timestamp(aws_smithy_types::DateTime::from_secs(1_700_000_000))
            .build();

        let account = Account::from_sdk(&sdk).unwrap();
        assert_eq!(account.id, "111111111111");
        assert_eq!(account.name, "payments-prod");
        assert_eq!(account.joined_method.as_deref(), Some("CREATED"));
        assert_eq!(
            account.joined_timestamp,
            DateTime::from_timestamp(1_700_000_000, 0)
        );
    }

    #[test]
    fn test_from_sdk_requires_id() {
        let sdk = organizations::types::Account::builder().name("orphan").build();
        assert!(Account::from_sdk(&sdk).is_none());
    }
}
