//! Per-account access to the Health API.
//!
//! Without a role the caller's ambient identity is used as is. With a role the
//! resolver assumes `arn:aws:iam::<account>:role/<role>` through STS and builds
//! a Health client from the temporary credentials. Credentials are never cached
//! or written anywhere; they live as long as the client built from them.

#![warn(clippy::all, rust_2018_idioms)]

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_sts::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_sts::Client as StsClient;
use aws_types::region::Region;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::error::ReportError;
use super::health::{HealthApi, SdkHealthApi, HEALTH_REGION};

/// Temporary credentials obtained by assuming a role in one account
#[derive(Debug, Clone)]
pub struct AccountCredentials {
    pub account_id: String,
    pub role_name: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

impl AccountCredentials {
    /// Check if credentials are expired or will expire within the next 5 minutes
    pub fn is_expired(&self) -> bool {
        let now = Utc::now();
        let buffer = chrono::Duration::minutes(5);
        now + buffer >= self.expiration
    }

    /// Create AWS SDK Credentials from this account's credentials
    pub fn to_aws_credentials(&self) -> Credentials {
        Credentials::new(
            &self.access_key_id,
            &self.secret_access_key,
            Some(self.session_token.clone()),
            Some(self.expiration.into()),
            "healthreport-assume-role",
        )
    }
}

/// IAM role ARN for `role_name` in `account_id`.
pub fn role_arn(account_id: &str, role_name: &str) -> String {
    format!("arn:aws:iam::{}:role/{}", account_id, role_name)
}

/// STS session name used when assuming a role in `account_id`.
pub fn session_name(account_id: &str) -> String {
    format!("session_{}", account_id)
}

/// Produces a Health API client scoped to one account.
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// Ambient identity when `role_name` is `None`, otherwise the assumed role.
    ///
    /// Errors are always [`ReportError::Auth`] for `account_id`.
    async fn resolve(
        &self,
        account_id: &str,
        role_name: Option<&str>,
    ) -> Result<Arc<dyn HealthApi>, ReportError>;
}

/// [`CredentialResolver`] backed by the ambient SDK config and STS `AssumeRole`.
pub struct StsCredentialResolver {
    base_config: aws_config::SdkConfig,
    sts: StsClient,
}

impl StsCredentialResolver {
    pub fn new(base_config: aws_config::SdkConfig) -> Self {
        let sts = StsClient::new(&base_config);
        Self { base_config, sts }
    }

    async fn assume_role(&self, account_id: &str, role_name: &str) -> Result<AccountCredentials> {
        let arn = role_arn(account_id, role_name);
        debug!("Assuming role {} for account {}", arn, account_id);

        let response = self
            .sts
            .assume_role()
            .role_arn(&arn)
            .role_session_name(session_name(account_id))
            .send()
            .await
            .map_err(|e| {
                let code = e.code().unwrap_or("Unknown").to_string();
                let message = e
                    .message()
                    .map(str::to_string)
                    .unwrap_or_else(|| DisplayErrorContext(&e).to_string());
                anyhow::anyhow!("{} ({})", message, code)
            })
            .with_context(|| format!("While assuming role {}", arn))?;

        let credentials = response
            .credentials()
            .context("AssumeRole returned no credentials")?;
        let expiration = credentials.expiration();

        Ok(AccountCredentials {
            account_id: account_id.to_string(),
            role_name: role_name.to_string(),
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expiration: DateTime::from_timestamp(expiration.secs(), expiration.subsec_nanos())
                .context("AssumeRole returned an invalid expiration")?,
        })
    }

    async fn health_config_for(&self, creds: &AccountCredentials) -> aws_config::SdkConfig {
        aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(HEALTH_REGION))
            .credentials_provider(creds.to_aws_credentials())
            .load()
            .await
    }
}

#[async_trait]
impl CredentialResolver for StsCredentialResolver {
    async fn resolve(
        &self,
        account_id: &str,
        role_name: Option<&str>,
    ) -> Result<Arc<dyn HealthApi>, ReportError> {
        let Some(role_name) = role_name else {
            let config = self
                .base_config
                .to_builder()
                .region(Region::new(HEALTH_REGION))
                .build();
            return Ok(Arc::new(SdkHealthApi::new(&config)));
        };

        let creds = self
            .assume_role(account_id, role_name)
            .await
            .map_err(|e| ReportError::auth(account_id, format!("{:#}", e)))?;

        if creds.is_expired() {
            return Err(ReportError::auth(
                account_id,
                format!("credentials for role {} expired on arrival", role_name),
            ));
        }

        let config = self.health_config_for(&creds).await;
        debug!(
            "Health client ready for account {} using role {}",
            creds.account_id, creds.role_name
        );
        Ok(Arc::new(SdkHealthApi::new(&config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials_expiring_at(expiration: DateTime<Utc>) -> AccountCredentials {
        AccountCredentials {
            account_id: "123456789012".to_string(),
            role_name: "HealthReader".to_string(),
            access_key_id: "ASIA...".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: "token".to_string(),
            expiration,
        }
    }

    #[test]
    fn test_account_credentials_expiration() {
        let valid = credentials_expiring_at(Utc::now() + chrono::Duration::hours(1));
        let expired = credentials_expiring_at(Utc::now() - chrono::Duration::hours(1));
        let soon = credentials_expiring_at(Utc::now() + chrono::Duration::minutes(2));

        assert!(!valid.is_expired());
        assert!(expired.is_expired());
        assert!(soon.is_expired()); // inside the 5-minute buffer
    }

    #[test]
    fn test_role_arn_and_session_name() {
        assert_eq!(
            role_arn("222222222222", "OrganizationHealthRead"),
            "arn:aws:iam::222222222222:role/OrganizationHealthRead"
        );
        assert_eq!(session_name("222222222222"), "session_222222222222");
    }

    #[test]
    fn test_to_aws_credentials_keeps_session_token() {
        let creds = credentials_expiring_at(Utc::now() + chrono::Duration::hours(1));
        let sdk = creds.to_aws_credentials();
        assert_eq!(sdk.access_key_id(), "ASIA...");
        assert_eq!(sdk.session_token(), Some("token"));
        assert!(sdk.expiry().is_some());
    }
}
