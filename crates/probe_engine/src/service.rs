use std::time::Duration;

use probe_core::{CheckError, FailureKind, Verdict};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://login.microsoftonline.com/common/GetCredentialType";

/// Answers whether a single identifier is known to the remote service.
#[async_trait::async_trait]
pub trait ValidationService: Send + Sync {
    async fn check(&self, identifier: &str) -> Result<Verdict, CheckError>;
}

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub endpoint: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid endpoint {endpoint}: {message}")]
    InvalidEndpoint { endpoint: String, message: String },
    #[error("cannot build http client: {0}")]
    Client(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CredentialTypeRequest<'a> {
    username: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct CredentialTypeResponse {
    if_exists_result: Option<i64>,
    display: Option<String>,
    is_unmanaged: bool,
    throttle_status: i64,
    is_signup_disallowed: bool,
}

impl CredentialTypeResponse {
    fn into_verdict(self) -> Result<Verdict, CheckError> {
        let exists = self.if_exists_result.ok_or_else(|| {
            CheckError::new(FailureKind::MalformedResponse, "missing IfExistsResult")
        })?;
        Ok(Verdict {
            // 0 means the account exists.
            valid: exists == 0,
            display: self.display.filter(|display| !display.is_empty()),
            is_unmanaged: self.is_unmanaged,
            throttle_status: (self.throttle_status != 0).then_some(self.throttle_status),
            is_signup_disallowed: self.is_signup_disallowed,
        })
    }
}

/// Checks identifiers against a credential-type lookup endpoint over HTTPS.
#[derive(Debug, Clone)]
pub struct CredentialTypeService {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl CredentialTypeService {
    pub fn new(settings: ServiceSettings) -> Result<Self, ServiceError> {
        let endpoint =
            reqwest::Url::parse(&settings.endpoint).map_err(|err| ServiceError::InvalidEndpoint {
                endpoint: settings.endpoint.clone(),
                message: err.to_string(),
            })?;

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ServiceError::Client(err.to_string()))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}

#[async_trait::async_trait]
impl ValidationService for CredentialTypeService {
    async fn check(&self, identifier: &str) -> Result<Verdict, CheckError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&CredentialTypeRequest {
                username: identifier,
            })
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CheckError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let parsed: CredentialTypeResponse = serde_json::from_slice(&body)
            .map_err(|err| CheckError::new(FailureKind::MalformedResponse, err.to_string()))?;
        parsed.into_verdict()
    }
}

fn map_reqwest_error(err: reqwest::Error) -> CheckError {
    if err.is_timeout() {
        return CheckError::new(FailureKind::Timeout, err.to_string());
    }
    CheckError::new(FailureKind::Network, err.to_string())
}
