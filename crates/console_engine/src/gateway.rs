use console_core::{DocumentEntry, StageActionRequest, StageActionResponse};
use console_logging::{console_debug, console_warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Method;
use serde_json::{Map, Value};

use crate::{GatewayError, GatewaySettings};

pub const PROGRESS_PATH: &str = "api/documents/progress";

#[async_trait::async_trait]
pub trait ApiGateway: Send + Sync {
    async fn fetch_progress(&self) -> Result<Vec<DocumentEntry>, GatewayError>;

    async fn submit_stage(
        &self,
        request: &StageActionRequest,
    ) -> Result<StageActionResponse, GatewayError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestGateway {
    settings: GatewaySettings,
    client: reqwest::Client,
}

impl ReqwestGateway {
    pub fn new(settings: GatewaySettings) -> Result<Self, GatewayError> {
        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| GatewayError::Network(err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Issues a request and returns its JSON body.
    ///
    /// The body is always read as text first. A non-success status fails with
    /// that text (or the status text when it is empty). A success body that is
    /// not valid JSON yields an empty object instead of an error.
    pub async fn fetch_json(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, GatewayError> {
        let url = self.settings.endpoint(path)?;
        console_debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method, url)
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            let encoded =
                serde_json::to_vec(body).map_err(|err| GatewayError::Decode(err.to_string()))?;
            request = request.header(CONTENT_TYPE, "application/json").body(encoded);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        let text = String::from_utf8_lossy(&bytes);

        if !status.is_success() {
            let message = if text.trim().is_empty() {
                status
                    .canonical_reason()
                    .map(str::to_string)
                    .unwrap_or_else(|| status.to_string())
            } else {
                text.into_owned()
            };
            return Err(GatewayError::Http {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_str(&text).unwrap_or_else(|err| {
            console_warn!("Ignoring malformed JSON body from {}: {}", path, err);
            Value::Object(Map::new())
        }))
    }
}

#[async_trait::async_trait]
impl ApiGateway for ReqwestGateway {
    async fn fetch_progress(&self) -> Result<Vec<DocumentEntry>, GatewayError> {
        let value = self.fetch_json(Method::GET, PROGRESS_PATH, None).await?;
        if !value.is_array() {
            console_warn!("Progress payload is not a list; treating it as empty");
            return Ok(Vec::new());
        }
        serde_json::from_value(value).map_err(|err| GatewayError::Decode(err.to_string()))
    }

    async fn submit_stage(
        &self,
        request: &StageActionRequest,
    ) -> Result<StageActionResponse, GatewayError> {
        let body = serde_json::to_value(&request.payload)
            .map_err(|err| GatewayError::Decode(err.to_string()))?;
        let value = self
            .fetch_json(Method::POST, &request.path(), Some(&body))
            .await?;
        Ok(serde_json::from_value(value).unwrap_or_else(|err| {
            console_warn!("Stage response has an unexpected shape: {}", err);
            StageActionResponse::default()
        }))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        return GatewayError::Network(format!("request timed out: {err}"));
    }
    GatewayError::Network(err.to_string())
}
