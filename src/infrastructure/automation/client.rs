//! HTTP adapter for the browser-automation service.
//!
//! Implements the [`BrowserDriver`] and [`PageHandle`] ports against the
//! automation service's REST API. Sessions are remote browser contexts;
//! pages are addressed by tab index within a session.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::domain::errors::{Error, Result};
use crate::domain::models::AutomationConfig;
use crate::domain::ports::{
    ActTarget, BrowserDriver, BrowserSession, ObservedElement, PageHandle, WaitPolicy,
};

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    profile: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    id: String,
    #[serde(default)]
    debug_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PagesResponse {
    pages: Vec<PageInfo>,
}

#[derive(Debug, Deserialize)]
struct PageInfo {
    index: usize,
    #[allow(dead_code)]
    url: String,
}

#[derive(Debug, Serialize)]
struct GotoRequest<'a> {
    url: &'a str,
    wait_until: &'a str,
}

#[derive(Debug, Serialize)]
struct ObserveRequest<'a> {
    instruction: &'a str,
}

#[derive(Debug, Deserialize)]
struct ObserveResponse {
    #[serde(default)]
    elements: Vec<ObservedElement>,
}

/// Act requests carry either a previously observed element (replayed
/// without another model round-trip) or a natural-language instruction.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
enum ActRequest<'a> {
    Element(&'a ObservedElement),
    Instruction(&'a str),
}

#[derive(Debug, Serialize)]
struct ExtractRequest<'a> {
    instruction: &'a str,
    schema: Value,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    data: Value,
}

#[derive(Debug, Serialize)]
struct FillRequest<'a> {
    selector: &'a str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct VisibleRequest<'a> {
    selector: &'a str,
}

#[derive(Debug, Deserialize)]
struct VisibleResponse {
    visible: bool,
}

#[derive(Debug, Deserialize)]
struct UrlResponse {
    url: String,
}

/// Driver adapter over the automation service's REST API.
pub struct AutomationClient {
    http: ReqwestClient,
    base_url: String,
    api_key: String,
}

impl AutomationClient {
    pub fn new(config: &AutomationConfig) -> anyhow::Result<Self> {
        let http = ReqwestClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build automation HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn page_url(&self, session: &str, index: usize, op: &str) -> String {
        format!("{}/v1/sessions/{session}/pages/{index}/{op}", self.base_url)
    }

    async fn post_json<B: Serialize>(&self, url: &str, body: &B) -> Result<reqwest::Response> {
        let response = self
            .http
            .post(url)
            .header("x-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| Error::Automation(err.to_string()))?;
        check_status(response).await
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .http
            .get(url)
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|err| Error::Automation(err.to_string()))?;
        check_status(response).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Automation(format!(
        "automation service returned {status}: {body}"
    )))
}

#[async_trait]
impl BrowserDriver for AutomationClient {
    async fn create_session(&self, profile: &str) -> Result<BrowserSession> {
        let url = format!("{}/v1/sessions", self.base_url);
        let response = self
            .post_json(&url, &CreateSessionRequest { profile })
            .await?;
        let created: CreateSessionResponse = response
            .json()
            .await
            .map_err(|err| Error::Automation(format!("malformed session response: {err}")))?;
        debug!(session = %created.id, "session created");
        Ok(BrowserSession {
            id: created.id,
            debug_url: created.debug_url,
        })
    }

    async fn close_session(&self, session: &BrowserSession) -> Result<()> {
        let url = format!("{}/v1/sessions/{}", self.base_url, session.id);
        let response = self
            .http
            .delete(&url)
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(|err| Error::Automation(err.to_string()))?;
        check_status(response).await.map(|_| ())
    }

    async fn pages(&self, session: &BrowserSession) -> Result<Vec<Arc<dyn PageHandle>>> {
        let url = format!("{}/v1/sessions/{}/pages", self.base_url, session.id);
        let response = self.get(&url).await?;
        let listed: PagesResponse = response
            .json()
            .await
            .map_err(|err| Error::Automation(format!("malformed pages response: {err}")))?;
        Ok(listed
            .pages
            .into_iter()
            .map(|info| {
                Arc::new(AutomationPage {
                    client: self.clone_for_page(),
                    session_id: session.id.clone(),
                    index: info.index,
                }) as Arc<dyn PageHandle>
            })
            .collect())
    }
}

impl AutomationClient {
    fn clone_for_page(&self) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

/// One remote page, addressed by session and tab index.
struct AutomationPage {
    client: AutomationClient,
    session_id: String,
    index: usize,
}

#[async_trait]
impl PageHandle for AutomationPage {
    async fn url(&self) -> Result<String> {
        let url = self.client.page_url(&self.session_id, self.index, "url");
        let response = self.client.get(&url).await?;
        let parsed: UrlResponse = response
            .json()
            .await
            .map_err(|err| Error::Automation(format!("malformed url response: {err}")))?;
        Ok(parsed.url)
    }

    async fn navigate(&self, target: &str, wait: WaitPolicy) -> Result<()> {
        let wait_until = match wait {
            WaitPolicy::Load => "load",
            WaitPolicy::NetworkIdle => "networkidle",
        };
        let url = self.client.page_url(&self.session_id, self.index, "goto");
        let response = self
            .client
            .http
            .post(&url)
            .header("x-api-key", &self.client.api_key)
            .json(&GotoRequest {
                url: target,
                wait_until,
            })
            .send()
            .await
            .map_err(|err| Error::Automation(err.to_string()))?;

        // The service answers 504 when the wait condition never settled.
        // Under a network-idle policy callers tolerate that.
        if response.status() == StatusCode::GATEWAY_TIMEOUT
            && matches!(wait, WaitPolicy::NetworkIdle)
        {
            return Err(Error::NavigationTimeout {
                url: target.to_string(),
            });
        }
        check_status(response).await.map(|_| ())
    }

    async fn observe(&self, query: &str) -> Result<Vec<ObservedElement>> {
        let url = self.client.page_url(&self.session_id, self.index, "observe");
        let response = self
            .client
            .post_json(&url, &ObserveRequest { instruction: query })
            .await?;
        let observed: ObserveResponse = response
            .json()
            .await
            .map_err(|err| Error::Automation(format!("malformed observe response: {err}")))?;
        Ok(observed.elements)
    }

    async fn act(&self, target: ActTarget) -> Result<()> {
        let url = self.client.page_url(&self.session_id, self.index, "act");
        let body = match &target {
            ActTarget::Structured(element) => ActRequest::Element(element),
            ActTarget::Fallback(instruction) => ActRequest::Instruction(instruction),
        };
        self.client.post_json(&url, &body).await.map(|_| ())
    }

    async fn extract(&self, instruction: &str, schema: Value) -> Result<Value> {
        let url = self.client.page_url(&self.session_id, self.index, "extract");
        let response = self
            .client
            .post_json(&url, &ExtractRequest { instruction, schema })
            .await?;
        let extracted: ExtractResponse = response
            .json()
            .await
            .map_err(|err| Error::Extraction(format!("malformed extract response: {err}")))?;
        Ok(extracted.data)
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        let url = self.client.page_url(&self.session_id, self.index, "fill");
        self.client
            .post_json(&url, &FillRequest { selector, value })
            .await
            .map(|_| ())
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        let url = self.client.page_url(&self.session_id, self.index, "visible");
        let response = self
            .client
            .post_json(&url, &VisibleRequest { selector })
            .await?;
        let parsed: VisibleResponse = response
            .json()
            .await
            .map_err(|err| Error::Automation(format!("malformed visible response: {err}")))?;
        Ok(parsed.visible)
    }
}
