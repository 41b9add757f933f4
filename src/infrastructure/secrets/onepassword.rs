//! 1Password Connect adapter for credential resolution.
//!
//! Field references use the `vault/item/field` form. The username and
//! password references are independent reads against the Connect API, so
//! they resolve concurrently; everything downstream of them is strictly
//! sequential.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::Deserialize;

use crate::domain::errors::{Error, Result};
use crate::domain::models::{Credentials, OnePasswordConfig};
use crate::domain::ports::SecretsResolver;

#[derive(Debug, Deserialize)]
struct ItemResponse {
    #[serde(default)]
    fields: Vec<ItemField>,
}

#[derive(Debug, Deserialize)]
struct ItemField {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    value: Option<String>,
}

/// Parsed `vault/item/field` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldRef {
    vault: String,
    item: String,
    field: String,
}

fn parse_ref(raw: &str) -> Result<FieldRef> {
    let trimmed = raw.trim_start_matches("op://");
    let parts: Vec<&str> = trimmed.split('/').collect();
    match parts.as_slice() {
        [vault, item, field] if !vault.is_empty() && !item.is_empty() && !field.is_empty() => {
            Ok(FieldRef {
                vault: (*vault).to_string(),
                item: (*item).to_string(),
                field: (*field).to_string(),
            })
        }
        _ => Err(Error::Secrets(format!(
            "malformed field reference {raw:?}, expected vault/item/field"
        ))),
    }
}

/// Connect-backed resolver.
pub struct OnePasswordResolver {
    http: ReqwestClient,
    connect_url: String,
    token: String,
    username_ref: String,
    password_ref: String,
}

impl OnePasswordResolver {
    pub fn new(config: &OnePasswordConfig) -> anyhow::Result<Self> {
        let http = ReqwestClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build 1Password HTTP client")?;
        Ok(Self {
            http,
            connect_url: config.connect_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            username_ref: config.username_ref.clone(),
            password_ref: config.password_ref.clone(),
        })
    }

    async fn resolve_field(&self, raw_ref: &str) -> Result<String> {
        let field_ref = parse_ref(raw_ref)?;
        let url = format!(
            "{}/v1/vaults/{}/items/{}",
            self.connect_url, field_ref.vault, field_ref.item
        );
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|err| Error::Secrets(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Secrets(format!(
                "Connect returned {status} for item {}",
                field_ref.item
            )));
        }

        let item: ItemResponse = response
            .json()
            .await
            .map_err(|err| Error::Secrets(format!("malformed item response: {err}")))?;

        item.fields
            .into_iter()
            .find(|f| {
                f.label.as_deref() == Some(field_ref.field.as_str())
                    || f.id.as_deref() == Some(field_ref.field.as_str())
            })
            .and_then(|f| f.value)
            .ok_or_else(|| {
                Error::Secrets(format!(
                    "field {:?} not found on item {}",
                    field_ref.field, field_ref.item
                ))
            })
    }
}

#[async_trait]
impl SecretsResolver for OnePasswordResolver {
    async fn resolve(&self) -> Result<Credentials> {
        // Independent read-only lookups; order does not matter.
        let (username, password) = tokio::try_join!(
            self.resolve_field(&self.username_ref),
            self.resolve_field(&self.password_ref),
        )?;
        Ok(Credentials::new(username, password))
    }
}
