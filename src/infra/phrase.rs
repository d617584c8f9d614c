//! # Phrase Translation Provider / Phrase 翻译服务
//!
//! [`TranslationProvider`] over the Phrase Strings API v2. Files travel in the
//! `i18next` format, which for our flat documents is a plain JSON object.
//!
//! 基于 Phrase Strings API v2 的 [`TranslationProvider`] 实现。
//! 文件使用 `i18next` 格式传输，对于扁平文档即为普通 JSON 对象。

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::core::config::ProviderSettings;
use crate::core::models::{RemoteSnapshot, TranslationMap};
use crate::core::remote::TranslationProvider;
use crate::error::{Result, SyncError};

const SERVICE: &str = "Phrase";
const FILE_FORMAT: &str = "i18next";
const DEFAULT_CONSOLE_URL: &str = "https://app.phrase.com";

pub struct PhraseClient {
    client: Client,
    api_url: String,
    console_url: String,
    project_id: String,
    token: String,
}

impl PhraseClient {
    pub fn new(settings: &ProviderSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("locsync/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| SyncError::remote(SERVICE, None, e.to_string()))?;
        let console_url = settings.console_url.clone().unwrap_or_else(|| {
            format!("{DEFAULT_CONSOLE_URL}/projects/{}", settings.project_id)
        });
        Ok(Self {
            client,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            console_url: console_url.trim_end_matches('/').to_string(),
            project_id: settings.project_id.clone(),
            token: settings.token.clone(),
        })
    }

    fn project_url(&self, path: &str) -> String {
        format!("{}/v2/projects/{}/{}", self.api_url, self.project_id, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .header(reqwest::header::AUTHORIZATION, format!("token {}", self.token))
            .send()
            .await
            .map_err(|e| SyncError::remote(SERVICE, e.status().map(|s| s.as_u16()), e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SyncError::remote(SERVICE, Some(status.as_u16()), body))
    }
}

#[async_trait]
impl TranslationProvider for PhraseClient {
    async fn fetch_snapshot(&self, locale_id: &str) -> Result<RemoteSnapshot> {
        let request = self
            .client
            .get(self.project_url(&format!("locales/{locale_id}/download")))
            .query(&[("file_format", FILE_FORMAT)]);
        let response = self.send(request).await?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| SyncError::remote(SERVICE, Some(status), e.to_string()))?;
        let entries = TranslationMap::from_json_str(&body).map_err(|reason| {
            SyncError::remote(SERVICE, Some(status), format!("unexpected download body: {reason}"))
        })?;
        debug!(locale_id, keys = entries.len(), "Downloaded locale");
        Ok(RemoteSnapshot::new(locale_id, entries))
    }

    async fn upload(&self, locale_id: &str, tag: &str, file: &Path) -> Result<()> {
        let bytes = tokio::fs::read(file).await?;
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{tag}.json"));
        let form = Form::new()
            .text("autotranslate", "true")
            .text("file_format", FILE_FORMAT)
            .text("skip_upload_tags", "true")
            .text("tags", tag.to_string())
            .text("locale_id", locale_id.to_string())
            .part("file", Part::bytes(bytes).file_name(file_name));

        let request = self.client.post(self.project_url("uploads")).multipart(form);
        self.send(request).await?;
        info!(locale_id, tag, path = %file.display(), "Uploaded namespace file");
        Ok(())
    }

    async fn delete_key(&self, key: &str) -> Result<()> {
        let request = self
            .client
            .delete(self.project_url("keys"))
            .json(&json!({ "q": format!("name:{key}") }));
        self.send(request).await?;
        Ok(())
    }

    async fn delete_all(&self, locale_id: &str) -> Result<()> {
        let request = self
            .client
            .delete(self.project_url("keys"))
            .json(&json!({ "locale_id": locale_id }));
        self.send(request).await?;
        Ok(())
    }

    fn key_link(&self, key: &str) -> String {
        let base = format!("{}/keys", self.console_url);
        Url::parse_with_params(&base, &[("translation_key_search[query]", key)])
            .map(String::from)
            .unwrap_or(base)
    }
}
