//! # GitHub Host Client / GitHub 托管平台客户端
//!
//! [`ChangeRequestHost`] over the GitHub REST API, plus the GraphQL mutation
//! that enables native auto-merge.
//!
//! 基于 GitHub REST API 的 [`ChangeRequestHost`] 实现，
//! 以及启用原生自动合并的 GraphQL 变更。

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::config::HostSettings;
use crate::core::remote::{
    ChangeRequest, ChangeRequestHost, MergeableState, OpenRequest, RequestState, RequestStatus,
};
use crate::error::{Result, SyncError};

const SERVICE: &str = "GitHub";
const PER_PAGE: usize = 100;

const ENABLE_AUTO_MERGE: &str = "mutation($input: EnablePullRequestAutoMergeInput!) {
  enablePullRequestAutoMerge(input: $input) { clientMutationId }
}";

#[derive(Debug, Deserialize)]
struct PullHead {
    sha: String,
    #[serde(rename = "ref")]
    git_ref: String,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    number: u64,
    #[serde(default)]
    node_id: String,
    #[serde(default)]
    html_url: String,
    head: PullHead,
    state: RequestState,
    #[serde(default)]
    merged: bool,
    #[serde(default)]
    mergeable: Option<bool>,
    #[serde(default)]
    mergeable_state: MergeableState,
}

#[derive(Debug, Deserialize)]
struct BranchResponse {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

pub struct GitHubClient {
    client: Client,
    api_url: String,
    web_url: String,
    owner: String,
    repository: String,
    token: String,
}

impl GitHubClient {
    pub fn new(settings: &HostSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("locsync/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| SyncError::remote(SERVICE, None, e.to_string()))?;
        Ok(Self {
            client,
            api_url: settings.api_url.trim_end_matches('/').to_string(),
            web_url: settings.git_url.trim_end_matches('/').to_string(),
            owner: settings.owner.clone(),
            repository: settings.repository.clone(),
            token: settings.token.clone(),
        })
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_url, self.owner, self.repository, path
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| SyncError::remote(SERVICE, e.status().map(|s| s.as_u16()), e.to_string()))?;
        check_status(response).await
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = self.send(request).await?;
        let status = response.status().as_u16();
        response
            .json::<T>()
            .await
            .map_err(|e| SyncError::remote(SERVICE, Some(status), format!("unexpected response body: {e}")))
    }

    async fn paginate<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let per_page = PER_PAGE.to_string();
        for page in 1.. {
            let page = page.to_string();
            let request = self
                .client
                .get(self.repo_url(path))
                .query(query)
                .query(&[("per_page", per_page.as_str()), ("page", page.as_str())]);
            let batch: Vec<T> = self.send_json(request).await?;
            let done = batch.len() < PER_PAGE;
            items.extend(batch);
            if done {
                break;
            }
        }
        Ok(items)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SyncError::remote(SERVICE, Some(status.as_u16()), body))
}

#[async_trait]
impl ChangeRequestHost for GitHubClient {
    async fn open_change_request(&self, title: &str, head: &str, base: &str) -> Result<ChangeRequest> {
        let request = self
            .client
            .post(self.repo_url("pulls"))
            .json(&json!({ "title": title, "head": head, "base": base }));
        let pull: PullResponse = self.send_json(request).await?;
        info!(number = pull.number, url = %pull.html_url, "Opened pull request");
        Ok(ChangeRequest {
            number: pull.number,
            node_id: pull.node_id,
            head_sha: pull.head.sha,
            url: pull.html_url,
        })
    }

    async fn status(&self, number: u64) -> Result<RequestStatus> {
        let request = self.client.get(self.repo_url(&format!("pulls/{number}")));
        let pull: PullResponse = self.send_json(request).await?;
        debug!(
            number,
            state = ?pull.state,
            mergeable = ?pull.mergeable,
            mergeable_state = ?pull.mergeable_state,
            "Pull request status"
        );
        Ok(RequestStatus {
            state: pull.state,
            merged: pull.merged,
            mergeable: pull.mergeable,
            mergeable_state: pull.mergeable_state,
        })
    }

    async fn merge(&self, number: u64, head_sha: &str) -> Result<()> {
        let request = self
            .client
            .put(self.repo_url(&format!("pulls/{number}/merge")))
            .json(&json!({ "sha": head_sha }));
        self.send(request).await?;
        Ok(())
    }

    async fn close(&self, number: u64) -> Result<()> {
        let request = self
            .client
            .patch(self.repo_url(&format!("pulls/{number}")))
            .json(&json!({ "state": "closed" }));
        self.send(request).await?;
        Ok(())
    }

    async fn delete_branch(&self, branch: &str) -> Result<()> {
        let request = self
            .client
            .delete(self.repo_url(&format!("git/refs/heads/{branch}")));
        match self.send(request).await {
            Ok(_) => Ok(()),
            // The host may have removed the branch on merge already.
            Err(SyncError::RemoteCallFailed {
                status: Some(status),
                ..
            }) if status == StatusCode::NOT_FOUND.as_u16()
                || status == StatusCode::UNPROCESSABLE_ENTITY.as_u16() =>
            {
                debug!(branch, "Branch already gone");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn list_open_requests(&self) -> Result<Vec<OpenRequest>> {
        let pulls: Vec<PullResponse> = self.paginate("pulls", &[("state", "open")]).await?;
        Ok(pulls
            .into_iter()
            .map(|pull| OpenRequest {
                number: pull.number,
                head_ref: pull.head.git_ref,
            })
            .collect())
    }

    async fn list_branches(&self) -> Result<Vec<String>> {
        let branches: Vec<BranchResponse> = self.paginate("branches", &[]).await?;
        Ok(branches.into_iter().map(|branch| branch.name).collect())
    }

    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<()> {
        let request = self
            .client
            .post(self.repo_url(&format!("issues/{number}/labels")))
            .json(&json!({ "labels": labels }));
        self.send(request).await?;
        Ok(())
    }

    async fn enable_auto_merge(&self, request: &ChangeRequest, author_email: &str) -> Result<()> {
        let body = json!({
            "query": ENABLE_AUTO_MERGE,
            "variables": {
                "input": {
                    "pullRequestId": request.node_id,
                    "authorEmail": author_email,
                }
            }
        });
        let http = self
            .client
            .post(format!("{}/graphql", self.api_url))
            .json(&body);
        let response: GraphQlResponse = self.send_json(http).await?;
        if let Some(error) = response.errors.first() {
            return Err(SyncError::remote(SERVICE, None, error.message.clone()));
        }
        Ok(())
    }

    fn request_link(&self, number: u64) -> String {
        format!(
            "{}/{}/{}/pull/{}",
            self.web_url, self.owner, self.repository, number
        )
    }
}
