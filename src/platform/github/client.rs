use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::config::HttpSettings;
use crate::error::Result;
use crate::platform::types::*;
use crate::platform::CommentPublisher;

const USER_AGENT: &str = concat!("finite-state-upload/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct CreateComment<'a> {
    body: &'a str,
}

/// Posts issue comments through the GitHub REST API.
pub struct GitHubPublisher {
    client: Client,
    api_url: String,
}

impl GitHubPublisher {
    pub fn new(api_url: &str, http: &HttpSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(http.connect_timeout)
            .timeout(http.request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    fn comments_url(&self, owner: &str, repo: &str, pr_number: u64) -> String {
        format!(
            "{}/repos/{owner}/{repo}/issues/{pr_number}/comments",
            self.api_url
        )
    }
}

#[async_trait]
impl CommentPublisher for GitHubPublisher {
    async fn post_comment(&self, comment: &str, context: &CommentContext) -> CommentResult {
        let pr = &context.pull_request;
        let (Some(pr_number), Some(owner), Some(repo)) =
            (pr.pr_number, pr.repo_owner.as_deref(), pr.repo_name.as_deref())
        else {
            return CommentResult::failure(format!(
                "Missing pull request context (number: {:?}, owner: {:?}, repository: {:?})",
                pr.pr_number, pr.repo_owner, pr.repo_name
            ));
        };

        let url = self.comments_url(owner, repo, pr_number);
        tracing::debug!(url = %url, "Posting GitHub comment");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("token {}", context.token))
            .header("Accept", "application/vnd.github.v3+json")
            .json(&CreateComment { body: comment })
            .send()
            .await;

        match response {
            Ok(response) => {
                let status_code = response.status().as_u16();
                let text = response.text().await.ok().filter(|t| !t.is_empty());
                CommentResult { status_code, text }
            }
            Err(e) => CommentResult::failure(format!("Failed to post comment: {e}")),
        }
    }
}
