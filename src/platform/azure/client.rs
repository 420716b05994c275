use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::{AzureEnvironment, HttpSettings};
use crate::error::{AppError, Result};
use crate::platform::context::{is_pull_request_ref, pull_request_number_from_ref};
use crate::platform::types::*;
use crate::platform::CommentPublisher;

const API_VERSION: &str = "7.1";

#[derive(Debug, Deserialize)]
struct GitRepository {
    id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ThreadComment<'a> {
    content: &'a str,
    comment_type: &'static str,
}

#[derive(Debug, Serialize)]
struct CommentThread<'a> {
    comments: Vec<ThreadComment<'a>>,
    status: &'static str,
}

/// Posts pull request threads through the Azure DevOps Git REST API.
pub struct AzureDevOpsPublisher {
    client: Client,
    organization_url: Option<String>,
    project: Option<String>,
    repository: Option<String>,
    source_branch: Option<String>,
}

impl AzureDevOpsPublisher {
    pub fn new(azure: &AzureEnvironment, http: &HttpSettings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(http.connect_timeout)
            .timeout(http.request_timeout)
            .build()?;

        Ok(Self {
            client,
            organization_url: azure
                .collection_uri
                .as_deref()
                .map(|url| url.trim_end_matches('/').to_string()),
            project: azure.team_project.clone(),
            repository: azure.repository_name.clone(),
            source_branch: azure.source_branch.clone(),
        })
    }

    fn project_url(&self, organization_url: &str, project: &str) -> String {
        format!("{organization_url}/{}/_apis/git", urlencoding::encode(project))
    }

    async fn get_repository(&self, project_url: &str, name: &str, token: &str) -> Result<GitRepository> {
        let url = format!(
            "{project_url}/repositories/{}?api-version={API_VERSION}",
            urlencoding::encode(name)
        );

        let response = self
            .client
            .get(&url)
            .basic_auth("", Some(token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::AzureDevOpsApi(format!(
                "Repository lookup for '{name}' returned {status}: {body}"
            )));
        }

        Ok(response.json::<GitRepository>().await?)
    }

    async fn create_thread(
        &self,
        project_url: &str,
        repository_id: &str,
        pull_request_id: u64,
        comment: &str,
        token: &str,
    ) -> Result<serde_json::Value> {
        let url = format!(
            "{project_url}/repositories/{repository_id}/pullRequests/{pull_request_id}/threads?api-version={API_VERSION}"
        );
        let thread = CommentThread {
            comments: vec![ThreadComment {
                content: comment,
                comment_type: "system",
            }],
            status: "closed",
        };

        let response = self
            .client
            .post(&url)
            .basic_auth("", Some(token))
            .json(&thread)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::AzureDevOpsApi(format!(
                "Thread creation returned {status}: {body}"
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CommentPublisher for AzureDevOpsPublisher {
    async fn post_comment(&self, comment: &str, context: &CommentContext) -> CommentResult {
        let source_branch = self.source_branch.as_deref().unwrap_or_default();
        let pull_request_id = is_pull_request_ref(source_branch)
            .then(|| pull_request_number_from_ref(source_branch))
            .flatten();
        let Some(pull_request_id) = pull_request_id else {
            let text = format!("This is not a pull request - aborting comment - {source_branch}");
            tracing::info!("{text}");
            return CommentResult::failure(text);
        };

        let (Some(organization_url), Some(project), Some(repository)) = (
            self.organization_url.as_deref(),
            self.project.as_deref(),
            self.repository.as_deref(),
        ) else {
            return CommentResult::failure(
                "Missing Azure DevOps context: SYSTEM_COLLECTIONURI, SYSTEM_TEAMPROJECT and BUILD_REPOSITORY_NAME are required",
            );
        };

        let project_url = self.project_url(organization_url, project);
        let result = async {
            let repo = self
                .get_repository(&project_url, repository, &context.token)
                .await?;
            self.create_thread(&project_url, &repo.id, pull_request_id, comment, &context.token)
                .await
        }
        .await;

        match result {
            Ok(thread) => {
                tracing::debug!(thread = %thread, "Created pull request thread");
                CommentResult::created()
            }
            Err(e) => {
                let text = format!("Error creating thread: {e}");
                tracing::error!("{text}");
                CommentResult::failure(text)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{basic_auth, body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn azure(uri: &str, source_branch: &str) -> AzureEnvironment {
        AzureEnvironment {
            collection_uri: Some(format!("{uri}/acme/")),
            team_project: Some("Firmware Team".to_string()),
            repository_name: Some("firmware".to_string()),
            source_branch: Some(source_branch.to_string()),
        }
    }

    fn context() -> CommentContext {
        CommentContext {
            token: "pat".to_string(),
            pull_request: PrContext::default(),
        }
    }

    #[tokio::test]
    async fn test_non_pull_request_ref_short_circuits() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let publisher = AzureDevOpsPublisher::new(
            &azure(&mock_server.uri(), "refs/heads/main"),
            &HttpSettings::default(),
        )
        .unwrap();
        let result = publisher.post_comment("hello", &context()).await;

        assert_eq!(
            result,
            CommentResult::failure("This is not a pull request - aborting comment - refs/heads/main")
        );
    }

    #[tokio::test]
    async fn test_creates_closed_system_thread() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/acme/Firmware%20Team/_apis/git/repositories/firmware"))
            .and(query_param("api-version", API_VERSION))
            .and(basic_auth("", "pat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "3f1c2b7e-repo",
                "name": "firmware"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path(
                "/acme/Firmware%20Team/_apis/git/repositories/3f1c2b7e-repo/pullRequests/42/threads",
            ))
            .and(body_json(serde_json::json!({
                "comments": [{ "content": "hello", "commentType": "system" }],
                "status": "closed"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": 11 })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let publisher = AzureDevOpsPublisher::new(
            &azure(&mock_server.uri(), "refs/pull/42/merge"),
            &HttpSettings::default(),
        )
        .unwrap();
        let result = publisher.post_comment("hello", &context()).await;

        assert_eq!(result, CommentResult::created());
    }

    #[tokio::test]
    async fn test_remote_failure_becomes_500() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&mock_server)
            .await;

        let publisher = AzureDevOpsPublisher::new(
            &azure(&mock_server.uri(), "refs/pull/42/merge"),
            &HttpSettings::default(),
        )
        .unwrap();
        let result = publisher.post_comment("hello", &context()).await;

        assert_eq!(result.status_code, 500);
        let text = result.text.unwrap();
        assert!(text.starts_with("Error creating thread:"));
        assert!(text.contains("401"));
    }

    #[tokio::test]
    async fn test_missing_project_is_failure() {
        let mut env = azure("http://127.0.0.1:9", "refs/pull/42/merge");
        env.team_project = None;

        let publisher = AzureDevOpsPublisher::new(&env, &HttpSettings::default()).unwrap();
        let result = publisher.post_comment("hello", &context()).await;

        assert_eq!(result.status_code, 500);
        assert!(result.text.unwrap().contains("SYSTEM_TEAMPROJECT"));
    }
}
