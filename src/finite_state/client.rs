use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::HttpSettings;
use crate::error::{AppError, Result};

use super::queries;
use super::types::*;
use super::AnalysisPlatform;

pub const API_URL: &str = "https://platform.finitestate.io/api/v1/graphql";
pub const TOKEN_URL: &str = "https://platform.finitestate.io/api/v1/auth/token";
const AUDIENCE: &str = API_URL;

/// Files are uploaded in parts of at most this many bytes.
const DEFAULT_CHUNK_SIZE: u64 = 5 * 1024 * 1024 * 1024;

pub(crate) const BINARY_ANALYSIS_TEST_TYPE: &str = "finite_state_binary_analysis";

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    audience: &'a str,
    grant_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: &'a Value,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Value,
    #[serde(default)]
    errors: Option<Value>,
}

pub(crate) struct NewArtifact<'a> {
    pub business_unit_id: &'a str,
    pub created_by_user_id: &'a str,
    pub asset_version_id: &'a str,
    pub name: &'a str,
    pub product_ids: &'a [String],
}

pub(crate) struct NewTest<'a> {
    pub business_unit_id: &'a str,
    pub created_by_user_id: &'a str,
    pub asset_id: &'a str,
    pub artifact_id: &'a str,
    pub name: &'a str,
    pub test_type: &'a str,
    pub tools: Vec<TestTool>,
    pub upload_method: UploadMethod,
    pub product_id: Option<&'a str>,
}

/// Client for the Finite State GraphQL API.
pub struct FiniteStateClient {
    pub(crate) client: Client,
    api_url: String,
    token_url: String,
    pub(crate) chunk_size: u64,
    pub(crate) upload_timeout: Duration,
}

impl FiniteStateClient {
    pub fn new(http: &HttpSettings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(http.connect_timeout)
            .timeout(http.request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: API_URL.to_string(),
            token_url: TOKEN_URL.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            upload_timeout: http.upload_timeout,
        })
    }

    /// Point the client at a different API and token endpoint.
    pub fn with_endpoints(mut self, api_url: impl Into<String>, token_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self.token_url = token_url.into();
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Exchange client credentials for a bearer token.
    pub async fn request_auth_token(&self, client_id: &str, client_secret: &str) -> Result<String> {
        let payload = TokenRequest {
            client_id,
            client_secret,
            audience: AUDIENCE,
            grant_type: "client_credentials",
        };

        let response = self
            .client
            .post(&self.token_url)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!("Error: {} - {body}", status.as_u16())));
        }

        response
            .json::<TokenResponse>()
            .await?
            .access_token
            .ok_or_else(|| AppError::Auth("No access_token in token response".to_string()))
    }

    /// Run a GraphQL document and return its `data` (`null` when absent).
    pub async fn send_graphql_query(
        &self,
        token: &str,
        organization_context: &str,
        query: &str,
        variables: &Value,
    ) -> Result<Value> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(token)
            .header("Organization-Context", organization_context)
            .json(&GraphqlRequest { query, variables })
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::FiniteStateApi(format!(
                "Error: {} - {body}",
                status.as_u16()
            )));
        }

        let body = response.json::<GraphqlResponse>().await?;
        if let Some(errors) = body.errors.filter(|e| !e.is_null()) {
            return Err(AppError::FiniteStateApi(format!("Error: {errors}")));
        }

        Ok(body.data)
    }

    /// Run a mutation and decode its `data` into `T`.
    pub(crate) async fn mutate<T: DeserializeOwned>(
        &self,
        token: &str,
        organization_context: &str,
        query: &str,
        variables: Value,
    ) -> Result<T> {
        let data = self
            .send_graphql_query(token, organization_context, query, &variables)
            .await?;
        Ok(serde_json::from_value(data)?)
    }

    /// Follow `_cursor` pagination on `field` until a page comes back empty.
    pub async fn get_all_paginated_results(
        &self,
        token: &str,
        organization_context: &str,
        query: &str,
        mut variables: Value,
        field: &str,
    ) -> Result<Vec<Value>> {
        let mut data = self
            .send_graphql_query(token, organization_context, query, &variables)
            .await?;
        if data.is_null() {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        loop {
            let page = data
                .get(field)
                .and_then(Value::as_array)
                .ok_or_else(|| AppError::UnexpectedResponse(format!("{field} not in response JSON")))?;
            results.extend(page.iter().cloned());

            let cursor = page
                .last()
                .and_then(|item| item.get("_cursor"))
                .and_then(Value::as_str)
                .map(str::to_string);
            let Some(cursor) = cursor else {
                break;
            };

            variables["after"] = Value::String(cursor);
            data = self
                .send_graphql_query(token, organization_context, query, &variables)
                .await?;
        }

        Ok(results)
    }

    pub async fn get_all_assets(
        &self,
        token: &str,
        organization_context: &str,
        asset_id: Option<&str>,
        business_unit_id: Option<&str>,
    ) -> Result<Vec<Asset>> {
        let assets = self
            .get_all_paginated_results(
                token,
                organization_context,
                queries::ALL_ASSETS,
                queries::all_assets_variables(asset_id, business_unit_id),
                "allAssets",
            )
            .await?;

        assets
            .into_iter()
            .map(|asset| serde_json::from_value(asset).map_err(AppError::from))
            .collect()
    }

    /// Returns the id of the new asset version.
    pub async fn create_asset_version_on_asset(
        &self,
        token: &str,
        organization_context: &str,
        asset_id: &str,
        asset_version_name: &str,
        created_by_user_id: Option<&str>,
    ) -> Result<String> {
        if asset_id.is_empty() {
            return Err(AppError::InvalidValue("Asset ID is required".to_string()));
        }
        if asset_version_name.is_empty() {
            return Err(AppError::InvalidValue("Asset version name is required".to_string()));
        }

        let mut variables = json!({
            "assetVersionName": asset_version_name,
            "assetId": asset_id,
        });
        if let Some(user) = created_by_user_id {
            variables["createdByUserId"] = json!(user);
        }

        let data: CreateAssetVersionData = self
            .mutate(token, organization_context, queries::CREATE_ASSET_VERSION, variables)
            .await?;
        Ok(data.create_new_asset_version_on_asset.asset_version.id)
    }

    /// Returns the id of the new artifact.
    pub(crate) async fn create_artifact(
        &self,
        token: &str,
        organization_context: &str,
        artifact: &NewArtifact<'_>,
    ) -> Result<String> {
        let mut ctx = json!({
            "asset": artifact.asset_version_id,
            "businessUnits": [artifact.business_unit_id],
        });
        if !artifact.product_ids.is_empty() {
            ctx["products"] = json!(artifact.product_ids);
        }

        let variables = json!({
            "input": {
                "name": artifact.name,
                "createdBy": artifact.created_by_user_id,
                "assetVersion": artifact.asset_version_id,
                "ctx": ctx,
            }
        });

        let data: CreateArtifactData = self
            .mutate(token, organization_context, queries::CREATE_ARTIFACT, variables)
            .await?;
        Ok(data.create_artifact.id)
    }

    /// Returns the id of the new test.
    pub(crate) async fn create_test(
        &self,
        token: &str,
        organization_context: &str,
        test: &NewTest<'_>,
    ) -> Result<String> {
        let mut ctx = json!({
            "asset": test.asset_id,
            "businessUnits": [test.business_unit_id],
        });
        if let Some(product) = test.product_id {
            ctx["products"] = json!([product]);
        }

        let variables = json!({
            "input": {
                "name": test.name,
                "createdBy": test.created_by_user_id,
                "artifactUnderTest": test.artifact_id,
                "testResultFileFormat": test.test_type,
                "ctx": ctx,
                "tools": test.tools,
                "uploadMethod": test.upload_method,
            }
        });

        let data: CreateTestData = self
            .mutate(token, organization_context, queries::CREATE_TEST, variables)
            .await?;
        Ok(data.create_test.id)
    }
}

#[async_trait]
impl AnalysisPlatform for FiniteStateClient {
    async fn get_auth_token(&self, client_id: &str, client_secret: &str) -> Result<String> {
        self.request_auth_token(client_id, client_secret).await
    }

    async fn create_new_asset_version_and_upload_binary(
        &self,
        token: &str,
        organization_context: &str,
        request: &UploadRequest,
    ) -> Result<Value> {
        self.upload_binary(token, organization_context, request).await
    }
}
