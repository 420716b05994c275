use std::path::Path;

use serde_json::{json, Value};
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::error::{AppError, Result};

use super::client::{FiniteStateClient, NewArtifact, NewTest, BINARY_ANALYSIS_TEST_TYPE};
use super::queries;
use super::types::*;

const DEFAULT_ARTIFACT_DESCRIPTION: &str = "Firmware Binary";

fn binary_analysis_tools() -> Vec<TestTool> {
    vec![TestTool {
        name: "Finite State Binary Analysis",
        description: "SBOM and Vulnerability Analysis from Finite State Binary SCA and Binary SAST.",
    }]
}

async fn read_chunk(file: &mut File, chunk_size: u64) -> Result<Vec<u8>> {
    let mut chunk = Vec::new();
    file.take(chunk_size).read_to_end(&mut chunk).await?;
    Ok(chunk)
}

impl FiniteStateClient {
    /// Create a new asset version with a binary-analysis test and upload the
    /// file to it. Returns the `data` of the launch mutation, which carries
    /// the storage key under `launchBinaryUploadProcessing.key`.
    pub async fn upload_binary(
        &self,
        token: &str,
        organization_context: &str,
        request: &UploadRequest,
    ) -> Result<Value> {
        if request.asset_id.is_empty()
            || request.version.is_empty()
            || request.file_path.as_os_str().is_empty()
        {
            return Err(AppError::InvalidValue(
                "Asset ID, Version, and File path are required".to_string(),
            ));
        }

        let is_file = tokio::fs::metadata(&request.file_path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(AppError::InvalidValue(format!(
                "File path {} does not exist.",
                request.file_path.display()
            )));
        }

        let test_id = self
            .create_asset_version_artifact_and_test(token, organization_context, request)
            .await?;

        self.upload_file_for_binary_analysis(
            token,
            organization_context,
            &test_id,
            &request.file_path,
            request.quick_scan,
        )
        .await
    }

    /// Returns the id of the binary-analysis test the file is uploaded to.
    async fn create_asset_version_artifact_and_test(
        &self,
        token: &str,
        organization_context: &str,
        request: &UploadRequest,
    ) -> Result<String> {
        let asset = self
            .get_all_assets(token, organization_context, Some(&request.asset_id), None)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::InvalidValue(format!("No asset found with ID {}", request.asset_id))
            })?;

        let mut product_ids = asset.product_ids();
        if let Some(product_id) = &request.product_id {
            if !product_ids.contains(product_id) {
                product_ids.push(product_id.clone());
            }
        }

        let business_unit_id = request
            .business_unit_id
            .clone()
            .or_else(|| asset.group.as_ref().map(|g| g.id.clone()));
        let created_by_user_id = request
            .created_by_user_id
            .clone()
            .or_else(|| asset.created_by.as_ref().map(|u| u.id.clone()));
        let (Some(business_unit_id), Some(created_by_user_id)) = (business_unit_id, created_by_user_id)
        else {
            return Err(AppError::InvalidValue(
                "Business Unit ID and Created By User ID are required and could not be retrieved from the existing asset"
                    .to_string(),
            ));
        };

        tracing::info!(asset = %asset.name, version = %request.version, "Creating asset version");
        let asset_version_id = self
            .create_asset_version_on_asset(
                token,
                organization_context,
                &request.asset_id,
                &request.version,
                Some(&created_by_user_id),
            )
            .await?;

        let description = request
            .artifact_description
            .as_deref()
            .unwrap_or(DEFAULT_ARTIFACT_DESCRIPTION);
        let artifact_name = format!("{} {} - {description}", asset.name, request.version);
        let artifact_id = self
            .create_artifact(
                token,
                organization_context,
                &NewArtifact {
                    business_unit_id: &business_unit_id,
                    created_by_user_id: &created_by_user_id,
                    asset_version_id: &asset_version_id,
                    name: &artifact_name,
                    product_ids: &product_ids,
                },
            )
            .await?;

        let test_name = format!("{} {} - Finite State Binary Analysis", asset.name, request.version);
        let test_id = self
            .create_test(
                token,
                organization_context,
                &NewTest {
                    business_unit_id: &business_unit_id,
                    created_by_user_id: &created_by_user_id,
                    asset_id: &request.asset_id,
                    artifact_id: &artifact_id,
                    name: &test_name,
                    test_type: BINARY_ANALYSIS_TEST_TYPE,
                    tools: binary_analysis_tools(),
                    upload_method: request.upload_method,
                    product_id: request.product_id.as_deref(),
                },
            )
            .await?;

        tracing::debug!(
            asset_version_id = %asset_version_id,
            artifact_id = %artifact_id,
            test_id = %test_id,
            "Created asset version, artifact and test"
        );
        Ok(test_id)
    }

    /// Multipart upload of `file_path` to the test, then launch processing.
    pub async fn upload_file_for_binary_analysis(
        &self,
        token: &str,
        organization_context: &str,
        test_id: &str,
        file_path: &Path,
        quick_scan: bool,
    ) -> Result<Value> {
        if test_id.is_empty() {
            return Err(AppError::InvalidValue("Test ID is required".to_string()));
        }

        let start: StartUploadData = self
            .mutate(
                token,
                organization_context,
                queries::START_MULTIPART_UPLOAD,
                json!({ "testId": test_id }),
            )
            .await?;
        let upload = start.start_multipart_upload_v2;

        let mut file = File::open(file_path).await?;
        let mut parts = Vec::new();
        let mut part_number: u32 = 1;
        loop {
            let chunk = read_chunk(&mut file, self.chunk_size).await?;
            if chunk.is_empty() {
                break;
            }

            let part_url: UploadPartUrlData = self
                .mutate(
                    token,
                    organization_context,
                    queries::GENERATE_UPLOAD_PART_URL,
                    json!({
                        "partNumber": part_number,
                        "uploadId": upload.upload_id,
                        "uploadKey": upload.key,
                    }),
                )
                .await?;

            tracing::debug!(part = part_number, bytes = chunk.len(), "Uploading part");
            let etag = self
                .upload_bytes_to_url(&part_url.generate_upload_part_url_v2.upload_url, chunk)
                .await?;
            parts.push(PartInput { etag, part_number });
            part_number += 1;
        }

        let complete: CompleteUploadData = self
            .mutate(
                token,
                organization_context,
                queries::COMPLETE_MULTIPART_UPLOAD,
                json!({
                    "partData": parts,
                    "uploadId": upload.upload_id,
                    "uploadKey": upload.key,
                }),
            )
            .await?;
        let key = complete.complete_multipart_upload_v2.key;

        let (query, variables) = if quick_scan {
            (
                queries::LAUNCH_BINARY_UPLOAD_WITH_OPTIONS,
                json!({ "key": key, "testId": test_id, "configurationOptions": ["QUICK_SCAN"] }),
            )
        } else {
            (
                queries::LAUNCH_BINARY_UPLOAD,
                json!({ "key": key, "testId": test_id }),
            )
        };

        self.send_graphql_query(token, organization_context, query, &variables)
            .await
    }

    /// PUT one part to its presigned URL and return the part's ETag.
    async fn upload_bytes_to_url(&self, url: &str, bytes: Vec<u8>) -> Result<String> {
        let response = self
            .client
            .put(url)
            .timeout(self.upload_timeout)
            .body(bytes)
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

        response
            .headers()
            .get("ETag")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| AppError::UnexpectedResponse("Upload response has no ETag header".to_string()))
    }
}
