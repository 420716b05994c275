use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::config::{CiPlatform, UploadConfig};

/// How the upload entered the platform; recorded on the created test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadMethod {
    Api,
    GithubIntegration,
    AzureDevopsIntegration,
}

impl From<CiPlatform> for UploadMethod {
    fn from(platform: CiPlatform) -> Self {
        match platform {
            CiPlatform::GitHub => UploadMethod::GithubIntegration,
            CiPlatform::AzureDevOps => UploadMethod::AzureDevopsIntegration,
        }
    }
}

/// Everything needed to create an asset version and upload a binary to it.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub asset_id: String,
    pub version: String,
    pub file_path: PathBuf,
    pub business_unit_id: Option<String>,
    pub created_by_user_id: Option<String>,
    pub product_id: Option<String>,
    pub artifact_description: Option<String>,
    pub quick_scan: bool,
    pub upload_method: UploadMethod,
}

impl UploadRequest {
    pub fn from_config(config: &UploadConfig, upload_method: UploadMethod) -> Self {
        Self {
            asset_id: config.asset_id.clone(),
            version: config.version.clone(),
            file_path: config.file_path.clone(),
            business_unit_id: config.business_unit_id.clone(),
            created_by_user_id: config.created_by_user_id.clone(),
            product_id: config.product_id.clone(),
            artifact_description: config.artifact_description.clone(),
            quick_scan: config.quick_scan,
            upload_method,
        }
    }
}

// --- Query results ---

#[derive(Debug, Clone, Deserialize)]
pub struct IdRef {
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssetContext {
    pub products: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub name: String,
    pub created_by: Option<IdRef>,
    pub group: Option<IdRef>,
    pub ctx: Option<AssetContext>,
}

impl Asset {
    pub fn product_ids(&self) -> Vec<String> {
        self.ctx
            .as_ref()
            .and_then(|ctx| ctx.products.clone())
            .unwrap_or_default()
    }
}

// --- Mutation results ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssetVersionData {
    pub create_new_asset_version_on_asset: CreatedAssetVersion,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedAssetVersion {
    pub asset_version: IdRef,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateArtifactData {
    pub create_artifact: IdRef,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestData {
    pub create_test: IdRef,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartUploadData {
    pub start_multipart_upload_v2: MultipartUpload,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipartUpload {
    pub upload_id: String,
    pub key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPartUrlData {
    pub generate_upload_part_url_v2: UploadPartUrl,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadPartUrl {
    pub upload_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteUploadData {
    pub complete_multipart_upload_v2: CompletedUpload,
}

#[derive(Debug, Deserialize)]
pub struct CompletedUpload {
    pub key: String,
}

/// One uploaded part, as the complete mutation expects it.
#[derive(Debug, Clone, Serialize)]
pub struct PartInput {
    #[serde(rename = "ETag")]
    pub etag: String,
    #[serde(rename = "PartNumber")]
    pub part_number: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct TestTool {
    pub name: &'static str,
    pub description: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_method_wire_names() {
        assert_eq!(serde_json::to_value(UploadMethod::Api).unwrap(), "API");
        assert_eq!(
            serde_json::to_value(UploadMethod::GithubIntegration).unwrap(),
            "GITHUB_INTEGRATION"
        );
        assert_eq!(
            serde_json::to_value(UploadMethod::AzureDevopsIntegration).unwrap(),
            "AZURE_DEVOPS_INTEGRATION"
        );
    }

    #[test]
    fn test_asset_tolerates_null_context() {
        let asset: Asset = serde_json::from_value(serde_json::json!({
            "id": "1",
            "name": "Router",
            "createdBy": { "id": "u1", "email": "a@b.c" },
            "group": null,
            "ctx": { "asset": "1", "businessUnits": [], "products": null }
        }))
        .unwrap();

        assert!(asset.group.is_none());
        assert!(asset.product_ids().is_empty());
        assert_eq!(asset.created_by.unwrap().id, "u1");
    }

    #[test]
    fn test_part_input_field_names() {
        let part = PartInput {
            etag: "\"abc\"".to_string(),
            part_number: 1,
        };
        assert_eq!(
            serde_json::to_value(part).unwrap(),
            serde_json::json!({ "ETag": "\"abc\"", "PartNumber": 1 })
        );
    }
}
