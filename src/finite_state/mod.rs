pub mod client;
pub mod queries;
pub mod types;
mod upload;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
pub use client::FiniteStateClient;
use types::UploadRequest;

/// The security-analysis platform the binary is uploaded to.
#[async_trait]
pub trait AnalysisPlatform: Send + Sync {
    /// Get a bearer token for the API from client credentials.
    async fn get_auth_token(&self, client_id: &str, client_secret: &str) -> Result<String>;

    /// Create a new asset version and upload the binary for analysis.
    ///
    /// Returns the platform's raw response; the storage key is at
    /// `launchBinaryUploadProcessing.key`.
    async fn create_new_asset_version_and_upload_binary(
        &self,
        token: &str,
        organization_context: &str,
        request: &UploadRequest,
    ) -> Result<Value>;
}
