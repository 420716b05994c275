use serde::Serialize;
use serde_json::Value;

use crate::asset_version::{asset_version_url, extract_version};
use crate::config::{HostEnvironment, UploadConfig};
use crate::error::{AppError, Result};
use crate::finite_state::types::UploadRequest;
use crate::finite_state::AnalysisPlatform;
use crate::outputs::OutputWriter;
use crate::platform::types::{CommentContext, PrContext};
use crate::platform::{analysis_comment, CommentPublisher};
use crate::workflow::types::RunOutcome;

const TOKEN_REQUIRED: &str = "Caught an exception. The [Github Token] input is required when [Automatic comment] is enabled.";

/// The upload step: authenticate, upload, publish outputs, optionally comment.
///
/// Each stage runs only if the previous one succeeded. Failures end up in the
/// `error` output; only output-file errors are returned as `Err`.
pub struct UploadWorkflow<'a> {
    platform: &'a dyn AnalysisPlatform,
    publisher: &'a dyn CommentPublisher,
    outputs: &'a OutputWriter,
    host: &'a HostEnvironment,
}

impl<'a> UploadWorkflow<'a> {
    pub fn new(
        platform: &'a dyn AnalysisPlatform,
        publisher: &'a dyn CommentPublisher,
        outputs: &'a OutputWriter,
        host: &'a HostEnvironment,
    ) -> Self {
        Self {
            platform,
            publisher,
            outputs,
            host,
        }
    }

    pub async fn run(&self, config: Result<UploadConfig>) -> Result<RunOutcome> {
        tracing::info!("Starting - Create new asset version and upload binary");

        let config = match config {
            Ok(config) => config,
            Err(e) => return self.fail(e.to_string()),
        };

        if config.automatic_comment && config.notification_token.is_none() {
            return self.fail(TOKEN_REQUIRED.to_string());
        }

        tracing::info!("Starting - Authentication");
        let token = match self
            .platform
            .get_auth_token(&config.client_id, &config.client_secret)
            .await
        {
            Ok(token) => token,
            Err(e) => {
                tracing::debug!(error = ?e, "Authentication failed");
                return self.fail(format!(
                    "Caught an exception trying to get and auth token on Finite State: {e}"
                ));
            }
        };
        tracing::info!("Finished - Authentication");

        let request = UploadRequest::from_config(&config, self.host.platform.into());
        tracing::info!(
            asset_id = %request.asset_id,
            version = %request.version,
            file = %request.file_path.display(),
            quick_scan = request.quick_scan,
            "Starting - Upload binary"
        );
        let response = match self
            .platform
            .create_new_asset_version_and_upload_binary(&token, &config.organization_context, &request)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(error = ?e, "Upload failed");
                return self.fail(format!(
                    "Caught {} trying to create new asset version and upload binary: {e}",
                    e.upload_kind().describe()
                ));
            }
        };

        tracing::info!("File uploaded - Extracting asset version");
        let storage_key = response
            .pointer("/launchBinaryUploadProcessing/key")
            .and_then(Value::as_str);
        let Some(asset_version) = storage_key.and_then(extract_version) else {
            return self.fail(format!(
                "Response from Finite State API invalid: no asset version in storage key {storage_key:?}"
            ));
        };

        self.outputs
            .set_multiline_output("response", &pretty_json(&response)?)?;
        let url = asset_version_url(&config.asset_id, &asset_version);
        self.outputs.set_output("asset-version-url", &url)?;
        tracing::info!("Asset version URL: {url}");

        self.notify(&config, &url).await;

        Ok(RunOutcome::Success {
            asset_version_url: url,
            raw_response: response,
        })
    }

    /// Post the analysis comment when enabled and running for a pull request.
    /// Failures are logged and never change the run's outcome.
    async fn notify(&self, config: &UploadConfig, url: &str) {
        if !config.automatic_comment {
            tracing::info!("Automatic comment disabled");
            return;
        }

        let pull_request = PrContext::resolve(self.host);
        if !pull_request.is_pull_request {
            tracing::info!("Automatic comment enabled. But this isn't a pull request. Skip generating comment...");
            return;
        }

        let Some(token) = config.notification_token.clone() else {
            return;
        };

        tracing::info!(pr = ?pull_request.pr_number, "Automatic comment enabled. Generating comment...");
        let context = CommentContext {
            token,
            pull_request,
        };
        let result = self
            .publisher
            .post_comment(&analysis_comment(url), &context)
            .await;

        if result.is_created() {
            tracing::info!("Comment posted successfully");
        } else {
            tracing::error!(
                "Failed to post comment. Status code: {} {}",
                result.status_code,
                result.text.as_deref().unwrap_or_default()
            );
            tracing::debug!(result = ?result, "Comment response");
        }
    }

    fn fail(&self, message: String) -> Result<RunOutcome> {
        tracing::error!("{message}");
        self.outputs.set_multiline_output("error", &message)?;
        Ok(RunOutcome::Failure { message })
    }
}

/// JSON with four-space indentation.
fn pretty_json(value: &Value) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| AppError::Output(e.to_string()))
}
