use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};

/// Replacement for the process environment, used by tests.
pub type EnvSource = config::Map<String, String>;

pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// The CI host this step runs on. Decides how pull requests are detected and
/// which backend posts the comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CiPlatform {
    #[default]
    GitHub,
    AzureDevOps,
}

impl CiPlatform {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "github" => Ok(CiPlatform::GitHub),
            "azure" | "azure-devops" | "azure_devops" => Ok(CiPlatform::AzureDevOps),
            other => Err(AppError::Config(format!(
                "Unknown CI platform '{other}', expected 'github' or 'azure-devops'"
            ))),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawInputs {
    finite_state_client_id: Option<String>,
    finite_state_secret: Option<String>,
    finite_state_organization_context: Option<String>,
    asset_id: Option<String>,
    version: Option<String>,
    file_path: Option<String>,
    quick_scan: Option<String>,
    business_unit_id: Option<String>,
    created_by_user_id: Option<String>,
    product_id: Option<String>,
    artifact_description: Option<String>,
    automatic_comment: Option<String>,
    github_token: Option<String>,
}

/// Step inputs, validated once at startup.
#[derive(Clone)]
pub struct UploadConfig {
    pub client_id: String,
    pub client_secret: String,
    pub organization_context: String,
    pub asset_id: String,
    pub version: String,
    pub file_path: PathBuf,
    pub quick_scan: bool,
    pub business_unit_id: Option<String>,
    pub created_by_user_id: Option<String>,
    pub product_id: Option<String>,
    pub artifact_description: Option<String>,
    pub automatic_comment: bool,
    pub notification_token: Option<String>,
}

// Manual Debug impl to avoid leaking the client secret and token
impl std::fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("organization_context", &self.organization_context)
            .field("asset_id", &self.asset_id)
            .field("version", &self.version)
            .field("file_path", &self.file_path)
            .field("quick_scan", &self.quick_scan)
            .field("business_unit_id", &self.business_unit_id)
            .field("created_by_user_id", &self.created_by_user_id)
            .field("product_id", &self.product_id)
            .field("artifact_description", &self.artifact_description)
            .field("automatic_comment", &self.automatic_comment)
            .field(
                "notification_token",
                &self.notification_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

fn required(value: Option<String>, name: &'static str, missing: &mut Vec<&'static str>) -> String {
    match value {
        Some(v) => v,
        None => {
            missing.push(name);
            String::new()
        }
    }
}

fn flag(value: Option<&str>) -> bool {
    value == Some("true")
}

impl UploadConfig {
    /// Read `INPUT_*` variables from the process environment.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    pub fn load_from(source: Option<EnvSource>) -> Result<Self> {
        let raw: RawInputs = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("INPUT")
                    .ignore_empty(true)
                    .source(source),
            )
            .build()?
            .try_deserialize()?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawInputs) -> Result<Self> {
        let mut missing = Vec::new();

        let client_id = required(raw.finite_state_client_id, "INPUT_FINITE_STATE_CLIENT_ID", &mut missing);
        let client_secret = required(raw.finite_state_secret, "INPUT_FINITE_STATE_SECRET", &mut missing);
        let organization_context = required(
            raw.finite_state_organization_context,
            "INPUT_FINITE_STATE_ORGANIZATION_CONTEXT",
            &mut missing,
        );
        let asset_id = required(raw.asset_id, "INPUT_ASSET_ID", &mut missing);
        let version = required(raw.version, "INPUT_VERSION", &mut missing);
        let file_path = required(raw.file_path, "INPUT_FILE_PATH", &mut missing);

        if !missing.is_empty() {
            return Err(AppError::Config(format!(
                "Required inputs not available ({}). Please, check required inputs definition",
                missing.join(", ")
            )));
        }

        Ok(Self {
            client_id,
            client_secret,
            organization_context,
            asset_id,
            version,
            file_path: PathBuf::from(file_path),
            quick_scan: flag(raw.quick_scan.as_deref()),
            business_unit_id: raw.business_unit_id,
            created_by_user_id: raw.created_by_user_id,
            product_id: raw.product_id,
            artifact_description: raw.artifact_description,
            automatic_comment: flag(raw.automatic_comment.as_deref()),
            notification_token: raw.github_token,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawHost {
    github_output: Option<String>,
    github_event_name: Option<String>,
    github_ref: Option<String>,
    github_repository_owner: Option<String>,
    github_repository: Option<String>,
    github_api_url: Option<String>,
    system_collectionuri: Option<String>,
    system_teamproject: Option<String>,
    build_repository_name: Option<String>,
    build_sourcebranch: Option<String>,
    tf_build: Option<String>,
    input_ci_platform: Option<String>,
}

/// Variables provided by the Azure Pipelines agent.
#[derive(Debug, Clone, Default)]
pub struct AzureEnvironment {
    pub collection_uri: Option<String>,
    pub team_project: Option<String>,
    pub repository_name: Option<String>,
    pub source_branch: Option<String>,
}

/// What the CI host tells us about the current run.
#[derive(Debug, Clone)]
pub struct HostEnvironment {
    pub platform: CiPlatform,
    pub output_path: Option<PathBuf>,
    pub event_name: Option<String>,
    pub git_ref: Option<String>,
    pub repository_owner: Option<String>,
    pub repository: Option<String>,
    pub api_url: String,
    pub azure: AzureEnvironment,
}

impl Default for HostEnvironment {
    fn default() -> Self {
        Self {
            platform: CiPlatform::default(),
            output_path: None,
            event_name: None,
            git_ref: None,
            repository_owner: None,
            repository: None,
            api_url: DEFAULT_GITHUB_API_URL.to_string(),
            azure: AzureEnvironment::default(),
        }
    }
}

impl HostEnvironment {
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    pub fn load_from(source: Option<EnvSource>) -> Result<Self> {
        let mut builder = config::Config::builder();
        for prefix in ["GITHUB", "SYSTEM", "BUILD", "TF", "INPUT"] {
            builder = builder.add_source(
                config::Environment::with_prefix(prefix)
                    .keep_prefix(true)
                    .ignore_empty(true)
                    .source(source.clone()),
            );
        }

        let raw: RawHost = builder.build()?.try_deserialize()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawHost) -> Result<Self> {
        let platform = match raw.input_ci_platform.as_deref() {
            Some(value) => CiPlatform::parse(value)?,
            None if raw.tf_build.is_some() => CiPlatform::AzureDevOps,
            None => CiPlatform::GitHub,
        };

        Ok(Self {
            platform,
            output_path: raw.github_output.map(PathBuf::from),
            event_name: raw.github_event_name,
            git_ref: raw.github_ref,
            repository_owner: raw.github_repository_owner,
            repository: raw.github_repository,
            api_url: raw
                .github_api_url
                .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            azure: AzureEnvironment {
                collection_uri: raw.system_collectionuri,
                team_project: raw.system_teamproject,
                repository_name: raw.build_repository_name,
                source_branch: raw.build_sourcebranch,
            },
        })
    }
}

/// Timeouts applied to every outbound HTTP call.
#[derive(Debug, Clone, Copy)]
pub struct HttpSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub upload_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
            upload_timeout: Duration::from_secs(3600),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(pairs: &[(&str, &str)]) -> Option<EnvSource> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn required_inputs() -> Vec<(&'static str, &'static str)> {
        vec![
            ("INPUT_FINITE_STATE_CLIENT_ID", "client"),
            ("INPUT_FINITE_STATE_SECRET", "s3cret"),
            ("INPUT_FINITE_STATE_ORGANIZATION_CONTEXT", "org-ctx"),
            ("INPUT_ASSET_ID", "123456"),
            ("INPUT_VERSION", "v1.0.0"),
            ("INPUT_FILE_PATH", "./firmware.bin"),
        ]
    }

    #[test]
    fn test_loads_required_inputs() {
        let config = UploadConfig::load_from(source(&required_inputs())).unwrap();
        assert_eq!(config.client_id, "client");
        assert_eq!(config.asset_id, "123456");
        assert_eq!(config.file_path, PathBuf::from("./firmware.bin"));
        assert!(!config.quick_scan);
        assert!(!config.automatic_comment);
        assert!(config.notification_token.is_none());
        assert!(config.business_unit_id.is_none());
    }

    #[test]
    fn test_missing_required_inputs_are_listed() {
        let mut inputs = required_inputs();
        inputs.retain(|(k, _)| *k != "INPUT_ASSET_ID" && *k != "INPUT_VERSION");

        let err = UploadConfig::load_from(source(&inputs)).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, AppError::Config(_)));
        assert!(message.contains("INPUT_ASSET_ID"));
        assert!(message.contains("INPUT_VERSION"));
        assert!(!message.contains("INPUT_FILE_PATH"));
    }

    #[test]
    fn test_empty_required_input_counts_as_missing() {
        let inputs: Vec<_> = required_inputs()
            .into_iter()
            .map(|(k, v)| if k == "INPUT_FINITE_STATE_SECRET" { (k, "") } else { (k, v) })
            .collect();

        let err = UploadConfig::load_from(source(&inputs)).unwrap_err();
        assert!(err.to_string().contains("INPUT_FINITE_STATE_SECRET"));
    }

    #[test]
    fn test_flags_require_literal_true() {
        let mut inputs = required_inputs();
        inputs.push(("INPUT_QUICK_SCAN", "true"));
        inputs.push(("INPUT_AUTOMATIC_COMMENT", "True"));
        inputs.push(("INPUT_GITHUB_TOKEN", "ghp_token"));

        let config = UploadConfig::load_from(source(&inputs)).unwrap();
        assert!(config.quick_scan);
        assert!(!config.automatic_comment);
        assert_eq!(config.notification_token.as_deref(), Some("ghp_token"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut inputs = required_inputs();
        inputs.push(("INPUT_GITHUB_TOKEN", "ghp_token"));

        let config = UploadConfig::load_from(source(&inputs)).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("s3cret"));
        assert!(!debug.contains("ghp_token"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_host_environment_github() {
        let host = HostEnvironment::load_from(source(&[
            ("GITHUB_OUTPUT", "/tmp/out"),
            ("GITHUB_EVENT_NAME", "pull_request"),
            ("GITHUB_REF", "refs/pull/42/merge"),
            ("GITHUB_REPOSITORY_OWNER", "octo"),
            ("GITHUB_REPOSITORY", "octo/firmware"),
        ]))
        .unwrap();

        assert_eq!(host.platform, CiPlatform::GitHub);
        assert_eq!(host.output_path, Some(PathBuf::from("/tmp/out")));
        assert_eq!(host.event_name.as_deref(), Some("pull_request"));
        assert_eq!(host.git_ref.as_deref(), Some("refs/pull/42/merge"));
        assert_eq!(host.repository.as_deref(), Some("octo/firmware"));
        assert_eq!(host.api_url, DEFAULT_GITHUB_API_URL);
    }

    #[test]
    fn test_host_environment_detects_azure() {
        let host = HostEnvironment::load_from(source(&[
            ("TF_BUILD", "True"),
            ("SYSTEM_COLLECTIONURI", "https://dev.azure.com/acme/"),
            ("SYSTEM_TEAMPROJECT", "Firmware"),
            ("BUILD_REPOSITORY_NAME", "firmware"),
            ("BUILD_SOURCEBRANCH", "refs/pull/7/merge"),
        ]))
        .unwrap();

        assert_eq!(host.platform, CiPlatform::AzureDevOps);
        assert_eq!(host.azure.collection_uri.as_deref(), Some("https://dev.azure.com/acme/"));
        assert_eq!(host.azure.team_project.as_deref(), Some("Firmware"));
        assert_eq!(host.azure.source_branch.as_deref(), Some("refs/pull/7/merge"));
    }

    #[test]
    fn test_explicit_platform_overrides_detection() {
        let host = HostEnvironment::load_from(source(&[
            ("TF_BUILD", "True"),
            ("INPUT_CI_PLATFORM", "github"),
        ]))
        .unwrap();
        assert_eq!(host.platform, CiPlatform::GitHub);

        let err = HostEnvironment::load_from(source(&[("INPUT_CI_PLATFORM", "jenkins")])).unwrap_err();
        assert!(err.to_string().contains("jenkins"));
    }
}
