use std::sync::LazyLock;

use regex::Regex;

use crate::config::{CiPlatform, HostEnvironment};
use crate::platform::types::{DetectionStrategy, PrContext};

static PULL_REF_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/pull/(\d+)/").expect("Failed to compile pull ref regex"));

static PULL_MERGE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^refs/pull/(\d+)/merge$").expect("Failed to compile merge ref regex"));

const PULL_REQUEST_EVENT: &str = "pull_request";

impl DetectionStrategy {
    pub fn for_platform(platform: CiPlatform) -> Self {
        match platform {
            CiPlatform::GitHub => DetectionStrategy::EventName,
            CiPlatform::AzureDevOps => DetectionStrategy::RefPattern,
        }
    }
}

pub fn is_pull_request_event(event_name: Option<&str>) -> bool {
    event_name == Some(PULL_REQUEST_EVENT)
}

/// PR number from a ref such as `refs/pull/42/merge`, only for `pull_request`
/// events.
pub fn pull_request_number_from_event(event_name: Option<&str>, git_ref: Option<&str>) -> Option<String> {
    if !is_pull_request_event(event_name) {
        return None;
    }
    PULL_REF_SEGMENT
        .captures(git_ref?)
        .map(|caps| caps[1].to_string())
}

pub fn is_pull_request_ref(git_ref: &str) -> bool {
    PULL_MERGE_REF.is_match(git_ref)
}

pub fn pull_request_number_from_ref(git_ref: &str) -> Option<u64> {
    PULL_MERGE_REF
        .captures(git_ref)
        .and_then(|caps| caps[1].parse().ok())
}

/// Last segment of an `owner/repo` string.
pub fn repository_name(full_name: Option<&str>) -> Option<String> {
    let parts: Vec<&str> = full_name?.split('/').collect();
    if parts.len() >= 2 {
        parts.last().map(|s| s.to_string())
    } else {
        None
    }
}

impl PrContext {
    pub fn resolve(host: &HostEnvironment) -> Self {
        Self::resolve_with(host, DetectionStrategy::for_platform(host.platform))
    }

    pub fn resolve_with(host: &HostEnvironment, strategy: DetectionStrategy) -> Self {
        let (is_pull_request, pr_number) = match strategy {
            DetectionStrategy::EventName => {
                let event_name = host.event_name.as_deref();
                (
                    is_pull_request_event(event_name),
                    pull_request_number_from_event(event_name, host.git_ref.as_deref())
                        .and_then(|n| n.parse().ok()),
                )
            }
            DetectionStrategy::RefPattern => {
                let git_ref = match host.platform {
                    CiPlatform::AzureDevOps => host.azure.source_branch.as_deref(),
                    CiPlatform::GitHub => host.git_ref.as_deref(),
                };
                match git_ref {
                    Some(r) => (is_pull_request_ref(r), pull_request_number_from_ref(r)),
                    None => (false, None),
                }
            }
        };

        let repo_name = match host.platform {
            CiPlatform::GitHub => repository_name(host.repository.as_deref()),
            CiPlatform::AzureDevOps => host.azure.repository_name.clone(),
        };

        Self {
            is_pull_request,
            pr_number,
            repo_owner: host.repository_owner.clone(),
            repo_name,
        }
    }
}
