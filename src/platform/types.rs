/// Facts about the pull request that triggered this run, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrContext {
    pub is_pull_request: bool,
    pub pr_number: Option<u64>,
    pub repo_owner: Option<String>,
    pub repo_name: Option<String>,
}

/// How a CI host signals that a run belongs to a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionStrategy {
    /// The host exposes an event type (`GITHUB_EVENT_NAME`) alongside a ref.
    EventName,
    /// Only the ref is available, e.g. `refs/pull/42/merge`.
    RefPattern,
}

/// Everything a comment backend needs besides the text itself.
#[derive(Debug, Clone)]
pub struct CommentContext {
    pub token: String,
    pub pull_request: PrContext,
}

/// Result of posting a comment. Backends report failures here instead of
/// returning errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentResult {
    pub status_code: u16,
    pub text: Option<String>,
}

impl CommentResult {
    pub fn created() -> Self {
        Self {
            status_code: 201,
            text: None,
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            status_code: 500,
            text: Some(text.into()),
        }
    }

    pub fn is_created(&self) -> bool {
        self.status_code == 201
    }
}
