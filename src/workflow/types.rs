/// Outcome of one run of the upload step. Exactly one is produced per run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The binary was accepted; outputs were written.
    Success {
        asset_version_url: String,
        raw_response: serde_json::Value,
    },
    /// The step failed; the message was written to the `error` output.
    Failure { message: String },
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success { .. })
    }
}
