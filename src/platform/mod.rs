pub mod azure;
pub mod context;
pub mod github;
pub mod types;

use async_trait::async_trait;

use crate::config::{CiPlatform, HostEnvironment, HttpSettings};
use crate::error::Result;
use types::*;

#[async_trait]
pub trait CommentPublisher: Send + Sync {
    /// Post `comment` on the pull request described by `context`.
    ///
    /// Never fails: transport and API errors come back as a non-201 result.
    async fn post_comment(&self, comment: &str, context: &CommentContext) -> CommentResult;
}

/// The notification posted on the pull request once the upload is accepted.
pub fn analysis_comment(asset_version_url: &str) -> String {
    format!(
        "**Hello**, Finite State is analyzing your files! :rocket:. \n\
         Please, [click here]({asset_version_url}) to see the progress of the analysis.\
         <br />\n\
         [Finite State](https://platform.finitestate.io/)"
    )
}

/// Build the comment backend for the host this step runs on.
pub fn publisher_for(host: &HostEnvironment, http: &HttpSettings) -> Result<Box<dyn CommentPublisher>> {
    Ok(match host.platform {
        CiPlatform::GitHub => Box::new(github::GitHubPublisher::new(&host.api_url, http)?),
        CiPlatform::AzureDevOps => Box::new(azure::AzureDevOpsPublisher::new(&host.azure, http)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_comment_embeds_url() {
        let comment = analysis_comment("https://platform.finitestate.io/artifacts/1/versions/2");
        assert_eq!(
            comment,
            "**Hello**, Finite State is analyzing your files! :rocket:. \n\
             Please, [click here](https://platform.finitestate.io/artifacts/1/versions/2) to see the progress of the analysis.<br />\n\
             [Finite State](https://platform.finitestate.io/)"
        );
    }
}
