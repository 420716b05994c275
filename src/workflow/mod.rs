pub mod types;
pub mod upload;

pub use types::RunOutcome;
pub use upload::UploadWorkflow;
