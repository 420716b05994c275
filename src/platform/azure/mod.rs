mod client;

pub use client::AzureDevOpsPublisher;
