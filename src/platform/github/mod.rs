mod client;

pub use client::GitHubPublisher;
