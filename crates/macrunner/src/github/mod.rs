// GitHub side of macrunner: address model, credential and REST client.

pub mod address;
pub mod client;
pub mod credential;

pub use address::{AddressParseError, GithubAddress};
pub use client::{GithubApi, GithubClient, RunnerDownload, RunnerPlatform};
pub use credential::Credential;
