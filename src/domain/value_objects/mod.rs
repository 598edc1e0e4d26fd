pub mod github_repo;

pub use github_repo::{GithubRepo, GithubRepoError, RemoteBase};
