pub mod identity;
pub mod project;
pub mod target_repository;

pub use identity::Identity;
pub use project::{head_sha, project_root};
pub use target_repository::{CommitOutcome, RepositoryOptions, TargetRepository};
