/// Infrastructure layer modules
///
/// Concrete implementations for external system interactions:
/// - Git operations on the target and source repositories (libgit2)
/// - File system operations (config file, workspace sync, copying)
/// - Process execution (pre-run hook)
pub mod filesystem;
pub mod git;
pub mod process;

pub use filesystem::{ConfigStore, WorkspaceSynchronizer};
pub use git::{CommitOutcome, RepositoryOptions, TargetRepository};
pub use process::CommandExecutor;
