use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::common::error::PublisherError;
use crate::common::result::{PublisherResult, ResultExt};
use crate::common::templates::TemplateProcessor;
use crate::common::verbosity::Verbosity;
use crate::domain::entities::publisher_config::{DeploymentTarget, PublisherConfig};
use crate::domain::value_objects::github_repo::RemoteBase;
use crate::infrastructure::filesystem::config_store::{ConfigStore, DEFAULT_CONFIG_FILE};
use crate::infrastructure::filesystem::workspace_sync::{SyncSummary, WorkspaceSynchronizer};
use crate::infrastructure::git::{self, CommitOutcome, Identity, RepositoryOptions, TargetRepository};
use crate::infrastructure::process::{CommandExecutor, CommandExecutorError, ExecutionConfig};

/// Date format used for `${DATE}`
pub const DATE_FORMAT: &str = "%m-%d-%Y";

/// Steps of a publish run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStage {
    LoadConfig,
    ResolveTarget,
    PrepareRepo,
    RunPreHook,
    EmptyDir,
    ResolveFiles,
    CopyFiles,
    WriteCname,
    Commit,
    Push,
}

impl fmt::Display for PublishStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LoadConfig => "load configuration",
            Self::ResolveTarget => "resolve target",
            Self::PrepareRepo => "prepare repository",
            Self::RunPreHook => "run pre-run script",
            Self::EmptyDir => "empty working directory",
            Self::ResolveFiles => "resolve files",
            Self::CopyFiles => "copy files",
            Self::WriteCname => "write CNAME",
            Self::Commit => "commit",
            Self::Push => "push",
        };
        f.write_str(name)
    }
}

/// A publish run stopped at `stage`
#[derive(Debug, Error)]
pub enum PublishSiteError {
    #[error("{stage}: {source}")]
    StageFailed {
        stage: PublishStage,
        #[source]
        source: PublisherError,
    },
}

impl PublishSiteError {
    pub fn stage(&self) -> PublishStage {
        match self {
            Self::StageFailed { stage, .. } => *stage,
        }
    }

    pub fn publisher_error(&self) -> &PublisherError {
        match self {
            Self::StageFailed { source, .. } => source,
        }
    }
}

trait StageExt<T> {
    fn in_stage(self, stage: PublishStage) -> Result<T, PublishSiteError>;
}

impl<T> StageExt<T> for PublisherResult<T> {
    fn in_stage(self, stage: PublishStage) -> Result<T, PublishSiteError> {
        self.map_err(|source| PublishSiteError::StageFailed { stage, source })
    }
}

/// Settings of one publish run
#[derive(Debug, Clone)]
pub struct PublishSiteConfig {
    /// Name of the deployment target in the config file
    pub target_name: String,

    /// Directory the run starts from; the project root is discovered from here
    pub working_directory: PathBuf,

    /// Config file, relative paths are taken from `working_directory`
    pub config_path: PathBuf,

    /// Do not run `preRun`
    pub skip_pre_run: bool,

    /// Value of `${TAG}`
    pub tag: Option<String>,

    pub verbosity: Verbosity,

    /// Replaces the user cache directory as the root of local clones
    pub cache_dir: Option<PathBuf>,

    pub remote_base: RemoteBase,

    /// Fixed commit identity instead of the git configuration
    pub identity: Option<Identity>,
}

impl PublishSiteConfig {
    pub fn new(target_name: impl Into<String>, working_directory: impl Into<PathBuf>) -> Self {
        Self {
            target_name: target_name.into(),
            working_directory: working_directory.into(),
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            skip_pre_run: false,
            tag: None,
            verbosity: Verbosity::Normal,
            cache_dir: None,
            remote_base: RemoteBase::default(),
            identity: None,
        }
    }

    pub fn with_config_path(mut self, config_path: impl Into<PathBuf>) -> Self {
        self.config_path = config_path.into();
        self
    }

    pub fn with_skip_pre_run(mut self, skip_pre_run: bool) -> Self {
        self.skip_pre_run = skip_pre_run;
        self
    }

    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: Option<PathBuf>) -> Self {
        self.cache_dir = cache_dir;
        self
    }

    pub fn with_remote_base(mut self, remote_base: RemoteBase) -> Self {
        self.remote_base = remote_base;
        self
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    fn resolved_config_path(&self) -> PathBuf {
        if self.config_path.is_absolute() {
            self.config_path.clone()
        } else {
            self.working_directory.join(&self.config_path)
        }
    }

    /// `<cache>/publisher/repos`
    pub fn repos_dir(&self) -> PublisherResult<PathBuf> {
        let cache_root = self.cache_dir.clone().or_else(dirs::cache_dir).ok_or_else(|| {
            PublisherError::config_error(
                "could not determine the user cache directory, use --cache-dir",
                None,
            )
        })?;
        Ok(cache_root.join("publisher").join("repos"))
    }
}

/// What a successful publish did
#[derive(Debug, Clone)]
pub struct PublishReport {
    pub target_name: String,
    pub target: DeploymentTarget,
    pub clone_path: PathBuf,
    pub sync: SyncSummary,
    pub commit: CommitOutcome,
}

/// Publishes the project's build output to one deployment target
pub struct PublishSiteUseCase {
    config: PublishSiteConfig,
    config_store: ConfigStore,
    executor: CommandExecutor,
}

impl PublishSiteUseCase {
    pub fn new(config: PublishSiteConfig) -> Self {
        Self {
            config,
            config_store: ConfigStore::new(),
            executor: CommandExecutor::new(),
        }
    }

    /// Run every stage in order, stopping at the first failure.
    ///
    /// Nothing is rolled back: a failure after `PrepareRepo` leaves the local
    /// clone in whatever state the failing stage reached, and the next run
    /// cleans it up.
    pub fn execute(&self) -> Result<PublishReport, PublishSiteError> {
        let (project_root, publisher_config) =
            self.load_config().in_stage(PublishStage::LoadConfig)?;

        let target = publisher_config
            .resolve_target(&self.config.target_name)
            .in_stage(PublishStage::ResolveTarget)?
            .clone();
        debug!(
            "Target {} is {} ({})",
            self.config.target_name, target.github_repo, target.branch
        );

        let repository = self.prepare_repository(&target).in_stage(PublishStage::PrepareRepo)?;

        if self.config.skip_pre_run {
            debug!("Skipping pre-run script");
        } else if let Some(command) = publisher_config.pre_run_command() {
            self.run_pre_hook(command, &project_root)
                .in_stage(PublishStage::RunPreHook)?;
        }

        let synchronizer = WorkspaceSynchronizer::new(self.config.verbosity)
            .with_excluded_files(&publisher_config.excluded_files)
            .in_stage(PublishStage::ResolveFiles)?;

        let removed = synchronizer
            .empty_working_directory(repository.path())
            .in_stage(PublishStage::EmptyDir)?;

        let files = synchronizer
            .resolve_file_set(&publisher_config.files, &project_root)
            .in_stage(PublishStage::ResolveFiles)?;

        let mut sync = synchronizer
            .copy_all(&files, &project_root, repository.path())
            .in_stage(PublishStage::CopyFiles)?;
        sync.removed_entries = removed;

        if let Some(domain) = target.custom_domain() {
            sync.wrote_cname = synchronizer
                .write_custom_domain_marker(repository.path(), domain)
                .in_stage(PublishStage::WriteCname)?;
        }

        let commit = repository
            .commit_changes(&publisher_config.commit_message)
            .in_stage(PublishStage::Commit)?;

        info!("Pushing to {} ({})", target.github_repo, target.branch);
        repository.push().in_stage(PublishStage::Push)?;

        Ok(PublishReport {
            target_name: self.config.target_name.clone(),
            target,
            clone_path: repository.path().to_path_buf(),
            sync,
            commit,
        })
    }

    fn load_config(&self) -> PublisherResult<(PathBuf, PublisherConfig)> {
        let project_root = git::project_root(&self.config.working_directory)?;
        let templates = self.template_variables(&project_root)?;
        let config = self
            .config_store
            .read_config(self.config.resolved_config_path(), &templates)?;
        Ok((project_root, config))
    }

    /// `SHA`, `TAG` and `DATE` placeholder values
    fn template_variables(&self, project_root: &Path) -> PublisherResult<TemplateProcessor> {
        let sha = git::head_sha(project_root)?;
        let date = chrono::Local::now().format(DATE_FORMAT).to_string();
        Ok(TemplateProcessor::new()
            .with_variable("SHA", sha)
            .with_variable("TAG", self.config.tag.clone().unwrap_or_default())
            .with_variable("DATE", date))
    }

    fn prepare_repository(&self, target: &DeploymentTarget) -> PublisherResult<TargetRepository> {
        let repos_dir = self.config.repos_dir()?;
        fs::create_dir_all(&repos_dir).with_filesystem_error("failed to create", &repos_dir)?;

        let local_path = target.github_repo.local_path(&repos_dir);
        info!("Preparing {} in {}", target.github_repo, local_path.display());

        let mut options = RepositoryOptions::new(self.config.verbosity)
            .with_remote_base(self.config.remote_base.clone());
        if let Some(identity) = &self.config.identity {
            options = options.with_identity(identity.clone());
        }

        TargetRepository::prepare(&target.github_repo, &local_path, &target.branch, options)
    }

    fn run_pre_hook(&self, command: &str, project_root: &Path) -> PublisherResult<()> {
        info!("Running pre-run script: {}", command);
        let execution = ExecutionConfig::new().with_working_directory(project_root);

        let result = self
            .executor
            .execute(command, &execution)
            .map_err(|e| match e {
                CommandExecutorError::SpawnFailed { source, .. } => {
                    PublisherError::hook_error_with_source(command, "could not be started", source)
                }
                CommandExecutorError::InvalidCommand(message) => {
                    PublisherError::hook_error(command, message, None, "")
                }
            })?;

        if !result.stdout.trim().is_empty() {
            debug!("pre-run stdout:\n{}", result.stdout.trim_end());
        }

        if result.success {
            debug!("Pre-run script finished in {}ms", result.execution_time_ms);
            return Ok(());
        }

        let message = match result.exit_code {
            Some(code) => format!("exited with status {}", code),
            None => "terminated by a signal".to_string(),
        };
        Err(PublisherError::hook_error(
            command,
            message,
            result.exit_code,
            result.stderr,
        ))
    }
}
