use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use git2::{
    build::{CheckoutBuilder, RepoBuilder},
    BranchType, Cred, CredentialType, ErrorCode, FetchOptions, IndexAddOption, Oid, PushOptions,
    RemoteCallbacks, Repository, ResetType, StatusOptions,
};
use tracing::{debug, info};

use crate::common::error::{PrepareStage, PublisherError};
use crate::common::result::PublisherResult;
use crate::common::verbosity::Verbosity;
use crate::domain::value_objects::github_repo::{GithubRepo, RemoteBase};
use crate::infrastructure::git::identity::Identity;

const ORIGIN: &str = "origin";

/// Settings shared by every operation on a target repository
#[derive(Debug, Clone, Default)]
pub struct RepositoryOptions {
    pub verbosity: Verbosity,

    /// Where the remote lives
    pub remote_base: RemoteBase,

    /// Fixed commit identity; the git configuration is consulted when unset
    pub identity: Option<Identity>,
}

impl RepositoryOptions {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            ..Self::default()
        }
    }

    pub fn with_remote_base(mut self, remote_base: RemoteBase) -> Self {
        self.remote_base = remote_base;
        self
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }
}

/// Result of [`TargetRepository::commit_changes`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed(Oid),
    /// The working tree matched HEAD, nothing was recorded
    Unchanged,
}

impl CommitOutcome {
    pub fn commit_id(&self) -> Option<Oid> {
        match self {
            Self::Committed(oid) => Some(*oid),
            Self::Unchanged => None,
        }
    }
}

/// Local working clone of a deployment target, pinned to one branch
pub struct TargetRepository {
    repo: Repository,
    github_repo: GithubRepo,
    branch: String,
    path: PathBuf,
    options: RepositoryOptions,
}

impl std::fmt::Debug for TargetRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetRepository")
            .field("github_repo", &self.github_repo)
            .field("branch", &self.branch)
            .field("path", &self.path)
            .field("repo", &"<git2::Repository>")
            .finish()
    }
}

impl TargetRepository {
    /// Get a clean working clone of `github_repo` at `local_path` with
    /// `branch` checked out and up to date with the remote.
    ///
    /// A missing `local_path` is cloned fresh. An existing one is reused:
    /// untracked files are removed, the branch is force checked out and
    /// reset to the remote tip.
    pub fn prepare(
        github_repo: &GithubRepo,
        local_path: &Path,
        branch: &str,
        options: RepositoryOptions,
    ) -> PublisherResult<Self> {
        if !local_path.exists() {
            let repo = Self::clone_branch(github_repo, local_path, branch, &options)?;
            return Ok(Self::bind(repo, github_repo, branch, local_path, options));
        }

        let repo = Repository::open(local_path).map_err(|e| {
            PublisherError::preparation_error_with_source(
                PrepareStage::Open,
                github_repo.to_string(),
                format!("{} is not a git repository", local_path.display()),
                e,
            )
        })?;
        let handle = Self::bind(repo, github_repo, branch, local_path, options);
        handle.clean()?;
        handle.checkout()?;
        handle.pull()?;
        Ok(handle)
    }

    fn bind(
        repo: Repository,
        github_repo: &GithubRepo,
        branch: &str,
        local_path: &Path,
        options: RepositoryOptions,
    ) -> Self {
        Self {
            repo,
            github_repo: github_repo.clone(),
            branch: branch.to_string(),
            path: local_path.to_path_buf(),
            options,
        }
    }

    fn clone_branch(
        github_repo: &GithubRepo,
        local_path: &Path,
        branch: &str,
        options: &RepositoryOptions,
    ) -> PublisherResult<Repository> {
        let url = github_repo.remote_url(&options.remote_base);
        let clone_error = |message: String, e: git2::Error| {
            PublisherError::preparation_error_with_source(
                PrepareStage::Clone,
                github_repo.to_string(),
                message,
                e,
            )
        };

        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PublisherError::filesystem_error_with_source(
                    format!("Failed to create {}", parent.display()),
                    Some(parent.to_path_buf()),
                    e,
                )
            })?;
        }

        debug!("Cloning {} ({}) into {}", url, branch, local_path.display());

        let refspec = branch_refspec(branch);
        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(remote_callbacks(options.verbosity));

        let mut builder = RepoBuilder::new();
        builder.branch(branch);
        builder.fetch_options(fetch_options);
        builder.remote_create(move |repo, name, url| repo.remote_with_fetch(name, url, &refspec));

        builder
            .clone(&url, local_path)
            .map_err(|e| clone_error(format!("could not clone branch {} from {}", branch, url), e))
    }

    /// Remove untracked files, then any directories they leave empty.
    /// Ignored files stay, including those inside untracked directories.
    fn clean(&self) -> PublisherResult<()> {
        let mut status_options = StatusOptions::new();
        status_options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self
            .repo
            .statuses(Some(&mut status_options))
            .map_err(|e| self.prepare_error(PrepareStage::Clean, "could not read status", e))?;

        let untracked: Vec<PathBuf> = statuses
            .iter()
            .filter(|entry| entry.status().is_wt_new())
            .filter_map(|entry| entry.path().map(|p| self.path.join(p.trim_end_matches('/'))))
            .collect();

        let mut parents = BTreeSet::new();
        for path in untracked {
            debug!("Removing untracked {}", path.display());
            fs::remove_file(&path).map_err(|e| {
                PublisherError::preparation_error(
                    PrepareStage::Clean,
                    self.github_repo.to_string(),
                    format!("could not remove {}: {}", path.display(), e),
                )
            })?;
            if let Some(parent) = path.parent() {
                parents.insert(parent.to_path_buf());
            }
        }

        // Deepest first; a directory still holding ignored files is kept
        for dir in parents.iter().rev() {
            let mut current = dir.as_path();
            while current != self.path.as_path() && fs::remove_dir(current).is_ok() {
                match current.parent() {
                    Some(parent) => current = parent,
                    None => break,
                }
            }
        }

        Ok(())
    }

    /// Force checkout of the configured branch, creating it from the remote
    /// tracking branch when there is no local one.
    fn checkout(&self) -> PublisherResult<()> {
        let stage = PrepareStage::Checkout;

        match self.repo.find_branch(&self.branch, BranchType::Local) {
            Ok(_) => {}
            Err(e) if e.code() == ErrorCode::NotFound => {
                let remote_ref = remote_tracking_ref(&self.branch);
                let commit = self
                    .repo
                    .find_reference(&remote_ref)
                    .and_then(|r| r.peel_to_commit())
                    .map_err(|e| {
                        self.prepare_error(stage, format!("branch {} not found", self.branch), e)
                    })?;
                self.repo
                    .branch(&self.branch, &commit, false)
                    .map_err(|e| self.prepare_error(stage, "could not create branch", e))?;
            }
            Err(e) => return Err(self.prepare_error(stage, "could not look up branch", e)),
        }

        self.repo
            .set_head(&local_ref(&self.branch))
            .map_err(|e| self.prepare_error(stage, format!("could not switch to {}", self.branch), e))?;

        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.repo
            .checkout_head(Some(&mut checkout))
            .map_err(|e| self.prepare_error(stage, "could not update working tree", e))
    }

    /// Fetch the branch and move it to the remote tip.
    fn pull(&self) -> PublisherResult<()> {
        let stage = PrepareStage::Pull;

        let mut remote = self
            .repo
            .find_remote(ORIGIN)
            .map_err(|e| self.prepare_error(stage, "remote origin not found", e))?;

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(remote_callbacks(self.options.verbosity));

        let refspec = branch_refspec(&self.branch);
        remote
            .fetch(&[refspec.as_str()], Some(&mut fetch_options), None)
            .map_err(|e| self.prepare_error(stage, "fetch failed", e))?;

        let remote_commit = self
            .repo
            .find_reference(&remote_tracking_ref(&self.branch))
            .and_then(|r| r.peel_to_commit())
            .map_err(|e| {
                self.prepare_error(stage, format!("{}/{} not found", ORIGIN, self.branch), e)
            })?;
        let head = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| self.prepare_error(stage, "could not resolve HEAD", e))?;

        if head.id() == remote_commit.id() {
            debug!("{} already up to date", self.github_repo);
            return Ok(());
        }

        let fast_forward = self
            .repo
            .merge_base(head.id(), remote_commit.id())
            .map(|base| base == head.id())
            .unwrap_or(false);
        debug!(
            "{} {} to {}",
            if fast_forward { "Fast-forwarding" } else { "Resetting" },
            self.branch,
            remote_commit.id()
        );

        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.repo
            .reset(remote_commit.as_object(), ResetType::Hard, Some(&mut checkout))
            .map_err(|e| self.prepare_error(stage, "could not reset to remote tip", e))
    }

    /// Stage every change in the working tree, deletions included, and
    /// commit it on the current branch.
    pub fn commit_changes(&self, message: &str) -> PublisherResult<CommitOutcome> {
        let repository = self.github_repo.to_string();
        let commit_error =
            |message: &str, e: git2::Error| PublisherError::commit_error_with_source(&repository, message, e);

        let mut index = self
            .repo
            .index()
            .map_err(|e| commit_error("could not open index", e))?;
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .map_err(|e| commit_error("could not stage files", e))?;
        index
            .update_all(["*"].iter(), None)
            .map_err(|e| commit_error("could not stage deletions", e))?;
        index
            .write()
            .map_err(|e| commit_error("could not write index", e))?;

        let tree_id = index
            .write_tree()
            .map_err(|e| commit_error("could not write tree", e))?;
        let parent = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .map_err(|e| commit_error("could not resolve HEAD", e))?;

        if parent.tree_id() == tree_id {
            info!("No changes to commit in {}", self.github_repo);
            return Ok(CommitOutcome::Unchanged);
        }

        let identity = match &self.options.identity {
            Some(identity) => identity.clone(),
            None => Identity::from_git_config().map_err(|e| {
                commit_error("user.name and user.email must be set in the git configuration", e)
            })?,
        };
        let signature = identity
            .signature()
            .map_err(|e| commit_error("invalid commit identity", e))?;
        let tree = self
            .repo
            .find_tree(tree_id)
            .map_err(|e| commit_error("could not read tree", e))?;

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &[&parent])
            .map_err(|e| commit_error("could not create commit", e))?;

        debug!("Committed {} as {} <{}>", oid, identity.name, identity.email);
        Ok(CommitOutcome::Committed(oid))
    }

    /// Push the branch to origin. Rejected references fail the push.
    pub fn push(&self) -> PublisherResult<()> {
        let repository = self.github_repo.to_string();
        let mut remote = self.repo.find_remote(ORIGIN).map_err(|e| {
            PublisherError::push_error_with_source(&repository, "remote origin not found", e)
        })?;

        let refspec = format!("{0}:{0}", local_ref(&self.branch));
        debug!("Pushing {} to {}", refspec, ORIGIN);

        let mut rejected = Vec::new();
        {
            let mut callbacks = remote_callbacks(self.options.verbosity);
            callbacks.push_update_reference(|refname, status| {
                if let Some(status) = status {
                    rejected.push(format!("{} rejected: {}", refname, status));
                }
                Ok(())
            });

            let mut push_options = PushOptions::new();
            push_options.remote_callbacks(callbacks);

            remote
                .push(&[refspec.as_str()], Some(&mut push_options))
                .map_err(|e| {
                    let message = e.message().to_string();
                    PublisherError::push_error_with_source(&repository, message, e)
                })?;
        }

        if !rejected.is_empty() {
            return Err(PublisherError::push_error(repository, rejected.join("; ")));
        }

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn github_repo(&self) -> &GithubRepo {
        &self.github_repo
    }

    /// Commit HEAD points to
    pub fn head_commit(&self) -> PublisherResult<Oid> {
        Ok(self.repo.head()?.peel_to_commit()?.id())
    }

    fn prepare_error(
        &self,
        stage: PrepareStage,
        message: impl Into<String>,
        source: git2::Error,
    ) -> PublisherError {
        PublisherError::preparation_error_with_source(
            stage,
            self.github_repo.to_string(),
            message,
            source,
        )
    }
}

fn local_ref(branch: &str) -> String {
    format!("refs/heads/{}", branch)
}

fn remote_tracking_ref(branch: &str) -> String {
    format!("refs/remotes/{}/{}", ORIGIN, branch)
}

/// Single-branch fetch refspec
fn branch_refspec(branch: &str) -> String {
    format!("+{}:{}", local_ref(branch), remote_tracking_ref(branch))
}

/// Callbacks for fetch and push: SSH agent, then credential helpers, then
/// the default credential. Remote progress messages are logged when verbose.
fn remote_callbacks<'a>(verbosity: Verbosity) -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    let mut attempts = 0;

    callbacks.credentials(move |url, username_from_url, allowed_types| {
        attempts += 1;
        if attempts > 3 {
            return Err(git2::Error::from_str(&format!(
                "authentication failed for {}",
                url
            )));
        }

        if allowed_types.contains(CredentialType::SSH_KEY) {
            Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
        } else if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
            let config = git2::Config::open_default()?;
            Cred::credential_helper(&config, url, username_from_url)
        } else {
            Cred::default()
        }
    });

    if verbosity.is_verbose() {
        callbacks.sideband_progress(|data| {
            debug!("remote: {}", String::from_utf8_lossy(data).trim_end());
            true
        });
    }

    callbacks
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use tempfile::TempDir;

    const BRANCH: &str = "gh-pages";

    struct Fixture {
        _temp_dir: TempDir,
        remotes: PathBuf,
        cache: PathBuf,
        github_repo: GithubRepo,
    }

    impl Fixture {
        fn new() -> Self {
            let temp_dir = TempDir::new().unwrap();
            let remotes = temp_dir.path().join("remotes");
            let cache = temp_dir.path().join("cache");
            let github_repo = GithubRepo::new("acme/site").unwrap();

            let bare = Repository::init_bare(remotes.join("acme").join("site.git")).unwrap();
            let blob = bare.blob(b"<h1>old</h1>").unwrap();
            let mut builder = bare.treebuilder(None).unwrap();
            builder.insert("index.html", blob, 0o100644).unwrap();
            let tree = bare.find_tree(builder.write().unwrap()).unwrap();
            let signature = Signature::now("Seed", "seed@example.com").unwrap();
            bare.commit(
                Some("refs/heads/gh-pages"),
                &signature,
                &signature,
                "seed",
                &tree,
                &[],
            )
            .unwrap();

            Self {
                _temp_dir: temp_dir,
                remotes,
                cache,
                github_repo,
            }
        }

        fn options(&self) -> RepositoryOptions {
            RepositoryOptions::new(Verbosity::Normal)
                .with_remote_base(RemoteBase::Custom(self.remotes.display().to_string()))
                .with_identity(Identity::new("Pages Bot", "pages@example.com"))
        }

        fn clone_path(&self, name: &str) -> PathBuf {
            self.cache.join(name)
        }

        fn prepare(&self, name: &str) -> PublisherResult<TargetRepository> {
            TargetRepository::prepare(
                &self.github_repo,
                &self.clone_path(name),
                BRANCH,
                self.options(),
            )
        }

        fn remote_tip(&self) -> Oid {
            let bare = Repository::open_bare(self.remotes.join("acme").join("site.git")).unwrap();
            let tip = bare
                .find_reference("refs/heads/gh-pages")
                .unwrap()
                .peel_to_commit()
                .unwrap()
                .id();
            tip
        }
    }

    #[test]
    fn test_prepare_clones_missing_repository() {
        let fixture = Fixture::new();
        let target = fixture.prepare("site").unwrap();

        assert_eq!(target.branch(), BRANCH);
        assert_eq!(
            fs::read_to_string(target.path().join("index.html")).unwrap(),
            "<h1>old</h1>"
        );
        assert_eq!(target.repo.head().unwrap().shorthand(), Some(BRANCH));
        assert_eq!(target.head_commit().unwrap(), fixture.remote_tip());
    }

    #[test]
    fn test_prepare_reuses_and_cleans_existing_clone() {
        let fixture = Fixture::new();
        let path = fixture.prepare("site").unwrap().path().to_path_buf();

        fs::write(path.join("stray.txt"), "left over").unwrap();
        fs::create_dir_all(path.join("stray_dir/nested")).unwrap();
        fs::write(path.join("stray_dir/nested/file.txt"), "left over").unwrap();
        fs::write(path.join("index.html"), "modified").unwrap();

        let target = fixture.prepare("site").unwrap();
        assert!(!path.join("stray.txt").exists());
        assert!(!path.join("stray_dir").exists());
        assert_eq!(
            fs::read_to_string(target.path().join("index.html")).unwrap(),
            "<h1>old</h1>"
        );
    }

    #[test]
    fn test_prepare_twice_is_idempotent() {
        let fixture = Fixture::new();
        let first = fixture.prepare("site").unwrap();
        let head = first.head_commit().unwrap();
        drop(first);

        let second = fixture.prepare("site").unwrap();
        assert_eq!(second.head_commit().unwrap(), head);
        assert!(second.repo.statuses(None).unwrap().is_empty());
    }

    #[test]
    fn test_prepare_keeps_ignored_files() {
        let fixture = Fixture::new();
        let path = fixture.prepare("site").unwrap().path().to_path_buf();
        fs::create_dir_all(path.join(".git/info")).unwrap();
        fs::write(path.join(".git/info/exclude"), "*.log\n").unwrap();
        fs::write(path.join("build.log"), "ignored").unwrap();

        fixture.prepare("site").unwrap();
        assert!(path.join("build.log").exists());
    }

    #[test]
    fn test_prepare_keeps_ignored_files_in_untracked_directories() {
        let fixture = Fixture::new();
        let path = fixture.prepare("site").unwrap().path().to_path_buf();
        fs::create_dir_all(path.join(".git/info")).unwrap();
        fs::write(path.join(".git/info/exclude"), "*.log\n").unwrap();
        fs::create_dir_all(path.join("tmp/nested")).unwrap();
        fs::write(path.join("tmp/build.log"), "ignored").unwrap();
        fs::write(path.join("tmp/stray.html"), "stray").unwrap();
        fs::create_dir_all(path.join("junk/deeper")).unwrap();
        fs::write(path.join("junk/deeper/page.html"), "stray").unwrap();

        fixture.prepare("site").unwrap();
        assert!(path.join("tmp/build.log").exists());
        assert!(!path.join("tmp/stray.html").exists());
        assert!(!path.join("junk").exists());
    }

    #[test]
    fn test_commit_records_additions_and_deletions() {
        let fixture = Fixture::new();
        let target = fixture.prepare("site").unwrap();

        fs::remove_file(target.path().join("index.html")).unwrap();
        fs::create_dir_all(target.path().join("assets")).unwrap();
        fs::write(target.path().join("assets/app.css"), "body {}").unwrap();

        let outcome = target.commit_changes("Deploy new site").unwrap();
        let oid = outcome.commit_id().expect("a commit");

        let commit = target.repo.find_commit(oid).unwrap();
        assert_eq!(commit.message(), Some("Deploy new site"));
        assert_eq!(commit.author().name(), Some("Pages Bot"));
        let tree = commit.tree().unwrap();
        assert!(tree.get_name("index.html").is_none());
        assert!(tree.get_path(Path::new("assets/app.css")).is_ok());
    }

    #[test]
    fn test_commit_without_changes_is_unchanged() {
        let fixture = Fixture::new();
        let target = fixture.prepare("site").unwrap();
        let head = target.head_commit().unwrap();

        let outcome = target.commit_changes("Nothing").unwrap();
        assert_eq!(outcome, CommitOutcome::Unchanged);
        assert_eq!(target.head_commit().unwrap(), head);
    }

    #[test]
    fn test_push_updates_remote_branch() {
        let fixture = Fixture::new();
        let target = fixture.prepare("site").unwrap();

        fs::write(target.path().join("index.html"), "<h1>new</h1>").unwrap();
        let oid = target
            .commit_changes("Deploy")
            .unwrap()
            .commit_id()
            .unwrap();
        target.push().unwrap();

        assert_eq!(fixture.remote_tip(), oid);
    }

    #[test]
    fn test_pull_moves_to_remote_tip() {
        let fixture = Fixture::new();
        let stale = fixture.prepare("stale").unwrap();
        drop(stale);

        let other = fixture.prepare("other").unwrap();
        fs::write(other.path().join("index.html"), "<h1>newer</h1>").unwrap();
        other.commit_changes("Deploy from elsewhere").unwrap();
        other.push().unwrap();

        let refreshed = fixture.prepare("stale").unwrap();
        assert_eq!(refreshed.head_commit().unwrap(), fixture.remote_tip());
        assert_eq!(
            fs::read_to_string(refreshed.path().join("index.html")).unwrap(),
            "<h1>newer</h1>"
        );
    }

    #[test]
    fn test_push_non_fast_forward_is_rejected() {
        let fixture = Fixture::new();
        let first = fixture.prepare("first").unwrap();
        let second = fixture.prepare("second").unwrap();

        fs::write(first.path().join("index.html"), "first").unwrap();
        first.commit_changes("first").unwrap();
        first.push().unwrap();

        fs::write(second.path().join("index.html"), "second").unwrap();
        second.commit_changes("second").unwrap();
        let err = second.push().unwrap_err();
        assert!(matches!(err, PublisherError::PushError { .. }));
    }

    #[test]
    fn test_prepare_missing_branch_fails_in_clone_stage() {
        let fixture = Fixture::new();
        let err = TargetRepository::prepare(
            &fixture.github_repo,
            &fixture.clone_path("site"),
            "does-not-exist",
            fixture.options(),
        )
        .unwrap_err();

        match err {
            PublisherError::RepositoryPreparationError { stage, repository, .. } => {
                assert_eq!(stage, PrepareStage::Clone);
                assert_eq!(repository, "acme/site");
            }
            other => panic!("Expected RepositoryPreparationError, got {:?}", other),
        }
    }

    #[test]
    fn test_prepare_on_non_repository_fails_in_open_stage() {
        let fixture = Fixture::new();
        let path = fixture.clone_path("site");
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("README"), "not a repo").unwrap();

        let err = fixture.prepare("site").unwrap_err();
        assert!(matches!(
            err,
            PublisherError::RepositoryPreparationError {
                stage: PrepareStage::Open,
                ..
            }
        ));
    }

    #[test]
    fn test_branch_refspec() {
        assert_eq!(
            branch_refspec("gh-pages"),
            "+refs/heads/gh-pages:refs/remotes/origin/gh-pages"
        );
    }
}
