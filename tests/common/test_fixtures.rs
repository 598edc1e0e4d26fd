//! Test fixtures for creating projects and remote repositories
//!
//! Layout of a [`PublishFixture`] inside its temporary directory:
//!
//! ```text
//! project/            source repository, one commit
//! remotes/<o>/<n>.git bare "remote" repositories
//! cache/              replaces the user cache directory
//! home/               HOME for CLI runs, holds .gitconfig
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use git2::{Oid, Repository, Signature};
use tempfile::TempDir;

use publisher::application::use_cases::publish_site::PublishSiteConfig;
use publisher::domain::value_objects::github_repo::RemoteBase;
use publisher::infrastructure::git::Identity;

pub const BOT_NAME: &str = "Pages Bot";
pub const BOT_EMAIL: &str = "pages@example.com";

/// A project ready to publish, with its remotes and cache
pub struct PublishFixture {
    pub temp_dir: TempDir,
    pub project: PathBuf,
    pub remotes: PathBuf,
    pub cache: PathBuf,
    pub home: PathBuf,
}

impl PublishFixture {
    /// Project repository with one commit and an empty remotes directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let project = temp_dir.path().join("project");
        let remotes = temp_dir.path().join("remotes");
        let cache = temp_dir.path().join("cache");
        let home = temp_dir.path().join("home");

        for dir in [&project, &remotes, &cache, &home] {
            fs::create_dir_all(dir).expect("Failed to create fixture directory");
        }
        fs::write(
            home.join(".gitconfig"),
            format!("[user]\n\tname = {}\n\temail = {}\n", BOT_NAME, BOT_EMAIL),
        )
        .expect("Failed to write .gitconfig");

        let fixture = Self {
            temp_dir,
            project,
            remotes,
            cache,
            home,
        };
        Repository::init(&fixture.project).expect("Failed to init project");
        fixture.write_project_file("README.md", "# site\n");
        fixture.commit_project("initial commit");
        fixture
    }

    /// Create `remotes/<repo>.git` whose `branch` holds `files`
    pub fn create_remote(&self, repo: &str, branch: &str, files: &[(&str, &str)]) -> PathBuf {
        let path = self.remote_path(repo);
        let bare = Repository::init_bare(&path).expect("Failed to init bare remote");

        let mut builder = bare.treebuilder(None).expect("Failed to create tree builder");
        for (name, contents) in files {
            let blob = bare.blob(contents.as_bytes()).expect("Failed to write blob");
            builder
                .insert(name, blob, 0o100644)
                .expect("Failed to insert blob");
        }
        let tree = bare
            .find_tree(builder.write().expect("Failed to write tree"))
            .expect("Failed to find tree");

        let signature = Signature::now("Seed", "seed@example.com").unwrap();
        bare.commit(
            Some(&format!("refs/heads/{}", branch)),
            &signature,
            &signature,
            "seed",
            &tree,
            &[],
        )
        .expect("Failed to seed remote");
        bare.set_head(&format!("refs/heads/{}", branch)).unwrap();
        path
    }

    pub fn remote_path(&self, repo: &str) -> PathBuf {
        self.remotes.join(format!("{}.git", repo))
    }

    pub fn open_remote(&self, repo: &str) -> Repository {
        Repository::open_bare(self.remote_path(repo)).expect("Failed to open remote")
    }

    /// Where the local clone of `repo` lives
    pub fn clone_path(&self, repo: &str) -> PathBuf {
        self.cache.join("publisher").join("repos").join(repo)
    }

    pub fn write_project_file(&self, relative: &str, contents: &str) -> PathBuf {
        write_file(&self.project, relative, contents)
    }

    pub fn write_config(&self, yaml: &str) -> PathBuf {
        self.write_project_file("publisher.yml", yaml)
    }

    /// Commit everything in the project and return the new HEAD
    pub fn commit_project(&self, message: &str) -> Oid {
        let repo = Repository::open(&self.project).expect("Failed to open project");
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let signature = Signature::now("Dev", "dev@example.com").unwrap();

        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .expect("Failed to commit project")
    }

    pub fn project_head(&self) -> String {
        let repo = Repository::open(&self.project).unwrap();
        let id = repo.head().unwrap().peel_to_commit().unwrap().id();
        id.to_string()
    }

    /// Publish settings pointing at this fixture's remotes and cache
    pub fn publish_config(&self, target: &str) -> PublishSiteConfig {
        PublishSiteConfig::new(target, self.project.clone())
            .with_cache_dir(Some(self.cache.clone()))
            .with_remote_base(RemoteBase::Custom(self.remotes.display().to_string()))
            .with_identity(Identity::new(BOT_NAME, BOT_EMAIL))
    }
}

/// Write `contents` to `root/relative`, creating parent directories
pub fn write_file(root: &Path, relative: &str, contents: &str) -> PathBuf {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    fs::write(&path, contents).expect("Failed to write file");
    path
}
