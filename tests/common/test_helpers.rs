//! Helpers for inspecting repositories after a publish

use git2::{Commit, ObjectType, Repository, TreeWalkMode, TreeWalkResult};

/// Tip commit of `branch`
pub fn branch_tip<'r>(repo: &'r Repository, branch: &str) -> Commit<'r> {
    repo.find_reference(&format!("refs/heads/{}", branch))
        .and_then(|r| r.peel_to_commit())
        .unwrap_or_else(|e| panic!("Branch {} not found: {}", branch, e))
}

/// Every file path in the commit's tree, `/`-separated and sorted
pub fn tree_files(commit: &Commit<'_>) -> Vec<String> {
    let tree = commit.tree().expect("Commit has no tree");
    let mut files = Vec::new();
    tree.walk(TreeWalkMode::PreOrder, |root, entry| {
        if entry.kind() == Some(ObjectType::Blob) {
            files.push(format!("{}{}", root, entry.name().unwrap_or_default()));
        }
        TreeWalkResult::Ok
    })
    .expect("Failed to walk tree");
    files.sort();
    files
}

/// Contents of `path` in the commit's tree
pub fn file_in_commit(repo: &Repository, commit: &Commit<'_>, path: &str) -> Option<String> {
    let entry = commit.tree().ok()?.get_path(std::path::Path::new(path)).ok()?;
    let blob = repo.find_blob(entry.id()).ok()?;
    Some(String::from_utf8_lossy(blob.content()).into_owned())
}
