//! Git-backed document history
//!
//! Reads commits and trees through libgit2 directly. Materializing a
//! state writes blobs into a separate directory; the repository's working
//! tree, index and HEAD are never touched.

use crate::types::*;
use crate::HistorySource;
use git2::{ErrorCode, ObjectType, Oid, Repository, Sort, Tree, TreeWalkMode, TreeWalkResult};
use std::path::{Component, Path, PathBuf};

pub struct GitHistory {
    repo: Repository,
    revision: String,
}

impl GitHistory {
    /// Open the repository containing `path`, walking history back from
    /// `revision` (a branch, tag, hash or `HEAD`).
    pub fn open(path: impl AsRef<Path>, revision: impl Into<String>) -> Result<Self> {
        let repo = Repository::discover(path.as_ref())?;
        log::debug!("Opened repository at {}", repo.path().display());
        Ok(Self {
            repo,
            revision: revision.into(),
        })
    }

    fn start_commit(&self) -> Result<Oid> {
        if self.repo.is_empty()? {
            return Err(HistoryError::NoCommits(self.revision.clone()));
        }
        let object = self.repo.revparse_single(&self.revision).map_err(|e| match e.code() {
            ErrorCode::NotFound | ErrorCode::UnbornBranch => {
                HistoryError::NoCommits(self.revision.clone())
            }
            _ => HistoryError::Git(e),
        })?;
        Ok(object.peel_to_commit()?.id())
    }
}

impl HistorySource for GitHistory {
    fn states(&self) -> Result<Vec<HistoricalState>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)?;
        revwalk.push(self.start_commit()?)?;

        let mut states = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            let commit = self.repo.find_commit(oid)?;
            states.push(HistoricalState::new(
                oid.to_string(),
                commit.summary().unwrap_or(""),
                commit.time().seconds(),
            ));
        }

        log::debug!("{} commits reachable from {}", states.len(), self.revision);
        Ok(states)
    }

    fn materialize(&self, state: &HistoricalState, dest: &Path) -> Result<()> {
        let oid = Oid::from_str(&state.id)?;
        let tree = self.repo.find_commit(oid)?.tree()?;
        write_tree(&self.repo, &tree, dest)
    }
}

/// Git mode of a symbolic link entry
const SYMLINK_MODE: i32 = 0o120000;

/// Write every blob of `tree` below `dest`, recreating directories.
///
/// Symbolic links are recreated when they stay inside `dest` and skipped
/// otherwise. Entry names that could leave `dest` fail the state.
fn write_tree(repo: &Repository, tree: &Tree<'_>, dest: &Path) -> Result<()> {
    let mut failure = None;

    let walked = tree.walk(TreeWalkMode::PreOrder, |root, entry| {
        // Submodules and nested trees need no file of their own
        if entry.kind() != Some(ObjectType::Blob) {
            return TreeWalkResult::Ok;
        }
        let Some(name) = entry.name() else {
            return TreeWalkResult::Skip;
        };

        let written = entry_path(dest, root, name).and_then(|path| {
            if entry.filemode() == SYMLINK_MODE {
                write_symlink(repo, entry.id(), dest, &path)
            } else {
                write_blob(repo, entry.id(), &path)
            }
        });
        match written {
            Ok(()) => TreeWalkResult::Ok,
            Err(e) => {
                failure = Some(e);
                TreeWalkResult::Abort
            }
        }
    });

    if let Some(e) = failure {
        return Err(e);
    }
    walked?;
    Ok(())
}

/// Destination of the entry `name` in the tree directory `root`
fn entry_path(dest: &Path, root: &str, name: &str) -> Result<PathBuf> {
    let mut path = dest.to_path_buf();
    for part in root.split('/').filter(|part| !part.is_empty()).chain([name]) {
        if part.is_empty() || part == "." || part == ".." || part.contains(['/', '\\']) {
            return Err(HistoryError::UnsafePath(format!("{}{}", root, name)));
        }
        path.push(part);
    }
    Ok(path)
}

/// Whether `target`, read relative to the directory of `link`, stays
/// inside `dest` without following any links
fn link_stays_inside(dest: &Path, link: &Path, target: &Path) -> bool {
    let Some(parent) = link.parent().and_then(|p| p.strip_prefix(dest).ok()) else {
        return false;
    };
    let mut depth = parent.components().count();
    for component in target.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(up) => depth = up,
                None => return false,
            },
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

fn write_blob(repo: &Repository, id: Oid, path: &Path) -> Result<()> {
    let blob = repo.find_blob(id)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, blob.content())?;
    Ok(())
}

fn write_symlink(repo: &Repository, id: Oid, dest: &Path, path: &Path) -> Result<()> {
    let blob = repo.find_blob(id)?;
    let Ok(target) = std::str::from_utf8(blob.content()) else {
        log::warn!("Skipping symlink {} with a non-UTF-8 target", path.display());
        return Ok(());
    };
    let target = Path::new(target);
    if !link_stays_inside(dest, path, target) {
        log::warn!(
            "Skipping symlink {} -> {}: target leaves the checkout",
            path.display(),
            target.display()
        );
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    create_symlink(target, path)
}

#[cfg(unix)]
fn create_symlink(target: &Path, path: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, path)?;
    Ok(())
}

#[cfg(not(unix))]
fn create_symlink(target: &Path, path: &Path) -> Result<()> {
    log::warn!(
        "Skipping symlink {} -> {}: not supported on this platform",
        path.display(),
        target.display()
    );
    Ok(())
}
