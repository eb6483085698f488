//! Git integration via libgit2: the mutable working copy the workflow
//! commits into.
//!
//! [`GitManager`] stages and commits all pending changes and reports the
//! working-copy diff the interpreter uses to confirm a clean tree after each
//! commit.

use std::path::Path;

use git2::{DiffFormat, DiffOptions, IndexAddOption, Repository, Signature};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VcsError {
    /// The working copy was already clean. A replayed commit lands here
    /// instead of minting an empty commit.
    #[error("nothing to commit: the working copy is clean")]
    NothingToCommit,

    #[error("working copy is not clean after commit:\n{0}")]
    DirtyAfterCommit(String),

    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),
}

/// The version-control seam the effect interpreter consumes.
pub trait WorkingCopy {
    /// Stage everything and commit, returning the short hash.
    fn commit_all(&self, message: &str) -> Result<String, VcsError>;

    /// Textual diff of the working copy against HEAD, untracked included.
    /// Empty means clean.
    fn diff_text(&self) -> Result<String, VcsError>;
}

/// Working copy backed by a real git repository.
pub struct GitManager {
    repo: Repository,
}

impl GitManager {
    /// Open an existing git repository at the given path.
    pub fn open(path: &Path) -> Result<Self, VcsError> {
        let repo = Repository::open(path)?;
        Ok(Self { repo })
    }

    /// Name of the currently checked-out branch.
    pub fn current_branch(&self) -> Result<String, VcsError> {
        let head = self.repo.head()?;
        let name = head
            .shorthand()
            .ok_or_else(|| git2::Error::from_str("branch name is not valid UTF-8"))?
            .to_string();
        Ok(name)
    }
}

impl WorkingCopy for GitManager {
    fn commit_all(&self, message: &str) -> Result<String, VcsError> {
        let mut index = self.repo.index()?;
        index.add_all(
            ["*"].iter(),
            IndexAddOption::DEFAULT,
            Some(&mut |path: &Path, _: &[u8]| -> i32 {
                let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                // Files excluded from staging so secrets never land in a commit.
                let excluded = ["helmsman.toml", ".env", ".env.local"];
                if excluded.contains(&name) || name.ends_with(".key") {
                    1 // skip
                } else {
                    0 // add
                }
            }),
        )?;
        index.write()?;

        let tree_oid = index.write_tree()?;
        let tree = self.repo.find_tree(tree_oid)?;
        let parent = self.repo.head()?.peel_to_commit()?;

        if parent.tree_id() == tree_oid {
            return Err(VcsError::NothingToCommit);
        }

        let sig = self
            .repo
            .signature()
            .or_else(|_| Signature::now("helmsman", "helmsman@localhost"))?;

        let commit_oid = self
            .repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])?;

        let short = &commit_oid.to_string()[..7];
        Ok(short.to_string())
    }

    fn diff_text(&self) -> Result<String, VcsError> {
        let head_tree = self.repo.head()?.peel_to_tree()?;
        let mut opts = DiffOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .show_untracked_content(true);
        let diff = self
            .repo
            .diff_tree_to_workdir_with_index(Some(&head_tree), Some(&mut opts))?;

        let mut text = String::new();
        diff.print(DiffFormat::Patch, |_, _, line| {
            text.push(line.origin());
            text.push_str(std::str::from_utf8(line.content()).unwrap_or(""));
            true
        })?;
        Ok(text)
    }
}
