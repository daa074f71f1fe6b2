//! Git repository checkout for proto sources

use git2::{build::RepoBuilder, Cred, FetchOptions, RemoteCallbacks};
use grpc_code_gen_common::{GeneratorError, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Cloned repository, removed from disk when dropped
pub struct ClonedRepo {
    /// Keeps the checkout alive
    _temp_dir: TempDir,
    repo_path: PathBuf,
}

impl ClonedRepo {
    /// Clone a git repository to a temporary directory
    ///
    /// # Arguments
    /// * `url` - Git repository URL (https:// or git@)
    /// * `branch` - Optional branch or tag to check out
    /// * `access_token` - Optional token used as the password for https remotes
    ///
    /// Blocking; run it on a blocking thread from async code.
    pub fn clone(url: &str, branch: Option<&str>, access_token: Option<&str>) -> Result<Self> {
        let temp_dir = TempDir::new().map_err(|e| {
            GeneratorError::resolution(url, format!("Failed to create temp dir: {}", e))
        })?;

        let token = access_token.map(str::to_string);
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |_url, username, allowed| {
            if let Some(token) = &token {
                if allowed.is_user_pass_plaintext() {
                    return Cred::userpass_plaintext("oauth2", token);
                }
            }
            Cred::ssh_key_from_agent(username.unwrap_or("git"))
        });
        callbacks.transfer_progress(|stats| {
            if stats.total_objects() > 0 && stats.received_objects() == stats.total_objects() {
                debug!(
                    "Resolving deltas {}/{}",
                    stats.indexed_deltas(),
                    stats.total_deltas()
                );
            }
            true
        });

        let mut fetch_options = FetchOptions::new();
        fetch_options.remote_callbacks(callbacks);

        let mut repo_builder = RepoBuilder::new();
        repo_builder.fetch_options(fetch_options);
        if let Some(branch_name) = branch {
            repo_builder.branch(branch_name);
        }

        debug!(url, branch = ?branch, "Cloning repository");
        let repo = repo_builder
            .clone(url, temp_dir.path())
            .map_err(|e| GeneratorError::resolution(url, format!("Failed to clone: {}", e)))?;

        let repo_path = repo
            .workdir()
            .ok_or_else(|| GeneratorError::resolution(url, "Repository has no working directory"))?
            .to_path_buf();

        debug!(url, path = %repo_path.display(), "Cloned repository");

        Ok(Self {
            _temp_dir: temp_dir,
            repo_path,
        })
    }

    /// Path to the checkout
    pub fn path(&self) -> &Path {
        &self.repo_path
    }
}
