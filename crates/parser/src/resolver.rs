//! Resolves `[base, source]` repository pairs into descriptor pools
//!
//! Both repositories are checked out, every `.proto` file under their proto
//! roots is compiled with `protoc` (imports included, comments kept) and the
//! resulting descriptor set is loaded into a [`DescriptorPoolRoot`].

use crate::git::ClonedRepo;
use crate::protobuf::DescriptorPoolRoot;
use async_trait::async_trait;
use grpc_code_gen_common::{GeneratorError, ProtoResolver, ProtoRoot, ResolveRequest, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Proto resolver backed by git checkouts and `protoc`
#[derive(Debug, Clone)]
pub struct GitProtoResolver {
    protoc: PathBuf,
}

impl Default for GitProtoResolver {
    fn default() -> Self {
        Self {
            protoc: std::env::var_os("PROTOC")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("protoc")),
        }
    }
}

impl GitProtoResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific `protoc` binary
    pub fn with_protoc(mut self, protoc: impl Into<PathBuf>) -> Self {
        self.protoc = protoc.into();
        self
    }

    async fn checkout(request: &ResolveRequest, url: &str) -> Result<ClonedRepo> {
        let url_owned = url.to_string();
        let branch = request.branch.clone();
        let token = request.access_token.clone();

        tokio::task::spawn_blocking(move || {
            ClonedRepo::clone(&url_owned, branch.as_deref(), token.as_deref())
        })
        .await
        .map_err(|e| GeneratorError::resolution(url, format!("Checkout task failed: {}", e)))?
    }

    async fn compile(&self, url: &str, include_dirs: &[PathBuf]) -> Result<Vec<u8>> {
        let mut files = Vec::new();
        for dir in include_dirs {
            files.extend(collect_proto_files(dir));
        }
        // The same relative path in two repositories is one protoc input
        files.sort();
        files.dedup();
        if files.is_empty() {
            return Err(GeneratorError::resolution(url, "No .proto files found"));
        }

        let out_dir = tempfile::tempdir()
            .map_err(|e| GeneratorError::resolution(url, format!("Failed to create temp dir: {}", e)))?;
        let out_file = out_dir.path().join("descriptor.pb");

        let mut command = Command::new(&self.protoc);
        for dir in include_dirs {
            command.arg(format!("--proto_path={}", dir.display()));
        }
        command
            .arg("--include_imports")
            .arg("--include_source_info")
            .arg(format!("--descriptor_set_out={}", out_file.display()))
            .args(&files);

        debug!(url, files = files.len(), "Compiling proto files");
        let output = command
            .output()
            .await
            .map_err(|e| GeneratorError::resolution(url, format!("Failed to run protoc: {}", e)))?;

        if !output.status.success() {
            return Err(GeneratorError::resolution(
                url,
                format!(
                    "protoc exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        tokio::fs::read(&out_file)
            .await
            .map_err(|e| GeneratorError::resolution(url, format!("Failed to read descriptor set: {}", e)))
    }
}

#[async_trait]
impl ProtoResolver for GitProtoResolver {
    async fn resolve(&self, request: ResolveRequest) -> Result<Box<dyn ProtoRoot>> {
        let source_url = request.source_url().to_string();
        info!(url = %source_url, "Resolving protos");

        let mut checkouts = Vec::with_capacity(request.git_urls.len());
        for url in &request.git_urls {
            checkouts.push(Self::checkout(&request, url).await?);
        }

        let include_dirs: Vec<PathBuf> = request
            .git_urls
            .iter()
            .zip(&checkouts)
            .map(|(url, repo)| match &request.resolve_path {
                Some(hook) => hook(url, repo.path()),
                None => repo.path().to_path_buf(),
            })
            .collect();

        let bytes = self.compile(&source_url, &include_dirs).await?;
        let root = DescriptorPoolRoot::from_file_descriptor_set(&bytes)
            .map_err(|e| GeneratorError::resolution(&source_url, e))?;

        Ok(Box::new(root))
    }
}

/// `.proto` files under `dir`, relative to it and sorted for stable output
fn collect_proto_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.starts_with('.'))
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "proto"))
        .filter_map(|entry| entry.path().strip_prefix(dir).ok().map(Path::to_path_buf))
        .collect();
    files.sort();
    files
}
