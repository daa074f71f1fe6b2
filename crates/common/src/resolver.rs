//! Collaborator interfaces consumed by the pipeline
//!
//! Fetching repositories, resolving imports and reflecting over the result are
//! owned by implementations of these traits (see the parser crate). The
//! pipeline only sees a resolved root it can dump to JSON and extract
//! descriptors from.

use crate::descriptor::DescriptorSet;
use crate::options::ResolvePath;
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Request to resolve one service source against the shared base
#[derive(Clone, Default)]
pub struct ResolveRequest {
    /// `[base, source]`
    pub git_urls: Vec<String>,
    pub branch: Option<String>,
    pub access_token: Option<String>,
    pub resolve_path: Option<ResolvePath>,
}

impl ResolveRequest {
    /// URL of the service source (the last one)
    pub fn source_url(&self) -> &str {
        self.git_urls.last().map(String::as_str).unwrap_or_default()
    }
}

impl fmt::Debug for ResolveRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveRequest")
            .field("git_urls", &self.git_urls)
            .field("branch", &self.branch)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("resolve_path", &self.resolve_path.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// A fully linked proto definition tree
pub trait ProtoRoot: Send + Sync {
    /// Plain-object form of the tree in protobufjs `toJSON` layout
    fn to_json(&self, keep_comments: bool) -> Result<Value>;

    /// Flat services, methods, messages and enums
    fn extract(&self) -> Result<DescriptorSet>;
}

/// Resolves a `[base, source]` pair of repositories into one proto root
#[async_trait]
pub trait ProtoResolver: Send + Sync {
    async fn resolve(&self, request: ResolveRequest) -> Result<Box<dyn ProtoRoot>>;
}

/// Top-level packages dropped from every source's JSON dump
///
/// The base repository injects these into every source, so they would be
/// repeated once per service otherwise.
pub const WELL_KNOWN_PACKAGES: &[&str] = &["google", "common"];

/// Remove top-level packages from a `{ nested: { ... } }` tree
pub fn strip_packages(json: &mut Value, packages: &[&str]) {
    if let Some(nested) = json.get_mut("nested").and_then(Value::as_object_mut) {
        for package in packages {
            nested.remove(*package);
        }
    }
}

/// A proto root whose JSON and descriptors are already known
#[derive(Debug, Clone, Default)]
pub struct StaticRoot {
    pub json: Value,
    pub descriptors: DescriptorSet,
}

impl StaticRoot {
    pub fn new(json: Value, descriptors: DescriptorSet) -> Self {
        Self { json, descriptors }
    }
}

impl ProtoRoot for StaticRoot {
    fn to_json(&self, _keep_comments: bool) -> Result<Value> {
        Ok(self.json.clone())
    }

    fn extract(&self) -> Result<DescriptorSet> {
        Ok(self.descriptors.clone())
    }
}
