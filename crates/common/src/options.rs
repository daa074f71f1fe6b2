//! Generation options
//!
//! Options can be built in code or loaded from a YAML file. The only field that
//! cannot come from YAML is the `resolve_path` hook.

use crate::source::ProtoSource;
use crate::{GeneratorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default output directory, relative to the working directory
pub const DEFAULT_BASE_DIR: &str = "code-gen";

/// Default side-channel cache directory, relative to the working directory
pub const DEFAULT_CACHE_DIR: &str = ".grpc-code-gen";

/// Default gRPC client library imported by generated code
pub const DEFAULT_GRPC_NPM_NAME: &str = "grpc";

/// Maps a repository checkout to the directory holding its `.proto` tree
///
/// Called with the repository URL and the checkout directory.
pub type ResolvePath = Arc<dyn Fn(&str, &Path) -> PathBuf + Send + Sync>;

/// Code-generation target language
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Javascript,
    #[default]
    Typescript,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Javascript => write!(f, "javascript"),
            Target::Typescript => write!(f, "typescript"),
        }
    }
}

/// How 64-bit integers are represented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LongsAs {
    String,
    Number,
}

/// How enum values are represented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnumsAs {
    String,
}

/// How `bytes` fields are represented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BytesAs {
    String,
    Array,
}

/// Options forwarded to `@grpc/proto-loader`
///
/// They also shape the emitted type declarations so the declared types match
/// what the loader produces at run time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoaderOptions {
    /// Keep field names as written instead of converting to camelCase
    pub keep_case: bool,
    pub longs: Option<LongsAs>,
    pub enums: Option<EnumsAs>,
    pub bytes: Option<BytesAs>,
    /// Populate default values, so scalar fields are always present
    pub defaults: bool,
    pub arrays: bool,
    pub objects: bool,
    /// Add a virtual property naming the set member of each oneof
    pub oneofs: bool,
}

/// Everything one generation run needs
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerateOptions {
    /// Output directory, cleaned and regenerated on every run
    pub base_dir: PathBuf,
    /// Directory receiving the consolidated `root.json` proto dump
    pub cache_dir: PathBuf,
    pub target: Target,
    /// Runtime configuration module imported by the generated code
    pub config_file_path: Option<PathBuf>,
    /// Base repository first, then one repository per service source
    pub git_urls: Vec<String>,
    pub branch: Option<String>,
    pub access_token: Option<String>,
    #[serde(skip)]
    pub resolve_path: Option<ResolvePath>,
    pub grpc_npm_name: String,
    pub loader_options: LoaderOptions,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from(DEFAULT_BASE_DIR),
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            target: Target::default(),
            config_file_path: None,
            git_urls: Vec::new(),
            branch: None,
            access_token: None,
            resolve_path: None,
            grpc_npm_name: DEFAULT_GRPC_NPM_NAME.to_string(),
            loader_options: LoaderOptions::default(),
        }
    }
}

impl fmt::Debug for GenerateOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerateOptions")
            .field("base_dir", &self.base_dir)
            .field("cache_dir", &self.cache_dir)
            .field("target", &self.target)
            .field("config_file_path", &self.config_file_path)
            .field("git_urls", &self.git_urls)
            .field("branch", &self.branch)
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("resolve_path", &self.resolve_path.as_ref().map(|_| "<fn>"))
            .field("grpc_npm_name", &self.grpc_npm_name)
            .field("loader_options", &self.loader_options)
            .finish()
    }
}

impl GenerateOptions {
    /// Create options for the given repositories with every other value defaulted
    pub fn new(git_urls: Vec<String>) -> Self {
        Self {
            git_urls,
            ..Self::default()
        }
    }

    /// Load options from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GeneratorError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        serde_yaml::from_str(&content).map_err(|e| {
            GeneratorError::Configuration(format!(
                "Failed to parse config YAML from {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Check the repository list and derive the service sources
    ///
    /// Returns the base URL and one [`ProtoSource`] per remaining URL, in input
    /// order. Nothing on disk is touched.
    pub fn sources(&self) -> Result<(&str, Vec<ProtoSource>)> {
        let (base, rest) = match self.git_urls.split_first() {
            Some((base, rest)) if !rest.is_empty() => (base, rest),
            _ => {
                return Err(GeneratorError::Configuration(format!(
                    "gitUrls needs a base repository plus at least one service repository, got {}",
                    self.git_urls.len()
                )))
            }
        };

        let sources = rest
            .iter()
            .map(|url| ProtoSource::parse(url))
            .collect::<Result<Vec<_>>>()?;

        Ok((base.as_str(), sources))
    }

    pub fn with_resolve_path<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &Path) -> PathBuf + Send + Sync + 'static,
    {
        self.resolve_path = Some(Arc::new(hook));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let options = GenerateOptions::default();
        assert_eq!(options.base_dir, PathBuf::from("code-gen"));
        assert_eq!(options.cache_dir, PathBuf::from(".grpc-code-gen"));
        assert_eq!(options.grpc_npm_name, "grpc");
        assert_eq!(options.target, Target::Typescript);
    }

    #[test]
    fn test_sources_requires_two_urls() {
        let options = GenerateOptions::new(vec!["org/base-proto".to_string()]);
        assert!(matches!(
            options.sources(),
            Err(GeneratorError::Configuration(_))
        ));

        let options = GenerateOptions::new(vec![]);
        assert!(options.sources().is_err());
    }

    #[test]
    fn test_sources_skip_base() {
        let options = GenerateOptions::new(vec![
            "org/base-proto".to_string(),
            "org/userSvc-proto".to_string(),
            "org/orderSvc-proto".to_string(),
        ]);
        let (base, sources) = options.sources().unwrap();
        assert_eq!(base, "org/base-proto");
        let services: Vec<&str> = sources.iter().map(|s| s.service.as_str()).collect();
        assert_eq!(services, vec!["userSvc", "orderSvc"]);
    }

    #[test]
    fn test_sources_reject_bad_url() {
        let options = GenerateOptions::new(vec![
            "org/base-proto".to_string(),
            "https://example.com/not-a-proto-repo".to_string(),
        ]);
        assert!(matches!(
            options.sources(),
            Err(GeneratorError::Configuration(_))
        ));
    }

    #[test]
    fn test_load_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
baseDir: out/grpc
gitUrls:
  - git@gitlab.com:org/base-proto.git
  - git@gitlab.com:org/user-proto.git
branch: develop
grpcNpmName: "@grpc/grpc-js"
loaderOptions:
  keepCase: true
  longs: String
  enums: String
  oneofs: true
"#
        )
        .unwrap();

        let options = GenerateOptions::load(file.path()).unwrap();
        assert_eq!(options.base_dir, PathBuf::from("out/grpc"));
        assert_eq!(options.cache_dir, PathBuf::from(".grpc-code-gen"));
        assert_eq!(options.git_urls.len(), 2);
        assert_eq!(options.branch.as_deref(), Some("develop"));
        assert_eq!(options.grpc_npm_name, "@grpc/grpc-js");
        assert!(options.loader_options.keep_case);
        assert_eq!(options.loader_options.longs, Some(LongsAs::String));
        assert_eq!(options.loader_options.enums, Some(EnumsAs::String));
        assert!(options.loader_options.oneofs);
        assert!(!options.loader_options.defaults);
    }

    #[test]
    fn test_debug_hides_token() {
        let mut options = GenerateOptions::default();
        options.access_token = Some("secret-token".to_string());
        let debug = format!("{:?}", options);
        assert!(!debug.contains("secret-token"));
    }
}
