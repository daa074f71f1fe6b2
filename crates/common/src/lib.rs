//! Common types and utilities for grpc-code-gen
//!
//! This crate contains the shared data model used by the parser, generator,
//! and CLI components: the error taxonomy, the flat descriptor set extracted
//! from a resolved proto root, the namespace tree built from it, proto source
//! identity, generation options, and the collaborator traits the pipeline
//! consumes.

pub mod descriptor;
pub mod namespace;
pub mod options;
pub mod paths;
pub mod resolver;
pub mod source;

pub use descriptor::{
    DescriptorSet, EnumDescriptor, EnumValueDescriptor, FieldDescriptor, FieldType,
    MessageDescriptor, MethodDescriptor, OneofDescriptor, ServiceDescriptor,
};
pub use namespace::{build_namespace, package_name, Namespace};
pub use options::{
    BytesAs, EnumsAs, GenerateOptions, LoaderOptions, LongsAs, ResolvePath, Target,
};
pub use resolver::{
    strip_packages, ProtoResolver, ProtoRoot, ResolveRequest, StaticRoot, WELL_KNOWN_PACKAGES,
};
pub use source::ProtoSource;

use thiserror::Error;

/// Errors that can occur during code generation
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to resolve protos for {url}: {message}")]
    Resolution { url: String, message: String },

    #[error("No proto source yielded any services, messages or enums")]
    EmptyResult,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl GeneratorError {
    /// Build a resolution error for the given repository URL
    pub fn resolution(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        GeneratorError::Resolution {
            url: url.into(),
            message: message.to_string(),
        }
    }
}

/// Result type for generator operations
pub type Result<T> = std::result::Result<T, GeneratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_error_message() {
        let err = GeneratorError::resolution("git@host:org/user-proto.git", "auth failed");
        assert_eq!(
            err.to_string(),
            "Failed to resolve protos for git@host:org/user-proto.git: auth failed"
        );
    }
}
