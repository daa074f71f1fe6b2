//! Proto root backed by a prost-reflect descriptor pool

use grpc_code_gen_common::{DescriptorSet, GeneratorError, ProtoRoot, Result};
use prost::Message;
use prost_reflect::DescriptorPool;
use prost_types::FileDescriptorSet;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// A fully linked proto tree
///
/// Imports are already resolved when the pool is built, so the root is ready
/// for extraction as soon as it exists.
#[derive(Debug, Clone)]
pub struct DescriptorPoolRoot {
    pool: DescriptorPool,
}

impl DescriptorPoolRoot {
    /// Load a FileDescriptorSet from a binary file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path.as_ref()).map_err(|e| {
            GeneratorError::Parse(format!(
                "Failed to read FileDescriptorSet file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_file_descriptor_set(&bytes)
    }

    /// Decode a FileDescriptorSet from bytes
    pub fn from_file_descriptor_set(bytes: &[u8]) -> Result<Self> {
        let file_descriptor_set = FileDescriptorSet::decode(bytes).map_err(|e| {
            GeneratorError::Parse(format!("Failed to decode FileDescriptorSet: {}", e))
        })?;

        let pool = DescriptorPool::from_file_descriptor_set(file_descriptor_set).map_err(|e| {
            GeneratorError::Parse(format!("Failed to create DescriptorPool: {}", e))
        })?;

        Ok(Self { pool })
    }

    /// Get reference to the underlying descriptor pool
    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }
}

impl ProtoRoot for DescriptorPoolRoot {
    fn to_json(&self, keep_comments: bool) -> Result<Value> {
        Ok(super::pool_to_json(&self.pool, keep_comments))
    }

    fn extract(&self) -> Result<DescriptorSet> {
        Ok(super::extract_descriptors(&self.pool))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_descriptor_set() {
        let file_descriptor_set = FileDescriptorSet { file: vec![] };
        let bytes = file_descriptor_set.encode_to_vec();

        let root = DescriptorPoolRoot::from_file_descriptor_set(&bytes).unwrap();
        assert!(root.extract().unwrap().is_empty());
    }

    #[test]
    fn test_garbage_bytes_fail() {
        let result = DescriptorPoolRoot::from_file_descriptor_set(&[0xff, 0xff, 0xff]);
        assert!(matches!(result, Err(GeneratorError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = DescriptorPoolRoot::from_file("/nonexistent/descriptor.pb");
        assert!(matches!(result, Err(GeneratorError::Parse(_))));
    }
}
