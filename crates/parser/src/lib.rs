//! Proto resolution and descriptor extraction
//!
//! This crate provides the concrete collaborators behind the generator's
//! resolver interface:
//!
//! - [`GitProtoResolver`] checks out the base and service repositories and
//!   compiles their `.proto` trees with `protoc`
//! - [`DescriptorPoolRoot`] wraps the linked descriptor pool and exposes the
//!   flat descriptor set and the protobufjs-style JSON tree
//!
//! ## Example
//! ```rust,ignore
//! use grpc_code_gen_common::{ProtoResolver, ResolveRequest};
//! use grpc_code_gen_parser::GitProtoResolver;
//!
//! let root = GitProtoResolver::new()
//!     .resolve(ResolveRequest {
//!         git_urls: vec![base.into(), source.into()],
//!         ..Default::default()
//!     })
//!     .await?;
//! let descriptors = root.extract()?;
//! ```

pub mod git;
mod protobuf;
mod resolver;

pub use protobuf::{extract_descriptors, pool_to_json, DescriptorPoolRoot};
pub use resolver::GitProtoResolver;
