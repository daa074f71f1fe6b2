//! Protobuf descriptor reflection
//!
//! Turns a compiled `FileDescriptorSet` into the two views the generator
//! consumes: the flat descriptor set and the protobufjs-style JSON tree.
//!
//! ## Example
//! ```rust,ignore
//! use grpc_code_gen_parser::DescriptorPoolRoot;
//! use grpc_code_gen_common::ProtoRoot;
//!
//! let root = DescriptorPoolRoot::from_file("service.pb")?;
//! let descriptors = root.extract()?;
//! let json = root.to_json(true)?;
//! ```

mod extractor;
mod json;
mod root;

pub use extractor::extract_descriptors;
pub use json::pool_to_json;
pub use root::DescriptorPoolRoot;
