//! Flat descriptor set extracted from a resolved proto root
//!
//! Every message, enum, service and method carries its fully-qualified dotted
//! name. The package of a message or enum is its `full_name` minus the trailing
//! `.name` (see [`crate::package_name`]).

use serde::{Deserialize, Serialize};

/// The flat {services, methods, messages, enums} view of one resolved root
///
/// All sequences preserve the order in which the extractor walked the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorSet {
    pub services: Vec<ServiceDescriptor>,
    pub methods: Vec<MethodDescriptor>,
    pub messages: Vec<MessageDescriptor>,
    pub enums: Vec<EnumDescriptor>,
}

impl DescriptorSet {
    /// True when nothing usable was extracted
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
            && self.methods.is_empty()
            && self.messages.is_empty()
            && self.enums.is_empty()
    }

    /// Methods belonging to the given service, in declaration order
    pub fn methods_of<'a>(
        &'a self,
        service: &'a ServiceDescriptor,
    ) -> impl Iterator<Item = &'a MethodDescriptor> + 'a {
        self.methods
            .iter()
            .filter(move |m| m.service_full_name == service.full_name)
    }
}

/// A gRPC service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    pub full_name: String,
    pub package: String,
    pub comment: Option<String>,
}

/// A single RPC method
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub full_name: String,
    pub service_full_name: String,
    /// Fully-qualified request message name
    pub request_type: String,
    /// Fully-qualified response message name
    pub response_type: String,
    pub request_stream: bool,
    pub response_stream: bool,
    pub comment: Option<String>,
}

impl MethodDescriptor {
    /// Neither side streams
    pub fn is_unary(&self) -> bool {
        !self.request_stream && !self.response_stream
    }
}

/// A protobuf message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDescriptor {
    pub name: String,
    pub full_name: String,
    pub comment: Option<String>,
    pub fields: Vec<FieldDescriptor>,
    #[serde(default)]
    pub oneofs: Vec<OneofDescriptor>,
}

/// A message field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub number: u32,
    /// Element type; for maps this is the value type
    pub field_type: FieldType,
    pub repeated: bool,
    /// Key type when the field is a map
    pub map_key: Option<FieldType>,
    /// Declared with proto3 `optional` (or proto2 `optional`)
    pub explicit_optional: bool,
    /// Name of the real (non-synthetic) oneof containing this field
    pub oneof: Option<String>,
    pub comment: Option<String>,
}

impl FieldDescriptor {
    pub fn is_map(&self) -> bool {
        self.map_key.is_some()
    }
}

/// A real oneof group and the names of its member fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneofDescriptor {
    pub name: String,
    pub fields: Vec<String>,
}

/// Protobuf field type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    /// Reference to a message by fully-qualified name
    Message(String),
    /// Reference to an enum by fully-qualified name
    Enum(String),
}

impl FieldType {
    /// Name as written in a `.proto` file (or the referenced type's full name)
    pub fn proto_name(&self) -> &str {
        match self {
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::Uint32 => "uint32",
            FieldType::Uint64 => "uint64",
            FieldType::Sint32 => "sint32",
            FieldType::Sint64 => "sint64",
            FieldType::Fixed32 => "fixed32",
            FieldType::Fixed64 => "fixed64",
            FieldType::Sfixed32 => "sfixed32",
            FieldType::Sfixed64 => "sfixed64",
            FieldType::Bool => "bool",
            FieldType::String => "string",
            FieldType::Bytes => "bytes",
            FieldType::Message(name) | FieldType::Enum(name) => name,
        }
    }

    /// 64-bit integer types, which JavaScript cannot represent losslessly
    pub fn is_long(&self) -> bool {
        matches!(
            self,
            FieldType::Int64
                | FieldType::Uint64
                | FieldType::Sint64
                | FieldType::Fixed64
                | FieldType::Sfixed64
        )
    }
}

/// A protobuf enum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDescriptor {
    pub name: String,
    pub full_name: String,
    pub comment: Option<String>,
    pub values: Vec<EnumValueDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValueDescriptor {
    pub name: String,
    pub number: i32,
    pub comment: Option<String>,
}
