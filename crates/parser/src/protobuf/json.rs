//! Plain-object proto tree in protobufjs `toJSON` layout
//!
//! `@grpc/proto-loader` can rebuild a package definition from this shape with
//! `fromJSON`, which is how the generated object loader consumes the dump.

use super::extractor::leading_comment;
use prost_reflect::{DescriptorPool, FileDescriptor, Kind};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// One reflection object under construction: its own keys plus `nested`
///
/// A message may be reached as the parent of a nested type before it is
/// inserted itself, so bodies are merged rather than replaced.
#[derive(Debug, Default)]
struct JsonNode {
    body: Map<String, Value>,
    nested: BTreeMap<String, JsonNode>,
}

impl JsonNode {
    fn child(&mut self, name: &str) -> &mut JsonNode {
        self.nested.entry(name.to_string()).or_default()
    }

    /// The node for a dotted path, creating levels along the way
    fn namespace_mut(&mut self, path: &str) -> &mut JsonNode {
        path.split('.')
            .filter(|segment| !segment.is_empty())
            .fold(self, |node, segment| node.child(segment))
    }

    /// Merge `body` into the child `name`
    fn merge(&mut self, name: &str, body: Map<String, Value>) {
        self.child(name).body.extend(body);
    }

    fn into_value(self) -> Value {
        let mut object = self.body;
        if !self.nested.is_empty() {
            let nested: Map<String, Value> = self
                .nested
                .into_iter()
                .map(|(name, node)| (name, node.into_value()))
                .collect();
            object.insert("nested".to_string(), Value::Object(nested));
        }
        Value::Object(object)
    }
}

/// Build the `{ nested: { ... } }` tree for every type in the pool
pub fn pool_to_json(pool: &DescriptorPool, keep_comments: bool) -> Value {
    let mut root = JsonNode::default();

    for file in pool.files() {
        let package = file.package_name().to_string();

        for message in file.messages() {
            insert_message(&mut root, &package, &message, keep_comments);
        }
        for enum_type in file.enums() {
            let body = enum_json(&enum_type, keep_comments);
            root.namespace_mut(&package).merge(enum_type.name(), body);
        }
        for service in file.services() {
            let body = service_json(&file, &service, keep_comments);
            root.namespace_mut(&package).merge(service.name(), body);
        }
    }

    root.into_value()
}

fn insert_message(
    root: &mut JsonNode,
    parent_path: &str,
    message: &prost_reflect::MessageDescriptor,
    keep_comments: bool,
) {
    if message.is_map_entry() {
        return;
    }

    let file = message.parent_file();
    let mut fields = Map::new();
    for field in message.fields() {
        let mut value = Map::new();
        let kind = match field.kind() {
            Kind::Message(entry) if field.is_map() => {
                value.insert(
                    "keyType".to_string(),
                    json!(type_name(&entry.map_entry_key_field().kind())),
                );
                entry.map_entry_value_field().kind()
            }
            kind => kind,
        };
        value.insert("type".to_string(), json!(type_name(&kind)));
        value.insert("id".to_string(), json!(field.number()));
        if field.is_list() {
            value.insert("rule".to_string(), json!("repeated"));
        }
        if field.field_descriptor_proto().proto3_optional() {
            value.insert("options".to_string(), json!({ "proto3_optional": true }));
        }
        if keep_comments {
            insert_comment(&mut value, leading_comment(&file, field.path()));
        }
        fields.insert(field.name().to_string(), Value::Object(value));
    }

    let mut object = Map::new();
    object.insert("fields".to_string(), Value::Object(fields));

    let oneofs: Map<String, Value> = message
        .oneofs()
        .map(|oneof| {
            let members: Vec<String> = oneof.fields().map(|f| f.name().to_string()).collect();
            (oneof.name().to_string(), json!({ "oneof": members }))
        })
        .collect();
    if !oneofs.is_empty() {
        object.insert("oneofs".to_string(), Value::Object(oneofs));
    }
    if keep_comments {
        insert_comment(&mut object, leading_comment(&file, message.path()));
    }

    root.namespace_mut(parent_path).merge(message.name(), object);

    let own_path = message.full_name().to_string();
    for child in message.child_messages() {
        insert_message(root, &own_path, &child, keep_comments);
    }
    for enum_type in message.child_enums() {
        let body = enum_json(&enum_type, keep_comments);
        root.namespace_mut(&own_path).merge(enum_type.name(), body);
    }
}

fn enum_json(
    enum_type: &prost_reflect::EnumDescriptor,
    keep_comments: bool,
) -> Map<String, Value> {
    let file = enum_type.parent_file();
    let mut values = Map::new();
    let mut comments = Map::new();
    for value in enum_type.values() {
        values.insert(value.name().to_string(), json!(value.number()));
        if keep_comments {
            if let Some(comment) = leading_comment(&file, value.path()) {
                comments.insert(value.name().to_string(), json!(comment));
            }
        }
    }

    let mut object = Map::new();
    object.insert("values".to_string(), Value::Object(values));
    if keep_comments {
        insert_comment(&mut object, leading_comment(&file, enum_type.path()));
        if !comments.is_empty() {
            object.insert("comments".to_string(), Value::Object(comments));
        }
    }
    object
}

fn service_json(
    file: &FileDescriptor,
    service: &prost_reflect::ServiceDescriptor,
    keep_comments: bool,
) -> Map<String, Value> {
    let mut methods = Map::new();
    for method in service.methods() {
        let mut value = Map::new();
        value.insert(
            "requestType".to_string(),
            json!(format!(".{}", method.input().full_name())),
        );
        value.insert(
            "responseType".to_string(),
            json!(format!(".{}", method.output().full_name())),
        );
        if method.is_client_streaming() {
            value.insert("requestStream".to_string(), json!(true));
        }
        if method.is_server_streaming() {
            value.insert("responseStream".to_string(), json!(true));
        }
        if keep_comments {
            insert_comment(&mut value, leading_comment(file, method.path()));
        }
        methods.insert(method.name().to_string(), Value::Object(value));
    }

    let mut object = Map::new();
    object.insert("methods".to_string(), Value::Object(methods));
    if keep_comments {
        insert_comment(&mut object, leading_comment(file, service.path()));
    }
    object
}

/// Scalar name, or the absolute (dot-prefixed) name of a message or enum
fn type_name(kind: &Kind) -> String {
    match kind {
        Kind::Double => "double".to_string(),
        Kind::Float => "float".to_string(),
        Kind::Int32 => "int32".to_string(),
        Kind::Int64 => "int64".to_string(),
        Kind::Uint32 => "uint32".to_string(),
        Kind::Uint64 => "uint64".to_string(),
        Kind::Sint32 => "sint32".to_string(),
        Kind::Sint64 => "sint64".to_string(),
        Kind::Fixed32 => "fixed32".to_string(),
        Kind::Fixed64 => "fixed64".to_string(),
        Kind::Sfixed32 => "sfixed32".to_string(),
        Kind::Sfixed64 => "sfixed64".to_string(),
        Kind::Bool => "bool".to_string(),
        Kind::String => "string".to_string(),
        Kind::Bytes => "bytes".to_string(),
        Kind::Message(message) => format!(".{}", message.full_name()),
        Kind::Enum(enum_type) => format!(".{}", enum_type.full_name()),
    }
}

fn insert_comment(object: &mut Map<String, Value>, comment: Option<String>) {
    if let Some(comment) = comment {
        object.insert("comment".to_string(), json!(comment));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(object) => object,
            other => panic!("expected object, got {}", other),
        }
    }

    #[test]
    fn test_namespace_mut_creates_levels() {
        let mut root = JsonNode::default();
        root.namespace_mut("a.b")
            .body
            .insert("marker".to_string(), json!(true));

        let value = root.into_value();
        assert_eq!(value["nested"]["a"]["nested"]["b"]["marker"], json!(true));
        assert!(value["nested"]["a"]["nested"]["b"].get("nested").is_none());
    }

    #[test]
    fn test_merge_keeps_existing_nested() {
        let mut root = JsonNode::default();
        root.namespace_mut("pkg.Outer")
            .merge("Inner", body(json!({ "fields": {} })));
        root.namespace_mut("pkg").merge(
            "Outer",
            body(json!({ "fields": { "id": { "type": "int32", "id": 1 } } })),
        );

        let value = root.into_value();
        let outer = &value["nested"]["pkg"]["nested"]["Outer"];
        assert_eq!(outer["fields"]["id"]["id"], json!(1));
        assert!(outer["nested"]["Inner"].is_object());
    }

    #[test]
    fn test_empty_root_is_empty_object() {
        assert_eq!(JsonNode::default().into_value(), json!({}));
    }
}
