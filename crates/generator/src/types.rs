//! TypeScript declarations for one proto source
//!
//! Each source renders into its own exported namespace named after
//! `<space>_<service>_<index>`, so sections from several sources can be
//! concatenated into one `types.ts` without redeclaring symbols.

use crate::templates::{camel_case, render};
use grpc_code_gen_common::{
    BytesAs, DescriptorSet, EnumDescriptor, EnumsAs, FieldDescriptor, FieldType, LoaderOptions,
    LongsAs, MessageDescriptor, Namespace, ProtoSource, Result,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tera::Tera;

/// Header written once at the top of `types.ts`
const TYPES_HEADER: &str = "// Generated by grpc-code-gen. Do not edit.\n/* eslint-disable */\n\n";

/// Words that cannot name a TypeScript namespace, interface or enum
const RESERVED_NAMES: &[&str] = &[
    "any", "await", "bigint", "boolean", "break", "case", "catch", "class", "const", "continue",
    "debugger", "default", "delete", "do", "else", "enum", "export", "extends", "false",
    "finally", "for", "function", "if", "implements", "import", "in", "instanceof", "interface",
    "let", "never", "new", "null", "number", "object", "package", "private", "protected",
    "public", "return", "static", "string", "super", "switch", "symbol", "this", "throw", "true",
    "try", "typeof", "undefined", "unknown", "var", "void", "while", "with", "yield",
];

/// Declared name for a proto package segment or type name
///
/// Reserved words get a trailing `_`.
pub(crate) fn ts_name(name: &str) -> String {
    if RESERVED_NAMES.contains(&name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// Identity of the source being emitted
#[derive(Debug, Clone, Copy)]
pub struct SourceIdentity<'a> {
    pub source: &'a ProtoSource,
    pub index: usize,
}

impl SourceIdentity<'_> {
    pub fn ident(&self) -> String {
        self.source.namespace_ident(self.index)
    }
}

/// In-memory `types.ts`, appended per source and written once
#[derive(Debug, Clone)]
pub struct TypesAccumulator {
    buffer: String,
    sections: usize,
}

impl Default for TypesAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl TypesAccumulator {
    pub fn new() -> Self {
        Self {
            buffer: TYPES_HEADER.to_string(),
            sections: 0,
        }
    }

    pub fn append(&mut self, section: &str) {
        self.buffer.push_str(section);
        self.sections += 1;
    }

    pub fn sections(&self) -> usize {
        self.sections
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn into_string(self) -> String {
        self.buffer
    }
}

/// Maps proto field types to TypeScript types for one source
pub struct TsTypeMapper<'a> {
    ident: String,
    options: &'a LoaderOptions,
    messages: HashSet<&'a str>,
    enums: HashSet<&'a str>,
}

impl<'a> TsTypeMapper<'a> {
    pub fn new(ident: String, options: &'a LoaderOptions, descriptors: &'a DescriptorSet) -> Self {
        Self {
            ident,
            options,
            messages: descriptors
                .messages
                .iter()
                .map(|m| m.full_name.as_str())
                .collect(),
            enums: descriptors
                .enums
                .iter()
                .map(|e| e.full_name.as_str())
                .collect(),
        }
    }

    /// Reference to a message or enum, qualified from the source namespace
    pub fn qualify(&self, full_name: &str) -> String {
        let path = full_name
            .trim_start_matches('.')
            .split('.')
            .map(ts_name)
            .collect::<Vec<_>>()
            .join(".");
        format!("{}.{}", self.ident, path)
    }

    /// Request or response type of a method
    pub fn message_ref(&self, full_name: &str) -> String {
        if self.messages.contains(full_name.trim_start_matches('.')) {
            self.qualify(full_name)
        } else {
            "any".to_string()
        }
    }

    pub fn element_type(&self, field_type: &FieldType) -> String {
        match field_type {
            FieldType::Bool => "boolean".to_string(),
            FieldType::String => "string".to_string(),
            FieldType::Bytes => match self.options.bytes {
                Some(BytesAs::String) => "string".to_string(),
                Some(BytesAs::Array) => "number[]".to_string(),
                None => "Buffer".to_string(),
            },
            t if t.is_long() => match self.options.longs {
                Some(LongsAs::String) => "string".to_string(),
                Some(LongsAs::Number) => "number".to_string(),
                None => "string | number".to_string(),
            },
            FieldType::Message(name) => self.message_ref(name),
            FieldType::Enum(name) => {
                if self.enums.contains(name.trim_start_matches('.')) {
                    self.qualify(name)
                } else if self.options.enums == Some(EnumsAs::String) {
                    "string".to_string()
                } else {
                    "number".to_string()
                }
            }
            _ => "number".to_string(),
        }
    }

    pub fn field_type(&self, field: &FieldDescriptor) -> String {
        let element = self.element_type(&field.field_type);
        if let Some(key) = &field.map_key {
            let key = if self.element_type(key) == "number" {
                "number"
            } else {
                "string"
            };
            format!("{{ [key: {}]: {} }}", key, element)
        } else if field.repeated {
            if element.contains(' ') {
                format!("Array<{}>", element)
            } else {
                format!("{}[]", element)
            }
        } else {
            element
        }
    }

    /// Whether the loader may leave the property unset
    pub fn is_optional(&self, field: &FieldDescriptor) -> bool {
        if field.is_map() {
            return !(self.options.defaults || self.options.objects);
        }
        if field.repeated {
            return !(self.options.defaults || self.options.arrays);
        }
        !self.options.defaults
            || field.explicit_optional
            || field.oneof.is_some()
            || matches!(field.field_type, FieldType::Message(_))
    }

    pub fn property_name(&self, name: &str) -> String {
        if self.options.keep_case {
            name.to_string()
        } else {
            camel_case(name)
        }
    }
}

#[derive(Debug, Serialize)]
struct NamespaceView {
    name: String,
    indent: String,
    member_indent: String,
    body_indent: String,
    enums: Vec<EnumView>,
    interfaces: Vec<InterfaceView>,
    children: Vec<NamespaceView>,
}

#[derive(Debug, Serialize)]
struct EnumView {
    name: String,
    comment: String,
    /// Literal union when enums are loaded as strings
    union: String,
    values: Vec<EnumValueView>,
}

#[derive(Debug, Serialize)]
struct EnumValueView {
    name: String,
    number: i32,
    comment: String,
}

#[derive(Debug, Serialize)]
struct InterfaceView {
    name: String,
    comment: String,
    fields: Vec<FieldView>,
}

#[derive(Debug, Serialize)]
struct FieldView {
    name: String,
    ts_type: String,
    optional: bool,
    comment: String,
}

fn enum_view(enum_type: &EnumDescriptor, options: &LoaderOptions) -> EnumView {
    let union = if options.enums == Some(EnumsAs::String) {
        if enum_type.values.is_empty() {
            "string".to_string()
        } else {
            enum_type
                .values
                .iter()
                .map(|v| format!("'{}'", v.name))
                .collect::<Vec<_>>()
                .join(" | ")
        }
    } else {
        String::new()
    };

    EnumView {
        name: ts_name(&enum_type.name),
        comment: enum_type.comment.clone().unwrap_or_default(),
        union,
        values: enum_type
            .values
            .iter()
            .map(|v| EnumValueView {
                name: v.name.clone(),
                number: v.number,
                comment: v.comment.clone().unwrap_or_default(),
            })
            .collect(),
    }
}

fn interface_view(message: &MessageDescriptor, mapper: &TsTypeMapper<'_>) -> InterfaceView {
    let mut fields: Vec<FieldView> = message
        .fields
        .iter()
        .map(|field| FieldView {
            name: mapper.property_name(&field.name),
            ts_type: mapper.field_type(field),
            optional: mapper.is_optional(field),
            comment: field.comment.clone().unwrap_or_default(),
        })
        .collect();

    // Virtual discriminator naming the member that is set
    if mapper.options.oneofs {
        for oneof in &message.oneofs {
            let members = oneof
                .fields
                .iter()
                .map(|name| format!("'{}'", mapper.property_name(name)))
                .collect::<Vec<_>>()
                .join(" | ");
            fields.push(FieldView {
                name: mapper.property_name(&oneof.name),
                ts_type: members,
                optional: true,
                comment: String::new(),
            });
        }
    }

    InterfaceView {
        name: ts_name(&message.name),
        comment: message.comment.clone().unwrap_or_default(),
        fields,
    }
}

fn namespace_view(
    name: String,
    depth: usize,
    namespace: &Namespace,
    mapper: &TsTypeMapper<'_>,
) -> NamespaceView {
    let indent = "  ".repeat(depth);
    NamespaceView {
        name,
        member_indent: format!("{}  ", indent),
        body_indent: format!("{}    ", indent),
        indent,
        enums: namespace
            .enums
            .values()
            .map(|e| enum_view(e, mapper.options))
            .collect(),
        interfaces: namespace
            .messages
            .values()
            .map(|m| interface_view(m, mapper))
            .collect(),
        children: namespace
            .nested
            .iter()
            .map(|(segment, child)| namespace_view(ts_name(segment), depth + 1, child, mapper))
            .collect(),
    }
}

/// Render the `types.ts` section for one source
pub fn render_types(
    tera: &Tera,
    identity: SourceIdentity<'_>,
    namespace: &Namespace,
    descriptors: &DescriptorSet,
    options: &LoaderOptions,
) -> Result<String> {
    let mapper = TsTypeMapper::new(identity.ident(), options, descriptors);
    let root = namespace_view(identity.ident(), 0, namespace, &mapper);

    let mut context = tera::Context::new();
    context.insert("space", &identity.source.space);
    context.insert("service", &identity.source.service);
    context.insert("index", &identity.index);
    context.insert("root", &root);

    render(tera, "types.ts", &context)
}

/// Count of declarations per namespace path, used in debug logs
pub fn declaration_counts(namespace: &Namespace) -> BTreeMap<String, usize> {
    fn walk(prefix: &str, namespace: &Namespace, out: &mut BTreeMap<String, usize>) {
        let count = namespace.messages.len() + namespace.enums.len();
        if count > 0 {
            out.insert(prefix.to_string(), count);
        }
        for (segment, child) in &namespace.nested {
            let path = if prefix.is_empty() {
                segment.clone()
            } else {
                format!("{}.{}", prefix, segment)
            };
            walk(&path, child, out);
        }
    }

    let mut out = BTreeMap::new();
    walk("", namespace, &mut out);
    out
}
