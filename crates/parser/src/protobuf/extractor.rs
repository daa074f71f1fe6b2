//! Extracts the flat descriptor set from a descriptor pool

use grpc_code_gen_common::{
    DescriptorSet, EnumDescriptor, EnumValueDescriptor, FieldDescriptor, FieldType,
    MessageDescriptor, MethodDescriptor, OneofDescriptor, ServiceDescriptor,
};
use prost_reflect::{Cardinality, DescriptorPool, FileDescriptor, Kind};

/// Walk every file in the pool and collect services, methods, messages and enums
///
/// Files are visited in pool order; nested messages and enums follow their
/// parent message. Synthetic map-entry messages are skipped.
pub fn extract_descriptors(pool: &DescriptorPool) -> DescriptorSet {
    let mut set = DescriptorSet::default();

    for file in pool.files() {
        for message in file.messages() {
            collect_message(&message, &mut set);
        }
        for enum_type in file.enums() {
            set.enums.push(convert_enum(&enum_type));
        }
        for service in file.services() {
            set.services.push(ServiceDescriptor {
                name: service.name().to_string(),
                full_name: service.full_name().to_string(),
                package: service.package_name().to_string(),
                comment: leading_comment(&service.parent_file(), service.path()),
            });
            for method in service.methods() {
                set.methods.push(MethodDescriptor {
                    name: method.name().to_string(),
                    full_name: method.full_name().to_string(),
                    service_full_name: service.full_name().to_string(),
                    request_type: method.input().full_name().to_string(),
                    response_type: method.output().full_name().to_string(),
                    request_stream: method.is_client_streaming(),
                    response_stream: method.is_server_streaming(),
                    comment: leading_comment(&method.parent_file(), method.path()),
                });
            }
        }
    }

    set
}

fn collect_message(message: &prost_reflect::MessageDescriptor, set: &mut DescriptorSet) {
    if message.is_map_entry() {
        return;
    }

    let oneofs = message
        .oneofs()
        .filter(|oneof| !oneof.is_synthetic())
        .map(|oneof| OneofDescriptor {
            name: oneof.name().to_string(),
            fields: oneof.fields().map(|f| f.name().to_string()).collect(),
        })
        .collect();

    set.messages.push(MessageDescriptor {
        name: message.name().to_string(),
        full_name: message.full_name().to_string(),
        comment: leading_comment(&message.parent_file(), message.path()),
        fields: message.fields().map(|f| convert_field(&f)).collect(),
        oneofs,
    });

    for child in message.child_messages() {
        collect_message(&child, set);
    }
    for enum_type in message.child_enums() {
        set.enums.push(convert_enum(&enum_type));
    }
}

fn convert_field(field: &prost_reflect::FieldDescriptor) -> FieldDescriptor {
    let (field_type, map_key) = match field.kind() {
        Kind::Message(entry) if field.is_map() => (
            convert_kind(&entry.map_entry_value_field().kind()),
            Some(convert_kind(&entry.map_entry_key_field().kind())),
        ),
        kind => (convert_kind(&kind), None),
    };

    let file = field.parent_file();
    let proto2 = file
        .file_descriptor_proto()
        .syntax
        .as_deref()
        .map_or(true, |syntax| syntax == "proto2");
    let explicit_optional = field.field_descriptor_proto().proto3_optional()
        || (proto2 && field.cardinality() == Cardinality::Optional);

    FieldDescriptor {
        name: field.name().to_string(),
        number: field.number(),
        field_type,
        repeated: field.is_list(),
        map_key,
        explicit_optional,
        oneof: field
            .containing_oneof()
            .filter(|oneof| !oneof.is_synthetic())
            .map(|oneof| oneof.name().to_string()),
        comment: leading_comment(&file, field.path()),
    }
}

fn convert_kind(kind: &Kind) -> FieldType {
    match kind {
        Kind::Double => FieldType::Double,
        Kind::Float => FieldType::Float,
        Kind::Int32 => FieldType::Int32,
        Kind::Int64 => FieldType::Int64,
        Kind::Uint32 => FieldType::Uint32,
        Kind::Uint64 => FieldType::Uint64,
        Kind::Sint32 => FieldType::Sint32,
        Kind::Sint64 => FieldType::Sint64,
        Kind::Fixed32 => FieldType::Fixed32,
        Kind::Fixed64 => FieldType::Fixed64,
        Kind::Sfixed32 => FieldType::Sfixed32,
        Kind::Sfixed64 => FieldType::Sfixed64,
        Kind::Bool => FieldType::Bool,
        Kind::String => FieldType::String,
        Kind::Bytes => FieldType::Bytes,
        Kind::Message(message) => FieldType::Message(message.full_name().to_string()),
        Kind::Enum(enum_type) => FieldType::Enum(enum_type.full_name().to_string()),
    }
}

fn convert_enum(enum_type: &prost_reflect::EnumDescriptor) -> EnumDescriptor {
    let file = enum_type.parent_file();
    EnumDescriptor {
        name: enum_type.name().to_string(),
        full_name: enum_type.full_name().to_string(),
        comment: leading_comment(&file, enum_type.path()),
        values: enum_type
            .values()
            .map(|value| EnumValueDescriptor {
                name: value.name().to_string(),
                number: value.number(),
                comment: leading_comment(&file, value.path()),
            })
            .collect(),
    }
}

/// Leading comment recorded in the file's source info for a descriptor path
///
/// Only present when the descriptor set was compiled with source info.
pub(crate) fn leading_comment(file: &FileDescriptor, path: &[i32]) -> Option<String> {
    let info = file.file_descriptor_proto().source_code_info.as_ref()?;
    info.location
        .iter()
        .find(|location| location.path == path)
        .and_then(|location| location.leading_comments.as_deref())
        .map(str::trim)
        .filter(|comment| !comment.is_empty())
        .map(str::to_string)
}
