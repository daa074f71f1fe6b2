//! Integration test for descriptor extraction and JSON dumping

use grpc_code_gen_common::{strip_packages, FieldType, ProtoRoot, WELL_KNOWN_PACKAGES};
use grpc_code_gen_parser::DescriptorPoolRoot;
use prost::Message;
use prost_types::{
    field_descriptor_proto, source_code_info::Location, DescriptorProto, EnumDescriptorProto,
    EnumValueDescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    MessageOptions, MethodDescriptorProto, OneofDescriptorProto, ServiceDescriptorProto,
    SourceCodeInfo,
};
use serde_json::json;

fn field(
    name: &str,
    number: i32,
    r#type: field_descriptor_proto::Type,
    type_name: Option<&str>,
) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(field_descriptor_proto::Label::Optional as i32),
        r#type: Some(r#type as i32),
        type_name: type_name.map(str::to_string),
        ..Default::default()
    }
}

fn repeated(mut field: FieldDescriptorProto) -> FieldDescriptorProto {
    field.label = Some(field_descriptor_proto::Label::Repeated as i32);
    field
}

fn comment(path: Vec<i32>, text: &str) -> Location {
    Location {
        path,
        span: vec![1, 0, 10],
        leading_comments: Some(text.to_string()),
        ..Default::default()
    }
}

/// A `user.v1` package with a service, nested types, a map, an enum and a oneof
fn create_user_service() -> FileDescriptorSet {
    use field_descriptor_proto::Type;

    let labels_entry = DescriptorProto {
        name: Some("LabelsEntry".to_string()),
        field: vec![
            field("key", 1, Type::String, None),
            field("value", 2, Type::String, None),
        ],
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    };

    let profile = DescriptorProto {
        name: Some("Profile".to_string()),
        field: vec![field("bio", 1, Type::String, None)],
        ..Default::default()
    };

    let user = DescriptorProto {
        name: Some("User".to_string()),
        field: vec![
            field("id", 1, Type::Int64, None),
            field("display_name", 2, Type::String, None),
            repeated(field("tags", 3, Type::String, None)),
            repeated(field(
                "labels",
                4,
                Type::Message,
                Some(".user.v1.User.LabelsEntry"),
            )),
            field("role", 5, Type::Enum, Some(".user.v1.Role")),
            field("profile", 6, Type::Message, Some(".user.v1.User.Profile")),
        ],
        nested_type: vec![profile, labels_entry],
        ..Default::default()
    };

    let mut by_id = field("id", 1, Type::Int64, None);
    by_id.oneof_index = Some(0);
    let mut by_email = field("email", 2, Type::String, None);
    by_email.oneof_index = Some(0);
    let get_user_request = DescriptorProto {
        name: Some("GetUserRequest".to_string()),
        field: vec![by_id, by_email],
        oneof_decl: vec![OneofDescriptorProto {
            name: Some("key".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    };

    let role = EnumDescriptorProto {
        name: Some("Role".to_string()),
        value: vec![
            EnumValueDescriptorProto {
                name: Some("ROLE_UNSPECIFIED".to_string()),
                number: Some(0),
                ..Default::default()
            },
            EnumValueDescriptorProto {
                name: Some("ADMIN".to_string()),
                number: Some(1),
                ..Default::default()
            },
        ],
        ..Default::default()
    };

    let user_service = ServiceDescriptorProto {
        name: Some("UserService".to_string()),
        method: vec![
            MethodDescriptorProto {
                name: Some("GetUser".to_string()),
                input_type: Some(".user.v1.GetUserRequest".to_string()),
                output_type: Some(".user.v1.User".to_string()),
                ..Default::default()
            },
            MethodDescriptorProto {
                name: Some("WatchUsers".to_string()),
                input_type: Some(".user.v1.GetUserRequest".to_string()),
                output_type: Some(".user.v1.User".to_string()),
                server_streaming: Some(true),
                ..Default::default()
            },
        ],
        ..Default::default()
    };

    let file_descriptor = FileDescriptorProto {
        name: Some("user/v1/user.proto".to_string()),
        package: Some("user.v1".to_string()),
        message_type: vec![user, get_user_request],
        enum_type: vec![role],
        service: vec![user_service],
        syntax: Some("proto3".to_string()),
        source_code_info: Some(SourceCodeInfo {
            location: vec![
                comment(vec![4, 0], " A user account.\n"),
                comment(vec![4, 0, 2, 1], " Shown in the UI.\n"),
                comment(vec![6, 0], " Manages users.\n"),
                comment(vec![6, 0, 2, 0], " Fetch one user.\n"),
            ],
        }),
        ..Default::default()
    };

    FileDescriptorSet {
        file: vec![file_descriptor],
    }
}

fn load_root() -> DescriptorPoolRoot {
    let bytes = create_user_service().encode_to_vec();
    DescriptorPoolRoot::from_file_descriptor_set(&bytes).unwrap()
}

#[test]
fn test_extract_services_and_methods() {
    let descriptors = load_root().extract().unwrap();

    assert_eq!(descriptors.services.len(), 1);
    let service = &descriptors.services[0];
    assert_eq!(service.name, "UserService");
    assert_eq!(service.full_name, "user.v1.UserService");
    assert_eq!(service.package, "user.v1");
    assert_eq!(service.comment.as_deref(), Some("Manages users."));

    let methods: Vec<&str> = descriptors
        .methods_of(service)
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(methods, vec!["GetUser", "WatchUsers"]);

    let get_user = &descriptors.methods[0];
    assert!(get_user.is_unary());
    assert_eq!(get_user.request_type, "user.v1.GetUserRequest");
    assert_eq!(get_user.response_type, "user.v1.User");
    assert_eq!(get_user.comment.as_deref(), Some("Fetch one user."));

    let watch = &descriptors.methods[1];
    assert!(!watch.request_stream);
    assert!(watch.response_stream);
}

#[test]
fn test_extract_messages_skips_map_entries() {
    let descriptors = load_root().extract().unwrap();

    let names: Vec<&str> = descriptors
        .messages
        .iter()
        .map(|m| m.full_name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["user.v1.User", "user.v1.User.Profile", "user.v1.GetUserRequest"]
    );

    let enums: Vec<&str> = descriptors
        .enums
        .iter()
        .map(|e| e.full_name.as_str())
        .collect();
    assert_eq!(enums, vec!["user.v1.Role"]);
    assert_eq!(descriptors.enums[0].values[1].name, "ADMIN");
    assert_eq!(descriptors.enums[0].values[1].number, 1);
}

#[test]
fn test_extract_field_shapes() {
    let descriptors = load_root().extract().unwrap();
    let user = &descriptors.messages[0];
    assert_eq!(user.comment.as_deref(), Some("A user account."));

    let by_name = |name: &str| user.fields.iter().find(|f| f.name == name).unwrap();

    assert_eq!(by_name("id").field_type, FieldType::Int64);
    assert_eq!(
        by_name("display_name").comment.as_deref(),
        Some("Shown in the UI.")
    );

    let tags = by_name("tags");
    assert!(tags.repeated);
    assert!(!tags.is_map());

    let labels = by_name("labels");
    assert!(!labels.repeated);
    assert_eq!(labels.map_key, Some(FieldType::String));
    assert_eq!(labels.field_type, FieldType::String);

    assert_eq!(
        by_name("role").field_type,
        FieldType::Enum("user.v1.Role".to_string())
    );
    assert_eq!(
        by_name("profile").field_type,
        FieldType::Message("user.v1.User.Profile".to_string())
    );
    assert!(!by_name("profile").explicit_optional);
}

#[test]
fn test_extract_oneofs() {
    let descriptors = load_root().extract().unwrap();
    let request = &descriptors.messages[2];

    assert_eq!(request.oneofs.len(), 1);
    assert_eq!(request.oneofs[0].name, "key");
    assert_eq!(request.oneofs[0].fields, vec!["id", "email"]);
    assert!(request
        .fields
        .iter()
        .all(|f| f.oneof.as_deref() == Some("key")));
}

#[test]
fn test_json_tree_layout() {
    let json = load_root().to_json(true).unwrap();
    let v1 = &json["nested"]["user"]["nested"]["v1"]["nested"];

    let user = &v1["User"];
    assert_eq!(user["comment"], json!("A user account."));
    assert_eq!(user["fields"]["id"], json!({ "type": "int64", "id": 1 }));
    assert_eq!(user["fields"]["tags"]["rule"], json!("repeated"));
    assert_eq!(user["fields"]["labels"]["keyType"], json!("string"));
    assert_eq!(user["fields"]["labels"]["type"], json!("string"));
    assert_eq!(user["fields"]["role"]["type"], json!(".user.v1.Role"));
    assert!(user["nested"]["Profile"]["fields"]["bio"].is_object());
    assert!(user["nested"].get("LabelsEntry").is_none());

    assert_eq!(v1["Role"]["values"], json!({ "ROLE_UNSPECIFIED": 0, "ADMIN": 1 }));

    let methods = &v1["UserService"]["methods"];
    assert_eq!(
        methods["GetUser"]["requestType"],
        json!(".user.v1.GetUserRequest")
    );
    assert_eq!(methods["WatchUsers"]["responseStream"], json!(true));
    assert!(methods["GetUser"].get("responseStream").is_none());

    assert_eq!(
        v1["GetUserRequest"]["oneofs"]["key"]["oneof"],
        json!(["id", "email"])
    );
}

#[test]
fn test_json_without_comments() {
    let json = load_root().to_json(false).unwrap();
    let user = &json["nested"]["user"]["nested"]["v1"]["nested"]["User"];
    assert!(user.get("comment").is_none());
    assert!(user["fields"]["display_name"].get("comment").is_none());
}

#[test]
fn test_strip_well_known_packages() {
    let mut json = load_root().to_json(false).unwrap();
    json["nested"]["google"] = json!({ "nested": {} });
    json["nested"]["common"] = json!({ "nested": {} });

    strip_packages(&mut json, WELL_KNOWN_PACKAGES);

    let packages: Vec<&String> = json["nested"].as_object().unwrap().keys().collect();
    assert_eq!(packages, vec!["user"]);
}
