//! Namespace tree keyed by protobuf package segments
//!
//! The path from the root to any message or enum is exactly its dotted package
//! path, one segment per level. A node may hold messages, enums and nested
//! children at the same time.

use crate::descriptor::{EnumDescriptor, MessageDescriptor};
use serde::Serialize;
use std::collections::BTreeMap;

/// One node of the namespace tree
///
/// Children are kept in sorted maps so that walking a tree is deterministic and
/// two trees built from the same descriptors in any order compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Namespace {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub nested: BTreeMap<String, Namespace>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub messages: BTreeMap<String, MessageDescriptor>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub enums: BTreeMap<String, EnumDescriptor>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the child for `segment`, inserting an empty one if missing
    pub fn child_mut(&mut self, segment: &str) -> &mut Namespace {
        self.nested.entry(segment.to_string()).or_default()
    }

    /// Walk (and create) the node for a dotted package path
    ///
    /// An empty package resolves to `self`.
    pub fn package_mut(&mut self, package: &str) -> &mut Namespace {
        package
            .split('.')
            .filter(|segment| !segment.is_empty())
            .fold(self, |node, segment| node.child_mut(segment))
    }

    /// Look up the node for a dotted package path without creating it
    pub fn package(&self, package: &str) -> Option<&Namespace> {
        package
            .split('.')
            .filter(|segment| !segment.is_empty())
            .try_fold(self, |node, segment| node.nested.get(segment))
    }

    pub fn insert_message(&mut self, message: &MessageDescriptor) {
        self.package_mut(package_name(&message.full_name))
            .messages
            .insert(message.name.clone(), message.clone());
    }

    pub fn insert_enum(&mut self, enum_type: &EnumDescriptor) {
        self.package_mut(package_name(&enum_type.full_name))
            .enums
            .insert(enum_type.name.clone(), enum_type.clone());
    }

    pub fn is_empty(&self) -> bool {
        self.nested.is_empty() && self.messages.is_empty() && self.enums.is_empty()
    }
}

/// Package portion of a fully-qualified name
///
/// `"a.b.C"` yields `"a.b"`. A name without a dot has no package and yields
/// `""`, which places it at the tree root.
pub fn package_name(full_name: &str) -> &str {
    let full_name = full_name.trim_start_matches('.');
    match full_name.rfind('.') {
        Some(idx) => &full_name[..idx],
        None => "",
    }
}

/// Build the namespace tree for one source's messages and enums
pub fn build_namespace(messages: &[MessageDescriptor], enums: &[EnumDescriptor]) -> Namespace {
    let mut root = Namespace::new();
    for message in messages {
        root.insert_message(message);
    }
    for enum_type in enums {
        root.insert_enum(enum_type);
    }
    root
}
