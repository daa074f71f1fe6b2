//! Template loading and management

use grpc_code_gen_common::{GeneratorError, Result};
use std::collections::HashMap;
use tera::{Tera, Value};

/// Load all templates
pub fn load_templates() -> Result<Tera> {
    let mut tera = Tera::default();

    tera.register_filter("jsdoc", jsdoc_filter);
    tera.register_filter("lower_first", lower_first_filter);

    // Added together so `types.ts` can import the namespace macros
    tera.add_raw_templates(vec![
        ("macros.ts", include_str!("../templates/macros.ts.tera")),
        ("types.ts", include_str!("../templates/types.ts.tera")),
        ("grpcObj.ts", include_str!("../templates/grpcObj.ts.tera")),
        (
            "getGrpcClient.ts",
            include_str!("../templates/getGrpcClient.ts.tera"),
        ),
        (
            "serviceWrapper.ts",
            include_str!("../templates/serviceWrapper.ts.tera"),
        ),
        ("service.ts", include_str!("../templates/service.ts.tera")),
    ])
    .map_err(|e| GeneratorError::Generation(format!("Failed to load templates: {:?}", e)))?;

    Ok(tera)
}

/// Render a loaded template, mapping tera errors
pub fn render(tera: &Tera, name: &str, context: &tera::Context) -> Result<String> {
    tera.render(name, context)
        .map_err(|e| GeneratorError::Generation(format!("Template error in {}: {:?}", name, e)))
}

/// Filter turning a comment into an indented `/** ... */` block
///
/// `null` renders as nothing so optional comments can be piped directly.
fn jsdoc_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let indent = args.get("indent").and_then(Value::as_str).unwrap_or("");
    let comment = match value {
        Value::Null => return Ok(Value::String(String::new())),
        Value::String(s) => s,
        _ => return Err(tera::Error::msg("jsdoc filter expects a string or null")),
    };

    Ok(Value::String(jsdoc(comment, indent)))
}

pub(crate) fn jsdoc(comment: &str, indent: &str) -> String {
    let lines: Vec<String> = comment
        .trim()
        .lines()
        .map(|line| line.trim_end().replace("*/", "*\\/"))
        .collect();

    match lines.as_slice() {
        [] => String::new(),
        [line] if !line.is_empty() => format!("{}/** {} */\n", indent, line),
        _ => {
            let mut out = format!("{}/**\n", indent);
            for line in &lines {
                if line.is_empty() {
                    out.push_str(&format!("{} *\n", indent));
                } else {
                    out.push_str(&format!("{} * {}\n", indent, line));
                }
            }
            out.push_str(&format!("{} */\n", indent));
            out
        }
    }
}

/// Filter to lowercase the first letter (`GetUser` -> `getUser`)
fn lower_first_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let s = value
        .as_str()
        .ok_or_else(|| tera::Error::msg("lower_first filter expects a string"))?;

    Ok(Value::String(lower_first(s)))
}

pub(crate) fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Field name conversion matching protobufjs (`display_name` -> `displayName`)
///
/// The first character is kept as is. `_x` is folded only when `x` is a
/// lowercase letter followed by another lowercase letter or the end.
pub(crate) fn camel_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len());
    let Some(first) = chars.first() else {
        return result;
    };
    result.push(*first);

    let mut i = 1;
    while i < chars.len() {
        let folds = chars[i] == '_'
            && chars.get(i + 1).is_some_and(|c| c.is_ascii_lowercase())
            && chars.get(i + 2).map_or(true, |c| c.is_ascii_lowercase());
        if folds {
            result.push(chars[i + 1].to_ascii_uppercase());
            i += 2;
        } else {
            result.push(chars[i]);
            i += 1;
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_load() {
        assert!(load_templates().is_ok());
    }

    #[test]
    fn test_jsdoc_single_line() {
        assert_eq!(jsdoc(" Fetch one user. ", "  "), "  /** Fetch one user. */\n");
    }

    #[test]
    fn test_jsdoc_multi_line() {
        assert_eq!(
            jsdoc("First line.\n\nSee */ here.", ""),
            "/**\n * First line.\n *\n * See *\\/ here.\n */\n"
        );
    }

    #[test]
    fn test_jsdoc_blank() {
        assert_eq!(jsdoc("   ", "  "), "");
    }

    #[test]
    fn test_jsdoc_filter_null() {
        let rendered = jsdoc_filter(&Value::Null, &HashMap::new()).unwrap();
        assert_eq!(rendered, Value::String(String::new()));
    }

    #[test]
    fn test_lower_first() {
        assert_eq!(lower_first("GetUser"), "getUser");
        assert_eq!(lower_first(""), "");
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("display_name"), "displayName");
        assert_eq!(camel_case("id"), "id");
        assert_eq!(camel_case("field_1"), "field_1");
        assert_eq!(camel_case("a_b_c"), "a_bC");
        assert_eq!(camel_case("user_id2"), "userId2");
        assert_eq!(camel_case("foo_b1"), "foo_b1");
    }

    #[test]
    fn test_camel_case_keeps_leading_character() {
        assert_eq!(camel_case("_foo"), "_foo");
        assert_eq!(camel_case("_foo_bar"), "_fooBar");
        assert_eq!(camel_case("__type"), "_Type");
        assert_eq!(camel_case(""), "");
    }
}
