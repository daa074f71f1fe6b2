//! Source-independent artifacts: object loader, client factory, wrapper base

use crate::templates::render;
use grpc_code_gen_common::paths::{import_specifier, relative_path, to_slash};
use grpc_code_gen_common::{BytesAs, EnumsAs, LoaderOptions, LongsAs, Result};
use std::path::{Path, PathBuf};
use tera::Tera;

/// Inputs shared by the three supporting artifacts
#[derive(Debug, Clone)]
pub struct SupportContext {
    pub grpc_npm_name: String,
    /// Directory the artifacts are written to
    pub output_dir: PathBuf,
    /// Consolidated proto dump loaded at run time
    pub json_path: PathBuf,
    pub config_file_path: Option<PathBuf>,
    pub loader_options: LoaderOptions,
}

impl SupportContext {
    fn context(&self) -> tera::Context {
        let mut context = tera::Context::new();
        context.insert("grpc_npm_name", &self.grpc_npm_name);
        context.insert(
            "json_path",
            &to_slash(&relative_path(&self.output_dir, &self.json_path)),
        );
        context.insert(
            "config_import",
            &self
                .config_file_path
                .as_deref()
                .map(|path| import_specifier(&self.output_dir, path)),
        );
        context.insert("loader_options", &loader_option_entries(&self.loader_options));
        context
    }
}

/// `@grpc/proto-loader` options as object literal entries
pub fn loader_option_entries(options: &LoaderOptions) -> Vec<String> {
    let mut entries = Vec::new();
    if options.keep_case {
        entries.push("keepCase: true".to_string());
    }
    match options.longs {
        Some(LongsAs::String) => entries.push("longs: String".to_string()),
        Some(LongsAs::Number) => entries.push("longs: Number".to_string()),
        None => {}
    }
    if let Some(EnumsAs::String) = options.enums {
        entries.push("enums: String".to_string());
    }
    match options.bytes {
        Some(BytesAs::String) => entries.push("bytes: String".to_string()),
        Some(BytesAs::Array) => entries.push("bytes: Array".to_string()),
        None => {}
    }
    for (set, name) in [
        (options.defaults, "defaults"),
        (options.arrays, "arrays"),
        (options.objects, "objects"),
        (options.oneofs, "oneofs"),
    ] {
        if set {
            entries.push(format!("{}: true", name));
        }
    }
    entries
}

pub fn render_grpc_obj(tera: &Tera, support: &SupportContext) -> Result<String> {
    render(tera, "grpcObj.ts", &support.context())
}

pub fn render_get_grpc_client(tera: &Tera, support: &SupportContext) -> Result<String> {
    render(tera, "getGrpcClient.ts", &support.context())
}

pub fn render_service_wrapper(tera: &Tera, support: &SupportContext) -> Result<String> {
    render(tera, "serviceWrapper.ts", &support.context())
}

/// File names of the supporting artifacts inside the output directory
pub const GRPC_OBJ_FILE: &str = "grpcObj.ts";
pub const GET_GRPC_CLIENT_FILE: &str = "getGrpcClient.ts";
pub const SERVICE_WRAPPER_FILE: &str = "serviceWrapper.ts";
pub const TYPES_FILE: &str = "types.ts";

pub fn artifact_path(output_dir: &Path, file: &str) -> PathBuf {
    output_dir.join(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::load_templates;

    fn support() -> SupportContext {
        SupportContext {
            grpc_npm_name: "@grpc/grpc-js".to_string(),
            output_dir: PathBuf::from("/work/code-gen"),
            json_path: PathBuf::from("/work/.grpc-code-gen/root.json"),
            config_file_path: None,
            loader_options: LoaderOptions::default(),
        }
    }

    #[test]
    fn test_loader_option_entries() {
        assert!(loader_option_entries(&LoaderOptions::default()).is_empty());

        let options = LoaderOptions {
            keep_case: true,
            longs: Some(LongsAs::String),
            enums: Some(EnumsAs::String),
            oneofs: true,
            ..Default::default()
        };
        assert_eq!(
            loader_option_entries(&options),
            vec!["keepCase: true", "longs: String", "enums: String", "oneofs: true"]
        );
    }

    #[test]
    fn test_grpc_obj_references_dump_relatively() {
        let tera = load_templates().unwrap();
        let mut support = support();
        support.loader_options.keep_case = true;

        let output = render_grpc_obj(&tera, &support).unwrap();
        assert!(output.contains("import * as grpc from '@grpc/grpc-js';"));
        assert!(output.contains("path.resolve(__dirname, \"../.grpc-code-gen/root.json\")"));
        assert!(output.contains("  keepCase: true,\n"));
        assert!(output.contains("protoLoader.fromJSON(source.json, loaderOptions)"));
    }

    #[test]
    fn test_client_factory_config_import() {
        let tera = load_templates().unwrap();
        let output = render_get_grpc_client(&tera, &support()).unwrap();
        assert!(!output.contains("require("));

        let mut support = support();
        support.config_file_path = Some(PathBuf::from("/work/config/grpc.js"));
        let output = render_get_grpc_client(&tera, &support).unwrap();
        assert!(output.contains("require('../config/grpc')"));
        assert!(output.contains("export function getGrpcClient<T>("));
    }

    #[test]
    fn test_service_wrapper_helpers() {
        let tera = load_templates().unwrap();
        let output = render_service_wrapper(&tera, &support()).unwrap();
        for helper in [
            "export function promisifyUnary",
            "export function promisifyClientStream",
            "export function callServerStream",
            "export function callBidiStream",
            "export class GrpcCallError",
        ] {
            assert!(output.contains(helper), "missing {}", helper);
        }
    }
}
