//! Per-service client wrappers

use crate::templates::{lower_first, render};
use crate::types::{SourceIdentity, TsTypeMapper};
use grpc_code_gen_common::paths::import_specifier;
use grpc_code_gen_common::{
    DescriptorSet, LoaderOptions, MethodDescriptor, Result, ServiceDescriptor,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tera::Tera;

/// Location of a generated service wrapper, reported to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedService {
    pub full_name: String,
    pub path: PathBuf,
    pub methods: Vec<String>,
}

/// A rendered wrapper not yet written to disk
#[derive(Debug, Clone)]
pub struct RenderedService {
    pub service: GeneratedService,
    pub content: String,
}

/// Paths of the shared artifacts every wrapper imports
#[derive(Debug, Clone)]
pub struct SharedArtifacts {
    pub grpc_client_path: PathBuf,
    pub service_wrapper_path: PathBuf,
    pub types_path: PathBuf,
}

#[derive(Debug, Serialize)]
struct ServiceView {
    name: String,
    full_name: String,
    comment: String,
}

#[derive(Debug, Serialize)]
struct MethodView {
    name: String,
    fn_name: String,
    comment: String,
    request_type: String,
    response_type: String,
    takes_request: bool,
    helper: &'static str,
    returns: String,
}

fn method_view(method: &MethodDescriptor, mapper: &TsTypeMapper<'_>) -> MethodView {
    let request_type = mapper.message_ref(&method.request_type);
    let response_type = mapper.message_ref(&method.response_type);

    let (helper, returns) = match (method.request_stream, method.response_stream) {
        (false, false) => ("promisifyUnary", format!("Promise<{}>", response_type)),
        (true, false) => (
            "promisifyClientStream",
            format!("ClientStreamCall<{}, {}>", request_type, response_type),
        ),
        (false, true) => (
            "callServerStream",
            format!("ServerStreamCall<{}>", response_type),
        ),
        (true, true) => (
            "callBidiStream",
            format!("BidiStreamCall<{}, {}>", request_type, response_type),
        ),
    };

    MethodView {
        name: method.name.clone(),
        fn_name: lower_first(&method.name),
        comment: method.comment.clone().unwrap_or_default(),
        takes_request: !method.request_stream,
        request_type,
        response_type,
        helper,
        returns,
    }
}

/// Names imported from `serviceWrapper.ts` by a wrapper with these methods
fn wrapper_imports(methods: &[MethodView]) -> Vec<&'static str> {
    let mut imports = BTreeSet::from(["GrpcCallOptions"]);
    for method in methods {
        imports.insert(method.helper);
        match method.helper {
            "promisifyClientStream" => {
                imports.insert("ClientStreamCall");
            }
            "callServerStream" => {
                imports.insert("ServerStreamCall");
            }
            "callBidiStream" => {
                imports.insert("BidiStreamCall");
            }
            _ => {}
        }
    }
    imports.into_iter().collect()
}

/// Wrapper file location for a service
///
/// `<service_dir>/<package segments>/<ServiceName>.ts`, so two services with
/// the same short name in different packages of one source stay apart.
pub fn service_path(service_dir: &Path, service: &ServiceDescriptor) -> PathBuf {
    let mut path = service_dir.to_path_buf();
    for segment in service.package.split('.').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path.join(format!("{}.ts", service.name))
}

/// Render one wrapper per service of a source
///
/// `service_dir` is the directory reserved for this source's wrappers.
pub fn render_services(
    tera: &Tera,
    identity: SourceIdentity<'_>,
    descriptors: &DescriptorSet,
    options: &LoaderOptions,
    shared: &SharedArtifacts,
    service_dir: &Path,
) -> Result<Vec<RenderedService>> {
    let ident = identity.ident();
    let mapper = TsTypeMapper::new(ident.clone(), options, descriptors);

    descriptors
        .services
        .iter()
        .map(|service| -> Result<RenderedService> {
            let path = service_path(service_dir, service);
            let from_dir = path.parent().unwrap_or(service_dir);

            let methods: Vec<MethodView> = descriptors
                .methods_of(service)
                .map(|m| method_view(m, &mapper))
                .collect();

            let mut context = tera::Context::new();
            context.insert(
                "client_import",
                &import_specifier(from_dir, &shared.grpc_client_path),
            );
            context.insert(
                "wrapper_import",
                &import_specifier(from_dir, &shared.service_wrapper_path),
            );
            context.insert(
                "types_import",
                &import_specifier(from_dir, &shared.types_path),
            );
            context.insert("wrapper_imports", &wrapper_imports(&methods));
            context.insert("types_ident", &ident);
            context.insert("index", &identity.index);
            context.insert(
                "service",
                &ServiceView {
                    name: service.name.clone(),
                    full_name: service.full_name.clone(),
                    comment: service.comment.clone().unwrap_or_default(),
                },
            );
            context.insert("methods", &methods);

            let content = render(tera, "service.ts", &context)?;

            Ok(RenderedService {
                service: GeneratedService {
                    full_name: service.full_name.clone(),
                    path,
                    methods: methods.iter().map(|m| m.name.clone()).collect(),
                },
                content,
            })
        })
        .collect()
}
