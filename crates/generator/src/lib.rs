//! TypeScript artifact generation for gRPC proto sources
//!
//! This crate turns resolved proto sources into client-side artifacts:
//! - `grpcObj.ts` (object loader over the consolidated proto dump)
//! - `getGrpcClient.ts` (client factory)
//! - `serviceWrapper.ts` (promise and stream call helpers)
//! - `types.ts` (one namespace of declarations per source)
//! - one wrapper module per service
//!
//! [`CodeGenerator`] drives the whole run; [`ArtifactEmitter`] renders the
//! individual artifacts.

mod pipeline;
mod services;
mod support;
mod templates;
mod types;

pub use pipeline::{CodeGenerator, GenerationReport, CACHE_FILE};
pub use services::{service_path, GeneratedService, RenderedService, SharedArtifacts};
pub use support::{
    loader_option_entries, SupportContext, GET_GRPC_CLIENT_FILE, GRPC_OBJ_FILE,
    SERVICE_WRAPPER_FILE, TYPES_FILE,
};
pub use types::{SourceIdentity, TsTypeMapper, TypesAccumulator};

use grpc_code_gen_common::{DescriptorSet, LoaderOptions, Namespace, Result};
use std::path::Path;
use tera::Tera;

/// Renders every generated artifact from loaded templates
pub struct ArtifactEmitter {
    tera: Tera,
}

impl ArtifactEmitter {
    pub fn new() -> Result<Self> {
        let tera = templates::load_templates()?;
        Ok(Self { tera })
    }

    /// Generate `grpcObj.ts`
    pub fn grpc_obj(&self, support: &SupportContext) -> Result<String> {
        support::render_grpc_obj(&self.tera, support)
    }

    /// Generate `getGrpcClient.ts`
    pub fn get_grpc_client(&self, support: &SupportContext) -> Result<String> {
        support::render_get_grpc_client(&self.tera, support)
    }

    /// Generate `serviceWrapper.ts`
    pub fn service_wrapper(&self, support: &SupportContext) -> Result<String> {
        support::render_service_wrapper(&self.tera, support)
    }

    /// Generate one source's section of `types.ts`
    pub fn types(
        &self,
        identity: SourceIdentity<'_>,
        namespace: &Namespace,
        descriptors: &DescriptorSet,
        options: &LoaderOptions,
    ) -> Result<String> {
        types::render_types(&self.tera, identity, namespace, descriptors, options)
    }

    /// Generate the wrappers for every service of one source
    pub fn services(
        &self,
        identity: SourceIdentity<'_>,
        descriptors: &DescriptorSet,
        options: &LoaderOptions,
        shared: &SharedArtifacts,
        service_dir: &Path,
    ) -> Result<Vec<RenderedService>> {
        services::render_services(
            &self.tera,
            identity,
            descriptors,
            options,
            shared,
            service_dir,
        )
    }
}
