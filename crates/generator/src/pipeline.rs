//! End-to-end generation run

use crate::services::SharedArtifacts;
use crate::support::{
    artifact_path, SupportContext, GET_GRPC_CLIENT_FILE, GRPC_OBJ_FILE, SERVICE_WRAPPER_FILE,
    TYPES_FILE,
};
use crate::types::{declaration_counts, SourceIdentity, TypesAccumulator};
use crate::{ArtifactEmitter, GeneratedService};
use futures::future::try_join_all;
use grpc_code_gen_common::paths::normalize;
use grpc_code_gen_common::{
    build_namespace, strip_packages, DescriptorSet, GenerateOptions, GeneratorError, ProtoResolver,
    ProtoSource, ResolveRequest, Result, WELL_KNOWN_PACKAGES,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the consolidated proto dump inside the cache directory
pub const CACHE_FILE: &str = "root.json";

/// Everything a successful run produced
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub output_dir: PathBuf,
    pub cache_file: PathBuf,
    pub types_path: PathBuf,
    pub services: Vec<GeneratedService>,
}

/// One entry of `root.json`
#[derive(Debug, Serialize)]
struct CachedSource<'a> {
    space: &'a str,
    service: &'a str,
    json: &'a Value,
}

struct ResolvedSource {
    source: ProtoSource,
    json: Value,
    descriptors: DescriptorSet,
}

/// Generates client artifacts for a list of proto repositories
pub struct CodeGenerator<R> {
    resolver: R,
    emitter: ArtifactEmitter,
}

impl<R: ProtoResolver> CodeGenerator<R> {
    pub fn new(resolver: R) -> Result<Self> {
        Ok(Self {
            resolver,
            emitter: ArtifactEmitter::new()?,
        })
    }

    /// Run a full generation and return the output directory
    pub async fn generate(&self, options: &GenerateOptions) -> Result<PathBuf> {
        self.run(options).await.map(|report| report.output_dir)
    }

    /// Run a full generation
    ///
    /// The output directory is removed and recreated. Nothing on disk changes
    /// if the options are invalid. A resolution failure aborts the run and
    /// leaves the output directory as far as it got.
    pub async fn run(&self, options: &GenerateOptions) -> Result<GenerationReport> {
        let (base_url, sources) = options.sources()?;
        let output_dir = absolute(&options.base_dir)?;
        let cache_dir = absolute(&options.cache_dir)?;
        debug!(target_lang = %options.target, sources = sources.len(), "Starting generation");

        if output_dir.exists() {
            fs::remove_dir_all(&output_dir)?;
        }
        info!("Clean dir: {}", output_dir.display());
        fs::create_dir_all(&output_dir)?;

        // Resolve concurrently, consume in input order
        let resolved = try_join_all(
            sources
                .iter()
                .map(|source| self.resolve_source(base_url, source, options)),
        )
        .await?;

        if resolved.iter().all(|r| r.descriptors.is_empty()) {
            return Err(GeneratorError::EmptyResult);
        }

        let cache_file = write_cache(&cache_dir, &resolved)?;

        let support = SupportContext {
            grpc_npm_name: options.grpc_npm_name.clone(),
            output_dir: output_dir.clone(),
            json_path: cache_file.clone(),
            config_file_path: options
                .config_file_path
                .as_deref()
                .map(absolute)
                .transpose()?,
            loader_options: options.loader_options.clone(),
        };
        let shared = SharedArtifacts {
            grpc_client_path: artifact_path(&output_dir, GET_GRPC_CLIENT_FILE),
            service_wrapper_path: artifact_path(&output_dir, SERVICE_WRAPPER_FILE),
            types_path: artifact_path(&output_dir, TYPES_FILE),
        };

        write_file(
            &artifact_path(&output_dir, GRPC_OBJ_FILE),
            &self.emitter.grpc_obj(&support)?,
        )?;
        write_file(
            &shared.grpc_client_path,
            &self.emitter.get_grpc_client(&support)?,
        )?;
        write_file(
            &shared.service_wrapper_path,
            &self.emitter.service_wrapper(&support)?,
        )?;

        let mut types = TypesAccumulator::new();
        let mut services = Vec::new();
        let mut used_dirs = HashSet::new();

        for (index, resolved) in resolved.iter().enumerate() {
            let identity = SourceIdentity {
                source: &resolved.source,
                index,
            };
            let descriptors = &resolved.descriptors;

            let namespace = build_namespace(&descriptors.messages, &descriptors.enums);
            debug!(
                source = %identity.ident(),
                declarations = ?declaration_counts(&namespace),
                "Built namespace"
            );
            types.append(&self.emitter.types(
                identity,
                &namespace,
                descriptors,
                &options.loader_options,
            )?);

            let service_dir = service_dir(&output_dir, &resolved.source, index, &mut used_dirs);
            for rendered in self.emitter.services(
                identity,
                descriptors,
                &options.loader_options,
                &shared,
                &service_dir,
            )? {
                write_file(&rendered.service.path, &rendered.content)?;
                debug!(
                    service = %rendered.service.full_name,
                    path = %rendered.service.path.display(),
                    "Generated service"
                );
                services.push(rendered.service);
            }
        }

        write_file(&shared.types_path, types.as_str())?;

        info!("Generate success in {}", output_dir.display());

        Ok(GenerationReport {
            output_dir,
            cache_file,
            types_path: shared.types_path,
            services,
        })
    }

    async fn resolve_source(
        &self,
        base_url: &str,
        source: &ProtoSource,
        options: &GenerateOptions,
    ) -> Result<ResolvedSource> {
        debug!(url = %source.url, space = %source.space, service = %source.service, "Resolving proto source");

        let root = self
            .resolver
            .resolve(ResolveRequest {
                git_urls: vec![base_url.to_string(), source.url.clone()],
                branch: options.branch.clone(),
                access_token: options.access_token.clone(),
                resolve_path: options.resolve_path.clone(),
            })
            .await?;

        let mut json = root.to_json(true)?;
        strip_packages(&mut json, WELL_KNOWN_PACKAGES);
        let descriptors = root.extract()?;

        debug!(
            url = %source.url,
            services = descriptors.services.len(),
            messages = descriptors.messages.len(),
            enums = descriptors.enums.len(),
            "Resolved proto source"
        );

        Ok(ResolvedSource {
            source: source.clone(),
            json,
            descriptors,
        })
    }
}

/// Directory for one source's service wrappers
///
/// A source whose label is already taken gets its index appended, with a
/// further counter if that name is taken as well.
fn service_dir(
    output_dir: &Path,
    source: &ProtoSource,
    index: usize,
    used: &mut HashSet<(String, String)>,
) -> PathBuf {
    let mut label = source.service.clone();
    let mut attempt = 0;
    while !used.insert((source.space.clone(), label.clone())) {
        label = if attempt == 0 {
            format!("{}-{}", source.service, index)
        } else {
            format!("{}-{}-{}", source.service, index, attempt)
        };
        attempt += 1;
    }
    output_dir.join(&source.space).join(label)
}

fn write_cache(cache_dir: &Path, resolved: &[ResolvedSource]) -> Result<PathBuf> {
    fs::create_dir_all(cache_dir)?;

    let entries: Vec<CachedSource<'_>> = resolved
        .iter()
        .map(|r| CachedSource {
            space: &r.source.space,
            service: &r.source.service,
            json: &r.json,
        })
        .collect();

    let cache_file = cache_dir.join(CACHE_FILE);
    fs::write(&cache_file, serde_json::to_string(&entries)?)?;
    debug!(path = %cache_file.display(), "Wrote proto dump");
    Ok(cache_file)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content).map_err(|e| {
        GeneratorError::Generation(format!("Failed to write {}: {}", path.display(), e))
    })
}

fn absolute(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(normalize(&joined))
}
