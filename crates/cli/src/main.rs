//! grpc-code-gen CLI
//!
//! Command-line interface for generating TypeScript gRPC clients from protobuf
//! repositories.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use grpc_code_gen_common::{
    BytesAs, EnumsAs, GenerateOptions, LongsAs, ProtoRoot, Target,
};
use grpc_code_gen_generator::CodeGenerator;
use grpc_code_gen_parser::{DescriptorPoolRoot, GitProtoResolver};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "grpc-code-gen")]
#[command(version, about = "Generate TypeScript gRPC clients from protobuf repositories", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve proto repositories and generate client code
    #[command(after_help = "EXAMPLES:\n  \
        # Base repository first, then one repository per service\n  \
        grpc-code-gen generate \\\n    \
        --git-url git@gitlab.com:org/base-proto.git \\\n    \
        --git-url git@gitlab.com:org/userSvc-proto.git \\\n    \
        --git-url git@gitlab.com:org/orderSvc-proto.git \\\n    \
        --output ./src/code-gen\n\n  \
        # Load options from YAML and override the branch\n  \
        grpc-code-gen generate --codegen-config grpc-code-gen.yaml --branch develop")]
    Generate(GenerateArgs),

    /// Display the services and types in a compiled descriptor set
    #[command(after_help = "EXAMPLES:\n  \
        protoc --include_imports --include_source_info \\\n    \
        --descriptor_set_out=user.pb user.proto\n  \
        grpc-code-gen inspect --descriptor-set user.pb")]
    Inspect {
        /// Path to a FileDescriptorSet produced by protoc
        #[arg(short, long)]
        descriptor_set: PathBuf,
    },
}

#[derive(clap::Args)]
struct GenerateArgs {
    /// Repository URL; the first is the shared base (repeatable)
    #[arg(short = 'g', long = "git-url")]
    git_urls: Vec<String>,

    /// Branch to check out in every repository
    #[arg(short, long)]
    branch: Option<String>,

    /// Access token for private repositories
    #[arg(long, env = "GRPC_CODE_GEN_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Output directory (cleaned on every run)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory for the consolidated proto dump
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Code-generation target
    #[arg(long)]
    target: Option<TargetArg>,

    /// Runtime config module imported by the generated client factory
    #[arg(long)]
    config_file_path: Option<PathBuf>,

    /// gRPC client library imported by generated code
    #[arg(long)]
    grpc_npm_name: Option<String>,

    /// Directory inside each checkout that holds the .proto tree
    #[arg(long)]
    proto_root: Option<PathBuf>,

    /// protoc binary used to compile checked out protos
    #[arg(long, env = "PROTOC")]
    protoc: Option<PathBuf>,

    /// Keep field names as written in .proto files
    #[arg(long)]
    keep_case: bool,

    /// Representation of 64-bit integers
    #[arg(long)]
    longs: Option<LongsArg>,

    /// Representation of enum values
    #[arg(long)]
    enums: Option<EnumsArg>,

    /// Representation of bytes fields
    #[arg(long)]
    bytes: Option<BytesArg>,

    /// Populate default values for missing fields
    #[arg(long)]
    defaults: bool,

    /// Always set repeated fields, even when empty
    #[arg(long)]
    arrays: bool,

    /// Always set map fields, even when empty
    #[arg(long)]
    objects: bool,

    /// Add a virtual field naming the set member of each oneof
    #[arg(long)]
    oneofs: bool,

    /// YAML file with generation options (flags take precedence)
    #[arg(short = 'c', long)]
    codegen_config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TargetArg {
    Javascript,
    Typescript,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LongsArg {
    String,
    Number,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum EnumsArg {
    String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BytesArg {
    String,
    Array,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    // One thread: sources resolve concurrently as tasks on it
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    match cli.command {
        Commands::Generate(args) => runtime.block_on(generate_command(args, cli.verbose)),
        Commands::Inspect { descriptor_set } => inspect_command(&descriptor_set, cli.verbose),
    }
}

/// Merge flags over the optional YAML options
fn build_options(args: &GenerateArgs) -> Result<GenerateOptions> {
    let mut options = match &args.codegen_config {
        Some(path) => GenerateOptions::load(path)
            .with_context(|| format!("Failed to load options from {}", path.display()))?,
        None => GenerateOptions::default(),
    };

    if !args.git_urls.is_empty() {
        options.git_urls = args.git_urls.clone();
    }
    if let Some(branch) = &args.branch {
        options.branch = Some(branch.clone());
    }
    if let Some(token) = &args.access_token {
        options.access_token = Some(token.clone());
    }
    if let Some(output) = &args.output {
        options.base_dir = output.clone();
    }
    if let Some(cache_dir) = &args.cache_dir {
        options.cache_dir = cache_dir.clone();
    }
    if let Some(target) = args.target {
        options.target = match target {
            TargetArg::Javascript => Target::Javascript,
            TargetArg::Typescript => Target::Typescript,
        };
    }
    if let Some(path) = &args.config_file_path {
        options.config_file_path = Some(path.clone());
    }
    if let Some(name) = &args.grpc_npm_name {
        options.grpc_npm_name = name.clone();
    }

    let loader = &mut options.loader_options;
    loader.keep_case |= args.keep_case;
    loader.defaults |= args.defaults;
    loader.arrays |= args.arrays;
    loader.objects |= args.objects;
    loader.oneofs |= args.oneofs;
    if let Some(longs) = args.longs {
        loader.longs = Some(match longs {
            LongsArg::String => LongsAs::String,
            LongsArg::Number => LongsAs::Number,
        });
    }
    if let Some(EnumsArg::String) = args.enums {
        loader.enums = Some(EnumsAs::String);
    }
    if let Some(bytes) = args.bytes {
        loader.bytes = Some(match bytes {
            BytesArg::String => BytesAs::String,
            BytesArg::Array => BytesAs::Array,
        });
    }

    if let Some(proto_root) = args.proto_root.clone() {
        options = options.with_resolve_path(move |_url: &str, checkout: &Path| {
            checkout.join(&proto_root)
        });
    }

    Ok(options)
}

async fn generate_command(args: GenerateArgs, verbose: bool) -> Result<()> {
    let options = build_options(&args)?;
    if options.git_urls.len() < 2 {
        bail!(
            "Need a base repository plus at least one service repository (got {}); pass --git-url for each",
            options.git_urls.len()
        );
    }

    println!(
        "{} Generating {} clients for {} proto sources",
        "→".cyan(),
        options.target.to_string().yellow(),
        options.git_urls.len() - 1
    );
    if verbose {
        println!("  Base: {}", options.git_urls[0]);
        for url in &options.git_urls[1..] {
            println!("  Source: {}", url);
        }
        println!("  Output: {}", options.base_dir.display());
        println!("  Cache: {}", options.cache_dir.display());
        println!("  gRPC library: {}", options.grpc_npm_name);
    }

    let mut resolver = GitProtoResolver::new();
    if let Some(protoc) = &args.protoc {
        resolver = resolver.with_protoc(protoc);
    }

    let generator = CodeGenerator::new(resolver).context("Failed to load templates")?;
    info!(
        target_lang = %options.target,
        sources = options.git_urls.len() - 1,
        output = %options.base_dir.display(),
        "Starting generate command"
    );
    let report = generator
        .run(&options)
        .await
        .context("Failed to generate gRPC clients")?;

    println!("\n{}", "✓ Generation complete!".green().bold());
    println!("\n{}", "Generated files:".bold());
    for file in ["grpcObj.ts", "getGrpcClient.ts", "serviceWrapper.ts", "types.ts"] {
        println!("  📄 {}", report.output_dir.join(file).display());
    }
    for service in &report.services {
        println!(
            "  📄 {} ({})",
            service.path.display(),
            service.full_name.cyan()
        );
        if verbose {
            for method in &service.methods {
                println!("      • {}", method);
            }
        }
    }
    println!("\n  Proto dump: {}", report.cache_file.display());
    info!(services = report.services.len(), "Generate command finished");

    Ok(())
}

fn inspect_command(path: &Path, verbose: bool) -> Result<()> {
    println!("{} Loading descriptor set: {}", "→".cyan(), path.display());

    let root = DescriptorPoolRoot::from_file(path)
        .with_context(|| format!("Failed to load descriptor set {}", path.display()))?;
    let descriptors = root
        .extract()
        .context("Failed to extract descriptors")?;
    debug!(
        services = descriptors.services.len(),
        messages = descriptors.messages.len(),
        "Extracted descriptors"
    );

    println!("\n{}", "✓ Descriptor set loaded!".green().bold());
    println!("  Services: {}", descriptors.services.len());
    println!("  Methods: {}", descriptors.methods.len());
    println!("  Messages: {}", descriptors.messages.len());
    println!("  Enums: {}", descriptors.enums.len());

    if !descriptors.services.is_empty() {
        println!("\n{}", "Services:".bold());
    }
    for service in &descriptors.services {
        println!("  • {}", service.full_name.cyan());
        for method in descriptors.methods_of(service) {
            let kind = match (method.request_stream, method.response_stream) {
                (false, false) => "unary",
                (true, false) => "client stream",
                (false, true) => "server stream",
                (true, true) => "bidi stream",
            };
            println!(
                "    {} ({}) {} → {}",
                method.name.yellow(),
                kind,
                method.request_type,
                method.response_type
            );
        }
    }

    if verbose {
        println!("\n{}", "Messages:".bold());
        for message in &descriptors.messages {
            println!("  • {} ({} fields)", message.full_name, message.fields.len());
        }
        println!("\n{}", "Enums:".bold());
        for enum_type in &descriptors.enums {
            println!("  • {} ({} values)", enum_type.full_name, enum_type.values.len());
        }
    }

    Ok(())
}
