//! Command-line interface
//!
//! Every command loads [`Config`] from the environment first; flags override
//! the loaded values.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, CommandFactory, Parser, Subcommand};

use crate::cache::ResultCache;
use crate::config::Config;
use crate::document::{supported_mime_type, ProcessingOptions, ProcessingResult};
use crate::report::{OutputFormat, ReportExporter};
use crate::routes;
use crate::state::{build_processor, mistral_provider, AppState};

/// Top-level CLI entry point.
#[derive(Debug, Parser)]
#[command(
    name = "docsight",
    version,
    about = "Document text extraction with caching and batch processing"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    /// Mistral API key used for extraction.
    #[arg(global = true, long, env = "MISTRAL_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn print_help() {
        let mut cmd = Cli::command();
        let _ = cmd.print_help();
        println!();
    }
}

/// Supported subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract text from a single document.
    Process(ProcessArgs),
    /// Extract text from every supported document in a directory.
    Batch(BatchArgs),
    /// Run the HTTP server.
    Server(ServerArgs),
    /// Remove cache entries older than the given age.
    ClearCache(ClearCacheArgs),
    /// Show processing and cache statistics.
    Stats,
}

/// Flags shared by `process` and `batch`.
#[derive(Debug, Args)]
pub struct ExtractionFlags {
    /// Write the report to this file inside the output directory instead of stdout.
    #[arg(short, long)]
    pub output: Option<String>,
    /// Skip the result cache for both reads and writes.
    #[arg(long)]
    pub no_cache: bool,
    /// Ask the provider to describe embedded images.
    #[arg(long)]
    pub extract_images: bool,
    /// Ask the provider to add an English translation.
    #[arg(long)]
    pub auto_translate: bool,
}

impl ExtractionFlags {
    fn options(&self) -> ProcessingOptions {
        ProcessingOptions {
            extract_images: self.extract_images,
            auto_translate: self.auto_translate,
            ..ProcessingOptions::default()
        }
    }
}

#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// Document to process.
    pub file: PathBuf,
    /// Report format (json, markdown, txt, html).
    #[arg(long, default_value_t = OutputFormat::Markdown)]
    pub format: OutputFormat,
    #[command(flatten)]
    pub flags: ExtractionFlags,
}

#[derive(Debug, Args)]
pub struct BatchArgs {
    /// Directory containing documents (not searched recursively).
    pub directory: PathBuf,
    /// Report format (json, markdown, txt, html).
    #[arg(long, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
    /// Maximum documents processed at once (defaults to OCR_MAX_CONCURRENT).
    #[arg(long)]
    pub max_concurrent: Option<usize>,
    #[command(flatten)]
    pub flags: ExtractionFlags,
}

#[derive(Debug, Args)]
pub struct ServerArgs {
    /// Bind address (defaults to SERVER_HOST).
    #[arg(long)]
    pub host: Option<String>,
    /// Bind port (defaults to SERVER_PORT).
    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(Debug, Args)]
pub struct ClearCacheArgs {
    /// Remove entries older than this many days.
    #[arg(long, default_value_t = 30)]
    pub days: u64,
}

/// Supported documents directly inside `dir`, sorted by path
pub fn collect_documents(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("Directory not found: {}", dir.display());
    }

    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        let supported = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(supported_mime_type)
            .is_some();
        if path.is_file() && supported {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Dispatch a parsed command
pub async fn run(cli: Cli, mut config: Config) -> anyhow::Result<()> {
    if let Some(key) = cli.api_key.filter(|k| !k.trim().is_empty()) {
        config.provider.api_key = Some(key);
    }

    match cli.command {
        None => {
            Cli::print_help();
            Ok(())
        }
        Some(Commands::Process(args)) => process(args, &config).await,
        Some(Commands::Batch(args)) => batch(args, &config).await,
        Some(Commands::Server(args)) => server(args, config).await,
        Some(Commands::ClearCache(args)) => clear_cache(args, &config).await,
        Some(Commands::Stats) => stats(&config).await,
    }
}

fn require_api_key(config: &Config) -> anyhow::Result<()> {
    if config.provider.api_key.is_none() {
        bail!("Mistral API key required: pass --api-key or set MISTRAL_API_KEY");
    }
    Ok(())
}

async fn emit_report(
    config: &Config,
    results: &[ProcessingResult],
    format: OutputFormat,
    output: Option<&str>,
) -> anyhow::Result<()> {
    let exporter = ReportExporter::new(&config.processing.output_dir);
    match output {
        Some(file_name) => {
            let (_, path) = exporter.export_to_file(results, format, file_name).await?;
            tracing::info!(path = %path.display(), "Report written");
        }
        None => println!("{}", exporter.export(results, format)?),
    }
    Ok(())
}

async fn process(args: ProcessArgs, config: &Config) -> anyhow::Result<()> {
    require_api_key(config)?;
    let processor = build_processor(config, mistral_provider(&config.provider))?;

    let result = processor
        .process_one(&args.file, &args.flags.options(), !args.flags.no_cache)
        .await;

    emit_report(config, &[result], args.format, args.flags.output.as_deref()).await?;

    let stats = processor.statistics();
    tracing::info!(
        success_rate = stats.success_rate,
        "Processing completed"
    );
    Ok(())
}

async fn batch(args: BatchArgs, config: &Config) -> anyhow::Result<()> {
    let paths = collect_documents(&args.directory)?;
    if paths.is_empty() {
        bail!("No supported files found in {}", args.directory.display());
    }
    tracing::info!(count = paths.len(), "Found files to process");

    require_api_key(config)?;
    let processor = build_processor(config, mistral_provider(&config.provider))?;
    let max_concurrent = args
        .max_concurrent
        .unwrap_or(config.processing.max_concurrent);

    let results = processor
        .process_batch_with_cache(
            &paths,
            &args.flags.options(),
            max_concurrent,
            !args.flags.no_cache,
        )
        .await;

    emit_report(config, &results, args.format, args.flags.output.as_deref()).await?;

    let stats = processor.statistics();
    tracing::info!(
        success_rate = stats.success_rate,
        "Batch processing completed"
    );
    Ok(())
}

async fn server(args: ServerArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if config.provider.api_key.is_none() {
        tracing::warn!("No Mistral API key configured; extraction requests will fail");
    }

    let listener = tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| format!("binding {}:{}", config.server.host, config.server.port))?;
    tracing::info!("docsight listening on {}", listener.local_addr()?);

    let state = AppState::new(config)?;
    let app = routes::app(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn clear_cache(args: ClearCacheArgs, config: &Config) -> anyhow::Result<()> {
    let cache = ResultCache::open(&config.processing.cache_dir)?;
    let removed = cache.evict(args.days).await?;
    tracing::info!(removed, older_than_days = args.days, "Removed cache files");
    Ok(())
}

async fn stats(config: &Config) -> anyhow::Result<()> {
    let processor = build_processor(config, mistral_provider(&config.provider))?;
    let stats = processor.statistics();
    let entries = processor.cache().entry_count().await?;

    println!("Processing Statistics");
    println!("{}", "=".repeat(30));
    println!("Total Processed: {}", stats.total_processed);
    println!("Successful: {}", stats.successful);
    println!("Failed: {}", stats.failed);
    println!("Cached: {}", stats.cached);
    println!("Success Rate: {:.1}%", stats.success_rate);
    println!("Cache Hit Rate: {:.1}%", stats.cache_hit_rate);
    println!("Cache Entries: {}", entries);
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_collect_documents_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        for name in ["b.png", "a.pdf", "c.JPG", "notes.txt", "d.docx"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let names: Vec<String> = collect_documents(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["a.pdf", "b.png", "c.JPG"]);
    }

    #[test]
    fn test_collect_documents_missing_dir() {
        assert!(collect_documents(Path::new("/definitely/not/here")).is_err());
    }

    #[test]
    fn test_parse_process_command() {
        let cli = Cli::try_parse_from([
            "docsight",
            "process",
            "scan.pdf",
            "--format",
            "md",
            "--no-cache",
            "--api-key",
            "k",
        ])
        .unwrap();

        assert_eq!(cli.api_key.as_deref(), Some("k"));
        match cli.command {
            Some(Commands::Process(args)) => {
                assert_eq!(args.file, PathBuf::from("scan.pdf"));
                assert_eq!(args.format, OutputFormat::Markdown);
                assert!(args.flags.no_cache);
                assert!(!args.flags.extract_images);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_batch_defaults() {
        let cli = Cli::try_parse_from(["docsight", "batch", "docs"]).unwrap();
        match cli.command {
            Some(Commands::Batch(args)) => {
                assert_eq!(args.format, OutputFormat::Json);
                assert!(args.max_concurrent.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_flags_map_to_options() {
        let flags = ExtractionFlags {
            output: None,
            no_cache: false,
            extract_images: true,
            auto_translate: true,
        };
        let options = flags.options();
        assert!(options.extract_images);
        assert!(options.auto_translate);
        assert!(options.preserve_formatting);
        assert!(options.extract_tables);
    }
}
