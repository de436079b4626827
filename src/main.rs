mod cli;

use clipforge::{config, App};

use anyhow::{Context, Result};
use cf_av::MediaProbe;
use cf_core::{AssetId, ShareLinkId};
use cf_pipeline::Upload;
use clap::Parser;
use cli::{Cli, Commands, ShareCommands};
use serde::Serialize;
use std::future::Future;
use std::path::Path;
use tokio_util::sync::CancellationToken;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "clipforge=trace,cf_pipeline=trace,cf_av=debug,cf_db=debug,cf_core=debug".to_string()
        } else {
            "clipforge=info,cf_pipeline=info,cf_av=warn,cf_db=warn".to_string()
        }
    });

    // Records go to stdout; keep logs on stderr so output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Ingest { file, content_type } => {
            ingest_file(&file, content_type, config_path)
        }
        Commands::Trim {
            asset_id,
            start,
            end,
        } => trim_asset(&asset_id, start, end, config_path),
        Commands::Merge { asset_ids } => merge_assets(&asset_ids, config_path),
        Commands::Assets => {
            let app = open_app(config_path)?;
            print_json(&app.assets.list()?)
        }
        Commands::Asset { id } => {
            let app = open_app(config_path)?;
            let id = parse_asset_id(&id)?;
            let asset = app
                .assets
                .get(id)?
                .ok_or_else(|| cf_core::Error::not_found("asset", id))?;
            print_json(&asset)
        }
        Commands::Share { command } => share(command, config_path),
        Commands::Probe { file, json } => probe_file(&file, json, config_path),
        Commands::CheckTools => check_tools(config_path),
        Commands::Validate {
            config: validate_path,
        } => {
            let path = validate_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("clipforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn open_app(config_path: Option<&Path>) -> Result<App> {
    let config = config::load_config_or_default(config_path)?;
    App::open(config)
}

/// Run `op` on a fresh runtime with a token that Ctrl-C cancels.
fn run_cancellable<F, Fut, T>(op: F) -> Result<T>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let cancel = CancellationToken::new();
        let watcher = cancel.clone();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, cancelling");
                watcher.cancel();
            }
        });

        let result = op(cancel).await;
        interrupt.abort();
        result
    })
}

fn ingest_file(file: &Path, content_type: Option<String>, config_path: Option<&Path>) -> Result<()> {
    let app = open_app(config_path)?;
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("Not a file path: {:?}", file))?;

    let asset = run_cancellable(|cancel| async move {
        let body = tokio::fs::File::open(file)
            .await
            .with_context(|| format!("Failed to open {:?}", file))?;
        let mut upload = Upload::new(filename, body);
        if let Some(content_type) = content_type {
            upload = upload.with_content_type(content_type);
        }
        let asset = app.ingestion()?.ingest(upload, &cancel).await?;
        Ok(asset)
    })?;

    print_json(&asset)
}

fn trim_asset(asset_id: &str, start: f64, end: f64, config_path: Option<&Path>) -> Result<()> {
    let app = open_app(config_path)?;
    let id = parse_asset_id(asset_id)?;

    let asset = run_cancellable(|cancel| async move {
        let asset = app.edits()?.trim(id, start, end, &cancel).await?;
        Ok(asset)
    })?;

    print_json(&asset)
}

fn merge_assets(asset_ids: &[String], config_path: Option<&Path>) -> Result<()> {
    let app = open_app(config_path)?;
    let ids = asset_ids
        .iter()
        .map(|id| parse_asset_id(id))
        .collect::<Result<Vec<_>>>()?;

    let asset = run_cancellable(|cancel| async move {
        let asset = app.edits()?.merge(&ids, &cancel).await?;
        Ok(asset)
    })?;

    print_json(&asset)
}

fn share(command: ShareCommands, config_path: Option<&Path>) -> Result<()> {
    let app = open_app(config_path)?;
    let shares = app.shares();
    let rt = tokio::runtime::Runtime::new()?;

    match command {
        ShareCommands::Create {
            asset_id,
            ttl_hours,
        } => {
            let asset_id = parse_asset_id(&asset_id)?;
            print_json(&rt.block_on(shares.create(asset_id, ttl_hours))?)
        }
        ShareCommands::Resolve { id } => {
            let id = parse_share_id(&id)?;
            print_json(&rt.block_on(shares.resolve(id))?)
        }
        ShareCommands::List { asset } => {
            let asset = asset.as_deref().map(parse_asset_id).transpose()?;
            print_json(&rt.block_on(shares.list(asset))?)
        }
        ShareCommands::Expiring { within_hours } => {
            print_json(&rt.block_on(shares.expiring_within(within_hours))?)
        }
        ShareCommands::Delete { id } => {
            let id = parse_share_id(&id)?;
            let deleted = rt.block_on(shares.delete(id))?;
            print_json(&serde_json::json!({ "id": id, "deleted": deleted }))
        }
    }
}

fn probe_file(file: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let prober = cf_av::ToolRegistry::discover(&config.tools).prober()?;
    let info = run_cancellable(|cancel| async move {
        let info = prober.probe(file, &cancel).await?;
        Ok(info)
    })?;

    if json {
        print_json(&info)
    } else {
        let secs = info.duration_seconds as u64;
        println!("File: {}", file.display());
        println!("Format: {}", info.format);
        println!("Size: {} bytes", info.size_bytes);
        println!(
            "Duration: {:02}:{:02}:{:02} ({:.3}s)",
            secs / 3600,
            (secs / 60) % 60,
            secs % 60,
            info.duration_seconds
        );
        Ok(())
    }
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let registry = cf_av::ToolRegistry::discover(&config.tools);
    let tools = tokio::runtime::Runtime::new()?.block_on(registry.check_all());
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Ingest, trim and merge need ffmpeg and ffprobe.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("✓ Configuration is valid");
    } else {
        println!("✓ Configuration parsed with {} warning(s)", warnings.len());
        for warning in &warnings {
            println!("  ! {}", warning);
        }
    }
    println!("  Database: {}", config.database.path.display());
    println!("  Storage: {}", config.storage.root.display());
    println!(
        "  Duration bounds: {}s..={}s",
        config.policy.min_duration_secs, config.policy.max_duration_secs
    );
    println!("  Max upload: {} bytes", config.policy.max_upload_bytes);
    println!(
        "  Share TTL: {}h..={}h",
        config.share.min_ttl_hours, config.share.max_ttl_hours
    );

    Ok(())
}

fn parse_asset_id(s: &str) -> Result<AssetId> {
    s.parse()
        .with_context(|| format!("Invalid asset ID: {s}"))
}

fn parse_share_id(s: &str) -> Result<ShareLinkId> {
    s.parse()
        .with_context(|| format!("Invalid share link ID: {s}"))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
