mod cli;

use clipfit::batch::{BatchOrchestrator, BatchRequest, Candidate, OutputMode};
use clipfit::config;

use anyhow::{Context, Result};
use cf_av::{FfprobeProbe, MediaProbe, ToolRegistry};
use cf_core::MediaDescriptor;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set. Logs go to stderr so stdout stays parseable.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "clipfit=debug,cf_av=debug,cf_core=debug".to_string()
        } else {
            "clipfit=info,cf_av=info,cf_core=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Convert {
            files,
            output_dir,
            inline,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(convert(files, output_dir, inline, cli.config.as_deref()))
        }
        Commands::Probe { file, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_file(&file, json, cli.config.as_deref()))
        }
        Commands::Plan {
            duration,
            size,
            ceiling,
        } => plan(duration, size, ceiling, cli.config.as_deref()),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate { file } => {
            let path = file.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::InitConfig { path, force } => init_config(&path, force),
    }
}

async fn convert(
    files: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    inline: bool,
    config_path: Option<&Path>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools);

    let mut orchestrator = BatchOrchestrator::with_tools(&config, &tools)
        .context("Failed to set up the conversion pipeline")?;
    if inline {
        orchestrator = orchestrator.with_output_mode(OutputMode::Inline);
    } else if let Some(dir) = output_dir {
        orchestrator = orchestrator.with_output_mode(OutputMode::Directory(dir));
    }

    let request: BatchRequest = files.into_iter().map(Candidate::from_file).collect();
    let result = orchestrator.run(request).await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

async fn probe_file(file: &Path, json: bool, config_path: Option<&Path>) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools);
    let prober = FfprobeProbe::from_registry(&tools, config.encoder.probe_timeout())?;
    let descriptor = prober.probe(file).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
    } else {
        println!("File: {}", file.display());
        println!("Duration: {:.3}s", descriptor.duration_seconds());
        println!("Size: {} bytes", descriptor.byte_size());
        println!("Bitrate: {} bps", descriptor.bitrate_bps());
    }

    Ok(())
}

fn plan(duration: f64, size: u64, ceiling: Option<u64>, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let planner = config.limits.planner()?;
    let ceiling = ceiling.unwrap_or(config.limits.size_ceiling_bytes);
    if ceiling == 0 {
        anyhow::bail!("Ceiling must be greater than 0");
    }

    let descriptor = MediaDescriptor::new(duration, size, None)?;
    let plan = planner.plan(&descriptor, ceiling);

    println!("Ceiling: {ceiling} bytes");
    println!("Plan: {plan}");
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools);
    let mut all_ok = true;

    for tool in tools.check_all() {
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
        println!("Some tools are missing. Install ffmpeg to enable conversion.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::read_config(p)?;
            println!("✓ Configuration is valid");
            print_summary(&config);
            for warning in config.warnings() {
                println!("  warning: {warning}");
            }
        }
        None => {
            println!("No config file specified, using defaults");
            print_summary(&config::Config::default());
        }
    }

    Ok(())
}

fn print_summary(config: &config::Config) {
    println!("  Size ceiling: {} bytes", config.limits.size_ceiling_bytes);
    println!("  Upload limit: {} bytes", config.limits.max_upload_bytes);
    println!("  Batch limit: {} files", config.limits.max_batch_items);
    println!(
        "  Encoder: {} preset {} crf {}",
        config.encoder.video_codec, config.encoder.preset, config.encoder.crf
    );
}

fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{:?} already exists; use --force to overwrite", path);
    }
    config::persist::save_config(path, &config::Config::default())?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}
