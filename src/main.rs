mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use rand::RngCore;

use mv_av::{FfprobeProber, ToolRegistry};
use mv_core::config::Config;

fn load_config(path: Option<&Path>) -> Config {
    let mut config = Config::load_or_default(path);
    config.apply_env_overrides();
    config
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, otherwise pick defaults from the verbose flag.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "montage=trace,mv_server=trace,mv_pipeline=trace,mv_av=debug,mv_core=debug,tower_http=debug"
                .to_string()
        } else {
            "montage=info,mv_server=info,mv_pipeline=info,mv_av=info,mv_core=info,tower_http=info"
                .to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let mut config = load_config(cli.config.as_deref());
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            tracing::info!("Starting montage {}", env!("CARGO_PKG_VERSION"));
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(mv_server::start(config))?;
            Ok(())
        }
        Commands::Probe { file, json } => {
            let config = load_config(cli.config.as_deref());
            probe_file(&file, json, &config)
        }
        Commands::CheckTools => {
            let config = load_config(cli.config.as_deref());
            check_tools(&config)
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("montage {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::GenerateApiKey => {
            println!("{}", generate_api_key());
            Ok(())
        }
    }
}

fn probe_file(file: &Path, json: bool, config: &Config) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let tools = ToolRegistry::discover(&config.tools);
    let ffprobe = tools.require("ffprobe")?;
    let prober = FfprobeProber::new(ffprobe.path.clone());

    let rt = tokio::runtime::Runtime::new()?;
    let descriptor = rt
        .block_on(prober.probe(file))
        .with_context(|| format!("probing {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
    } else {
        println!("File: {}", file.display());
        println!("Video: {} {}x{}", descriptor.codec, descriptor.width, descriptor.height);
        println!("Descriptor: {descriptor}");
    }

    Ok(())
}

fn check_tools(config: &Config) -> Result<()> {
    println!("Checking external tools...\n");

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
            print!(" ({})", version.lines().next().unwrap_or(""));
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
        println!("Some tools are missing. Montage requests will fail until they are installed.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let mut config = match path {
        Some(p) => {
            println!("Validating config: {}", p.display());
            Config::load(p).with_context(|| format!("loading {}", p.display()))?
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };
    config.apply_env_overrides();

    println!("✓ Configuration is valid");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!(
        "  Public base URL: {}",
        config.server.public_base_url.as_deref().unwrap_or("(bind address)")
    );
    println!(
        "  Webhook: {}",
        config.notify.webhook_url.as_deref().unwrap_or("(disabled)")
    );
    println!("  API key set: {}", config.auth.api_key.is_some());
    println!("  Scratch dir: {}", config.storage.scratch_dir.display());
    println!("  Output dir: {}", config.storage.output_dir.display());
    println!(
        "  Fetch: {}s timeout, {} concurrent",
        config.fetch.timeout_secs, config.fetch.max_concurrent
    );
    println!("  Tool timeout: {}s", config.assembly.tool_timeout_secs);

    let warnings = config.validate();
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for warning in warnings {
            println!("  - {warning}");
        }
    }

    Ok(())
}

/// 32 random bytes, hex encoded.
fn generate_api_key() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
