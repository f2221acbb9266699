//! tintbar - tinted status icons with live style reload
//!
//! This is the main entry point for the tintbar command-line host.

mod services;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tintbar_core::assets::save_png;
use tintbar_core::host::HostIconSurface;
use tintbar_core::{
    AssetSource, Config, DirectoryAssets, FnListener, IconManager, Resolution, logging,
};
use tracing::{debug, info, warn};

use crate::services::config_manager::ConfigManager;
use crate::services::sample_host;

/// tintbar - tinted status icons with live style reload
#[derive(Parser, Debug)]
#[command(name = "tintbar", version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (uses XDG lookup if not specified)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Print example configuration and exit
    #[arg(long)]
    print_example_config: bool,

    /// Validate configuration and exit (returns non-zero on errors)
    #[arg(long)]
    check_config: bool,

    /// Icon directory with `native/` and `alternate/` PNG subdirectories
    /// (placeholder icons if not specified)
    #[arg(long, global = true)]
    assets: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve one icon with the configured style
    Resolve {
        /// Raw icon identity, e.g. stat_sys_signal_3
        icon: String,
        /// Tint rail (0 primary, 1 secondary)
        #[arg(short, long, default_value_t = 0)]
        index: usize,
        /// Resolve as a partially connected signal
        #[arg(long)]
        partial: bool,
        /// Resolve as a basic (non-signal) icon
        #[arg(long, conflicts_with = "data_type")]
        basic: bool,
        /// Resolve as a cellular data-type icon
        #[arg(long = "type")]
        data_type: bool,
        /// Write the rendered icon to this PNG file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Paint the sample surface and repaint it on every config change
    Watch,
}

/// What `resolve` should treat the icon as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IconKind {
    Signal { partial: bool },
    Basic,
    DataType,
}

fn main() -> ExitCode {
    let args = Args::parse();

    logging::init(args.verbose);

    // --print-example-config: print the example config with comments
    if args.print_example_config {
        print!("{}", tintbar_core::config::DEFAULT_CONFIG_TOML);
        return ExitCode::SUCCESS;
    }

    // If --config is specified, it must exist and be valid (no fallback)
    let load_result = match Config::find_and_load(args.config.as_deref()) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(ref source) = load_result.source {
        info!("Loaded configuration from {:?}", source);
    } else if load_result.used_defaults {
        warn!("Using default configuration (no config file found)");
    }

    let config = load_result.config;

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }
    for warning in config.warnings() {
        warn!("{}", warning);
    }

    debug!("Configuration validated successfully");

    if args.check_config {
        if let Some(ref source) = load_result.source {
            println!("Configuration valid: {}", source.display());
        } else {
            println!("Configuration valid (using defaults)");
        }
        return ExitCode::SUCCESS;
    }

    let assets = open_assets(args.assets.as_deref());

    let result = match args.command {
        Some(Command::Resolve {
            icon,
            index,
            partial,
            basic,
            data_type,
            out,
        }) => {
            let kind = if basic {
                IconKind::Basic
            } else if data_type {
                IconKind::DataType
            } else {
                IconKind::Signal { partial }
            };
            run_resolve(&config, assets, &icon, index, kind, out.as_deref())
        }
        Some(Command::Watch) => run_watch(config, load_result.source, assets),
        None => run_once(&config, assets),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn open_assets(dir: Option<&Path>) -> Rc<dyn AssetSource> {
    match dir {
        Some(dir) => {
            info!("Loading icons from {}", dir.display());
            Rc::new(DirectoryAssets::new(dir))
        }
        None => {
            debug!("Using placeholder icons");
            Rc::new(sample_host::placeholder_assets())
        }
    }
}

fn new_manager(config: &Config, assets: Rc<dyn AssetSource>) -> anyhow::Result<Rc<IconManager>> {
    let style = config.style().context("invalid style configuration")?;
    Ok(IconManager::new(assets, style, config.cache.capacity))
}

/// Resolve one icon and print where it came from.
fn run_resolve(
    config: &Config,
    assets: Rc<dyn AssetSource>,
    icon: &str,
    index: usize,
    kind: IconKind,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let manager = new_manager(config, assets)?;

    let artifact = match kind {
        IconKind::Signal { partial } => match manager.resolve(icon, index, !partial)? {
            Resolution::Icon(artifact) => artifact,
            Resolution::NoArtifact => {
                println!("{}: signal icons disabled, host icon stays", icon);
                return Ok(());
            }
        },
        IconKind::Basic => manager.resolve_basic(icon)?,
        IconKind::DataType => manager.resolve_type_icon(icon, index)?,
    };

    println!("{}", sample_host::describe_artifact(&artifact));

    if let Some(path) = out {
        save_png(&artifact.image, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

/// Paint the sample surface once and print it.
fn run_once(config: &Config, assets: Rc<dyn AssetSource>) -> anyhow::Result<()> {
    let manager = new_manager(config, assets)?;
    let surface = Rc::new(sample_host::sample_surface());
    let config_manager = ConfigManager::new(
        config.clone(),
        None,
        Rc::clone(&manager),
        Rc::clone(&surface) as Rc<dyn HostIconSurface>,
    );
    let cluster = config_manager.cluster();
    cluster.on_wifi_signal(true, "stat_sys_wifi_signal_3", true, false);
    cluster.on_mobile_signal(true, "stat_sys_signal_4_fully", true, true);

    println!("{}", config.summary());
    println!("\nSurface:");
    for line in sample_host::describe_surface(&surface.state()) {
        println!("  {}", line);
    }
    Ok(())
}

/// Keep the sample surface in sync with the config file until the watcher
/// stops.
fn run_watch(
    config: Config,
    source: Option<PathBuf>,
    assets: Rc<dyn AssetSource>,
) -> anyhow::Result<()> {
    let Some(path) = source else {
        bail!("no config file to watch; pass --config or create ~/.config/tintbar/config.toml");
    };

    let manager = new_manager(&config, assets)?;
    manager.register_listener(FnListener::shared(|aspects, style| {
        info!(
            "style changed: {:?} (coloring {}, mode {:?})",
            aspects, style.coloring_enabled, style.signal_icon_mode
        );
    }));

    let surface = Rc::new(sample_host::sample_surface());
    let config_manager = ConfigManager::new(
        config,
        Some(path),
        Rc::clone(&manager),
        Rc::clone(&surface) as Rc<dyn HostIconSurface>,
    );
    let log_surface = || {
        for line in sample_host::describe_surface(&surface.state()) {
            info!("  {}", line);
        }
    };
    log_surface();

    let Some(messages) = config_manager.start_watching() else {
        bail!("config file watcher could not be started");
    };

    for msg in messages {
        config_manager.handle_config_message(msg);
        let stats = manager.cache_stats();
        debug!(
            "cache: {} of {} entries, hit rate {:.2}",
            stats.size,
            stats.capacity,
            stats.hit_rate()
        );
        log_surface();
    }

    config_manager.stop_watching();
    Ok(())
}
