// Modbridge CLI
// Daemon binary: remaps pointer side buttons to keyboard modifiers

use std::path::PathBuf;

#[cfg(feature = "pure-rust")]
use anyhow::Context;
#[cfg(feature = "pure-rust")]
use clap::Parser;

#[cfg(feature = "pure-rust")]
use modbridge_core::input::list_input_devices;
#[cfg(feature = "pure-rust")]
use modbridge_core::{pipeline, EvdevBackend, Settings, UinputSink};

/// Map pointer side buttons to keyboard modifiers
#[derive(Parser, Debug)]
#[command(name = "modbridge")]
#[command(version)]
#[command(about = "Map pointer side buttons to keyboard modifiers", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Validate config and exit
    #[arg(long)]
    check_config: bool,

    /// List input event devices with their USB identifiers
    #[arg(long)]
    list_devices: bool,
}

/// Main application state
#[cfg(feature = "pure-rust")]
struct Application {
    settings: Settings,
}

#[cfg(feature = "pure-rust")]
impl Application {
    fn new(args: &Args) -> anyhow::Result<Self> {
        let settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;
        match settings.source_path() {
            Some(path) => log::info!("Loaded settings from {}", path.display()),
            None => log::info!("Using built-in settings"),
        }
        Ok(Self { settings })
    }

    /// Print the effective configuration
    fn check_config(&self) {
        let s = &self.settings;
        println!("Configuration is valid");
        println!("  pointer:   {} -> '{}'", s.pointer.id(), s.pointer_name());
        println!("  keyboard:  {} -> '{}'", s.keyboard.id(), s.keyboard_name());
        println!("  motion_scale = {}", s.motion_scale);
        println!(
            "  transport: capacity={} overflow={}",
            s.transport.capacity,
            s.transport.overflow.as_str()
        );
        println!(
            "  reconnect: settle={}ms backoff={}ms",
            s.reconnect.settle_ms, s.reconnect.backoff_ms
        );
    }

    /// List input event devices
    fn list_devices() -> anyhow::Result<()> {
        let devices = list_input_devices().context("Failed to enumerate input devices")?;
        println!("Found {} input event device(s):", devices.len());
        for device in &devices {
            let path = device
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {}  {}:{}  {} {}",
                path,
                device.vendor_id.as_deref().unwrap_or("????"),
                device.model_id.as_deref().unwrap_or("????"),
                device.vendor.as_deref().unwrap_or(""),
                device.model.as_deref().unwrap_or("")
            );
        }
        Ok(())
    }

    /// Run until a fatal condition
    fn run(&self) -> anyhow::Result<()> {
        log::info!("Starting modbridge daemon...");

        let handle = pipeline::start(
            &self.settings,
            EvdevBackend::new(),
            EvdevBackend::new(),
            |settings| {
                let pointer = UinputSink::pointer(&settings.pointer_name(), settings.pointer.id())?;
                let keyboard =
                    UinputSink::keyboard(&settings.keyboard_name(), settings.keyboard.id())?;
                Ok((pointer, keyboard))
            },
        )
        .context("Failed to start pipeline")?;
        log::info!("modbridge is running");

        Err(handle.wait()).context("Pipeline stopped")
    }
}

#[cfg(feature = "pure-rust")]
fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

#[cfg(feature = "pure-rust")]
fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    // Handle list-devices flag (doesn't require config)
    if args.list_devices {
        return Application::list_devices();
    }

    let app = Application::new(&args)?;

    if args.check_config {
        app.check_config();
        return Ok(());
    }

    app.run()
}

// Stub for when pure-rust feature is not enabled
#[cfg(not(feature = "pure-rust"))]
fn main() {
    eprintln!("Error: modbridge binary requires the 'pure-rust' feature to be enabled.");
    eprintln!("Please build with: cargo build --release --features pure-rust --bin modbridge");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    #[cfg(feature = "pure-rust")]
    use super::*;

    #[test]
    #[cfg(feature = "pure-rust")]
    fn test_args_parsing() {
        let args = Args::parse_from(["modbridge", "--config", "/tmp/modbridge.toml"]);

        assert_eq!(args.config, Some(PathBuf::from("/tmp/modbridge.toml")));
        assert!(!args.verbose);
        assert!(!args.check_config);
        assert!(!args.list_devices);
    }

    #[test]
    #[cfg(feature = "pure-rust")]
    fn test_args_with_options() {
        let args = Args::parse_from(["modbridge", "-c", "/etc/modbridge.toml", "-v", "--check-config"]);

        assert_eq!(args.config, Some(PathBuf::from("/etc/modbridge.toml")));
        assert!(args.verbose);
        assert!(args.check_config);
    }

    #[test]
    #[cfg(feature = "pure-rust")]
    fn test_args_list_devices() {
        let args = Args::parse_from(["modbridge", "--list-devices"]);
        assert!(args.list_devices);
        assert!(args.config.is_none());
    }

    #[test]
    #[cfg(feature = "pure-rust")]
    fn test_application_with_config_file() {
        let path = std::env::temp_dir().join(format!("modbridge-cli-{}.toml", std::process::id()));
        std::fs::write(&path, "motion_scale = 0.25\n").unwrap();

        let args = Args::parse_from(["modbridge", "--config", path.to_str().unwrap()]);
        let app = Application::new(&args).unwrap();
        assert_eq!(app.settings.motion_scale, 0.25);

        std::fs::remove_file(&path).unwrap();
    }
}
