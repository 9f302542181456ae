//! `aerollm` – run the model-driven control loop from the command line.
//!
//! 1. Loads `~/.aerollm/config.toml` (or the path given as argument),
//!    writing a starter file when none exists.
//! 2. Probes the configured endpoint and lists the models it serves.
//! 3. Runs the [`PollingScheduler`] against a [`SimVehicle`] and prints every
//!    command it publishes, until **Ctrl-C**.
//!
//! `aerollm --once` runs a single tick and exits.

mod config;
mod probe;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use aerollm_hal::{CommandSlot, CommandSource, PublishedCommand, SimVehicle};
use aerollm_runtime::PollingScheduler;
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// Parsed command-line arguments.
#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    once: bool,
    help: bool,
    config_path: Option<PathBuf>,
}

impl CliArgs {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, String> {
        let mut parsed = CliArgs::default();
        for arg in args {
            match arg.as_str() {
                "--once" => parsed.once = true,
                "-h" | "--help" => parsed.help = true,
                flag if flag.starts_with('-') => return Err(format!("unknown option {flag}")),
                path => {
                    if parsed.config_path.is_some() {
                        return Err("only one config path may be given".to_string());
                    }
                    parsed.config_path = Some(PathBuf::from(path));
                }
            }
        }
        Ok(parsed)
    }
}

fn main() -> ExitCode {
    let _telemetry = aerollm_runtime::init_tracing("aerollm");

    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}: {}", "Argument error".red(), e);
            print_usage();
            return ExitCode::from(2);
        }
    };
    if args.help {
        print_usage();
        return ExitCode::SUCCESS;
    }

    print_banner();
    let cfg = load_config(args.config_path.clone().unwrap_or_else(config::config_path));

    // ── Endpoint discovery ────────────────────────────────────────────────
    // Blocking client: must run before the Tokio runtime exists.
    print!("  Probing {} … ", cfg.base_url.dimmed());
    let _ = std::io::stdout().flush();
    let key = (!cfg.api_key.is_empty()).then_some(cfg.api_key.as_str());
    match probe::fetch_models(&cfg.base_url, key) {
        Ok(models) => {
            println!("{} ({} model(s) available)", "online".green(), models.len());
            if !models.is_empty() && !models.iter().any(|m| m == &cfg.model) {
                println!(
                    "  {} model {} is not listed by the endpoint",
                    "!".yellow().bold(),
                    cfg.model.bold()
                );
            }
        }
        Err(e) => {
            println!("{}", "offline".yellow());
            warn!(error = %e, "endpoint probe failed; starting anyway");
        }
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to build Tokio runtime");
            return ExitCode::FAILURE;
        }
    };

    if args.once {
        runtime.block_on(run_once(cfg))
    } else {
        runtime.block_on(run(cfg))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Modes
// ─────────────────────────────────────────────────────────────────────────────

fn build_scheduler(cfg: &config::Config, slot: CommandSlot) -> PollingScheduler {
    PollingScheduler::with_endpoint(
        cfg.scheduler_config(),
        cfg.endpoint(),
        Arc::new(SimVehicle::default()),
        slot,
    )
}

async fn run_once(cfg: config::Config) -> ExitCode {
    let slot = CommandSlot::new();
    let scheduler = build_scheduler(&cfg, slot.clone());
    match scheduler.tick().await {
        Ok(_) => {
            print_command(&slot.latest());
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("{}: {}", "Tick failed".red(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cfg: config::Config) -> ExitCode {
    let shutdown = CancellationToken::new();
    let on_ctrlc = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping control loop …".yellow().bold());
        on_ctrlc.cancel();
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; stop the process to exit");
    }

    let slot = CommandSlot::new();
    let mut scheduler = build_scheduler(&cfg, slot.clone());
    if let Err(e) = scheduler.start() {
        println!("{}: {}", "Cannot start".red(), e);
        return ExitCode::from(2);
    }
    println!(
        "  Polling {} every {} ms. Press {} to stop.\n",
        cfg.model.bold(),
        cfg.poll_interval_ms,
        "Ctrl-C".bold()
    );

    // ── Command printer ───────────────────────────────────────────────────
    let mut updates = slot.subscribe();
    let printer_stop = shutdown.clone();
    let printer = tokio::spawn(async move {
        loop {
            tokio::select! {
                () = printer_stop.cancelled() => break,
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let latest = *updates.borrow_and_update();
                    print_command(&latest);
                }
            }
        }
    });

    shutdown.cancelled().await;
    scheduler.shutdown().await;
    let _ = printer.await;

    let stats = scheduler.stats();
    println!(
        "  {} {} tick(s), {} command(s) applied, {} failed.",
        "✓".green().bold(),
        stats.ticks,
        stats.published,
        stats.failed
    );
    ExitCode::SUCCESS
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn load_config(path: PathBuf) -> config::Config {
    match config::load_from(&path) {
        Ok(Some(cfg)) => {
            println!("  Config loaded from {}", path.display().to_string().bold());
            cfg
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            match config::save_to(&cfg, &path) {
                Ok(()) => println!(
                    "  {} Starter config written to {}",
                    "✓".green().bold(),
                    path.display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    }
}

fn format_command(published: &PublishedCommand) -> String {
    let c = published.command;
    let source = match published.source {
        CommandSource::Initial => "initial",
        CommandSource::Model => "model",
        CommandSource::Manual => "manual",
    };
    format!(
        "#{:<4} {:<7} ail {:+.2}  ele {:+.2}  rud {:+.2}  thr {:.2}  abk {:.2}  whl {:.2}",
        published.sequence,
        source,
        c.aileron,
        c.elevator,
        c.rudder,
        c.throttle,
        c.airbrake,
        c.wheel_brakes
    )
}

fn print_command(published: &PublishedCommand) {
    println!(
        "  {} {}",
        chrono::Local::now().format("%H:%M:%S").to_string().dimmed(),
        format_command(published).cyan()
    );
}

fn print_banner() {
    println!();
    println!("  {} {}", "AeroLLM".bold().cyan(), format!("v{}", env!("CARGO_PKG_VERSION")).dimmed());
    println!("  Model-driven actuator polling loop");
    println!();
}

fn print_usage() {
    println!("Usage: aerollm [--once] [CONFIG_PATH]");
    println!();
    println!("  --once        run a single tick, print the command and exit");
    println!("  CONFIG_PATH   config file (default ~/.aerollm/config.toml)");
}

#[cfg(test)]
mod tests {
    use super::*;
    use aerollm_types::ActuatorCommand;

    fn args(list: &[&str]) -> Result<CliArgs, String> {
        CliArgs::parse(list.iter().map(|s| s.to_string()))
    }

    #[test]
    fn parses_no_arguments() {
        assert_eq!(args(&[]).unwrap(), CliArgs::default());
    }

    #[test]
    fn parses_once_and_path() {
        let parsed = args(&["--once", "/tmp/a.toml"]).unwrap();
        assert!(parsed.once);
        assert_eq!(parsed.config_path, Some(PathBuf::from("/tmp/a.toml")));
    }

    #[test]
    fn rejects_unknown_flag_and_second_path() {
        assert!(args(&["--fast"]).is_err());
        assert!(args(&["a.toml", "b.toml"]).is_err());
    }

    #[test]
    fn formats_command_with_signs() {
        let published = PublishedCommand {
            command: ActuatorCommand {
                aileron: -0.5,
                throttle: 0.75,
                ..ActuatorCommand::ZERO
            },
            source: CommandSource::Model,
            sequence: 3,
        };
        let line = format_command(&published);
        assert!(line.contains("model"));
        assert!(line.contains("ail -0.50"));
        assert!(line.contains("ele +0.00"));
        assert!(line.contains("thr 0.75"));
    }
}
