//! cvh-install - main entry point
//!
//! Parses the command line, sets up logging and signal handling, then hands
//! the terminal to the installation sequencer.

use cvh_install::cli::Cli;
use cvh_install::host::{DryRunHost, HostSystem, LiveHost};
use cvh_install::{process_guard, Console, InstallerOptions, Sequencer};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Log to the file only; the terminal belongs to the prompts.
fn init_logger(log_file: &Path) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match OpenOptions::new().create(true).append(true).open(log_file) {
        Ok(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .init(),
        Err(e) => {
            eprintln!(
                "warning: cannot open log file {}: {}; logging disabled",
                log_file.display(),
                e
            );
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::sink)
                .init();
        }
    }
}

fn main() {
    let cli = Cli::parse_args();
    let options = InstallerOptions::from_cli(&cli);

    init_logger(&options.log_file);
    info!("cvh-install {} starting", env!("CARGO_PKG_VERSION"));

    // Terminate running tools if we receive SIGINT/SIGTERM/SIGHUP
    if let Err(e) = process_guard::init_signal_handlers() {
        warn!("Failed to initialize signal handlers: {}", e);
    }
    debug!("Signal handlers initialized");

    let code = if options.dry_run {
        let mut host = DryRunHost::previewing();
        let code = install(&mut host, options);
        print_dry_run(&host);
        code
    } else {
        let mut host = LiveHost::new(&options.log_file);
        install(&mut host, options)
    };

    std::process::exit(code);
}

fn install(host: &mut dyn HostSystem, options: InstallerOptions) -> i32 {
    let mut sequencer = Sequencer::new(host, Console::stdio(), options);
    match sequencer.run() {
        Ok(()) => 0,
        Err(e) => {
            error!("Installation failed: {}", e);
            e.exit_code()
        }
    }
}

fn print_dry_run(host: &DryRunHost) {
    println!("\nDry run: {} command(s) recorded", host.commands().len());
    for line in host.command_lines() {
        println!("  $ {}", line);
    }
    let files: Vec<_> = host.written_files().collect();
    println!("Dry run: {} file(s) would be written", files.len());
    for path in files {
        println!("  {}", path.display());
    }
}
