//! uartlog - live firmware log viewer for a serial link
//!
//! This is the binary entry point. All logic lives in the library.

use clap::Parser;
use color_eyre::Result;
use uartlog::Args;
use uartlog_core::{logging, Error};
use uartlog_link::available_port_names;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    let cwd = std::env::current_dir()?;
    let result = match args.load_settings(&cwd) {
        Ok(settings) => {
            let config = args.into_config(settings);
            let _log_guard = match logging::init(&config) {
                Ok(guard) => Some(guard),
                Err(e) => {
                    eprintln!("WARNING: file logging disabled: {}", e);
                    None
                }
            };
            uartlog::run(config).await
        }
        Err(e) => Err(e),
    };

    match result {
        Err(e) if e.is_fatal() => {
            eprintln!("{}", e);
            if matches!(e, Error::SerialOpen { .. }) {
                print_available_ports();
            }
            std::process::exit(1);
        }
        result => Ok(result?),
    }
}

fn print_available_ports() {
    let ports = available_port_names();
    if ports.is_empty() {
        eprintln!("No serial ports found.");
    } else {
        eprintln!("Available ports:");
        for port in ports {
            eprintln!("  {}", port);
        }
    }
}
