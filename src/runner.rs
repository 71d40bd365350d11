//! Session runner
//!
//! Opens the link and supervises the two blocking flows: the receive loop and
//! the operator input forwarder. Both run on their own OS thread and report
//! back over a channel; the async side only waits for events and signals.

use std::io::{self, Read};
use std::sync::Arc;
use std::thread;

use tokio::sync::mpsc;
use uartlog_core::prelude::*;
use uartlog_core::Config;
use uartlog_link::{
    spawn_stdin_forwarder, ForwarderStats, Framer, GdbBacktrace, SerialLink, ToolAvailability,
};

use crate::session::{Session, SessionStats};
use crate::signals::shutdown_signal;

/// Events from the worker threads
#[derive(Debug)]
pub enum RunnerEvent {
    /// The receive loop returned; the link is closed or failed
    StreamEnded(Result<SessionStats>),
    /// Operator input reached EOF
    ForwarderStopped(ForwarderStats),
}

/// Startup lines printed before the first device line
pub fn banner(config: &Config) -> [String; 2] {
    [
        format!("Listening UART (8N1 {}) on {}", config.baud_rate, config.port),
        "You can type commands".to_string(),
    ]
}

/// Run until the link closes or a termination signal arrives
pub async fn run(config: Config) -> Result<()> {
    let config = Arc::new(config);

    if config.crash_capture_enabled() {
        let tools = ToolAvailability::check(&config);
        if tools.is_complete() {
            info!("Crash decoding tools found: {:?}", tools);
        } else {
            for warning in tools.warnings(&config) {
                warn!("{}", warning);
                eprintln!("WARNING: {}", warning);
            }
        }
    }

    let link = SerialLink::open(&config.port, config.baud_rate)
        .with_context(|| format!("Opening {}", config.port))?;
    let (reader, writer) = link.split().context("Splitting serial link")?;

    for line in banner(&config) {
        println!("{}", line);
    }

    let (tx, mut rx) = mpsc::channel::<RunnerEvent>(8);
    spawn_receive_loop(Arc::clone(&config), reader, tx.clone())?;

    let forwarder_tx = tx.clone();
    spawn_stdin_forwarder(writer, move |stats| {
        let _ = forwarder_tx.blocking_send(RunnerEvent::ForwarderStopped(stats));
    })?;
    drop(tx);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut listening = true;

    loop {
        tokio::select! {
            signal = &mut shutdown, if listening => match signal {
                Ok(name) => {
                    info!("{} received, stopping", name);
                    return Ok(());
                }
                Err(e) => {
                    error!("{}", e);
                    listening = false;
                }
            },
            event = rx.recv() => match event {
                Some(event) => {
                    if let Some(result) = handle_event(event) {
                        return result;
                    }
                }
                None => return Err(Error::ChannelClosed),
            },
        }
    }
}

/// `Some` when the event ends the run
fn handle_event(event: RunnerEvent) -> Option<Result<()>> {
    match event {
        RunnerEvent::StreamEnded(Ok(stats)) => {
            info!("Link closed after {} lines", stats.lines);
            Some(Ok(()))
        }
        RunnerEvent::StreamEnded(Err(e)) => {
            error!("Receive loop failed: {}", e);
            Some(Err(e))
        }
        RunnerEvent::ForwarderStopped(stats) => {
            info!(
                "Operator input closed ({} sent, {} failed); still receiving",
                stats.sent, stats.failed
            );
            None
        }
    }
}

/// Run the receive loop on a dedicated thread, writing to stdout
fn spawn_receive_loop<R>(
    config: Arc<Config>,
    reader: R,
    tx: mpsc::Sender<RunnerEvent>,
) -> Result<thread::JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    let handle = thread::Builder::new()
        .name("receive-loop".to_string())
        .spawn(move || {
            let tool = GdbBacktrace::from_config(&config);
            let mut session = Session::new(&config, tool, io::stdout().lock());
            let mut framer = Framer::new(reader);
            let result = session.run(&mut framer);
            let _ = tx.blocking_send(RunnerEvent::StreamEnded(result));
        })?;
    Ok(handle)
}
