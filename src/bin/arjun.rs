//! Text-mode front end for the assistant.
//!
//! Lines typed on stdin are the "heard" utterances. Two control lines mimic
//! the UI buttons: `:sleep` toggles sleep and `:mode <friendly|jarvis>`
//! requests a persona switch. Assistant output and UI events go to stdout,
//! diagnostics to a daily log file under the data root.

use arjun::app_dirs;
use arjun::config::ArjunConfig;
use arjun::integrations::HttpIntegrations;
use arjun::knowledge::WikipediaSource;
use arjun::llm::ApiCompletion;
use arjun::personality::Persona;
use arjun::platform::SystemOs;
use arjun::reminders::TokioReminders;
use arjun::router::{Assistant, Capabilities};
use arjun::ui::{AssistantHandle, UiMessage, UiReceiver, control_channel, status_channel};
use arjun::voice::{ConsoleVoice, Speaker};
use crossbeam_channel::Sender;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    if let Err(e) = run() {
        eprintln!("arjun failed: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let config_path = match args.get(1).map(String::as_str) {
        None => app_dirs::config_file(),
        Some("--config") => match args.get(2) {
            Some(path) => PathBuf::from(path),
            None => anyhow::bail!("--config requires a path"),
        },
        Some("help" | "--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(other) => anyhow::bail!("unknown argument `{other}` (use --config <path>)"),
    };

    let config = ArjunConfig::load_or_default(&config_path)?;
    let _log_guard = init_tracing(&config.storage.root_dir);
    tracing::info!(config = %config_path.display(), "starting arjun");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let (ui_tx, ui_rx) = status_channel();
    let (handle, inbox) = control_channel();
    let (line_tx, line_rx) = crossbeam_channel::unbounded();

    let voice = Arc::new(ConsoleVoice::new(
        line_rx,
        Duration::from_secs(config.conversation.listen_timeout_s),
    ));
    let speaker = Speaker::new(voice, ui_tx.clone(), config.conversation.default_persona);

    let cancel = CancellationToken::new();
    let reminders = Arc::new(TokioReminders::new(
        runtime.handle().clone(),
        speaker.clone(),
        cancel.clone(),
    ));
    let caps = Capabilities {
        completion: Arc::new(ApiCompletion::new(&config.llm)),
        os: Arc::new(SystemOs::new()),
        knowledge: Arc::new(WikipediaSource::new(&config.knowledge)),
        integrations: Arc::new(HttpIntegrations::new(&config.integrations)),
        reminders: reminders.clone(),
    };

    std::thread::Builder::new()
        .name("arjun-stdin".to_owned())
        .spawn(move || read_stdin(&line_tx, &handle))?;
    let ui_thread = std::thread::Builder::new()
        .name("arjun-ui".to_owned())
        .spawn(move || render_ui(&ui_rx))?;

    let mut assistant = Assistant::new(config, speaker, ui_tx, inbox, caps);
    assistant.run();

    reminders.cancel_all();
    let _ = ui_thread.join();
    runtime.shutdown_timeout(Duration::from_secs(1));
    Ok(())
}

/// Daily-rolling file logging; the guard flushes buffered lines on drop.
fn init_tracing(root: &Path) -> WorkerGuard {
    let log_dir = app_dirs::logs_dir(root);
    let _ = std::fs::create_dir_all(&log_dir);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("arjun=info"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "arjun.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .ok();
    guard
}

/// Forward stdin lines to the voice channel; control lines go to the handle.
fn read_stdin(lines: &Sender<String>, handle: &AssistantHandle) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let trimmed = line.trim();
        if trimmed == ":sleep" {
            handle.toggle_sleep();
            continue;
        }
        if let Some(name) = trimmed.strip_prefix(":mode ") {
            match name.trim().parse::<Persona>() {
                Ok(persona) => handle.set_persona(persona),
                Err(e) => eprintln!("{e}"),
            }
            continue;
        }
        if lines.send(line).is_err() {
            return;
        }
    }
    // EOF ends the session the same way the spoken quit phrase does.
    let _ = lines.send("exit".to_owned());
}

fn render_ui(rx: &UiReceiver) {
    loop {
        let Some(message) = rx.recv_timeout(Duration::from_millis(200)) else {
            continue;
        };
        match message {
            UiMessage::Quit => {
                println!("[ui] closing");
                return;
            }
            UiMessage::Status(text) => println!("[status] {text}"),
            other => println!("[ui] {other}"),
        }
    }
}

fn print_usage() {
    println!("arjun - voice assistant (text mode)");
    println!();
    println!("Usage:");
    println!("  arjun [--config <path>]");
    println!();
    println!("Type utterances on stdin. `:sleep` toggles sleep, `:mode jarvis` switches persona.");
}
