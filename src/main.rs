// File: main.rs
// Location: /src/main.rs

use anyhow::{Context, Result, anyhow};
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use wifi_details::config;
use wifi_details::controller::{Collaborators, WifiDetailController};
use wifi_details::events;
use wifi_details::nm::{self, NmBackend};
use wifi_details::platform::SignalIcons;
use wifi_details::terminal::{self, TerminalHost};

fn setup_logging() {
    let log_path = std::env::var("HOME")
        .map(|home| std::path::PathBuf::from(home).join(".local/share/wifi-details"))
        .unwrap_or_else(|_| std::path::PathBuf::from("/tmp"));

    let _ = std::fs::create_dir_all(&log_path);
    let log_file_path = log_path.join("wifi-details.log");

    env_logger::Builder::from_default_env()
        .format(move |buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path)
    {
        let now = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let _ = writeln!(file, "\n[{}] [INFO] ========== Wi-Fi Details Started ==========", now);
        let _ = writeln!(file, "[{}] [DEBUG] Log file: {:?}", now, log_file_path);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    setup_logging();

    let ssid = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: wifi-details <SSID>"))?;
    let settings = config::load_settings_or_default(&config::settings_path());
    log::info!("Showing details for {}", ssid);

    let initial = nm::poll_state(&ssid, settings.interface.as_deref())
        .await
        .with_context(|| format!("Failed to read state of {}", ssid))?;

    let backend = Rc::new(NmBackend::new(&ssid, &settings, initial));
    let host = Rc::new(TerminalHost::new(settings.qr_output_dir.clone()));
    let (sink, mut event_rx) = events::channel();

    let mut controller = WifiDetailController::new(
        Collaborators {
            entry: backend.clone(),
            connectivity: backend.clone(),
            wifi_manager: backend.clone(),
            host: host.clone(),
            icons: Box::new(SignalIcons),
        },
        sink.clone(),
    );
    controller.start();

    let (state_tx, mut state_rx) = mpsc::unbounded_channel();
    tokio::spawn(nm::watch(
        backend.ssid().to_string(),
        settings.interface.clone(),
        Duration::from_millis(settings.poll_interval_ms),
        state_tx,
    ));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut rendered = terminal::render_screen(controller.screen());
    println!("{}\n{}", rendered, terminal::HELP);

    loop {
        tokio::select! {
            Some(event) = event_rx.recv() => events::dispatch(event, &mut controller),
            Some(state) = state_rx.recv() => backend.apply(state),
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match terminal::parse_command(&line, backend.ssid()) {
                    Ok(command) => {
                        if !terminal::handle_command(command, &host, &sink) {
                            break;
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }
        }

        if host.is_finished() {
            break;
        }

        let screen = terminal::render_screen(controller.screen());
        if screen != rendered {
            println!("{}", screen);
            rendered = screen;
        }
    }

    controller.stop();
    log::info!("Exiting");
    Ok(())
}
