// File: terminal.rs
// Location: /src/terminal.rs

use anyhow::{Result, anyhow, bail};
use log::{info, warn};
use std::cell::{Cell, RefCell};
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::config::{WifiConfig, WifiSecurity};
use crate::events::{DetailEvent, EventSink};
use crate::platform::DetailsHost;
use crate::qr;
use crate::screen::{DetailButton, PreferenceScreen};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Click(DetailButton),
    Answer(bool),
    Save(WifiConfig),
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  connect | forget | signin | share
  yes | no                     answer a pending question
  save <open|wep|wpa|sae> [password] [hidden]
  help | quit";

/// Parses one line typed by the user. `ssid` fills in the network name for
/// `save`.
pub fn parse_command(line: &str, ssid: &str) -> Result<Command> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        bail!("Empty command");
    };

    let command = match verb.to_lowercase().as_str() {
        "connect" | "c" => Command::Click(DetailButton::Connect),
        "forget" | "disconnect" | "f" => Command::Click(DetailButton::Forget),
        "signin" | "sign-in" => Command::Click(DetailButton::SignIn),
        "share" | "s" => Command::Click(DetailButton::Share),
        "yes" | "y" => Command::Answer(true),
        "no" | "n" => Command::Answer(false),
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        "save" => {
            let security = match words.next().map(str::to_lowercase).as_deref() {
                Some("open") => WifiSecurity::Open,
                Some("wep") => WifiSecurity::Wep,
                Some("wpa") => WifiSecurity::Wpa,
                Some("sae") => WifiSecurity::Sae,
                Some(other) => bail!("Unknown security type: {}", other),
                None => bail!("save needs a security type"),
            };
            let rest: Vec<&str> = words.collect();
            let (password, hidden) = match rest.as_slice() {
                [] => (String::new(), false),
                ["hidden"] if security == WifiSecurity::Open => (String::new(), true),
                [password] => (password.to_string(), false),
                [password, "hidden"] => (password.to_string(), true),
                _ => bail!("Too many arguments for save"),
            };
            Command::Save(WifiConfig {
                ssid: ssid.to_string(),
                password,
                security,
                hidden,
            })
        }
        other => return Err(anyhow!("Unknown command: {}", other)),
    };

    Ok(command)
}

/// Runs `command` against the screen. Returns `false` when the user quit.
pub fn handle_command(command: Command, host: &TerminalHost, sink: &EventSink) -> bool {
    match command {
        Command::Click(button) => sink.post(DetailEvent::ButtonClicked(button)),
        Command::Answer(accepted) => {
            if !host.answer(accepted) {
                println!("Nothing to answer");
            }
        }
        Command::Save(config) => sink.post(DetailEvent::SubmitConfig(config)),
        Command::Help => println!("{}", HELP),
        Command::Quit => return false,
    }
    true
}

/// Plain-text rendering of the visible parts of the screen.
pub fn render_screen(screen: &PreferenceScreen) -> String {
    let mut out = String::new();
    let header = &screen.header;
    let _ = writeln!(out, "{}", header.label);
    if !header.summary.is_empty() {
        let _ = writeln!(out, "{}", header.summary);
    }

    if screen.buttons.visible {
        let buttons: Vec<String> = screen
            .buttons
            .iter()
            .filter(|(_, b)| b.visible)
            .map(|(_, b)| {
                if b.enabled {
                    format!("[{}]", b.text)
                } else {
                    format!("({})", b.text)
                }
            })
            .collect();
        if !buttons.is_empty() {
            let _ = writeln!(out, "{}", buttons.join(" "));
        }
    }

    for row in screen.rows() {
        if !row.visible || row.key == screen.ipv6_addresses.key {
            continue;
        }
        let _ = writeln!(out, "  {}: {}", row.title, row.summary.as_deref().unwrap_or(""));
    }

    if screen.ipv6_category.visible && screen.ipv6_addresses.visible {
        let _ = writeln!(out, "{}", screen.ipv6_category.title);
        if let Some(addresses) = &screen.ipv6_addresses.summary {
            for address in addresses.lines() {
                let _ = writeln!(out, "  {}", address);
            }
        }
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Question {
    ForgetPasspoint,
    RevealPassword,
}

impl Question {
    fn event(self) -> DetailEvent {
        match self {
            Question::ForgetPasspoint => DetailEvent::ForgetConfirmed,
            Question::RevealPassword => DetailEvent::LockScreenPassed,
        }
    }
}

/// Hosts the detail screen in a terminal. Confirmations are answered with
/// `yes`/`no` on stdin; QR codes are printed and written as PNG.
pub struct TerminalHost {
    qr_output_dir: PathBuf,
    pending: RefCell<Option<(Question, EventSink)>>,
    finished: Cell<bool>,
    last_qr: RefCell<Option<PathBuf>>,
}

impl TerminalHost {
    pub fn new(qr_output_dir: PathBuf) -> Self {
        Self {
            qr_output_dir,
            pending: RefCell::new(None),
            finished: Cell::new(false),
            last_qr: RefCell::new(None),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished.get()
    }

    pub fn has_pending_question(&self) -> bool {
        self.pending.borrow().is_some()
    }

    pub fn last_qr_path(&self) -> Option<PathBuf> {
        self.last_qr.borrow().clone()
    }

    /// Answers the pending question. Returns `false` if nothing was asked.
    pub fn answer(&self, accepted: bool) -> bool {
        let Some((question, sink)) = self.pending.borrow_mut().take() else {
            return false;
        };
        if accepted {
            sink.post(question.event());
        } else {
            info!("{:?} declined", question);
        }
        true
    }

    fn ask(&self, question: Question, prompt: &str, sink: EventSink) {
        if self.pending.borrow_mut().replace((question, sink)).is_some() {
            warn!("Replacing unanswered question");
        }
        println!("{} [yes/no]", prompt);
    }
}

fn file_stem(ssid: &str) -> String {
    let stem: String = ssid
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() { "network".to_string() } else { stem }
}

impl DetailsHost for TerminalHost {
    fn finish(&self) {
        info!("Detail screen finished");
        self.finished.set(true);
    }

    fn show_toast(&self, message: &str) {
        info!("Toast: {}", message);
        println!("! {}", message);
    }

    fn confirm_forget_passpoint(&self, title: &str, sink: EventSink) {
        self.ask(
            Question::ForgetPasspoint,
            &format!("Forget {} and its subscription?", title),
            sink,
        );
    }

    fn show_lock_screen(&self, sink: EventSink) {
        self.ask(Question::RevealPassword, "Show the saved password?", sink);
    }

    fn show_share_qr(&self, ssid: &str, payload: &str) {
        let path = self.qr_output_dir.join(format!("{}.png", file_stem(ssid)));
        match qr::save_png(payload, &path) {
            Ok(()) => {
                info!("QR code written to {}", path.display());
                *self.last_qr.borrow_mut() = Some(path);
            }
            Err(e) => warn!("{:#}", e),
        }

        match qr::render_text(payload) {
            Ok(text) => println!("Scan to join {}\n{}", ssid, text),
            Err(e) => warn!("Failed to render QR code: {}", e),
        }
    }
}
