//! Operating-system actions.
//!
//! Everything the assistant does to the host machine goes through
//! [`OsActions::run_os_action`]. [`SystemOs`] shells out to the usual
//! per-platform tools (`xdg-open`, `pactl`, `playerctl`, `brightnessctl`,
//! `systemctl` on Linux; `open`, `osascript`, `pbpaste` on macOS; `cmd`,
//! `taskkill`, `powershell` on Windows).

use crate::error::{ArjunError, Result};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default timeout for spawned helpers.
const COMMAND_TIMEOUT_SECS: u64 = 15;

/// Brightness change per step, in percent.
pub const BRIGHTNESS_STEP: u8 = 10;

/// One host-level action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OsAction {
    OpenUrl(String),
    /// Launch an application by path.
    Launch(String),
    /// Open a file with its default handler.
    OpenPath(PathBuf),
    Kill { process_name: String },
    VolumeUp,
    VolumeDown,
    MediaPlayPause,
    MediaNext,
    MediaPrev,
    /// Returns the new level as text.
    BrightnessUp,
    /// Returns the new level as text.
    BrightnessDown,
    Shutdown,
    Restart,
    /// Returns a one-line CPU/RAM summary.
    SystemStatus,
    /// Returns the clipboard text (possibly empty).
    ReadClipboard,
}

/// Host action capability.
pub trait OsActions: Send + Sync {
    /// Perform `action`. Query-like actions return their text.
    ///
    /// # Errors
    ///
    /// Returns [`ArjunError::Os`] when the action is unsupported or the
    /// helper fails.
    fn run_os_action(&self, action: &OsAction) -> Result<Option<String>>;
}

/// [`OsActions`] backed by the platform's command-line tools.
pub struct SystemOs {
    timeout_secs: u64,
}

impl Default for SystemOs {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemOs {
    #[must_use]
    pub fn new() -> Self {
        Self {
            timeout_secs: COMMAND_TIMEOUT_SECS,
        }
    }

    /// Run a command with timeout, returning stdout.
    fn run_command(&self, program: &str, args: &[&str]) -> Result<String> {
        let timeout = Duration::from_secs(self.timeout_secs);
        let start = Instant::now();
        debug!(program, ?args, "running os helper");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ArjunError::Os(format!("failed to spawn {program}: {e}")))?;

        // Pipes are drained while polling; a full pipe would stall the helper.
        let stdout_reader = child.stdout.take().map(drain);
        let stderr_reader = child.stderr.take().map(drain);

        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    let stdout = collect(stdout_reader);
                    let stderr = collect(stderr_reader);
                    if !status.success() {
                        let code = status.code().unwrap_or(-1);
                        let output = if stderr.is_empty() { stdout } else { stderr };
                        return Err(ArjunError::Os(format!(
                            "{program} exited with code {code}: {}",
                            output.trim()
                        )));
                    }
                    return Ok(stdout);
                }
                Ok(None) => {
                    if start.elapsed() > timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(ArjunError::Os(format!(
                            "{program} timed out after {}s",
                            self.timeout_secs
                        )));
                    }
                    std::thread::sleep(Duration::from_millis(50));
                }
                Err(e) => {
                    return Err(ArjunError::Os(format!("failed to wait for {program}: {e}")));
                }
            }
        }
    }

    /// Start a detached process without waiting for it.
    fn spawn_detached(program: &str, args: &[&str]) -> Result<()> {
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|child| {
                reap(child);
            })
            .map_err(|e| ArjunError::Os(format!("failed to spawn {program}: {e}")))
    }

    fn open(target: &str) -> Result<()> {
        if cfg!(target_os = "windows") {
            Self::spawn_detached("cmd", &["/C", "start", "", target])
        } else if cfg!(target_os = "macos") {
            Self::spawn_detached("open", &[target])
        } else {
            Self::spawn_detached("xdg-open", &[target])
        }
    }

    fn kill(&self, process_name: &str) -> Result<()> {
        if cfg!(target_os = "windows") {
            self.run_command("taskkill", &["/IM", process_name, "/F"])?;
        } else {
            let name = process_name.strip_suffix(".exe").unwrap_or(process_name);
            self.run_command("pkill", &["-x", name])?;
        }
        Ok(())
    }

    fn volume(&self, up: bool) -> Result<()> {
        if cfg!(target_os = "macos") {
            let script = if up {
                "set volume output volume ((output volume of (get volume settings)) + 10)"
            } else {
                "set volume output volume ((output volume of (get volume settings)) - 10)"
            };
            self.run_command("osascript", &["-e", script])?;
        } else if cfg!(target_os = "windows") {
            // Five key presses, matching one hardware volume step each.
            let key = if up { "[char]175" } else { "[char]174" };
            let script = format!(
                "$w = New-Object -ComObject WScript.Shell; 1..5 | % {{ $w.SendKeys({key}) }}"
            );
            self.run_command("powershell", &["-NoProfile", "-Command", &script])?;
        } else {
            let delta = if up { "+10%" } else { "-10%" };
            self.run_command("pactl", &["--", "set-sink-volume", "@DEFAULT_SINK@", delta])?;
        }
        Ok(())
    }

    fn media(&self, command: &str) -> Result<()> {
        if cfg!(target_os = "linux") {
            self.run_command("playerctl", &[command])?;
            Ok(())
        } else {
            Err(ArjunError::Os(format!(
                "media control '{command}' is not supported on this platform"
            )))
        }
    }

    fn brightness(&self, up: bool) -> Result<String> {
        if !cfg!(target_os = "linux") {
            return Err(ArjunError::Os(
                "brightness control is not supported on this platform".to_owned(),
            ));
        }
        let delta = if up {
            format!("+{BRIGHTNESS_STEP}%")
        } else {
            format!("{BRIGHTNESS_STEP}%-")
        };
        self.run_command("brightnessctl", &["--quiet", "set", &delta])?;
        let machine = self.run_command("brightnessctl", &["-m"])?;
        parse_brightnessctl_percent(&machine)
            .map(|p| p.to_string())
            .ok_or_else(|| ArjunError::Os("unable to read brightness level".to_owned()))
    }

    fn power(&self, restart: bool) -> Result<()> {
        if cfg!(target_os = "windows") {
            let flag = if restart { "/r" } else { "/s" };
            self.run_command("shutdown", &[flag, "/t", "1"])?;
        } else if cfg!(target_os = "macos") {
            let verb = if restart { "restart" } else { "shut down" };
            let script = format!("tell application \"System Events\" to {verb}");
            self.run_command("osascript", &["-e", &script])?;
        } else {
            let verb = if restart { "reboot" } else { "poweroff" };
            self.run_command("systemctl", &[verb])?;
        }
        Ok(())
    }

    fn system_status() -> Result<String> {
        if !cfg!(target_os = "linux") {
            return Err(ArjunError::Os(
                "system status is not supported on this platform".to_owned(),
            ));
        }
        let first = std::fs::read_to_string("/proc/stat")?;
        std::thread::sleep(Duration::from_millis(200));
        let second = std::fs::read_to_string("/proc/stat")?;
        let meminfo = std::fs::read_to_string("/proc/meminfo")?;

        let cpu = match (parse_cpu_times(&first), parse_cpu_times(&second)) {
            (Some(a), Some(b)) => cpu_percent(a, b),
            _ => return Err(ArjunError::Os("unable to parse /proc/stat".to_owned())),
        };
        let ram = parse_ram_percent(&meminfo)
            .ok_or_else(|| ArjunError::Os("unable to parse /proc/meminfo".to_owned()))?;
        Ok(format!(
            "System is at {cpu:.1} percent CPU usage and {ram:.1} percent RAM usage."
        ))
    }

    fn clipboard(&self) -> Result<String> {
        if cfg!(target_os = "windows") {
            self.run_command("powershell", &["-NoProfile", "-Command", "Get-Clipboard"])
        } else if cfg!(target_os = "macos") {
            self.run_command("pbpaste", &[])
        } else if std::env::var_os("WAYLAND_DISPLAY").is_some() {
            self.run_command("wl-paste", &["--no-newline"])
        } else {
            self.run_command("xclip", &["-selection", "clipboard", "-o"])
        }
    }
}

impl OsActions for SystemOs {
    fn run_os_action(&self, action: &OsAction) -> Result<Option<String>> {
        match action {
            OsAction::OpenUrl(url) => Self::open(url).map(|()| None),
            OsAction::Launch(path) => Self::open(path).map(|()| None),
            OsAction::OpenPath(path) => Self::open(&path.to_string_lossy()).map(|()| None),
            OsAction::Kill { process_name } => self.kill(process_name).map(|()| None),
            OsAction::VolumeUp => self.volume(true).map(|()| None),
            OsAction::VolumeDown => self.volume(false).map(|()| None),
            OsAction::MediaPlayPause => self.media("play-pause").map(|()| None),
            OsAction::MediaNext => self.media("next").map(|()| None),
            OsAction::MediaPrev => self.media("previous").map(|()| None),
            OsAction::BrightnessUp => self.brightness(true).map(Some),
            OsAction::BrightnessDown => self.brightness(false).map(Some),
            OsAction::Shutdown => self.power(false).map(|()| None),
            OsAction::Restart => self.power(true).map(|()| None),
            OsAction::SystemStatus => Self::system_status().map(Some),
            OsAction::ReadClipboard => self.clipboard().map(Some),
        }
    }
}

/// Percent column of `brightnessctl -m` (`device,class,current,42%,max`).
fn parse_brightnessctl_percent(output: &str) -> Option<u8> {
    let line = output.lines().next()?;
    let field = line.split(',').nth(3)?;
    field.trim().trim_end_matches('%').parse().ok()
}

/// `(busy, total)` jiffies from the aggregate `cpu` line.
fn parse_cpu_times(stat: &str) -> Option<(u64, u64)> {
    let line = stat.lines().find(|l| l.starts_with("cpu "))?;
    let values: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|v| v.parse().ok())
        .collect();
    if values.len() < 4 {
        return None;
    }
    let total: u64 = values.iter().sum();
    // idle + iowait
    let idle = values[3] + values.get(4).copied().unwrap_or(0);
    Some((total - idle, total))
}

fn cpu_percent(first: (u64, u64), second: (u64, u64)) -> f64 {
    let busy = second.0.saturating_sub(first.0) as f64;
    let total = second.1.saturating_sub(first.1) as f64;
    if total <= 0.0 {
        0.0
    } else {
        busy / total * 100.0
    }
}

fn parse_ram_percent(meminfo: &str) -> Option<f64> {
    let field = |name: &str| -> Option<f64> {
        meminfo
            .lines()
            .find(|l| l.starts_with(name))?
            .split_whitespace()
            .nth(1)?
            .parse()
            .ok()
    };
    let total = field("MemTotal:")?;
    let available = field("MemAvailable:")?;
    if total <= 0.0 {
        return None;
    }
    Some((total - available) / total * 100.0)
}

/// Read a child pipe to the end on its own thread.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut buf = String::new();
        let _ = pipe.read_to_string(&mut buf);
        buf
    })
}

fn collect(reader: Option<JoinHandle<String>>) -> String {
    reader.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Wait for a detached child in the background so it never lingers as a zombie.
fn reap(mut child: Child) -> JoinHandle<std::io::Result<ExitStatus>> {
    std::thread::spawn(move || child.wait())
}
