use crate::{Notification, Notifier};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

const APP_NAME: &str = "tunedrop";

/// Shells out to whichever notification helper the platform provides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandNotifier {
    /// `terminal-notifier` (macOS); the only one that can open a link on click.
    TerminalNotifier { path: PathBuf },
    /// `osascript -e 'display notification ...'` (macOS).
    Osascript { path: PathBuf },
    /// `notify-send` (freedesktop.org desktops).
    NotifySend { path: PathBuf },
}
impl CommandNotifier {
    /// Search `PATH` for a supported helper, preferring the richest one.
    pub fn discover() -> Option<Self> {
        if cfg!(target_os = "macos") {
            if let Ok(path) = which::which("terminal-notifier") {
                return Some(Self::TerminalNotifier { path });
            }
            if let Ok(path) = which::which("osascript") {
                return Some(Self::Osascript { path });
            }
        }
        if cfg!(unix)
            && let Ok(path) = which::which("notify-send")
        {
            return Some(Self::NotifySend { path });
        }
        None
    }

    fn command(&self, notification: &Notification) -> Command {
        match self {
            Self::TerminalNotifier { path } => {
                let mut cmd = Command::new(path);
                cmd.args(["-title", notification.title.as_str(), "-message", notification.body.as_str()]);
                if !notification.link.is_empty() {
                    cmd.args(["-open", notification.link.as_str()]);
                }
                cmd
            },
            Self::Osascript { path } => {
                let script = format!(
                    "display notification {} with title {}",
                    applescript_string(&notification.body),
                    applescript_string(&notification.title)
                );
                let mut cmd = Command::new(path);
                cmd.args(["-e", script.as_str()]);
                cmd
            },
            Self::NotifySend { path } => {
                let mut cmd = Command::new(path);
                cmd.arg(format!("--app-name={APP_NAME}")).arg(&notification.title).arg(&notification.body);
                cmd
            },
        }
    }
}

/// Quote `value` as an AppleScript string literal.
fn applescript_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[async_trait]
impl Notifier for CommandNotifier {
    fn name(&self) -> &str {
        match self {
            Self::TerminalNotifier { .. } => "terminal-notifier",
            Self::Osascript { .. } => "osascript",
            Self::NotifySend { .. } => "notify-send",
        }
    }

    async fn notify(&self, notification: &Notification) {
        let mut cmd = self.command(notification);
        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());
        // Not waited on: Tokio reaps the child in the background once the
        // handle is dropped.
        match cmd.spawn() {
            Ok(_child) => tracing::trace!(backend = self.name(), title = %notification.title, "Notification sent"),
            Err(e) => tracing::debug!(backend = self.name(), error = %e, "Could not send notification"),
        }
    }
}
