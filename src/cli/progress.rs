//! Progress reporting for long-running commands
//!
//! Adapts to the output context:
//! - TTY mode: animated progress bars
//! - Non-TTY mode: a start line and a finish line on stderr
//! - Robot mode: JSON progress events on stderr
//! - Quiet mode: nothing

use std::io::IsTerminal;
use std::time::Duration;

use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

// ============================================================================
// Progress Mode Detection
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Tty,
    NonTty,
    Robot,
    Quiet,
}

impl ProgressMode {
    /// Quiet wins over robot; otherwise a terminal on stderr selects TTY.
    #[must_use]
    pub fn detect(robot_mode: bool, quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if robot_mode {
            Self::Robot
        } else if std::io::stderr().is_terminal() {
            Self::Tty
        } else {
            Self::NonTty
        }
    }
}

// ============================================================================
// Progress Events (Robot Mode)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressEventType {
    ProgressStart,
    ProgressUpdate,
    ProgressComplete,
    ProgressError,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub event_type: &'static str,
    pub event: ProgressEventType,
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: String,
}

impl ProgressEvent {
    fn new(event: ProgressEventType, operation: &str) -> Self {
        Self {
            event_type: "progress",
            event,
            operation: operation.to_string(),
            current: None,
            total: None,
            message: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    fn with_progress(mut self, current: u64, total: u64) -> Self {
        self.current = Some(current);
        self.total = Some(total);
        self
    }

    fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }

    fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            eprintln!("{json}");
        }
    }
}

// ============================================================================
// Progress Reporter
// ============================================================================

pub struct ProgressReporter {
    mode: ProgressMode,
}

impl ProgressReporter {
    #[must_use]
    pub fn new(robot_mode: bool, quiet: bool) -> Self {
        Self {
            mode: ProgressMode::detect(robot_mode, quiet),
        }
    }

    #[must_use]
    pub const fn with_mode(mode: ProgressMode) -> Self {
        Self { mode }
    }

    #[must_use]
    pub const fn mode(&self) -> ProgressMode {
        self.mode
    }

    /// Progress bar over `total` steps.
    pub fn progress(&self, total: u64, msg: &str) -> ProgressHandle {
        match self.mode {
            ProgressMode::Quiet => ProgressHandle::Noop,

            ProgressMode::Robot => {
                ProgressEvent::new(ProgressEventType::ProgressStart, msg)
                    .with_progress(0, total)
                    .emit();
                ProgressHandle::Robot {
                    operation: msg.to_string(),
                    total,
                }
            }

            ProgressMode::NonTty => {
                eprintln!("[cvm] {msg} (0/{total})");
                ProgressHandle::NonTty
            }

            ProgressMode::Tty => {
                let pb = ProgressBar::new(total);
                if let Ok(style) = ProgressStyle::default_bar()
                    .template("{spinner:.cyan} {msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                {
                    pb.set_style(style.progress_chars("█▓▒░"));
                }
                pb.set_message(msg.to_string());
                pb.enable_steady_tick(Duration::from_millis(100));
                ProgressHandle::Tty(pb)
            }
        }
    }
}

// ============================================================================
// Progress Handle
// ============================================================================

pub enum ProgressHandle {
    Tty(ProgressBar),
    NonTty,
    Robot { operation: String, total: u64 },
    Noop,
}

impl ProgressHandle {
    pub fn set_position(&self, pos: u64) {
        match self {
            Self::Tty(pb) => pb.set_position(pos),
            Self::Robot { operation, total } => {
                ProgressEvent::new(ProgressEventType::ProgressUpdate, operation)
                    .with_progress(pos, *total)
                    .emit();
            }
            Self::NonTty | Self::Noop => {}
        }
    }

    pub fn finish_with_message(&self, msg: &str) {
        match self {
            Self::Tty(pb) => pb.finish_with_message(format!("✓ {msg}")),
            Self::Robot { operation, .. } => {
                ProgressEvent::new(ProgressEventType::ProgressComplete, operation)
                    .with_message(msg)
                    .emit();
            }
            Self::NonTty => eprintln!("[cvm] ✓ {msg}"),
            Self::Noop => {}
        }
    }

    pub fn abandon_with_message(&self, msg: &str) {
        match self {
            Self::Tty(pb) => pb.abandon_with_message(format!("✗ {msg}")),
            Self::Robot { operation, .. } => {
                ProgressEvent::new(ProgressEventType::ProgressError, operation)
                    .with_message(msg)
                    .emit();
            }
            Self::NonTty => eprintln!("[cvm] ✗ ERROR: {msg}"),
            Self::Noop => {}
        }
    }

    #[must_use]
    pub const fn is_noop(&self) -> bool {
        matches!(self, Self::Noop)
    }
}

// ============================================================================
// Tests
// ============================================================================
