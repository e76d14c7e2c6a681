//! Robot-mode response envelope and human layout helpers.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde::Serialize;

use crate::error::{CvmError, ErrorCode, Result, StructuredError};

#[derive(Serialize)]
pub struct RobotResponse<T> {
    pub status: RobotStatus,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub data: T,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl<T> RobotResponse<T> {
    #[must_use]
    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotStatus {
    Ok,
    #[serde(rename = "error")]
    StructuredError {
        code: ErrorCode,
        numeric_code: u16,
        message: String,
        suggestion: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        context: Option<serde_json::Value>,
        recoverable: bool,
        category: String,
    },
    /// Some items succeeded and some were skipped
    Partial { completed: usize, failed: usize },
}

impl From<StructuredError> for RobotStatus {
    fn from(err: StructuredError) -> Self {
        Self::StructuredError {
            code: err.code,
            numeric_code: err.numeric_code,
            message: err.message,
            suggestion: err.suggestion,
            context: err.context,
            recoverable: err.recoverable,
            category: err.category,
        }
    }
}

fn envelope<T>(status: RobotStatus, data: T) -> RobotResponse<T> {
    RobotResponse {
        status,
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        data,
        warnings: Vec::new(),
    }
}

pub fn robot_ok<T: Serialize>(data: T) -> RobotResponse<T> {
    envelope(RobotStatus::Ok, data)
}

pub fn robot_partial<T: Serialize>(data: T, completed: usize, failed: usize) -> RobotResponse<T> {
    envelope(RobotStatus::Partial { completed, failed }, data)
}

/// Error envelope carrying the error code, suggestion and context.
pub fn robot_error(err: &CvmError) -> RobotResponse<serde_json::Value> {
    envelope(err.to_structured().into(), serde_json::Value::Null)
}

pub fn emit_robot<T: Serialize>(response: &RobotResponse<T>) -> Result<()> {
    emit_json(response)
}

pub fn emit_json<T: Serialize>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value)
        .map_err(|err| CvmError::Serialization(format!("serialize output: {err}")))?;
    write_stdout(&payload)
}

/// Write one line to stdout. A reader that hung up (`cvm ... | head`) is not
/// an error.
pub fn write_stdout(payload: &str) -> Result<()> {
    write_line(&mut io::stdout().lock(), payload)
}

fn write_line(out: &mut impl Write, payload: &str) -> Result<()> {
    match writeln!(out, "{payload}").and_then(|()| out.flush()) {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other.map_err(CvmError::from),
    }
}

pub struct HumanLayout {
    lines: Vec<String>,
    key_width: usize,
}

impl Default for HumanLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl HumanLayout {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: Vec::new(),
            key_width: 18,
        }
    }

    pub fn title(&mut self, text: &str) -> &mut Self {
        self.lines.push(text.bold().to_string());
        self.lines.push(String::new());
        self
    }

    pub fn section(&mut self, text: &str) -> &mut Self {
        self.lines.push(text.bold().to_string());
        self.lines.push("-".repeat(text.chars().count().max(3)));
        self
    }

    pub fn kv(&mut self, key: &str, value: &str) -> &mut Self {
        let padded = format!("{key:width$}", width = self.key_width);
        self.lines.push(format!("{} {value}", padded.dimmed()));
        self
    }

    /// Wrapped paragraph, indented by two spaces.
    pub fn paragraph(&mut self, text: &str, width: usize) -> &mut Self {
        let options = textwrap::Options::new(width)
            .initial_indent("  ")
            .subsequent_indent("  ");
        for line in textwrap::wrap(text, options) {
            self.lines.push(line.into_owned());
        }
        self
    }

    pub fn bullet(&mut self, text: &str) -> &mut Self {
        self.lines.push(format!("- {text}"));
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    pub fn push_line(&mut self, line: impl Into<String>) -> &mut Self {
        self.lines.push(line.into());
        self
    }

    #[must_use]
    pub fn build(self) -> String {
        self.lines.join("\n")
    }
}

pub fn emit_human(layout: HumanLayout) -> Result<()> {
    write_stdout(&layout.build())
}

/// Color a similarity score: green above 0.5, yellow above 0.2, red otherwise.
#[must_use]
pub fn colored_score(score: f32) -> String {
    let text = format!("{score:.4}");
    if score > 0.5 {
        text.green().to_string()
    } else if score > 0.2 {
        text.yellow().to_string()
    } else {
        text.red().to_string()
    }
}
