//! Reply to one AT line: informational lines, then exactly one status line.

use super::error::CommandError;
use std::fmt;

/// Terminal line of a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    info: Vec<String>,
    status: Status,
}

impl Reply {
    pub fn ok() -> Self {
        Self {
            info: Vec::new(),
            status: Status::Ok,
        }
    }

    pub fn ok_with(info: Vec<String>) -> Self {
        Self {
            info,
            status: Status::Ok,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            info: Vec::new(),
            status: Status::Error(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    pub fn info(&self) -> &[String] {
        &self.info
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Rendered status line: `OK` or `ERROR: ...`
    pub fn status_line(&self) -> String {
        match &self.status {
            Status::Ok => "OK".to_string(),
            Status::Error(message) => format!("ERROR: {message}"),
        }
    }

    /// Every line of the reply, status last
    pub fn lines(&self) -> Vec<String> {
        let mut lines = self.info.clone();
        lines.push(self.status_line());
        lines
    }
}

impl From<&CommandError> for Reply {
    fn from(err: &CommandError) -> Self {
        Reply::error(err.to_string())
    }
}

impl From<CommandError> for Reply {
    fn from(err: CommandError) -> Self {
        Reply::from(&err)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.info {
            writeln!(f, "{line}")?;
        }
        write!(f, "{}", self.status_line())
    }
}
