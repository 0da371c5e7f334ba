use std::fmt;

use thiserror::Error;

use crate::lang::string::CreationSite;

/// Class of a user-visible exception raised while evaluating operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FrozenError,
    TypeError,
    ArgumentError,
    RegexpError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::FrozenError => "FrozenError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ArgumentError => "ArgumentError",
            ErrorKind::RegexpError => "RegexpError",
        };
        write!(f, "{}", name)
    }
}

/// An exception the running program can observe and rescue.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}{}", render_call_stack(.call_stack))]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    pub call_stack: Vec<String>,
}

fn render_call_stack(call_stack: &[String]) -> String {
    let mut out = String::new();
    if !call_stack.is_empty() {
        out.push_str("\n  call stack:");
        for (i, frame) in call_stack.iter().rev().enumerate() {
            out.push_str(&format!("\n    {}: {}", i, frame));
        }
    }
    out
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, msg: &str) -> Self {
        RuntimeError {
            kind,
            message: msg.to_string(),
            call_stack: Vec::new(),
        }
    }

    pub fn frozen(type_name: &str, inspected: &str, site: Option<&CreationSite>) -> Self {
        let mut message = format!("can't modify frozen {}: {:?}", type_name, inspected);
        if let Some(site) = site {
            message.push_str(&format!(", created at {}", site));
        }
        RuntimeError::new(ErrorKind::FrozenError, &message)
    }

    pub fn type_error(expected: &str, got: &str) -> Self {
        RuntimeError::new(
            ErrorKind::TypeError,
            &format!("{} is not a {}", got, expected),
        )
    }

    pub fn regexp(msg: &str) -> Self {
        RuntimeError::new(ErrorKind::RegexpError, msg)
    }

    pub fn argument(msg: &str) -> Self {
        RuntimeError::new(ErrorKind::ArgumentError, msg)
    }

    pub fn with_context(mut self, context: &str) -> Self {
        self.call_stack.push(context.to_string());
        self
    }
}
