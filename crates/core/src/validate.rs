//! Field validation accumulator.
//!
//! Validation reports every failing field at once rather than stopping at the
//! first problem.

use crate::{DomainError, DomainResult};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldErrors {
    messages: Vec<String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, msg: impl Into<String>) {
        self.messages.push(msg.into());
    }

    /// Record `msg` when `ok` is false.
    pub fn check(&mut self, ok: bool, msg: impl Into<String>) {
        if !ok {
            self.push(msg);
        }
    }

    /// Required, non-blank text field with an optional maximum length.
    pub fn require_text(&mut self, value: &str, required_msg: &str, max_len: Option<(usize, &str)>) {
        if value.trim().is_empty() {
            self.push(required_msg);
            return;
        }
        if let Some((max, msg)) = max_len {
            if value.chars().count() > max {
                self.push(msg);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn finish(self) -> DomainResult<()> {
        if self.messages.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Validation(self.messages))
        }
    }
}

/// Loose e-mail shape check: `local@domain.tld`, no whitespace.
pub fn is_valid_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty()
        && !host.starts_with('.')
        && (2..=6).contains(&tld.len())
        && tld.chars().all(|c| c.is_ascii_alphabetic())
}

/// `http://` or `https://` URL with a non-empty host.
pub fn is_valid_url(s: &str) -> bool {
    let rest = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            host.contains('.') && !s.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
