// src/resolve/reference.rs

//! `${identifier}` reference tokens and command classification.
//!
//! The same token syntax names a variable inside a command string and a task
//! when it stands alone as a command. [`Reference`] keeps the two apart.

use std::sync::LazyLock;

use regex::Regex;

/// Leading marker that puts a command or task into daemon mode.
pub const DAEMON_MARKER: char = '#';

/// Matches every reference token inside a string.
pub static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{[A-Za-z0-9_-]+\}").expect("reference token regex is valid")
});

/// A reference token, tagged by the context it appeared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    /// `${name}` inside a command or pattern string.
    Variable(&'a str),
    /// `${name}` standing alone as a command.
    Task(&'a str),
}

impl<'a> Reference<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Reference::Variable(name) | Reference::Task(name) => *name,
        }
    }
}

/// Iterate over the variable references in `input`, left to right, as
/// `(token, reference)` pairs.
pub fn variable_references(input: &str) -> impl Iterator<Item = (&str, Reference<'_>)> {
    REFERENCE_RE.find_iter(input).map(|m| {
        let token = m.as_str();
        (token, Reference::Variable(token_name(token)))
    })
}

/// If `input` is exactly one reference token, return the enclosed name.
pub fn extract_reference(input: &str) -> Option<&str> {
    let m = REFERENCE_RE.find(input)?;
    if m.start() == 0 && m.end() == input.len() {
        Some(token_name(m.as_str()))
    } else {
        None
    }
}

/// Split a leading daemon marker off `input`.
pub fn strip_daemon_marker(input: &str) -> (&str, bool) {
    match input.strip_prefix(DAEMON_MARKER) {
        Some(rest) => (rest, true),
        None => (input, false),
    }
}

fn token_name(token: &str) -> &str {
    &token[2..token.len() - 1]
}

/// One entry of a task's command list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// A bare `${task}` token: run that task.
    RunTask { name: &'a str, daemon: bool },
    /// A shell command line (variables not yet resolved).
    Shell { line: &'a str, daemon: bool },
}

impl<'a> Command<'a> {
    pub fn parse(raw: &'a str) -> Self {
        let (rest, daemon) = strip_daemon_marker(raw.trim());
        match extract_reference(rest) {
            Some(name) => Command::RunTask { name, daemon },
            None => Command::Shell { line: rest, daemon },
        }
    }

    /// The reference this command invokes, if it is a task invocation.
    pub fn task_reference(&self) -> Option<Reference<'a>> {
        match self {
            Command::RunTask { name, .. } => Some(Reference::Task(*name)),
            Command::Shell { .. } => None,
        }
    }
}
