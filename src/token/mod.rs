//! Authentication token acquisition
//!
//! A token comes from the configured environment variable when it is set,
//! otherwise from running the token command once (`scontrol token` prints
//! `SLURM_JWT=<token>`). Acquired once per process and read-only after.

use std::fmt;

use crate::config::TokenSettings;
use crate::submit::CommandRunner;

/// Opaque JWT. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token([REDACTED])")
    }
}

/// Where the token came from, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    Environment(String),
    Command(Vec<String>),
}

impl fmt::Display for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Environment(var) => write!(f, "${}", var),
            TokenSource::Command(argv) => write!(f, "`{}`", argv.join(" ")),
        }
    }
}

/// Token acquisition errors. All are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token command is empty")]
    EmptyCommand,

    #[error("failed to run token command `{command}`: {reason}")]
    Spawn { command: String, reason: String },

    #[error("token command failed with status {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },

    #[error("unexpected token command output (expected NAME=token)")]
    UnexpectedFormat,
}

/// Parse `NAME=token`; everything after the first `=` is the token.
pub fn parse_token_output(stdout: &str) -> Result<Token, TokenError> {
    let line = stdout.trim();
    match line.split_once('=') {
        Some((_, value)) if !value.is_empty() => Ok(Token::new(value)),
        _ => Err(TokenError::UnexpectedFormat),
    }
}

/// Acquire a token using the process environment.
pub fn acquire<R: CommandRunner>(settings: &TokenSettings, runner: &R) -> Result<(Token, TokenSource), TokenError> {
    acquire_with(settings, runner, |var| std::env::var(var).ok())
}

/// Acquire a token with an injected environment lookup.
pub fn acquire_with<R, F>(settings: &TokenSettings, runner: &R, lookup: F) -> Result<(Token, TokenSource), TokenError>
where
    R: CommandRunner,
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(&settings.env_var).filter(|v| !v.trim().is_empty()) {
        tracing::info!(var = %settings.env_var, "using token from environment");
        return Ok((
            Token::new(value.trim()),
            TokenSource::Environment(settings.env_var.clone()),
        ));
    }

    if settings.command.is_empty() {
        return Err(TokenError::EmptyCommand);
    }

    let output = runner.run(&settings.command).map_err(|e| TokenError::Spawn {
        command: settings.command.join(" "),
        reason: e.to_string(),
    })?;

    if !output.success() {
        return Err(TokenError::CommandFailed {
            status: output.status_label(),
            stderr: output.stderr.trim().to_string(),
        });
    }

    let token = parse_token_output(&output.stdout)?;
    tracing::info!(command = %settings.command.join(" "), "acquired token from command");
    Ok((token, TokenSource::Command(settings.command.clone())))
}
