//! Submission command line assembly

use crate::config::SubmitSettings;

/// The fixed prefix of every submission: tool, begin-time directive,
/// wrapped command, then site flags. Caller parameters go last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitCommand {
    pub tool: String,
    pub begin: String,
    pub wrap: String,
    pub extra_flags: String,
}

impl SubmitCommand {
    pub fn from_settings(settings: &SubmitSettings) -> Self {
        Self {
            tool: settings.tool.clone(),
            begin: settings.begin.clone(),
            wrap: settings.wrap.clone(),
            extra_flags: settings.extra_flags.clone(),
        }
    }

    /// Render the full command line as one string. `params` is appended
    /// verbatim; quoting inside it is the caller's job.
    pub fn command_line(&self, params: &str) -> String {
        [
            self.tool.as_str(),
            self.begin.as_str(),
            self.wrap.as_str(),
            self.extra_flags.as_str(),
            params,
        ]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Tokenize the command line with shell word rules.
    pub fn argv(&self, params: &str) -> Result<Vec<String>, String> {
        let line = self.command_line(params);
        split_command_line(&line)
    }
}

/// Split a line into words the way a POSIX shell would, without expansion.
pub fn split_command_line(line: &str) -> Result<Vec<String>, String> {
    match shlex::split(line) {
        Some(words) if !words.is_empty() => Ok(words),
        Some(_) => Err("empty command line".to_string()),
        None => Err(format!("unbalanced quoting in command line: {}", line)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> SubmitCommand {
        SubmitCommand {
            tool: "sbatch".to_string(),
            begin: "--begin=\"now+1second\"".to_string(),
            wrap: "--wrap=\"sleep 1\"".to_string(),
            extra_flags: " -A root ".to_string(),
        }
    }

    #[test]
    fn test_command_line_order() {
        assert_eq!(
            command().command_line("-p general"),
            "sbatch --begin=\"now+1second\" --wrap=\"sleep 1\" -A root -p general"
        );
    }

    #[test]
    fn test_blank_params() {
        assert_eq!(
            command().command_line(""),
            "sbatch --begin=\"now+1second\" --wrap=\"sleep 1\" -A root"
        );
    }

    #[test]
    fn test_argv_tokenization() {
        let argv = command().argv("-p general --comment='two words'").unwrap();
        assert_eq!(
            argv,
            vec![
                "sbatch",
                "--begin=now+1second",
                "--wrap=sleep 1",
                "-A",
                "root",
                "-p",
                "general",
                "--comment=two words",
            ]
        );
    }

    #[test]
    fn test_unbalanced_quote() {
        let err = command().argv("--comment='oops").unwrap_err();
        assert!(err.contains("unbalanced"));
    }

    #[test]
    fn test_empty_extra_flags() {
        let mut cmd = command();
        cmd.extra_flags = String::new();
        assert_eq!(
            cmd.command_line("-p debug"),
            "sbatch --begin=\"now+1second\" --wrap=\"sleep 1\" -p debug"
        );
    }
}
