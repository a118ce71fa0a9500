//! Operator prompts
//!
//! Confirmation and free-form input go through the [`Prompter`] trait
//! so pipelines can be driven by a scripted fake in tests. The
//! terminal implementation blocks until the operator answers; end of
//! input falls back to the default answer (decline, for every
//! confirmation in this codebase).

use crate::Result;
use std::io::{BufRead, Write};

/// Interactive operator input
pub trait Prompter {
    /// Ask a yes/no question; empty input or EOF yields `default`
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool>;

    /// Read a line of free-form input, trimmed
    fn read_line(&mut self, prompt: &str) -> Result<String>;
}

/// Prompter backed by the controlling terminal
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, question: &str, default: bool) -> Result<bool> {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        print!("{question} {hint} ");
        std::io::stdout().flush()?;

        let mut answer = String::new();
        let read = std::io::stdin().lock().read_line(&mut answer)?;
        if read == 0 {
            return Ok(default);
        }

        Ok(match answer.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => true,
            "n" | "no" => false,
            _ => default,
        })
    }

    fn read_line(&mut self, prompt: &str) -> Result<String> {
        print!("{prompt}: ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}
