//! Operator selection
//!
//! The exporter asks two questions: which environment, and which domain. Both go
//! through [`SelectionProvider`], which is given a labeled list and returns the
//! key of one entry. [`TerminalSelector`] prompts with a numbered menu,
//! [`PresetSelector`] answers from a command-line flag.

use std::io::{BufRead, Write};
use tracing::debug;

/// Selection errors
#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    /// Nothing to choose from
    #[error("no options to choose from for '{0}'")]
    NoOptions(String),

    /// Preset answer matches no option
    #[error("'{answer}' is not a valid choice for '{prompt}'")]
    NoMatch {
        /// Question being answered
        prompt: String,
        /// The preset answer
        answer: String,
    },

    /// Input ended before a valid choice was made
    #[error("input closed before a choice was made for '{0}'")]
    InputClosed(String),

    /// Terminal IO failure
    #[error("IO error: {0}")]
    IoError(String),
}

/// Result type for selection operations
pub type SelectionResult<T> = Result<T, SelectionError>;

/// One entry of a selection menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOption {
    /// Text shown to the operator
    pub label: String,
    /// Value returned when chosen
    pub key: String,
}

impl SelectionOption {
    /// Create an option
    pub fn new(label: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            key: key.into(),
        }
    }
}

/// Capability to pick one entry from a labeled list
pub trait SelectionProvider {
    /// Return the key of the chosen option
    fn select(&mut self, prompt: &str, options: &[SelectionOption]) -> SelectionResult<String>;
}

/// Numbered menu on a line-oriented terminal
///
/// Invalid input is reported and the menu prompt repeated until a valid number
/// is entered or input ends.
pub struct TerminalSelector<R, W> {
    input: R,
    output: W,
}

impl TerminalSelector<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Selector bound to the process's stdin and stdout
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalSelector<R, W> {
    /// Selector over arbitrary input and output streams
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the output stream
    pub fn into_output(self) -> W {
        self.output
    }

    fn show_menu(&mut self, prompt: &str, options: &[SelectionOption]) -> std::io::Result<()> {
        writeln!(self.output, "\n{prompt}:")?;
        for (i, option) in options.iter().enumerate() {
            writeln!(self.output, "  {}. {}", i + 1, option.label)?;
        }
        Ok(())
    }
}

impl<R: BufRead, W: Write> SelectionProvider for TerminalSelector<R, W> {
    fn select(&mut self, prompt: &str, options: &[SelectionOption]) -> SelectionResult<String> {
        if options.is_empty() {
            return Err(SelectionError::NoOptions(prompt.to_string()));
        }

        let io_err = |e: std::io::Error| SelectionError::IoError(e.to_string());
        self.show_menu(prompt, options).map_err(io_err)?;

        loop {
            write!(self.output, "Enter choice [1-{}]: ", options.len()).map_err(io_err)?;
            self.output.flush().map_err(io_err)?;

            let mut line = String::new();
            if self.input.read_line(&mut line).map_err(io_err)? == 0 {
                return Err(SelectionError::InputClosed(prompt.to_string()));
            }

            match line.trim().parse::<usize>() {
                Ok(n) if (1..=options.len()).contains(&n) => {
                    let chosen = &options[n - 1];
                    debug!("Selected '{}' for '{}'", chosen.key, prompt);
                    return Ok(chosen.key.clone());
                }
                _ => {
                    writeln!(self.output, "Invalid choice '{}'", line.trim()).map_err(io_err)?;
                }
            }
        }
    }
}

/// Fixed answer, matched against option keys and labels (case-insensitive)
#[derive(Debug, Clone)]
pub struct PresetSelector {
    answer: String,
}

impl PresetSelector {
    /// Selector that always answers `answer`
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }
}

impl SelectionProvider for PresetSelector {
    fn select(&mut self, prompt: &str, options: &[SelectionOption]) -> SelectionResult<String> {
        if options.is_empty() {
            return Err(SelectionError::NoOptions(prompt.to_string()));
        }

        let wanted = self.answer.trim();
        options
            .iter()
            .find(|o| o.key == wanted)
            .or_else(|| {
                options.iter().find(|o| {
                    o.key.eq_ignore_ascii_case(wanted) || o.label.eq_ignore_ascii_case(wanted)
                })
            })
            .map(|o| o.key.clone())
            .ok_or_else(|| SelectionError::NoMatch {
                prompt: prompt.to_string(),
                answer: self.answer.clone(),
            })
    }
}
