//! Terminal operator: prompts on stdin, stage spinners on stderr

use cidflash_core::{Operator, Stage};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::time::Duration;

/// Whether an answer counts as affirmative
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Final spinner line for a stage
fn stage_summary(stage: Stage, ok: bool) -> String {
    if ok {
        format!("{}... done", stage)
    } else {
        format!("{}... failed", stage)
    }
}

/// Operator reading answers from stdin
///
/// `assume_yes` answers every confirmation affirmatively; a preset CID is
/// used instead of prompting for one.
pub struct TerminalOperator {
    assume_yes: bool,
    preset_cid: Option<String>,
    spinner: Option<ProgressBar>,
}

impl TerminalOperator {
    pub fn new(assume_yes: bool, preset_cid: Option<String>) -> Self {
        Self {
            assume_yes,
            preset_cid,
            spinner: None,
        }
    }

    fn prompt(&self, text: &str) -> Option<String> {
        print!("{}", text);
        io::stdout().flush().ok()?;

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()),
        }
    }
}

impl Operator for TerminalOperator {
    fn confirm(&mut self, question: &str) -> bool {
        if self.assume_yes {
            println!("{} (y/n): y", question);
            return true;
        }
        self.prompt(&format!("{} (y/n): ", question))
            .is_some_and(|answer| is_affirmative(&answer))
    }

    fn request_cid(&mut self) -> Option<String> {
        if let Some(cid) = self.preset_cid.take() {
            return Some(cid);
        }
        self.prompt("Enter the new CID (32 hexadecimal characters): ")
            .filter(|s| !s.is_empty())
    }

    fn begin(&mut self, stage: Stage) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(stage.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        self.spinner = Some(spinner);
    }

    fn end(&mut self, stage: Stage, ok: bool) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(stage_summary(stage, ok));
        }
    }
}
