use anyhow::Result;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
};
use std::io::{self, Write};
use thea_core::ApplicationContext;
use thea_intent::{IntentRecognitionResult, ModelStatus};

/// Color scheme for terminal output.
struct Colors;

impl Colors {
    const PROMPT: Color = Color::Green;
    const RESULT: Color = Color::Cyan;
    const STATUS: Color = Color::Yellow;
    const ERROR: Color = Color::Red;
    const DIM: Color = Color::DarkGrey;
    const HEADER: Color = Color::Magenta;
}

/// Terminal I/O for the REPL. Results go to stdout, status to stderr.
pub struct Terminal;

impl Terminal {
    pub fn new() -> Self {
        Self
    }

    /// Print the startup banner.
    pub fn print_banner(&self, profile: &str, provider: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::HEADER),
            Print("thea"),
            ResetColor,
            Print(" - intent recognition\n"),
            SetForegroundColor(Colors::DIM),
            Print(format!("Profile: {} | Embeddings: {}\n", profile, provider)),
            Print("Type an utterance, ':help' for commands, ':quit' to exit.\n"),
            Print("---\n"),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    /// Read a trimmed line. `None` on end of input.
    pub fn read_input(&self, context: &ApplicationContext) -> Result<Option<String>> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            Print("\n"),
            SetForegroundColor(Colors::PROMPT),
            Print(format!("{}> ", prompt_label(context))),
            ResetColor,
        )?;
        stdout.flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(None);
        }
        Ok(Some(input.trim().to_string()))
    }

    pub fn print_result(&self, result: &IntentRecognitionResult) -> Result<()> {
        let json = serde_json::to_string_pretty(result)?;
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::RESULT),
            Print(format!("{}\n", json)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }

    pub fn print_status(&self, status: &ModelStatus) -> Result<()> {
        let mut stderr = io::stderr();
        execute!(
            stderr,
            SetForegroundColor(Colors::STATUS),
            Print(format!("[model {:>3}%] {}\n", status.percent(), status)),
            ResetColor,
        )?;
        stderr.flush()?;
        Ok(())
    }

    /// Print an error message.
    pub fn print_error(&self, msg: &str) -> Result<()> {
        let mut stderr = io::stderr();
        execute!(
            stderr,
            SetForegroundColor(Colors::ERROR),
            Print(format!("Error: {}\n", msg)),
            ResetColor,
        )?;
        stderr.flush()?;
        Ok(())
    }

    /// Print an info message.
    pub fn print_info(&self, msg: &str) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(
            stdout,
            SetForegroundColor(Colors::DIM),
            Print(format!("{}\n", msg)),
            ResetColor,
        )?;
        stdout.flush()?;
        Ok(())
    }
}

fn prompt_label(context: &ApplicationContext) -> String {
    let mut label = context.current_view.to_string();
    if let Some(patient) = &context.current_patient {
        label.push_str(&format!(" [{}]", patient.id));
    }
    if let Some(record) = &context.current_record_id {
        label.push_str(&format!(" #{}", record));
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use thea_core::{PatientRef, View};

    #[test]
    fn prompt_shows_view_patient_and_record() {
        assert_eq!(prompt_label(&ApplicationContext::default()), "landing");

        let context = ApplicationContext::new(View::Summary)
            .with_patient(PatientRef::new("p-1"))
            .with_record("r-9");
        assert_eq!(prompt_label(&context), "summary [p-1] #r-9");
    }
}
