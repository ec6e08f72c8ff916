use thea_core::View;

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Recognize(String),
    View(View),
    Patient(Option<String>),
    Record(Option<String>),
    Reload { debug: bool },
    Unload,
    Status,
    Config,
    Help,
    Quit,
}

pub const HELP: &str = "\
Commands:
  :view <view>           switch view (landing, patients, summary, timeline,
                         records, medications, settings, assistant)
  :patient <id>|none     select or clear the patient
  :record <id>|none      open or close a record
  :reload [debug]        reload the model, optionally with batch tracing
  :unload                release the model
  :status                show model status
  :config                show the active configuration (no secrets)
  :quit                  exit
Anything else is recognised as an utterance.";

impl Command {
    /// Parse a trimmed, non-empty input line.
    pub fn parse(line: &str) -> Result<Self, String> {
        let Some(rest) = line.strip_prefix(':') else {
            return match line {
                "exit" | "quit" => Ok(Command::Quit),
                _ => Ok(Command::Recognize(line.to_string())),
            };
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let arg = parts.next();

        match (name, arg) {
            ("view", Some(view)) => view.parse().map(Command::View).map_err(|e| e.to_string()),
            ("view", None) => Err("usage: :view <view>".to_string()),
            ("patient", Some(id)) => Ok(Command::Patient(optional_id(id))),
            ("patient", None) => Err("usage: :patient <id>|none".to_string()),
            ("record", Some(id)) => Ok(Command::Record(optional_id(id))),
            ("record", None) => Err("usage: :record <id>|none".to_string()),
            ("reload", None) => Ok(Command::Reload { debug: false }),
            ("reload", Some("debug")) => Ok(Command::Reload { debug: true }),
            ("reload", Some(other)) => Err(format!("unknown reload option '{other}'")),
            ("unload", _) => Ok(Command::Unload),
            ("status", _) => Ok(Command::Status),
            ("config", _) => Ok(Command::Config),
            ("help", _) | ("h", _) => Ok(Command::Help),
            ("quit", _) | ("q", _) | ("exit", _) => Ok(Command::Quit),
            (other, _) => Err(format!("unknown command ':{other}' (try :help)")),
        }
    }
}

fn optional_id(id: &str) -> Option<String> {
    if id.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(id.to_string())
    }
}
