use std::path::PathBuf;

pub const HELP: &str = "\
Commands:
/attach <path>       - Attach a CSV or XLSX file to the next message
/history             - Show the conversation so far
/models              - List available models and their limits
/model <id>          - Switch model
/temperature <t>     - Set temperature (0.0 - 1.0)
/budget              - Show token usage against the context window
/exit                - Exit the session
/?                   - Display this help message
//text               - Send a message that starts with \"/\"";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Message(String),
    Attach(PathBuf),
    History,
    Models,
    Model(String),
    Temperature(f32),
    Budget,
    Help,
    Exit,
    /// Nothing was typed; ask again
    AskAgain,
}

/// Parse one line of user input. Errors carry a usage hint.
///
/// Messages are passed on exactly as typed. A leading `//` sends the rest of the line,
/// with a single `/`, as a message.
pub fn parse(input: &str) -> Result<Command, String> {
    let line = input.trim();
    if line.is_empty() {
        return Ok(Command::AskAgain);
    }
    if line.eq_ignore_ascii_case("exit") {
        return Ok(Command::Exit);
    }
    if line.starts_with("//") {
        return Ok(Command::Message(input.replacen("//", "/", 1)));
    }
    if !line.starts_with('/') {
        return Ok(Command::Message(input.to_string()));
    }

    let (name, argument) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    match (name.to_lowercase().as_str(), argument) {
        ("/exit" | "/quit", _) => Ok(Command::Exit),
        ("/?" | "/help", _) => Ok(Command::Help),
        ("/history", _) => Ok(Command::History),
        ("/models", _) => Ok(Command::Models),
        ("/budget", _) => Ok(Command::Budget),
        ("/attach", "") => Err("usage: /attach <path>".to_string()),
        ("/attach", path) => Ok(Command::Attach(PathBuf::from(path))),
        ("/model", "") => Err("usage: /model <id>".to_string()),
        ("/model", id) => Ok(Command::Model(id.to_string())),
        ("/temperature", value) => value
            .parse::<f32>()
            .map(Command::Temperature)
            .map_err(|_| "usage: /temperature <0.0 - 1.0>".to_string()),
        (other, _) => Err(format!(
            "Unknown command {}. Type /? for help, or start with // to send it as a message.",
            other
        )),
    }
}
