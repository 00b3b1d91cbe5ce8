//! Commands read from the console while the server runs.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Unsupported(String),
}

/// Parses one console line. `q`, `quit` and `exit` stop the server, in any case.
///
/// ```
/// # use rawhttp::cli::{Command, parse_command};
/// assert_eq!(parse_command(" QUIT\n"), Command::Quit);
/// assert_eq!(parse_command("status"), Command::Unsupported("status".into()));
/// ```
pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if ["q", "quit", "exit"].iter().any(|cmd| line.eq_ignore_ascii_case(cmd)) {
        Command::Quit
    } else {
        Command::Unsupported(line.to_string())
    }
}
