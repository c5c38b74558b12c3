//! Console commands for the local driver.

/// One line typed at the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `<session> <text>`: an inbound message for `session`.
    Message { session: String, text: String },
    /// `/agent <session>`: hand the session to a human agent.
    Agent { session: String },
    /// `/reset <session>`
    Reset { session: String },
    /// `/show <session>`: print the session snapshot.
    Show { session: String },
    /// A session command given without its session id.
    MissingSession { command: String },
    Quit,
}

impl Command {
    /// Parse a console line. Blank lines give `None`.
    pub fn parse(line: &str) -> Option<Command> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (head, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let command = match head {
            "/quit" | "/exit" => Command::Quit,
            "/agent" | "/reset" | "/show" if rest.is_empty() => Command::MissingSession {
                command: head.to_string(),
            },
            "/agent" => Command::Agent { session: rest.to_string() },
            "/reset" => Command::Reset { session: rest.to_string() },
            "/show" => Command::Show { session: rest.to_string() },
            session => Command::Message {
                session: session.to_string(),
                text: rest.to_string(),
            },
        };
        Some(command)
    }
}
