//! Interactive input: `NAME [SCORE]` submissions and `/` commands.

/// A built-in command definition.
struct Command {
    name: &'static str,
    aliases: &'static [&'static str],
    description: &'static str,
    action: Action,
}

#[derive(Clone, Copy)]
enum Action {
    Help,
    Board,
    Quit,
}

impl From<Action> for Input {
    fn from(action: Action) -> Self {
        match action {
            Action::Help => Input::Help,
            Action::Board => Input::Board,
            Action::Quit => Input::Quit,
        }
    }
}

const COMMANDS: &[Command] = &[
    Command {
        name: "/help",
        aliases: &["/h", "/?"],
        description: "show this help",
        action: Action::Help,
    },
    Command {
        name: "/board",
        aliases: &["/b"],
        description: "refresh and show the leaderboard",
        action: Action::Board,
    },
    Command {
        name: "/quit",
        aliases: &["/exit", "/q"],
        description: "leave",
        action: Action::Quit,
    },
];

/// One parsed line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Help,
    Board,
    Quit,
    Unknown(String),
    /// `score` is `None` when the line carried no trailing number.
    Submit { name: String, score: Option<i64> },
}

pub fn parse(line: &str) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Empty;
    }
    if line == "quit" || line == "exit" {
        return Input::Quit;
    }
    if line.starts_with('/') {
        let word = line.split_whitespace().next().unwrap_or(line);
        return COMMANDS
            .iter()
            .find(|c| c.name == word || c.aliases.contains(&word))
            .map(|c| c.action.into())
            .unwrap_or_else(|| Input::Unknown(word.to_string()));
    }

    if let Some(quoted) = parse_quoted(line) {
        return quoted;
    }

    match line.rsplit_once(char::is_whitespace) {
        Some((name, last)) => match last.parse::<i64>() {
            Ok(score) => Input::Submit {
                name: name.trim().to_string(),
                score: Some(score),
            },
            Err(_) => Input::Submit {
                name: line.to_string(),
                score: None,
            },
        },
        None => match line.parse::<i64>() {
            Ok(score) => Input::Submit {
                name: String::new(),
                score: Some(score),
            },
            Err(_) => Input::Submit {
                name: line.to_string(),
                score: None,
            },
        },
    }
}

/// `"NAME" [SCORE]`. Quotes keep a trailing number in the name.
fn parse_quoted(line: &str) -> Option<Input> {
    let (name, rest) = line.strip_prefix('"')?.split_once('"')?;
    let rest = rest.trim();
    let score = if rest.is_empty() {
        None
    } else {
        Some(rest.parse::<i64>().ok()?)
    };
    Some(Input::Submit {
        name: name.trim().to_string(),
        score,
    })
}

/// Help text listing the input format and every command.
pub fn help() -> String {
    let mut out = String::from(
        "  NAME [SCORE]   submit a score (0-100, defaults to the form's score)\n\
         \x20 \"NAME\" [SCORE] quote names that end in a number, e.g. \"Jugador 1\" 80\n",
    );
    for cmd in COMMANDS {
        let names = std::iter::once(cmd.name)
            .chain(cmd.aliases.iter().copied())
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!("  {:<14} {}\n", names, cmd.description));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submit(name: &str, score: Option<i64>) -> Input {
        Input::Submit {
            name: name.to_string(),
            score,
        }
    }

    #[test]
    fn blank_line_is_empty() {
        assert_eq!(parse("   "), Input::Empty);
    }

    #[test]
    fn name_and_score() {
        assert_eq!(parse("Ana 87"), submit("Ana", Some(87)));
        assert_eq!(parse("  Marc Gasol   80 "), submit("Marc Gasol", Some(80)));
    }

    #[test]
    fn negative_and_large_scores_are_kept_raw() {
        assert_eq!(parse("Ana -10"), submit("Ana", Some(-10)));
        assert_eq!(parse("Ana 150"), submit("Ana", Some(150)));
    }

    #[test]
    fn name_without_score() {
        assert_eq!(parse("Marc Gasol"), submit("Marc Gasol", None));
        assert_eq!(parse("Ana"), submit("Ana", None));
    }

    #[test]
    fn trailing_number_is_read_as_score() {
        assert_eq!(parse("Jugador 1"), submit("Jugador", Some(1)));
    }

    #[test]
    fn quoted_name_keeps_trailing_number() {
        assert_eq!(parse("\"Jugador 1\""), submit("Jugador 1", None));
        assert_eq!(parse("\"Jugador 1\" 80"), submit("Jugador 1", Some(80)));
        assert_eq!(parse("  \" Jugador 1 \"   -5 "), submit("Jugador 1", Some(-5)));
    }

    #[test]
    fn quoted_name_with_trailing_text_falls_back() {
        assert_eq!(parse("\"Ana\" Pérez"), submit("\"Ana\" Pérez", None));
        assert_eq!(parse("\"Ana"), submit("\"Ana", None));
    }

    #[test]
    fn help_mentions_quoting() {
        assert!(help().contains("\"Jugador 1\" 80"));
    }

    #[test]
    fn score_without_name() {
        assert_eq!(parse("87"), submit("", Some(87)));
    }

    #[test]
    fn commands_and_aliases() {
        assert_eq!(parse("/help"), Input::Help);
        assert_eq!(parse("/?"), Input::Help);
        assert_eq!(parse("/b"), Input::Board);
        assert_eq!(parse("/exit"), Input::Quit);
        assert_eq!(parse("quit"), Input::Quit);
    }

    #[test]
    fn unknown_command() {
        assert_eq!(parse("/dance now"), Input::Unknown("/dance".to_string()));
    }

    #[test]
    fn help_lists_every_command() {
        let text = help();
        for cmd in COMMANDS {
            assert!(text.contains(cmd.name));
            assert!(text.contains(cmd.description));
        }
    }
}
