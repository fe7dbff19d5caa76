//! Operator commands read from stdin, one per line.

use console_core::Msg;
use console_engine::Method;

pub const HELP_TEXT: &str = "\
Commands:
  stage <key>             switch stage tab (ingest, ocr, operator_a, operator_b, match, review, approve, export)
  doc <id>                select a document for the active stage
  jump <stage> <id>       follow a progress-table link
  set <field> <value...>  edit a stage field (\\n inserts a line break)
  submit                  run the active stage for the selected document
  refresh                 re-read stage details from the last snapshot
  reload                  fetch progress again
  shell <METHOD> <path>   route a request through the offline shell cache
  help                    show this text
  quit                    exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Dispatch(Msg),
    Shell { method: Method, path: String },
    Help,
    Quit,
    /// Recognised command with unusable arguments, or an unknown command.
    Invalid(String),
}

/// Parses one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (word, rest) = split_word(line);

    let command = match word {
        "stage" => match single_arg(rest) {
            Some(key) => Command::Dispatch(Msg::StageSelected(key.to_string())),
            None => Command::Invalid("usage: stage <key>".into()),
        },
        "doc" => match single_arg(rest) {
            Some(id) => Command::Dispatch(Msg::DocumentSelected(id.to_string())),
            None => Command::Invalid("usage: doc <id>".into()),
        },
        "jump" => {
            let (stage, id) = split_word(rest);
            match (stage, single_arg(id)) {
                ("", _) | (_, None) => Command::Invalid("usage: jump <stage> <id>".into()),
                (stage, Some(id)) => Command::Dispatch(Msg::RowLinkClicked {
                    stage: stage.to_string(),
                    document_id: id.to_string(),
                }),
            }
        }
        "set" => {
            let (name, value) = split_word(rest);
            if name.is_empty() {
                Command::Invalid("usage: set <field> <value...>".into())
            } else {
                Command::Dispatch(Msg::FieldChanged {
                    name: name.to_string(),
                    value: value.replace("\\n", "\n"),
                })
            }
        }
        "submit" => Command::Dispatch(Msg::SubmitClicked),
        "refresh" => Command::Dispatch(Msg::RefreshDetailsClicked),
        "reload" => Command::Dispatch(Msg::ReloadClicked),
        "shell" => parse_shell(rest),
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Invalid(format!("unknown command: {other}")),
    };
    Some(command)
}

fn parse_shell(rest: &str) -> Command {
    let (method, path) = split_word(rest);
    let Some(path) = single_arg(path) else {
        return Command::Invalid("usage: shell <METHOD> <path>".into());
    };
    match Method::from_bytes(method.to_ascii_uppercase().as_bytes()) {
        Ok(method) => Command::Shell {
            method,
            path: path.to_string(),
        },
        Err(_) => Command::Invalid(format!("invalid method: {method}")),
    }
}

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(at) => (&input[..at], input[at..].trim_start()),
        None => (input, ""),
    }
}

fn single_arg(input: &str) -> Option<&str> {
    let (word, rest) = split_word(input);
    (!word.is_empty() && rest.is_empty()).then_some(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dispatched(line: &str) -> Msg {
        match parse_command(line) {
            Some(Command::Dispatch(msg)) => msg,
            other => panic!("expected a message for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn blank_lines_are_ignored() {
        assert_eq!(parse_command("   "), None);
    }

    #[test]
    fn navigation_commands_map_to_messages() {
        assert_eq!(dispatched("stage review"), Msg::StageSelected("review".into()));
        assert_eq!(dispatched("doc 42"), Msg::DocumentSelected("42".into()));
        assert_eq!(
            dispatched("jump  approve   7"),
            Msg::RowLinkClicked {
                stage: "approve".into(),
                document_id: "7".into()
            }
        );
        assert_eq!(dispatched("reload"), Msg::ReloadClicked);
        assert_eq!(dispatched("refresh"), Msg::RefreshDetailsClicked);
        assert_eq!(dispatched("submit"), Msg::SubmitClicked);
    }

    #[test]
    fn unknown_stage_keys_are_left_to_the_core() {
        assert_eq!(dispatched("stage bogus"), Msg::StageSelected("bogus".into()));
    }

    #[test]
    fn set_keeps_the_rest_of_the_line() {
        assert_eq!(
            dispatched("set summary Looks good,  ship it\\nthanks"),
            Msg::FieldChanged {
                name: "summary".into(),
                value: "Looks good,  ship it\nthanks".into()
            }
        );
        assert_eq!(
            dispatched("set status"),
            Msg::FieldChanged {
                name: "status".into(),
                value: String::new()
            }
        );
    }

    #[test]
    fn shell_parses_method_case_insensitively() {
        assert_eq!(
            parse_command("shell get /app/index.html"),
            Some(Command::Shell {
                method: Method::GET,
                path: "/app/index.html".into()
            })
        );
        assert!(matches!(
            parse_command("shell GET"),
            Some(Command::Invalid(_))
        ));
    }

    #[test]
    fn missing_arguments_and_unknown_words_are_invalid() {
        assert!(matches!(parse_command("doc"), Some(Command::Invalid(_))));
        assert!(matches!(parse_command("jump review"), Some(Command::Invalid(_))));
        assert!(matches!(parse_command("stage a b"), Some(Command::Invalid(_))));
        assert_eq!(
            parse_command("launch"),
            Some(Command::Invalid("unknown command: launch".into()))
        );
        assert_eq!(parse_command("quit"), Some(Command::Quit));
        assert_eq!(parse_command("help"), Some(Command::Help));
    }
}
