//! Line-oriented interactive shell.
//!
//! The shell keeps one [`VotingClient`] alive for the whole run, so the
//! session phase and bound vote forms survive between commands even on
//! backends that cannot report their phase.

use lvote_session::{ClientError, View, VotingClient};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

pub const HELP: &str = "\
commands:
  status                      show the current view
  refresh                     re-read participants, balance and options
  register <address> <name>   register a participant
  add-option <name>           add a voting option
  open <budget>               open a session, crediting everyone <budget> tokens
  close                       close the session and show the winner
  vote <option> <weight>      vote for an option by name
  vote-at <n> <weight>        vote for option number <n> as listed by status
  winner                      show the ledger's last winner
  help                        this text
  quit                        leave the shell";

/// One parsed shell line. Missing arguments become empty strings and are
/// left for the client to reject.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShellCommand {
    Status,
    Refresh,
    Register { address: String, name: String },
    AddOption(String),
    Open(String),
    Close,
    Vote { option: String, weight: String },
    VoteAt { index: usize, weight: String },
    Winner,
    Help,
    Quit,
}

/// Parse one input line. Blank lines parse to `None`.
pub fn parse_line(line: &str) -> Result<Option<ShellCommand>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, args)) = words.split_first() else {
        return Ok(None);
    };
    let rest = |from: usize| args.get(from..).map(|a| a.join(" ")).unwrap_or_default();
    let arg = |i: usize| args.get(i).map(|s| s.to_string()).unwrap_or_default();

    let command = match head.to_ascii_lowercase().as_str() {
        "status" | "show" => ShellCommand::Status,
        "refresh" => ShellCommand::Refresh,
        "register" => ShellCommand::Register {
            address: arg(0),
            name: rest(1),
        },
        "add-option" => ShellCommand::AddOption(rest(0)),
        "open" => ShellCommand::Open(rest(0)),
        "close" => ShellCommand::Close,
        "vote" => match args.split_last() {
            Some((weight, option)) if !option.is_empty() => ShellCommand::Vote {
                option: option.join(" "),
                weight: weight.to_string(),
            },
            _ => ShellCommand::Vote {
                option: rest(0),
                weight: String::new(),
            },
        },
        "vote-at" => {
            let index = args
                .first()
                .ok_or("usage: vote-at <n> <weight>")?
                .parse::<usize>()
                .map_err(|_| "option number must be a positive integer".to_string())?;
            ShellCommand::VoteAt {
                index,
                weight: rest(1),
            }
        }
        "winner" => ShellCommand::Winner,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("unknown command {other:?}, try `help`")),
    };
    Ok(Some(command))
}

/// Run one command against the client. Returns text to print instead of
/// the view, if the command produces any.
pub async fn execute(client: &VotingClient, command: ShellCommand) -> Result<Option<String>, ClientError> {
    match command {
        ShellCommand::Status | ShellCommand::Quit => Ok(None),
        ShellCommand::Help => Ok(Some(HELP.to_string())),
        ShellCommand::Refresh => client.refresh_all().await.map(|_| None),
        ShellCommand::Register { address, name } => {
            client.register_participant(&address, &name).await.map(|_| None)
        }
        ShellCommand::AddOption(name) => client.add_option(&name).await.map(|_| None),
        ShellCommand::Open(budget) => client.open_session(budget.as_str()).await.map(|_| None),
        ShellCommand::Close => client.close_session().await.map(|_| None),
        ShellCommand::Vote { option, weight } => {
            client.cast_vote(&option, weight.as_str()).await.map(|_| None)
        }
        ShellCommand::VoteAt { index, weight } => {
            let forms = client.view().vote_forms;
            let Some(form) = index.checked_sub(1).and_then(|i| forms.get(i)) else {
                return Err(ClientError::OptionNotFound(format!("#{index}")));
            };
            client
                .cast_vote_with_form(form, weight.as_str())
                .await
                .map(|_| None)
        }
        ShellCommand::Winner => client.read_last_winner().await.map(Some),
    }
}

pub fn render_view(view: &View) -> String {
    let mut out = String::new();
    let onoff = |enabled: bool| if enabled { "enabled" } else { "disabled" };

    out.push_str(&format!("Session: {}", view.phase));
    if let Some(budget) = view.budget {
        out.push_str(&format!(" (budget {budget})"));
    }
    out.push_str(&format!(
        "\n[open: {}] [close: {}]\n",
        onoff(view.open_enabled),
        onoff(view.close_enabled)
    ));
    out.push_str(&format!("Participants: {}\n", view.participants));
    match &view.options {
        Some(_) if !view.vote_forms.is_empty() => {
            out.push_str("Options:\n");
            for (i, form) in view.vote_forms.iter().enumerate() {
                out.push_str(&format!("  {}. {}\n", i + 1, form.option_name()));
            }
        }
        Some(text) => out.push_str(&format!("Options: {text}\n")),
        None => {}
    }
    if let Some(balance) = &view.balance {
        out.push_str(balance);
        out.push('\n');
    }
    if let Some(winner) = &view.last_winner {
        out.push_str(winner);
        out.push('\n');
    }
    out.trim_end().to_string()
}

fn report(client: &VotingClient, err: &ClientError) {
    match client.dismiss_alert() {
        Some(alert) => println!("! {alert}"),
        None => eprintln!("error: {err}"),
    }
}

/// Read commands from stdin until `quit` or end of input.
pub async fn run(client: &VotingClient) -> anyhow::Result<()> {
    if let Err(e) = client.load().await {
        tracing::warn!(error = %e, "initial load failed");
        report(client, &e);
    }
    println!("{}", render_view(&client.view()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("lvote> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(msg) => {
                eprintln!("{msg}");
                continue;
            }
        };
        if command == ShellCommand::Quit {
            break;
        }
        match execute(client, command).await {
            Ok(Some(text)) => println!("{text}"),
            Ok(None) => println!("{}", render_view(&client.view())),
            Err(e) => report(client, &e),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_skipped() {
        assert_eq!(parse_line("   "), Ok(None));
    }

    #[test]
    fn multi_word_names_are_joined() {
        assert_eq!(
            parse_line("register 0xabc Alice Smith"),
            Ok(Some(ShellCommand::Register {
                address: "0xabc".into(),
                name: "Alice Smith".into()
            }))
        );
        assert_eq!(
            parse_line("add-option Light Blue"),
            Ok(Some(ShellCommand::AddOption("Light Blue".into())))
        );
    }

    #[test]
    fn vote_takes_the_last_word_as_weight() {
        assert_eq!(
            parse_line("vote Light Blue 5"),
            Ok(Some(ShellCommand::Vote {
                option: "Light Blue".into(),
                weight: "5".into()
            }))
        );
    }

    #[test]
    fn missing_arguments_reach_the_client_as_empty() {
        assert_eq!(
            parse_line("register 0xabc"),
            Ok(Some(ShellCommand::Register {
                address: "0xabc".into(),
                name: String::new()
            }))
        );
        assert_eq!(parse_line("open"), Ok(Some(ShellCommand::Open(String::new()))));
        assert_eq!(
            parse_line("vote Red"),
            Ok(Some(ShellCommand::Vote {
                option: "Red".into(),
                weight: String::new()
            }))
        );
    }

    #[test]
    fn vote_at_needs_a_number() {
        assert_eq!(
            parse_line("vote-at 2 10"),
            Ok(Some(ShellCommand::VoteAt {
                index: 2,
                weight: "10".into()
            }))
        );
        assert!(parse_line("vote-at two 10").is_err());
        assert!(parse_line("vote-at").is_err());
    }

    #[test]
    fn unknown_command_is_an_error() {
        assert!(parse_line("launch").is_err());
        assert_eq!(parse_line("EXIT"), Ok(Some(ShellCommand::Quit)));
    }
}
