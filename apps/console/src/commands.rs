//! Typed terminal commands and their translation into state-machine events.

use client_core::{Event, FormKind, NavTarget, View};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Login { user_id: String, password: String },
    Navigate(NavTarget),
    Set { field: String, value: String },
    Reset,
    Submit,
    Logout,
    Dismiss,
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  login <user_id> <password>        sign in
  nav dashboard|register|search     switch view
  set <field> <value...>            edit a field on the current form
  reset                             clear the current form
  submit                            send the current form
  dismiss                           hide the last message
  logout                            sign out
  show                              redraw the current view
  help                              this text
  quit                              exit";

pub fn parse_command(line: &str) -> Result<ConsoleCommand, String> {
    let line = line.trim();
    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map(|(verb, rest)| (verb, rest.trim()))
        .unwrap_or((line, ""));

    match verb.to_ascii_lowercase().as_str() {
        "login" => {
            let mut parts = rest.splitn(2, char::is_whitespace);
            match (parts.next(), parts.next()) {
                (Some(user_id), Some(password)) if !user_id.is_empty() => {
                    Ok(ConsoleCommand::Login {
                        user_id: user_id.to_string(),
                        password: password.trim().to_string(),
                    })
                }
                _ => Err("usage: login <user_id> <password>".into()),
            }
        }
        "nav" | "go" => match rest.to_ascii_lowercase().as_str() {
            "dashboard" => Ok(ConsoleCommand::Navigate(NavTarget::Dashboard)),
            "register" => Ok(ConsoleCommand::Navigate(NavTarget::Register)),
            "search" => Ok(ConsoleCommand::Navigate(NavTarget::Search)),
            _ => Err("usage: nav dashboard|register|search".into()),
        },
        "set" => match rest.split_once(char::is_whitespace) {
            Some((field, value)) => Ok(ConsoleCommand::Set {
                field: field.to_string(),
                value: value.trim().to_string(),
            }),
            None if !rest.is_empty() => Ok(ConsoleCommand::Set {
                field: rest.to_string(),
                value: String::new(),
            }),
            None => Err("usage: set <field> <value...>".into()),
        },
        "reset" => Ok(ConsoleCommand::Reset),
        "submit" => Ok(ConsoleCommand::Submit),
        "logout" => Ok(ConsoleCommand::Logout),
        "dismiss" => Ok(ConsoleCommand::Dismiss),
        "show" | "" => Ok(ConsoleCommand::Show),
        "help" | "?" => Ok(ConsoleCommand::Help),
        "quit" | "exit" => Ok(ConsoleCommand::Quit),
        other => Err(format!("unknown command `{other}`; type `help`")),
    }
}

/// Events for `command` given the view currently on screen.
pub fn events_for(command: &ConsoleCommand, view: View) -> Result<Vec<Event>, String> {
    let current_form = || {
        FormKind::for_view(view).ok_or_else(|| format!("the {view} view has no form"))
    };

    match command {
        ConsoleCommand::Login { user_id, password } => {
            if view != View::Login {
                return Err("already signed in; logout first".into());
            }
            Ok(vec![
                Event::edit(FormKind::Login, "user_id", user_id.as_str()),
                Event::edit(FormKind::Login, "password", password.as_str()),
                Event::Submit(FormKind::Login),
            ])
        }
        ConsoleCommand::Navigate(target) => Ok(vec![Event::Navigate(*target)]),
        ConsoleCommand::Set { field, value } => Ok(vec![Event::edit(
            current_form()?,
            field.as_str(),
            value.as_str(),
        )]),
        ConsoleCommand::Reset => Ok(vec![Event::ResetForm(current_form()?)]),
        ConsoleCommand::Submit => Ok(vec![Event::Submit(current_form()?)]),
        ConsoleCommand::Logout => Ok(vec![Event::Logout]),
        ConsoleCommand::Dismiss => Ok(vec![Event::DismissNotice]),
        ConsoleCommand::Show | ConsoleCommand::Help | ConsoleCommand::Quit => Ok(Vec::new()),
    }
}
