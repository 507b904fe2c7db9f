//! Command-line and REPL command parsing

use std::path::PathBuf;

use crate::data::list_table::{MoveDirection, RowAction};

/// Which table a command works on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    History,
    Events,
    Symptoms,
    /// Records of one symptom, by id or name
    Records(String),
}

impl View {
    fn parse(words: &[&str]) -> Result<Self, String> {
        match words {
            ["history"] => Ok(View::History),
            ["events"] => Ok(View::Events),
            ["symptoms"] => Ok(View::Symptoms),
            ["records", rest @ ..] if !rest.is_empty() => Ok(View::Records(rest.join(" "))),
            ["records"] => Err("Usage: records <symptom id or name>".to_string()),
            [other, ..] => Err(format!("Unknown view: {}", other)),
            [] => Err("Missing view (history, events, symptoms, records <symptom>)".to_string()),
        }
    }

    pub fn export_prefix(&self) -> &'static str {
        match self {
            View::History => "historico",
            View::Events => "eventos",
            View::Symptoms => "sintomas",
            View::Records(_) => "registros",
        }
    }
}

/// One-shot commands given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Help,
    InitConfig,
    GenerateConfig,
    /// Show a table and, without `--no-repl`, keep browsing it
    Show { view: View, page: Option<usize>, interactive: bool },
    Login,
    Logout,
    Status,
    /// Create an account
    Register,
    /// Show and edit the logged-in user
    Account,
    AddRecord,
    AddBatch,
    AddEvent,
    AddSymptom,
    Export { view: View, path: Option<PathBuf> },
}

impl CliCommand {
    /// Parse the arguments after the program name. No arguments opens the
    /// history in the REPL.
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let interactive = !args.iter().any(|a| a == "--no-repl");
        let page = match args.iter().position(|a| a == "--page") {
            Some(pos) => Some(
                args.get(pos + 1)
                    .and_then(|p| p.parse::<usize>().ok())
                    .filter(|p| *p > 0)
                    .ok_or_else(|| "--page expects a positive number".to_string())?,
            ),
            None => None,
        };

        let mut skip_next = false;
        let words: Vec<&str> = args
            .iter()
            .filter(|a| {
                if skip_next {
                    skip_next = false;
                    return false;
                }
                if *a == "--page" {
                    skip_next = true;
                    return false;
                }
                !matches!(a.as_str(), "--no-repl")
            })
            .map(String::as_str)
            .collect();

        match words.as_slice() {
            [] => Ok(CliCommand::Show {
                view: View::History,
                page,
                interactive,
            }),
            ["--help" | "-h" | "help"] => Ok(CliCommand::Help),
            ["--init-config"] => Ok(CliCommand::InitConfig),
            ["--generate-config"] => Ok(CliCommand::GenerateConfig),
            ["login"] => Ok(CliCommand::Login),
            ["logout"] => Ok(CliCommand::Logout),
            ["status"] => Ok(CliCommand::Status),
            ["register"] => Ok(CliCommand::Register),
            ["account"] => Ok(CliCommand::Account),
            ["add-record"] => Ok(CliCommand::AddRecord),
            ["add-batch"] => Ok(CliCommand::AddBatch),
            ["add-event"] => Ok(CliCommand::AddEvent),
            ["add-symptom"] => Ok(CliCommand::AddSymptom),
            ["export", rest @ ..] => {
                let (view_words, path) = match rest {
                    [view @ .., file] if file.ends_with(".csv") => (view, Some(PathBuf::from(*file))),
                    all => (all, None),
                };
                Ok(CliCommand::Export {
                    view: View::parse(view_words)?,
                    path,
                })
            }
            view_words => Ok(CliCommand::Show {
                view: View::parse(view_words)?,
                page,
                interactive,
            }),
        }
    }
}

/// Backslash commands understood by the REPL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Help,
    Clear,
    Quit,
    Next,
    Prev,
    Page(usize),
    PageSize(usize),
    Search(String),
    Sort(String),
    Export(Option<PathBuf>),
    Log(usize),
    Open(View),
    Reload,
    /// Row action on the current page of a list, by 1-based row number
    Action { action: RowAction, row: usize },
    /// Move a symptom one position up or down, by 1-based row number
    Move { row: usize, direction: MoveDirection },
}

impl ReplCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };

        match name {
            "\\help" | "\\h" | "\\?" => Ok(ReplCommand::Help),
            "\\clear" => Ok(ReplCommand::Clear),
            "\\quit" | "\\q" => Ok(ReplCommand::Quit),
            "\\next" | "\\n" => Ok(ReplCommand::Next),
            "\\prev" | "\\p" => Ok(ReplCommand::Prev),
            "\\page" => arg
                .parse::<usize>()
                .ok()
                .filter(|p| *p > 0)
                .map(ReplCommand::Page)
                .ok_or_else(|| "Usage: \\page <number>".to_string()),
            "\\pagesize" => arg
                .parse::<usize>()
                .ok()
                .filter(|s| *s > 0)
                .map(ReplCommand::PageSize)
                .ok_or_else(|| "Usage: \\pagesize <5|10|25|50>".to_string()),
            // An empty search clears the filter
            "\\search" | "\\s" => Ok(ReplCommand::Search(arg.to_string())),
            "\\sort" if !arg.is_empty() => Ok(ReplCommand::Sort(arg.to_string())),
            "\\sort" => Err("Usage: \\sort <column>".to_string()),
            "\\export" => Ok(ReplCommand::Export(
                (!arg.is_empty()).then(|| PathBuf::from(arg)),
            )),
            "\\log" => match arg {
                "" => Ok(ReplCommand::Log(20)),
                n => n
                    .parse::<usize>()
                    .map(ReplCommand::Log)
                    .map_err(|_| "Usage: \\log [count]".to_string()),
            },
            "\\open" => {
                let words: Vec<&str> = arg.split_whitespace().collect();
                View::parse(&words).map(ReplCommand::Open)
            }
            "\\reload" | "\\r" => Ok(ReplCommand::Reload),
            "\\edit" | "\\delete" | "\\delete-date" => {
                let action = match name {
                    "\\edit" => RowAction::Edit,
                    "\\delete" => RowAction::Delete,
                    _ => RowAction::DeleteDate,
                };
                arg.parse::<usize>()
                    .ok()
                    .filter(|r| *r > 0)
                    .map(|row| ReplCommand::Action { action, row })
                    .ok_or_else(|| format!("Usage: {} <row>", name))
            }
            "\\move" => {
                let usage = || "Usage: \\move <row> <up|down>".to_string();
                let (row, direction) = arg.split_once(char::is_whitespace).ok_or_else(usage)?;
                let row = row.parse::<usize>().ok().filter(|r| *r > 0).ok_or_else(usage)?;
                let direction = match direction.trim() {
                    "up" => MoveDirection::Up,
                    "down" => MoveDirection::Down,
                    _ => return Err(usage()),
                };
                Ok(ReplCommand::Move { row, direction })
            }
            other => Err(format!("Unknown command: {} (try \\help)", other)),
        }
    }

    /// Names offered by tab completion
    pub fn names() -> &'static [&'static str] {
        &[
            "\\help", "\\clear", "\\quit", "\\next", "\\prev", "\\page", "\\pagesize", "\\search",
            "\\sort", "\\export", "\\log", "\\open", "\\reload", "\\edit", "\\delete",
            "\\delete-date", "\\move",
        ]
    }
}
