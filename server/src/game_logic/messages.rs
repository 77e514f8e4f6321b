use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

use crate::game_logic::game_state::{RoundPhase, StateContext};

/// Commands accepted by a running session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "command")]
pub enum SessionCommand {
    SelectCategory { category_id: String },
    SetDifficulty { difficulty: String },
    EnterWildcardMode,
    ExitWildcardMode,
    PickRandomCategory,
    DrawNext,
    Reveal,
    SwitchLanguage { language: String },
    /// Re-publish the current state without changing it.
    Status,
}

/// Events delivered to the presenter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "event_type", content = "data")]
pub enum SessionEvent {
    StateChanged {
        phase: RoundPhase,
        context: StateContext,
    },
    LoadError {
        message: String,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("Empty command")]
    Empty,
    #[error("Unknown command '{0}'")]
    Unknown(String),
    #[error("Command '{0}' needs an argument")]
    MissingArgument(&'static str),
}

impl FromStr for SessionCommand {
    type Err = CommandParseError;

    /// Parses the line protocol, e.g. `category SCIENCE`, `next`, `lang de`.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, argument) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let require = |name: &'static str| {
            if argument.is_empty() {
                Err(CommandParseError::MissingArgument(name))
            } else {
                Ok(argument.to_string())
            }
        };

        match verb.to_lowercase().as_str() {
            "" => Err(CommandParseError::Empty),
            "category" | "cat" => Ok(SessionCommand::SelectCategory {
                category_id: require("category")?,
            }),
            "difficulty" | "diff" => Ok(SessionCommand::SetDifficulty {
                difficulty: require("difficulty")?,
            }),
            "wildcard" | "brainfreeze" => Ok(SessionCommand::EnterWildcardMode),
            "exit-wildcard" => Ok(SessionCommand::ExitWildcardMode),
            "random" => Ok(SessionCommand::PickRandomCategory),
            "next" | "draw" => Ok(SessionCommand::DrawNext),
            "reveal" => Ok(SessionCommand::Reveal),
            "lang" | "language" => Ok(SessionCommand::SwitchLanguage {
                language: require("lang")?,
            }),
            "status" => Ok(SessionCommand::Status),
            other => Err(CommandParseError::Unknown(other.to_string())),
        }
    }
}
