pub mod echo;
pub mod executable;
pub mod get;
pub mod ping;
pub mod set;

use std::{str, vec};

use bytes::Bytes;
use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

use echo::Echo;
use get::Get;
use ping::Ping;
use set::Set;

#[derive(Debug, PartialEq)]
pub enum Command {
    Echo(Echo),
    Get(Get),
    Ping(Ping),
    Set(Set),
}

impl Executable for Command {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        match self {
            Command::Echo(cmd) => cmd.exec(store),
            Command::Get(cmd) => cmd.exec(store),
            Command::Ping(cmd) => cmd.exec(store),
            Command::Set(cmd) => cmd.exec(store),
        }
    }
}

impl TryFrom<Frame> for Command {
    type Error = CommandParserError;

    fn try_from(frame: Frame) -> Result<Self, Self::Error> {
        // Clients send commands to the Redis server as RESP arrays of bulk
        // strings.
        let frames = match frame {
            Frame::Array(array) => array,
            frame => {
                return Err(CommandParserError::InvalidFrame {
                    expected: "array".to_string(),
                    actual: frame,
                })
            }
        };

        let parser = &mut CommandParser {
            parts: frames.into_iter(),
        };

        let command_name = parser.parse_command_name()?;

        let command = match &command_name[..] {
            "echo" => Echo::try_from(&mut *parser).map(Command::Echo)?,
            "get" => Get::try_from(&mut *parser).map(Command::Get)?,
            "ping" => Ping::try_from(&mut *parser).map(Command::Ping)?,
            "set" => Set::try_from(&mut *parser).map(Command::Set)?,
            _ => {
                return Err(CommandParserError::UnknownCommand {
                    command: command_name,
                })
            }
        };

        parser.expect_end(&command_name)?;

        Ok(command)
    }
}

pub struct CommandParser {
    parts: vec::IntoIter<Frame>,
}

impl CommandParser {
    fn parse_command_name(&mut self) -> Result<String, CommandParserError> {
        let command_name = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        // Command names are matched case-insensitively.
        match command_name {
            Frame::Bulk(bytes) => str::from_utf8(&bytes[..])
                .map(|s| s.to_lowercase())
                .map_err(CommandParserError::InvalidUtf8String),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    /// The next argument as opaque bytes. Arguments other than the command
    /// name itself are never interpreted as text here.
    fn next_bytes(&mut self) -> Result<Bytes, CommandParserError> {
        let frame = self.parts.next().ok_or(CommandParserError::EndOfStream)?;

        match frame {
            Frame::Bulk(bytes) => Ok(bytes),
            frame => Err(CommandParserError::InvalidFrame {
                expected: "bulk string".to_string(),
                actual: frame,
            }),
        }
    }

    fn expect_end(&mut self, command: &str) -> Result<(), CommandParserError> {
        match self.parts.next() {
            None => Ok(()),
            Some(_) => Err(CommandParserError::WrongNumberOfArguments {
                command: command.to_string(),
            }),
        }
    }
}

#[derive(Debug, ThisError, PartialEq)]
pub enum CommandParserError {
    #[error("protocol error; invalid frame, expected {expected}, got {actual}")]
    InvalidFrame { expected: String, actual: Frame },
    #[error("unknown command '{command}'")]
    UnknownCommand { command: String },
    #[error("wrong number of arguments for '{command}' command")]
    WrongNumberOfArguments { command: String },
    #[error("invalid argument for '{command}' command: {argument}")]
    InvalidCommandArgument { command: String, argument: String },
    #[error("protocol error; invalid UTF-8 string")]
    InvalidUtf8String(#[from] str::Utf8Error),
    #[error("protocol error; attempting to extract a value failed due to the frame being fully consumed")]
    EndOfStream,
}

impl CommandParserError {
    /// Whether the request was a well-formed array of bulk strings that simply
    /// matches no known command shape, as opposed to a malformed request.
    pub fn is_unsupported_command(&self) -> bool {
        matches!(
            self,
            CommandParserError::UnknownCommand { .. }
                | CommandParserError::WrongNumberOfArguments { .. }
                | CommandParserError::InvalidCommandArgument { .. }
                | CommandParserError::EndOfStream
        )
    }
}
