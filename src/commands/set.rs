use std::str;

use bytes::Bytes;
use tokio::time::Duration;

use crate::commands::executable::Executable;
use crate::commands::{CommandParser, CommandParserError};
use crate::frame::Frame;
use crate::store::Store;
use crate::Error;

/// Set `key` to hold `value`. If `key` already holds a value, it is
/// overwritten and any previous time-to-live is discarded. The `PX` option
/// sets a time-to-live in milliseconds.
///
/// Ref: <https://redis.io/docs/latest/commands/set/>
#[derive(Debug, PartialEq)]
pub struct Set {
    pub key: Bytes,
    pub value: Bytes,
    pub ttl: Option<Duration>,
}

impl Executable for Set {
    fn exec(self, store: Store) -> Result<Frame, Error> {
        store.set(self.key, self.value, self.ttl);

        Ok(Frame::Simple("OK".to_string()))
    }
}

impl TryFrom<&mut CommandParser> for Set {
    type Error = CommandParserError;

    fn try_from(parser: &mut CommandParser) -> Result<Self, Self::Error> {
        let key = parser.next_bytes()?;
        let value = parser.next_bytes()?;

        let ttl = match parser.next_bytes() {
            Ok(option) if option.eq_ignore_ascii_case(b"PX") => {
                let milliseconds = parser.next_bytes()?;
                Some(parse_milliseconds(&milliseconds)?)
            }
            Ok(option) => {
                return Err(CommandParserError::InvalidCommandArgument {
                    command: "set".to_string(),
                    argument: String::from_utf8_lossy(&option).into_owned(),
                })
            }
            Err(CommandParserError::EndOfStream) => None,
            Err(e) => return Err(e),
        };

        Ok(Self { key, value, ttl })
    }
}

fn parse_milliseconds(bytes: &[u8]) -> Result<Duration, CommandParserError> {
    // `u64` rules out negative TTLs.
    str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .ok_or_else(|| CommandParserError::InvalidCommandArgument {
            command: "set".to_string(),
            argument: String::from_utf8_lossy(bytes).into_owned(),
        })
}
