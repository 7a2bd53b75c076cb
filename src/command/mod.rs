//! AT command interpreter: tokenizer, dispatch table, replies and errors.

pub mod commands;
pub mod error;
pub mod parser;
pub mod reply;

pub use commands::{interpret, resolve, Action, Arity, CommandDescriptor, Effect, Outcome, COMMANDS};
pub use error::{CommandError, DispatchError};
pub use parser::{parse_line, ParsedLine};
pub use reply::{Reply, Status};
