#![doc = include_str!("../README.md")]

pub mod casstring;
pub mod command;
pub mod connector;
pub mod error;
pub mod options;
pub mod response;
pub mod session;
pub mod slot;

pub use casstring::CasString;
pub use connector::{CasResult, CasResults, Connector, RawConnector};
pub use error::{SessionError, SessionErrorKind};
pub use options::{CasOptions, CommandPrologue};
pub use session::{CasSession, Instantiation, Validity};
pub use slot::{ExprSlot, SecurityLevel, SyntaxPolicy};
