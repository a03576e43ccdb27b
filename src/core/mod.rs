// Core modules implementing the cast store, its file format, and error modeling.
pub mod cast;
pub mod error;
pub mod format;
pub mod message;

pub use cast::CastStore;
pub use error::{Error, ErrorKind, to_exit_code};
pub use message::{AlertSlot, Message, MessageSequence};
