//! Shared data model for the brute-force engine and its handlers.
//!
//! This crate carries only the pieces both sides need to agree on — the
//! attempt/result shapes, the target identity, the error taxonomy, the
//! protocol/port table, and dictionary-file loading — so handler crates can
//! depend on it without pulling in the engine's scheduling machinery.

mod attempt;
mod dictionary;
mod error;
mod ports;
mod result;
mod target;

pub use attempt::Attempt;
pub use dictionary::load_dictionary_file;
pub use error::EngineError;
pub use ports::{default_port, is_recognized_protocol, recognized_protocols};
pub use result::AttemptResult;
pub use target::Target;
