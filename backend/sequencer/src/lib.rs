//! paramsync Session Sequencer
//!
//! Builds the parameter payload, keeps the session counters, and decides
//! when parameters and the greeting are pushed into the chat widget.

pub mod builder;
pub mod counters;
pub mod decorate;
pub mod sequencer;
pub mod session_state;
pub mod store;

pub use builder::build;
pub use counters::{MessageOutcome, SessionCounterManager};
pub use decorate::{decorate_with_retry, DecorationOutcome, Decorator, RetrySchedule};
pub use sequencer::{Sequencer, SequencerParts};
pub use session_state::{Epoch, EpochToken, Lifecycle, SessionState, Welcome};
pub use store::{FileStore, MemoryStore};
