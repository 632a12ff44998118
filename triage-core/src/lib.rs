//! Core of the run triage client: log indexing, line search, the chat
//! session state machine, and the REST client they are fed from.

pub mod api;
pub mod error;
pub mod index;
pub mod search;
pub mod session;
pub mod types;

pub use api::{HttpApi, TriageApi};
pub use error::ApiError;
pub use session::{ChatSession, SessionAction, SessionEffect};
