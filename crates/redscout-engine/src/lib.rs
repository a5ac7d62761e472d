pub mod actions;
pub mod analysis;
pub mod comments;
pub mod config;
pub mod extraction;
pub mod formatter;
pub mod navigation;
pub mod pacing;
pub mod probes;
pub mod scripts;
pub mod service;
pub mod session;
pub mod strategy;

pub use redscout_common::backend;
pub use redscout_common::error;
pub use redscout_common::records;

pub use service::{NoteService, ServiceError};
pub use config::{ConfigLoader, RedscoutConfig};
pub use pacing::{Cancelled, Pacer};
pub use session::{BackendFactory, SessionManager, SessionState};
