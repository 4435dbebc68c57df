//! forklore - Browse consensus-spec items and test fixtures across forks
//!
//! Layers fetching, caching, and the HTTP API on top of `forklore-core`:
//!
//! - [`store`] - local or remote data roots
//! - [`loader`] - parallel test-fixture loading with a per-case cache
//! - [`session`] - version lifecycle, navigation history, deep-link routing
//! - [`serve`] - the JSON API server
//! - [`output`] - terminal rendering for the CLI

pub mod loader;
pub mod output;
pub mod serve;
pub mod session;
pub mod store;

pub use loader::{CaseFiles, CaseLoader, FileContent, FileSlot};
pub use session::{NavigateError, Navigation, Session, VersionData};
pub use store::DataStore;
