//! Shared repolens data models consumed by the browsing core and backend crates.

pub mod changes;
pub mod listing;
pub mod revision;

pub use changes::*;
pub use listing::*;
pub use revision::*;
