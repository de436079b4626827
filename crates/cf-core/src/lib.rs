//! cf-core: shared vocabulary for the clipforge crates.
//!
//! Typed identifiers, the unified error type, asset/status enums, the
//! container allow-list, the clock abstraction used for share expiry, and
//! the configuration structs every other crate reads.

pub mod clock;
pub mod config;
pub mod error;
pub mod ids;
pub mod media;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use ids::*;
pub use media::*;
