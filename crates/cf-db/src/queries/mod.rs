//! Database query modules.

pub mod assets;
pub mod share_links;
