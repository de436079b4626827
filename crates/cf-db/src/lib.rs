//! cf-db: metadata persistence for assets and share links.
//!
//! SQLite behind an r2d2 pool capped at one connection, so every write in
//! the process is serialized through a single logical writer. Query
//! functions take a `&Connection`; [`AssetStore`] and [`ShareLinkStore`]
//! are the pool-owning handles the pipelines are constructed with.

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
pub mod store;

pub use models::{Asset, NewAsset, ShareLink};
pub use pool::{init_memory_pool, init_pool, DbPool};
pub use store::{AssetStore, ShareLinkStore};
