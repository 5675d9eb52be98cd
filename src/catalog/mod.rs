//! Brand catalog stores.

pub mod memory;
pub mod sqlite;
pub mod store;
