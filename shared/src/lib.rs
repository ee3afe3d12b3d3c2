//! Shared types and computation engines for the Warehouse Inventory Management Platform
//!
//! This crate contains the domain models and the pure inventory engines
//! (unit conversion, lot splitting, ledger aggregation, tag roll-up) shared
//! between the backend and other components of the system. Nothing in here
//! performs I/O; callers fetch the raw records and pass them in.

pub mod conversion;
pub mod ledger;
pub mod models;
pub mod split;
pub mod tags;
pub mod types;

pub use conversion::*;
pub use ledger::*;
pub use models::*;
pub use split::*;
pub use tags::*;
pub use types::*;
