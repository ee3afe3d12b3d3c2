//! HTTP handlers for the Warehouse Inventory Management Platform

mod catalog;
mod health;
mod inventory;
mod lot;

pub use catalog::*;
pub use health::*;
pub use inventory::*;
pub use lot::*;
