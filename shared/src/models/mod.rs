//! Domain models for the Warehouse Inventory Management Platform

mod lot;
mod order;
mod product;

pub use lot::*;
pub use order::*;
pub use product::*;
