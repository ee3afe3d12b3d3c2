//! Business logic services for the Warehouse Inventory Management Platform

pub mod catalog;
pub mod ledger;
pub mod lot;
pub mod tag_inventory;
