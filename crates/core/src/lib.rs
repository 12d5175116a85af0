//! Çarşı Core - Shared types library.
//!
//! This crate provides the types and pure logic used across all Çarşı components:
//! - `storefront` - Public-facing shop (catalog, search, cart)
//! - `admin` - Product upload and editing panel
//! - `cli` - Command-line tools for migrations and bulk import
//!
//! # Architecture
//!
//! The core crate contains only types and in-memory logic - no I/O, no database
//! access, no HTTP clients. The cart store lives here so that every surface
//! reconciles quantities against stock the same way.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and prices
//! - [`catalog`] - Product, category and image records
//! - [`cart`] - Cart store with stock-ceiling reconciliation and snapshots
//! - [`slug`] - URL slug generation with Turkish transliteration
//! - [`shipping`] - Shipping fee rules

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod shipping;
pub mod slug;
pub mod types;

pub use types::*;
