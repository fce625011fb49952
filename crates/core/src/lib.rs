//! Core logic for Tally.
//!
//! This crate contains pure logic with ZERO web or database dependencies.
//! Filtering rules, balance arithmetic, and credential handling live here.
//!
//! # Modules
//!
//! - `operation` - Declarative operation filters and date scopes
//! - `balance` - Exact decimal balance summation
//! - `auth` - Password hashing and email normalization

pub mod auth;
pub mod balance;
pub mod operation;
