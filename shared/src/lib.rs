//! Shared types and models for Poke LineBot
//!
//! This crate contains the wire types shared between the backend server
//! and anything that talks to its history API.

pub mod models;
pub mod types;

pub use models::*;
pub use types::*;
