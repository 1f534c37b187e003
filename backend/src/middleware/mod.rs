//! Request middleware

pub mod signature;

pub use signature::require_line_signature;
