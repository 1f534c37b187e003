//! HTTP request handlers

mod health;
mod history;
mod webhook;

pub use health::*;
pub use history::*;
pub use webhook::*;
