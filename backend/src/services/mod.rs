//! Business logic services for Poke LineBot

pub mod chatbot;
pub mod command;
pub mod history;

pub use chatbot::ChatbotService;
pub use history::HistoryStore;
