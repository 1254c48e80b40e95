//! Orchestra Search: conversational collection of a musician's job-search
//! preferences, with a hosted language model doing the field extraction.

pub mod channels;
pub mod config;
pub mod error;
pub mod llm;
pub mod preferences;
pub mod session;
pub mod web;
