pub mod blocker;
pub mod catalog;
pub mod cleaner;
pub mod common;
pub mod engine;
pub mod platform;
pub mod reporter;
pub mod resolver;
pub mod scanner;
pub mod settings;
