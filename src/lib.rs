// Main library entry point for SeqCraft.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;
