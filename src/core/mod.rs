//! Core replication logic — types, parsing, translation, asset construction.

pub mod assets;
pub mod error;
pub mod parser;
pub mod translator;
pub mod types;
