//! Expose wikiview's internal API for use in integration tests. The binary is
//! the supported interface; embedders should depend on `wikiview-commonmark`
//! directly.
pub mod cli;
pub mod commands;
pub mod host;
pub mod kroki;
