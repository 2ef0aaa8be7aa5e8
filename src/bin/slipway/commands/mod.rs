//! Command implementations

pub mod checklib;
pub mod completions;
pub mod hook;
pub mod m4;
pub mod run;
pub mod sources;
pub mod version;
