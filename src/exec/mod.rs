//! Command execution: buffered spawning, parallel job batches, and shell
//! command wrappers.

pub mod buffered;
pub mod command;

pub use buffered::{BufferedSpawner, JobSet};
pub use command::CommandRunner;
