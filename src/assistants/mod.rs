pub mod assistants;
pub use assistants::*;

pub mod messages;
pub mod runs;
pub mod threads;
