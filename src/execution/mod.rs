pub mod runner;

pub use runner::{CodeRunner, RunOutcome};
