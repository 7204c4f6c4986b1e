pub mod implementations;

pub use implementations::{NoOpProgressReporter, TracingProgressReporter};
