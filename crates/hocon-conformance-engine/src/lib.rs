pub mod canonical;
pub mod corpus;
pub mod known_failures;
pub mod report;
pub mod runner;
pub mod subject;
pub mod summary;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use canonical::*;
pub use corpus::*;
pub use known_failures::*;
pub use report::*;
pub use runner::*;
pub use subject::*;
pub use summary::*;
