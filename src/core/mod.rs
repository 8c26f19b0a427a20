// Public modules
pub mod compile;
pub mod context;
pub mod directive;
pub mod error;
pub mod external;
pub mod log;
pub mod omnifest;
pub mod resolve;
pub mod target;

// Internal modules - not part of public API
pub(crate) mod value;

// Re-export common types for convenience
pub use compile::{compile, validate, Compiled, CompileOptions, TargetSummary, ValidationReport};
pub use context::Context;
pub use error::{Error, ErrorCode, Result};
pub use omnifest::Omnifest;
pub use resolve::resolve;
