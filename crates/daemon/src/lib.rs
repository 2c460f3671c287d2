// skillsync-daemon library: the git-backed sync engine and its scheduler.

pub mod config;
pub mod error;
pub mod git;
pub mod notify;
pub mod paths;
pub mod runtime;
pub mod scheduler;
pub mod security;

pub use error::EngineError;
