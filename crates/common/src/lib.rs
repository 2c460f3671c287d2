// skillsync-common: shared types and utilities for the skillsync workspace

pub mod path;
pub mod types;
