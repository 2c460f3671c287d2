// Repository-relative path handling.

pub mod normalize;

pub use normalize::{normalize_module_prefix, normalize_repo_path, PathError};
