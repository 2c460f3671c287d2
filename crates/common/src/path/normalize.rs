// Repo-relative path canonicalization: NFC normalization, traversal rejection, 1024 char max.

use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Maximum allowed path length in characters.
const MAX_PATH_CHARS: usize = 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("path is empty")]
    Empty,

    #[error("path exceeds maximum length of {MAX_PATH_CHARS} characters")]
    TooLong,

    #[error("path contains directory traversal component: {0}")]
    Traversal(String),

    #[error("path contains null byte")]
    NullByte,

    #[error("path contains invalid component: {0}")]
    InvalidComponent(String),

    #[error("path points into repository metadata: {0}")]
    GitMetadata(String),
}

/// Normalize a path relative to the sync repository root.
///
/// Rules:
/// - Apply Unicode NFC normalization (git stores precomposed names)
/// - Convert all separators to `/`
/// - Collapse consecutive `/` and strip leading/trailing `/`
/// - Reject `.` and `..` components, null bytes, empty paths
/// - Reject anything under `.git/`
pub fn normalize_repo_path(input: &str) -> Result<String, PathError> {
    if input.is_empty() {
        return Err(PathError::Empty);
    }

    if input.contains('\0') {
        return Err(PathError::NullByte);
    }

    let normalized: String = input.nfc().collect();
    let unified = normalized.replace('\\', "/");
    let components: Vec<&str> = unified.split('/').filter(|s| !s.is_empty()).collect();

    if components.is_empty() {
        return Err(PathError::Empty);
    }

    for component in &components {
        if *component == "." || *component == ".." {
            return Err(PathError::Traversal((*component).to_string()));
        }
        if component.trim().is_empty() {
            return Err(PathError::InvalidComponent("(whitespace-only component)".to_string()));
        }
    }

    if components[0] == ".git" {
        return Err(PathError::GitMetadata(unified));
    }

    let result = components.join("/");

    if result.chars().count() > MAX_PATH_CHARS {
        return Err(PathError::TooLong);
    }

    Ok(result)
}

/// Normalize a module prefix (e.g. `skills`, `/commands/`) into the
/// `"<prefix>/"` form used for sub-tree filtering.
pub fn normalize_module_prefix(input: &str) -> Result<String, PathError> {
    normalize_repo_path(input).map(|prefix| format!("{prefix}/"))
}
