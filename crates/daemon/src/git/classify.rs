// Failure classification for pull/push error text.
//
// Git reports authentication and merge problems only as prose, so the default
// classifier matches known phrases. Each flag is computed on its own; a single
// message may raise both.

use skillsync_common::types::SyncResult;

const AUTH_MARKERS: &[&str] = &["Authentication", "Permission denied", "could not read Username"];
const CONFLICT_MARKERS: &[&str] = &["CONFLICT", "Merge conflict", "Automatic merge failed"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorClass {
    pub auth_error: bool,
    pub conflict: bool,
}

pub trait ErrorClassifier: Send + Sync {
    fn classify(&self, text: &str) -> ErrorClass;

    /// Build a failed `SyncResult` carrying the raw text and its flags.
    fn failure(&self, text: &str) -> SyncResult {
        let class = self.classify(text);
        SyncResult::failed(text.trim()).with_flags(class.auth_error, class.conflict)
    }
}

/// Case-sensitive substring matching against the known git phrases.
#[derive(Debug, Default, Clone, Copy)]
pub struct SubstringClassifier;

impl ErrorClassifier for SubstringClassifier {
    fn classify(&self, text: &str) -> ErrorClass {
        ErrorClass {
            auth_error: AUTH_MARKERS.iter().any(|marker| text.contains(marker)),
            conflict: CONFLICT_MARKERS.iter().any(|marker| text.contains(marker)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_authentication_failures() {
        let classifier = SubstringClassifier;
        for text in [
            "remote: Invalid username or password.\nfatal: Authentication failed for 'https://example.com/x.git/'",
            "git@example.com: Permission denied (publickey).",
            "fatal: could not read Username for 'https://example.com': terminal prompts disabled",
        ] {
            let class = classifier.classify(text);
            assert!(class.auth_error, "expected auth error for {text:?}");
            assert!(!class.conflict);
        }
    }

    #[test]
    fn detects_merge_conflicts() {
        let classifier = SubstringClassifier;
        for text in [
            "CONFLICT (content): Merge conflict in skills/review.md",
            "Automatic merge failed; fix conflicts and then commit the result.",
            "Merge conflict in: skills/review.md",
        ] {
            let class = classifier.classify(text);
            assert!(class.conflict, "expected conflict for {text:?}");
            assert!(!class.auth_error);
        }
    }

    #[test]
    fn unrecognized_text_sets_no_flags() {
        let class = SubstringClassifier.classify("fatal: unable to access: Could not resolve host");
        assert_eq!(class, ErrorClass::default());
    }

    #[test]
    fn matching_is_case_sensitive() {
        let class = SubstringClassifier.classify("authentication required; conflict pending");
        assert_eq!(class, ErrorClass::default());
    }

    #[test]
    fn both_flags_can_be_set_from_one_message() {
        let result = SubstringClassifier
            .failure("Permission denied while writing\nCONFLICT (content): Merge conflict in a.md\n");
        assert!(!result.success);
        assert!(result.auth_error);
        assert!(result.conflict);
        assert!(result.error.as_deref().unwrap().ends_with("Merge conflict in a.md"));
    }
}
