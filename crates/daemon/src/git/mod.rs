// Git-backed sync engine: subprocess worker, remote and branch negotiation,
// status and change-set probes, orchestration and diff presentation.

pub mod branch;
pub mod changes;
pub mod classify;
pub mod diff_view;
pub mod lock;
pub mod remote;
pub mod status;
pub mod sync;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use classify::{ErrorClass, ErrorClassifier, SubstringClassifier};
pub use diff_view::{DiffMode, DiffPresentation, DiffViewer};
pub use sync::SyncEngine;
