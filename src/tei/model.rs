//! Process-wide alignment backend handle
//!
//! The embedding model behind the real aligner is expensive to load, so it
//! lives in one process-wide, read-only handle: installed once at startup
//! via [`init`], or lazily defaulted to the monotone backend on first use.
//! The handle is passed explicitly into the adapter boundary; nothing in the
//! pipeline reaches for it implicitly.

use once_cell::sync::OnceCell;
use std::sync::Arc;

use crate::tei::align::{Aligner, MonotoneAligner};

static BACKEND: OnceCell<Arc<dyn Aligner>> = OnceCell::new();

/// Install the process-wide backend. Returns `false` if a backend (or the
/// lazy default) was already installed; the existing one stays.
pub fn init(aligner: Arc<dyn Aligner>) -> bool {
    BACKEND.set(aligner).is_ok()
}

/// Shared handle to the installed backend, defaulting to [`MonotoneAligner`].
pub fn handle() -> Arc<dyn Aligner> {
    BACKEND
        .get_or_init(|| Arc::new(MonotoneAligner::new()))
        .clone()
}
