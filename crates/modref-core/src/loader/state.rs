//! Continuations captured from the host pipeline.
//!
//! The resolve and fetch-source hooks record the host's default stage each
//! time they run so that export discovery can later resolve and fetch the
//! targets of `export *` with the host's own policy. Correctness relies on
//! the host calling resolve and fetch-source before transform-source.

use super::types::{FetchSourceFn, ResolveFn};
use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Stashed continuations plus the one-time warning flag.
#[derive(Default)]
pub struct LoaderState {
    resolve: Mutex<Option<ResolveFn>>,
    fetch_source: Mutex<Option<FetchSourceFn>>,
    warned_missing_condition: AtomicBool,
}

impl std::fmt::Debug for LoaderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoaderState")
            .field("resolve", &self.has_resolve())
            .field("fetch_source", &self.has_fetch_source())
            .field(
                "warned_missing_condition",
                &self.warned_missing_condition.load(Ordering::Relaxed),
            )
            .finish()
    }
}

impl LoaderState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stash_resolve(&self, resolve: ResolveFn) {
        *self.resolve.lock().unwrap_or_else(PoisonError::into_inner) = Some(resolve);
    }

    pub fn stash_fetch_source(&self, fetch_source: FetchSourceFn) {
        *self.fetch_source.lock().unwrap_or_else(PoisonError::into_inner) = Some(fetch_source);
    }

    /// The captured resolve stage.
    pub fn resolve(&self) -> Result<ResolveFn> {
        self.resolve
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
            .ok_or(Error::ContinuationNotCaptured { stage: "resolve" })
    }

    /// The captured fetch-source stage.
    pub fn fetch_source(&self) -> Result<FetchSourceFn> {
        self.fetch_source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Arc::clone)
            .ok_or(Error::ContinuationNotCaptured {
                stage: "getSource",
            })
    }

    #[must_use]
    pub fn has_resolve(&self) -> bool {
        self.resolve
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    #[must_use]
    pub fn has_fetch_source(&self) -> bool {
        self.fetch_source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Returns `true` exactly once: the first time it is called.
    pub fn take_missing_condition_warning(&self) -> bool {
        !self.warned_missing_condition.swap(true, Ordering::Relaxed)
    }
}
