//! Adapter for clients that keep user/tag context as mutable state
//!
//! Such clients expect: set context, capture, clear context. [`Bracketed`]
//! runs that sequence under a per-instance mutex and clears through a drop
//! guard, so the context is gone even when the capture fails or panics.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

use super::{Delivery, ErrorReporter, Report};
use crate::context::User;
use crate::error::ReportError;

/// Client holding ambient context for the next capture
pub trait AmbientReporter: Send {
    fn set_user_context(&mut self, user: &User);
    fn set_tags_context(&mut self, tags: &BTreeMap<String, String>);
    fn clear_context(&mut self);
    fn capture_error(&mut self, report: &Report) -> Result<(), ReportError>;
    fn capture_error_and_wait(&mut self, report: &Report) -> Result<Delivery, ReportError>;
}

/// `ErrorReporter` over an ambient-context client
pub struct Bracketed<R> {
    inner: Mutex<R>,
}

struct ClearOnDrop<'a, R: AmbientReporter>(&'a mut R);

impl<R: AmbientReporter> Deref for ClearOnDrop<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        self.0
    }
}

impl<R: AmbientReporter> DerefMut for ClearOnDrop<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        self.0
    }
}

impl<R: AmbientReporter> Drop for ClearOnDrop<'_, R> {
    fn drop(&mut self) {
        self.0.clear_context();
    }
}

impl<R: AmbientReporter> Bracketed<R> {
    pub fn new(inner: R) -> Self {
        Self { inner: Mutex::new(inner) }
    }

    /// Inspect the wrapped client between captures
    pub fn with_inner<T>(&self, f: impl FnOnce(&R) -> T) -> T {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&*guard)
    }

    pub fn into_inner(self) -> R {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn bracket<T>(&self, report: &Report, capture: impl FnOnce(&mut R) -> T) -> T {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut scope = ClearOnDrop(&mut *guard);

        if let Some(user) = &report.user {
            scope.set_user_context(user);
        }
        if !report.tags.is_empty() {
            scope.set_tags_context(&report.tags);
        }

        capture(&mut *scope)
    }
}

impl<R: AmbientReporter> ErrorReporter for Bracketed<R> {
    fn capture(&self, report: Report) {
        self.bracket(&report, |client| {
            if let Err(e) = client.capture_error(&report) {
                log::warn!("Failed to capture report '{}': {}", report.message, e);
            }
        })
    }

    fn capture_and_wait(&self, report: Report) -> Delivery {
        self.bracket(&report, |client| match client.capture_error_and_wait(&report) {
            Ok(delivery) => delivery,
            Err(e) => {
                log::warn!("Failed to deliver report '{}': {}", report.message, e);
                Delivery::GaveUp
            }
        })
    }
}
