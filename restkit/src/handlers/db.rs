//! Database error handling for request handlers
//!
//! [`DbErrorHandler`] bundles a classifier and a shared [`Dispatcher`] so a
//! handler can turn any repository failure into an [`ApiError`] in one call.
//! It is cheap to clone and safe to share across request tasks; the
//! dispatch table can be patched at runtime.

use std::error::Error as StdError;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::error::ApiError;
use crate::classifier::{Backend, ErrorClassifier, OrmClassifier};
use crate::config::Config;
use crate::dberror::{DbError, DbErrorKind};
use crate::dispatcher::{Dispatcher, ErrorMap};
use crate::error::Result;
use crate::resterror::{RestError, RestErrorKind};

/// Classifies database errors and dispatches them to REST errors
#[derive(Clone)]
pub struct DbErrorHandler {
    dispatcher: Arc<RwLock<Dispatcher>>,
    classifier: Arc<dyn ErrorClassifier>,
    link_base: Option<String>,
}

impl DbErrorHandler {
    /// Handler for `backend` with the default dispatch table
    pub fn new(backend: Backend) -> Self {
        Self::with_classifier(backend.classifier())
    }

    /// Handler using an existing classifier
    pub fn with_classifier(classifier: Arc<dyn ErrorClassifier>) -> Self {
        Self {
            dispatcher: Arc::new(RwLock::new(Dispatcher::new())),
            classifier,
            link_base: None,
        }
    }

    /// Handler built from the `[errors]` configuration section
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidMapping`] when an override or
    /// suppression names an unknown kind or code.
    pub fn from_config(config: &Config) -> Result<Self> {
        let errors = &config.errors;
        let classifier: Arc<dyn ErrorClassifier> = if errors.orm {
            Arc::new(OrmClassifier::new(errors.backend))
        } else {
            errors.backend.classifier()
        };

        let handler = Self::with_classifier(classifier)
            .with_dispatcher(Dispatcher::from_config(errors)?);

        Ok(match errors.link_base {
            Some(ref base) => handler.with_link_base(base.clone()),
            None => handler,
        })
    }

    /// Replace the dispatcher
    #[must_use]
    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = Arc::new(RwLock::new(dispatcher));
        self
    }

    /// Attach `links.about` built from `base` to every resolved error
    #[must_use]
    pub fn with_link_base(mut self, base: impl Into<String>) -> Self {
        self.link_base = Some(base.into());
        self
    }

    /// Classify a raw backend error
    pub fn classify(&self, err: &(dyn StdError + 'static)) -> DbError {
        self.classifier.convert(err)
    }

    /// Resolve a classified error to the API error sent to the client
    ///
    /// Returns `None` when the kind is suppressed. Dispatch failures are
    /// logged and answered with `INTERNAL_ERROR`.
    pub fn resolve(&self, err: &DbError) -> Option<ApiError> {
        let rest = match self.read().handle(err) {
            Ok(rest) => rest?,
            Err(e) => {
                tracing::error!(
                    db_error_id = err.id(),
                    db_error = %err,
                    error = %e,
                    "Database error dispatch failed"
                );
                RestErrorKind::InternalError.new()
            }
        };

        Some(ApiError::new(self.decorate(rest)))
    }

    /// Classify a raw backend error, then [`resolve`](Self::resolve) it
    pub fn resolve_raw(&self, err: &(dyn StdError + 'static)) -> Option<ApiError> {
        self.resolve(&self.classify(err))
    }

    /// Insert or replace one dispatch entry; `None` suppresses the kind
    pub fn update_error_entry(&self, kind: DbErrorKind, rest: Option<RestError>) {
        self.write().update_error_entry(kind, rest);
    }

    /// Replace the whole dispatch table
    pub fn load_custom_error_map(&self, error_map: ErrorMap) {
        self.write().load_custom_error_map(error_map);
    }

    /// Snapshot of the current dispatcher
    pub fn dispatcher(&self) -> Dispatcher {
        self.read().clone()
    }

    /// Backend name of the classifier
    pub fn backend(&self) -> &'static str {
        self.classifier.backend()
    }

    fn decorate(&self, mut rest: RestError) -> RestError {
        if let Some(ref base) = self.link_base {
            if let Err(e) = rest.add_link(base) {
                tracing::warn!(error = %e, "Ignoring invalid error link base");
            }
        }
        rest
    }

    fn read(&self) -> RwLockReadGuard<'_, Dispatcher> {
        self.dispatcher.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Dispatcher> {
        self.dispatcher.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DbErrorHandler {
    fn default() -> Self {
        Self::new(Backend::default())
    }
}

impl fmt::Debug for DbErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbErrorHandler")
            .field("backend", &self.classifier.backend())
            .field("link_base", &self.link_base)
            .finish_non_exhaustive()
    }
}
