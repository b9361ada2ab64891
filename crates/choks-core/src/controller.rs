//! Analysis form lifecycle
//!
//! `AnalysisController` owns submit, render, error, save and reset for the
//! location form. It talks to the page through `AnalysisView` and to the
//! service through `AnalysisBackend`, so the whole lifecycle runs the same
//! natively (tests) and in the browser.
//!
//! Single-threaded by construction: interior state lives in `Cell`s and
//! the controller is shared through `Rc` by the event handlers.

use std::cell::Cell;

use chrono::Utc;

use crate::config::analysis_id_segment;
use crate::error::{AnalysisError, StoreError, TransportError};
use crate::render::{BannerKind, ResultCard, SAVED_BANNER_MESSAGE, SAVE_FAILED_BANNER_MESSAGE};
use crate::saved::{KeyValueStore, SaveList, SavedAnalysisRecord};
use crate::types::{interpret_analyze_reply, interpret_saved_reply, AnalysisRequest, HttpReply};
use crate::validation::{FormSnapshot, InputHint};

/// HTTP access to the analysis service.
#[allow(async_fn_in_trait)]
pub trait AnalysisBackend {
    /// `POST /api/analyze`
    async fn analyze(&self, request: &AnalysisRequest) -> Result<HttpReply, TransportError>;

    /// `GET /api/analysis/{id}`
    async fn fetch_saved(&self, analysis_id: &str) -> Result<HttpReply, TransportError>;
}

/// The page elements the controller drives.
pub trait AnalysisView {
    fn show_loading(&self);
    fn hide_loading(&self);
    /// Replace the results content with the card, reveal it and scroll to it
    fn show_result(&self, card: &ResultCard);
    /// Replace the results content with the error panel
    fn show_error(&self, message: &str);
    /// Put a transient banner above the current results content
    fn show_banner(&self, kind: BannerKind, message: &str);
    fn location_value(&self) -> String;
    fn set_location_hint(&self, hint: InputHint);
    fn clear_form(&self);
    fn hide_results(&self);
    fn focus_location(&self);
}

/// Shows the loading indicator and marks a call in flight until dropped.
///
/// Dropping happens on every exit path of the pending call, including a
/// cancelled future, so the indicator can not stay up.
pub struct LoadingGuard<'a, V: AnalysisView + ?Sized> {
    view: &'a V,
    in_flight: &'a Cell<bool>,
}

impl<'a, V: AnalysisView + ?Sized> LoadingGuard<'a, V> {
    pub fn new(view: &'a V, in_flight: &'a Cell<bool>) -> Self {
        in_flight.set(true);
        view.show_loading();
        Self { view, in_flight }
    }
}

impl<V: AnalysisView + ?Sized> Drop for LoadingGuard<'_, V> {
    fn drop(&mut self) {
        self.view.hide_loading();
        self.in_flight.set(false);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// A result card is on screen
    Rendered,
    /// The error panel is on screen
    Failed(AnalysisError),
    /// Another call was still pending; nothing happened
    Ignored,
    /// The form was reset while the call was pending; the reply was dropped
    Stale,
}

pub struct AnalysisController<B, V, S> {
    backend: B,
    view: V,
    store: S,
    storage_key: String,
    in_flight: Cell<bool>,
    generation: Cell<u64>,
}

impl<B, V, S> AnalysisController<B, V, S>
where
    B: AnalysisBackend,
    V: AnalysisView,
    S: KeyValueStore,
{
    pub fn new(backend: B, view: V, store: S, storage_key: impl Into<String>) -> Self {
        Self {
            backend,
            view,
            store,
            storage_key: storage_key.into(),
            in_flight: Cell::new(false),
            generation: Cell::new(0),
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.get()
    }

    /// Validate the form, call the service once and render the outcome.
    pub async fn submit(&self, form: FormSnapshot) -> SubmitOutcome {
        if self.in_flight.get() {
            tracing::debug!("analysis already pending, ignoring submit");
            return SubmitOutcome::Ignored;
        }

        let request = match form.to_request() {
            Ok(request) => request,
            Err(e) => return self.fail(e.into()),
        };

        tracing::info!(
            location = %request.location,
            business_type = %request.business_type,
            demographics = request.target_demographics.len(),
            "submitting analysis"
        );

        let generation = self.generation.get();
        let _loading = LoadingGuard::new(&self.view, &self.in_flight);

        let outcome = match self.backend.analyze(&request).await {
            Ok(reply) => interpret_analyze_reply(&reply),
            Err(e) => Err(e.into()),
        };

        if self.generation.get() != generation {
            tracing::debug!("form was reset while the analysis was pending");
            return SubmitOutcome::Stale;
        }

        match outcome {
            Ok(result) => {
                let card = ResultCard::new(&result)
                    .with_subject(&request.location, &request.business_type);
                self.view.show_result(&card);
                tracing::info!(
                    analysis_id = result.analysis_id.as_deref().unwrap_or("-"),
                    confidence = card.confidence,
                    "analysis rendered"
                );
                SubmitOutcome::Rendered
            }
            Err(e) => self.fail(e),
        }
    }

    /// Fetch a previously saved analysis and render it like a fresh one.
    pub async fn open_saved(&self, analysis_id: &str) -> SubmitOutcome {
        if self.in_flight.get() {
            return SubmitOutcome::Ignored;
        }
        if analysis_id_segment(analysis_id).is_none() {
            return self.fail(AnalysisError::Backend(Some("Analysis not found".to_string())));
        }

        let generation = self.generation.get();
        let _loading = LoadingGuard::new(&self.view, &self.in_flight);

        let outcome = match self.backend.fetch_saved(analysis_id).await {
            Ok(reply) => interpret_saved_reply(&reply),
            Err(e) => Err(e.into()),
        };

        if self.generation.get() != generation {
            return SubmitOutcome::Stale;
        }

        match outcome {
            Ok(saved) => {
                let card = ResultCard::new(&saved.result)
                    .with_subject(&saved.location, &saved.business_type);
                self.view.show_result(&card);
                SubmitOutcome::Rendered
            }
            Err(e) => self.fail(e),
        }
    }

    fn fail(&self, error: AnalysisError) -> SubmitOutcome {
        tracing::warn!(kind = error.kind(), "analysis failed: {}", error);
        self.view.show_error(&error.user_message());
        SubmitOutcome::Failed(error)
    }

    /// Keystroke cue on the location field. Never blocks submission.
    pub fn validate_input(&self, value: &str) {
        self.view.set_location_hint(InputHint::for_location(value));
    }

    /// Append the analysis to the save-list and confirm with a banner.
    ///
    /// The location is stored trimmed, as it was sent. A storage failure
    /// gets an error banner in the same place.
    pub fn save_current_analysis(&self, analysis_id: &str) -> Result<usize, StoreError> {
        let location = self.view.location_value();
        let record = SavedAnalysisRecord::new(analysis_id, location.trim(), Utc::now());
        let count = SaveList::new(&self.store, &self.storage_key)
            .append(record)
            .map_err(|e| {
                tracing::error!("failed to save analysis {}: {}", analysis_id, e);
                self.view
                    .show_banner(BannerKind::Error, SAVE_FAILED_BANNER_MESSAGE);
                e
            })?;

        self.view.show_banner(BannerKind::Success, SAVED_BANNER_MESSAGE);
        Ok(count)
    }

    pub fn saved_analyses(&self) -> Vec<SavedAnalysisRecord> {
        SaveList::new(&self.store, &self.storage_key).records()
    }

    /// Clear the form, hide results and focus the location field.
    pub fn reset_for_new_analysis(&self) {
        self.generation.set(self.generation.get().wrapping_add(1));
        self.view.clear_form();
        self.view.hide_results();
        self.view.focus_location();
    }
}
