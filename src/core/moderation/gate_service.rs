// Moderation gate - applies the engine's verdict to a concrete input surface.
//
// This service handles:
// - picking the right engine entry point per surface (file names vs text)
// - turning a result into an allow/block decision
// - attaching crisis-support contacts to critical blocks
// - recording blocked submissions in the moderation log
//
// NO knowledge of screens or HTTP here - callers pass plain strings and an
// optional user id and get a decision back.

use super::moderation_models::{Category, ModerationResult, Severity, SupportResource};
use super::moderation_service::{get_support_resources, ModerationEngine};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum LogStoreError {
    #[error("Storage error: {0}")]
    StorageError(String),
}

// ============================================================================
// MODELS
// ============================================================================

/// Where a piece of user text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSurface {
    Chat,
    Journal,
    FileUpload,
}

impl ContentSurface {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentSurface::Chat => "chat",
            ContentSurface::Journal => "journal",
            ContentSurface::FileUpload => "file_upload",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "chat" => Some(ContentSurface::Chat),
            "journal" => Some(ContentSurface::Journal),
            "file_upload" => Some(ContentSurface::FileUpload),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A blocked submission, as kept in the moderation log.
///
/// Holds the matched fragments but never the full submitted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationEvent {
    pub user_id: Option<String>,
    pub surface: ContentSurface,
    pub categories: Vec<Category>,
    pub flagged_content: Vec<String>,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

/// What the caller should do with a submission.
#[derive(Debug, Clone)]
pub struct GateDecision {
    pub result: ModerationResult,
    /// False for any severity above `None`: do not submit or persist.
    pub allowed: bool,
    /// Filled only for `Critical` results. Show these prominently.
    pub support_resources: Vec<SupportResource>,
}

impl GateDecision {
    fn from_result(result: ModerationResult) -> Self {
        let support_resources = if result.severity == Severity::Critical {
            get_support_resources()
        } else {
            Vec::new()
        };

        Self {
            allowed: result.severity == Severity::None,
            support_resources,
            result,
        }
    }

    /// Feedback to show the user, if any.
    pub fn user_message(&self) -> Option<&str> {
        self.result.message.as_deref()
    }

    pub fn is_critical(&self) -> bool {
        self.result.severity == Severity::Critical
    }
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Trait for persisting blocked submissions.
#[async_trait]
pub trait ModerationLogStore: Send + Sync {
    /// Append one event.
    async fn record_event(&self, event: ModerationEvent) -> Result<(), LogStoreError>;

    /// Most recent events first.
    async fn recent_events(&self, limit: usize) -> Result<Vec<ModerationEvent>, LogStoreError>;
}

#[async_trait]
impl<S: ModerationLogStore + ?Sized> ModerationLogStore for Arc<S> {
    async fn record_event(&self, event: ModerationEvent) -> Result<(), LogStoreError> {
        (**self).record_event(event).await
    }

    async fn recent_events(&self, limit: usize) -> Result<Vec<ModerationEvent>, LogStoreError> {
        (**self).recent_events(limit).await
    }
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct ModerationGate<S: ModerationLogStore> {
    engine: Arc<ModerationEngine>,
    store: S,
}

impl<S: ModerationLogStore> ModerationGate<S> {
    pub fn new(engine: Arc<ModerationEngine>, store: S) -> Self {
        Self { engine, store }
    }

    pub fn engine(&self) -> &ModerationEngine {
        &self.engine
    }

    /// Screen one submission. Always re-run this on the latest text; a
    /// decision is only valid for the exact text it was made on.
    ///
    /// Never fails. A log write that errors is reported and swallowed, the
    /// decision itself stands.
    pub async fn screen(
        &self,
        surface: ContentSurface,
        user_id: Option<&str>,
        text: &str,
    ) -> GateDecision {
        let result = match surface {
            ContentSurface::FileUpload => self.engine.moderate_filename(text),
            ContentSurface::Chat | ContentSurface::Journal => self.engine.moderate_content(text),
        };

        let decision = GateDecision::from_result(result);

        if decision.allowed {
            return decision;
        }

        if decision.is_critical() {
            tracing::warn!(
                surface = %surface,
                user_id = user_id.unwrap_or("anonymous"),
                categories = ?decision.result.blocked_categories,
                "Critical content blocked, support resources attached"
            );
        } else {
            tracing::info!(
                surface = %surface,
                user_id = user_id.unwrap_or("anonymous"),
                severity = %decision.result.severity,
                categories = ?decision.result.blocked_categories,
                "Content blocked"
            );
        }

        let event = ModerationEvent {
            user_id: user_id.map(str::to_string),
            surface,
            categories: decision.result.blocked_categories.clone(),
            flagged_content: decision.result.flagged_content.clone(),
            severity: decision.result.severity,
            created_at: Utc::now(),
        };

        if let Err(e) = self.store.record_event(event).await {
            tracing::error!("Failed to record moderation event: {}", e);
        }

        decision
    }

    /// Recent blocked submissions, newest first.
    pub async fn recent_events(&self, limit: usize) -> Result<Vec<ModerationEvent>, LogStoreError> {
        self.store.recent_events(limit).await
    }
}

// ============================================================================
// TESTS
// ============================================================================
