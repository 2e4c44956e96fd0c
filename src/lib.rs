// Content moderation for user-authored text.
//
// **Architecture Overview:**
// - `core/` = Business logic (the moderation engine, the gate, guarded chat)
// - `infra/` = Implementations of core traits (SQLite log, HTTP text generator)
// - `config` = Environment-driven settings
//
// The engine itself is a pure, synchronous function of its input; the
// commonly used entry points are re-exported here.

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
pub mod core;
#[path = "infra/infra_layer.rs"]
pub mod infra;

pub mod config;

pub use crate::core::moderation::{
    get_support_resources, moderate_content, moderate_filename, sanitize_text, Category,
    ModerationEngine, ModerationResult, Severity, SupportResource,
};
