// Core moderation module - content screening for user-authored text.
// Following the same pattern as the other core modules: models, service,
// and the ports the service needs.

pub mod gate_service;
pub mod moderation_models;
pub mod moderation_service;
pub mod normalizer;
pub mod pattern_tables;

pub use gate_service::*;
pub use moderation_models::*;
pub use moderation_service::*;
pub use normalizer::normalize;
pub use pattern_tables::{PatternError, PatternTable};
