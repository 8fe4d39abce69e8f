// growth-path-core/src/core/mod.rs
// ============================================================================
// Module: Growth Path Core Types
// Description: Canonical path, station, and progress-record structures.
// Purpose: Provide stable, serializable types for path specifications and
// progress state. Dependencies: growth-path-logic, serde
// ============================================================================

//! ## Overview
//! Core types define compiled path specifications, unlock clauses, progress
//! records, and the viewing context. These types are the canonical source of
//! truth for any derived surface (shortcode renderers, AJAX endpoints, or
//! report generators).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod condition;
pub mod context;
pub mod identifiers;
pub mod path;
pub mod records;
pub mod rewards;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use condition::ConditionParseError;
pub use condition::ConditionRelation;
pub use condition::UnlockClause;
pub use condition::compile_expression;
pub use context::Session;
pub use context::ViewingContext;
pub use identifiers::BadgeSlug;
pub use identifiers::FlagName;
pub use identifiers::MissionId;
pub use identifiers::NodeId;
pub use identifiers::PathInstanceId;
pub use identifiers::ScopeId;
pub use identifiers::UserId;
pub use path::ActorClass;
pub use path::DisplayMode;
pub use path::MissionKind;
pub use path::PathConfig;
pub use path::PathSpec;
pub use path::PathSpecError;
pub use path::StationConfig;
pub use path::StationSpec;
pub use path::UnlockTrigger;
pub use records::CompletionOutcome;
pub use records::CompletionReceipt;
pub use records::CompletionRecord;
pub use records::PathProgress;
pub use records::PathView;
pub use records::StationState;
pub use records::StationStatus;
pub use records::SubmissionRecord;
pub use records::SubmissionStatus;
pub use rewards::RewardAction;
pub use rewards::RewardParseError;
pub use rewards::RewardSkip;
pub use rewards::RewardsSummary;
pub use rewards::compile_rewards_spec;
pub use time::Timestamp;
