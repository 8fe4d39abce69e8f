// growth-path-store-sqlite/src/lib.rs
// ============================================================================
// Module: Growth Path SQLite Store Library
// Description: Public API surface for the SQLite-backed stores.
// Purpose: Expose the durable progress/flag/metadata store and its config.
// Dependencies: crate::store
// ============================================================================

//! ## Overview
//! This crate implements the engine's storage interfaces on `SQLite`. The
//! completions table carries the uniqueness constraint that makes completion
//! recording at-most-once under concurrent writers; submissions are an
//! append-only audit table; flags and per-user metadata share the same
//! database file so a host needs exactly one storage substrate.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteJournalMode;
pub use store::SqliteProgressStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteSyncMode;
