//! Reconciliation engine: the orchestration layer tying imports, matching,
//! and ledger posting together. Every operation is tenant-scoped and safe to
//! retry; idempotence comes from content hashing on ingest and optimistic
//! claims on posting.

pub mod error;
pub mod ingest;
pub mod matching;
pub mod posting;
pub mod workflow;

pub use error::EngineError;
pub use ingest::{ingest, quarantine_import, IngestOutcome};
pub use matching::{auto_match, MatchSummary};
pub use posting::{
    parse_rules_toml, post_all_matched, post_line, seed_posting_rules, PostingContext,
    PostingSummary,
};
pub use workflow::{bulk_confirm, exclude_line, manual_match};
