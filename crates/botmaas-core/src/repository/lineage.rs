//! Lineage ledger trait definitions.
//!
//! The ledger is append-only: records are inserted once and afterwards only
//! their sync state may change. Uniqueness of `current_id` is enforced by
//! the store itself, never by a check-then-insert in application code.

use std::pin::Pin;

use futures_util::Stream;

use botmaas_types::error::RepositoryError;
use botmaas_types::lineage::{CloneRecord, OriginId};
use botmaas_types::workflow::{BotWorkflow, SpaceId, WorkflowId};

/// Lazy stream of lineage records.
pub type CloneRecordStream =
    Pin<Box<dyn Stream<Item = Result<CloneRecord, RepositoryError>> + Send + 'static>>;

/// Repository trait for the origin -> clone ledger.
pub trait LineageLedger: Send + Sync {
    /// Insert a record. Returns `Conflict` if `record.current_id` already has one.
    fn record_clone(
        &self,
        record: &CloneRecord,
    ) -> impl std::future::Future<Output = Result<CloneRecord, RepositoryError>> + Send;

    /// Point lookup of the record that produced `current_id`.
    fn find_ancestor(
        &self,
        current_id: &WorkflowId,
    ) -> impl std::future::Future<Output = Result<Option<CloneRecord>, RepositoryError>> + Send;

    /// All records cloned from `origin_id`, in insertion order.
    ///
    /// The stream is lazy and finite. Calling this again starts a fresh
    /// stream from the beginning.
    fn find_descendants(&self, origin_id: &OriginId) -> CloneRecordStream;

    /// Most recent record of `uid` cloning `origin_id` into `space_id`.
    fn find_clone_for(
        &self,
        uid: &str,
        origin_id: &OriginId,
        space_id: Option<&SpaceId>,
    ) -> impl std::future::Future<Output = Result<Option<CloneRecord>, RepositoryError>> + Send;

    /// Flag the record of `current_id` as diverged. `NotFound` if none exists.
    fn mark_diverged(
        &self,
        current_id: &WorkflowId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}

/// Writes a produced workflow together with its lineage record.
pub trait CloneCommitter: Send + Sync {
    /// Insert both rows as one all-or-nothing unit. On any error neither row
    /// is visible to readers.
    fn commit_clone(
        &self,
        workflow: &BotWorkflow,
        record: &CloneRecord,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
