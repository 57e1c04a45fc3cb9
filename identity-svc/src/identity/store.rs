//! Contact store seam
//!
//! The resolver talks to storage only through [`ContactStore`]. One value
//! of an implementing type represents one unit of work: every call made
//! through it during a resolution sees the same transactional snapshot.

use async_trait::async_trait;
use identity_common::{Contact, NewContact};

use super::ResolveError;

/// Transactional contact operations needed by the resolver
///
/// All reads exclude soft-deleted rows.
#[async_trait]
pub trait ContactStore: Send {
    /// Rows whose email equals `email` OR whose phone number equals
    /// `phone_number`. An absent argument contributes no condition; with
    /// both absent the result is empty.
    async fn find_matching(
        &mut self,
        email: Option<&str>,
        phone_number: Option<&str>,
    ) -> Result<Vec<Contact>, ResolveError>;

    /// Rows whose id, or whose linked_id, is in `primary_ids`
    async fn find_clusters(&mut self, primary_ids: &[i64]) -> Result<Vec<Contact>, ResolveError>;

    async fn find_by_id(&mut self, id: i64) -> Result<Option<Contact>, ResolveError>;

    /// Insert a row; the store assigns id and timestamps
    async fn create(&mut self, contact: NewContact) -> Result<Contact, ResolveError>;

    /// Point every row linked to one of `from_ids` at `to` instead
    async fn reparent(&mut self, from_ids: &[i64], to: i64) -> Result<u64, ResolveError>;

    /// Turn the primaries in `ids` into secondaries of `to`
    async fn demote(&mut self, ids: &[i64], to: i64) -> Result<u64, ResolveError>;
}
