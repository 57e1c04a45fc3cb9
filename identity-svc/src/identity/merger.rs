//! Cluster merging and absorption
//!
//! Picks the single canonical contact for everything a request touched,
//! folds any other primaries underneath it, and records genuinely new
//! email/phone values as one new secondary.

use std::collections::HashSet;

use identity_common::{Contact, NewContact};
use tracing::{debug, info, warn};

use super::matcher::TouchedClusters;
use super::{ContactStore, ResolveError};

/// Outcome of [`reconcile`]
#[derive(Debug, Clone)]
pub struct Reconciled {
    /// Canonical contact as read after all writes
    pub canonical: Contact,
    /// Full live membership of the merged cluster, canonical included
    pub members: Vec<Contact>,
    /// Former primaries demoted under `canonical` by this call
    pub demoted_ids: Vec<i64>,
    /// Row inserted by this call, if any
    pub created: Option<Contact>,
}

/// Merge the touched clusters and absorb new information
///
/// With `touched == None` the request starts a new cluster and becomes its
/// primary. Otherwise the earliest-created primary wins; the others are
/// demoted after their dependents have been repointed, so no row ever links
/// to a secondary.
pub async fn reconcile<S>(
    store: &mut S,
    touched: Option<TouchedClusters>,
    email: Option<&str>,
    phone_number: Option<&str>,
) -> Result<Reconciled, ResolveError>
where
    S: ContactStore + ?Sized,
{
    let Some(touched) = touched else {
        let created = store
            .create(NewContact::primary(
                email.map(str::to_string),
                phone_number.map(str::to_string),
            ))
            .await?;
        info!(contact_id = created.id, "Created new primary contact");
        return Ok(Reconciled {
            canonical: created.clone(),
            members: vec![created.clone()],
            demoted_ids: Vec::new(),
            created: Some(created),
        });
    };

    let mut primaries: Vec<&Contact> = touched.members.iter().filter(|c| c.is_primary()).collect();
    primaries.sort_by_key(|c| (c.created_at, c.id));

    // Clusters whose primary has been soft-deleted still have live
    // secondaries pointing at it; the winner adopts them.
    let live_primary_ids: HashSet<i64> = primaries.iter().map(|c| c.id).collect();
    let orphaned: Vec<i64> = touched
        .canonical_ids
        .iter()
        .copied()
        .filter(|id| !live_primary_ids.contains(id))
        .collect();
    if !orphaned.is_empty() {
        warn!(orphaned_primary_ids = ?orphaned, "Touched clusters have no live primary");
    }

    let mut created = None;
    let (canonical_id, losers) = match primaries.split_first() {
        Some((winner, rest)) => (winner.id, rest.iter().map(|c| c.id).collect::<Vec<_>>()),
        None => {
            let root = store
                .create(NewContact::primary(
                    email.map(str::to_string),
                    phone_number.map(str::to_string),
                ))
                .await?;
            info!(contact_id = root.id, "Created replacement primary for orphaned cluster");
            let id = root.id;
            created = Some(root);
            (id, Vec::new())
        }
    };

    let repoint: Vec<i64> = losers.iter().chain(orphaned.iter()).copied().collect();
    if !repoint.is_empty() {
        let moved = store.reparent(&repoint, canonical_id).await?;
        debug!(canonical_id, moved, "Repointed dependents to canonical contact");
    }
    if !losers.is_empty() {
        let demoted = store.demote(&losers, canonical_id).await?;
        if demoted != losers.len() as u64 {
            return Err(ResolveError::Internal(format!(
                "expected to demote {} primaries under {}, demoted {}",
                losers.len(),
                canonical_id,
                demoted
            )));
        }
        info!(canonical_id, demoted_ids = ?losers, "Merged clusters");
    }

    let mut members = store.find_clusters(&[canonical_id]).await?;

    if created.is_none() {
        let known_emails: HashSet<&str> = members.iter().filter_map(|c| c.email.as_deref()).collect();
        let known_phones: HashSet<&str> = members
            .iter()
            .filter_map(|c| c.phone_number.as_deref())
            .collect();

        let new_email = email.map(|e| !known_emails.contains(e)).unwrap_or(false);
        let new_phone = phone_number.map(|p| !known_phones.contains(p)).unwrap_or(false);

        if new_email || new_phone {
            let secondary = store
                .create(NewContact::secondary(
                    email.map(str::to_string),
                    phone_number.map(str::to_string),
                    canonical_id,
                ))
                .await?;
            info!(
                canonical_id,
                contact_id = secondary.id,
                new_email,
                new_phone,
                "Absorbed new contact information as secondary"
            );
            members.push(secondary.clone());
            created = Some(secondary);
        }
    }

    let canonical = store.find_by_id(canonical_id).await?.ok_or_else(|| {
        ResolveError::Internal(format!("canonical contact {} vanished mid-resolution", canonical_id))
    })?;

    Ok(Reconciled {
        canonical,
        members,
        demoted_ids: losers,
        created,
    })
}
