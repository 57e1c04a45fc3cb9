//! Cluster matching
//!
//! Finds every contact a request touches: the direct email/phone matches,
//! then the whole cluster behind each of them.

use std::collections::BTreeSet;

use identity_common::Contact;
use tracing::debug;

use super::query::MISSING_FIELDS_MESSAGE;
use super::{ContactStore, ResolveError};

/// Clusters reached from one request, before any merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TouchedClusters {
    /// Primaries implied by the direct matches, ascending
    pub canonical_ids: Vec<i64>,
    /// Live members of all those clusters, deduplicated
    pub members: Vec<Contact>,
}

/// Find the clusters touched by `email` / `phone_number`
///
/// Returns `None` when nothing matches, meaning the request describes a
/// brand-new identity. More than one canonical id means the request links
/// clusters that were independent until now.
pub async fn find_cluster<S>(
    store: &mut S,
    email: Option<&str>,
    phone_number: Option<&str>,
) -> Result<Option<TouchedClusters>, ResolveError>
where
    S: ContactStore + ?Sized,
{
    if email.is_none() && phone_number.is_none() {
        return Err(ResolveError::InvalidRequest(MISSING_FIELDS_MESSAGE.to_string()));
    }

    let direct = store.find_matching(email, phone_number).await?;
    if direct.is_empty() {
        debug!("No existing contact matches request");
        return Ok(None);
    }

    let canonical_ids: Vec<i64> = direct
        .iter()
        .map(Contact::canonical_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut members = store.find_clusters(&canonical_ids).await?;
    let mut seen = BTreeSet::new();
    members.retain(|c| seen.insert(c.id));

    debug!(
        direct_matches = direct.len(),
        canonical_ids = ?canonical_ids,
        members = members.len(),
        "Resolved touched clusters"
    );

    Ok(Some(TouchedClusters {
        canonical_ids,
        members,
    }))
}
