//! Identity resolution core
//!
//! A request carrying an email and/or phone number flows through three
//! steps, all against one [`ContactStore`] unit of work:
//!
//! 1. [`matcher::find_cluster`]: direct matches plus their whole clusters
//! 2. [`merger::reconcile`]: single canonical primary, losers demoted, new
//!    values absorbed as one secondary
//! 3. [`view::project`]: deduplicated view, canonical values first
//!
//! [`IdentityService`] wraps the three in a SQLite transaction and retries
//! the whole unit when the store reports a write conflict.

pub mod error;
pub mod matcher;
pub mod memory;
pub mod merger;
pub mod query;
pub mod service;
pub mod store;
pub mod view;

pub use error::ResolveError;
pub use query::IdentityQuery;
pub use service::IdentityService;
pub use store::ContactStore;
pub use view::{project, IdentityView};

use tracing::debug;

/// Resolve one query against a store
///
/// Does not commit anything itself; the caller owns the transaction.
pub async fn resolve<S>(store: &mut S, query: &IdentityQuery) -> Result<IdentityView, ResolveError>
where
    S: ContactStore + ?Sized,
{
    let touched = matcher::find_cluster(store, query.email(), query.phone_number()).await?;
    let reconciled = merger::reconcile(store, touched, query.email(), query.phone_number()).await?;

    let view = project(&reconciled.canonical, &reconciled.members);
    debug!(
        primary_contact_id = view.primary_contact_id,
        secondaries = view.secondary_contact_ids.len(),
        "Resolved identity"
    );
    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryContactStore;
    use super::*;
    use identity_common::{LinkPrecedence, NewContact};

    fn query(email: Option<&str>, phone: Option<&str>) -> IdentityQuery {
        IdentityQuery::new(email, phone).unwrap()
    }

    #[tokio::test]
    async fn test_new_identity_against_empty_store() {
        let mut store = MemoryContactStore::new();

        let view = resolve(&mut store, &query(Some("a@x.com"), None)).await.unwrap();

        assert_eq!(store.rows().len(), 1);
        assert_eq!(view.primary_contact_id, store.rows()[0].id);
        assert_eq!(view.emails, vec!["a@x.com"]);
        assert!(view.phone_numbers.is_empty());
        assert!(view.secondary_contact_ids.is_empty());
    }

    #[tokio::test]
    async fn test_absorption_view() {
        let mut store = MemoryContactStore::new();
        store
            .create(NewContact::primary(Some("a@x.com".into()), Some("111".into())))
            .await
            .unwrap();

        let view = resolve(&mut store, &query(Some("a@x.com"), Some("222"))).await.unwrap();

        assert_eq!(view.phone_numbers, vec!["111", "222"]);
        assert_eq!(view.emails, vec!["a@x.com"]);
        assert_eq!(view.secondary_contact_ids.len(), 1);
    }

    #[tokio::test]
    async fn test_merge_view() {
        let mut store = MemoryContactStore::new();
        let p1 = store
            .create(NewContact::primary(Some("a@x.com".into()), None))
            .await
            .unwrap();
        let p2 = store
            .create(NewContact::primary(None, Some("222".into())))
            .await
            .unwrap();

        let view = resolve(&mut store, &query(Some("a@x.com"), Some("222"))).await.unwrap();

        assert_eq!(view.primary_contact_id, p1.id);
        assert!(view.secondary_contact_ids.contains(&p2.id));
        assert_eq!(view.emails, vec!["a@x.com"]);
        assert_eq!(view.phone_numbers, vec!["222"]);
        assert_eq!(store.get(p2.id).unwrap().link_precedence, LinkPrecedence::Secondary);
    }

    #[tokio::test]
    async fn test_lookup_by_secondary_only_value_returns_whole_cluster() {
        let mut store = MemoryContactStore::new();
        resolve(&mut store, &query(Some("lorraine@hillvalley.edu"), Some("123456")))
            .await
            .unwrap();
        resolve(&mut store, &query(Some("mcfly@hillvalley.edu"), Some("123456")))
            .await
            .unwrap();

        let view = resolve(&mut store, &query(Some("mcfly@hillvalley.edu"), None))
            .await
            .unwrap();

        assert_eq!(view.emails, vec!["lorraine@hillvalley.edu", "mcfly@hillvalley.edu"]);
        assert_eq!(view.phone_numbers, vec!["123456"]);
        assert_eq!(view.secondary_contact_ids.len(), 1);
        assert_eq!(store.rows().len(), 2);
    }

    #[tokio::test]
    async fn test_invariants_hold_over_request_sequence() {
        let mut store = MemoryContactStore::new();
        let requests = [
            (Some("a@x.com"), Some("1")),
            (Some("b@x.com"), Some("2")),
            (Some("c@x.com"), None),
            (Some("a@x.com"), Some("3")),
            (Some("c@x.com"), Some("2")),
            (Some("b@x.com"), Some("1")),
            (None, Some("3")),
            (Some("d@x.com"), Some("4")),
            (Some("d@x.com"), Some("1")),
        ];

        for (email, phone) in requests {
            let view = resolve(&mut store, &query(email, phone)).await.unwrap();

            let distinct: std::collections::HashSet<_> = view.emails.iter().collect();
            assert_eq!(distinct.len(), view.emails.len(), "duplicate email in view");
            let distinct: std::collections::HashSet<_> = view.phone_numbers.iter().collect();
            assert_eq!(distinct.len(), view.phone_numbers.len(), "duplicate phone in view");

            for row in store.rows() {
                match row.link_precedence {
                    LinkPrecedence::Primary => assert_eq!(row.linked_id, None),
                    LinkPrecedence::Secondary => {
                        let parent = store.get(row.linked_id.unwrap()).unwrap();
                        assert!(parent.is_primary(), "row {} links to secondary {}", row.id, parent.id);
                    }
                }
            }
        }

        // everything above ends up in one cluster rooted at the first contact
        let primaries: Vec<_> = store.rows().iter().filter(|c| c.is_primary()).collect();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].id, 1);
    }
}
