use crate::models::{Inquiry, InquiryStatus};
use chrono::Utc;
use fairway_core::identity::AuthSession;
use fairway_core::navigation::Navigator;
use fairway_core::repository::{DocumentStore, StoreError};
use fairway_session::{SessionStore, WizardPage};
use fairway_shared::keys::INQUIRIES_COLLECTION;
use fairway_shared::pii::redact_email;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Cannot submit an inquiry with an empty pack")]
    EmptyPack,

    #[error("No contact email available for the inquiry")]
    MissingContactEmail,

    #[error("Saving the inquiry failed: {0}")]
    Store(#[from] StoreError),
}

/// Turns the session into one immutable inquiry record.
///
/// Submission is all-or-nothing from the session's point of view: the
/// pack is only cleared after the insert succeeded, and a failure leaves
/// every slice untouched so the visitor can retry. An atomic in-flight
/// flag makes re-entrant calls no-ops while an attempt is running.
pub struct InquirySubmitter {
    documents: Arc<dyn DocumentStore>,
    in_flight: AtomicBool,
}

impl InquirySubmitter {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self {
            documents,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Snapshot, insert, clear. Returns the new record id, or `None` when
    /// the call was ignored because another attempt is still in flight.
    pub async fn submit(&self, session: &SessionStore) -> Result<Option<String>, SubmitError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Inquiry submission already in flight; ignoring");
            return Ok(None);
        }

        let result = self.submit_once(session).await;
        self.in_flight.store(false, Ordering::SeqCst);
        result.map(Some)
    }

    async fn submit_once(&self, session: &SessionStore) -> Result<String, SubmitError> {
        let snapshot = session.snapshot().await;
        if snapshot.pack_items.is_empty() {
            return Err(SubmitError::EmptyPack);
        }

        let user = session.backend().auth().current();
        let user_email = user
            .as_ref()
            .and_then(|user| non_empty(user.email.as_deref()))
            .or_else(|| non_empty(Some(&snapshot.booking.reservation_holder.email)))
            .or_else(|| {
                snapshot
                    .booking
                    .travelers
                    .first()
                    .and_then(|traveler| non_empty(traveler.email.as_deref()))
            })
            .ok_or(SubmitError::MissingContactEmail)?;

        let inquiry = Inquiry {
            user_id: user.map(|user| user.uid),
            user_email,
            pack_items: snapshot.pack_items,
            booking_details: snapshot.booking,
            status: InquiryStatus::New,
            created_at: Utc::now(),
            submitted: true,
        };

        let document: Value = serde_json::to_value(&inquiry).map_err(StoreError::from)?;
        let id = self.documents.add(INQUIRIES_COLLECTION, document).await?;

        info!(
            inquiry = %id,
            email = %redact_email(&inquiry.user_email),
            items = inquiry.pack_items.len(),
            "Inquiry submitted"
        );

        session.clear_pack().await;
        Ok(id)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// The review page: final guard, submit, and the redirect away from the
/// wizard on success. Submission failures surface to the caller so the
/// page can show the error and re-enable its submit control.
pub struct ReviewFlow {
    store: Arc<SessionStore>,
    submitter: Arc<InquirySubmitter>,
    navigator: Arc<dyn Navigator>,
}

impl ReviewFlow {
    pub fn new(
        store: Arc<SessionStore>,
        submitter: Arc<InquirySubmitter>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            store,
            submitter,
            navigator,
        }
    }

    /// Entry guard, same rule as every other gated page.
    pub async fn enter(&self) -> bool {
        if self.store.is_pack_empty().await {
            self.navigator.navigate(WizardPage::YourPack.path());
            return false;
        }
        true
    }

    pub async fn submit(&self) -> Result<Option<String>, SubmitError> {
        match self.submitter.submit(&self.store).await {
            Ok(Some(id)) => {
                self.navigator.navigate("/");
                Ok(Some(id))
            }
            Ok(None) => Ok(None),
            Err(err) => {
                warn!(error = %err, "Inquiry submission failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairway_catalog::{CatalogKind, CatalogSummary};
    use fairway_core::identity::{AuthSession, StaticAuthSession, UserIdentity};
    use fairway_core::navigation::RecordingNavigator;
    use fairway_session::patch::ReservationHolderPatch;
    use fairway_store::{FailureMode, MemoryDeviceStorage, MemoryDocumentStore, SessionBackend};
    use std::time::Duration;

    struct Harness {
        store: Arc<SessionStore>,
        submitter: Arc<InquirySubmitter>,
        documents: Arc<MemoryDocumentStore>,
        auth: Arc<StaticAuthSession>,
    }

    fn harness() -> Harness {
        let documents = Arc::new(MemoryDocumentStore::new());
        let storage = Arc::new(MemoryDeviceStorage::new());
        let auth = Arc::new(StaticAuthSession::anonymous());
        let backend = Arc::new(SessionBackend::new(
            documents.clone(),
            storage,
            auth.clone() as Arc<dyn AuthSession>,
        ));
        let store = Arc::new(SessionStore::new(backend, Duration::from_millis(1000)));
        let submitter = Arc::new(InquirySubmitter::new(
            documents.clone() as Arc<dyn DocumentStore>,
        ));
        Harness {
            store,
            submitter,
            documents,
            auth,
        }
    }

    fn course(id: &str) -> CatalogSummary {
        CatalogSummary::new(id, CatalogKind::Course, format!("Course {}", id))
    }

    #[tokio::test]
    async fn empty_pack_is_rejected() {
        let h = harness();
        let err = h.submitter.submit(&h.store).await.unwrap_err();
        assert!(matches!(err, SubmitError::EmptyPack));
    }

    #[tokio::test]
    async fn missing_contact_email_is_rejected() {
        let h = harness();
        h.store.add_to_pack(course("c1")).await;
        let err = h.submitter.submit(&h.store).await.unwrap_err();
        assert!(matches!(err, SubmitError::MissingContactEmail));
    }

    #[tokio::test]
    async fn signed_in_email_takes_precedence_over_the_holder() {
        let h = harness();
        h.auth
            .sign_in(UserIdentity::new("u1", Some("account@example.com".to_string())));
        h.store.add_to_pack(course("c1")).await;
        h.store
            .update_reservation_holder(ReservationHolderPatch {
                email: Some("holder@example.com".to_string()),
                ..ReservationHolderPatch::default()
            })
            .await;

        let id = h.submitter.submit(&h.store).await.unwrap().unwrap();
        let doc = h.documents.doc(INQUIRIES_COLLECTION, &id).unwrap();
        assert_eq!(doc["userEmail"], "account@example.com");
        assert_eq!(doc["userId"], "u1");
    }

    #[tokio::test]
    async fn anonymous_submission_uses_the_holder_email() {
        let h = harness();
        h.store.add_to_pack(course("c1")).await;
        h.store
            .update_reservation_holder(ReservationHolderPatch {
                email: Some("holder@example.com".to_string()),
                ..ReservationHolderPatch::default()
            })
            .await;

        let id = h.submitter.submit(&h.store).await.unwrap().unwrap();
        let doc = h.documents.doc(INQUIRIES_COLLECTION, &id).unwrap();
        assert_eq!(doc["userEmail"], "holder@example.com");
        assert_eq!(doc["status"], "new");
        assert_eq!(doc["submitted"], true);
        assert!(doc.get("userId").is_none());
    }

    #[tokio::test]
    async fn success_clears_the_pack() {
        let h = harness();
        h.store.add_to_pack(course("c1")).await;
        h.store
            .update_reservation_holder(ReservationHolderPatch {
                email: Some("holder@example.com".to_string()),
                ..ReservationHolderPatch::default()
            })
            .await;

        h.submitter.submit(&h.store).await.unwrap();
        assert!(h.store.is_pack_empty().await);
        assert_eq!(h.documents.collection_len(INQUIRIES_COLLECTION), 1);
    }

    #[tokio::test]
    async fn failure_preserves_the_session_for_a_retry() {
        let h = harness();
        h.store.add_to_pack(course("c1")).await;
        h.store
            .update_reservation_holder(ReservationHolderPatch {
                email: Some("holder@example.com".to_string()),
                ..ReservationHolderPatch::default()
            })
            .await;

        h.documents.set_failure(Some(FailureMode::Backend));
        let err = h.submitter.submit(&h.store).await.unwrap_err();
        assert!(matches!(err, SubmitError::Store(_)));
        assert_eq!(h.store.pack_len().await, 1);

        h.documents.set_failure(None);
        let id = h.submitter.submit(&h.store).await.unwrap();
        assert!(id.is_some());
        assert!(h.store.is_pack_empty().await);
    }

    #[tokio::test]
    async fn review_flow_guards_and_redirects() {
        let h = harness();
        let navigator = Arc::new(RecordingNavigator::new());
        let review = ReviewFlow::new(
            h.store.clone(),
            h.submitter.clone(),
            navigator.clone() as Arc<dyn Navigator>,
        );

        assert!(!review.enter().await);
        assert_eq!(navigator.last().as_deref(), Some("/your-pack"));

        h.store.add_to_pack(course("c1")).await;
        h.store
            .update_reservation_holder(ReservationHolderPatch {
                email: Some("holder@example.com".to_string()),
                ..ReservationHolderPatch::default()
            })
            .await;
        assert!(review.enter().await);

        review.submit().await.unwrap();
        assert_eq!(navigator.last().as_deref(), Some("/"));
    }
}
