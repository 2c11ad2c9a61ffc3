use async_trait::async_trait;
use fairway_catalog::{CatalogKind, CatalogSummary};
use fairway_core::identity::{AuthSession, StaticAuthSession};
use fairway_core::navigation::{Navigator, RecordingNavigator};
use fairway_core::repository::{DocumentStore, Filter, OrderBy, StoreError};
use fairway_inquiry::{InquirySubmitter, ReviewFlow};
use fairway_session::patch::{ReservationHolderPatch, SpecialRequestsPatch, TravelerPatch};
use fairway_session::rules::TravelDatesForm;
use fairway_session::{Gender, SessionStore, WizardFlow, WizardPage};
use fairway_store::{MemoryDeviceStorage, MemoryDocumentStore, SessionBackend};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fairway=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

struct World {
    documents: Arc<MemoryDocumentStore>,
    store: Arc<SessionStore>,
    wizard: WizardFlow,
    review: ReviewFlow,
    navigator: Arc<RecordingNavigator>,
}

fn world() -> World {
    init_tracing();
    let documents = Arc::new(MemoryDocumentStore::new());
    let storage = Arc::new(MemoryDeviceStorage::new());
    let auth = Arc::new(StaticAuthSession::anonymous()) as Arc<dyn AuthSession>;
    let backend = Arc::new(SessionBackend::new(documents.clone(), storage, auth));
    let store = Arc::new(SessionStore::new(backend, Duration::from_millis(1000)));
    let navigator = Arc::new(RecordingNavigator::new());
    let submitter = Arc::new(InquirySubmitter::new(
        documents.clone() as Arc<dyn DocumentStore>,
    ));
    let wizard = WizardFlow::new(store.clone(), navigator.clone() as Arc<dyn Navigator>);
    let review = ReviewFlow::new(
        store.clone(),
        submitter,
        navigator.clone() as Arc<dyn Navigator>,
    );
    World {
        documents,
        store,
        wizard,
        review,
        navigator,
    }
}

#[tokio::test]
async fn full_wizard_run_creates_one_inquiry_and_empties_the_pack() {
    let w = world();

    // Visiting a gated page with an empty pack bounces straight back.
    assert!(!w.wizard.enter(WizardPage::TravelerDetails).await);
    assert_eq!(w.navigator.last().as_deref(), Some("/your-pack"));

    // Pack page: one course.
    assert!(
        w.store
            .add_to_pack(CatalogSummary::new("c1", CatalogKind::Course, "Course c1"))
            .await
    );
    assert!(w.wizard.continue_from_pack().await);

    // Travel dates.
    assert!(w.wizard.enter(WizardPage::BookingDetails).await);
    w.wizard
        .submit_booking_details_on(
            &TravelDatesForm {
                start_date: "2030-01-10".to_string(),
                end_date: "2030-01-15".to_string(),
                number_of_people: "2".to_string(),
                ..TravelDatesForm::default()
            },
            chrono::NaiveDate::from_ymd_opt(2029, 6, 1).unwrap(),
        )
        .await
        .unwrap();

    // Traveler details: holder plus a second, self-described traveler.
    assert!(w.wizard.enter(WizardPage::TravelerDetails).await);
    w.store
        .update_reservation_holder(ReservationHolderPatch {
            email: Some("a@b.com".to_string()),
            first_name: Some("A".to_string()),
            last_name: Some("B".to_string()),
            age: Some(30),
            gender: Some(Gender::Male),
            mobile: Some("+15551234567".to_string()),
            ..ReservationHolderPatch::default()
        })
        .await;
    w.store
        .update_traveler(
            0,
            TravelerPatch {
                same_as_reservation_holder: Some(true),
                ..TravelerPatch::default()
            },
        )
        .await
        .unwrap();
    w.store
        .update_traveler(
            1,
            TravelerPatch {
                first_name: Some("C".to_string()),
                last_name: Some("D".to_string()),
                age: Some(28),
                gender: Some(Gender::Female),
                ..TravelerPatch::default()
            },
        )
        .await
        .unwrap();
    w.wizard.submit_traveler_details().await.unwrap();

    // Special requests: defaults accepted.
    assert!(w.wizard.enter(WizardPage::SpecialRequests).await);
    w.wizard
        .submit_special_requests(SpecialRequestsPatch::default())
        .await;

    // Review and submit.
    assert!(w.review.enter().await);
    let id = w.review.submit().await.unwrap().expect("inquiry id");

    let doc = w.documents.doc("inquiries", &id).expect("inquiry record");
    assert_eq!(doc["status"], "new");
    assert_eq!(doc["submitted"], true);
    assert_eq!(doc["userEmail"], "a@b.com");
    assert_eq!(doc["packItems"].as_array().unwrap().len(), 1);
    assert_eq!(
        doc["bookingDetails"]["travelers"].as_array().unwrap().len(),
        2
    );
    assert_eq!(doc["bookingDetails"]["travelers"][0]["firstName"], "A");
    assert_eq!(doc["bookingDetails"]["travelers"][1]["firstName"], "C");

    // The pack empties immediately and the visitor leaves the wizard.
    assert!(w.store.is_pack_empty().await);
    assert_eq!(w.navigator.last().as_deref(), Some("/"));
    assert_eq!(w.documents.collection_len("inquiries"), 1);
}

/// Document store whose inserts block until released, to hold a
/// submission in flight.
struct GatedStore {
    inner: MemoryDocumentStore,
    gate: tokio::sync::Notify,
}

#[async_trait]
impl DocumentStore for GatedStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<OrderBy>,
    ) -> Result<Vec<Value>, StoreError> {
        self.inner.query(collection, filters, order).await
    }

    async fn set(&self, collection: &str, id: &str, doc: Value) -> Result<(), StoreError> {
        self.inner.set(collection, id, doc).await
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError> {
        self.inner.update(collection, id, patch).await
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        self.inner.delete(collection, id).await
    }

    async fn add(&self, collection: &str, doc: Value) -> Result<String, StoreError> {
        self.gate.notified().await;
        self.inner.add(collection, doc).await
    }
}

#[tokio::test]
async fn a_second_submit_is_ignored_while_one_is_in_flight() {
    init_tracing();
    let documents = Arc::new(GatedStore {
        inner: MemoryDocumentStore::new(),
        gate: tokio::sync::Notify::new(),
    });
    let storage = Arc::new(MemoryDeviceStorage::new());
    let auth = Arc::new(StaticAuthSession::anonymous()) as Arc<dyn AuthSession>;
    let backend = Arc::new(SessionBackend::new(documents.clone(), storage, auth));
    let store = Arc::new(SessionStore::new(backend, Duration::from_millis(1000)));
    let submitter = Arc::new(InquirySubmitter::new(
        documents.clone() as Arc<dyn DocumentStore>,
    ));

    store
        .add_to_pack(CatalogSummary::new("c1", CatalogKind::Course, "Course c1"))
        .await;
    store
        .update_reservation_holder(ReservationHolderPatch {
            email: Some("a@b.com".to_string()),
            ..ReservationHolderPatch::default()
        })
        .await;

    let first = {
        let submitter = submitter.clone();
        let store = store.clone();
        tokio::spawn(async move { submitter.submit(&store).await })
    };
    // Let the first attempt reach the gated insert.
    tokio::task::yield_now().await;

    let second = submitter.submit(&store).await.unwrap();
    assert_eq!(second, None, "re-entrant submit is ignored");

    documents.gate.notify_one();
    let first = first.await.unwrap().unwrap();
    assert!(first.is_some());
    assert_eq!(documents.inner.collection_len("inquiries"), 1);
}
