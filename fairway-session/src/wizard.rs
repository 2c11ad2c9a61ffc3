use crate::patch::{BookingDetailsPatch, SpecialRequestsPatch};
use crate::rules::{validate_travel_dates, validate_traveler_details, TravelDatesForm};
use crate::store::SessionStore;
use chrono::{NaiveDate, Utc};
use fairway_core::navigation::Navigator;
use fairway_core::validate::FieldErrors;
use std::sync::Arc;
use tracing::debug;

/// The wizard pages, in their strict forward order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPage {
    YourPack,
    BookingDetails,
    TravelerDetails,
    SpecialRequests,
    ReviewInquiry,
}

impl WizardPage {
    pub fn path(&self) -> &'static str {
        match self {
            WizardPage::YourPack => "/your-pack",
            WizardPage::BookingDetails => "/booking-details",
            WizardPage::TravelerDetails => "/traveler-details",
            WizardPage::SpecialRequests => "/special-requests",
            WizardPage::ReviewInquiry => "/review-inquiry",
        }
    }

    pub fn next(&self) -> Option<WizardPage> {
        match self {
            WizardPage::YourPack => Some(WizardPage::BookingDetails),
            WizardPage::BookingDetails => Some(WizardPage::TravelerDetails),
            WizardPage::TravelerDetails => Some(WizardPage::SpecialRequests),
            WizardPage::SpecialRequests => Some(WizardPage::ReviewInquiry),
            WizardPage::ReviewInquiry => None,
        }
    }

    /// Every page past the first is gated on a non-empty pack.
    pub fn requires_pack(&self) -> bool {
        !matches!(self, WizardPage::YourPack)
    }
}

/// Drives the wizard over the session store and the host's router.
///
/// Pages validate only their own slice; a failed validation returns the
/// field errors and neither mutates the session nor navigates.
pub struct WizardFlow {
    store: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl WizardFlow {
    pub fn new(store: Arc<SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { store, navigator }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Entry guard, re-run on every render of a page: with an empty pack
    /// the visitor is sent back to the pack page and the page body must
    /// not run. Returns whether entry is allowed.
    pub async fn enter(&self, page: WizardPage) -> bool {
        if page.requires_pack() && self.store.is_pack_empty().await {
            debug!(page = page.path(), "Empty pack; redirecting to pack page");
            self.navigator.navigate(WizardPage::YourPack.path());
            return false;
        }
        true
    }

    /// Leave the pack page for the travel-dates page. Stays put when the
    /// pack is still empty.
    pub async fn continue_from_pack(&self) -> bool {
        if self.store.is_pack_empty().await {
            return false;
        }
        self.navigator.navigate(WizardPage::BookingDetails.path());
        true
    }

    /// Travel-dates submit: validate the form, merge it, bring the roster
    /// in line with the new party size, advance.
    pub async fn submit_booking_details(&self, form: &TravelDatesForm) -> Result<(), FieldErrors> {
        self.submit_booking_details_on(form, Utc::now().date_naive())
            .await
    }

    /// Clock-injected variant of `submit_booking_details` for tests.
    pub async fn submit_booking_details_on(
        &self,
        form: &TravelDatesForm,
        today: NaiveDate,
    ) -> Result<(), FieldErrors> {
        let values = validate_travel_dates(form, today)?;

        self.store
            .update_booking_details(BookingDetailsPatch {
                start_date: Some(values.start_date),
                end_date: Some(values.end_date),
                date_flexibility: Some(values.date_flexibility),
                number_of_people: Some(values.number_of_people),
            })
            .await;
        // Page-flow side effect, deliberately outside the merge itself.
        self.store.reconcile_travelers().await;

        self.navigator.navigate(WizardPage::TravelerDetails.path());
        Ok(())
    }

    /// Traveler-details submit: the page edits the roster through the
    /// store as the visitor types, so this validates the current state
    /// and advances without further mutation.
    pub async fn submit_traveler_details(&self) -> Result<(), FieldErrors> {
        let snapshot = self.store.snapshot().await;
        validate_traveler_details(&snapshot.booking)?;
        self.navigator.navigate(WizardPage::SpecialRequests.path());
        Ok(())
    }

    /// Special-requests submit: the sliders clamp as they move, so there
    /// is nothing left to reject here. The patch is applied for callers
    /// that batch the page into the submit.
    pub async fn submit_special_requests(&self, patch: SpecialRequestsPatch) {
        self.store.update_special_requests(patch).await;
        self.navigator.navigate(WizardPage::ReviewInquiry.path());
    }
}
