pub mod debounce;
pub mod mirror;
pub mod models;
pub mod patch;
pub mod rules;
pub mod runtime;
pub mod store;
pub mod wizard;

pub use models::{
    BookingDetails, DateFlexibility, Gender, PackItem, ReservationHolder, SpecialRequests,
    Traveler, TravelDates,
};
pub use store::{SessionState, SessionStore};
pub use wizard::{WizardFlow, WizardPage};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Traveler index {0} out of range")]
    TravelerIndex(usize),

    #[error("The roster must keep at least one traveler")]
    RosterUnderflow,
}
