use crate::models::{BookingDetails, DateFlexibility, Gender, ReservationHolder, SpecialRequests};
use chrono::NaiveDate;

/// Partial update of the trip-wide booking fields. A `None` field is left
/// untouched, so a merge can never drop a key; `apply` reports whether the
/// merge actually changed anything (an unchanged merge schedules no
/// persistence write).
#[derive(Debug, Clone, Default)]
pub struct BookingDetailsPatch {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub date_flexibility: Option<DateFlexibility>,
    pub number_of_people: Option<u32>,
}

impl BookingDetailsPatch {
    pub fn apply(&self, details: &mut BookingDetails) -> bool {
        let mut changed = false;

        if let Some(start) = self.start_date {
            if details.travel_dates.start_date != Some(start) {
                details.travel_dates.start_date = Some(start);
                changed = true;
            }
        }
        if let Some(end) = self.end_date {
            if details.travel_dates.end_date != Some(end) {
                details.travel_dates.end_date = Some(end);
                changed = true;
            }
        }
        if let Some(flexibility) = self.date_flexibility {
            if details.date_flexibility != flexibility {
                details.date_flexibility = flexibility;
                changed = true;
            }
        }
        if let Some(people) = self.number_of_people {
            let people = people.max(1);
            if details.number_of_people != people {
                details.number_of_people = people;
                changed = true;
            }
        }

        changed
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReservationHolderPatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub mobile: Option<String>,
    pub country_code: Option<String>,
}

fn set_string(target: &mut String, value: &Option<String>, changed: &mut bool) {
    if let Some(value) = value {
        if target != value {
            *target = value.clone();
            *changed = true;
        }
    }
}

impl ReservationHolderPatch {
    pub fn apply(&self, holder: &mut ReservationHolder) -> bool {
        let mut changed = false;

        set_string(&mut holder.email, &self.email, &mut changed);
        set_string(&mut holder.first_name, &self.first_name, &mut changed);
        set_string(&mut holder.last_name, &self.last_name, &mut changed);
        set_string(&mut holder.mobile, &self.mobile, &mut changed);
        set_string(&mut holder.country_code, &self.country_code, &mut changed);

        if let Some(age) = self.age {
            if holder.age != Some(age) {
                holder.age = Some(age);
                changed = true;
            }
        }
        if let Some(gender) = self.gender {
            if holder.gender != Some(gender) {
                holder.gender = Some(gender);
                changed = true;
            }
        }

        changed
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpecialRequestsPatch {
    pub golf_rounds: Option<u32>,
    pub notes: Option<String>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
}

impl SpecialRequestsPatch {
    pub fn apply(&self, requests: &mut SpecialRequests) -> bool {
        let before = requests.clone();

        if let Some(rounds) = self.golf_rounds {
            requests.set_golf_rounds(rounds);
        }
        if let Some(notes) = &self.notes {
            requests.notes = notes.clone();
        }
        // Maximum first so that a crossed pair resolves in favor of the
        // minimum, matching the single-sided slider rule.
        if let Some(max) = self.budget_max {
            requests.set_budget_max(max);
        }
        if let Some(min) = self.budget_min {
            requests.set_budget_min(min);
        }

        *requests != before
    }
}

/// Partial update of one roster entry. Identity fields are ignored while
/// the traveler mirrors the reservation holder; the toggle itself is only
/// honored for traveler zero and is handled by the session store.
#[derive(Debug, Clone, Default)]
pub struct TravelerPatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub playing_golf: Option<bool>,
    pub requires_equipment: Option<bool>,
    pub same_as_reservation_holder: Option<bool>,
}
