use chrono::{DateTime, NaiveDate, Utc};
use fairway_catalog::{CatalogKind, CatalogSummary};
use fairway_shared::pii::{redact_email, redact_phone};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A bookable item the visitor put in their pack. Display fields are
/// copied from the catalog at add time so the pack renders even if the
/// catalog record changes later.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PackItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CatalogKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl PackItem {
    pub fn from_summary(summary: CatalogSummary) -> Self {
        Self {
            id: summary.id,
            kind: summary.kind,
            name: summary.name,
            image_url: summary.image_url,
            location: summary.location,
            description: summary.description,
            added_at: Utc::now(),
        }
    }

    pub fn matches(&self, id: &str, kind: CatalogKind) -> bool {
        self.id == id && self.kind == kind
    }
}

/// How firm the chosen travel window is.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum DateFlexibility {
    #[default]
    #[serde(rename = "no-flexibility")]
    NoFlexibility,
    #[serde(rename = "plus-minus-3-days")]
    PlusMinus3Days,
    #[serde(rename = "plus-minus-1-week")]
    PlusMinus1Week,
    #[serde(rename = "plus-minus-1-month")]
    PlusMinus1Month,
}

// The stored documents carry dates as ISO strings, with "" for unset.
fn serialize_date<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
    match date {
        Some(date) => s.serialize_str(&date.format("%Y-%m-%d").to_string()),
        None => s.serialize_str(""),
    }
}

fn deserialize_date<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct TravelDates {
    #[serde(
        serialize_with = "serialize_date",
        deserialize_with = "deserialize_date"
    )]
    pub start_date: Option<NaiveDate>,
    #[serde(
        serialize_with = "serialize_date",
        deserialize_with = "deserialize_date"
    )]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

/// Primary named contact for the booking.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ReservationHolder {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub mobile: String,
    pub country_code: String,
}

impl fmt::Debug for ReservationHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReservationHolder")
            .field("email", &redact_email(&self.email))
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("age", &self.age)
            .field("gender", &self.gender)
            .field("mobile", &redact_phone(&self.mobile))
            .field("country_code", &self.country_code)
            .finish()
    }
}

#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Traveler {
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub playing_golf: bool,
    pub requires_equipment: bool,
    pub same_as_reservation_holder: bool,
}

impl Traveler {
    /// Copy the holder's identity fields onto this traveler.
    pub fn mirror_from(&mut self, holder: &ReservationHolder) {
        self.first_name = holder.first_name.clone();
        self.last_name = holder.last_name.clone();
        self.age = holder.age;
        self.gender = holder.gender;
    }

    /// Empty the identity fields, used when the holder link is removed.
    pub fn clear_identity(&mut self) {
        self.first_name.clear();
        self.last_name.clear();
        self.age = None;
        self.gender = None;
    }

    /// Equipment rental only makes sense for a playing traveler.
    pub fn set_playing_golf(&mut self, playing: bool) {
        self.playing_golf = playing;
        if !playing {
            self.requires_equipment = false;
        }
    }

    pub fn set_requires_equipment(&mut self, requires: bool) {
        self.requires_equipment = requires && self.playing_golf;
    }
}

impl fmt::Debug for Traveler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Traveler")
            .field(
                "email",
                &self.email.as_deref().map(redact_email),
            )
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("age", &self.age)
            .field("gender", &self.gender)
            .field("playing_golf", &self.playing_golf)
            .field("requires_equipment", &self.requires_equipment)
            .field(
                "same_as_reservation_holder",
                &self.same_as_reservation_holder,
            )
            .finish()
    }
}

pub const MAX_GOLF_ROUNDS: u32 = 20;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SpecialRequests {
    pub golf_rounds: u32,
    pub notes: String,
    pub budget_min: f64,
    pub budget_max: f64,
}

impl Default for SpecialRequests {
    fn default() -> Self {
        Self {
            golf_rounds: 0,
            notes: String::new(),
            budget_min: 0.0,
            budget_max: 5000.0,
        }
    }
}

impl SpecialRequests {
    pub fn set_golf_rounds(&mut self, rounds: u32) {
        self.golf_rounds = rounds.min(MAX_GOLF_ROUNDS);
    }

    /// Raising the minimum past the maximum pushes the maximum along.
    pub fn set_budget_min(&mut self, min: f64) {
        self.budget_min = min;
        if self.budget_max < min {
            self.budget_max = min;
        }
    }

    /// Lowering the maximum past the minimum pulls the minimum along.
    pub fn set_budget_max(&mut self, max: f64) {
        self.budget_max = max;
        if self.budget_min > max {
            self.budget_min = max;
        }
    }
}

/// Trip-wide details accumulated across the wizard pages.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BookingDetails {
    pub travel_dates: TravelDates,
    pub date_flexibility: DateFlexibility,
    pub number_of_people: u32,
    pub reservation_holder: ReservationHolder,
    pub travelers: Vec<Traveler>,
    pub special_requests: SpecialRequests,
}

impl Default for BookingDetails {
    fn default() -> Self {
        Self {
            travel_dates: TravelDates::default(),
            date_flexibility: DateFlexibility::default(),
            number_of_people: 1,
            reservation_holder: ReservationHolder::default(),
            travelers: vec![Traveler::default()],
            special_requests: SpecialRequests::default(),
        }
    }
}

impl BookingDetails {
    /// Restore `travelers.len() == number_of_people`: append default
    /// travelers or truncate from the tail. Surviving entries keep their
    /// data. Returns whether the roster changed.
    pub fn reconcile_travelers(&mut self) -> bool {
        let target = self.number_of_people.max(1) as usize;
        if self.travelers.len() == target {
            return false;
        }
        if self.travelers.len() < target {
            self.travelers.resize_with(target, Traveler::default);
        } else {
            self.travelers.truncate(target);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_details_keep_the_roster_invariant() {
        let details = BookingDetails::default();
        assert_eq!(details.number_of_people, 1);
        assert_eq!(details.travelers.len(), 1);
    }

    #[test]
    fn reconcile_extends_and_truncates_preserving_survivors() {
        let mut details = BookingDetails::default();
        details.travelers[0].first_name = "Ada".to_string();

        for n in 1..=20u32 {
            details.number_of_people = n;
            details.reconcile_travelers();
            assert_eq!(details.travelers.len(), n as usize);
            assert_eq!(details.travelers[0].first_name, "Ada");
        }

        details.travelers[4].first_name = "Eve".to_string();
        details.number_of_people = 5;
        assert!(details.reconcile_travelers());
        assert_eq!(details.travelers.len(), 5);
        assert_eq!(details.travelers[4].first_name, "Eve");
    }

    #[test]
    fn mirroring_copies_and_clearing_empties() {
        let holder = ReservationHolder {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            age: Some(30),
            gender: Some(Gender::Female),
            ..ReservationHolder::default()
        };

        let mut traveler = Traveler::default();
        traveler.mirror_from(&holder);
        assert_eq!(traveler.first_name, "Ada");
        assert_eq!(traveler.last_name, "Lovelace");
        assert_eq!(traveler.age, Some(30));
        assert_eq!(traveler.gender, Some(Gender::Female));

        traveler.clear_identity();
        assert_eq!(traveler.first_name, "");
        assert_eq!(traveler.last_name, "");
        assert_eq!(traveler.age, None);
        assert_eq!(traveler.gender, None);
    }

    #[test]
    fn not_playing_forces_equipment_off() {
        let mut traveler = Traveler {
            playing_golf: true,
            requires_equipment: true,
            ..Traveler::default()
        };

        traveler.set_playing_golf(false);
        assert!(!traveler.requires_equipment);

        // And it cannot be switched back on while not playing.
        traveler.set_requires_equipment(true);
        assert!(!traveler.requires_equipment);
    }

    #[test]
    fn budget_bounds_push_each_other() {
        let mut requests = SpecialRequests::default();
        requests.set_budget_min(2000.0);
        requests.set_budget_max(3000.0);

        requests.set_budget_min(4500.0);
        assert_eq!(requests.budget_max, 4500.0);

        requests.set_budget_max(1000.0);
        assert_eq!(requests.budget_min, 1000.0);
    }

    #[test]
    fn golf_rounds_clamp_to_twenty() {
        let mut requests = SpecialRequests::default();
        requests.set_golf_rounds(35);
        assert_eq!(requests.golf_rounds, 20);
        requests.set_golf_rounds(3);
        assert_eq!(requests.golf_rounds, 3);
    }

    #[test]
    fn wire_form_uses_camel_case_and_empty_date_strings() {
        let details = BookingDetails::default();
        let value = serde_json::to_value(&details).unwrap();
        assert_eq!(value["travelDates"]["startDate"], json!(""));
        assert_eq!(value["numberOfPeople"], json!(1));
        assert_eq!(value["dateFlexibility"], json!("no-flexibility"));
        assert_eq!(value["specialRequests"]["budgetMax"], json!(5000.0));
    }

    #[test]
    fn empty_document_hydrates_to_defaults() {
        let details: BookingDetails = serde_json::from_value(json!({})).unwrap();
        assert_eq!(details, BookingDetails::default());
    }

    #[test]
    fn legacy_date_strings_hydrate() {
        let details: BookingDetails = serde_json::from_value(json!({
            "travelDates": {"startDate": "2030-01-10", "endDate": ""}
        }))
        .unwrap();
        assert_eq!(
            details.travel_dates.start_date,
            NaiveDate::from_ymd_opt(2030, 1, 10)
        );
        assert_eq!(details.travel_dates.end_date, None);
    }

    #[test]
    fn debug_output_redacts_contact_data() {
        let holder = ReservationHolder {
            email: "golfer@example.com".to_string(),
            mobile: "+15551234567".to_string(),
            ..ReservationHolder::default()
        };
        let rendered = format!("{:?}", holder);
        assert!(!rendered.contains("golfer@example.com"));
        assert!(!rendered.contains("+15551234567"));
    }
}
