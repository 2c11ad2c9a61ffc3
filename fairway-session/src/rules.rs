use crate::models::{BookingDetails, DateFlexibility, ReservationHolder, Traveler};
use chrono::{Days, NaiveDate};
use fairway_core::validate::{is_valid_email, is_valid_mobile, parse_iso_date, FieldErrors};

/// Raw travel-dates form input, as the page collects it.
#[derive(Debug, Clone, Default)]
pub struct TravelDatesForm {
    pub start_date: String,
    pub end_date: String,
    pub number_of_people: String,
    pub date_flexibility: DateFlexibility,
}

/// Validated travel-dates values, ready to merge into the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelDatesValues {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub number_of_people: u32,
    pub date_flexibility: DateFlexibility,
}

/// Travel-dates page rules: both dates required, the trip starts no
/// earlier than tomorrow and ends after it starts, party size is a whole
/// number of at least one.
pub fn validate_travel_dates(
    form: &TravelDatesForm,
    today: NaiveDate,
) -> Result<TravelDatesValues, FieldErrors> {
    let mut errors = FieldErrors::new();
    let tomorrow = today + Days::new(1);

    let start_date = if form.start_date.trim().is_empty() {
        errors.add("startDate", "Start date is required");
        None
    } else {
        match parse_iso_date(&form.start_date) {
            None => {
                errors.add("startDate", "Enter a valid start date");
                None
            }
            Some(date) if date < tomorrow => {
                errors.add("startDate", "Start date must be at least tomorrow");
                None
            }
            Some(date) => Some(date),
        }
    };

    let end_date = if form.end_date.trim().is_empty() {
        errors.add("endDate", "End date is required");
        None
    } else {
        match parse_iso_date(&form.end_date) {
            None => {
                errors.add("endDate", "Enter a valid end date");
                None
            }
            Some(date) => Some(date),
        }
    };

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if end <= start {
            errors.add("endDate", "End date must be after the start date");
        }
    }

    let number_of_people = if form.number_of_people.trim().is_empty() {
        errors.add("numberOfPeople", "Number of people is required");
        None
    } else {
        match form.number_of_people.trim().parse::<u32>() {
            Ok(people) if people >= 1 => Some(people),
            _ => {
                errors.add("numberOfPeople", "Number of people must be at least 1");
                None
            }
        }
    };

    if let (Some(start_date), Some(end_date), Some(number_of_people)) =
        (start_date, end_date, number_of_people)
    {
        if errors.is_empty() {
            return Ok(TravelDatesValues {
                start_date,
                end_date,
                number_of_people,
                date_flexibility: form.date_flexibility,
            });
        }
    }
    Err(errors)
}

/// Reservation-holder rules for the traveler-details page.
pub fn validate_reservation_holder(holder: &ReservationHolder, errors: &mut FieldErrors) {
    if !is_valid_email(holder.email.trim()) {
        errors.add("email", "Enter a valid email address");
    }
    if holder.first_name.trim().is_empty() {
        errors.add("firstName", "First name is required");
    }
    if holder.last_name.trim().is_empty() {
        errors.add("lastName", "Last name is required");
    }
    match holder.age {
        Some(age) if age >= 1 => {}
        _ => errors.add("age", "Enter a valid age"),
    }
    if holder.gender.is_none() {
        errors.add("gender", "Select a gender");
    }
    if !is_valid_mobile(holder.mobile.trim()) {
        errors.add(
            "mobile",
            "Enter a mobile number with country code, e.g. +15551234567",
        );
    }
}

/// Per-traveler rules. A traveler mirroring the reservation holder is
/// already covered by the holder checks; their email stays optional but
/// must be well-formed when given.
pub fn validate_traveler(index: usize, traveler: &Traveler, errors: &mut FieldErrors) {
    let field = |name: &str| format!("travelers[{}].{}", index, name);

    if !traveler.same_as_reservation_holder {
        if traveler.first_name.trim().is_empty() {
            errors.add(field("firstName"), "First name is required");
        }
        if traveler.last_name.trim().is_empty() {
            errors.add(field("lastName"), "Last name is required");
        }
        match traveler.age {
            Some(age) if age >= 1 => {}
            _ => errors.add(field("age"), "Enter a valid age"),
        }
        if traveler.gender.is_none() {
            errors.add(field("gender"), "Select a gender");
        }
    }

    if let Some(email) = &traveler.email {
        if !email.trim().is_empty() && !is_valid_email(email.trim()) {
            errors.add(field("email"), "Enter a valid email address");
        }
    }
}

/// The traveler-details page validates the holder plus the whole roster.
pub fn validate_traveler_details(details: &BookingDetails) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    validate_reservation_holder(&details.reservation_holder, &mut errors);
    for (index, traveler) in details.travelers.iter().enumerate() {
        validate_traveler(index, traveler, &mut errors);
    }
    errors.into_result()
}
