use chrono::{DateTime, Utc};
use fairway_session::{BookingDetails, PackItem};
use serde::{Deserialize, Serialize};

/// Staff-side progression of an inquiry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum InquiryStatus {
    New,
    Proposed,
    Accepted,
    Finished,
}

impl InquiryStatus {
    /// The one status that may follow this one.
    pub fn next(&self) -> Option<InquiryStatus> {
        match self {
            InquiryStatus::New => Some(InquiryStatus::Proposed),
            InquiryStatus::Proposed => Some(InquiryStatus::Accepted),
            InquiryStatus::Accepted => Some(InquiryStatus::Finished),
            InquiryStatus::Finished => None,
        }
    }
}

/// The record a completed wizard turns into. Created exactly once per
/// submission; after that only staff move its status, one step at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub user_email: String,
    pub pack_items: Vec<PackItem>,
    pub booking_details: BookingDetails,
    pub status: InquiryStatus,
    pub created_at: DateTime<Utc>,
    pub submitted: bool,
}

impl Inquiry {
    /// Transition: only the immediate next status is reachable.
    pub fn transition(&mut self, to: InquiryStatus) -> Result<(), InquiryError> {
        if self.status.next() != Some(to) {
            return Err(InquiryError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InquiryError {
    #[error("Invalid status transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: InquiryStatus,
        to: InquiryStatus,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inquiry() -> Inquiry {
        Inquiry {
            user_id: None,
            user_email: "a@b.com".to_string(),
            pack_items: Vec::new(),
            booking_details: BookingDetails::default(),
            status: InquiryStatus::New,
            created_at: Utc::now(),
            submitted: true,
        }
    }

    #[test]
    fn status_walks_the_full_lifecycle() {
        let mut inquiry = inquiry();
        inquiry.transition(InquiryStatus::Proposed).unwrap();
        inquiry.transition(InquiryStatus::Accepted).unwrap();
        inquiry.transition(InquiryStatus::Finished).unwrap();
        assert_eq!(inquiry.status, InquiryStatus::Finished);
    }

    #[test]
    fn skipping_a_step_is_rejected() {
        let mut inquiry = inquiry();
        let err = inquiry.transition(InquiryStatus::Accepted).unwrap_err();
        assert!(matches!(
            err,
            InquiryError::InvalidTransition {
                from: InquiryStatus::New,
                to: InquiryStatus::Accepted,
            }
        ));
        assert_eq!(inquiry.status, InquiryStatus::New);
    }

    #[test]
    fn finished_is_terminal() {
        let mut inquiry = inquiry();
        inquiry.status = InquiryStatus::Finished;
        assert!(inquiry.transition(InquiryStatus::New).is_err());
        assert!(inquiry.transition(InquiryStatus::Proposed).is_err());
    }

    #[test]
    fn status_wire_values_are_lowercase() {
        assert_eq!(
            serde_json::to_string(&InquiryStatus::New).unwrap(),
            "\"new\""
        );
        assert_eq!(
            serde_json::to_string(&InquiryStatus::Finished).unwrap(),
            "\"finished\""
        );
    }
}
