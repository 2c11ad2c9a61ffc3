pub mod models;
pub mod submitter;

pub use models::{Inquiry, InquiryError, InquiryStatus};
pub use submitter::{InquirySubmitter, ReviewFlow, SubmitError};
