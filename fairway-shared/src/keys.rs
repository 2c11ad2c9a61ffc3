//! Names shared between the session layer and the persistence backends.
//!
//! The remote document database and the on-device storage predate this
//! codebase, so the wire names are fixed: collections and document fields
//! are camelCase, storage keys match the field they mirror.

/// Collection holding one session record per signed-in user, keyed by uid.
pub const USERS_COLLECTION: &str = "users";

/// Collection receiving immutable inquiry records.
pub const INQUIRIES_COLLECTION: &str = "inquiries";

/// Document field / device-storage key for the selected pack items.
pub const PACK_ITEMS_FIELD: &str = "packItems";

/// Device-storage key for the anonymous pack slice.
pub const USER_PACK_KEY: &str = "userPack";

/// Document field and device-storage key for the booking-details slice.
pub const BOOKING_DETAILS_FIELD: &str = "bookingDetails";
