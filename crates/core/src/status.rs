//! Status enums mapping to SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data (1-based) in the
//! corresponding `*_statuses` table created by the initial migration. The
//! serialized form is the upper-case wire name (`"AVAILABLE"`, `"BOOKED"`).

use serde::{Deserialize, Serialize};

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Map a database status ID back to the enum, if known.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Lifecycle of a mentor time spot.
    TimeSpotStatus {
        Available = 1,
        Held = 2,
        Booked = 3,
    }
}

define_status_enum! {
    /// Lifecycle of an interview request.
    InterviewRequestStatus {
        Pending = 1,
        Assigned = 2,
    }
}

define_status_enum! {
    /// Lifecycle of a mentor booking.
    MentorBookingStatus {
        Upcoming = 1,
        Completed = 2,
        NotJoined = 3,
    }
}

impl TimeSpotStatus {
    /// Spots a mentor may still bind to an interview request.
    pub fn is_bookable(self) -> bool {
        matches!(self, Self::Available | Self::Held)
    }
}

impl MentorBookingStatus {
    /// Completed and not-joined bookings no longer count as the request's
    /// active booking.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::NotJoined)
    }
}
