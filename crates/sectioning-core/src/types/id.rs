//! Newtype wrappers around `u64` for all catalog and student identifiers.
//!
//! Using distinct types prevents accidentally passing a `SectionId` where a
//! `ConfigId` is expected. Catalog objects reference each other only through
//! these ids, resolved against one owning snapshot.

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Macro to define a newtype ID wrapper around `u64`.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Create an identifier from a raw value.
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            /// Return the raw value.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u64>().map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.0
            }
        }
    };
}

define_id!(
    /// Unique identifier for an instructional offering.
    OfferingId
);

define_id!(
    /// Unique identifier for a course (one name of a possibly cross-listed offering).
    CourseId
);

define_id!(
    /// Unique identifier for an instructional configuration.
    ConfigId
);

define_id!(
    /// Unique identifier for a scheduling subpart.
    SubpartId
);

define_id!(
    /// Unique identifier for a class section.
    SectionId
);

define_id!(
    /// Unique identifier for a reservation.
    ReservationId
);

define_id!(
    /// Unique identifier for a student.
    StudentId
);

define_id!(
    /// Unique identifier for a student request.
    RequestId
);
