//! Reservations holding offering space for specific students.

pub mod model;
pub mod scope;

pub use model::Reservation;
pub use scope::ReservationScope;
