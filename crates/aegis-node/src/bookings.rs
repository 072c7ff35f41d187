use chrono::NaiveDate;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use aegis_core::types::{Amount, BookingId, TripId, TripType};

/// A booking the settle flow can be driven against.
///
/// The booking engine itself is an external collaborator; this registry
/// holds the details it hands over when a settlement is requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    /// Booking reference.
    pub booking_id: BookingId,
    /// The booked trip.
    pub trip_id: TripId,
    /// Mode of transport.
    pub trip_type: TripType,
    /// Date of travel.
    pub travel_date: NaiveDate,
    /// Total amount paid for the booking.
    pub total_amount: Amount,
}

/// Concurrent booking store keyed by booking reference.
pub struct BookingRegistry {
    bookings: DashMap<BookingId, Booking>,
}

impl BookingRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            bookings: DashMap::new(),
        }
    }

    /// Register a booking. Re-registration replaces the prior entry.
    pub fn register(&self, booking: Booking) {
        tracing::debug!(booking_id = %booking.booking_id, "booking registered");
        self.bookings.insert(booking.booking_id.clone(), booking);
    }

    /// Look up a booking.
    pub fn get(&self, booking_id: &BookingId) -> Option<Booking> {
        self.bookings.get(booking_id).map(|b| b.clone())
    }

    /// Number of registered bookings.
    pub fn count(&self) -> usize {
        self.bookings.len()
    }
}

impl Default for BookingRegistry {
    fn default() -> Self {
        Self::new()
    }
}
