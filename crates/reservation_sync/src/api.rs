use campground_model::{
    Blackout, BlackoutDraft, CalendarSnapshot, CampsiteId, ModelError, MonthRange, Reservation,
    ReservationId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::ApiError;

/// Move and/or re-date a reservation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleRequest {
    /// Reservation to change
    #[serde(skip)]
    pub reservation_id: ReservationId,
    /// New campsite; `None` moves the booking to the unassigned row
    pub campsite_id: Option<CampsiteId>,
    /// New arrival date
    pub check_in: NaiveDate,
    /// New departure date (exclusive)
    pub check_out: NaiveDate,
}

impl RescheduleRequest {
    /// Reject requests that book no night
    pub fn check(&self) -> Result<(), ModelError> {
        if self.check_out <= self.check_in {
            return Err(ModelError::InvalidDateRange {
                start: self.check_in,
                end: self.check_out,
            });
        }
        Ok(())
    }
}

/// Server answer to a reschedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleResponse {
    /// The reservation as stored
    pub reservation: Reservation,
    /// Whether the guest was told about the change
    #[serde(default)]
    pub notification_sent: bool,
}

/// Availability question for one campsite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AvailabilityProbe {
    /// Campsite to ask about
    pub campsite_id: CampsiteId,
    /// First night
    pub check_in: NaiveDate,
    /// Departure date (exclusive)
    pub check_out: NaiveDate,
    /// Party size
    #[validate(range(min = 1, max = 50, message = "Guests must be between 1 and 50"))]
    pub guests: u32,
    /// Reservation to ignore, when asking on behalf of a move
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_reservation_id: Option<ReservationId>,
}

/// One reason a campsite is unavailable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityConflict {
    /// `reservation`, `blackout`, `capacity` or `inactive`
    pub kind: String,
    /// Human-readable description
    pub message: String,
    /// Conflicting entity, when there is one
    #[serde(default)]
    pub entity_id: Option<String>,
}

/// Server answer to an availability probe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityResult {
    /// Whether the site can take the booking
    pub available: bool,
    /// Why it cannot
    #[serde(default)]
    pub conflicts: Vec<AvailabilityConflict>,
}

/// Error body returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable code
    pub error: String,
    /// Human-readable message
    pub message: String,
}

/// The calendar backend
#[async_trait::async_trait]
pub trait CalendarApi: Send + Sync {
    /// Every campsite plus the reservations and blackouts overlapping `month`
    async fn fetch_calendar(&self, month: MonthRange) -> Result<CalendarSnapshot, ApiError>;

    /// Move and/or re-date a reservation
    async fn reschedule_reservation(
        &self,
        request: &RescheduleRequest,
    ) -> Result<RescheduleResponse, ApiError>;

    /// Create a blackout
    async fn create_blackout(&self, draft: &BlackoutDraft) -> Result<Blackout, ApiError>;

    /// Replace the editable fields of a blackout
    async fn update_blackout(&self, id: &str, draft: &BlackoutDraft) -> Result<Blackout, ApiError>;

    /// Delete a blackout
    async fn delete_blackout(&self, id: &str) -> Result<(), ApiError>;

    /// Ask whether a campsite can take a booking
    async fn check_availability(
        &self,
        probe: &AvailabilityProbe,
    ) -> Result<AvailabilityResult, ApiError>;
}
