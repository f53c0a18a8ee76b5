use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{DaySpan, ModelError, days_between};

/// Identifier of a campsite
pub type CampsiteId = String;
/// Identifier of a reservation
pub type ReservationId = String;
/// Identifier of a blackout period
pub type BlackoutId = String;

/// Prefix carried by identifiers minted locally before the server confirms an entity
pub const TEMP_ID_PREFIX: &str = "temp-";

/// Mint a temporary identifier that can never collide with a server id
pub fn temp_id() -> String {
    format!("{}{}", TEMP_ID_PREFIX, Uuid::new_v4())
}

/// Whether `id` was minted by [`temp_id`]
pub fn is_temp_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

/// Kind of campsite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampsiteType {
    /// Tent pad
    Tent,
    /// RV pull-through or back-in site
    Rv,
    /// Cabin
    Cabin,
}

impl CampsiteType {
    /// Short display label
    pub fn label(&self) -> &'static str {
        match self {
            CampsiteType::Tent => "Tent",
            CampsiteType::Rv => "RV",
            CampsiteType::Cabin => "Cabin",
        }
    }
}

/// A bookable campsite, one row of the scheduling grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Campsite {
    /// Unique identifier for the campsite
    pub id: CampsiteId,
    /// Short display code such as `S1`
    pub code: String,
    /// Display name
    pub name: String,
    /// Site category
    pub campsite_type: CampsiteType,
    /// Maximum number of guests the site accommodates
    pub max_guests: u32,
    /// Position of the row in the grid; ties fall back to the code
    #[serde(default)]
    pub sort_order: i32,
    /// Free-text notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Inactive sites keep their bookings but accept no new ones
    pub is_active: bool,
}

/// Lifecycle status of a reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Requested, not yet confirmed
    Pending,
    /// Confirmed by staff
    Confirmed,
    /// Guest is on site
    CheckedIn,
    /// Guest has left
    CheckedOut,
    /// Cancelled before arrival
    Cancelled,
    /// Guest never arrived
    NoShow,
}

impl ReservationStatus {
    /// Whether a block with this status may be dragged or resized
    pub fn is_interactive(&self) -> bool {
        !matches!(
            self,
            ReservationStatus::Cancelled | ReservationStatus::NoShow | ReservationStatus::CheckedOut
        )
    }

    /// Whether a reservation with this status holds its site
    pub fn blocks_occupancy(&self) -> bool {
        !matches!(self, ReservationStatus::Cancelled | ReservationStatus::NoShow)
    }

    /// Database/wire string for the status
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::CheckedIn => "checked_in",
            ReservationStatus::CheckedOut => "checked_out",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::NoShow => "no_show",
        }
    }
}

/// Camping unit the guest brings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampingUnit {
    /// Tent
    Tent,
    /// Travel trailer towed by a vehicle
    PullTrailer,
    /// Fifth-wheel trailer
    FifthWheel,
    /// Motorhome
    Motorhome,
    /// Camper van
    Van,
    /// Anything else
    #[serde(other)]
    Other,
}

/// How the guest prefers to be contacted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactMethod {
    /// Email only
    Email,
    /// Phone only
    Phone,
    /// Either channel
    Either,
}

/// A guest reservation occupying a campsite for the nights `[check_in, check_out)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique identifier for the reservation
    pub id: ReservationId,
    /// Assigned campsite; `None` places the booking on the unassigned row
    pub campsite_id: Option<CampsiteId>,
    /// Arrival date (first night)
    pub check_in: NaiveDate,
    /// Departure date (exclusive)
    pub check_out: NaiveDate,
    /// Lifecycle status
    pub status: ReservationStatus,
    /// Guest first name
    pub first_name: String,
    /// Guest last name
    pub last_name: String,
    /// Guest email
    #[serde(default)]
    pub email: Option<String>,
    /// Guest phone
    #[serde(default)]
    pub phone: Option<String>,
    /// Preferred contact channel
    #[serde(default)]
    pub contact_method: Option<ContactMethod>,
    /// Number of adults
    #[serde(default)]
    pub adults: u32,
    /// Number of children
    #[serde(default)]
    pub children: u32,
    /// Equipment the guest brings
    pub camping_unit: CampingUnit,
    /// RV length as entered by the guest (e.g. `25 ft`)
    #[serde(default)]
    pub rv_length: Option<String>,
    /// RV model year
    #[serde(default)]
    pub rv_year: Option<i32>,
    /// Set while an optimistic change to this reservation awaits the server
    #[serde(skip)]
    pub saving: bool,
}

impl Reservation {
    /// Full guest name
    pub fn guest_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Number of nights booked
    pub fn nights(&self) -> i64 {
        days_between(self.check_in, self.check_out)
    }

    /// Adults plus children
    pub fn party_size(&self) -> u32 {
        self.adults + self.children
    }

    /// Occupied nights as an inclusive day span
    pub fn days(&self) -> DaySpan {
        DaySpan::from_half_open(self.check_in, self.check_out)
    }

    /// Where the reservation sits in the grid
    pub fn placement(&self) -> Placement {
        match &self.campsite_id {
            Some(id) => Placement::Site(id.clone()),
            None => Placement::Unassigned,
        }
    }

    /// Whether the block accepts drag and resize gestures
    pub fn is_interactive(&self) -> bool {
        self.status.is_interactive()
    }
}

/// A blackout period blocking bookings on one campsite, or on all of them.
///
/// Unlike reservations both `start_date` and `end_date` are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blackout {
    /// Unique identifier for the blackout
    pub id: BlackoutId,
    /// Campsite the blackout applies to; `None` applies it to every site
    pub campsite_id: Option<CampsiteId>,
    /// First blocked day
    pub start_date: NaiveDate,
    /// Last blocked day
    pub end_date: NaiveDate,
    /// Why the period is blocked
    pub reason: String,
    /// Set while an optimistic change to this blackout awaits the server
    #[serde(skip)]
    pub saving: bool,
}

impl Blackout {
    /// Build a blackout from a draft under the given identifier
    pub fn from_draft(id: BlackoutId, draft: &BlackoutDraft) -> Self {
        Self {
            id,
            campsite_id: draft.campsite_id.clone(),
            start_date: draft.start_date,
            end_date: draft.end_date,
            reason: draft.reason.clone(),
            saving: false,
        }
    }

    /// Overwrite the editable fields with those of `draft`
    pub fn apply_draft(&mut self, draft: &BlackoutDraft) {
        self.campsite_id = draft.campsite_id.clone();
        self.start_date = draft.start_date;
        self.end_date = draft.end_date;
        self.reason = draft.reason.clone();
    }

    /// Whether the blackout applies to every campsite
    pub fn is_global(&self) -> bool {
        self.campsite_id.is_none()
    }

    /// Blocked days
    pub fn days(&self) -> DaySpan {
        DaySpan::new(self.start_date, self.end_date)
    }

    /// Where the blackout sits in the grid
    pub fn placement(&self) -> Placement {
        match &self.campsite_id {
            Some(id) => Placement::Site(id.clone()),
            None => Placement::AllSites,
        }
    }

    /// Whether the blackout blocks `campsite_id`
    pub fn applies_to(&self, campsite_id: &str) -> bool {
        match &self.campsite_id {
            Some(id) => id == campsite_id,
            None => true,
        }
    }
}

/// Editable fields of a blackout, sent on create and update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct BlackoutDraft {
    /// Campsite the blackout applies to; `None` applies it to every site
    pub campsite_id: Option<CampsiteId>,
    /// First blocked day
    pub start_date: NaiveDate,
    /// Last blocked day
    pub end_date: NaiveDate,
    /// Why the period is blocked
    #[validate(length(min = 1, max = 500, message = "Reason is required"))]
    pub reason: String,
}

impl BlackoutDraft {
    /// Validate field lengths and the date order
    pub fn check(&self) -> Result<(), ModelError> {
        self.validate()?;

        if self.end_date < self.start_date {
            return Err(ModelError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }

        Ok(())
    }
}

impl From<&Blackout> for BlackoutDraft {
    fn from(blackout: &Blackout) -> Self {
        Self {
            campsite_id: blackout.campsite_id.clone(),
            start_date: blackout.start_date,
            end_date: blackout.end_date,
            reason: blackout.reason.clone(),
        }
    }
}

/// Where a block, or a candidate for one, lands on the grid
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Placement {
    /// The unassigned pseudo-row, reservations only
    Unassigned,
    /// A specific campsite
    Site(CampsiteId),
    /// Every campsite at once, global blackouts only
    AllSites,
}

impl Placement {
    /// The campsite id a reservation with this placement carries
    pub fn campsite_id(&self) -> Option<&str> {
        match self {
            Placement::Site(id) => Some(id),
            Placement::Unassigned | Placement::AllSites => None,
        }
    }
}

/// Key of an entity in the calendar snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    /// A reservation
    Reservation(ReservationId),
    /// A blackout
    Blackout(BlackoutId),
}

impl EntityKey {
    /// Identifier of the keyed entity
    pub fn id(&self) -> &str {
        match self {
            EntityKey::Reservation(id) | EntityKey::Blackout(id) => id,
        }
    }
}

/// Everything the scheduling grid needs to display one month
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarSnapshot {
    /// Every campsite, active or not
    pub campsites: Vec<Campsite>,
    /// Reservations overlapping the month
    pub reservations: Vec<Reservation>,
    /// Blackouts overlapping the month
    pub blackouts: Vec<Blackout>,
}

impl CalendarSnapshot {
    /// Look up a campsite by id
    pub fn campsite(&self, id: &str) -> Option<&Campsite> {
        self.campsites.iter().find(|c| c.id == id)
    }

    /// Look up a reservation by id
    pub fn reservation(&self, id: &str) -> Option<&Reservation> {
        self.reservations.iter().find(|r| r.id == id)
    }

    /// Look up a blackout by id
    pub fn blackout(&self, id: &str) -> Option<&Blackout> {
        self.blackouts.iter().find(|b| b.id == id)
    }

    /// Keys of every entity currently carrying the saving marker
    pub fn saving_keys(&self) -> Vec<EntityKey> {
        let reservations = self
            .reservations
            .iter()
            .filter(|r| r.saving)
            .map(|r| EntityKey::Reservation(r.id.clone()));
        let blackouts = self
            .blackouts
            .iter()
            .filter(|b| b.saving)
            .map(|b| EntityKey::Blackout(b.id.clone()));

        reservations.chain(blackouts).collect()
    }

    /// Identifiers that appear more than once within one collection
    pub fn duplicate_ids(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        let mut duplicates = Vec::new();

        for key in self
            .reservations
            .iter()
            .map(|r| EntityKey::Reservation(r.id.clone()))
            .chain(self.blackouts.iter().map(|b| EntityKey::Blackout(b.id.clone())))
        {
            if !seen.insert(key.clone()) {
                duplicates.push(key.id().to_string());
            }
        }

        duplicates
    }
}
