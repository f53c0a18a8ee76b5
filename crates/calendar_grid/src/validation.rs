use std::collections::HashMap;
use std::sync::Arc;

use campground_model::{
    Blackout, CalendarSnapshot, Campsite, CampsiteId, DaySpan, MonthRange, Placement, Reservation,
};
use chrono::NaiveDate;

use crate::RowKey;

/// Which kind of entity a candidate would become
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Nights `[start, end)`
    Reservation,
    /// Days `[start, end]`
    Blackout,
}

/// A proposed placement for a reservation or blackout
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    /// Kind of entity, which decides whether `end` is inclusive
    pub kind: ItemKind,
    /// Entity being moved, excluded from its own conflict checks
    pub exclude_id: Option<&'a str>,
    /// Target of the candidate
    pub placement: &'a Placement,
    /// Proposed start
    pub start: NaiveDate,
    /// Proposed end, exclusive for reservations and inclusive for blackouts
    pub end: NaiveDate,
}

impl Candidate<'_> {
    /// Days the candidate would occupy
    pub fn days(&self) -> DaySpan {
        match self.kind {
            ItemKind::Reservation => DaySpan::from_half_open(self.start, self.end),
            ItemKind::Blackout => DaySpan::new(self.start, self.end),
        }
    }

    fn meets_minimum_duration(&self) -> bool {
        match self.kind {
            ItemKind::Reservation => self.end > self.start,
            ItemKind::Blackout => self.end >= self.start,
        }
    }
}

/// Why a candidate cannot be placed. The `Display` text is shown inline on the ghost.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The target campsite is not in the snapshot
    #[error("Campsite not found")]
    UnknownCampsite(CampsiteId),

    /// The target campsite no longer accepts bookings
    #[error("Campsite {code} is inactive")]
    InactiveCampsite {
        /// Display code of the campsite
        code: String,
    },

    /// Another reservation holds some of the candidate's nights
    #[error("Dates conflict with reservation for {guest}")]
    ReservationConflict {
        /// Conflicting reservation
        reservation_id: String,
        /// Guest on the conflicting reservation
        guest: String,
    },

    /// A blackout covers some of the candidate's days
    #[error("Dates conflict with blackout: {reason}")]
    BlackoutConflict {
        /// Conflicting blackout
        blackout_id: String,
        /// Reason recorded on the blackout
        reason: String,
    },

    /// The candidate is shorter than one night
    #[error("Minimum 1 night required")]
    MinimumDuration,

    /// The candidate leaves the displayed month
    #[error("Dates are out of month range")]
    OutOfMonthRange,
}

/// Read-only view of a calendar snapshot indexed by campsite.
///
/// Per-site lists are sorted by start date so a check only walks the target
/// row up to the candidate's last day.
#[derive(Debug, Clone)]
pub struct OccupancyIndex {
    snapshot: Arc<CalendarSnapshot>,
    campsites: HashMap<CampsiteId, usize>,
    reservations_by_site: HashMap<CampsiteId, Vec<usize>>,
    blackouts_by_site: HashMap<CampsiteId, Vec<usize>>,
    global_blackouts: Vec<usize>,
    display_window: Option<MonthRange>,
}

impl OccupancyIndex {
    /// Index `snapshot`
    pub fn new(snapshot: Arc<CalendarSnapshot>) -> Self {
        let campsites = snapshot
            .campsites
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();

        let mut reservations_by_site: HashMap<CampsiteId, Vec<usize>> = HashMap::new();
        for (i, reservation) in snapshot.reservations.iter().enumerate() {
            if !reservation.status.blocks_occupancy() {
                continue;
            }
            if let Some(site) = &reservation.campsite_id {
                reservations_by_site.entry(site.clone()).or_default().push(i);
            }
        }
        for list in reservations_by_site.values_mut() {
            list.sort_by_key(|&i| snapshot.reservations[i].check_in);
        }

        let mut blackouts_by_site: HashMap<CampsiteId, Vec<usize>> = HashMap::new();
        let mut global_blackouts = Vec::new();
        for (i, blackout) in snapshot.blackouts.iter().enumerate() {
            match &blackout.campsite_id {
                Some(site) => blackouts_by_site.entry(site.clone()).or_default().push(i),
                None => global_blackouts.push(i),
            }
        }
        for list in blackouts_by_site.values_mut() {
            list.sort_by_key(|&i| snapshot.blackouts[i].start_date);
        }
        global_blackouts.sort_by_key(|&i| snapshot.blackouts[i].start_date);

        Self {
            snapshot,
            campsites,
            reservations_by_site,
            blackouts_by_site,
            global_blackouts,
            display_window: None,
        }
    }

    /// Index an owned snapshot
    pub fn from_snapshot(snapshot: CalendarSnapshot) -> Self {
        Self::new(Arc::new(snapshot))
    }

    /// Restrict candidates to the days of `month`
    pub fn with_display_window(mut self, month: MonthRange) -> Self {
        self.display_window = Some(month);
        self
    }

    /// Change or clear the display window restriction
    pub fn set_display_window(&mut self, month: Option<MonthRange>) {
        self.display_window = month;
    }

    /// The indexed snapshot
    pub fn snapshot(&self) -> &Arc<CalendarSnapshot> {
        &self.snapshot
    }

    /// Look up a campsite
    pub fn campsite(&self, id: &str) -> Option<&Campsite> {
        self.campsites.get(id).map(|&i| &self.snapshot.campsites[i])
    }

    /// Campsites in row order: `sort_order`, then code
    pub fn sorted_campsites(&self) -> Vec<&Campsite> {
        let mut sites: Vec<&Campsite> = self.snapshot.campsites.iter().collect();
        sites.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.code.cmp(&b.code)));
        sites
    }

    /// Check a candidate. The first failing rule decides the error.
    pub fn validate(&self, candidate: &Candidate<'_>) -> Result<(), ValidationError> {
        self.check(candidate, self.display_window.as_ref(), true)
    }

    /// Check an edge resize. The block keeps its row, so the campsite is not
    /// required to still be active.
    pub fn validate_resize(&self, candidate: &Candidate<'_>) -> Result<(), ValidationError> {
        self.check(candidate, self.display_window.as_ref(), false)
    }

    fn check(
        &self,
        candidate: &Candidate<'_>,
        window: Option<&MonthRange>,
        require_active: bool,
    ) -> Result<(), ValidationError> {
        let days = candidate.days();

        match candidate.placement {
            Placement::Unassigned => {
                // No conflicts exist on the unassigned row, but a stay still needs a night.
                if !candidate.meets_minimum_duration() {
                    return Err(ValidationError::MinimumDuration);
                }
                return Ok(());
            }
            Placement::Site(site_id) => {
                if require_active {
                    let site = self
                        .campsite(site_id)
                        .ok_or_else(|| ValidationError::UnknownCampsite(site_id.clone()))?;
                    if !site.is_active {
                        return Err(ValidationError::InactiveCampsite {
                            code: site.code.clone(),
                        });
                    }
                }

                if let Some(conflict) =
                    self.reservation_conflict(site_id, &days, candidate.exclude_id)
                {
                    return Err(ValidationError::ReservationConflict {
                        reservation_id: conflict.id.clone(),
                        guest: conflict.guest_name(),
                    });
                }

                if let Some(conflict) =
                    self.blackout_conflict(Some(site_id), &days, candidate.exclude_id)
                {
                    return Err(ValidationError::BlackoutConflict {
                        blackout_id: conflict.id.clone(),
                        reason: conflict.reason.clone(),
                    });
                }
            }
            Placement::AllSites => {
                for site in self.sorted_campsites() {
                    if let Some(conflict) =
                        self.reservation_conflict(&site.id, &days, candidate.exclude_id)
                    {
                        return Err(ValidationError::ReservationConflict {
                            reservation_id: conflict.id.clone(),
                            guest: conflict.guest_name(),
                        });
                    }
                }

                if let Some(conflict) = self.blackout_conflict(None, &days, candidate.exclude_id) {
                    return Err(ValidationError::BlackoutConflict {
                        blackout_id: conflict.id.clone(),
                        reason: conflict.reason.clone(),
                    });
                }
            }
        }

        if !candidate.meets_minimum_duration() {
            return Err(ValidationError::MinimumDuration);
        }

        if let Some(month) = window {
            if !month.span().covers(&days) {
                return Err(ValidationError::OutOfMonthRange);
            }
        }

        Ok(())
    }

    /// First reservation on `site_id` overlapping `days`, other than `exclude_id`
    pub fn reservation_conflict(
        &self,
        site_id: &str,
        days: &DaySpan,
        exclude_id: Option<&str>,
    ) -> Option<&Reservation> {
        if days.is_empty() {
            return None;
        }

        self.reservations_by_site
            .get(site_id)?
            .iter()
            .map(|&i| &self.snapshot.reservations[i])
            .take_while(|r| r.check_in <= days.last)
            .filter(|r| Some(r.id.as_str()) != exclude_id)
            .find(|r| r.days().overlaps(days))
    }

    /// First blackout overlapping `days` that applies to `site_id`.
    ///
    /// With `site_id == None` every blackout is considered, which is how a global
    /// blackout candidate is checked.
    pub fn blackout_conflict(
        &self,
        site_id: Option<&str>,
        days: &DaySpan,
        exclude_id: Option<&str>,
    ) -> Option<&Blackout> {
        if days.is_empty() {
            return None;
        }

        let scoped: Box<dyn Iterator<Item = &usize>> = match site_id {
            Some(site) => Box::new(
                self.blackouts_by_site
                    .get(site)
                    .into_iter()
                    .flatten()
                    .chain(self.global_blackouts.iter()),
            ),
            None => Box::new(
                self.blackouts_by_site
                    .values()
                    .flatten()
                    .chain(self.global_blackouts.iter()),
            ),
        };

        scoped
            .map(|&i| &self.snapshot.blackouts[i])
            .filter(|b| Some(b.id.as_str()) != exclude_id)
            .find(|b| b.days().overlaps(days))
    }

    /// Whether `date` on `row` is already taken by a reservation or blackout
    pub fn is_day_occupied(&self, row: &RowKey, date: NaiveDate) -> bool {
        let RowKey::Site(site_id) = row else {
            return false;
        };

        let day = DaySpan::new(date, date);
        self.reservation_conflict(site_id, &day, None).is_some()
            || self.blackout_conflict(Some(site_id), &day, None).is_some()
    }

    /// Whether a new range may start or extend into this cell
    pub fn is_cell_selectable(&self, row: &RowKey, date: NaiveDate) -> bool {
        match row {
            RowKey::Site(site_id) => {
                self.campsite(site_id).is_some_and(|site| site.is_active)
                    && !self.is_day_occupied(row, date)
            }
            RowKey::Unassigned => false,
        }
    }

    /// Active campsites that fit `guests` and are free for the nights `[start, end)`, in row order
    pub fn available_sites(&self, start: NaiveDate, end: NaiveDate, guests: u32) -> Vec<&Campsite> {
        self.sorted_campsites()
            .into_iter()
            .filter(|site| site.is_active && site.max_guests >= guests)
            .filter(|site| {
                let placement = Placement::Site(site.id.clone());
                let candidate = Candidate {
                    kind: ItemKind::Reservation,
                    exclude_id: None,
                    placement: &placement,
                    start,
                    end,
                };
                self.check(&candidate, None, true).is_ok()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campground_model::{CampingUnit, CampsiteType, ReservationStatus};

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn site(id: &str, code: &str, active: bool) -> Campsite {
        Campsite {
            id: id.to_string(),
            code: code.to_string(),
            name: format!("Site {}", code),
            campsite_type: CampsiteType::Rv,
            max_guests: 6,
            sort_order: 0,
            notes: None,
            is_active: active,
        }
    }

    fn booking(id: &str, site: Option<&str>, start: &str, end: &str) -> Reservation {
        Reservation {
            id: id.to_string(),
            campsite_id: site.map(str::to_string),
            check_in: date(start),
            check_out: date(end),
            status: ReservationStatus::Confirmed,
            first_name: "Guest".to_string(),
            last_name: id.to_uppercase(),
            email: None,
            phone: None,
            contact_method: None,
            adults: 2,
            children: 0,
            camping_unit: CampingUnit::PullTrailer,
            rv_length: None,
            rv_year: None,
            saving: false,
        }
    }

    fn blackout(id: &str, site: Option<&str>, start: &str, end: &str) -> Blackout {
        Blackout {
            id: id.to_string(),
            campsite_id: site.map(str::to_string),
            start_date: date(start),
            end_date: date(end),
            reason: "Maintenance".to_string(),
            saving: false,
        }
    }

    fn reservation_candidate<'a>(
        exclude: Option<&'a str>,
        placement: &'a Placement,
        start: &str,
        end: &str,
    ) -> Candidate<'a> {
        Candidate {
            kind: ItemKind::Reservation,
            exclude_id: exclude,
            placement,
            start: date(start),
            end: date(end),
        }
    }

    fn blackout_candidate<'a>(placement: &'a Placement, start: &str, end: &str) -> Candidate<'a> {
        Candidate {
            kind: ItemKind::Blackout,
            exclude_id: None,
            placement,
            start: date(start),
            end: date(end),
        }
    }

    fn r1() -> Placement {
        Placement::Site("r1".to_string())
    }

    #[test]
    fn test_half_open_overlap_between_bookings() {
        let index = OccupancyIndex::from_snapshot(CalendarSnapshot {
            campsites: vec![site("r1", "S1", true)],
            reservations: vec![
                booking("a", Some("r1"), "2024-06-01", "2024-06-04"),
                booking("b", Some("r1"), "2024-06-10", "2024-06-12"),
            ],
            blackouts: vec![],
        });
        let target = r1();

        // a moved onto b's nights
        let overlapping = reservation_candidate(Some("a"), &target, "2024-06-09", "2024-06-11");
        assert!(matches!(
            index.validate(&overlapping),
            Err(ValidationError::ReservationConflict { ref reservation_id, .. }) if reservation_id == "b"
        ));

        // checking out the day b checks in is fine
        let touching = reservation_candidate(Some("a"), &target, "2024-06-07", "2024-06-10");
        assert_eq!(index.validate(&touching), Ok(()));

        // checking in the day b checks out is fine
        let after = reservation_candidate(Some("a"), &target, "2024-06-12", "2024-06-14");
        assert_eq!(index.validate(&after), Ok(()));
    }

    #[test]
    fn test_moving_item_ignores_itself() {
        let index = OccupancyIndex::from_snapshot(CalendarSnapshot {
            campsites: vec![site("r1", "S1", true)],
            reservations: vec![booking("a", Some("r1"), "2024-06-01", "2024-06-05")],
            blackouts: vec![],
        });
        let target = r1();
        let shifted = reservation_candidate(Some("a"), &target, "2024-06-02", "2024-06-06");
        assert_eq!(index.validate(&shifted), Ok(()));
    }

    #[test]
    fn test_cancelled_and_no_show_do_not_block() {
        let mut cancelled = booking("c", Some("r1"), "2024-06-01", "2024-06-05");
        cancelled.status = ReservationStatus::Cancelled;
        let mut no_show = booking("n", Some("r1"), "2024-06-01", "2024-06-05");
        no_show.status = ReservationStatus::NoShow;

        let index = OccupancyIndex::from_snapshot(CalendarSnapshot {
            campsites: vec![site("r1", "S1", true)],
            reservations: vec![cancelled, no_show],
            blackouts: vec![],
        });
        let target = r1();
        let candidate = reservation_candidate(None, &target, "2024-06-02", "2024-06-04");
        assert_eq!(index.validate(&candidate), Ok(()));
    }

    #[test]
    fn test_error_names_conflicting_guest() {
        let index = OccupancyIndex::from_snapshot(CalendarSnapshot {
            campsites: vec![site("r1", "S1", true)],
            reservations: vec![booking("b1", Some("r1"), "2024-07-10", "2024-07-12")],
            blackouts: vec![],
        });
        let target = r1();
        let candidate = reservation_candidate(None, &target, "2024-07-11", "2024-07-13");
        let error = index.validate(&candidate).unwrap_err();
        assert_eq!(error.to_string(), "Dates conflict with reservation for Guest B1");
    }

    #[test]
    fn test_unassigned_target_skips_conflicts() {
        let index = OccupancyIndex::from_snapshot(CalendarSnapshot {
            campsites: vec![],
            reservations: vec![
                booking("a", None, "2024-06-01", "2024-06-05"),
                booking("b", None, "2024-06-01", "2024-06-05"),
            ],
            blackouts: vec![blackout("x", None, "2024-06-01", "2024-06-30")],
        })
        .with_display_window(MonthRange::new(2024, 6).unwrap());

        let target = Placement::Unassigned;
        let candidate = reservation_candidate(Some("a"), &target, "2024-06-02", "2024-06-04");
        assert_eq!(index.validate(&candidate), Ok(()));
    }

    #[test]
    fn test_inactive_and_unknown_sites() {
        let index = OccupancyIndex::from_snapshot(CalendarSnapshot {
            campsites: vec![site("r1", "S1", false)],
            reservations: vec![],
            blackouts: vec![],
        });

        let inactive = r1();
        let candidate = reservation_candidate(None, &inactive, "2024-06-02", "2024-06-04");
        assert_eq!(
            index.validate(&candidate),
            Err(ValidationError::InactiveCampsite {
                code: "S1".to_string()
            })
        );

        let missing = Placement::Site("nope".to_string());
        let candidate = reservation_candidate(None, &missing, "2024-06-02", "2024-06-04");
        assert!(matches!(
            index.validate(&candidate),
            Err(ValidationError::UnknownCampsite(_))
        ));
    }

    #[test]
    fn test_blackout_next_to_booking_checkout_day() {
        let index = OccupancyIndex::from_snapshot(CalendarSnapshot {
            campsites: vec![site("r1", "S1", true)],
            reservations: vec![booking("b1", Some("r1"), "2024-07-10", "2024-07-12")],
            blackouts: vec![],
        });
        let target = r1();

        let overlapping = blackout_candidate(&target, "2024-07-11", "2024-07-13");
        let error = index.validate(&overlapping).unwrap_err();
        assert!(error.to_string().contains("conflict"));

        let touching = blackout_candidate(&target, "2024-07-12", "2024-07-14");
        assert_eq!(index.validate(&touching), Ok(()));
    }

    #[test]
    fn test_global_blackout_blocks_every_site() {
        let index = OccupancyIndex::from_snapshot(CalendarSnapshot {
            campsites: vec![site("r1", "S1", true), site("r2", "S2", true)],
            reservations: vec![],
            blackouts: vec![blackout("xmas", None, "2024-12-24", "2024-12-26")],
        });

        for id in ["r1", "r2"] {
            let target = Placement::Site(id.to_string());
            let candidate = reservation_candidate(None, &target, "2024-12-26", "2024-12-28");
            assert!(matches!(
                index.validate(&candidate),
                Err(ValidationError::BlackoutConflict { ref blackout_id, .. }) if blackout_id == "xmas"
            ));
        }

        // leaving on the first blackout day is fine: that night is not stayed
        let target = Placement::Site("r2".to_string());
        let before = reservation_candidate(None, &target, "2024-12-22", "2024-12-24");
        assert_eq!(index.validate(&before), Ok(()));
    }

    #[test]
    fn test_global_blackout_candidate_checks_all_sites() {
        let index = OccupancyIndex::from_snapshot(CalendarSnapshot {
            campsites: vec![site("r1", "S1", true), site("r2", "S2", true)],
            reservations: vec![booking("late", Some("r2"), "2024-12-20", "2024-12-25")],
            blackouts: vec![],
        });
        let target = Placement::AllSites;
        let candidate = blackout_candidate(&target, "2024-12-24", "2024-12-26");
        assert!(matches!(
            index.validate(&candidate),
            Err(ValidationError::ReservationConflict { .. })
        ));
    }

    #[test]
    fn test_minimum_duration() {
        let index = OccupancyIndex::from_snapshot(CalendarSnapshot {
            campsites: vec![site("r1", "S1", true)],
            reservations: vec![booking("a", Some("r1"), "2024-06-10", "2024-06-11")],
            blackouts: vec![],
        });
        let target = r1();

        let zero = reservation_candidate(Some("a"), &target, "2024-06-10", "2024-06-10");
        let error = index.validate(&zero).unwrap_err();
        assert_eq!(error, ValidationError::MinimumDuration);
        assert_eq!(error.to_string(), "Minimum 1 night required");

        let one = reservation_candidate(Some("a"), &target, "2024-06-10", "2024-06-11");
        assert_eq!(index.validate(&one), Ok(()));

        let single_day_blackout = blackout_candidate(&target, "2024-06-20", "2024-06-20");
        assert_eq!(index.validate(&single_day_blackout), Ok(()));
    }

    #[test]
    fn test_resize_on_inactive_site_only_checks_conflicts() {
        let index = OccupancyIndex::from_snapshot(CalendarSnapshot {
            campsites: vec![site("r1", "S1", false)],
            reservations: vec![
                booking("a", Some("r1"), "2024-06-01", "2024-06-04"),
                booking("b", Some("r1"), "2024-06-06", "2024-06-08"),
            ],
            blackouts: vec![],
        });
        let target = r1();

        let longer = reservation_candidate(Some("a"), &target, "2024-06-01", "2024-06-06");
        assert_eq!(index.validate_resize(&longer), Ok(()));

        let into_b = reservation_candidate(Some("a"), &target, "2024-06-01", "2024-06-07");
        assert!(matches!(
            index.validate_resize(&into_b),
            Err(ValidationError::ReservationConflict { .. })
        ));
    }

    #[test]
    fn test_display_window() {
        let index = OccupancyIndex::from_snapshot(CalendarSnapshot {
            campsites: vec![site("r1", "S1", true)],
            reservations: vec![],
            blackouts: vec![],
        })
        .with_display_window(MonthRange::new(2024, 6).unwrap());
        let target = r1();

        let spills = reservation_candidate(None, &target, "2024-06-29", "2024-07-03");
        assert_eq!(
            index.validate(&spills),
            Err(ValidationError::OutOfMonthRange)
        );

        // checking out on July 1st keeps every night in June
        let last_night = reservation_candidate(None, &target, "2024-06-29", "2024-07-01");
        assert_eq!(index.validate(&last_night), Ok(()));
    }

    #[test]
    fn test_cell_selectability() {
        let index = OccupancyIndex::from_snapshot(CalendarSnapshot {
            campsites: vec![site("r1", "S1", true), site("r2", "S2", false)],
            reservations: vec![booking("a", Some("r1"), "2024-06-10", "2024-06-12")],
            blackouts: vec![blackout("x", Some("r1"), "2024-06-20", "2024-06-20")],
        });
        let r1_row = RowKey::Site("r1".to_string());

        assert!(index.is_day_occupied(&r1_row, date("2024-06-11")));
        assert!(!index.is_day_occupied(&r1_row, date("2024-06-12")));
        assert!(index.is_day_occupied(&r1_row, date("2024-06-20")));
        assert!(index.is_cell_selectable(&r1_row, date("2024-06-12")));
        assert!(!index.is_cell_selectable(&RowKey::Site("r2".to_string()), date("2024-06-01")));
        assert!(!index.is_cell_selectable(&RowKey::Unassigned, date("2024-06-01")));
    }

    #[test]
    fn test_available_sites_respects_capacity_and_conflicts() {
        let mut small = site("r3", "S3", true);
        small.max_guests = 2;
        let mut first = site("r2", "S2", true);
        first.sort_order = -1;

        let index = OccupancyIndex::from_snapshot(CalendarSnapshot {
            campsites: vec![site("r1", "S1", true), first, small],
            reservations: vec![booking("a", Some("r1"), "2024-06-10", "2024-06-12")],
            blackouts: vec![],
        });

        let sites: Vec<&str> = index
            .available_sites(date("2024-06-11"), date("2024-06-13"), 4)
            .into_iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(sites, vec!["r2"]);

        let sites: Vec<&str> = index
            .available_sites(date("2024-06-12"), date("2024-06-13"), 2)
            .into_iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(sites, vec!["r2", "r1", "r3"]);
    }
}
