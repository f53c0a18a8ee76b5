use std::future::Future;
use std::sync::Arc;

use campground_model::{Blackout, BlackoutDraft, BlackoutId, CalendarSnapshot, EntityKey, Reservation};
use futures_util::future::{Abortable, Aborted};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::{ApiError, RescheduleRequest, RescheduleResponse, SyncError};

/// A local change that can be shown before the server confirms it.
///
/// `apply` captures whatever baseline `rollback` needs. `reconcile` and
/// `rollback` are only ever called after `apply`, and at most one of them.
pub trait OptimisticPatch: Send {
    /// What the server returns on success
    type Output: Send;

    /// Entity the patch touches, used to supersede older requests
    fn key(&self) -> EntityKey;

    /// Short description for logs and notices
    fn describe(&self) -> String;

    /// Show the change locally
    fn apply(&mut self, snapshot: &mut CalendarSnapshot);

    /// Replace the optimistic copy with what the server stored
    fn reconcile(&self, snapshot: &mut CalendarSnapshot, output: &Self::Output);

    /// Restore the baseline captured by `apply`
    fn rollback(&self, snapshot: &mut CalendarSnapshot);
}

/// Apply `patch`, await `request`, then reconcile or roll back.
///
/// An aborted request leaves the snapshot exactly as the patch left it: the
/// request that aborted it owns the entity from then on.
pub async fn attempt<P, F>(
    state: &watch::Sender<Arc<CalendarSnapshot>>,
    mut patch: P,
    request: Abortable<F>,
) -> Result<P::Output, SyncError>
where
    P: OptimisticPatch,
    F: Future<Output = Result<P::Output, ApiError>>,
{
    state.send_modify(|snapshot| patch.apply(Arc::make_mut(snapshot)));
    debug!("Applied optimistic patch: {}", patch.describe());

    match request.await {
        Err(Aborted) => {
            debug!("Superseded: {}", patch.describe());
            Err(SyncError::Superseded)
        }
        Ok(Err(e)) => {
            warn!("Rolling back {}: {}", patch.describe(), e);
            state.send_modify(|snapshot| patch.rollback(Arc::make_mut(snapshot)));
            Err(e.into())
        }
        Ok(Ok(output)) => {
            state.send_modify(|snapshot| patch.reconcile(Arc::make_mut(snapshot), &output));
            Ok(output)
        }
    }
}

fn restore<T: Clone>(items: &mut Vec<T>, baseline: &Option<(usize, T)>, is_same: impl Fn(&T) -> bool) {
    let Some((index, original)) = baseline else {
        return;
    };

    match items.iter().position(is_same) {
        Some(current) => items[current] = original.clone(),
        None => items.insert((*index).min(items.len()), original.clone()),
    }
}

/// Create a blackout under a temporary id
#[derive(Debug)]
pub struct CreateBlackoutPatch {
    draft: BlackoutDraft,
    temp_id: BlackoutId,
}

impl CreateBlackoutPatch {
    /// Patch showing `draft` as a saving blackout named `temp_id`
    pub fn new(draft: BlackoutDraft, temp_id: BlackoutId) -> Self {
        Self { draft, temp_id }
    }

    /// Identifier the blackout carries until the server answers
    pub fn temp_id(&self) -> &str {
        &self.temp_id
    }
}

impl OptimisticPatch for CreateBlackoutPatch {
    type Output = Blackout;

    fn key(&self) -> EntityKey {
        EntityKey::Blackout(self.temp_id.clone())
    }

    fn describe(&self) -> String {
        format!(
            "create blackout {} ({} - {})",
            self.temp_id, self.draft.start_date, self.draft.end_date
        )
    }

    fn apply(&mut self, snapshot: &mut CalendarSnapshot) {
        let mut blackout = Blackout::from_draft(self.temp_id.clone(), &self.draft);
        blackout.saving = true;
        snapshot.blackouts.push(blackout);
    }

    fn reconcile(&self, snapshot: &mut CalendarSnapshot, output: &Blackout) {
        let mut stored = output.clone();
        stored.saving = false;

        // A refresh may already have brought the real entity in.
        if snapshot.blackout(&stored.id).is_some() {
            snapshot.blackouts.retain(|b| b.id != self.temp_id);
            if let Some(existing) = snapshot.blackouts.iter_mut().find(|b| b.id == stored.id) {
                *existing = stored;
            }
            return;
        }

        match snapshot.blackouts.iter().position(|b| b.id == self.temp_id) {
            Some(index) => snapshot.blackouts[index] = stored,
            None => snapshot.blackouts.push(stored),
        }
    }

    fn rollback(&self, snapshot: &mut CalendarSnapshot) {
        snapshot.blackouts.retain(|b| b.id != self.temp_id);
    }
}

/// Overwrite the editable fields of an existing blackout
#[derive(Debug)]
pub struct UpdateBlackoutPatch {
    id: BlackoutId,
    draft: BlackoutDraft,
    baseline: Option<(usize, Blackout)>,
}

impl UpdateBlackoutPatch {
    /// Patch replacing blackout `id` with `draft`
    pub fn new(id: BlackoutId, draft: BlackoutDraft) -> Self {
        Self {
            id,
            draft,
            baseline: None,
        }
    }
}

impl OptimisticPatch for UpdateBlackoutPatch {
    type Output = Blackout;

    fn key(&self) -> EntityKey {
        EntityKey::Blackout(self.id.clone())
    }

    fn describe(&self) -> String {
        format!("update blackout {}", self.id)
    }

    fn apply(&mut self, snapshot: &mut CalendarSnapshot) {
        let Some(index) = snapshot.blackouts.iter().position(|b| b.id == self.id) else {
            return;
        };

        let blackout = &mut snapshot.blackouts[index];
        self.baseline = Some((index, blackout.clone()));
        blackout.apply_draft(&self.draft);
        blackout.saving = true;
    }

    fn reconcile(&self, snapshot: &mut CalendarSnapshot, output: &Blackout) {
        let mut stored = output.clone();
        stored.saving = false;

        match snapshot.blackouts.iter_mut().find(|b| b.id == self.id) {
            Some(blackout) => *blackout = stored,
            None => snapshot.blackouts.push(stored),
        }
    }

    fn rollback(&self, snapshot: &mut CalendarSnapshot) {
        restore(&mut snapshot.blackouts, &self.baseline, |b| b.id == self.id);
    }
}

/// Remove a blackout
#[derive(Debug)]
pub struct DeleteBlackoutPatch {
    id: BlackoutId,
    baseline: Option<(usize, Blackout)>,
}

impl DeleteBlackoutPatch {
    /// Patch hiding blackout `id`
    pub fn new(id: BlackoutId) -> Self {
        Self { id, baseline: None }
    }
}

impl OptimisticPatch for DeleteBlackoutPatch {
    type Output = ();

    fn key(&self) -> EntityKey {
        EntityKey::Blackout(self.id.clone())
    }

    fn describe(&self) -> String {
        format!("delete blackout {}", self.id)
    }

    fn apply(&mut self, snapshot: &mut CalendarSnapshot) {
        if let Some(index) = snapshot.blackouts.iter().position(|b| b.id == self.id) {
            let removed = snapshot.blackouts.remove(index);
            self.baseline = Some((index, removed));
        }
    }

    fn reconcile(&self, snapshot: &mut CalendarSnapshot, _output: &()) {
        snapshot.blackouts.retain(|b| b.id != self.id);
    }

    fn rollback(&self, snapshot: &mut CalendarSnapshot) {
        restore(&mut snapshot.blackouts, &self.baseline, |b| b.id == self.id);
    }
}

/// Move and/or re-date a reservation
#[derive(Debug)]
pub struct ReschedulePatch {
    request: RescheduleRequest,
    baseline: Option<(usize, Reservation)>,
}

impl ReschedulePatch {
    /// Patch showing the reservation where `request` puts it
    pub fn new(request: RescheduleRequest) -> Self {
        Self {
            request,
            baseline: None,
        }
    }
}

impl OptimisticPatch for ReschedulePatch {
    type Output = RescheduleResponse;

    fn key(&self) -> EntityKey {
        EntityKey::Reservation(self.request.reservation_id.clone())
    }

    fn describe(&self) -> String {
        format!(
            "reschedule reservation {} ({} - {})",
            self.request.reservation_id, self.request.check_in, self.request.check_out
        )
    }

    fn apply(&mut self, snapshot: &mut CalendarSnapshot) {
        let id = &self.request.reservation_id;
        let Some(index) = snapshot.reservations.iter().position(|r| &r.id == id) else {
            return;
        };

        let reservation = &mut snapshot.reservations[index];
        self.baseline = Some((index, reservation.clone()));
        reservation.campsite_id = self.request.campsite_id.clone();
        reservation.check_in = self.request.check_in;
        reservation.check_out = self.request.check_out;
        reservation.saving = true;
    }

    fn reconcile(&self, snapshot: &mut CalendarSnapshot, output: &RescheduleResponse) {
        let mut stored = output.reservation.clone();
        stored.saving = false;

        let id = &self.request.reservation_id;
        match snapshot.reservations.iter_mut().find(|r| &r.id == id) {
            Some(reservation) => *reservation = stored,
            None => snapshot.reservations.push(stored),
        }
    }

    fn rollback(&self, snapshot: &mut CalendarSnapshot) {
        let id = &self.request.reservation_id;
        restore(&mut snapshot.reservations, &self.baseline, |r| &r.id == id);
    }
}
