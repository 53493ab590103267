//! Per-screen state. Each struct owns its loading flags and knows how to
//! take a reply; `app` decides when to fetch.

use crate::complaint::{
    patch_status, Complaint, ComplaintId, ComplaintStatus, StatusCounts, StatusFilter,
};
use crate::location::{Block, BlockId, Floor, FloorId, InfrastructureCounts, LocationSelection};
use crate::multipart::ImageAttachment;
use crate::user::{UserId, UserProfile};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthForms {
    pub login_loading: bool,
    pub signup_loading: bool,
}

/// A fetched list with the two flavours of spinner the shell shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintList {
    items: Vec<Complaint>,
    loading: bool,
    refreshing: bool,
    loaded: bool,
}

impl ComplaintList {
    /// Pull-to-refresh keeps the current items on screen; a first load shows
    /// the full-screen spinner.
    pub fn begin_fetch(&mut self, refresh: bool) {
        if refresh && self.loaded {
            self.refreshing = true;
        } else {
            self.loading = true;
        }
    }

    pub fn finish(&mut self, items: Vec<Complaint>) {
        self.items = items;
        self.loaded = true;
        self.loading = false;
        self.refreshing = false;
    }

    pub fn fail(&mut self) {
        self.loading = false;
        self.refreshing = false;
    }

    pub fn patch_status(&mut self, id: ComplaintId, status: ComplaintStatus) -> usize {
        patch_status(&mut self.items, id, status)
    }

    #[must_use]
    pub fn find(&self, id: ComplaintId) -> Option<&Complaint> {
        self.items.iter().find(|c| c.id == id)
    }

    #[must_use]
    pub fn items(&self) -> &[Complaint] {
        &self.items
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminBoard {
    pub list: ComplaintList,
    pub filter: StatusFilter,
}

impl AdminBoard {
    #[must_use]
    pub fn visible(&self) -> Vec<&Complaint> {
        self.filter.apply(self.list.items())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportForm {
    pub selection: LocationSelection,
    pub image: Option<ImageAttachment>,
    pub blocks_loading: bool,
    pub floors_loading: bool,
    pub rooms_loading: bool,
    pub submitting: bool,
    /// Set between the create reply and the end of the photo upload.
    pub uploading_for: Option<ComplaintId>,
}

impl ReportForm {
    /// Back to an empty form; the loaded block list stays.
    pub fn reset(&mut self) {
        self.selection.clear_selection();
        self.image = None;
        self.floors_loading = false;
        self.rooms_loading = false;
        self.submitting = false;
        self.uploading_for = None;
    }
}

/// A complaint pushed over the tabs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailState {
    pub complaint: Complaint,
    pub status_loading: bool,
    pub feedback_loading: bool,
}

impl DetailState {
    #[must_use]
    pub fn new(complaint: Complaint) -> Self {
        Self {
            complaint,
            status_loading: false,
            feedback_loading: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> ComplaintId {
        self.complaint.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Infrastructure {
    pub blocks: Vec<Block>,
    pub loading: bool,
    pub loaded: bool,
    pub floor_form_block: Option<BlockId>,
    pub room_form_block: Option<BlockId>,
    pub room_form_floors: Vec<Floor>,
    pub room_form_floor: Option<FloorId>,
    pub room_form_floors_loading: bool,
}

impl Infrastructure {
    pub fn accept_blocks(&mut self, blocks: Vec<Block>) {
        self.blocks = blocks;
        self.loading = false;
        self.loaded = true;
        let known = |id: BlockId| self.blocks.iter().any(|b| b.id == id);
        if self.floor_form_block.is_some_and(|id| !known(id)) {
            self.floor_form_block = None;
        }
        if self.room_form_block.is_some_and(|id| !known(id)) {
            self.clear_room_form();
        }
    }

    /// Picks the block for the room form and forgets its floor list.
    /// Returns `false` for an unknown block.
    pub fn select_room_form_block(&mut self, id: BlockId) -> bool {
        if !self.blocks.iter().any(|b| b.id == id) {
            return false;
        }
        self.room_form_block = Some(id);
        self.room_form_floors.clear();
        self.room_form_floor = None;
        self.room_form_floors_loading = true;
        true
    }

    /// Floors for a block the room form no longer shows are dropped.
    pub fn accept_room_form_floors(&mut self, block: BlockId, floors: Vec<Floor>) -> bool {
        if self.room_form_block != Some(block) {
            return false;
        }
        self.room_form_floors = floors;
        self.room_form_floors_loading = false;
        true
    }

    pub fn select_room_form_floor(&mut self, id: FloorId) -> bool {
        if !self.room_form_floors.iter().any(|f| f.id == id) {
            return false;
        }
        self.room_form_floor = Some(id);
        true
    }

    pub fn clear_room_form(&mut self) {
        self.room_form_block = None;
        self.room_form_floors.clear();
        self.room_form_floor = None;
        self.room_form_floors_loading = false;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAdmin {
    pub users: Vec<UserProfile>,
    pub loading: bool,
    pub loaded: bool,
    /// Users with a delete or role change in flight.
    pub busy: Vec<UserId>,
}

impl UserAdmin {
    #[must_use]
    pub fn find(&self, id: UserId) -> Option<&UserProfile> {
        self.users.iter().find(|u| u.id == id)
    }

    #[must_use]
    pub fn is_busy(&self, id: UserId) -> bool {
        self.busy.contains(&id)
    }

    pub fn mark_busy(&mut self, id: UserId) {
        if !self.is_busy(id) {
            self.busy.push(id);
        }
    }

    pub fn clear_busy(&mut self, id: UserId) {
        self.busy.retain(|b| *b != id);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewStats {
    pub total_users: usize,
    pub total_complaints: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub blocks: usize,
    pub floors: usize,
    pub rooms: usize,
}

impl OverviewStats {
    #[must_use]
    pub fn compute(users: &[UserProfile], complaints: &[Complaint], blocks: &[Block]) -> Self {
        let counts = StatusCounts::tally(complaints);
        let infrastructure = InfrastructureCounts::from_blocks(blocks);
        Self {
            total_users: users.len(),
            total_complaints: counts.total,
            pending: counts.pending,
            in_progress: counts.in_progress,
            completed: counts.completed,
            blocks: infrastructure.blocks,
            floors: infrastructure.floors,
            rooms: infrastructure.rooms,
        }
    }
}

/// The super admin dashboard: three independent fetches joined into one set
/// of numbers. Each refresh is a new generation; replies tagged with an older
/// one are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overview {
    generation: u64,
    loading: bool,
    users: Option<Vec<UserProfile>>,
    complaints: Option<Vec<Complaint>>,
    blocks: Option<Vec<Block>>,
    stats: Option<OverviewStats>,
}

impl Overview {
    /// Starts a new round and returns its generation. Earlier stats stay on
    /// screen until the new ones are ready.
    pub fn begin(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.loading = true;
        self.users = None;
        self.complaints = None;
        self.blocks = None;
        self.generation
    }

    pub fn accept_users(&mut self, generation: u64, users: Vec<UserProfile>) -> bool {
        self.accept(generation, |o| o.users = Some(users))
    }

    pub fn accept_complaints(&mut self, generation: u64, complaints: Vec<Complaint>) -> bool {
        self.accept(generation, |o| o.complaints = Some(complaints))
    }

    pub fn accept_blocks(&mut self, generation: u64, blocks: Vec<Block>) -> bool {
        self.accept(generation, |o| o.blocks = Some(blocks))
    }

    /// One failed fetch ends the round; the other replies become stale.
    pub fn fail(&mut self, generation: u64) -> bool {
        if generation != self.generation || !self.loading {
            return false;
        }
        self.loading = false;
        self.generation = self.generation.wrapping_add(1);
        self.users = None;
        self.complaints = None;
        self.blocks = None;
        true
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn stats(&self) -> Option<OverviewStats> {
        self.stats
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn accept(&mut self, generation: u64, store: impl FnOnce(&mut Self)) -> bool {
        if generation != self.generation || !self.loading {
            return false;
        }
        store(self);
        if let (Some(users), Some(complaints), Some(blocks)) =
            (&self.users, &self.complaints, &self.blocks)
        {
            self.stats = Some(OverviewStats::compute(users, complaints, blocks));
            self.loading = false;
        }
        true
    }
}
