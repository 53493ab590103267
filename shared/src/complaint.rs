//! Complaints and their admin-driven status workflow.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::location::{string_or_number, BlockId, FloorId, RoomId};
use crate::roles::RoleSet;
use crate::{ValidationError, DEFAULT_FEEDBACK_RATING};

numeric_id!(
    /// Backend identifier of a complaint.
    ComplaintId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComplaintStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl ComplaintStatus {
    pub const ALL: [ComplaintStatus; 3] = [Self::Pending, Self::InProgress, Self::Completed];

    /// Case-insensitive; accepts `-` or space in place of `_`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().replace(&['-', ' '][..], "_").as_str() {
            "PENDING" => Some(Self::Pending),
            "IN_PROGRESS" => Some(Self::InProgress),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ComplaintStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ComplaintStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown complaint status '{raw}'")))
    }
}

/// The two buttons an admin gets on a complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    StartWork,
    Complete,
}

impl AdminAction {
    pub const ALL: [AdminAction; 2] = [Self::StartWork, Self::Complete];

    #[must_use]
    pub const fn target(self) -> ComplaintStatus {
        match self {
            Self::StartWork => ComplaintStatus::InProgress,
            Self::Complete => ComplaintStatus::Completed,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::StartWork => "Start Work",
            Self::Complete => "Complete",
        }
    }

    /// Work only moves forward: "Start Work" is for pending complaints,
    /// "Complete" for anything not yet completed, and neither while a status
    /// update is in flight.
    #[must_use]
    pub const fn is_enabled(self, current: ComplaintStatus, update_in_flight: bool) -> bool {
        if update_in_flight {
            return false;
        }
        match self {
            Self::StartWork => matches!(current, ComplaintStatus::Pending),
            Self::Complete => !matches!(current, ComplaintStatus::Completed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reporter {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRef {
    #[serde(default)]
    pub block_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorRef {
    #[serde(default)]
    pub floor_no: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomRef {
    #[serde(default, deserialize_with = "string_or_number")]
    pub room_no: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: ComplaintId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ComplaintStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub user: Option<Reporter>,
    #[serde(default)]
    pub block: Option<BlockRef>,
    #[serde(default)]
    pub floor: Option<FloorRef>,
    #[serde(default)]
    pub room: Option<RoomRef>,
}

impl Complaint {
    /// `"Block A • Floor 2 • Room 204"`, skipping parts the backend left out.
    #[must_use]
    pub fn location_label(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(block) = &self.block {
            parts.push(block.block_name.clone());
        }
        if let Some(floor) = &self.floor {
            parts.push(format!("Floor {}", floor.floor_no));
        }
        if let Some(room) = &self.room {
            parts.push(format!("Room {}", room.room_no));
        }
        parts.join(" • ")
    }

    #[must_use]
    pub fn reporter_name(&self) -> String {
        match &self.user {
            Some(user) if !user.name.trim().is_empty() => user.name.clone(),
            _ => "Unknown".to_string(),
        }
    }

    /// Calendar date part of the ISO creation timestamp.
    #[must_use]
    pub fn created_on(&self) -> Option<String> {
        self.created_at
            .as_deref()
            .and_then(|ts| ts.split('T').next())
            .filter(|d| !d.is_empty())
            .map(str::to_string)
    }

    #[must_use]
    pub fn description_preview(&self, max_len: usize) -> String {
        if self.description.chars().count() <= max_len {
            return self.description.clone();
        }
        let cut: String = self.description.chars().take(max_len).collect();
        format!("{}...", cut.trim_end())
    }
}

/// Writes `status` into every copy of complaint `id` in `complaints`.
/// Returns how many copies changed.
pub fn patch_status(complaints: &mut [Complaint], id: ComplaintId, status: ComplaintStatus) -> usize {
    let mut patched = 0;
    for complaint in complaints.iter_mut().filter(|c| c.id == id) {
        complaint.status = status;
        patched += 1;
    }
    patched
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "status", rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Only(ComplaintStatus),
}

impl StatusFilter {
    pub const CHOICES: [StatusFilter; 4] = [
        Self::All,
        Self::Only(ComplaintStatus::Pending),
        Self::Only(ComplaintStatus::InProgress),
        Self::Only(ComplaintStatus::Completed),
    ];

    #[must_use]
    pub fn matches(self, complaint: &Complaint) -> bool {
        match self {
            Self::All => true,
            Self::Only(status) => complaint.status == status,
        }
    }

    #[must_use]
    pub fn apply(self, complaints: &[Complaint]) -> Vec<&Complaint> {
        complaints.iter().filter(|c| self.matches(c)).collect()
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Only(status) => status.display_name(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
}

impl StatusCounts {
    #[must_use]
    pub fn tally(complaints: &[Complaint]) -> Self {
        complaints.iter().fold(
            Self {
                total: complaints.len(),
                ..Self::default()
            },
            |mut counts, complaint| {
                match complaint.status {
                    ComplaintStatus::Pending => counts.pending += 1,
                    ComplaintStatus::InProgress => counts.in_progress += 1,
                    ComplaintStatus::Completed => counts.completed += 1,
                }
                counts
            },
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateComplaintRequest<'a> {
    pub block_id: BlockId,
    pub floor_id: FloorId,
    pub room_id: RoomId,
    pub title: &'a str,
    pub description: &'a str,
}

impl<'a> CreateComplaintRequest<'a> {
    /// All five fields are required.
    pub fn new(
        location: Option<(BlockId, FloorId, RoomId)>,
        title: &'a str,
        description: &'a str,
    ) -> Result<Self, ValidationError> {
        let (title, description) = (title.trim(), description.trim());
        match location {
            Some((block_id, floor_id, room_id)) if !title.is_empty() && !description.is_empty() => {
                Ok(Self {
                    block_id,
                    floor_id,
                    room_id,
                    title,
                    description,
                })
            }
            _ => Err(ValidationError::IncompleteComplaint),
        }
    }
}

/// The part of the create reply the client needs.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedComplaint {
    pub id: ComplaintId,
}

#[derive(Debug, Serialize)]
pub struct FeedbackRequest<'a> {
    pub rating: i32,
    pub comment: &'a str,
}

impl<'a> FeedbackRequest<'a> {
    /// The rating is sent as given; a missing one defaults to
    /// [`DEFAULT_FEEDBACK_RATING`].
    pub fn new(rating: Option<i32>, comment: &'a str) -> Result<Self, ValidationError> {
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(ValidationError::MissingComment);
        }
        Ok(Self {
            rating: rating.unwrap_or(DEFAULT_FEEDBACK_RATING),
            comment,
        })
    }
}

/// Only the reporting side leaves feedback, and only once work is done.
#[must_use]
pub fn can_leave_feedback(roles: &RoleSet, status: ComplaintStatus) -> bool {
    !roles.can_manage() && status == ComplaintStatus::Completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const SAMPLE: &str = r#"{
        "id": 42,
        "title": "Leaking tap",
        "description": "Tap in the second floor washroom keeps dripping",
        "status": "pending",
        "createdAt": "2026-03-14T09:26:53",
        "imageUrl": null,
        "user": { "name": "Ravi" },
        "block": { "blockName": "Block A" },
        "floor": { "floorNo": 2 },
        "room": { "roomNo": "204" }
    }"#;

    fn sample() -> Complaint {
        serde_json::from_str(SAMPLE).unwrap()
    }

    fn with_status(id: i64, status: ComplaintStatus) -> Complaint {
        Complaint {
            id: ComplaintId(id),
            status,
            ..sample()
        }
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(ComplaintStatus::parse("pending"), Some(ComplaintStatus::Pending));
        assert_eq!(ComplaintStatus::parse("In_Progress"), Some(ComplaintStatus::InProgress));
        assert_eq!(ComplaintStatus::parse("in-progress"), Some(ComplaintStatus::InProgress));
        assert_eq!(ComplaintStatus::parse("COMPLETED"), Some(ComplaintStatus::Completed));
        assert_eq!(ComplaintStatus::parse("REJECTED"), None);
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&ComplaintStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert!(serde_json::from_str::<ComplaintStatus>("\"ARCHIVED\"").is_err());
    }

    #[test]
    fn test_complaint_decodes() {
        let complaint = sample();
        assert_eq!(complaint.id, ComplaintId(42));
        assert_eq!(complaint.status, ComplaintStatus::Pending);
        assert_eq!(complaint.location_label(), "Block A • Floor 2 • Room 204");
        assert_eq!(complaint.reporter_name(), "Ravi");
        assert_eq!(complaint.created_on().as_deref(), Some("2026-03-14"));
    }

    #[test]
    fn test_sparse_complaint_decodes() {
        let complaint: Complaint = serde_json::from_str(r#"{"id":1,"status":"COMPLETED"}"#).unwrap();
        assert_eq!(complaint.location_label(), "");
        assert_eq!(complaint.reporter_name(), "Unknown");
        assert_eq!(complaint.created_on(), None);
    }

    #[test]
    fn test_description_preview() {
        let complaint = sample();
        assert_eq!(complaint.description_preview(200), complaint.description);
        assert_eq!(complaint.description_preview(8), "Tap in t...");
    }

    #[test]
    fn test_admin_actions_from_pending() {
        use AdminAction::{Complete, StartWork};
        use ComplaintStatus::{Completed, InProgress, Pending};

        assert!(StartWork.is_enabled(Pending, false));
        assert!(Complete.is_enabled(Pending, false));
        assert!(!StartWork.is_enabled(InProgress, false));
        assert!(Complete.is_enabled(InProgress, false));
        assert!(!StartWork.is_enabled(Completed, false));
        assert!(!Complete.is_enabled(Completed, false));
        assert!(!StartWork.is_enabled(Pending, true));
        assert!(!Complete.is_enabled(Pending, true));
    }

    #[test]
    fn test_patch_status_updates_every_copy() {
        let mut list = vec![
            with_status(42, ComplaintStatus::Pending),
            with_status(7, ComplaintStatus::Pending),
            with_status(42, ComplaintStatus::Pending),
        ];
        assert_eq!(patch_status(&mut list, ComplaintId(42), ComplaintStatus::Completed), 2);
        assert_eq!(list[1].status, ComplaintStatus::Pending);
        assert_eq!(list[2].status, ComplaintStatus::Completed);
    }

    #[test]
    fn test_filter_and_counts() {
        let list = vec![
            with_status(1, ComplaintStatus::Pending),
            with_status(2, ComplaintStatus::InProgress),
            with_status(3, ComplaintStatus::Completed),
            with_status(4, ComplaintStatus::Pending),
        ];

        assert_eq!(StatusFilter::All.apply(&list).len(), 4);
        let pending = StatusFilter::Only(ComplaintStatus::Pending).apply(&list);
        assert_eq!(
            pending.iter().map(|c| c.id).collect::<Vec<_>>(),
            vec![ComplaintId(1), ComplaintId(4)]
        );

        assert_eq!(
            StatusCounts::tally(&list),
            StatusCounts {
                total: 4,
                pending: 2,
                in_progress: 1,
                completed: 1
            }
        );
    }

    #[test]
    fn test_create_request_requires_every_field() {
        let location = Some((BlockId(1), FloorId(2), RoomId(3)));
        assert_matches!(
            CreateComplaintRequest::new(None, "t", "d"),
            Err(ValidationError::IncompleteComplaint)
        );
        assert_matches!(
            CreateComplaintRequest::new(location, " ", "d"),
            Err(ValidationError::IncompleteComplaint)
        );
        assert_matches!(
            CreateComplaintRequest::new(location, "t", ""),
            Err(ValidationError::IncompleteComplaint)
        );

        let request = CreateComplaintRequest::new(location, "Broken fan", "Fan in 204").unwrap();
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "blockId": 1,
                "floorId": 2,
                "roomId": 3,
                "title": "Broken fan",
                "description": "Fan in 204"
            })
        );
    }

    #[test]
    fn test_feedback_request() {
        assert_matches!(
            FeedbackRequest::new(Some(4), "   "),
            Err(ValidationError::MissingComment)
        );
        let request = FeedbackRequest::new(None, "Fixed quickly").unwrap();
        assert_eq!(request.rating, DEFAULT_FEEDBACK_RATING);
        let unbounded = FeedbackRequest::new(Some(11), "ok").unwrap();
        assert_eq!(unbounded.rating, 11);
    }

    #[test]
    fn test_feedback_gate() {
        let user = RoleSet::parse("ROLE_USER");
        let admin = RoleSet::parse("ROLE_ADMIN");
        assert!(can_leave_feedback(&user, ComplaintStatus::Completed));
        assert!(!can_leave_feedback(&user, ComplaintStatus::InProgress));
        assert!(!can_leave_feedback(&admin, ComplaintStatus::Completed));
    }
}
