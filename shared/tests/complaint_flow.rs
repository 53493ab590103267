mod common;

use assert_matches::assert_matches;
use campus_shared::capabilities::HttpMethod;
use campus_shared::complaint::{AdminAction, ComplaintId, ComplaintStatus, StatusFilter};
use campus_shared::location::{BlockId, FloorId, RoomId};
use campus_shared::router::Tab;
use campus_shared::view::ScreenView;
use campus_shared::{AlertKind, Event};
use common::{complaint_json, user_json, Harness};
use serde_json::{json, Value};

const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

/// A signed-in reporter with an empty complaint list already loaded.
fn reporter() -> Harness {
    let mut h = Harness::new();
    let mut pending = h.start_signed_in(user_json(1, "Asha", "ROLE_USER"));
    let mut mine = pending.take_api(HttpMethod::Get, "/api/complaints/my");
    h.respond_json(&mut mine, 200, json!([]));
    h
}

/// Walks the report form to block 1, floor 10, room 100.
fn pick_location(h: &mut Harness) {
    let mut pending = h.send(Event::TabSelected(Tab::Report));
    let mut blocks = pending.take_api(HttpMethod::Get, "/api/blocks");
    h.respond_json(
        &mut blocks,
        200,
        json!([{"id": 1, "blockName": "Block A"}, {"id": 2, "blockName": "Block B"}]),
    );

    let mut pending = h.send(Event::ReportBlockSelected(BlockId(1)));
    let mut floors = pending.take_api(HttpMethod::Get, "/api/floors/block/1");
    h.respond_json(&mut floors, 200, json!([{"id": 10, "floorNo": 1}]));

    let mut pending = h.send(Event::ReportFloorSelected(FloorId(10)));
    let mut rooms = pending.take_api(HttpMethod::Get, "/api/rooms/floor/10");
    h.respond_json(&mut rooms, 200, json!([{"id": 100, "roomNo": 101}]));

    h.send(Event::ReportRoomSelected(RoomId(100)));
}

#[test]
fn test_admin_completes_pending_complaint() {
    let mut h = Harness::new();
    let mut pending = h.start_signed_in(user_json(2, "Ravi", "ROLE_ADMIN"));
    let mut all = pending.take_api(HttpMethod::Get, "/api/complaints");
    h.respond_json(
        &mut all,
        200,
        json!([complaint_json(42, "PENDING"), complaint_json(43, "IN_PROGRESS")]),
    );

    h.send(Event::ComplaintOpened(ComplaintId(42)));
    let detail = h.view().detail.unwrap();
    assert_eq!(detail.status, ComplaintStatus::Pending);
    assert!(detail.admin_actions.iter().all(|a| a.enabled));
    assert!(!detail.can_leave_feedback);

    let mut pending = h.send(Event::StatusChangeRequested(AdminAction::Complete));
    let mut put = pending.take_api(
        HttpMethod::Put,
        "/api/complaints/42/status?status=COMPLETED",
    );
    let detail = h.view().detail.unwrap();
    assert!(detail.status_loading);
    assert!(detail.admin_actions.iter().all(|a| !a.enabled));

    h.respond_json(&mut put, 200, json!({"id": 42, "status": "COMPLETED"}));
    let view = h.view();
    let detail = view.detail.unwrap();
    assert_eq!(detail.status, ComplaintStatus::Completed);
    assert!(!detail.status_loading);
    assert!(detail.admin_actions.iter().all(|a| !a.enabled));
    let alert = view.alert.unwrap();
    assert_eq!(alert.kind, AlertKind::Success);
    assert_eq!(alert.message, "Status updated to COMPLETED");

    // The list behind the detail reflects the change without a refetch.
    h.send(Event::DetailClosed);
    h.send(Event::StatusFilterSelected(StatusFilter::Only(
        ComplaintStatus::Completed,
    )));
    assert_matches!(h.view().screen, ScreenView::AdminComplaints(board) => {
        let ids: Vec<ComplaintId> = board.items.iter().map(|c| c.id).collect();
        assert_eq!(ids, [ComplaintId(42)]);
    });
}

#[test]
fn test_failed_status_update_leaves_complaint_unchanged() {
    let mut h = Harness::new();
    let mut pending = h.start_signed_in(user_json(2, "Ravi", "ROLE_ADMIN"));
    let mut all = pending.take_api(HttpMethod::Get, "/api/complaints");
    h.respond_json(&mut all, 200, json!([complaint_json(42, "PENDING")]));
    h.send(Event::ComplaintOpened(ComplaintId(42)));

    let mut pending = h.send(Event::StatusChangeRequested(AdminAction::StartWork));
    let mut put = pending.take_api(
        HttpMethod::Put,
        "/api/complaints/42/status?status=IN_PROGRESS",
    );
    h.respond_json(&mut put, 500, json!({"message": "boom"}));

    let view = h.view();
    let detail = view.detail.unwrap();
    assert_eq!(detail.status, ComplaintStatus::Pending);
    assert!(detail.admin_actions.iter().all(|a| a.enabled));
    assert_eq!(view.alert.unwrap().message, "Failed to update status");
}

#[test]
fn test_location_pickers_cascade_and_ignore_stale_floors() {
    let mut h = reporter();
    pick_location(&mut h);
    assert_matches!(h.view().screen, ScreenView::Report(form) => {
        assert_eq!(form.selected_room, Some(RoomId(100)));
        assert_eq!(form.rooms[0].label, "Room 101");
    });

    // Block 1 is re-selected, then block 2 before either reply lands.
    let mut pending = h.send(Event::ReportBlockSelected(BlockId(1)));
    let mut stale = pending.take_api(HttpMethod::Get, "/api/floors/block/1");
    assert_matches!(h.view().screen, ScreenView::Report(form) => {
        assert_eq!(form.selected_floor, None);
        assert_eq!(form.selected_room, None);
        assert!(form.floors.is_empty());
        assert!(form.rooms.is_empty());
        assert!(!form.floor_picker_enabled);
    });

    let mut pending = h.send(Event::ReportBlockSelected(BlockId(2)));
    let mut fresh = pending.take_api(HttpMethod::Get, "/api/floors/block/2");

    h.respond_json(&mut stale, 200, json!([{"id": 10, "floorNo": 1}]));
    assert_matches!(h.view().screen, ScreenView::Report(form) => {
        assert_eq!(form.selected_block, Some(BlockId(2)));
        assert!(form.floors.is_empty());
    });

    h.respond_json(&mut fresh, 200, json!([{"id": 20, "floorNo": 3}]));
    assert_matches!(h.view().screen, ScreenView::Report(form) => {
        let labels: Vec<&str> = form.floors.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, ["Floor 3"]);
        assert!(form.floor_picker_enabled);
        assert!(!form.room_picker_enabled);
    });
}

#[test]
fn test_incomplete_report_is_rejected_locally() {
    let mut h = reporter();
    let mut pending = h.send(Event::TabSelected(Tab::Report));
    let mut blocks = pending.take_api(HttpMethod::Get, "/api/blocks");
    h.respond_json(&mut blocks, 200, json!([{"id": 1, "blockName": "Block A"}]));

    let pending = h.send(Event::ComplaintSubmitted {
        title: "Broken fan".into(),
        description: "Fan does not spin".into(),
    });
    assert!(pending.api.is_empty());
    let alert = h.view().alert.unwrap();
    assert_eq!(alert.title, "Error");
    assert_eq!(alert.message, "Please fill in all fields");
}

#[test]
fn test_report_with_photo_uploads_to_created_complaint() {
    let mut h = reporter();
    pick_location(&mut h);
    h.send(Event::ImageAttached {
        bytes: PNG_HEADER.to_vec(),
    });
    assert_matches!(h.view().screen, ScreenView::Report(ref form) if form.has_image);

    let mut pending = h.send(Event::ComplaintSubmitted {
        title: " Broken fan ".into(),
        description: "Fan does not spin".into(),
    });
    let mut create = pending.take_api(HttpMethod::Post, "/api/complaints");
    let body: Value = serde_json::from_slice(create.operation.request().body().unwrap()).unwrap();
    assert_eq!(
        body,
        json!({
            "blockId": 1,
            "floorId": 10,
            "roomId": 100,
            "title": "Broken fan",
            "description": "Fan does not spin",
        })
    );
    assert_matches!(h.view().screen, ScreenView::Report(ref form) if form.submitting);

    let mut pending = h.respond_json(&mut create, 200, json!({"id": 99, "status": "PENDING"}));
    let mut upload = pending.take_api(HttpMethod::Post, "/api/complaints/99/image");
    let request = upload.operation.request();
    assert!(request
        .headers()
        .get("content-type")
        .unwrap()
        .starts_with("multipart/form-data; boundary="));
    let form_body = String::from_utf8_lossy(request.body().unwrap()).into_owned();
    assert!(form_body.contains("filename=\"complaint_99.png\""));
    assert!(form_body.contains("Content-Type: image/png"));

    let mut pending = h.respond_json(&mut upload, 200, json!({}));
    let view = h.view();
    assert_eq!(view.alert.unwrap().message, "Complaint submitted successfully");
    assert!(view.tabs.iter().any(|t| t.tab == Tab::Dashboard && t.selected));
    assert_matches!(view.screen, ScreenView::MyComplaints(ref list) if list.refreshing);
    pending.take_api(HttpMethod::Get, "/api/complaints/my");

    // The form starts over but keeps the block list.
    assert!(h.model.report.image.is_none());
    assert_eq!(h.model.report.selection.block(), None);
    assert_eq!(h.model.report.selection.blocks().len(), 2);
}

#[test]
fn test_report_without_photo_skips_upload() {
    let mut h = reporter();
    pick_location(&mut h);

    let mut pending = h.send(Event::ComplaintSubmitted {
        title: "Broken fan".into(),
        description: "Fan does not spin".into(),
    });
    let mut create = pending.take_api(HttpMethod::Post, "/api/complaints");
    let pending = h.respond_json(&mut create, 200, json!({"id": 99}));

    assert_eq!(pending.api_paths(), ["GET /api/complaints/my"]);
    assert_eq!(
        h.view().alert.unwrap().message,
        "Complaint submitted successfully"
    );
}

#[test]
fn test_failed_upload_keeps_the_form() {
    let mut h = reporter();
    pick_location(&mut h);
    h.send(Event::ImageAttached {
        bytes: PNG_HEADER.to_vec(),
    });

    let mut pending = h.send(Event::ComplaintSubmitted {
        title: "Broken fan".into(),
        description: "Fan does not spin".into(),
    });
    let mut create = pending.take_api(HttpMethod::Post, "/api/complaints");
    let mut pending = h.respond_json(&mut create, 200, json!({"id": 99}));
    let mut upload = pending.take_api(HttpMethod::Post, "/api/complaints/99/image");
    let pending = h.respond_json(&mut upload, 413, json!({}));

    assert!(pending.api.is_empty());
    let alert = h.view().alert.unwrap();
    assert_eq!(alert.kind, AlertKind::Error);
    assert_eq!(alert.message, "Failed to submit complaint");
    assert_matches!(h.view().screen, ScreenView::Report(form) => {
        assert!(!form.submitting);
        assert!(form.has_image);
        assert_eq!(form.selected_room, Some(RoomId(100)));
    });
}

#[test]
fn test_feedback_on_completed_complaint() {
    let mut h = Harness::new();
    let mut pending = h.start_signed_in(user_json(1, "Asha", "ROLE_USER"));
    let mut mine = pending.take_api(HttpMethod::Get, "/api/complaints/my");
    h.respond_json(
        &mut mine,
        200,
        json!([complaint_json(7, "COMPLETED"), complaint_json(8, "PENDING")]),
    );

    h.send(Event::ComplaintOpened(ComplaintId(8)));
    let detail = h.view().detail.unwrap();
    assert!(!detail.can_leave_feedback);
    assert!(detail.admin_actions.is_empty());
    let pending = h.send(Event::FeedbackSubmitted {
        rating: Some(5),
        comment: "Great".into(),
    });
    assert!(pending.api.is_empty());

    h.send(Event::ComplaintOpened(ComplaintId(7)));
    assert!(h.view().detail.unwrap().can_leave_feedback);

    let pending = h.send(Event::FeedbackSubmitted {
        rating: Some(4),
        comment: "  ".into(),
    });
    assert!(pending.api.is_empty());
    assert_eq!(h.view().alert.unwrap().message, "Please enter a comment");

    let mut pending = h.send(Event::FeedbackSubmitted {
        rating: Some(4),
        comment: "Fixed quickly".into(),
    });
    let mut feedback = pending.take_api(HttpMethod::Post, "/api/feedback/7");
    let body: Value =
        serde_json::from_slice(feedback.operation.request().body().unwrap()).unwrap();
    assert_eq!(body, json!({"rating": 4, "comment": "Fixed quickly"}));
    assert!(h.view().detail.unwrap().feedback_loading);

    h.respond_json(&mut feedback, 200, json!({}));
    let view = h.view();
    assert!(view.detail.is_none());
    assert_eq!(view.alert.unwrap().message, "Feedback submitted");
}
