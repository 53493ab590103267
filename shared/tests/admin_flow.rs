mod common;

use assert_matches::assert_matches;
use campus_shared::capabilities::HttpMethod;
use campus_shared::location::{BlockId, FloorId};
use campus_shared::router::{Route, Tab};
use campus_shared::screens::OverviewStats;
use campus_shared::user::UserId;
use campus_shared::view::ScreenView;
use campus_shared::Event;
use common::{complaint_json, user_json, Harness};
use serde_json::{json, Value};

fn admin() -> Harness {
    let mut h = Harness::new();
    let mut pending = h.start_signed_in(user_json(2, "Ravi", "ROLE_ADMIN"));
    let mut all = pending.take_api(HttpMethod::Get, "/api/complaints");
    h.respond_json(&mut all, 200, json!([]));
    h
}

fn blocks_json() -> Value {
    json!([
        {
            "id": 1,
            "blockName": "Block A",
            "description": "Hostel",
            "floors": [
                {"id": 10, "floorNo": 1, "rooms": [{"id": 100, "roomNo": "101"}, {"id": 101, "roomNo": "102"}]},
                {"id": 11, "floorNo": 2, "rooms": []}
            ]
        },
        {"id": 2, "blockName": "Block B"}
    ])
}

#[test]
fn test_super_admin_overview_joins_three_fetches() {
    let mut h = Harness::new();
    let mut pending = h.start_signed_in(user_json(9, "Meera", "SUPERADMIN"));
    assert_eq!(h.view().route, Route::SuperAdmin);
    assert!(h.view().tabs[0].selected);
    assert_eq!(h.view().tabs[0].tab, Tab::Overview);

    let mut users = pending.take_api(HttpMethod::Get, "/api/users");
    let mut complaints = pending.take_api(HttpMethod::Get, "/api/complaints");
    let mut blocks = pending.take_api(HttpMethod::Get, "/api/blocks");

    h.respond_json(&mut blocks, 200, blocks_json());
    h.respond_json(
        &mut users,
        200,
        json!([user_json(1, "Asha", "ROLE_USER"), user_json(2, "Ravi", "ROLE_ADMIN")]),
    );
    assert_matches!(h.view().screen, ScreenView::Overview(ref o) if o.loading && o.stats.is_none());

    h.respond_json(
        &mut complaints,
        200,
        json!([
            complaint_json(1, "PENDING"),
            complaint_json(2, "PENDING"),
            complaint_json(3, "IN_PROGRESS"),
            complaint_json(4, "COMPLETED"),
        ]),
    );
    assert_matches!(h.view().screen, ScreenView::Overview(o) => {
        assert!(!o.loading);
        assert_eq!(
            o.stats,
            Some(OverviewStats {
                total_users: 2,
                total_complaints: 4,
                pending: 2,
                in_progress: 1,
                completed: 1,
                blocks: 2,
                floors: 2,
                rooms: 2,
            })
        );
    });
}

#[test]
fn test_overview_failure_discards_the_round() {
    let mut h = Harness::new();
    let mut pending = h.start_signed_in(user_json(9, "Meera", "SUPERADMIN"));
    let mut users = pending.take_api(HttpMethod::Get, "/api/users");
    let mut complaints = pending.take_api(HttpMethod::Get, "/api/complaints");
    let mut blocks = pending.take_api(HttpMethod::Get, "/api/blocks");

    h.respond_json(&mut users, 500, json!({}));
    assert_matches!(h.view().screen, ScreenView::Overview(ref o) if !o.loading && o.stats.is_none());
    // Failures here are logged, not alerted.
    assert!(h.view().alert.is_none());

    h.respond_json(&mut complaints, 200, json!([]));
    h.respond_json(&mut blocks, 200, json!([]));
    assert!(h.model.overview.stats().is_none());

    // A fresh round starts clean.
    let mut pending = h.send(Event::OverviewRequested);
    assert_eq!(pending.api.len(), 3);
    for path in ["/api/users", "/api/complaints", "/api/blocks"] {
        let mut request = pending.take_api(HttpMethod::Get, path);
        h.respond_json(&mut request, 200, json!([]));
    }
    assert_eq!(h.model.overview.stats(), Some(OverviewStats::default()));
}

#[test]
fn test_role_toggle_promotes_user_and_refetches() {
    let mut h = admin();
    let mut pending = h.send(Event::TabSelected(Tab::Users));
    let mut list = pending.take_api(HttpMethod::Get, "/api/users");
    h.respond_json(
        &mut list,
        200,
        json!([user_json(3, "Kiran", "ROLE_USER"), user_json(4, "Dev", "ROLE_ADMIN")]),
    );
    assert_matches!(h.view().screen, ScreenView::Users(view) => {
        let labels: Vec<&str> = view.users.iter().map(|u| u.toggle_label.as_str()).collect();
        assert_eq!(labels, ["Make Admin", "Make User"]);
    });

    let mut pending = h.send(Event::UserRoleToggled(UserId(3)));
    let mut update = pending.take_api(HttpMethod::Post, "/auth/update-role");
    let body: Value = serde_json::from_slice(update.operation.request().body().unwrap()).unwrap();
    assert_eq!(body, json!({"mobileNumber": "9000000003", "roles": "ROLE_ADMIN"}));
    assert_matches!(h.view().screen, ScreenView::Users(ref view) if view.users[0].busy);

    // A second tap while the first is in flight does nothing.
    let pending_again = h.send(Event::UserRoleToggled(UserId(3)));
    assert!(pending_again.api.is_empty());

    let mut pending = h.respond_json(&mut update, 200, json!({}));
    assert_eq!(h.view().alert.unwrap().message, "User updated to ROLE_ADMIN");
    pending.take_api(HttpMethod::Get, "/api/users");
    assert_matches!(h.view().screen, ScreenView::Users(ref view) if !view.users[0].busy);
}

#[test]
fn test_user_delete_refetches_and_reports_failure() {
    let mut h = admin();
    let mut pending = h.send(Event::TabSelected(Tab::Users));
    let mut list = pending.take_api(HttpMethod::Get, "/api/users");
    h.respond_json(&mut list, 200, json!([user_json(3, "Kiran", "ROLE_USER")]));

    let mut pending = h.send(Event::UserDeleteConfirmed(UserId(3)));
    let mut delete = pending.take_api(HttpMethod::Delete, "/api/users/3");
    let mut pending = h.respond_json(&mut delete, 200, json!({}));
    let mut list = pending.take_api(HttpMethod::Get, "/api/users");
    h.respond_json(&mut list, 200, json!([]));
    assert!(h.view().alert.is_none());

    h.model.users.users = vec![serde_json::from_value(user_json(5, "Lata", "ROLE_USER")).unwrap()];
    let mut pending = h.send(Event::UserDeleteConfirmed(UserId(5)));
    let mut delete = pending.take_api(HttpMethod::Delete, "/api/users/5");
    let pending = h.respond_json(&mut delete, 403, json!({}));
    assert!(pending.api.is_empty());
    assert_eq!(h.view().alert.unwrap().message, "Failed to delete user");
}

#[test]
fn test_infrastructure_forms_create_and_refresh() {
    let mut h = admin();
    let mut pending = h.send(Event::TabSelected(Tab::Infrastructure));
    let mut blocks = pending.take_api(HttpMethod::Get, "/api/blocks");
    h.respond_json(&mut blocks, 200, blocks_json());
    assert_matches!(h.view().screen, ScreenView::Infrastructure(ref view) => {
        assert_eq!(view.counts.blocks, 2);
        assert_eq!(view.counts.floors, 2);
        assert_eq!(view.counts.rooms, 2);
        assert_eq!(view.blocks[0].room_count, 2);
    });

    // No block picked yet.
    let pending = h.send(Event::CreateFloorSubmitted {
        floor_no: "3".into(),
    });
    assert!(pending.api.is_empty());
    assert_eq!(
        h.view().alert.unwrap().message,
        "Please select a block and enter a floor number"
    );
    h.send(Event::AlertDismissed);

    h.send(Event::FloorFormBlockSelected(BlockId(1)));
    let mut pending = h.send(Event::CreateFloorSubmitted {
        floor_no: "3".into(),
    });
    let mut create = pending.take_api(HttpMethod::Post, "/api/floors");
    let body: Value = serde_json::from_slice(create.operation.request().body().unwrap()).unwrap();
    assert_eq!(body, json!({"blockId": 1, "floorNo": 3}));
    let mut pending = h.respond_json(&mut create, 200, json!({"id": 12, "floorNo": 3}));
    assert_eq!(h.view().alert.unwrap().message, "Floor added");
    let mut refresh = pending.take_api(HttpMethod::Get, "/api/blocks");
    h.respond_json(&mut refresh, 200, blocks_json());
    h.send(Event::AlertDismissed);

    let mut pending = h.send(Event::RoomFormBlockSelected(BlockId(1)));
    let mut floors = pending.take_api(HttpMethod::Get, "/api/floors/block/1");
    h.respond_json(
        &mut floors,
        200,
        json!([{"id": 10, "floorNo": 1}, {"id": 11, "floorNo": 2}]),
    );
    h.send(Event::RoomFormFloorSelected(FloorId(11)));
    let mut pending = h.send(Event::CreateRoomSubmitted {
        room_no: " 201 ".into(),
    });
    let mut create = pending.take_api(HttpMethod::Post, "/api/rooms");
    let body: Value = serde_json::from_slice(create.operation.request().body().unwrap()).unwrap();
    assert_eq!(body, json!({"floorId": 11, "roomNo": "201"}));

    let mut pending = h.respond_json(&mut create, 500, json!({}));
    assert_eq!(h.view().alert.unwrap().message, "Failed to create room");
    assert!(pending.api.is_empty());
    h.send(Event::AlertDismissed);

    let mut pending = h.send(Event::CreateRoomSubmitted {
        room_no: "201".into(),
    });
    let mut create = pending.take_api(HttpMethod::Post, "/api/rooms");
    let mut pending = h.respond_json(&mut create, 200, json!({}));
    assert_eq!(h.view().alert.unwrap().message, "Room added");
    pending.take_api(HttpMethod::Get, "/api/blocks");
}

#[test]
fn test_block_create_refetches_silently() {
    let mut h = admin();
    let mut pending = h.send(Event::TabSelected(Tab::Infrastructure));
    let mut blocks = pending.take_api(HttpMethod::Get, "/api/blocks");
    h.respond_json(&mut blocks, 200, json!([]));

    let mut pending = h.send(Event::CreateBlockSubmitted {
        block_name: "Block C".into(),
        description: "Library".into(),
    });
    let mut create = pending.take_api(HttpMethod::Post, "/api/blocks");
    let mut pending = h.respond_json(&mut create, 200, json!({"id": 3}));
    assert!(h.view().alert.is_none());
    pending.take_api(HttpMethod::Get, "/api/blocks");
}

#[test]
fn test_plain_user_cannot_reach_admin_tabs() {
    let mut h = Harness::new();
    h.start_signed_in(user_json(1, "Asha", "ROLE_USER"));

    let pending = h.send(Event::TabSelected(Tab::Users));
    assert!(pending.api.is_empty());
    assert!(h.view().tabs[0].selected);
    let pending = h.send(Event::OverviewRequested);
    assert!(pending.api.is_empty());
}
