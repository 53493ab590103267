//! What the shell renders. Built fresh from the model on every `view` call;
//! never contains tokens.

use serde::{Deserialize, Serialize};

use crate::complaint::{
    can_leave_feedback, AdminAction, Complaint, ComplaintId, ComplaintStatus, StatusFilter,
};
use crate::location::{BlockId, FloorId, InfrastructureCounts, RoomId};
use crate::model::Model;
use crate::roles::RoleSet;
use crate::router::{AuthScreen, Route, Tab};
use crate::screens::{ComplaintList, DetailState, OverviewStats};
use crate::session::Lifecycle;
use crate::user::{UserId, UserProfile};
use crate::{Alert, DESCRIPTION_PREVIEW_LENGTH};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewModel {
    pub route: Route,
    pub lifecycle: Lifecycle,
    pub tabs: Vec<TabView>,
    pub screen: ScreenView,
    pub detail: Option<ComplaintDetailView>,
    pub alert: Option<Alert>,
    pub can_retry_restore: bool,
}

impl Default for ViewModel {
    fn default() -> Self {
        Self {
            route: Route::Loading,
            lifecycle: Lifecycle::Unloaded,
            tabs: Vec::new(),
            screen: ScreenView::Loading,
            detail: None,
            alert: None,
            can_retry_restore: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabView {
    pub tab: Tab,
    pub title: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScreenView {
    Loading,
    Login { loading: bool },
    Signup { loading: bool },
    MyComplaints(ComplaintListView),
    Report(ReportView),
    Profile(ProfileView),
    AdminComplaints(AdminComplaintsView),
    Infrastructure(InfrastructureView),
    Users(UsersView),
    Overview(OverviewView),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintCard {
    pub id: ComplaintId,
    pub title: String,
    pub description_preview: String,
    pub status: ComplaintStatus,
    pub status_label: String,
    pub location: String,
    pub reporter: String,
    pub created_on: Option<String>,
    pub image_url: Option<String>,
}

impl From<&Complaint> for ComplaintCard {
    fn from(c: &Complaint) -> Self {
        Self {
            id: c.id,
            title: c.title.clone(),
            description_preview: c.description_preview(DESCRIPTION_PREVIEW_LENGTH),
            status: c.status,
            status_label: c.status.display_name().to_string(),
            location: c.location_label(),
            reporter: c.reporter_name(),
            created_on: c.created_on(),
            image_url: c.image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintListView {
    pub items: Vec<ComplaintCard>,
    pub loading: bool,
    pub refreshing: bool,
    pub empty: bool,
}

impl From<&ComplaintList> for ComplaintListView {
    fn from(list: &ComplaintList) -> Self {
        Self {
            items: list.items().iter().map(ComplaintCard::from).collect(),
            loading: list.is_loading(),
            refreshing: list.is_refreshing(),
            empty: list.is_loaded() && list.items().is_empty(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterChip {
    pub filter: StatusFilter,
    pub label: String,
    pub count: usize,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminComplaintsView {
    pub filters: Vec<FilterChip>,
    pub items: Vec<ComplaintCard>,
    pub loading: bool,
    pub refreshing: bool,
}

/// A picker entry; `id` is whichever typed id the picker is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickerOption<Id> {
    pub id: Id,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportView {
    pub blocks: Vec<PickerOption<BlockId>>,
    pub floors: Vec<PickerOption<FloorId>>,
    pub rooms: Vec<PickerOption<RoomId>>,
    pub selected_block: Option<BlockId>,
    pub selected_floor: Option<FloorId>,
    pub selected_room: Option<RoomId>,
    pub floor_picker_enabled: bool,
    pub room_picker_enabled: bool,
    pub blocks_loading: bool,
    pub floors_loading: bool,
    pub rooms_loading: bool,
    pub has_image: bool,
    pub image_size: Option<usize>,
    pub submitting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminActionView {
    pub action: AdminAction,
    pub label: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintDetailView {
    pub id: ComplaintId,
    pub title: String,
    pub description: String,
    pub status: ComplaintStatus,
    pub status_label: String,
    pub location: String,
    pub reporter: String,
    pub created_on: Option<String>,
    pub image_url: Option<String>,
    /// Empty for non-admins.
    pub admin_actions: Vec<AdminActionView>,
    pub status_loading: bool,
    pub can_leave_feedback: bool,
    pub feedback_loading: bool,
}

impl ComplaintDetailView {
    fn build(detail: &DetailState, roles: &RoleSet) -> Self {
        let c = &detail.complaint;
        let admin_actions = if roles.can_manage() {
            AdminAction::ALL
                .into_iter()
                .map(|action| AdminActionView {
                    action,
                    label: action.label().to_string(),
                    enabled: action.is_enabled(c.status, detail.status_loading),
                })
                .collect()
        } else {
            Vec::new()
        };
        Self {
            id: c.id,
            title: c.title.clone(),
            description: c.description.clone(),
            status: c.status,
            status_label: c.status.display_name().to_string(),
            location: c.location_label(),
            reporter: c.reporter_name(),
            created_on: c.created_on(),
            image_url: c.image_url.clone(),
            admin_actions,
            status_loading: detail.status_loading,
            can_leave_feedback: can_leave_feedback(roles, c.status),
            feedback_loading: detail.feedback_loading,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileView {
    pub name: String,
    pub mobile_number: String,
    pub email: String,
    pub roles: String,
    pub initials: String,
}

impl From<&UserProfile> for ProfileView {
    fn from(user: &UserProfile) -> Self {
        Self {
            name: user.name.clone(),
            mobile_number: user.mobile_number.clone(),
            email: user.email_label(),
            roles: user.roles.clone(),
            initials: user.initials(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockView {
    pub id: BlockId,
    pub name: String,
    pub description: Option<String>,
    pub floor_count: usize,
    pub room_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfrastructureView {
    pub blocks: Vec<BlockView>,
    pub counts: InfrastructureCounts,
    pub loading: bool,
    pub floor_form_block: Option<BlockId>,
    pub room_form_block: Option<BlockId>,
    pub room_form_floors: Vec<PickerOption<FloorId>>,
    pub room_form_floor: Option<FloorId>,
    pub room_form_floors_loading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRowView {
    pub id: UserId,
    pub name: String,
    pub mobile_number: String,
    pub email: String,
    pub roles: String,
    pub is_admin: bool,
    pub toggle_label: String,
    pub busy: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersView {
    pub users: Vec<UserRowView>,
    pub loading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewView {
    pub loading: bool,
    pub stats: Option<OverviewStats>,
}

impl ViewModel {
    #[must_use]
    pub fn build(model: &Model) -> Self {
        let route = model.route();
        let active = model.navigation.active_tab(route);
        let tabs = route
            .tabs()
            .iter()
            .map(|&tab| TabView {
                tab,
                title: tab.title().to_string(),
                selected: Some(tab) == active,
            })
            .collect();

        let roles = model.session.roles();
        let detail = match (&model.detail, roles) {
            (Some(detail), Some(roles)) => Some(ComplaintDetailView::build(detail, roles)),
            _ => None,
        };

        Self {
            route,
            lifecycle: model.session.lifecycle(),
            tabs,
            screen: screen(model, route, active),
            detail,
            alert: model.alert.clone(),
            can_retry_restore: model.restore_retryable,
        }
    }
}

fn screen(model: &Model, route: Route, active: Option<Tab>) -> ScreenView {
    match (route, active) {
        (Route::Loading, _) => ScreenView::Loading,
        (Route::Unauthenticated, _) => match model.navigation.auth_screen {
            AuthScreen::Login => ScreenView::Login {
                loading: model.auth.login_loading,
            },
            AuthScreen::Signup => ScreenView::Signup {
                loading: model.auth.signup_loading,
            },
        },
        (_, Some(Tab::Dashboard)) => ScreenView::MyComplaints((&model.my_complaints).into()),
        (_, Some(Tab::Report)) => ScreenView::Report(report(model)),
        (_, Some(Tab::Profile)) => match model.session.user() {
            Some(user) => ScreenView::Profile(user.into()),
            None => ScreenView::Loading,
        },
        (_, Some(Tab::Complaints)) => ScreenView::AdminComplaints(admin_complaints(model)),
        (_, Some(Tab::Infrastructure)) => ScreenView::Infrastructure(infrastructure(model)),
        (_, Some(Tab::Users)) => ScreenView::Users(users(model)),
        (_, Some(Tab::Overview)) => ScreenView::Overview(OverviewView {
            loading: model.overview.is_loading(),
            stats: model.overview.stats(),
        }),
        (_, None) => ScreenView::Loading,
    }
}

fn report(model: &Model) -> ReportView {
    let form = &model.report;
    let selection = &form.selection;
    ReportView {
        blocks: selection
            .blocks()
            .iter()
            .map(|b| PickerOption {
                id: b.id,
                label: b.block_name.clone(),
            })
            .collect(),
        floors: selection
            .floors()
            .iter()
            .map(|f| PickerOption {
                id: f.id,
                label: f.label(),
            })
            .collect(),
        rooms: selection
            .rooms()
            .iter()
            .map(|r| PickerOption {
                id: r.id,
                label: r.label(),
            })
            .collect(),
        selected_block: selection.block(),
        selected_floor: selection.floor(),
        selected_room: selection.room(),
        floor_picker_enabled: selection.block().is_some() && !form.floors_loading,
        room_picker_enabled: selection.floor().is_some() && !form.rooms_loading,
        blocks_loading: form.blocks_loading,
        floors_loading: form.floors_loading,
        rooms_loading: form.rooms_loading,
        has_image: form.image.is_some(),
        image_size: form.image.as_ref().map(crate::multipart::ImageAttachment::len),
        submitting: form.submitting,
    }
}

fn admin_complaints(model: &Model) -> AdminComplaintsView {
    let board = &model.admin_board;
    AdminComplaintsView {
        filters: StatusFilter::CHOICES
            .into_iter()
            .map(|filter| FilterChip {
                filter,
                label: filter.label().to_string(),
                count: filter.apply(board.list.items()).len(),
                selected: filter == board.filter,
            })
            .collect(),
        items: board.visible().into_iter().map(ComplaintCard::from).collect(),
        loading: board.list.is_loading(),
        refreshing: board.list.is_refreshing(),
    }
}

fn infrastructure(model: &Model) -> InfrastructureView {
    let infra = &model.infrastructure;
    InfrastructureView {
        blocks: infra
            .blocks
            .iter()
            .map(|b| BlockView {
                id: b.id,
                name: b.block_name.clone(),
                description: b.description.clone(),
                floor_count: b.floors.len(),
                room_count: b.floors.iter().map(|f| f.rooms.len()).sum(),
            })
            .collect(),
        counts: InfrastructureCounts::from_blocks(&infra.blocks),
        loading: infra.loading,
        floor_form_block: infra.floor_form_block,
        room_form_block: infra.room_form_block,
        room_form_floors: infra
            .room_form_floors
            .iter()
            .map(|f| PickerOption {
                id: f.id,
                label: f.label(),
            })
            .collect(),
        room_form_floor: infra.room_form_floor,
        room_form_floors_loading: infra.room_form_floors_loading,
    }
}

fn users(model: &Model) -> UsersView {
    UsersView {
        users: model
            .users
            .users
            .iter()
            .map(|user| {
                let roles = user.role_set();
                UserRowView {
                    id: user.id,
                    name: user.name.clone(),
                    mobile_number: user.mobile_number.clone(),
                    email: user.email_label(),
                    roles: user.roles.clone(),
                    is_admin: roles.is_admin(),
                    toggle_label: if roles.is_admin() {
                        "Make User".to_string()
                    } else {
                        "Make Admin".to_string()
                    },
                    busy: model.users.is_busy(user.id),
                }
            })
            .collect(),
        loading: model.users.loading,
    }
}
