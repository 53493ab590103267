//! Everything that can happen to the app: shell input and capability replies.
//!
//! Replies to requests made on behalf of a signed-in session carry the
//! session epoch they were issued under; `app` drops them once the epoch has
//! moved on.

use crate::capabilities::{HttpResult, KvResult};
use crate::complaint::{AdminAction, ComplaintId, ComplaintStatus, StatusFilter};
use crate::location::{BlockId, FloorId, RoomId};
use crate::roles::Role;
use crate::router::Tab;
use crate::session::ProfilePurpose;
use crate::user::UserId;

#[derive(Debug, Clone)]
pub enum Event {
    AppStarted,
    /// Sent by the shell at start. Timeouts left out keep their defaults.
    Configure {
        base_url: String,
        request_timeout_ms: Option<u64>,
        upload_timeout_ms: Option<u64>,
    },
    RetryRestore,
    TokensLoaded(Box<KvResult>),
    TokensPersisted(Box<KvResult>),
    TokensCleared(Box<KvResult>),
    ProfileLoaded {
        epoch: u64,
        purpose: ProfilePurpose,
        result: Box<HttpResult>,
    },

    ShowLogin,
    ShowSignup,
    LoginSubmitted {
        mobile_number: String,
        password: String,
    },
    LoginResponse {
        epoch: u64,
        result: Box<HttpResult>,
    },
    SignupSubmitted {
        name: String,
        mobile_number: String,
        email: String,
        password: String,
    },
    SignupResponse {
        result: Box<HttpResult>,
    },
    LogoutRequested,
    EditProfileSubmitted {
        name: String,
        email: String,
    },
    ProfileEdited {
        epoch: u64,
        name: String,
        email: String,
        result: Box<HttpResult>,
    },

    TabSelected(Tab),
    ComplaintOpened(ComplaintId),
    DetailClosed,
    AlertDismissed,

    MyComplaintsRequested {
        refresh: bool,
    },
    MyComplaintsLoaded {
        epoch: u64,
        result: Box<HttpResult>,
    },

    ReportBlocksLoaded {
        epoch: u64,
        result: Box<HttpResult>,
    },
    ReportBlockSelected(BlockId),
    ReportFloorsLoaded {
        epoch: u64,
        block_id: BlockId,
        result: Box<HttpResult>,
    },
    ReportFloorSelected(FloorId),
    ReportRoomsLoaded {
        epoch: u64,
        floor_id: FloorId,
        result: Box<HttpResult>,
    },
    ReportRoomSelected(RoomId),
    ImageAttached {
        bytes: Vec<u8>,
    },
    ImageRemoved,
    ComplaintSubmitted {
        title: String,
        description: String,
    },
    ComplaintCreated {
        epoch: u64,
        result: Box<HttpResult>,
    },
    ComplaintImageUploaded {
        epoch: u64,
        complaint_id: ComplaintId,
        result: Box<HttpResult>,
    },

    StatusChangeRequested(AdminAction),
    StatusChanged {
        epoch: u64,
        complaint_id: ComplaintId,
        status: ComplaintStatus,
        result: Box<HttpResult>,
    },
    FeedbackSubmitted {
        rating: Option<i32>,
        comment: String,
    },
    FeedbackSent {
        epoch: u64,
        complaint_id: ComplaintId,
        result: Box<HttpResult>,
    },

    AllComplaintsRequested {
        refresh: bool,
    },
    AllComplaintsLoaded {
        epoch: u64,
        result: Box<HttpResult>,
    },
    StatusFilterSelected(StatusFilter),

    BlocksRequested,
    BlocksLoaded {
        epoch: u64,
        result: Box<HttpResult>,
    },
    CreateBlockSubmitted {
        block_name: String,
        description: String,
    },
    BlockCreated {
        epoch: u64,
        result: Box<HttpResult>,
    },
    FloorFormBlockSelected(BlockId),
    CreateFloorSubmitted {
        floor_no: String,
    },
    FloorCreated {
        epoch: u64,
        result: Box<HttpResult>,
    },
    RoomFormBlockSelected(BlockId),
    RoomFormFloorsLoaded {
        epoch: u64,
        block_id: BlockId,
        result: Box<HttpResult>,
    },
    RoomFormFloorSelected(FloorId),
    CreateRoomSubmitted {
        room_no: String,
    },
    RoomCreated {
        epoch: u64,
        result: Box<HttpResult>,
    },

    UsersRequested,
    UsersLoaded {
        epoch: u64,
        result: Box<HttpResult>,
    },
    UserDeleteConfirmed(UserId),
    UserDeleted {
        epoch: u64,
        user_id: UserId,
        result: Box<HttpResult>,
    },
    UserRoleToggled(UserId),
    UserRoleUpdated {
        epoch: u64,
        user_id: UserId,
        role: Role,
        result: Box<HttpResult>,
    },

    OverviewRequested,
    OverviewUsersLoaded {
        epoch: u64,
        generation: u64,
        result: Box<HttpResult>,
    },
    OverviewComplaintsLoaded {
        epoch: u64,
        generation: u64,
        result: Box<HttpResult>,
    },
    OverviewBlocksLoaded {
        epoch: u64,
        generation: u64,
        result: Box<HttpResult>,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AppStarted => "app_started",
            Self::Configure { .. } => "configure",
            Self::RetryRestore => "retry_restore",
            Self::TokensLoaded(_) => "tokens_loaded",
            Self::TokensPersisted(_) => "tokens_persisted",
            Self::TokensCleared(_) => "tokens_cleared",
            Self::ProfileLoaded { .. } => "profile_loaded",
            Self::ShowLogin => "show_login",
            Self::ShowSignup => "show_signup",
            Self::LoginSubmitted { .. } => "login_submitted",
            Self::LoginResponse { .. } => "login_response",
            Self::SignupSubmitted { .. } => "signup_submitted",
            Self::SignupResponse { .. } => "signup_response",
            Self::LogoutRequested => "logout_requested",
            Self::EditProfileSubmitted { .. } => "edit_profile_submitted",
            Self::ProfileEdited { .. } => "profile_edited",
            Self::TabSelected(_) => "tab_selected",
            Self::ComplaintOpened(_) => "complaint_opened",
            Self::DetailClosed => "detail_closed",
            Self::AlertDismissed => "alert_dismissed",
            Self::MyComplaintsRequested { .. } => "my_complaints_requested",
            Self::MyComplaintsLoaded { .. } => "my_complaints_loaded",
            Self::ReportBlocksLoaded { .. } => "report_blocks_loaded",
            Self::ReportBlockSelected(_) => "report_block_selected",
            Self::ReportFloorsLoaded { .. } => "report_floors_loaded",
            Self::ReportFloorSelected(_) => "report_floor_selected",
            Self::ReportRoomsLoaded { .. } => "report_rooms_loaded",
            Self::ReportRoomSelected(_) => "report_room_selected",
            Self::ImageAttached { .. } => "image_attached",
            Self::ImageRemoved => "image_removed",
            Self::ComplaintSubmitted { .. } => "complaint_submitted",
            Self::ComplaintCreated { .. } => "complaint_created",
            Self::ComplaintImageUploaded { .. } => "complaint_image_uploaded",
            Self::StatusChangeRequested(_) => "status_change_requested",
            Self::StatusChanged { .. } => "status_changed",
            Self::FeedbackSubmitted { .. } => "feedback_submitted",
            Self::FeedbackSent { .. } => "feedback_sent",
            Self::AllComplaintsRequested { .. } => "all_complaints_requested",
            Self::AllComplaintsLoaded { .. } => "all_complaints_loaded",
            Self::StatusFilterSelected(_) => "status_filter_selected",
            Self::BlocksRequested => "blocks_requested",
            Self::BlocksLoaded { .. } => "blocks_loaded",
            Self::CreateBlockSubmitted { .. } => "create_block_submitted",
            Self::BlockCreated { .. } => "block_created",
            Self::FloorFormBlockSelected(_) => "floor_form_block_selected",
            Self::CreateFloorSubmitted { .. } => "create_floor_submitted",
            Self::FloorCreated { .. } => "floor_created",
            Self::RoomFormBlockSelected(_) => "room_form_block_selected",
            Self::RoomFormFloorsLoaded { .. } => "room_form_floors_loaded",
            Self::RoomFormFloorSelected(_) => "room_form_floor_selected",
            Self::CreateRoomSubmitted { .. } => "create_room_submitted",
            Self::RoomCreated { .. } => "room_created",
            Self::UsersRequested => "users_requested",
            Self::UsersLoaded { .. } => "users_loaded",
            Self::UserDeleteConfirmed(_) => "user_delete_confirmed",
            Self::UserDeleted { .. } => "user_deleted",
            Self::UserRoleToggled(_) => "user_role_toggled",
            Self::UserRoleUpdated { .. } => "user_role_updated",
            Self::OverviewRequested => "overview_requested",
            Self::OverviewUsersLoaded { .. } => "overview_users_loaded",
            Self::OverviewComplaintsLoaded { .. } => "overview_complaints_loaded",
            Self::OverviewBlocksLoaded { .. } => "overview_blocks_loaded",
        }
    }

    #[must_use]
    pub const fn is_user_initiated(&self) -> bool {
        matches!(
            self,
            Self::RetryRestore
                | Self::ShowLogin
                | Self::ShowSignup
                | Self::LoginSubmitted { .. }
                | Self::SignupSubmitted { .. }
                | Self::LogoutRequested
                | Self::EditProfileSubmitted { .. }
                | Self::TabSelected(_)
                | Self::ComplaintOpened(_)
                | Self::DetailClosed
                | Self::AlertDismissed
                | Self::MyComplaintsRequested { .. }
                | Self::ReportBlockSelected(_)
                | Self::ReportFloorSelected(_)
                | Self::ReportRoomSelected(_)
                | Self::ImageAttached { .. }
                | Self::ImageRemoved
                | Self::ComplaintSubmitted { .. }
                | Self::StatusChangeRequested(_)
                | Self::FeedbackSubmitted { .. }
                | Self::AllComplaintsRequested { .. }
                | Self::StatusFilterSelected(_)
                | Self::BlocksRequested
                | Self::CreateBlockSubmitted { .. }
                | Self::FloorFormBlockSelected(_)
                | Self::CreateFloorSubmitted { .. }
                | Self::RoomFormBlockSelected(_)
                | Self::RoomFormFloorSelected(_)
                | Self::CreateRoomSubmitted { .. }
                | Self::UsersRequested
                | Self::UserDeleteConfirmed(_)
                | Self::UserRoleToggled(_)
                | Self::OverviewRequested
        )
    }

    /// The epoch a session-bound reply was issued under.
    #[must_use]
    pub const fn session_epoch(&self) -> Option<u64> {
        match self {
            Self::ProfileLoaded { epoch, .. }
            | Self::LoginResponse { epoch, .. }
            | Self::ProfileEdited { epoch, .. }
            | Self::MyComplaintsLoaded { epoch, .. }
            | Self::ReportBlocksLoaded { epoch, .. }
            | Self::ReportFloorsLoaded { epoch, .. }
            | Self::ReportRoomsLoaded { epoch, .. }
            | Self::ComplaintCreated { epoch, .. }
            | Self::ComplaintImageUploaded { epoch, .. }
            | Self::StatusChanged { epoch, .. }
            | Self::FeedbackSent { epoch, .. }
            | Self::AllComplaintsLoaded { epoch, .. }
            | Self::BlocksLoaded { epoch, .. }
            | Self::BlockCreated { epoch, .. }
            | Self::FloorCreated { epoch, .. }
            | Self::RoomFormFloorsLoaded { epoch, .. }
            | Self::RoomCreated { epoch, .. }
            | Self::UsersLoaded { epoch, .. }
            | Self::UserDeleted { epoch, .. }
            | Self::UserRoleUpdated { epoch, .. }
            | Self::OverviewUsersLoaded { epoch, .. }
            | Self::OverviewComplaintsLoaded { epoch, .. }
            | Self::OverviewBlocksLoaded { epoch, .. } => Some(*epoch),
            _ => None,
        }
    }
}
