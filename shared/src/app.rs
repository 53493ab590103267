//! The update loop.
//!
//! Every screen follows the same shape: validate locally, raise the screen's
//! loading flag, hand one request to the shell, and on the reply either patch
//! state or raise an alert. Nothing is retried automatically.

use tracing::{debug, error, info, warn};

use crate::api::{self, ApiClient, Endpoint};
use crate::capabilities::{
    decode_session_values, Capabilities, HttpRequest, HttpResult, KvResult, SessionKey,
};
use crate::complaint::{
    can_leave_feedback, AdminAction, Complaint, ComplaintId, CreateComplaintRequest,
    CreatedComplaint, FeedbackRequest,
};
use crate::config::ApiConfig;
use crate::event::Event;
use crate::location::{
    Block, CreateBlockRequest, CreateFloorRequest, CreateRoomRequest, Floor, Room,
};
use crate::model::Model;
use crate::multipart::ImageAttachment;
use crate::roles::Role;
use crate::router::{AuthScreen, Tab};
use crate::screens::DetailState;
use crate::session::{ProfilePurpose, SessionTokens};
use crate::user::{
    EditProfileRequest, LoginRequest, SignupRequest, TokenPair, UpdateRoleRequest, UserId,
    UserProfile,
};
use crate::view::ViewModel;
use crate::{Alert, AlertKind, AppError, AppResult, ErrorKind};

const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";
const SERVER_UNREACHABLE: &str = "Could not reach the server";

#[derive(Default)]
pub struct App;

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        let event_name = event.name();
        if event.is_user_initiated() {
            info!(event = event_name, "user action");
        } else {
            debug!(event = event_name, "event");
        }

        if let Some(epoch) = event.session_epoch() {
            let current = model.session.epoch();
            if epoch != current {
                debug!(event = event_name, epoch, current, "dropping reply from an ended session");
                return;
            }
        }

        match event {
            Event::AppStarted => Self::start_restore(model, caps),

            Event::Configure {
                base_url,
                request_timeout_ms,
                upload_timeout_ms,
            } => match ApiConfig::new(&base_url)
                .and_then(|c| c.with_timeouts(request_timeout_ms, upload_timeout_ms))
            {
                Ok(config) => {
                    info!(
                        base_url = config.base_url(),
                        request_timeout_ms = config.request_timeout_ms(),
                        upload_timeout_ms = config.upload_timeout_ms(),
                        "backend configured"
                    );
                    model.config = config;
                }
                Err(e) => {
                    let e = AppError::from(e);
                    error!(code = e.code(), error = %e, "rejected backend URL");
                    model.set_alert(Alert::error(e.user_facing_message()));
                }
            },

            Event::RetryRestore => {
                if model.restore_retryable {
                    model.restore_retryable = false;
                    model.alert = None;
                    Self::start_restore(model, caps);
                } else {
                    debug!("nothing to retry");
                }
            }

            Event::TokensLoaded(result) => Self::tokens_loaded(model, caps, *result),

            Event::TokensPersisted(result) => Self::log_storage("persist", &result),

            Event::TokensCleared(result) => Self::log_storage("clear", &result),

            Event::ProfileLoaded {
                purpose, result, ..
            } => match api::decode::<UserProfile>(&result) {
                Ok(user) => Self::signed_in(model, caps, user),
                Err(e) => Self::profile_failed(model, caps, purpose, &e),
            },

            Event::ShowLogin => model.navigation.auth_screen = AuthScreen::Login,

            Event::ShowSignup => model.navigation.auth_screen = AuthScreen::Signup,

            Event::LoginSubmitted {
                mobile_number,
                password,
            } => Self::submit_login(model, caps, &mobile_number, &password),

            Event::LoginResponse { result, .. } => Self::login_response(model, caps, &result),

            Event::SignupSubmitted {
                name,
                mobile_number,
                email,
                password,
            } => {
                if model.auth.signup_loading {
                    return;
                }
                let request = match SignupRequest::new(&name, &mobile_number, &email, &password) {
                    Ok(body) => Self::client(model).json(Endpoint::Signup, &body),
                    Err(e) => {
                        model.set_alert(Alert::error(e.to_string()));
                        caps.render.render();
                        return;
                    }
                };
                if Self::dispatch(model, caps, request, |result| Event::SignupResponse {
                    result: Box::new(result),
                }) {
                    model.auth.signup_loading = true;
                }
            }

            Event::SignupResponse { result } => {
                model.auth.signup_loading = false;
                match api::expect_success(&result) {
                    Ok(()) => {
                        info!("registration accepted");
                        model.navigation.auth_screen = AuthScreen::Login;
                        model.set_alert(Alert::success("Registration successful! Please log in."));
                    }
                    Err(e) => {
                        warn!(code = e.code(), error = %e, "signup failed");
                        model.set_alert(Alert::from_error("Signup Failed", &e, "Something went wrong"));
                    }
                }
            }

            Event::LogoutRequested => {
                caps.session_store
                    .clear_session(|result| Event::TokensCleared(Box::new(result)));
                model.session.logout();
                model.clear_screens();
                model.alert = None;
                info!(epoch = model.session.epoch(), "signed out");
            }

            Event::EditProfileSubmitted { name, email } => {
                if !model.session.is_authenticated() {
                    return;
                }
                let request = match EditProfileRequest::new(&name, &email) {
                    Ok(body) => Self::client(model).json(Endpoint::EditProfile, &body),
                    Err(e) => {
                        model.set_alert(Alert::error(e.to_string()));
                        caps.render.render();
                        return;
                    }
                };
                let epoch = model.session.epoch();
                let (name, email) = (name.trim().to_string(), email.trim().to_string());
                Self::dispatch(model, caps, request, move |result| Event::ProfileEdited {
                    epoch,
                    name,
                    email,
                    result: Box::new(result),
                });
            }

            Event::ProfileEdited {
                name,
                email,
                result,
                ..
            } => Self::profile_edited(model, &result, name, email),

            Event::TabSelected(tab) => {
                let route = model.route();
                if model.navigation.select_tab(route, tab) {
                    model.detail = None;
                    Self::load_tab(model, caps);
                } else {
                    warn!(?tab, ?route, "tab not offered on this route");
                }
            }

            Event::ComplaintOpened(id) => Self::open_detail(model, id),

            Event::DetailClosed => model.detail = None,

            Event::AlertDismissed => model.alert = None,

            Event::MyComplaintsRequested { refresh } => {
                Self::fetch_my_complaints(model, caps, refresh);
            }

            Event::MyComplaintsLoaded { result, .. } => {
                match api::decode::<Vec<Complaint>>(&result) {
                    Ok(items) => {
                        debug!(count = items.len(), "my complaints loaded");
                        model.my_complaints.finish(items);
                    }
                    Err(e) => {
                        warn!(code = e.code(), error = %e, "error fetching my complaints");
                        model.my_complaints.fail();
                    }
                }
            }

            Event::ReportBlocksLoaded { result, .. } => {
                model.report.blocks_loading = false;
                match api::decode::<Vec<Block>>(&result) {
                    Ok(blocks) => model.report.selection.set_blocks(blocks),
                    Err(e) => warn!(code = e.code(), error = %e, "error fetching blocks"),
                }
            }

            Event::ReportBlockSelected(block_id) => {
                if !model.report.selection.select_block(block_id) {
                    warn!(%block_id, "unknown block selected");
                } else {
                    let request = Self::client(model).request(Endpoint::FloorsByBlock(block_id));
                    let epoch = model.session.epoch();
                    model.report.rooms_loading = false;
                    if Self::dispatch(model, caps, request, move |result| {
                        Event::ReportFloorsLoaded {
                            epoch,
                            block_id,
                            result: Box::new(result),
                        }
                    }) {
                        model.report.floors_loading = true;
                    }
                }
            }

            Event::ReportFloorsLoaded {
                block_id, result, ..
            } => match api::decode::<Vec<Floor>>(&result) {
                Ok(floors) => {
                    if model.report.selection.accept_floors(block_id, floors) {
                        model.report.floors_loading = false;
                    } else {
                        debug!(%block_id, "floors for a block no longer selected");
                    }
                }
                Err(e) => {
                    if model.report.selection.block() == Some(block_id) {
                        model.report.floors_loading = false;
                        warn!(code = e.code(), error = %e, "error fetching floors");
                        model.set_alert(Alert::error("Failed to fetch floors"));
                    }
                }
            },

            Event::ReportFloorSelected(floor_id) => {
                if !model.report.selection.select_floor(floor_id) {
                    warn!(%floor_id, "unknown floor selected");
                } else {
                    let request = Self::client(model).request(Endpoint::RoomsByFloor(floor_id));
                    let epoch = model.session.epoch();
                    if Self::dispatch(model, caps, request, move |result| {
                        Event::ReportRoomsLoaded {
                            epoch,
                            floor_id,
                            result: Box::new(result),
                        }
                    }) {
                        model.report.rooms_loading = true;
                    }
                }
            }

            Event::ReportRoomsLoaded {
                floor_id, result, ..
            } => match api::decode::<Vec<Room>>(&result) {
                Ok(rooms) => {
                    if model.report.selection.accept_rooms(floor_id, rooms) {
                        model.report.rooms_loading = false;
                    } else {
                        debug!(%floor_id, "rooms for a floor no longer selected");
                    }
                }
                Err(e) => {
                    if model.report.selection.floor() == Some(floor_id) {
                        model.report.rooms_loading = false;
                        warn!(code = e.code(), error = %e, "error fetching rooms");
                        model.set_alert(Alert::error("Failed to fetch rooms"));
                    }
                }
            },

            Event::ReportRoomSelected(room_id) => {
                if !model.report.selection.select_room(room_id) {
                    warn!(%room_id, "unknown room selected");
                }
            }

            Event::ImageAttached { bytes } => match ImageAttachment::from_bytes(bytes) {
                Ok(image) => {
                    debug!(len = image.len(), format = ?image.format(), "photo attached");
                    model.report.image = Some(image);
                }
                Err(e) => {
                    let e = AppError::from(e);
                    warn!(code = e.code(), error = %e, "photo rejected");
                    model.set_alert(Alert::error(e.user_facing_message()));
                }
            },

            Event::ImageRemoved => model.report.image = None,

            Event::ComplaintSubmitted { title, description } => {
                Self::submit_complaint(model, caps, &title, &description);
            }

            Event::ComplaintCreated { result, .. } => {
                match api::decode::<CreatedComplaint>(&result) {
                    Ok(created) => Self::complaint_created(model, caps, created.id),
                    Err(e) => Self::complaint_failed(model, &e),
                }
            }

            Event::ComplaintImageUploaded {
                complaint_id,
                result,
                ..
            } => {
                if model.report.uploading_for != Some(complaint_id) {
                    debug!(%complaint_id, "upload reply for a finished submission");
                } else {
                    match api::expect_success(&result) {
                        Ok(()) => Self::complaint_submitted(model, caps),
                        Err(e) => Self::complaint_failed(model, &e),
                    }
                }
            }

            Event::StatusChangeRequested(action) => Self::request_status_change(model, caps, action),

            Event::StatusChanged {
                complaint_id,
                status,
                result,
                ..
            } => {
                if let Some(detail) = model.detail.as_mut().filter(|d| d.id() == complaint_id) {
                    detail.status_loading = false;
                }
                match api::expect_success(&result) {
                    Ok(()) => {
                        if let Some(detail) =
                            model.detail.as_mut().filter(|d| d.id() == complaint_id)
                        {
                            detail.complaint.status = status;
                        }
                        let patched = model.my_complaints.patch_status(complaint_id, status)
                            + model.admin_board.list.patch_status(complaint_id, status);
                        info!(%complaint_id, %status, patched, "status updated");
                        model.set_alert(Alert::success(format!("Status updated to {status}")));
                    }
                    Err(e) => {
                        warn!(%complaint_id, code = e.code(), error = %e, "status update failed");
                        model.set_alert(Alert::error("Failed to update status"));
                    }
                }
            }

            Event::FeedbackSubmitted { rating, comment } => {
                Self::submit_feedback(model, caps, rating, &comment);
            }

            Event::FeedbackSent {
                complaint_id,
                result,
                ..
            } => {
                let showing = model.detail.as_ref().is_some_and(|d| d.id() == complaint_id);
                if let Some(detail) = model.detail.as_mut().filter(|_| showing) {
                    detail.feedback_loading = false;
                }
                match api::expect_success(&result) {
                    Ok(()) => {
                        info!(%complaint_id, "feedback submitted");
                        if showing {
                            model.detail = None;
                        }
                        model.set_alert(Alert::success("Feedback submitted"));
                    }
                    Err(e) => {
                        warn!(%complaint_id, code = e.code(), error = %e, "feedback failed");
                        model.set_alert(Alert::error("Failed to submit feedback"));
                    }
                }
            }

            Event::AllComplaintsRequested { refresh } => {
                Self::fetch_all_complaints(model, caps, refresh);
            }

            Event::AllComplaintsLoaded { result, .. } => {
                match api::decode::<Vec<Complaint>>(&result) {
                    Ok(items) => {
                        debug!(count = items.len(), "all complaints loaded");
                        model.admin_board.list.finish(items);
                    }
                    Err(e) => {
                        warn!(code = e.code(), error = %e, "error fetching admin complaints");
                        model.admin_board.list.fail();
                    }
                }
            }

            Event::StatusFilterSelected(filter) => model.admin_board.filter = filter,

            Event::BlocksRequested => Self::fetch_blocks(model, caps),

            Event::BlocksLoaded { result, .. } => match api::decode::<Vec<Block>>(&result) {
                Ok(blocks) => model.infrastructure.accept_blocks(blocks),
                Err(e) => {
                    model.infrastructure.loading = false;
                    warn!(code = e.code(), error = %e, "error fetching blocks");
                    model.set_alert(Alert::error("Failed to fetch blocks"));
                }
            },

            Event::CreateBlockSubmitted {
                block_name,
                description,
            } => {
                let Ok(body) = CreateBlockRequest::new(&block_name, &description) else {
                    debug!("block name empty; nothing to create");
                    return;
                };
                let request = Self::client(model).json(Endpoint::CreateBlock, &body);
                let epoch = model.session.epoch();
                Self::dispatch(model, caps, request, move |result| Event::BlockCreated {
                    epoch,
                    result: Box::new(result),
                });
            }

            Event::BlockCreated { result, .. } => match api::expect_success(&result) {
                Ok(()) => Self::fetch_blocks(model, caps),
                Err(e) => {
                    warn!(code = e.code(), error = %e, "block create failed");
                    model.set_alert(Alert::error("Failed to create block"));
                }
            },

            Event::FloorFormBlockSelected(block_id) => {
                if model.infrastructure.blocks.iter().any(|b| b.id == block_id) {
                    model.infrastructure.floor_form_block = Some(block_id);
                } else {
                    warn!(%block_id, "unknown block for floor form");
                }
            }

            Event::CreateFloorSubmitted { floor_no } => {
                let request = match CreateFloorRequest::new(
                    model.infrastructure.floor_form_block,
                    &floor_no,
                ) {
                    Ok(body) => Self::client(model).json(Endpoint::CreateFloor, &body),
                    Err(e) => {
                        model.set_alert(Alert::error(e.to_string()));
                        caps.render.render();
                        return;
                    }
                };
                let epoch = model.session.epoch();
                Self::dispatch(model, caps, request, move |result| Event::FloorCreated {
                    epoch,
                    result: Box::new(result),
                });
            }

            Event::FloorCreated { result, .. } => match api::expect_success(&result) {
                Ok(()) => {
                    model.set_alert(Alert::success("Floor added"));
                    Self::fetch_blocks(model, caps);
                }
                Err(e) => {
                    warn!(code = e.code(), error = %e, "floor create failed");
                    model.set_alert(Alert::error("Failed to create floor"));
                }
            },

            Event::RoomFormBlockSelected(block_id) => {
                if model.infrastructure.select_room_form_block(block_id) {
                    let request = Self::client(model).request(Endpoint::FloorsByBlock(block_id));
                    let epoch = model.session.epoch();
                    if !Self::dispatch(model, caps, request, move |result| {
                        Event::RoomFormFloorsLoaded {
                            epoch,
                            block_id,
                            result: Box::new(result),
                        }
                    }) {
                        model.infrastructure.room_form_floors_loading = false;
                    }
                } else {
                    warn!(%block_id, "unknown block for room form");
                }
            }

            Event::RoomFormFloorsLoaded {
                block_id, result, ..
            } => match api::decode::<Vec<Floor>>(&result) {
                Ok(floors) => {
                    if !model.infrastructure.accept_room_form_floors(block_id, floors) {
                        debug!(%block_id, "floors for a block no longer selected");
                    }
                }
                Err(e) => {
                    if model.infrastructure.room_form_block == Some(block_id) {
                        model.infrastructure.room_form_floors_loading = false;
                        warn!(code = e.code(), error = %e, "error fetching floors");
                        model.set_alert(Alert::error("Failed to fetch floors for this block"));
                    }
                }
            },

            Event::RoomFormFloorSelected(floor_id) => {
                if !model.infrastructure.select_room_form_floor(floor_id) {
                    warn!(%floor_id, "unknown floor for room form");
                }
            }

            Event::CreateRoomSubmitted { room_no } => {
                let request =
                    match CreateRoomRequest::new(model.infrastructure.room_form_floor, &room_no) {
                        Ok(body) => Self::client(model).json(Endpoint::CreateRoom, &body),
                        Err(e) => {
                            model.set_alert(Alert::error(e.to_string()));
                            caps.render.render();
                            return;
                        }
                    };
                let epoch = model.session.epoch();
                Self::dispatch(model, caps, request, move |result| Event::RoomCreated {
                    epoch,
                    result: Box::new(result),
                });
            }

            Event::RoomCreated { result, .. } => match api::expect_success(&result) {
                Ok(()) => {
                    model.set_alert(Alert::success("Room added"));
                    Self::fetch_blocks(model, caps);
                }
                Err(e) => {
                    warn!(code = e.code(), error = %e, "room create failed");
                    model.set_alert(Alert::error("Failed to create room"));
                }
            },

            Event::UsersRequested => Self::fetch_users(model, caps),

            Event::UsersLoaded { result, .. } => {
                model.users.loading = false;
                match api::decode::<Vec<UserProfile>>(&result) {
                    Ok(users) => {
                        model.users.users = users;
                        model.users.loaded = true;
                    }
                    Err(e) => {
                        warn!(code = e.code(), error = %e, "error fetching users");
                        model.set_alert(Alert::error("Failed to fetch users"));
                    }
                }
            }

            Event::UserDeleteConfirmed(user_id) => {
                if model.users.is_busy(user_id) {
                    return;
                }
                let request = Self::client(model).request(Endpoint::DeleteUser(user_id));
                let epoch = model.session.epoch();
                if Self::dispatch(model, caps, request, move |result| Event::UserDeleted {
                    epoch,
                    user_id,
                    result: Box::new(result),
                }) {
                    model.users.mark_busy(user_id);
                }
            }

            Event::UserDeleted {
                user_id, result, ..
            } => {
                model.users.clear_busy(user_id);
                match api::expect_success(&result) {
                    Ok(()) => {
                        info!(%user_id, "user deleted");
                        Self::fetch_users(model, caps);
                    }
                    Err(e) => {
                        warn!(%user_id, code = e.code(), error = %e, "user delete failed");
                        model.set_alert(Alert::error("Failed to delete user"));
                    }
                }
            }

            Event::UserRoleToggled(user_id) => Self::toggle_role(model, caps, user_id),

            Event::UserRoleUpdated {
                user_id,
                role,
                result,
                ..
            } => {
                model.users.clear_busy(user_id);
                match api::expect_success(&result) {
                    Ok(()) => {
                        info!(%user_id, %role, "role updated");
                        model.set_alert(Alert::success(format!("User updated to {role}")));
                        Self::fetch_users(model, caps);
                    }
                    Err(e) => {
                        warn!(%user_id, code = e.code(), error = %e, "role update failed");
                        model.set_alert(Alert::error("Failed to update role"));
                    }
                }
            }

            Event::OverviewRequested => Self::start_overview(model, caps),

            Event::OverviewUsersLoaded {
                generation, result, ..
            } => {
                let accepted = match api::decode::<Vec<UserProfile>>(&result) {
                    Ok(users) => model.overview.accept_users(generation, users),
                    Err(e) => Self::overview_failed(model, generation, &e),
                };
                Self::log_overview_reply(accepted, generation, "users");
            }

            Event::OverviewComplaintsLoaded {
                generation, result, ..
            } => {
                let accepted = match api::decode::<Vec<Complaint>>(&result) {
                    Ok(complaints) => model.overview.accept_complaints(generation, complaints),
                    Err(e) => Self::overview_failed(model, generation, &e),
                };
                Self::log_overview_reply(accepted, generation, "complaints");
            }

            Event::OverviewBlocksLoaded {
                generation, result, ..
            } => {
                let accepted = match api::decode::<Vec<Block>>(&result) {
                    Ok(blocks) => model.overview.accept_blocks(generation, blocks),
                    Err(e) => Self::overview_failed(model, generation, &e),
                };
                Self::log_overview_reply(accepted, generation, "blocks");
            }
        }

        caps.render.render();
    }

    fn view(&self, model: &Model) -> ViewModel {
        ViewModel::build(model)
    }
}

impl App {
    fn client(model: &Model) -> ApiClient<'_> {
        ApiClient::new(&model.config, model.session.access_token())
    }

    /// Hands a built request to the shell. A request that could not be built
    /// becomes an error alert and `false`.
    fn dispatch<F>(
        model: &mut Model,
        caps: &Capabilities,
        request: AppResult<HttpRequest>,
        make_event: F,
    ) -> bool
    where
        F: FnOnce(HttpResult) -> Event + Send + 'static,
    {
        match request {
            Ok(request) => {
                debug!(
                    method = %request.method(),
                    path = %request.url().path_and_query(),
                    request_id = request.request_id(),
                    "sending request"
                );
                caps.api.send(request, make_event);
                true
            }
            Err(e) => {
                error!(code = e.code(), error = %e, "could not build request");
                model.set_alert(Alert::error(e.user_facing_message()));
                false
            }
        }
    }

    fn log_storage(action: &'static str, result: &KvResult) {
        match result {
            Ok(_) => debug!(action, "session storage updated"),
            Err(e) => {
                let retryable = e.is_retryable();
                let e = AppError::from(e.clone());
                warn!(action, retryable, code = e.code(), error = %e, "session storage failed");
            }
        }
    }

    fn start_restore(model: &mut Model, caps: &Capabilities) {
        match model.session.begin_restore() {
            Ok(()) => caps
                .session_store
                .load_session(|result| Event::TokensLoaded(Box::new(result))),
            Err(e) => warn!(error = %e, "restore not started"),
        }
    }

    fn tokens_loaded(model: &mut Model, caps: &Capabilities, result: KvResult) {
        let tokens = match result.and_then(decode_session_values) {
            Ok((access, refresh)) => SessionTokens::new(access, refresh).ok(),
            Err(e) => {
                warn!(retryable = e.is_retryable(), error = %e, "failed to load storage data");
                None
            }
        };

        match model.session.restored(tokens) {
            Ok(true) => Self::fetch_profile(model, caps, ProfilePurpose::Restore),
            Ok(false) => info!("no stored session"),
            Err(e) => warn!(error = %e, "stored tokens arrived out of order"),
        }
    }

    fn fetch_profile(model: &mut Model, caps: &Capabilities, purpose: ProfilePurpose) {
        let request = Self::client(model).request(Endpoint::Profile);
        let epoch = model.session.epoch();
        if !Self::dispatch(model, caps, request, move |result| Event::ProfileLoaded {
            epoch,
            purpose,
            result: Box::new(result),
        }) {
            model.session.abandon_pending();
            model.auth.login_loading = false;
        }
    }

    fn signed_in(model: &mut Model, caps: &Capabilities, user: UserProfile) {
        let user_id = user.id;
        if let Err(e) = model.session.authenticate(user) {
            warn!(error = %e, "profile arrived without a pending session");
            return;
        }
        model.auth = Default::default();
        model.restore_retryable = false;
        model.navigation.reset();
        info!(
            %user_id,
            route = ?model.route(),
            roles = %model.session.roles().map(ToString::to_string).unwrap_or_default(),
            "signed in"
        );
        Self::load_tab(model, caps);
    }

    fn profile_failed(
        model: &mut Model,
        caps: &Capabilities,
        purpose: ProfilePurpose,
        e: &AppError,
    ) {
        warn!(?purpose, code = e.code(), error = %e, "profile fetch failed");
        model.session.abandon_pending();
        model.auth.login_loading = false;

        match purpose {
            ProfilePurpose::Login => {
                caps.session_store
                    .clear_session(|result| Event::TokensCleared(Box::new(result)));
                model.set_alert(Alert::from_error("Login Failed", e, "Invalid credentials"));
            }
            ProfilePurpose::Restore if e.kind.is_auth_failure() => {
                caps.session_store
                    .clear_session(|result| Event::TokensCleared(Box::new(result)));
                model.set_alert(Alert::new(AlertKind::Info, "Session Expired", SESSION_EXPIRED));
            }
            // The server answered; asking again gets the same unreadable profile.
            ProfilePurpose::Restore if e.kind == ErrorKind::Serialization => {
                model.set_alert(Alert::error(e.user_facing_message()));
            }
            ProfilePurpose::Restore => {
                model.restore_retryable = true;
                model.set_alert(Alert::error(SERVER_UNREACHABLE));
            }
        }
    }

    fn submit_login(model: &mut Model, caps: &Capabilities, mobile_number: &str, password: &str) {
        if model.auth.login_loading || model.session.is_authenticated() {
            return;
        }
        let request = match LoginRequest::new(mobile_number, password) {
            Ok(body) => Self::client(model).json(Endpoint::Login, &body),
            Err(e) => {
                model.set_alert(Alert::error(e.to_string()));
                return;
            }
        };
        let epoch = model.session.epoch();
        if Self::dispatch(model, caps, request, move |result| Event::LoginResponse {
            epoch,
            result: Box::new(result),
        }) {
            model.auth.login_loading = true;
        }
    }

    fn login_response(model: &mut Model, caps: &Capabilities, result: &HttpResult) {
        let tokens = api::decode::<TokenPair>(result).and_then(|pair| {
            SessionTokens::new(pair.access_token, pair.refresh_token).map_err(AppError::from)
        });
        let tokens = match tokens {
            Ok(tokens) => tokens,
            Err(e) => {
                model.auth.login_loading = false;
                warn!(code = e.code(), error = %e, "login failed");
                model.set_alert(Alert::from_error("Login Failed", &e, "Invalid credentials"));
                return;
            }
        };

        if let Err(e) = model.session.begin_login(tokens) {
            model.auth.login_loading = false;
            warn!(error = %e, "login reply arrived in the wrong state");
            return;
        }

        if let Some(tokens) = model.session.tokens() {
            Self::persist(caps, SessionKey::AccessToken, tokens.access_value());
            if let Some(refresh) = tokens.refresh_value() {
                Self::persist(caps, SessionKey::RefreshToken, refresh);
            }
        }
        Self::fetch_profile(model, caps, ProfilePurpose::Login);
    }

    fn persist(caps: &Capabilities, key: SessionKey, value: &str) {
        if let Err(e) =
            caps.session_store
                .save(key, value, |result| Event::TokensPersisted(Box::new(result)))
        {
            warn!(key = key.as_str(), error = %e, "token not persisted");
        }
    }

    fn profile_edited(model: &mut Model, result: &HttpResult, name: String, email: String) {
        if let Err(e) = api::expect_success(result) {
            warn!(code = e.code(), error = %e, "profile edit failed");
            model.set_alert(Alert::from_error("Error", &e, "Failed to update profile"));
            return;
        }
        // Only the edited fields change. Roles and the mobile number stay as
        // the session knows them, whatever the reply body carries.
        let echoed = api::decode::<UserProfile>(result).ok();
        let updated = model.session.user().cloned().map(|user| {
            let (name, email) = match echoed {
                Some(reply) if reply.id == user.id && !reply.name.trim().is_empty() => {
                    (reply.name, reply.email)
                }
                _ => (name, Some(email).filter(|e| !e.is_empty())),
            };
            UserProfile { name, email, ..user }
        });
        match updated.map(|user| model.session.replace_user(user)) {
            Some(Ok(())) => model.set_alert(Alert::success("Profile updated")),
            Some(Err(e)) => warn!(error = %e, "profile edit arrived after sign out"),
            None => warn!("profile edit without a signed-in user"),
        }
    }

    fn open_detail(model: &mut Model, id: ComplaintId) {
        let found = model
            .my_complaints
            .find(id)
            .or_else(|| model.admin_board.list.find(id))
            .cloned();
        match found {
            Some(complaint) => model.detail = Some(DetailState::new(complaint)),
            None => warn!(complaint_id = %id, "opened a complaint that is not loaded"),
        }
    }

    /// Fetches whatever the active tab shows if it has not been loaded yet.
    fn load_tab(model: &mut Model, caps: &Capabilities) {
        match model.navigation.active_tab(model.route()) {
            Some(Tab::Dashboard) if !model.my_complaints.is_loaded() => {
                Self::fetch_my_complaints(model, caps, false);
            }
            Some(Tab::Report) if model.report.selection.blocks().is_empty() => {
                Self::fetch_report_blocks(model, caps);
            }
            Some(Tab::Complaints) if !model.admin_board.list.is_loaded() => {
                Self::fetch_all_complaints(model, caps, false);
            }
            Some(Tab::Infrastructure) if !model.infrastructure.loaded => {
                Self::fetch_blocks(model, caps);
            }
            Some(Tab::Users) if !model.users.loaded => Self::fetch_users(model, caps),
            Some(Tab::Overview) if model.overview.stats().is_none() => {
                Self::start_overview(model, caps);
            }
            _ => {}
        }
    }

    fn fetch_my_complaints(model: &mut Model, caps: &Capabilities, refresh: bool) {
        let list = &model.my_complaints;
        if list.is_loading() || list.is_refreshing() || !model.session.is_authenticated() {
            return;
        }
        let request = Self::client(model).request(Endpoint::MyComplaints);
        let epoch = model.session.epoch();
        if Self::dispatch(model, caps, request, move |result| Event::MyComplaintsLoaded {
            epoch,
            result: Box::new(result),
        }) {
            model.my_complaints.begin_fetch(refresh);
        }
    }

    fn fetch_all_complaints(model: &mut Model, caps: &Capabilities, refresh: bool) {
        let list = &model.admin_board.list;
        if list.is_loading() || list.is_refreshing() || !model.session.can_manage() {
            return;
        }
        let request = Self::client(model).request(Endpoint::ListComplaints);
        let epoch = model.session.epoch();
        if Self::dispatch(model, caps, request, move |result| Event::AllComplaintsLoaded {
            epoch,
            result: Box::new(result),
        }) {
            model.admin_board.list.begin_fetch(refresh);
        }
    }

    fn fetch_report_blocks(model: &mut Model, caps: &Capabilities) {
        if model.report.blocks_loading {
            return;
        }
        let request = Self::client(model).request(Endpoint::ListBlocks);
        let epoch = model.session.epoch();
        if Self::dispatch(model, caps, request, move |result| Event::ReportBlocksLoaded {
            epoch,
            result: Box::new(result),
        }) {
            model.report.blocks_loading = true;
        }
    }

    fn fetch_blocks(model: &mut Model, caps: &Capabilities) {
        if model.infrastructure.loading {
            return;
        }
        let request = Self::client(model).request(Endpoint::ListBlocks);
        let epoch = model.session.epoch();
        if Self::dispatch(model, caps, request, move |result| Event::BlocksLoaded {
            epoch,
            result: Box::new(result),
        }) {
            model.infrastructure.loading = true;
        }
    }

    fn fetch_users(model: &mut Model, caps: &Capabilities) {
        if model.users.loading {
            return;
        }
        let request = Self::client(model).request(Endpoint::ListUsers);
        let epoch = model.session.epoch();
        if Self::dispatch(model, caps, request, move |result| Event::UsersLoaded {
            epoch,
            result: Box::new(result),
        }) {
            model.users.loading = true;
        }
    }

    fn submit_complaint(model: &mut Model, caps: &Capabilities, title: &str, description: &str) {
        if model.report.submitting {
            return;
        }
        let location = model.report.selection.complete();
        let request = match CreateComplaintRequest::new(location, title, description) {
            Ok(body) => Self::client(model).json(Endpoint::CreateComplaint, &body),
            Err(e) => {
                model.set_alert(Alert::error(e.to_string()));
                return;
            }
        };
        let epoch = model.session.epoch();
        if Self::dispatch(model, caps, request, move |result| Event::ComplaintCreated {
            epoch,
            result: Box::new(result),
        }) {
            model.report.submitting = true;
        }
    }

    fn complaint_created(model: &mut Model, caps: &Capabilities, complaint_id: ComplaintId) {
        info!(%complaint_id, with_photo = model.report.image.is_some(), "complaint created");
        let Some(image) = model.report.image.as_ref() else {
            Self::complaint_submitted(model, caps);
            return;
        };

        let request = Self::client(model).upload(complaint_id, image);
        let epoch = model.session.epoch();
        if Self::dispatch(model, caps, request, move |result| {
            Event::ComplaintImageUploaded {
                epoch,
                complaint_id,
                result: Box::new(result),
            }
        }) {
            model.report.uploading_for = Some(complaint_id);
        } else {
            model.report.submitting = false;
        }
    }

    fn complaint_submitted(model: &mut Model, caps: &Capabilities) {
        model.report.reset();
        model.set_alert(Alert::success("Complaint submitted successfully"));
        let route = model.route();
        if model.navigation.select_tab(route, Tab::Dashboard) {
            Self::fetch_my_complaints(model, caps, true);
        }
    }

    fn complaint_failed(model: &mut Model, e: &AppError) {
        warn!(code = e.code(), error = %e, "complaint submission failed");
        model.report.submitting = false;
        model.report.uploading_for = None;
        model.set_alert(Alert::from_error("Error", e, "Failed to submit complaint"));
    }

    fn request_status_change(model: &mut Model, caps: &Capabilities, action: AdminAction) {
        if !model.session.can_manage() {
            warn!(?action, "status change without admin rights");
            return;
        }
        let Some(detail) = model.detail.as_ref() else {
            return;
        };
        if !action.is_enabled(detail.complaint.status, detail.status_loading) {
            debug!(?action, status = %detail.complaint.status, "action not available");
            return;
        }

        let complaint_id = detail.id();
        let status = action.target();
        let request = Self::client(model).request(Endpoint::UpdateStatus {
            id: complaint_id,
            status,
        });
        let epoch = model.session.epoch();
        if Self::dispatch(model, caps, request, move |result| Event::StatusChanged {
            epoch,
            complaint_id,
            status,
            result: Box::new(result),
        }) {
            if let Some(detail) = model.detail.as_mut() {
                detail.status_loading = true;
            }
        }
    }

    fn submit_feedback(
        model: &mut Model,
        caps: &Capabilities,
        rating: Option<i32>,
        comment: &str,
    ) {
        let (Some(detail), Some(roles)) = (model.detail.as_ref(), model.session.roles()) else {
            return;
        };
        if detail.feedback_loading || !can_leave_feedback(roles, detail.complaint.status) {
            debug!(status = %detail.complaint.status, "feedback not available");
            return;
        }

        let complaint_id = detail.id();
        let request = match FeedbackRequest::new(rating, comment) {
            Ok(body) => Self::client(model).json(Endpoint::SubmitFeedback(complaint_id), &body),
            Err(e) => {
                model.set_alert(Alert::error(e.to_string()));
                return;
            }
        };
        let epoch = model.session.epoch();
        if Self::dispatch(model, caps, request, move |result| Event::FeedbackSent {
            epoch,
            complaint_id,
            result: Box::new(result),
        }) {
            if let Some(detail) = model.detail.as_mut() {
                detail.feedback_loading = true;
            }
        }
    }

    fn toggle_role(model: &mut Model, caps: &Capabilities, user_id: UserId) {
        if model.users.is_busy(user_id) {
            return;
        }
        let Some(user) = model.users.find(user_id) else {
            warn!(%user_id, "role toggle for an unknown user");
            return;
        };
        let role: Role = user.role_set().toggled();
        let body = UpdateRoleRequest {
            mobile_number: &user.mobile_number,
            roles: role,
        };
        let request = Self::client(model).json(Endpoint::UpdateRole, &body);
        let epoch = model.session.epoch();
        if Self::dispatch(model, caps, request, move |result| Event::UserRoleUpdated {
            epoch,
            user_id,
            role,
            result: Box::new(result),
        }) {
            model.users.mark_busy(user_id);
        }
    }

    fn start_overview(model: &mut Model, caps: &Capabilities) {
        if !model.session.is_super_admin() {
            return;
        }
        let generation = model.overview.begin();
        let epoch = model.session.epoch();
        let client = Self::client(model);
        let requests = [
            client.request(Endpoint::ListUsers),
            client.request(Endpoint::ListComplaints),
            client.request(Endpoint::ListBlocks),
        ];
        let [users, complaints, blocks] = requests;

        let sent = Self::dispatch(model, caps, users, move |result| Event::OverviewUsersLoaded {
            epoch,
            generation,
            result: Box::new(result),
        }) && Self::dispatch(model, caps, complaints, move |result| {
            Event::OverviewComplaintsLoaded {
                epoch,
                generation,
                result: Box::new(result),
            }
        }) && Self::dispatch(model, caps, blocks, move |result| {
            Event::OverviewBlocksLoaded {
                epoch,
                generation,
                result: Box::new(result),
            }
        });
        if !sent {
            model.overview.fail(generation);
        }
    }

    fn overview_failed(model: &mut Model, generation: u64, e: &AppError) -> bool {
        error!(generation, code = e.code(), error = %e, "error fetching dashboard stats");
        model.overview.fail(generation)
    }

    fn log_overview_reply(accepted: bool, generation: u64, part: &'static str) {
        if accepted {
            debug!(generation, part, "overview reply");
        } else {
            debug!(generation, part, "overview reply from a superseded round");
        }
    }
}
