use crate::config::ApiConfig;
use crate::router::{Navigation, Route};
use crate::screens::{
    AdminBoard, AuthForms, ComplaintList, DetailState, Infrastructure, Overview, ReportForm,
    UserAdmin,
};
use crate::session::Session;
use crate::Alert;

/// The whole client state. Only `session` is shared between screens; each
/// screen otherwise owns its own slice.
#[derive(Debug, Default)]
pub struct Model {
    pub config: ApiConfig,
    pub session: Session,
    /// Set when hydration could not reach the server; the shell may offer a
    /// retry.
    pub restore_retryable: bool,
    pub navigation: Navigation,
    pub auth: AuthForms,
    pub my_complaints: ComplaintList,
    pub admin_board: AdminBoard,
    pub report: ReportForm,
    pub detail: Option<DetailState>,
    pub infrastructure: Infrastructure,
    pub users: UserAdmin,
    pub overview: Overview,
    pub alert: Option<Alert>,
}

impl Model {
    #[must_use]
    pub fn route(&self) -> Route {
        Route::for_session(&self.session)
    }

    pub fn set_alert(&mut self, alert: Alert) {
        self.alert = Some(alert);
    }

    /// Drops everything a signed-in user could have seen. Config and the
    /// session (which logs out on its own) are untouched.
    pub fn clear_screens(&mut self) {
        self.restore_retryable = false;
        self.navigation.reset();
        self.auth = AuthForms::default();
        self.my_complaints = ComplaintList::default();
        self.admin_board = AdminBoard::default();
        self.report = ReportForm::default();
        self.detail = None;
        self.infrastructure = Infrastructure::default();
        self.users = UserAdmin::default();
        self.overview = Overview::default();
    }
}
