//! Which screen tree the shell shows.

use serde::{Deserialize, Serialize};

use crate::session::{Lifecycle, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Loading,
    Unauthenticated,
    User,
    Admin,
    SuperAdmin,
}

impl Route {
    /// Loading wins over everything, then a missing token. Super admin is
    /// checked before admin so a user holding both gets the wider tree.
    #[must_use]
    pub const fn from_flags(
        loading: bool,
        has_token: bool,
        is_admin: bool,
        is_super_admin: bool,
    ) -> Self {
        if loading {
            Self::Loading
        } else if !has_token {
            Self::Unauthenticated
        } else if is_super_admin {
            Self::SuperAdmin
        } else if is_admin {
            Self::Admin
        } else {
            Self::User
        }
    }

    /// A pending login holds a token but no user yet; it still routes to the
    /// auth screens.
    #[must_use]
    pub fn for_session(session: &Session) -> Self {
        let lifecycle = session.lifecycle();
        Self::from_flags(
            !lifecycle.is_ready(),
            lifecycle == Lifecycle::Authenticated,
            session.is_admin(),
            session.is_super_admin(),
        )
    }

    #[must_use]
    pub const fn tabs(self) -> &'static [Tab] {
        match self {
            Self::Loading | Self::Unauthenticated => &[],
            Self::User => &[Tab::Dashboard, Tab::Report, Tab::Profile],
            Self::Admin => &[Tab::Complaints, Tab::Infrastructure, Tab::Users, Tab::Profile],
            Self::SuperAdmin => &[
                Tab::Overview,
                Tab::Complaints,
                Tab::Infrastructure,
                Tab::Users,
                Tab::Profile,
            ],
        }
    }

    #[must_use]
    pub fn default_tab(self) -> Option<Tab> {
        self.tabs().first().copied()
    }

    #[must_use]
    pub fn has_tab(self, tab: Tab) -> bool {
        self.tabs().contains(&tab)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    Dashboard,
    Report,
    Profile,
    Complaints,
    Infrastructure,
    Users,
    Overview,
}

impl Tab {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Dashboard => "My Complaints",
            Self::Report => "Report Issue",
            Self::Profile => "Profile",
            Self::Complaints => "All Complaints",
            Self::Infrastructure => "Infrastructure",
            Self::Users => "Users",
            Self::Overview => "Overview",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthScreen {
    #[default]
    Login,
    Signup,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Navigation {
    pub auth_screen: AuthScreen,
    tab: Option<Tab>,
}

impl Navigation {
    /// The selected tab if `route` offers it, else the route's first tab.
    #[must_use]
    pub fn active_tab(&self, route: Route) -> Option<Tab> {
        self.tab
            .filter(|tab| route.has_tab(*tab))
            .or_else(|| route.default_tab())
    }

    /// Returns `false` for a tab `route` does not offer.
    pub fn select_tab(&mut self, route: Route, tab: Tab) -> bool {
        if !route.has_tab(tab) {
            return false;
        }
        self.tab = Some(tab);
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_from_flags() {
        assert_eq!(Route::from_flags(true, true, true, true), Route::Loading);
        assert_eq!(Route::from_flags(false, false, true, true), Route::Unauthenticated);
        assert_eq!(Route::from_flags(false, true, false, false), Route::User);
        assert_eq!(Route::from_flags(false, true, true, false), Route::Admin);
        assert_eq!(Route::from_flags(false, true, false, true), Route::SuperAdmin);
        assert_eq!(Route::from_flags(false, true, true, true), Route::SuperAdmin);
    }

    #[test]
    fn test_fresh_session_is_loading() {
        assert_eq!(Route::for_session(&Session::default()), Route::Loading);
    }

    #[test]
    fn test_tab_sets() {
        assert_eq!(
            Route::User.tabs(),
            &[Tab::Dashboard, Tab::Report, Tab::Profile]
        );
        assert_eq!(Route::Admin.default_tab(), Some(Tab::Complaints));
        assert_eq!(Route::SuperAdmin.default_tab(), Some(Tab::Overview));
        assert!(Route::Unauthenticated.tabs().is_empty());
        assert!(!Route::Admin.has_tab(Tab::Overview));
    }

    #[test]
    fn test_active_tab_falls_back_when_route_changes() {
        let mut nav = Navigation::default();
        assert!(nav.select_tab(Route::SuperAdmin, Tab::Overview));
        assert_eq!(nav.active_tab(Route::SuperAdmin), Some(Tab::Overview));
        assert_eq!(nav.active_tab(Route::User), Some(Tab::Dashboard));
    }

    #[test]
    fn test_select_tab_rejects_foreign_tab() {
        let mut nav = Navigation::default();
        assert!(!nav.select_tab(Route::User, Tab::Users));
        assert_eq!(nav.active_tab(Route::User), Some(Tab::Dashboard));

        assert!(nav.select_tab(Route::User, Tab::Report));
        nav.reset();
        assert_eq!(nav.active_tab(Route::User), Some(Tab::Dashboard));
    }
}
