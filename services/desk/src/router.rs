//! Screens of the desk and who may open them

use auth::{AuthState, Role};
use std::fmt;

/// Every screen, addressed by its path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    Signup,
    Display,
    RequestVisit,
    Dashboard,
    Register,
    Approval,
    Users,
    Logs,
    PreRegister,
    BulkUpload,
}

impl Route {
    pub const ALL: [Route; 12] = [
        Route::Home,
        Route::Login,
        Route::Signup,
        Route::Display,
        Route::RequestVisit,
        Route::Dashboard,
        Route::Register,
        Route::Approval,
        Route::Users,
        Route::Logs,
        Route::PreRegister,
        Route::BulkUpload,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/login",
            Route::Signup => "/signup",
            Route::Display => "/display",
            Route::RequestVisit => "/request-visit",
            Route::Dashboard => "/dashboard",
            Route::Register => "/dashboard/register",
            Route::Approval => "/dashboard/approval",
            Route::Users => "/dashboard/users",
            Route::Logs => "/dashboard/logs",
            Route::PreRegister => "/dashboard/pre-register-visitor",
            Route::BulkUpload => "/dashboard/bulk-visitor-upload",
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.trim_end_matches('/');
        let path = if path.is_empty() { "/" } else { path };
        Route::ALL.into_iter().find(|route| route.path() == path)
    }

    /// Open without signing in
    pub fn is_public(&self) -> bool {
        matches!(
            self,
            Route::Home | Route::Login | Route::Signup | Route::Display | Route::RequestVisit
        )
    }

    /// Roles allowed on a private route
    fn allows(&self, role: Role) -> bool {
        match self {
            Route::Users => role == Role::Admin,
            _ => role.is_supported(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Outcome of opening a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Allowed,
    Redirect(Route),
    Forbidden,
}

/// Decide whether `route` may be opened in `state`
pub fn gate(route: Route, state: &AuthState) -> Access {
    if route.is_public() {
        return Access::Allowed;
    }

    match &state.user {
        Some(user) if state.is_authenticated => {
            if route.allows(user.role) {
                Access::Allowed
            } else {
                Access::Forbidden
            }
        }
        _ => Access::Redirect(Route::Login),
    }
}

/// Where the desk goes after signing out
pub fn after_logout() -> Route {
    Route::Login
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::Host;
    use chrono::Utc;
    use uuid::Uuid;

    fn signed_in(role: Role) -> AuthState {
        AuthState {
            user: Some(Host {
                id: Uuid::new_v4(),
                auth_id: Uuid::new_v4(),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                department_id: None,
                role,
                active: true,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            }),
            is_authenticated: true,
            is_loading: false,
            error: None,
        }
    }

    fn signed_out() -> AuthState {
        AuthState {
            is_loading: false,
            ..AuthState::default()
        }
    }

    #[test]
    fn test_public_routes_are_always_open() {
        for route in Route::ALL.into_iter().filter(Route::is_public) {
            assert_eq!(gate(route, &signed_out()), Access::Allowed, "{route}");
        }
    }

    #[test]
    fn test_private_routes_redirect_to_login() {
        for route in Route::ALL.into_iter().filter(|r| !r.is_public()) {
            assert_eq!(
                gate(route, &signed_out()),
                Access::Redirect(Route::Login),
                "{route}"
            );
        }
    }

    #[test]
    fn test_users_page_is_admin_only() {
        assert_eq!(gate(Route::Users, &signed_in(Role::Admin)), Access::Allowed);
        assert_eq!(gate(Route::Users, &signed_in(Role::Guard)), Access::Forbidden);
        assert_eq!(gate(Route::Users, &signed_in(Role::Host)), Access::Forbidden);
        assert_eq!(gate(Route::Approval, &signed_in(Role::Host)), Access::Allowed);
    }

    #[test]
    fn test_unsupported_role_is_forbidden() {
        assert_eq!(
            gate(Route::Dashboard, &signed_in(Role::Unsupported)),
            Access::Forbidden
        );
    }

    #[test]
    fn test_logout_lands_on_public_route() {
        let route = after_logout();
        assert!(route.is_public());
        assert_eq!(gate(route, &signed_out()), Access::Allowed);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(Route::from_path("/dashboard/logs/"), Some(Route::Logs));
        assert_eq!(Route::from_path(""), Some(Route::Home));
        assert_eq!(Route::from_path("/nowhere"), None);
    }
}
