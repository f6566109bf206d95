//! Route access decisions.

use crate::session::Session;

/// Paths under this prefix need a back-office role.
const ADMIN_PREFIX: &str = "/admin";
pub const LOGIN_PATH: &str = "/auth/login";
pub const HOME_PATH: &str = "/";

/// Severity of a redirect notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Warning,
    Negative,
}

/// Message shown alongside a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: &'static str,
}

/// Outcome of a navigation check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect { to: &'static str, notice: Notice },
}

/// Decides whether a navigation may proceed.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteGuard;

impl RouteGuard {
    #[must_use]
    pub fn check(path: &str, session: &Session) -> RouteDecision {
        if !is_admin_path(path) {
            return RouteDecision::Allow;
        }
        if !session.is_authenticated() {
            return RouteDecision::Redirect {
                to: LOGIN_PATH,
                notice: Notice {
                    level: NoticeLevel::Warning,
                    message: "Please sign in to continue.",
                },
            };
        }
        if !session.is_admin() {
            return RouteDecision::Redirect {
                to: HOME_PATH,
                notice: Notice {
                    level: NoticeLevel::Negative,
                    message: "You do not have permission to open the back office.",
                },
            };
        }
        RouteDecision::Allow
    }
}

/// `/admin` and everything below it, but not `/administrivia`.
fn is_admin_path(path: &str) -> bool {
    path.strip_prefix(ADMIN_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::User;

    fn session_with(role: &str) -> Session {
        let session = Session::in_memory();
        let user: User = serde_json::from_value(json!({
            "id": 1, "loginId": "someone", "name": "Someone", "role": role
        }))
        .unwrap();
        session.sign_in(user).unwrap();
        session
    }

    #[test]
    fn test_public_paths_are_allowed() {
        let session = Session::in_memory();
        assert_eq!(RouteGuard::check("/", &session), RouteDecision::Allow);
        assert_eq!(RouteGuard::check("/products/3", &session), RouteDecision::Allow);
        assert_eq!(RouteGuard::check("/administrivia", &session), RouteDecision::Allow);
    }

    #[test]
    fn test_signed_out_goes_to_login() {
        let decision = RouteGuard::check("/admin/products", &Session::in_memory());
        assert!(matches!(
            decision,
            RouteDecision::Redirect { to: LOGIN_PATH, notice } if notice.level == NoticeLevel::Warning
        ));
    }

    #[test]
    fn test_customer_goes_home() {
        let decision = RouteGuard::check("/admin", &session_with("USER"));
        assert!(matches!(decision, RouteDecision::Redirect { to: HOME_PATH, .. }));
    }

    #[test]
    fn test_admin_roles_pass() {
        for role in ["ROOT_ADMIN", "PRODUCT_ADMIN", "DELIVERY_ADMIN"] {
            assert_eq!(
                RouteGuard::check("/admin/orders", &session_with(role)),
                RouteDecision::Allow,
                "{role}"
            );
        }
    }
}
