//! Route authorization.
//!
//! The gate holds no state of its own. Every check re-reads the session
//! store, so a logout between two navigations is always observed.

use super::{
    models::{Role, Session},
    store::SessionStore,
};
use crate::router::Route;

/// Outcome of a navigation check.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AccessDecision {
    Allow,
    RedirectLogin,
    RedirectUnauthorized,
}

impl AccessDecision {
    #[must_use]
    pub fn is_allowed(self) -> bool {
        self == AccessDecision::Allow
    }

    /// Where to send the user instead, if anywhere.
    #[must_use]
    pub fn redirect(self) -> Option<Route> {
        match self {
            AccessDecision::Allow => None,
            AccessDecision::RedirectLogin => Some(Route::Login),
            AccessDecision::RedirectUnauthorized => Some(Route::Unauthorized),
        }
    }
}

/// How the gate treats principals with `enabled = false`.
///
/// The service enforces account status on every request; `Ignore` leaves
/// it at that. `Deny` additionally keeps disabled accounts out of every
/// protected route on the client.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DisabledPolicy {
    #[default]
    Ignore,
    Deny,
}

/// Decide whether `session` may enter a route requiring `required_roles`.
///
/// An empty `required_roles` means "any logged-in user". Without a session
/// the role is never consulted.
#[must_use]
pub fn decide(
    session: Option<&Session>,
    required_roles: &[Role],
    policy: DisabledPolicy,
) -> AccessDecision {
    let Some(session) = session else {
        return AccessDecision::RedirectLogin;
    };

    if policy == DisabledPolicy::Deny && !session.principal.enabled {
        return AccessDecision::RedirectUnauthorized;
    }

    if required_roles.is_empty() {
        return AccessDecision::Allow;
    }

    if required_roles.contains(&session.role()) {
        AccessDecision::Allow
    } else {
        AccessDecision::RedirectUnauthorized
    }
}

/// Authorization gate bound to a session store.
#[derive(Clone, Debug)]
pub struct Gate {
    store: SessionStore,
    disabled_policy: DisabledPolicy,
}

impl Gate {
    #[must_use]
    pub fn new(store: SessionStore) -> Self {
        Self {
            store,
            disabled_policy: DisabledPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_disabled_policy(mut self, policy: DisabledPolicy) -> Self {
        self.disabled_policy = policy;
        self
    }

    #[must_use]
    pub fn check(&self, required_roles: &[Role]) -> AccessDecision {
        let session = self.store.session();
        let decision = decide(session.as_ref(), required_roles, self.disabled_policy);
        tracing::debug!(?required_roles, ?decision, "Gate check");
        decision
    }

    /// Check a route. Public routes are always allowed.
    #[must_use]
    pub fn check_route(&self, route: &Route) -> AccessDecision {
        match route.required_roles() {
            None => AccessDecision::Allow,
            Some(roles) => self.check(roles),
        }
    }

    #[must_use]
    pub fn logged_in(&self) -> bool {
        self.store.is_authenticated()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.store.session().map(|s| s.role())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Principal;

    fn session(role: Role, enabled: bool) -> Session {
        Session {
            token: "t".to_string(),
            principal: Principal {
                id: 3,
                name: "Luis".to_string(),
                last_name: "Pérez".to_string(),
                phone: "3109876543".to_string(),
                email: "luis@example.com".to_string(),
                role,
                enabled,
            },
        }
    }

    #[test]
    fn no_session_always_redirects_to_login() {
        for roles in [&[][..], &[Role::Admin][..], &[Role::User, Role::Admin][..]] {
            assert_eq!(
                decide(None, roles, DisabledPolicy::Ignore),
                AccessDecision::RedirectLogin
            );
        }
    }

    #[test]
    fn user_is_kept_out_of_admin_routes() {
        let s = session(Role::User, true);
        assert_eq!(
            decide(Some(&s), &[Role::Admin], DisabledPolicy::Ignore),
            AccessDecision::RedirectUnauthorized
        );
        assert_eq!(
            decide(Some(&s), &[], DisabledPolicy::Ignore),
            AccessDecision::Allow
        );
        assert_eq!(
            decide(Some(&s), &[Role::Admin, Role::User], DisabledPolicy::Ignore),
            AccessDecision::Allow
        );
    }

    #[test]
    fn unknown_role_never_matches() {
        let s = session(Role::Unknown, true);
        assert_eq!(
            decide(Some(&s), &[Role::Admin, Role::User], DisabledPolicy::Ignore),
            AccessDecision::RedirectUnauthorized
        );
    }

    #[test]
    fn unreadable_principal_redirects_to_login() {
        use crate::auth::store::{MemoryStorage, Storage, TOKEN_KEY, USER_KEY};

        let storage = MemoryStorage::new();
        storage
            .set_many(&[(TOKEN_KEY, "t".to_string()), (USER_KEY, "{bad".to_string())])
            .unwrap();
        let gate = Gate::new(SessionStore::new(storage));

        assert_eq!(gate.check_route(&Route::Tickets), AccessDecision::RedirectLogin);
        assert_eq!(gate.check(&[Role::User]), AccessDecision::RedirectLogin);
        assert!(!gate.logged_in());
    }

    #[test]
    fn disabled_policy() {
        let s = session(Role::Admin, false);
        assert_eq!(
            decide(Some(&s), &[Role::Admin], DisabledPolicy::Ignore),
            AccessDecision::Allow
        );
        assert_eq!(
            decide(Some(&s), &[], DisabledPolicy::Deny),
            AccessDecision::RedirectUnauthorized
        );
    }

    #[test]
    fn gate_rereads_store_each_check() {
        let store = SessionStore::in_memory();
        let gate = Gate::new(store.clone());
        let s = session(Role::Admin, true);
        let principal = s.principal.clone();

        assert_eq!(gate.check(&[Role::Admin]), AccessDecision::RedirectLogin);

        store.save_session("t", &principal).unwrap();
        assert_eq!(gate.check(&[Role::Admin]), AccessDecision::Allow);
        assert_eq!(gate.role(), Some(Role::Admin));

        store.clear().unwrap();
        assert_eq!(gate.check(&[Role::Admin]), AccessDecision::RedirectLogin);
        assert!(!gate.logged_in());
    }

    #[test]
    fn redirect_targets() {
        assert_eq!(AccessDecision::Allow.redirect(), None);
        assert_eq!(AccessDecision::RedirectLogin.redirect(), Some(Route::Login));
        assert_eq!(
            AccessDecision::RedirectUnauthorized.redirect(),
            Some(Route::Unauthorized)
        );
    }
}
