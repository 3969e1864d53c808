//! Client-side routing surface.
//!
//! Every page is a [`Route`] variant and carries its own access requirement,
//! so role rules live in one table instead of at each call site.

use std::fmt;

use crate::auth::{Gate, Role};

const ANY_USER: &[Role] = &[];
const ADMIN_ONLY: &[Role] = &[Role::Admin];

/// A client page.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Route {
    Root,
    Login,
    Register,
    Dashboard,
    Movies,
    Tickets,
    Profile,
    AdminFilms,
    AdminFilmCreate,
    AdminFilmEdit(i64),
    AdminUsers,
    AdminUserCreate,
    AdminUserEdit(i64),
    AdminPurchases,
    Unauthorized,
    NotFound(String),
}

impl Route {
    /// Parse a path. Query strings, fragments and trailing slashes are ignored.
    #[must_use]
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Route::Root,
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["dashboard"] => Route::Dashboard,
            ["movies"] => Route::Movies,
            ["tickets"] | ["my-tickets"] => Route::Tickets,
            ["profile"] => Route::Profile,
            ["unauthorized"] => Route::Unauthorized,
            ["admin", "films"] => Route::AdminFilms,
            ["admin", "films", "create"] => Route::AdminFilmCreate,
            ["admin", "films", "edit", id] => match id.parse() {
                Ok(id) => Route::AdminFilmEdit(id),
                Err(_) => Route::NotFound(path.to_string()),
            },
            ["admin", "users"] => Route::AdminUsers,
            ["admin", "users", "create"] => Route::AdminUserCreate,
            ["admin", "users", "edit", id] => match id.parse() {
                Ok(id) => Route::AdminUserEdit(id),
                Err(_) => Route::NotFound(path.to_string()),
            },
            ["admin", "purchases"] => Route::AdminPurchases,
            _ => Route::NotFound(path.to_string()),
        }
    }

    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Route::Root => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::Movies => "/movies".to_string(),
            Route::Tickets => "/tickets".to_string(),
            Route::Profile => "/profile".to_string(),
            Route::AdminFilms => "/admin/films".to_string(),
            Route::AdminFilmCreate => "/admin/films/create".to_string(),
            Route::AdminFilmEdit(id) => format!("/admin/films/edit/{id}"),
            Route::AdminUsers => "/admin/users".to_string(),
            Route::AdminUserCreate => "/admin/users/create".to_string(),
            Route::AdminUserEdit(id) => format!("/admin/users/edit/{id}"),
            Route::AdminPurchases => "/admin/purchases".to_string(),
            Route::Unauthorized => "/unauthorized".to_string(),
            Route::NotFound(path) => path.clone(),
        }
    }

    /// Roles allowed on this route.
    ///
    /// `None` is a public route, `Some(&[])` needs any logged-in user.
    #[must_use]
    pub fn required_roles(&self) -> Option<&'static [Role]> {
        match self {
            Route::Root
            | Route::Login
            | Route::Register
            | Route::Unauthorized
            | Route::NotFound(_) => None,
            Route::Dashboard | Route::Movies | Route::Tickets | Route::Profile => Some(ANY_USER),
            Route::AdminFilms
            | Route::AdminFilmCreate
            | Route::AdminFilmEdit(_)
            | Route::AdminUsers
            | Route::AdminUserCreate
            | Route::AdminUserEdit(_)
            | Route::AdminPurchases => Some(ADMIN_ONLY),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Result of resolving a navigation attempt.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Navigation {
    Render(Route),
    Redirect(Route),
}

/// Resolve `path` against the current session.
#[must_use]
pub fn resolve(gate: &Gate, path: &str) -> Navigation {
    let route = Route::parse(path);
    if route == Route::Root {
        return Navigation::Redirect(Route::Login);
    }

    match gate.check_route(&route).redirect() {
        Some(target) => {
            tracing::info!(from = %route, to = %target, "Navigation redirected");
            Navigation::Redirect(target)
        }
        None => Navigation::Render(route),
    }
}
