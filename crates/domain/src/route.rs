//! Application routes, navigation guards and the main menu.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Navigable views of the Mini App.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// Accounts overview, the landing view.
    #[default]
    Home,
    /// Login view shown when no session can be established.
    Login,
    /// Budgeting overview and statistics.
    Budgeting,
    /// User settings.
    Settings,
}

impl Route {
    /// Returns the absolute path of the route.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::Login => "/login",
            Self::Budgeting => "/budgeting",
            Self::Settings => "/settings",
        }
    }

    /// Returns true if the route is only reachable with a session.
    #[must_use]
    pub const fn requires_auth(self) -> bool {
        !matches!(self, Self::Login)
    }

    /// Decides whether navigation to this route may proceed.
    #[must_use]
    pub const fn guard(self, is_authenticated: bool) -> GuardDecision {
        match (self, is_authenticated) {
            (Self::Login, true) => GuardDecision::Redirect(Self::Home),
            (route, false) if route.requires_auth() => GuardDecision::Redirect(Self::Login),
            _ => GuardDecision::Allow,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Route {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s.trim_end_matches('/') {
            "" => Ok(Self::Home),
            "/login" | "login" => Ok(Self::Login),
            "/budgeting" | "budgeting" => Ok(Self::Budgeting),
            "/settings" | "settings" => Ok(Self::Settings),
            _ => Err(DomainError::UnknownRoute(s.to_string())),
        }
    }
}

/// Outcome of a route guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Navigation proceeds.
    Allow,
    /// Navigation is replaced by the given route.
    Redirect(Route),
}

impl GuardDecision {
    /// Returns the route that ends up displayed for a requested `route`.
    #[must_use]
    pub const fn target(self, requested: Route) -> Route {
        match self {
            Self::Allow => requested,
            Self::Redirect(route) => route,
        }
    }
}

/// Entry of the bottom navigation menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    /// Display text.
    pub text: &'static str,
    /// Icon name from the icon registry.
    pub icon: &'static str,
    /// Target route.
    pub to: Route,
    /// Sort position.
    pub order: u8,
    /// Whether the item is shown greyed out.
    pub disabled: bool,
}

/// Returns the menu entries sorted by their order.
#[must_use]
pub fn menu_items() -> Vec<MenuItem> {
    let mut items = vec![
        MenuItem {
            text: "Budgeting",
            icon: "Wallet",
            to: Route::Budgeting,
            order: 1,
            disabled: false,
        },
        MenuItem {
            text: "Settings",
            icon: "Settings",
            to: Route::Settings,
            order: 2,
            disabled: true,
        },
        MenuItem {
            text: "Accounts",
            icon: "House",
            to: Route::Home,
            order: 0,
            disabled: false,
        },
    ];
    items.sort_by_key(|item| item.order);
    items
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn protected_routes_redirect_to_login() {
        assert_eq!(
            Route::Budgeting.guard(false),
            GuardDecision::Redirect(Route::Login)
        );
        assert_eq!(Route::Home.guard(false), GuardDecision::Redirect(Route::Login));
        assert_eq!(Route::Budgeting.guard(true), GuardDecision::Allow);
    }

    #[test]
    fn login_redirects_authenticated_users_home() {
        assert_eq!(Route::Login.guard(true), GuardDecision::Redirect(Route::Home));
        assert_eq!(Route::Login.guard(false), GuardDecision::Allow);
        assert_eq!(Route::Login.guard(true).target(Route::Login), Route::Home);
    }

    #[test]
    fn route_paths_round_trip() {
        for route in [Route::Home, Route::Login, Route::Budgeting, Route::Settings] {
            assert_eq!(route.path().parse::<Route>().unwrap(), route);
        }
        assert!("/accounts".parse::<Route>().is_err());
    }

    #[test]
    fn menu_is_sorted_by_order() {
        let texts: Vec<_> = menu_items().iter().map(|item| item.text).collect();
        assert_eq!(texts, vec!["Accounts", "Budgeting", "Settings"]);
        assert!(menu_items()[2].disabled);
    }
}
