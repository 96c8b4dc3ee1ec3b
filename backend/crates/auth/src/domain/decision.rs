//! Redirect Policy
//!
//! The gate's verdict depends only on the route class and whether an
//! identity was resolved.

use crate::domain::route::{RouteClass, RouteTable, normalize_path};

/// What the gate does with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    /// Send the user to the login page, remembering where they were going
    RedirectToLogin { return_to: String },
    RedirectToDashboard,
}

impl Decision {
    /// Apply the decision table.
    ///
    /// `original_path` is only carried along for the login redirect.
    pub fn decide(route_class: RouteClass, has_identity: bool, original_path: &str) -> Self {
        match (route_class, has_identity) {
            (RouteClass::StaticAsset, _)
            | (RouteClass::ApiAuthPassthrough, _)
            | (RouteClass::Public, _)
            | (RouteClass::AuthOnly, false)
            | (RouteClass::Protected, true) => Decision::Allow,
            (RouteClass::AuthOnly, true) => Decision::RedirectToDashboard,
            (RouteClass::Protected, false) => Decision::RedirectToLogin {
                return_to: original_path.to_string(),
            },
        }
    }

    pub fn is_redirect(&self) -> bool {
        !matches!(self, Decision::Allow)
    }

    /// `Location` for redirect decisions, `None` for [`Decision::Allow`]
    pub fn location(&self, login_path: &str, dashboard_path: &str) -> Option<String> {
        match self {
            Decision::Allow => None,
            Decision::RedirectToLogin { return_to } => Some(format!(
                "{login_path}?redirectTo={}",
                urlencoding::encode(return_to)
            )),
            Decision::RedirectToDashboard => Some(dashboard_path.to_string()),
        }
    }
}

/// Per-request classification outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestClassification {
    /// Normalized request path
    pub pathname: String,
    pub route_class: RouteClass,
    pub has_identity: bool,
    pub decision: Decision,
}

impl RequestClassification {
    /// Classify `path` and decide. The login redirect keeps `path` exactly
    /// as requested, without its query string.
    pub fn new(routes: &RouteTable, path: &str, has_identity: bool) -> Self {
        let route_class = routes.classify(path);
        Self::with_class(path, route_class, has_identity)
    }

    pub fn with_class(path: &str, route_class: RouteClass, has_identity: bool) -> Self {
        Self {
            pathname: normalize_path(path),
            route_class,
            has_identity,
            decision: Decision::decide(route_class, has_identity, path),
        }
    }
}

/// Whether `target` is a same-site path safe to redirect to after login.
///
/// Rejects absolute URLs and protocol-relative `//host` forms, and anything
/// that is not printable ASCII since it must fit in a `Location` header.
pub fn is_safe_redirect(target: &str) -> bool {
    target.starts_with('/')
        && !target.starts_with("//")
        && !target.starts_with("/\\")
        && target.bytes().all(|b| b.is_ascii_graphic())
}
