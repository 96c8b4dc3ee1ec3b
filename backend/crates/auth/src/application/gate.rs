//! Route Gate Use Case
//!
//! Classify, resolve, decide. The HTTP layer turns the outcome into a
//! redirect or a pass-through and applies the cookie mutation either way.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::resolve_session::{ResolveSessionUseCase, SessionResolution};
use crate::domain::decision::RequestClassification;
use crate::domain::provider::IdentityProvider;

/// Everything the gate learned about a request
#[derive(Debug, Clone)]
pub struct GateOutcome {
    pub classification: RequestClassification,
    pub resolution: SessionResolution,
}

impl GateOutcome {
    /// `Location` header value when the request is redirected
    pub fn redirect_location(&self, config: &AuthConfig) -> Option<String> {
        self.classification
            .decision
            .location(&config.login_path, &config.dashboard_path)
    }
}

/// Route gate use case
pub struct GateUseCase<P>
where
    P: IdentityProvider,
{
    resolver: ResolveSessionUseCase<P>,
    config: Arc<AuthConfig>,
}

impl<P> GateUseCase<P>
where
    P: IdentityProvider,
{
    pub fn new(provider: Arc<P>, config: Arc<AuthConfig>) -> Self {
        Self {
            resolver: ResolveSessionUseCase::new(provider, config.clone()),
            config,
        }
    }

    /// Evaluate a request path and its raw session cookie
    pub async fn evaluate(&self, path: &str, raw_cookie: Option<&str>) -> GateOutcome {
        let route_class = self.config.routes.classify(path);

        let resolution = if route_class.needs_session() {
            self.resolver.execute(raw_cookie).await
        } else {
            SessionResolution::anonymous()
        };

        let classification =
            RequestClassification::with_class(path, route_class, resolution.is_authenticated());

        tracing::debug!(
            path = %classification.pathname,
            route_class = %classification.route_class,
            has_identity = classification.has_identity,
            decision = ?classification.decision,
            "Route gate evaluated"
        );

        GateOutcome {
            classification,
            resolution,
        }
    }
}
