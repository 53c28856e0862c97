use std::time::Duration;

use async_trait::async_trait;

use capture_domain::{
    AuthPort, AuthenticatedUser, Capability, DomainError, LocationFix, LocationSourcePort,
    PermissionStatus, PermissionsPort,
};

pub struct StaticLocationSource {
    last_known: Option<LocationFix>,
    fresh: Option<LocationFix>,
    fresh_latency: Duration,
}

impl StaticLocationSource {
    pub fn new(fix: Option<LocationFix>) -> Self {
        Self {
            last_known: fix,
            fresh: fix,
            fresh_latency: Duration::ZERO,
        }
    }

    pub fn with_latency(
        last_known: Option<LocationFix>,
        fresh: Option<LocationFix>,
        fresh_latency: Duration,
    ) -> Self {
        Self {
            last_known,
            fresh,
            fresh_latency,
        }
    }
}

#[async_trait]
impl LocationSourcePort for StaticLocationSource {
    async fn last_known(&self) -> Result<Option<LocationFix>, DomainError> {
        Ok(self.last_known)
    }

    async fn current(&self) -> Result<LocationFix, DomainError> {
        tokio::time::sleep(self.fresh_latency).await;
        self.fresh
            .ok_or_else(|| DomainError::external_service_error("location", "no position available"))
    }
}

pub struct StaticPermissions {
    denied: Vec<Capability>,
}

impl StaticPermissions {
    pub fn allow_all() -> Self {
        Self { denied: Vec::new() }
    }

    pub fn denying(denied: &[Capability]) -> Self {
        Self {
            denied: denied.to_vec(),
        }
    }
}

#[async_trait]
impl PermissionsPort for StaticPermissions {
    async fn request(&self, capability: Capability) -> Result<PermissionStatus, DomainError> {
        if self.denied.contains(&capability) {
            tracing::debug!(capability = capability.as_str(), "permission denied by configuration");
            Ok(PermissionStatus::Denied)
        } else {
            Ok(PermissionStatus::Granted)
        }
    }
}

pub struct StaticAuthContext {
    token: Option<String>,
    user: Option<AuthenticatedUser>,
}

impl StaticAuthContext {
    pub fn new(token: Option<String>, user: Option<AuthenticatedUser>) -> Self {
        Self { token, user }
    }
}

#[async_trait]
impl AuthPort for StaticAuthContext {
    async fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }

    async fn current_user(&self) -> Option<AuthenticatedUser> {
        self.user.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn denied_capabilities_are_reported_as_denied() {
        let permissions = StaticPermissions::denying(&[Capability::Microphone]);
        assert_eq!(
            permissions.request(Capability::Microphone).await.expect("no failure"),
            PermissionStatus::Denied
        );
        assert_eq!(
            permissions.request(Capability::Location).await.expect("no failure"),
            PermissionStatus::Granted
        );
    }

    #[tokio::test]
    async fn source_without_a_position_fails_the_fresh_query() {
        let source = StaticLocationSource::new(None);
        assert_eq!(source.last_known().await.expect("no failure"), None);
        assert!(source.current().await.is_err());
    }

    #[tokio::test]
    async fn a_slow_fresh_query_loses_a_short_race() {
        let provisional = LocationFix {
            latitude: Some(48.8),
            ..LocationFix::default()
        };
        let fresh = LocationFix {
            latitude: Some(48.9),
            ..LocationFix::default()
        };
        let source = StaticLocationSource::with_latency(
            Some(provisional),
            Some(fresh),
            Duration::from_millis(100),
        );

        // The cached fix is instant.
        assert_eq!(
            source.last_known().await.expect("no failure"),
            Some(provisional)
        );

        let raced = tokio::time::timeout(Duration::from_millis(20), source.current()).await;
        assert!(raced.is_err(), "the configured latency must outlast the deadline");

        let eventual = source.current().await.expect("no failure");
        assert_eq!(eventual, fresh);
    }
}
