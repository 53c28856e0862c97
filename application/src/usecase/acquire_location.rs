use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use capture_domain::{
    Capability, LocationFix, LocationSourcePort, PermissionStatus, PermissionsPort,
};

#[async_trait]
pub trait LocationProbe: Send + Sync {
    async fn acquire(&self) -> Option<LocationFix>;
}

/// Best-effort: every failure degrades to a missing fix, never to an error.
pub struct LocationProbeImpl {
    permissions: Arc<dyn PermissionsPort>,
    source: Arc<dyn LocationSourcePort>,
    fresh_timeout: Duration,
}

impl LocationProbeImpl {
    pub fn new(
        permissions: Arc<dyn PermissionsPort>,
        source: Arc<dyn LocationSourcePort>,
        fresh_timeout: Duration,
    ) -> Self {
        Self {
            permissions,
            source,
            fresh_timeout,
        }
    }
}

#[async_trait]
impl LocationProbe for LocationProbeImpl {
    async fn acquire(&self) -> Option<LocationFix> {
        match self.permissions.request(Capability::Location).await {
            Ok(PermissionStatus::Granted) => {}
            Ok(PermissionStatus::Denied) => {
                tracing::debug!("location permission denied; continuing without a fix");
                return None;
            }
            Err(err) => {
                tracing::warn!(error = %err, "location permission request failed");
                return None;
            }
        }

        let provisional = match self.source.last_known().await {
            Ok(fix) => fix,
            Err(err) => {
                tracing::warn!(error = %err, "last known fix lookup failed");
                None
            }
        };

        match tokio::time::timeout(self.fresh_timeout, self.source.current()).await {
            Ok(Ok(fresh)) => {
                tracing::debug!("fresh fix acquired before the deadline");
                Some(fresh)
            }
            Ok(Err(err)) => {
                tracing::warn!(error = %err, "fresh fix query failed; keeping the provisional fix");
                provisional
            }
            Err(_) => {
                tracing::debug!(
                    timeout_ms = self.fresh_timeout.as_millis() as u64,
                    "fresh fix timed out; keeping the provisional fix"
                );
                provisional
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capture_domain::DomainError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticPermission(PermissionStatus);

    #[async_trait]
    impl PermissionsPort for StaticPermission {
        async fn request(&self, _capability: Capability) -> Result<PermissionStatus, DomainError> {
            Ok(self.0)
        }
    }

    struct DelayedSource {
        last_known: Option<LocationFix>,
        fresh: LocationFix,
        fresh_delay: Duration,
        current_calls: AtomicUsize,
    }

    #[async_trait]
    impl LocationSourcePort for DelayedSource {
        async fn last_known(&self) -> Result<Option<LocationFix>, DomainError> {
            Ok(self.last_known)
        }

        async fn current(&self) -> Result<LocationFix, DomainError> {
            self.current_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.fresh_delay).await;
            Ok(self.fresh)
        }
    }

    fn fix(latitude: f64) -> LocationFix {
        LocationFix {
            latitude: Some(latitude),
            longitude: Some(2.35),
            ..LocationFix::default()
        }
    }

    #[tokio::test]
    async fn fresh_fix_wins_when_it_arrives_in_time() {
        let source = Arc::new(DelayedSource {
            last_known: Some(fix(48.0)),
            fresh: fix(49.0),
            fresh_delay: Duration::from_millis(10),
            current_calls: AtomicUsize::new(0),
        });
        let probe = LocationProbeImpl::new(
            Arc::new(StaticPermission(PermissionStatus::Granted)),
            Arc::clone(&source) as Arc<dyn LocationSourcePort>,
            Duration::from_millis(100),
        );

        let acquired = probe.acquire().await;
        assert_eq!(acquired, Some(fix(49.0)));
    }

    #[tokio::test]
    async fn timeout_falls_back_to_the_provisional_fix() {
        let source = Arc::new(DelayedSource {
            last_known: Some(fix(48.0)),
            fresh: fix(49.0),
            fresh_delay: Duration::from_millis(300),
            current_calls: AtomicUsize::new(0),
        });
        let probe = LocationProbeImpl::new(
            Arc::new(StaticPermission(PermissionStatus::Granted)),
            Arc::clone(&source) as Arc<dyn LocationSourcePort>,
            Duration::from_millis(50),
        );

        let acquired = probe.acquire().await;
        assert_eq!(acquired, Some(fix(48.0)));
    }

    #[tokio::test]
    async fn timeout_without_a_provisional_fix_yields_nothing() {
        let source = Arc::new(DelayedSource {
            last_known: None,
            fresh: fix(49.0),
            fresh_delay: Duration::from_millis(300),
            current_calls: AtomicUsize::new(0),
        });
        let probe = LocationProbeImpl::new(
            Arc::new(StaticPermission(PermissionStatus::Granted)),
            Arc::clone(&source) as Arc<dyn LocationSourcePort>,
            Duration::from_millis(50),
        );

        assert_eq!(probe.acquire().await, None);
    }

    #[tokio::test]
    async fn denied_permission_skips_the_source_entirely() {
        let source = Arc::new(DelayedSource {
            last_known: Some(fix(48.0)),
            fresh: fix(49.0),
            fresh_delay: Duration::from_millis(1),
            current_calls: AtomicUsize::new(0),
        });
        let probe = LocationProbeImpl::new(
            Arc::new(StaticPermission(PermissionStatus::Denied)),
            Arc::clone(&source) as Arc<dyn LocationSourcePort>,
            Duration::from_millis(50),
        );

        assert_eq!(probe.acquire().await, None);
        assert_eq!(source.current_calls.load(Ordering::SeqCst), 0);
    }
}
