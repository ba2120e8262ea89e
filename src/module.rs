//! The brew contract and its lifecycle.
//!
//! A brew is one self-contained demonstration. The host only knows it through
//! the [`Brew`] trait: an optional description, optional service
//! registrations, and three phases (`before`, `execute`, `after`) that the
//! provided [`Brew::run`] drives in order.

use crate::error::{BrewError, BrewResult};
use crate::logging::Logger;
use crate::services::{ServiceCollection, ServiceProvider};
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// =============================================================================
// Descriptor
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    identity: String,
    description: Option<String>,
}

impl Descriptor {
    pub fn new(identity: impl Into<String>, description: Option<String>) -> Self {
        Self {
            identity: identity.into(),
            description,
        }
    }

    /// Fully qualified, unique name, e.g. `brew::features::patterns::factory`.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Last path segment of the identity.
    pub fn short_name(&self) -> &str {
        self.identity.rsplit("::").next().unwrap_or(&self.identity)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

// =============================================================================
// Brew trait
// =============================================================================

#[async_trait]
pub trait Brew: Send + Sync + 'static {
    fn description(&self) -> Option<&str> {
        None
    }

    /// Registers collaborators for one invocation. Runs before every run
    /// against a fresh collection.
    fn configure_services(&self, _services: &mut ServiceCollection) {}

    async fn before(&self, _ctx: &BrewContext) -> anyhow::Result<()> {
        Ok(())
    }

    async fn execute(&self, ctx: &BrewContext) -> anyhow::Result<()>;

    async fn after(&self, _ctx: &BrewContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Drives the phases. Override only when the brew needs a different
    /// shape, such as a bounded background session.
    async fn run(&self, ctx: &BrewContext) -> anyhow::Result<()> {
        run_phases(self, ctx).await
    }
}

/// `before` → `execute` → `after`.
///
/// A failing `before` skips the rest. Once `before` succeeded, `after` always
/// runs, and an `execute` error takes precedence over an `after` error. A
/// panic in `execute` is resumed after teardown.
pub async fn run_phases<B>(brew: &B, ctx: &BrewContext) -> anyhow::Result<()>
where
    B: Brew + ?Sized,
{
    brew.before(ctx).await?;

    let executed = match ctx.checkpoint() {
        Ok(()) => AssertUnwindSafe(brew.execute(ctx)).catch_unwind().await,
        Err(err) => Ok(Err(err.into())),
    };
    let torn_down = brew.after(ctx).await;

    match executed {
        Ok(executed) => executed.and(torn_down),
        Err(payload) => {
            if let Err(err) = torn_down {
                ctx.logger().warn(format!("teardown after panic failed: {err:#}"));
            }
            panic::resume_unwind(payload)
        }
    }
}

/// Builds the brew's service scope and runs it. The scope is dropped on every
/// exit path.
pub async fn invoke(
    brew: &dyn Brew,
    identity: &str,
    token: CancellationToken,
) -> anyhow::Result<()> {
    if token.is_cancelled() {
        return Err(BrewError::Cancelled.into());
    }

    let mut services = ServiceCollection::new();
    brew.configure_services(&mut services);
    services.add_instance(Logger::new(identity));

    let ctx = BrewContext::new(identity, services.build(), token);
    brew.run(&ctx).await
}

// =============================================================================
// Run context
// =============================================================================

#[derive(Debug)]
pub struct BrewContext {
    identity: Arc<str>,
    logger: Logger,
    services: ServiceProvider,
    token: CancellationToken,
}

impl BrewContext {
    pub fn new(identity: &str, services: ServiceProvider, token: CancellationToken) -> Self {
        let identity: Arc<str> = Arc::from(identity);
        Self {
            logger: Logger::new(Arc::clone(&identity)),
            identity,
            services,
            token,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub fn services(&self) -> &ServiceProvider {
        &self.services
    }

    pub fn resolve<T>(&self) -> BrewResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.services.resolve::<T>()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cooperative yield point: fails with [`BrewError::Cancelled`] once
    /// cancellation was requested.
    pub fn checkpoint(&self) -> BrewResult<()> {
        if self.token.is_cancelled() {
            Err(BrewError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Sleeps unless cancelled first.
    pub async fn sleep(&self, duration: Duration) -> BrewResult<()> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(BrewError::Cancelled),
            _ = tokio::time::sleep(duration) => Ok(()),
        }
    }
}
