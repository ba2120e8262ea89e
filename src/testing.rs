//! Brews used by the unit tests.

use crate::module::{Brew, BrewContext};
use crate::registry::{Registration, Registry};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub struct Noop {
    description: Option<&'static str>,
}

impl Noop {
    pub fn described(description: &'static str) -> Self {
        Self {
            description: Some(description),
        }
    }
}

#[async_trait]
impl Brew for Noop {
    fn description(&self) -> Option<&str> {
        self.description
    }

    async fn execute(&self, _ctx: &BrewContext) -> anyhow::Result<()> {
        Ok(())
    }
}

pub fn noop(identity: &str) -> Registration {
    Registration::of::<Noop>(identity)
}

/// Records the identity of every brew that executes.
pub type RunLog = Arc<Mutex<Vec<String>>>;

pub struct Recording {
    log: RunLog,
}

#[async_trait]
impl Brew for Recording {
    async fn execute(&self, ctx: &BrewContext) -> anyhow::Result<()> {
        tokio::task::yield_now().await;
        self.log.lock().unwrap().push(ctx.identity().to_string());
        Ok(())
    }
}

pub fn recording(identity: &str, log: &RunLog) -> Registration {
    let log = Arc::clone(log);
    Registration::new(identity, move || {
        Ok(Box::new(Recording {
            log: Arc::clone(&log),
        }) as Box<dyn Brew>)
    })
}

pub struct Failing;

#[async_trait]
impl Brew for Failing {
    async fn execute(&self, ctx: &BrewContext) -> anyhow::Result<()> {
        anyhow::bail!("{} exploded on purpose", ctx.identity())
    }
}

pub fn failing(identity: &str) -> Registration {
    Registration::new(identity, || Ok(Box::new(Failing) as Box<dyn Brew>))
}

pub struct Panicking;

#[async_trait]
impl Brew for Panicking {
    async fn execute(&self, _ctx: &BrewContext) -> anyhow::Result<()> {
        panic!("brew panicked mid-demo");
    }
}

pub fn panicking(identity: &str) -> Registration {
    Registration::new(identity, || Ok(Box::new(Panicking) as Box<dyn Brew>))
}

/// Polls the token every few milliseconds, forever.
pub struct Polling;

#[async_trait]
impl Brew for Polling {
    async fn execute(&self, ctx: &BrewContext) -> anyhow::Result<()> {
        loop {
            ctx.sleep(Duration::from_millis(5)).await?;
        }
    }
}

pub fn polling(identity: &str) -> Registration {
    Registration::new(identity, || Ok(Box::new(Polling) as Box<dyn Brew>))
}

/// Never looks at the token.
pub struct Stubborn;

#[async_trait]
impl Brew for Stubborn {
    async fn execute(&self, _ctx: &BrewContext) -> anyhow::Result<()> {
        tokio::time::sleep(Duration::from_millis(60)).await;
        Ok(())
    }
}

pub fn stubborn(identity: &str) -> Registration {
    Registration::new(identity, || Ok(Box::new(Stubborn) as Box<dyn Brew>))
}

pub fn registry_of(identities: &[&str]) -> Registry {
    Registry::discover(identities.iter().map(|identity| noop(identity)))
}
