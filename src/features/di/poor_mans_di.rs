//! Poor man's DI versus container-driven DI.
//!
//! A car that builds its own parts is compared with one whose parts come
//! from the brew's service scope, where swapping an implementation is a
//! one-line change in `configure_services`.

use crate::logging::Logger;
use crate::module::{Brew, BrewContext};
use crate::registry::Registration;
use crate::services::{ServiceCollection, ServiceProvider};
use async_trait::async_trait;
use std::sync::Arc;

pub fn registration() -> Registration {
    Registration::of::<PoorMansDiBrew>(module_path!())
}

// ===== Parts =====

pub trait Wheels: Send + Sync {
    fn name(&self) -> &'static str;
    fn traction(&self) -> &'static str;
}

pub trait Engine: Send + Sync {
    fn name(&self) -> &'static str;
    fn horse_power(&self) -> u32;
}

pub trait Chassis: Send + Sync {
    fn name(&self) -> &'static str;
    fn material(&self) -> &'static str;
}

macro_rules! part {
    ($ty:ident: $trait:ident { $method:ident -> $ret:ty = $value:expr }) => {
        pub struct $ty;

        impl $trait for $ty {
            fn name(&self) -> &'static str {
                stringify!($ty)
            }

            fn $method(&self) -> $ret {
                $value
            }
        }
    };
}

part!(StandardWheels: Wheels { traction -> &'static str = "Standard" });
part!(ShinyWheels: Wheels { traction -> &'static str = "High-grip" });
part!(StandardEngine: Engine { horse_power -> u32 = 150 });
part!(FastEngine: Engine { horse_power -> u32 = 420 });
part!(SteelChassis: Chassis { material -> &'static str = "Steel" });
part!(SportsChassis: Chassis { material -> &'static str = "Carbon fibre" });

// ===== Cars =====

pub struct Car {
    wheels: Arc<dyn Wheels>,
    engine: Arc<dyn Engine>,
    chassis: Arc<dyn Chassis>,
}

impl Car {
    pub fn new(wheels: Arc<dyn Wheels>, engine: Arc<dyn Engine>, chassis: Arc<dyn Chassis>) -> Self {
        Self {
            wheels,
            engine,
            chassis,
        }
    }

    /// The anti-pattern: every dependency is hard-coded.
    pub fn concrete() -> Self {
        Self::new(Arc::new(StandardWheels), Arc::new(StandardEngine), Arc::new(SteelChassis))
    }

    /// Parts come from the container.
    pub fn from_services(provider: &ServiceProvider) -> anyhow::Result<Self> {
        Ok(Self::new(
            part_of::<dyn Wheels>(provider)?,
            part_of::<dyn Engine>(provider)?,
            part_of::<dyn Chassis>(provider)?,
        ))
    }

    pub fn drive(&self, log: &Logger) -> String {
        let summary = format!(
            "HP={} Traction={} ChassisMaterial={} ({}/{}/{})",
            self.engine.horse_power(),
            self.wheels.traction(),
            self.chassis.material(),
            self.wheels.name(),
            self.engine.name(),
            self.chassis.name()
        );
        log.info(format!("Driving -> {summary}"));
        summary
    }
}

/// Parts are registered as `Arc<dyn Part>`, so the provider hands back a
/// shared handle to a shared handle.
fn part_of<T: ?Sized + Send + Sync + 'static>(provider: &ServiceProvider) -> anyhow::Result<Arc<T>> {
    let part = provider.try_resolve::<Arc<T>>()?;
    Ok(Arc::clone(&*part))
}

// ===== Brew =====

#[derive(Default)]
pub struct PoorMansDiBrew;

#[async_trait]
impl Brew for PoorMansDiBrew {
    fn description(&self) -> Option<&str> {
        Some("Dependency injection: hard-coded parts versus parts resolved from a container")
    }

    fn configure_services(&self, services: &mut ServiceCollection) {
        services
            .add_transient(|_| Ok(Arc::new(ShinyWheels) as Arc<dyn Wheels>))
            .add_transient(|_| Ok(Arc::new(FastEngine) as Arc<dyn Engine>))
            .add_transient(|_| Ok(Arc::new(SportsChassis) as Arc<dyn Chassis>))
            .add_transient(Car::from_services);
    }

    async fn before(&self, ctx: &BrewContext) -> anyhow::Result<()> {
        let log = ctx.logger();
        log.info("=== POOR MAN'S DI (anti-pattern) ===");
        log.info("The concrete car instantiates every dependency itself");
        Car::concrete().drive(log);
        Ok(())
    }

    async fn execute(&self, ctx: &BrewContext) -> anyhow::Result<()> {
        ctx.checkpoint()?;
        Ok(())
    }

    async fn after(&self, ctx: &BrewContext) -> anyhow::Result<()> {
        let log = ctx.logger();
        log.info("=== CONTAINER-DRIVEN DI ===");
        log.info("The flexible car receives its parts from the service scope");
        ctx.resolve::<Car>()?.drive(log);
        Ok(())
    }
}
