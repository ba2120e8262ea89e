//! Strategy pattern: the payment algorithm is swapped at runtime while the
//! checkout code stays the same.

use crate::logging::Logger;
use crate::module::{Brew, BrewContext};
use crate::registry::Registration;
use crate::services::ServiceCollection;
use async_trait::async_trait;
use rand::Rng;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn registration() -> Registration {
    Registration::of::<StrategyBrew>(module_path!())
}

/// Amount in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cents(pub u64);

impl std::fmt::Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

pub trait PaymentStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    /// Steps the processor goes through, in order.
    fn steps(&self) -> &'static [&'static str];
}

pub struct CreditCard;

impl PaymentStrategy for CreditCard {
    fn name(&self) -> &'static str {
        "Credit Card"
    }

    fn steps(&self) -> &'static [&'static str] {
        &["Validating card number...", "Charging card..."]
    }
}

pub struct PayPal;

impl PaymentStrategy for PayPal {
    fn name(&self) -> &'static str {
        "PayPal"
    }

    fn steps(&self) -> &'static [&'static str] {
        &["Authenticating with PayPal...", "Transferring funds..."]
    }
}

pub struct Cryptocurrency;

impl PaymentStrategy for Cryptocurrency {
    fn name(&self) -> &'static str {
        "Cryptocurrency (Bitcoin)"
    }

    fn steps(&self) -> &'static [&'static str] {
        &[
            "Converting USD to BTC...",
            "Initiating blockchain transaction...",
            "Waiting for confirmation...",
        ]
    }
}

/// Holds the current strategy. Checkout code only ever talks to this.
#[derive(Default)]
pub struct PaymentContext {
    strategy: Mutex<Option<Arc<dyn PaymentStrategy>>>,
}

impl PaymentContext {
    pub fn set_strategy(&self, strategy: Arc<dyn PaymentStrategy>, log: &Logger) {
        log.info(format!("Switching payment method to: {}", strategy.name()));
        *self.strategy.lock().unwrap_or_else(|p| p.into_inner()) = Some(strategy);
    }

    /// Returns the name of the strategy that processed the payment.
    pub fn process(&self, amount: Cents, log: &Logger) -> anyhow::Result<&'static str> {
        let strategy = self
            .strategy
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
            .ok_or_else(|| anyhow::anyhow!("No payment strategy set"))?;

        log.info(format!("[{}] Processing payment of {amount}", strategy.name()));
        for step in strategy.steps() {
            log.info(format!("[{}] {step}", strategy.name()));
        }
        log.info(format!("[{}] Payment successful!", strategy.name()));
        Ok(strategy.name())
    }
}

#[derive(Default)]
pub struct StrategyBrew;

#[async_trait]
impl Brew for StrategyBrew {
    fn description(&self) -> Option<&str> {
        Some("Strategy pattern: swapping payment algorithms at runtime")
    }

    fn configure_services(&self, services: &mut ServiceCollection) {
        services
            .add_singleton(|_| Ok(PaymentContext::default()))
            .add_instance(CreditCard)
            .add_instance(PayPal)
            .add_instance(Cryptocurrency);
    }

    async fn execute(&self, ctx: &BrewContext) -> anyhow::Result<()> {
        let log = ctx.logger();
        let checkout = ctx.resolve::<PaymentContext>()?;
        let card: Arc<dyn PaymentStrategy> = ctx.resolve::<CreditCard>()?;
        let paypal: Arc<dyn PaymentStrategy> = ctx.resolve::<PayPal>()?;
        let crypto: Arc<dyn PaymentStrategy> = ctx.resolve::<Cryptocurrency>()?;

        log.info("=== STRATEGY PATTERN ===");
        let purchases = [
            ("Book", Cents(2_999), &card),
            ("Laptop", Cents(129_999), &paypal),
            ("Gaming PC", Cents(249_999), &crypto),
            ("Coffee", Cents(450), &card),
        ];

        for (item, amount, strategy) in purchases {
            log.info(format!("--- Purchase: {item} ({amount}) ---"));
            checkout.set_strategy(Arc::clone(strategy), log);
            checkout.process(amount, log)?;

            // Time between purchases
            let pause = rand::thread_rng().gen_range(5..25);
            ctx.sleep(Duration::from_millis(pause)).await?;
        }
        Ok(())
    }
}
