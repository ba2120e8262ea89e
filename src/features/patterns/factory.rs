//! Factory pattern: one place decides which notification channel to build.

use crate::module::{Brew, BrewContext};
use crate::registry::Registration;
use crate::services::ServiceCollection;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub fn registration() -> Registration {
    Registration::of::<FactoryBrew>(module_path!())
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Email,
    Sms,
    Push,
    Slack,
}

impl NotificationKind {
    pub const ALL: [NotificationKind; 4] = [Self::Email, Self::Sms, Self::Push, Self::Slack];
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Email => "Email",
            Self::Sms => "SMS",
            Self::Push => "Push",
            Self::Slack => "Slack",
        };
        f.write_str(name)
    }
}

impl FromStr for NotificationKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow::anyhow!("Invalid notification type: {s}"))
    }
}

#[async_trait]
pub trait Notification: Send + Sync {
    fn kind(&self) -> NotificationKind;

    async fn send(&self, ctx: &BrewContext, recipient: &str, subject: &str) -> anyhow::Result<()>;
}

/// One channel: how it addresses the recipient and how long each step takes.
struct Channel {
    kind: NotificationKind,
    address_label: &'static str,
    transport: &'static str,
    connect: Duration,
    deliver: Duration,
}

#[async_trait]
impl Notification for Channel {
    fn kind(&self) -> NotificationKind {
        self.kind
    }

    async fn send(&self, ctx: &BrewContext, recipient: &str, subject: &str) -> anyhow::Result<()> {
        let log = ctx.logger();
        log.info(format!("[{}] Preparing to send...", self.kind));
        log.info(format!("  {}: {recipient}", self.address_label));
        log.info(format!("  Subject: {subject}"));
        log.info(format!("  Connecting to {}...", self.transport));
        ctx.sleep(self.connect).await?;
        ctx.sleep(self.deliver).await?;
        log.info(format!("  Sent successfully to {recipient}"));
        Ok(())
    }
}

// =============================================================================
// Factory
// =============================================================================

#[derive(Debug, Default)]
pub struct NotificationFactory;

impl NotificationFactory {
    pub fn create(&self, kind: NotificationKind) -> Box<dyn Notification> {
        let (address_label, transport, connect, deliver) = match kind {
            NotificationKind::Email => ("To", "SMTP server", 10, 15),
            NotificationKind::Sms => ("To", "SMS gateway", 8, 12),
            NotificationKind::Push => ("To device", "push service", 6, 9),
            NotificationKind::Slack => ("To channel", "Slack webhook", 7, 10),
        };
        Box::new(Channel {
            kind,
            address_label,
            transport,
            connect: Duration::from_millis(connect),
            deliver: Duration::from_millis(deliver),
        })
    }

    /// Builds from a configuration string such as `"sms"`.
    pub fn create_from_config(&self, kind: &str) -> anyhow::Result<Box<dyn Notification>> {
        Ok(self.create(kind.parse()?))
    }
}

// =============================================================================
// Brew
// =============================================================================

#[derive(Default)]
pub struct FactoryBrew;

#[async_trait]
impl Brew for FactoryBrew {
    fn description(&self) -> Option<&str> {
        Some("Factory pattern: centralised creation of notification channels")
    }

    fn configure_services(&self, services: &mut ServiceCollection) {
        services.add_instance(NotificationFactory);
    }

    async fn execute(&self, ctx: &BrewContext) -> anyhow::Result<()> {
        let log = ctx.logger();
        let factory = ctx.resolve::<NotificationFactory>()?;

        log.info("=== FACTORY PATTERN ===");
        let deliveries = [
            (NotificationKind::Email, "user@example.com", "Account Created"),
            (NotificationKind::Sms, "+1-555-0123", "Security Alert"),
            (NotificationKind::Push, "device_abc123", "New Message"),
            (NotificationKind::Slack, "#engineering", "Deployment"),
        ];
        for (kind, recipient, subject) in deliveries {
            log.info(format!("Sending {kind} notification"));
            factory.create(kind).send(ctx, recipient, subject).await?;
        }

        log.info("--- Creating from configuration strings ---");
        for config in ["Email", "SMS", "push", "Fax"] {
            match factory.create_from_config(config) {
                Ok(notification) => log.info(format!("'{config}' -> {}", notification.kind())),
                Err(err) => log.warn(format!("'{config}' -> {err}")),
            }
        }
        Ok(())
    }
}
