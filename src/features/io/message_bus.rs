//! In-process message bus over a tokio channel.
//!
//! A writer publishes an event on a fixed interval and a processor consumes
//! them. Both run as background tasks for a bounded session that also ends
//! when the shared token is cancelled.

use crate::error::BrewError;
use crate::logging::Logger;
use crate::module::{Brew, BrewContext};
use crate::registry::Registration;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub fn registration() -> Registration {
    Registration::of::<MessageBusBrew>(module_path!())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    HelloWorld { sequence: u64 },
}

#[derive(Clone)]
pub struct EventBus {
    sender: mpsc::Sender<Event>,
}

impl EventBus {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }

    pub async fn publish(&self, event: Event) -> anyhow::Result<()> {
        self.sender
            .send(event)
            .await
            .map_err(|_| anyhow::anyhow!("message bus closed"))
    }
}

/// Publishes until `stop` fires. Returns how many events were sent.
async fn queue_writer(bus: EventBus, interval: Duration, stop: CancellationToken, log: Logger) -> u64 {
    let mut sequence = 0;
    loop {
        tokio::select! {
            biased;
            _ = stop.cancelled() => break,
            result = bus.publish(Event::HelloWorld { sequence }) => {
                if let Err(err) = result {
                    log.error(format!("Error publishing event: {err}"));
                    break;
                }
                sequence += 1;
            }
        }

        tokio::select! {
            _ = stop.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }
    log.info("QueueWriter has been cancelled");
    sequence
}

/// Consumes until `stop` fires or every writer is gone. Returns how many
/// events were received.
async fn queue_processor(mut queue: mpsc::Receiver<Event>, stop: CancellationToken, log: Logger) -> u64 {
    let mut received = 0;
    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            event = queue.recv() => match event {
                Some(Event::HelloWorld { sequence }) => {
                    log.info(format!("Event received: Hello, World! #{sequence}"));
                    received += 1;
                }
                None => break,
            },
        }
    }
    log.info("QueueProcessor is shutting down");
    received
}

pub struct MessageBusBrew {
    session: Duration,
    interval: Duration,
}

impl MessageBusBrew {
    pub fn new(session: Duration, interval: Duration) -> Self {
        Self { session, interval }
    }
}

impl Default for MessageBusBrew {
    fn default() -> Self {
        Self::new(Duration::from_millis(1_200), Duration::from_millis(200))
    }
}

#[async_trait]
impl Brew for MessageBusBrew {
    fn description(&self) -> Option<&str> {
        Some("Channels: an in-memory message bus with a background writer and processor")
    }

    async fn execute(&self, ctx: &BrewContext) -> anyhow::Result<()> {
        let log = ctx.logger();
        log.info(format!(
            "QueueWriter publishes every {} ms, QueueProcessor consumes asynchronously",
            self.interval.as_millis()
        ));

        let (bus, queue) = EventBus::channel(16);
        let stop = ctx.token().child_token();

        let writer = tokio::spawn(queue_writer(bus, self.interval, stop.clone(), log.scoped("writer")));
        let processor = tokio::spawn(queue_processor(queue, stop.clone(), log.scoped("processor")));

        tokio::select! {
            _ = tokio::time::sleep(self.session) => stop.cancel(),
            _ = stop.cancelled() => {}
        }

        let sent = writer.await?;
        let received = processor.await?;
        log.info(format!("Session over: {sent} published, {received} consumed"));

        if ctx.is_cancelled() {
            return Err(BrewError::Cancelled.into());
        }
        Ok(())
    }

    /// A hosted session has no setup or teardown of its own.
    async fn run(&self, ctx: &BrewContext) -> anyhow::Result<()> {
        ctx.checkpoint()?;
        self.execute(ctx).await
    }
}
