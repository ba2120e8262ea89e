//! Chain of responsibility: a purchase request climbs the management chain
//! until someone with enough authority approves it.

use crate::logging::Logger;
use crate::module::{Brew, BrewContext};
use crate::registry::Registration;
use crate::services::ServiceCollection;
use async_trait::async_trait;
use std::time::Duration;

pub fn registration() -> Registration {
    Registration::of::<ChainOfResponsibilityBrew>(module_path!())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    /// Under $1,000
    Small,
    /// $1,000 to $10,000
    Medium,
    /// Over $10,000
    Large,
}

#[derive(Debug, Clone)]
pub struct Request {
    pub kind: RequestType,
    pub amount: u64,
    pub description: &'static str,
    pub approved_by: Option<&'static str>,
}

impl Request {
    pub fn new(kind: RequestType, amount: u64, description: &'static str) -> Self {
        Self {
            kind,
            amount,
            description,
            approved_by: None,
        }
    }
}

pub struct Employee {
    title: &'static str,
    authority: RequestType,
    successor: Option<Box<Employee>>,
}

impl Employee {
    pub fn new(title: &'static str, authority: RequestType) -> Self {
        Self {
            title,
            authority,
            successor: None,
        }
    }

    pub fn with_successor(mut self, successor: Employee) -> Self {
        self.successor = Some(Box::new(successor));
        self
    }

    pub fn title(&self) -> &'static str {
        self.title
    }

    /// Approves the request or forwards it. Returns who approved it.
    pub fn process(&self, request: &mut Request, log: &Logger) -> Option<&'static str> {
        log.info(format!(
            "[{}] Received request: {} (${})",
            self.title, request.description, request.amount
        ));

        if request.kind == self.authority {
            request.approved_by = Some(self.title);
            log.info(format!("[{}] APPROVED", self.title));
            return request.approved_by;
        }

        match &self.successor {
            Some(next) => {
                log.info(format!("[{}] Cannot approve, forwarding to {}", self.title, next.title));
                next.process(request, log)
            }
            None => {
                log.warn(format!("[{}] No further handlers in chain", self.title));
                None
            }
        }
    }
}

/// Team Lead → Manager → Director.
pub fn approval_chain() -> Employee {
    Employee::new("Team Lead", RequestType::Small).with_successor(
        Employee::new("Manager", RequestType::Medium)
            .with_successor(Employee::new("Director", RequestType::Large)),
    )
}

#[derive(Default)]
pub struct ChainOfResponsibilityBrew;

#[async_trait]
impl Brew for ChainOfResponsibilityBrew {
    fn description(&self) -> Option<&str> {
        Some("Chain of Responsibility: purchase approvals escalating through authority levels")
    }

    fn configure_services(&self, services: &mut ServiceCollection) {
        services.add_singleton(|_| Ok(approval_chain()));
    }

    async fn execute(&self, ctx: &BrewContext) -> anyhow::Result<()> {
        let log = ctx.logger();
        let chain = ctx.resolve::<Employee>()?;

        let requests = [
            Request::new(RequestType::Small, 500, "Office supplies"),
            Request::new(RequestType::Small, 850, "Software licenses for team"),
            Request::new(RequestType::Medium, 5_000, "New development server"),
            Request::new(RequestType::Medium, 9_500, "Conference attendance"),
            Request::new(RequestType::Large, 25_000, "Enterprise software upgrade"),
            Request::new(RequestType::Large, 75_000, "Cloud infrastructure migration"),
        ];

        for mut request in requests {
            match chain.process(&mut request, log) {
                Some(approver) => log.info(format!("FINAL RESULT: approved by {approver}")),
                None => log.warn("FINAL RESULT: not approved"),
            }
            ctx.sleep(Duration::from_millis(15)).await?;
        }
        Ok(())
    }
}
