//! Fire-and-forget request duplication.
//!
//! # Data Flow
//! ```text
//! TeeRequest (snapshot taken by teeLoopback)
//!     → fork context (same request id, fresh draw, tee tag set)
//!     → LoopbackResolver::resolve (Tee(tag) routes now match)
//!     → Transport::send under tee deadline
//!     → response discarded, outcome logged and counted
//! ```
//!
//! # Design Decisions
//! - One detached task per duplicate; the primary request never awaits it
//! - Failures never surface to the client

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::error::TransportError;
use crate::filters::TeeRequest;
use crate::observability::metrics;
use crate::proxy::transport::{build_upstream_request, Transport};
use crate::routing::{Backend, LoopbackResolver, RequestContext, RouteRequest};

/// How a tee duplicate ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeeOutcome {
    /// Upstream answered, or the duplicate hit a shunt.
    Delivered,
    Failed,
    Timeout,
    /// No route accepted the duplicate.
    Unrouted,
}

impl TeeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeeOutcome::Delivered => "delivered",
            TeeOutcome::Failed => "failed",
            TeeOutcome::Timeout => "timeout",
            TeeOutcome::Unrouted => "unrouted",
        }
    }
}

pub struct TeeDuplicator {
    resolver: Arc<LoopbackResolver>,
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl TeeDuplicator {
    pub fn new(resolver: Arc<LoopbackResolver>, transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self {
            resolver,
            transport,
            timeout,
        }
    }

    /// Spawn the duplicate. The handle is only awaited by tests.
    pub fn dispatch(&self, tee: TeeRequest, parent: &RequestContext) -> JoinHandle<TeeOutcome> {
        let ctx = parent.fork_for_tee(tee.tag.clone());
        let resolver = self.resolver.clone();
        let transport = self.transport.clone();
        let timeout = self.timeout;

        tokio::spawn(async move {
            let outcome = run(&resolver, transport.as_ref(), timeout, tee.request, &ctx).await;
            metrics::record_tee(&tee.tag, outcome.as_str());
            outcome
        })
    }
}

async fn run(
    resolver: &LoopbackResolver,
    transport: &dyn Transport,
    timeout: Duration,
    request: RouteRequest,
    ctx: &RequestContext,
) -> TeeOutcome {
    let tag = ctx.tee_tag().unwrap_or_default();

    let resolution = match resolver.resolve(request, ctx) {
        Ok(resolution) => resolution,
        Err(e) => {
            tracing::warn!(request_id = %ctx.request_id(), tag, error = %e, "Tee duplicate not routed");
            return TeeOutcome::Unrouted;
        }
    };

    let url = match resolution.route.backend() {
        Backend::Network(url) => url,
        _ => {
            tracing::debug!(
                request_id = %ctx.request_id(),
                tag,
                route = %resolution.route.name(),
                "Tee duplicate shunted"
            );
            return TeeOutcome::Delivered;
        }
    };

    let sent = match build_upstream_request(&resolution.request, url, ctx.request_id()) {
        Ok(upstream) => tokio::time::timeout(timeout, transport.send(upstream))
            .await
            .unwrap_or(Err(TransportError::Timeout)),
        Err(e) => Err(e),
    };

    match sent {
        Ok(response) => {
            tracing::debug!(
                request_id = %ctx.request_id(),
                tag,
                route = %resolution.route.name(),
                status = response.status().as_u16(),
                "Tee duplicate delivered"
            );
            TeeOutcome::Delivered
        }
        Err(TransportError::Timeout) => {
            tracing::warn!(request_id = %ctx.request_id(), tag, "Tee duplicate timed out");
            TeeOutcome::Timeout
        }
        Err(e) => {
            tracing::warn!(request_id = %ctx.request_id(), tag, error = %e, "Tee duplicate failed");
            TeeOutcome::Failed
        }
    }
}
