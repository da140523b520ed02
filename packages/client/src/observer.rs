//! Observability hooks injected into the client.
//!
//! The library never installs a logger. Callers pass a [`ClientObserver`]
//! at construction; [`TracingObserver`] forwards to `tracing`, which
//! stays silent unless the application installs a subscriber.

use crate::address::Address;
use crate::types::Method;

pub trait ClientObserver: Send + Sync {
    /// A request is about to be sent to `host`.
    fn request_sent(&self, _host: &Address, _method: Method, _path: &str) {}

    /// `host` answered with `status`.
    fn response_received(&self, _host: &Address, _status: u16) {}

    /// `host` failed at the transport level and left the rotation.
    fn host_removed(&self, _host: &Address, _reason: &str) {}

    /// `host` failed, but another caller had already removed it.
    fn host_already_removed(&self, _host: &Address) {}
}

/// Emits `tracing` events under the `pilosa_client` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ClientObserver for TracingObserver {
    fn request_sent(&self, host: &Address, method: Method, path: &str) {
        tracing::debug!(target: "pilosa_client", %host, %method, path, "sending request");
    }

    fn response_received(&self, host: &Address, status: u16) {
        tracing::debug!(target: "pilosa_client", %host, status, "received response");
    }

    fn host_removed(&self, host: &Address, reason: &str) {
        tracing::warn!(target: "pilosa_client", %host, reason, "removing unreachable host");
    }

    fn host_already_removed(&self, host: &Address) {
        tracing::debug!(target: "pilosa_client", %host, "unreachable host was already removed");
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ClientObserver for NoopObserver {}
