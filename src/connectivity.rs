// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::debug;

use crate::http::HttpClient;

/// Checked before every operation that would hit the network
#[async_trait]
pub trait ConnectivityCheck: Send + Sync {
    /// `true` when network calls are currently blocked
    async fn is_offline(&self) -> bool;
}

/// A shared reference to a connectivity check
pub type SharedConnectivity = Arc<dyn ConnectivityCheck>;

/// Assumes the network is always reachable
#[derive(Debug, Default, Clone, Copy)]
pub struct AlwaysOnline;

impl AlwaysOnline {
    pub fn shared() -> SharedConnectivity {
        Arc::new(Self)
    }
}

#[async_trait]
impl ConnectivityCheck for AlwaysOnline {
    async fn is_offline(&self) -> bool {
        false
    }
}

/// Connectivity driven by an external signal, e.g. the platform's
/// reachability callbacks
#[derive(Debug, Default)]
pub struct ConnectivityFlag {
    offline: AtomicBool,
}

impl ConnectivityFlag {
    pub fn new(offline: bool) -> Arc<Self> {
        Arc::new(Self {
            offline: AtomicBool::new(offline),
        })
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConnectivityCheck for ConnectivityFlag {
    async fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }
}

/// Probes a URL; any transport failure counts as offline
///
/// The response status is ignored, a server that answers at all is
/// reachable.
pub struct HttpProbe<C: HttpClient> {
    client: C,
    probe_url: String,
}

impl<C: HttpClient> HttpProbe<C> {
    pub fn new(client: C, probe_url: impl Into<String>) -> Self {
        Self {
            client,
            probe_url: probe_url.into(),
        }
    }
}

#[async_trait]
impl<C: HttpClient> ConnectivityCheck for HttpProbe<C> {
    async fn is_offline(&self) -> bool {
        match self.client.get(&self.probe_url).await {
            Ok(_) => false,
            Err(e) => {
                debug!(url = %self.probe_url, error = %e, "connectivity probe failed");
                true
            }
        }
    }
}
