//! Status reporting
//!
//! Best-effort, purely observational: resolves the host's primary
//! outbound address and gathers the running services plus well-known
//! endpoint URLs. Nothing here may fail the run; every error degrades
//! to a fallback value.

use crate::lifecycle::{StackRuntime, StackService};
use command_runner::{Command, Runner};
use tracing::debug;

/// Fixed port of the stack's web UI
pub const WEB_UI_PORT: u16 = 9191;

/// A gathered status summary, ready for rendering
#[derive(Debug, Clone)]
pub struct StatusReport {
    /// Best-effort primary host address
    pub address: String,
    /// Services and their states; empty when the query failed
    pub services: Vec<StackService>,
    /// (label, url) pairs for well-known endpoints
    pub endpoints: Vec<(String, String)>,
}

/// Gathers host address and stack status
pub struct StatusReporter {
    runner: Box<dyn Runner>,
}

impl StatusReporter {
    /// Create a reporter issuing queries through the given runner
    pub fn new(runner: Box<dyn Runner>) -> Self {
        Self { runner }
    }

    /// Resolve the primary outbound address
    ///
    /// Three-tier fallback: host address query, route-table
    /// introspection, then the literal loopback name. First non-empty
    /// answer wins.
    pub async fn primary_address(&self) -> String {
        let mut cmd = Command::new("hostname");
        cmd.arg("-I");
        if let Ok(output) = self.runner.run(cmd).await {
            if output.success() {
                if let Some(addr) = first_address(&output.stdout) {
                    return addr;
                }
            }
        }

        let mut cmd = Command::new("ip");
        cmd.args(["route", "get", "1"]);
        if let Ok(output) = self.runner.run(cmd).await {
            if output.success() {
                if let Some(addr) = route_source_address(&output.stdout) {
                    return addr;
                }
            }
        }

        "localhost".to_string()
    }

    /// Gather a full status report for the stack
    pub async fn gather(&self, runtime: &dyn StackRuntime) -> StatusReport {
        let address = self.primary_address().await;

        let services = match runtime.services().await {
            Ok(services) => services,
            Err(e) => {
                debug!(error = %e, "service query failed, reporting none");
                Vec::new()
            }
        };

        let endpoints = vec![(
            "Web UI".to_string(),
            format!("http://{address}:{WEB_UI_PORT}"),
        )];

        StatusReport {
            address,
            services,
            endpoints,
        }
    }
}

/// First whitespace-separated token of a `hostname -I` answer
fn first_address(output: &str) -> Option<String> {
    output
        .split_whitespace()
        .next()
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

/// The `src` field of an `ip route get` answer
fn route_source_address(output: &str) -> Option<String> {
    let mut tokens = output.split_whitespace();
    while let Some(token) = tokens.next() {
        if token == "src" {
            return tokens.next().map(str::to_string);
        }
    }
    None
}
