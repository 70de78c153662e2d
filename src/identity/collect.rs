//! Visit-record assembly
//!
//! Combines inbound visitor attributes, transport metadata and parsed
//! device signals into a complete record ready for persistence.

use axum::http::HeaderMap;
use std::net::IpAddr;
use tracing::{debug, info};

use super::{device, fingerprint};
use crate::models::{NewVisit, VisitorAttributes};

/// Assemble a visit record from the request. Never fails: device-signal
/// parsing degrades on malformed input and the initiator fallback always
/// lands on the transport-observed address.
pub fn build_visit(
    attrs: &VisitorAttributes,
    headers: &HeaderMap,
    remote_addr: IpAddr,
) -> NewVisit {
    let initiator = resolve_initiator(attrs, headers, remote_addr);
    let signals = device::parse(&attrs.user_agent);
    let fingerprint = fingerprint::generate(&signals.device, &signals.os, &attrs.user_ip);

    let visit = NewVisit {
        initiator,
        service_tag: attrs.service_tag.clone(),
        panel_clid: attrs.panel_clid.clone(),
        ip: attrs.user_ip.clone(),
        city: attrs.city.clone(),
        user_agent_full: attrs.user_agent.clone(),
        user_agent_short: signals.short_descriptor(),
        os: signals.os,
        os_version: signals.os_version,
        browser: signals.browser,
        browser_version: signals.browser_version,
        device: signals.device,
        device_brand: signals.device_brand,
        device_model: signals.device_model,
        is_mobile: signals.is_mobile,
        fingerprint,
    };

    info!(fingerprint = %visit.fingerprint, ip = %visit.ip, "assembled visit record");
    visit
}

/// Who or what triggered the visit. Ordered, first match wins: the explicit
/// field, then the proxy headers, then the peer address.
fn resolve_initiator(
    attrs: &VisitorAttributes,
    headers: &HeaderMap,
    remote_addr: IpAddr,
) -> String {
    if let Some(initiator) = attrs.initiator.as_deref() {
        if !initiator.is_empty() {
            return initiator.to_string();
        }
    }

    debug!("no initiator provided, falling back to transport headers");
    header_value(headers, "x-real-ip")
        .or_else(|| header_value(headers, "x-forwarded-for"))
        .unwrap_or_else(|| remote_addr.to_string())
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}
