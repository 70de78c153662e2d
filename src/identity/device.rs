//! Device-signal parsing over woothee
//!
//! Turns a raw user-agent string into structured device signals. Parsing
//! never fails a request: strings the classifier cannot place degrade to
//! empty fields.

use tracing::debug;
use woothee::parser::Parser;

/// Sentinel woothee uses for fields it could not determine.
const UNKNOWN: &str = "UNKNOWN";

/// Structured attributes derived from a user-agent string. Fields the
/// parser could not determine are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSignals {
    pub os: String,
    pub os_version: String,
    pub browser: String,
    pub browser_version: String,
    /// Device family (woothee category: pc, smartphone, mobilephone, ...).
    pub device: String,
    pub device_brand: String,
    /// Always empty: woothee exposes no model granularity.
    pub device_model: String,
    pub is_mobile: bool,
}

impl DeviceSignals {
    /// Deterministic human-readable condensation of device/OS/browser,
    /// used as a secondary lookup key. Stable for identical input.
    pub fn short_descriptor(&self) -> String {
        let device = if self.device.is_empty() {
            "Other"
        } else {
            &self.device
        };
        format!(
            "{} / {} / {}",
            device,
            family_version(&self.os, &self.os_version),
            family_version(&self.browser, &self.browser_version),
        )
    }
}

/// Parse a user-agent string, or `None` when the classifier cannot place
/// it at all (no OS, browser or device family recognized).
pub fn try_parse(user_agent: &str) -> Option<DeviceSignals> {
    let parser = Parser::new();
    let result = parser.parse(user_agent)?;

    let is_mobile = result.category == "smartphone" || result.category == "mobilephone";
    let signals = DeviceSignals {
        os: known(result.os.as_ref()),
        os_version: known(result.os_version.as_ref()),
        browser: known(result.name.as_ref()),
        browser_version: known(result.version.as_ref()),
        device: known(result.category.as_ref()),
        device_brand: known(result.vendor.as_ref()),
        device_model: String::new(),
        is_mobile,
    };

    if signals.os.is_empty() && signals.browser.is_empty() && signals.device.is_empty() {
        return None;
    }

    Some(signals)
}

/// Total variant of [`try_parse`]: unusual or malformed strings degrade to
/// default (empty) signals instead of failing.
pub fn parse(user_agent: &str) -> DeviceSignals {
    try_parse(user_agent).unwrap_or_else(|| {
        debug!(user_agent, "user agent not classified, using default signals");
        DeviceSignals::default()
    })
}

fn known(value: &str) -> String {
    if value == UNKNOWN {
        String::new()
    } else {
        value.to_string()
    }
}

fn family_version(family: &str, version: &str) -> String {
    let family = if family.is_empty() { "Other" } else { family };
    if version.is_empty() {
        family.to_string()
    } else {
        format!("{} {}", family, version)
    }
}
