//! Visitor resolution cascade
//!
//! Re-identifies a visitor from partial attributes by trying an ordered
//! sequence of lookup strategies against the store, most specific first,
//! stopping at the first hit. Every call re-queries the store: there is no
//! caching between the cascade and the gateway, so lookups always see rows
//! written moments earlier.

use tracing::{debug, info, warn};

use super::{device, fingerprint};
use crate::models::{Visit, VisitorAttributes};
use crate::storage::{Storage, VisitFilter};

/// One lookup strategy of the cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Exact panel correlation ID match, the highest-confidence key.
    PanelClid,
    /// Fingerprint recomputed from the supplied user agent and IP.
    Fingerprint,
    /// Bare IP equality. Many devices can share an IP behind NAT, so this
    /// is a low-confidence fallback.
    IpAddress,
    /// City plus normalized short user-agent descriptor.
    CityAndShortUa,
}

/// Evaluation order, most specific first.
pub const CASCADE: [Strategy; 4] = [
    Strategy::PanelClid,
    Strategy::Fingerprint,
    Strategy::IpAddress,
    Strategy::CityAndShortUa,
];

impl Strategy {
    /// Map the supplied attributes to this strategy's store predicate, or
    /// `None` when the strategy does not apply to them.
    pub fn filter(&self, attrs: &VisitorAttributes) -> Option<VisitFilter> {
        match self {
            Strategy::PanelClid => match attrs.panel_clid.as_deref() {
                Some(clid) if !clid.is_empty() => Some(VisitFilter::PanelClid(clid.to_string())),
                _ => {
                    debug!("panel CLID not provided, skipping correlation lookup");
                    None
                }
            },
            Strategy::Fingerprint => {
                match fingerprint::search_key(&attrs.user_agent, &attrs.user_ip) {
                    Ok(key) => Some(VisitFilter::Fingerprint(key)),
                    Err(err) => {
                        warn!(error = %err, "error generating search key, skipping fingerprint lookup");
                        None
                    }
                }
            }
            Strategy::IpAddress => Some(VisitFilter::Ip(attrs.user_ip.clone())),
            Strategy::CityAndShortUa => match attrs.city.as_deref() {
                Some(city) if !city.is_empty() => Some(VisitFilter::CityAndShortUa {
                    city: city.to_string(),
                    user_agent_short: device::parse(&attrs.user_agent).short_descriptor(),
                }),
                _ => {
                    debug!("city not provided, skipping city and user agent lookup");
                    None
                }
            },
        }
    }
}

/// Find the best-matching prior visit for the supplied attributes.
///
/// Strategies run strictly in [`CASCADE`] order and the first hit wins;
/// within one strategy the most recently created row wins. Rows sharing an
/// identical creation timestamp tie arbitrarily: the store applies no
/// secondary ordering. A store failure inside one strategy is downgraded
/// to "strategy inapplicable" and the cascade moves on; exhausting all
/// four yields `None`, never an error.
pub async fn resolve(storage: &dyn Storage, attrs: &VisitorAttributes) -> Option<Visit> {
    for strategy in CASCADE {
        let Some(filter) = strategy.filter(attrs) else {
            continue;
        };

        match storage.find_most_recent(&filter).await {
            Ok(Some(visit)) => {
                info!("user found with ID [{}] via {:?}", visit.id, strategy);
                return Some(visit);
            }
            Ok(None) => {
                debug!(?strategy, "no match, falling through to next strategy");
            }
            Err(err) => {
                warn!(?strategy, error = %err, "lookup failed, falling through to next strategy");
            }
        }
    }

    debug!("all strategies exhausted, user not found");
    None
}
