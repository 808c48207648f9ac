//! Route between two coordinates.
//!
//! Routing is presentation only. Callers go through [`route_or_none`], which
//! logs a failure and shows no route instead of propagating it.

use std::future::Future;

use gigledger_types::{GigError, Result, constants};

use crate::geo::{Coordinates, Route};

pub trait RouteProvider: Send + Sync {
    fn route(
        &self,
        from: Coordinates,
        to: Coordinates,
    ) -> impl Future<Output = Result<Route>> + Send;
}

/// Linear interpolation between the endpoints; distance is great-circle.
#[derive(Debug, Clone, Copy)]
pub struct StraightLineRouter {
    segments: usize,
}

impl StraightLineRouter {
    #[must_use]
    pub fn new(segments: usize) -> Self {
        Self {
            segments: segments.max(1),
        }
    }
}

impl Default for StraightLineRouter {
    fn default() -> Self {
        Self::new(constants::DEFAULT_ROUTE_SEGMENTS)
    }
}

impl RouteProvider for StraightLineRouter {
    #[allow(clippy::cast_precision_loss)]
    async fn route(&self, from: Coordinates, to: Coordinates) -> Result<Route> {
        if (to.lon - from.lon).abs() > 180.0 {
            return Err(GigError::Routing {
                reason: "path crosses the antimeridian".into(),
            });
        }
        let n = self.segments;
        let points = (0..=n)
            .map(|i| {
                let t = i as f64 / n as f64;
                Coordinates {
                    lat: from.lat + (to.lat - from.lat) * t,
                    lon: from.lon + (to.lon - from.lon) * t,
                }
            })
            .collect();
        Ok(Route {
            points,
            distance_m: from.haversine_m(&to),
        })
    }
}

/// Ask `router` for a route; on failure, log and return `None`.
pub async fn route_or_none<R: RouteProvider>(
    router: &R,
    from: Coordinates,
    to: Coordinates,
) -> Option<Route> {
    match router.route(from, to).await {
        Ok(route) => Some(route),
        Err(err) => {
            tracing::warn!(error = %err, "Routing failed, showing no route");
            None
        }
    }
}
