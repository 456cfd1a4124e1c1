//! Liveness and readiness probes for orchestrators and load balancers.
//!
//! The process moves through three phases: `starting` while migrations run
//! and identities are seeded, `serving` once the API accepts traffic, and
//! `draining` after a shutdown signal. Readiness holds only while serving;
//! liveness fails once draining so the instance is taken out of rotation
//! before in-flight requests finish.

use std::sync::atomic::{AtomicU8, Ordering};

use actix_web::{HttpResponse, get, http::header, web};
use serde::Serialize;
use tracing::info;

/// Lifecycle phase reported by the probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Startup work still running.
    Starting,
    /// Accepting API traffic.
    Serving,
    /// Shutting down.
    Draining,
}

impl Phase {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Starting => 0,
            Self::Serving => 1,
            Self::Draining => 2,
        }
    }

    const fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Starting,
            1 => Self::Serving,
            _ => Self::Draining,
        }
    }
}

/// Shared probe state.
#[derive(Debug)]
pub struct HealthState {
    phase: AtomicU8,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            phase: AtomicU8::new(Phase::Starting.as_u8()),
        }
    }
}

impl HealthState {
    /// Start in [`Phase::Starting`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter [`Phase::Serving`]. Has no effect once draining.
    pub fn mark_ready(&self) {
        let moved = self
            .phase
            .compare_exchange(
                Phase::Starting.as_u8(),
                Phase::Serving.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if moved {
            info!("tracker ready for traffic");
        }
    }

    /// Enter [`Phase::Draining`]; both probes fail from here on.
    pub fn begin_draining(&self) {
        let previous = self.phase.swap(Phase::Draining.as_u8(), Ordering::AcqRel);
        if Phase::from_u8(previous) != Phase::Draining {
            info!("tracker draining");
        }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        Phase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Whether the readiness probe passes.
    pub fn is_ready(&self) -> bool {
        self.phase() == Phase::Serving
    }

    /// Whether the liveness probe passes.
    pub fn is_alive(&self) -> bool {
        self.phase() != Phase::Draining
    }

    fn probe_response(&self, passing: bool) -> HttpResponse {
        let mut response = if passing {
            HttpResponse::Ok()
        } else {
            HttpResponse::ServiceUnavailable()
        };
        response
            .insert_header((header::CACHE_CONTROL, "no-store"))
            .json(ProbeBody {
                phase: self.phase(),
            })
    }
}

#[derive(Serialize)]
struct ProbeBody {
    phase: Phase,
}

/// Readiness probe: 200 while serving, 503 otherwise.
#[utoipa::path(
    get,
    path = "/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Serving API traffic"),
        (status = 503, description = "Starting up or draining")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    state.probe_response(state.is_ready())
}

/// Liveness probe: 200 until draining begins.
#[utoipa::path(
    get,
    path = "/health/live",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Process is alive"),
        (status = 503, description = "Draining for shutdown")
    )
)]
#[get("/health/live")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    state.probe_response(state.is_alive())
}
