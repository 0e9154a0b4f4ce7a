//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │      Application        │
//!     ┌──────────────┤  guards + metrics       ├──────────────┐
//!     │              └─────────────────────────┘              │
//!     │                         │                             │
//!     ▼                         ▼                             ▼
//! ┌─────────┐            ┌─────────────┐              ┌───────────┐
//! │Exporter │            │  Snapshot   │              │ Event bus │
//! │ Adapter │            │   Store     │              │  (host)   │
//! └─────────┘            └─────────────┘              └───────────┘
//! ```
//!
//! # Available Ports
//!
//! - [`MetricsExporter`] - Pull-based counter/gauge exposition
//! - [`SnapshotStore`] - Append-only durable metrics rows
//! - [`EventBus`] - Host pub/sub contract consumed for trading events
//! - [`LimitSource`] / [`RouteSource`] - Per-key guard settings and metric labels

pub mod outbound;

pub use outbound::event_bus::{events, EventBus, EventHandler};
pub use outbound::exporter::{MetricsExporter, NoopExporter};
pub use outbound::policy::{LimitSource, NoRoutes, RouteSource};
pub use outbound::store::SnapshotStore;
