//! Status subsystem: telemetry snapshots and their classification.
//!
//! `telemetry` defines the snapshot and the sources that produce it.
//! `classify` maps a snapshot to the sidebar indicators, and `thresholds`
//! holds the named bounds those rules test against.

pub mod classify;
pub mod telemetry;
pub mod thresholds;

pub use classify::{
    classify_connectivity, classify_thermal, classify_vehicle, net_bars, ConnectStatus,
    ItemStatus, Severity, Sidebar, VehicleStatus,
};
pub use telemetry::{
    JsonFileTelemetry, NetworkType, StaticTelemetry, TelemetrySnapshot, TelemetrySource,
    ThermalLevel,
};
