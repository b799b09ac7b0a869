//! Param Deck core: everything below the terminal UI.
//!
//! The `store` module is the durable one-file-per-key parameter store shared
//! with other processes on the device. `watch` reports external changes to a
//! chosen set of keys. `status` classifies raw telemetry into the sidebar
//! indicators. `binding` and `panel` turn declarative settings tables into
//! live controls bound to store keys. `supervisor` owns the device
//! commands (reboot, power off, refresh pulses) and `calibration` renders the
//! calibration summary. `config` loads the application settings file.

pub mod binding;
pub mod calibration;
pub mod config;
pub mod error;
pub mod panel;
pub mod status;
pub mod store;
pub mod supervisor;
pub mod watch;
