//! Telemetry snapshots and the sources that deliver them.
//!
//! Every field of a snapshot is independently optional: the producer may not
//! know a value yet, and the classifier degrades each absent field to a
//! defined default.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};


/// Kind of network uplink the device reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    None,
    Wifi,
    Ethernet,
    Cell2g,
    Cell3g,
    Cell4g,
    Cell5g,
}

impl NetworkType {
    pub fn label(self) -> &'static str {
        match self {
            NetworkType::None => "--",
            NetworkType::Wifi => "WiFi",
            NetworkType::Ethernet => "ETH",
            NetworkType::Cell2g => "2G",
            NetworkType::Cell3g => "3G",
            NetworkType::Cell4g => "LTE",
            NetworkType::Cell5g => "5G",
        }
    }
}


/// Thermal band reported by the device's thermal manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThermalLevel {
    Green,
    Yellow,
    Red,
    Danger,
}


/// Point-in-time bundle of optional device and vehicle metrics.
///
/// `last_heartbeat_ns` is a timestamp on the same clock the caller passes as
/// `now_ns` to the classifier; `0` and `None` both mean "never".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySnapshot {
    pub network_type: Option<NetworkType>,
    /// Modem strength level, 0..=4.
    pub network_strength: Option<u8>,
    pub last_heartbeat_ns: Option<u64>,
    pub thermal_level: Option<ThermalLevel>,
    pub ambient_temp_c: Option<f64>,
    /// Whether the vehicle interface hardware is detected at all.
    pub link_present: Option<bool>,
    pub ignition: Option<bool>,
    /// Whether the driving stack is running.
    pub started: Option<bool>,
    /// Whether the driver assistance is actively controlling the vehicle.
    pub engaged: Option<bool>,
    pub gps_accuracy_m: Option<f64>,
    pub satellite_count: Option<u32>,
    pub ip_address: Option<String>,
    pub connect_name: Option<String>,
    /// Cellular signal power in dBm, as text.
    pub rsrp: Option<String>,
    pub battery_percent: Option<u8>,
    pub battery_charging: Option<bool>,
}


/// Something that delivers periodic telemetry updates.
pub trait TelemetrySource {
    /// Latest snapshot, or `None` if nothing has been received yet.
    fn poll(&mut self) -> Option<TelemetrySnapshot>;
}


/// Fixed snapshot, for demos and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticTelemetry(pub Option<TelemetrySnapshot>);

impl TelemetrySource for StaticTelemetry {
    fn poll(&mut self) -> Option<TelemetrySnapshot> {
        self.0.clone()
    }
}


/// Reads a JSON snapshot file rewritten by an external process.
///
/// The file is only re-parsed when its modification time changes. A file
/// that is missing or malformed leaves the last good snapshot in place.
#[derive(Debug)]
pub struct JsonFileTelemetry {
    path: PathBuf,
    last: Option<TelemetrySnapshot>,
    last_mtime: Option<SystemTime>,
}

impl JsonFileTelemetry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileTelemetry {
            path: path.into(),
            last: None,
            last_mtime: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn reload(&mut self) {
        let mtime = match fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("telemetry file {} not present", self.path.display());
                return;
            }
            Err(e) => {
                warn!("cannot stat telemetry file {}: {}", self.path.display(), e);
                return;
            }
        };
        if self.last_mtime == Some(mtime) {
            return;
        }

        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) => {
                warn!("cannot read telemetry file {}: {}", self.path.display(), e);
                return;
            }
        };
        self.last_mtime = Some(mtime);
        match serde_json::from_str::<TelemetrySnapshot>(&text) {
            Ok(snapshot) => self.last = Some(snapshot),
            Err(e) => warn!("malformed telemetry in {}: {}", self.path.display(), e),
        }
    }
}

impl TelemetrySource for JsonFileTelemetry {
    fn poll(&mut self) -> Option<TelemetrySnapshot> {
        self.reload();
        self.last.clone()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_leaves_other_fields_absent() {
        let snap: TelemetrySnapshot =
            serde_json::from_str(r#"{"network_type":"cell4g","satellite_count":7}"#).unwrap();
        assert_eq!(snap.network_type, Some(NetworkType::Cell4g));
        assert_eq!(snap.satellite_count, Some(7));
        assert_eq!(snap.thermal_level, None);
        assert_eq!(snap.last_heartbeat_ns, None);
    }

    #[test]
    fn network_labels() {
        assert_eq!(NetworkType::None.label(), "--");
        assert_eq!(NetworkType::Wifi.label(), "WiFi");
        assert_eq!(NetworkType::Cell4g.label(), "LTE");
    }

    #[test]
    fn static_source_repeats_its_snapshot() {
        let snap = TelemetrySnapshot {
            ignition: Some(true),
            ..Default::default()
        };
        let mut source = StaticTelemetry(Some(snap.clone()));
        assert_eq!(source.poll(), Some(snap.clone()));
        assert_eq!(source.poll(), Some(snap));
    }

    #[test]
    fn missing_file_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut source = JsonFileTelemetry::new(dir.path().join("telemetry.json"));
        assert_eq!(source.poll(), None);
    }

    #[test]
    fn file_source_reads_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.json");
        fs::write(&path, r#"{"thermal_level":"yellow","ambient_temp_c":41.5}"#).unwrap();
        let mut source = JsonFileTelemetry::new(&path);
        let snap = source.poll().unwrap();
        assert_eq!(snap.thermal_level, Some(ThermalLevel::Yellow));
        assert_eq!(snap.ambient_temp_c, Some(41.5));
    }

    #[test]
    fn malformed_file_keeps_last_good_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("telemetry.json");
        fs::write(&path, r#"{"satellite_count":3}"#).unwrap();
        let mut source = JsonFileTelemetry::new(&path);
        assert_eq!(source.poll().unwrap().satellite_count, Some(3));

        // Force a different mtime so the file is re-read.
        source.last_mtime = None;
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(source.poll().unwrap().satellite_count, Some(3));
    }
}
