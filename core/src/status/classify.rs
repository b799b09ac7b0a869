//! Status classifier: telemetry in, categorical sidebar indicators out.
//!
//! Every function here is pure. Each axis checks its rules in a fixed
//! priority order and the first match wins, so a total absence of a signal
//! always outranks a degraded one. Absent inputs degrade to a defined status
//! instead of failing.

use std::fmt;

use super::telemetry::{NetworkType, TelemetrySnapshot, ThermalLevel};
use super::thresholds::{
    GPS_ACCURACY_SEARCH_M, HEARTBEAT_STALE_WINDOW_NS, MAX_NET_BARS, MAX_NET_STRENGTH,
};

// ---------------------------------------------------------------------------
// Severity and display status
// ---------------------------------------------------------------------------

/// Colour tier of an indicator, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Good,
    Warning,
    Danger,
}

/// Short label plus severity, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStatus {
    pub label: String,
    pub severity: Severity,
}

impl ItemStatus {
    fn new(label: impl Into<String>, severity: Severity) -> Self {
        ItemStatus {
            label: label.into(),
            severity,
        }
    }
}

// ---------------------------------------------------------------------------
// Connectivity
// ---------------------------------------------------------------------------

/// Backend connectivity derived from the last heartbeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStatus {
    /// No heartbeat has ever been recorded.
    Offline,
    /// Last heartbeat is within the staleness window.
    Online,
    /// Last heartbeat is older than the staleness window.
    Error,
}

impl ConnectStatus {
    pub fn severity(self) -> Severity {
        match self {
            ConnectStatus::Offline => Severity::Warning,
            ConnectStatus::Online => Severity::Good,
            ConnectStatus::Error => Severity::Danger,
        }
    }

    pub fn item(self) -> ItemStatus {
        ItemStatus::new(self.to_string(), self.severity())
    }
}

impl fmt::Display for ConnectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectStatus::Offline => "NETWORK OFFLINE",
            ConnectStatus::Online => "NETWORK ONLINE",
            ConnectStatus::Error => "NETWORK ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Classify connectivity from the last heartbeat timestamp.
///
/// `None` and `0` both mean no heartbeat was ever recorded. A heartbeat
/// stamped later than `now_ns` counts as fresh.
pub fn classify_connectivity(last_heartbeat_ns: Option<u64>, now_ns: u64) -> ConnectStatus {
    match last_heartbeat_ns {
        None | Some(0) => ConnectStatus::Offline,
        Some(last) if now_ns.saturating_sub(last) < HEARTBEAT_STALE_WINDOW_NS => {
            ConnectStatus::Online
        }
        Some(_) => ConnectStatus::Error,
    }
}

// ---------------------------------------------------------------------------
// Thermal
// ---------------------------------------------------------------------------

/// Thermal indicator: label is the ambient temperature, colour the band.
/// Any band other than green or yellow, including an unknown one, is danger.
pub fn classify_thermal(level: Option<ThermalLevel>, ambient_c: Option<f64>) -> ItemStatus {
    let severity = match level {
        Some(ThermalLevel::Green) => Severity::Good,
        Some(ThermalLevel::Yellow) => Severity::Warning,
        _ => Severity::Danger,
    };
    let label = match ambient_c {
        Some(t) if t.is_finite() => format!("{}°C", t.trunc() as i64),
        _ => "--°C".to_string(),
    };
    ItemStatus::new(label, severity)
}

// ---------------------------------------------------------------------------
// Vehicle link
// ---------------------------------------------------------------------------

/// State of the vehicle interface link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleStatus {
    /// Hardware link not detected, or unknown.
    NoLink,
    /// Link present but ignition off.
    Offroad,
    /// Driving stack running without a usable position fix.
    GpsSearch,
    /// Online with a satellite count to show.
    Satellites(u32),
    Online,
}

impl VehicleStatus {
    pub fn severity(self) -> Severity {
        match self {
            VehicleStatus::NoLink => Severity::Danger,
            VehicleStatus::Offroad | VehicleStatus::GpsSearch => Severity::Warning,
            VehicleStatus::Satellites(_) | VehicleStatus::Online => Severity::Good,
        }
    }

    pub fn item(self) -> ItemStatus {
        ItemStatus::new(self.to_string(), self.severity())
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleStatus::NoLink => write!(f, "NO PANDA"),
            VehicleStatus::Offroad => write!(f, "VEHICLE OFFROAD"),
            VehicleStatus::GpsSearch => write!(f, "GPS SEARCH"),
            VehicleStatus::Satellites(n) => write!(f, "ONLINE SAT: {}", n),
            VehicleStatus::Online => write!(f, "VEHICLE ONLINE"),
        }
    }
}

/// Classify the vehicle link.
///
/// Priority: no link (danger) > ignition off (warning) > running with GPS
/// accuracy worse than the search bound (warning) > satellites visible
/// (good, annotated) > online (good).
pub fn classify_vehicle(snapshot: &TelemetrySnapshot) -> VehicleStatus {
    if snapshot.link_present != Some(true) {
        return VehicleStatus::NoLink;
    }
    if snapshot.ignition != Some(true) {
        return VehicleStatus::Offroad;
    }
    let started = snapshot.started == Some(true);
    if let (true, Some(acc)) = (started, snapshot.gps_accuracy_m) {
        if acc > GPS_ACCURACY_SEARCH_M {
            return VehicleStatus::GpsSearch;
        }
    }
    match snapshot.satellite_count {
        Some(n) if n > 0 => VehicleStatus::Satellites(n),
        _ => VehicleStatus::Online,
    }
}

// ---------------------------------------------------------------------------
// Network meter
// ---------------------------------------------------------------------------

/// Number of lit dots in the signal meter. Any reported signal lights one
/// dot more than its level; no signal lights none.
pub fn net_bars(strength: Option<u8>) -> u8 {
    let bars = match strength {
        Some(s) if s > 0 => s.min(MAX_NET_STRENGTH) + 1,
        _ => 0,
    };
    bars.min(MAX_NET_BARS)
}

// ---------------------------------------------------------------------------
// Sidebar summary
// ---------------------------------------------------------------------------

/// Everything the sidebar shows for one snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Sidebar {
    pub connectivity: ItemStatus,
    pub thermal: ItemStatus,
    pub vehicle: ItemStatus,
    pub net_type: &'static str,
    pub net_bars: u8,
    /// IP address on WiFi, signal power on cellular, `--` when unknown.
    pub link_detail: String,
    /// SSID or carrier name.
    pub connect_name: String,
    pub battery: Option<String>,
}

impl Sidebar {
    pub fn from_snapshot(snapshot: &TelemetrySnapshot, now_ns: u64) -> Self {
        let net_type = snapshot.network_type.unwrap_or(NetworkType::None);
        let link_detail = match net_type {
            NetworkType::Wifi => snapshot.ip_address.clone(),
            _ => snapshot.rsrp.as_ref().map(|r| format!("{} dBm", r)),
        }
        .unwrap_or_else(|| "--".to_string());
        let battery = snapshot.battery_percent.map(|pct| {
            let suffix = if snapshot.battery_charging == Some(true) {
                " +"
            } else {
                ""
            };
            format!("{}%{}", pct, suffix)
        });

        Sidebar {
            connectivity: classify_connectivity(snapshot.last_heartbeat_ns, now_ns).item(),
            thermal: classify_thermal(snapshot.thermal_level, snapshot.ambient_temp_c),
            vehicle: classify_vehicle(snapshot).item(),
            net_type: net_type.label(),
            net_bars: net_bars(snapshot.network_strength),
            link_detail,
            connect_name: snapshot
                .connect_name
                .clone()
                .unwrap_or_else(|| "---".to_string()),
            battery,
        }
    }

    /// Worst severity across the three indicators.
    pub fn worst(&self) -> Severity {
        self.connectivity
            .severity
            .max(self.thermal.severity)
            .max(self.vehicle.severity)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
