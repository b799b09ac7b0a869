//! Named thresholds used by the status classifier.

/// A heartbeat older than this marks the network as failing (80 s).
pub const HEARTBEAT_STALE_WINDOW_NS: u64 = 80_000_000_000;

/// Reported GPS accuracy above this many metres means no usable fix yet.
pub const GPS_ACCURACY_SEARCH_M: f64 = 99.0;

/// Number of dots in the signal strength meter.
pub const MAX_NET_BARS: u8 = 5;

/// Highest strength level the modem reports (levels 0..=4).
pub const MAX_NET_STRENGTH: u8 = 4;

const _: () = assert!(HEARTBEAT_STALE_WINDOW_NS > 0);
const _: () = assert!(MAX_NET_STRENGTH < MAX_NET_BARS);
