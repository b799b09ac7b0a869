//! Calibration summary rendered from a blob written by another process.
//!
//! The blob is decoded with a fallible parse. If it is missing or does not
//! decode, the base mounting text is shown and the failure is logged.

use serde::Deserialize;
use tracing::info;

use crate::store::Params;
use crate::supervisor::KEY_CALIBRATION_PARAMS;


pub const BASE_DESCRIPTION: &str = "openpilot requires the device to be mounted within 4° \
    left or right and within 5° up or 8° down. openpilot is continuously calibrating, \
    resetting is rarely required.";


/// Decoded calibration blob. Angles are in radians.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Calibration {
    pub cal_status: i64,
    /// Roll, pitch, yaw.
    pub rpy_calib: [f64; 3],
}

impl Calibration {
    pub fn decode(bytes: &[u8]) -> Option<Calibration> {
        match serde_json::from_slice::<Calibration>(bytes) {
            Ok(c) => Some(c),
            Err(e) => {
                info!("invalid {}: {}", KEY_CALIBRATION_PARAMS, e);
                None
            }
        }
    }

    pub fn pitch_deg(&self) -> f64 {
        self.rpy_calib[1].to_degrees()
    }

    pub fn yaw_deg(&self) -> f64 {
        self.rpy_calib[2].to_degrees()
    }

    /// Sentence describing where the device points, if calibrated.
    pub fn pointing(&self) -> Option<String> {
        if self.cal_status == 0 {
            return None;
        }
        let pitch = self.pitch_deg();
        let yaw = self.yaw_deg();
        Some(format!(
            "Your device is pointed {:.1}° {} and {:.1}° {}.",
            pitch.abs(),
            if pitch > 0.0 { "down" } else { "up" },
            yaw.abs(),
            if yaw > 0.0 { "left" } else { "right" },
        ))
    }
}


/// Description for the calibration control.
pub fn calibration_description(store: &dyn Params) -> String {
    let pointing = store
        .get(KEY_CALIBRATION_PARAMS)
        .filter(|b| !b.is_empty())
        .and_then(|b| Calibration::decode(&b))
        .and_then(|c| c.pointing());
    match pointing {
        Some(p) => format!("{} {}", BASE_DESCRIPTION, p),
        None => BASE_DESCRIPTION.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryParams;

    fn store_with(blob: &str) -> MemoryParams {
        MemoryParams::with_values([(KEY_CALIBRATION_PARAMS, blob.as_bytes())])
    }

    #[test]
    fn absent_blob_gives_base_text() {
        assert_eq!(calibration_description(&MemoryParams::new()), BASE_DESCRIPTION);
    }

    #[test]
    fn malformed_blob_gives_base_text() {
        let store = store_with("\u{1}\u{2}garbage");
        assert_eq!(calibration_description(&store), BASE_DESCRIPTION);
        let store = store_with(r#"{"cal_status": 1, "rpy_calib": [0.0]}"#);
        assert_eq!(calibration_description(&store), BASE_DESCRIPTION);
    }

    #[test]
    fn uncalibrated_blob_gives_base_text() {
        let store = store_with(r#"{"cal_status": 0, "rpy_calib": [0.0, 0.1, 0.1]}"#);
        assert_eq!(calibration_description(&store), BASE_DESCRIPTION);
    }

    #[test]
    fn calibrated_blob_appends_direction() {
        let pitch = 2.0_f64.to_radians();
        let yaw = -3.0_f64.to_radians();
        let blob = format!(r#"{{"cal_status": 1, "rpy_calib": [0.0, {}, {}]}}"#, pitch, yaw);
        let desc = calibration_description(&store_with(&blob));
        assert!(desc.starts_with(BASE_DESCRIPTION));
        assert!(
            desc.ends_with(" Your device is pointed 2.0° down and 3.0° right."),
            "{}",
            desc
        );
    }

    #[test]
    fn negative_pitch_points_up_and_positive_yaw_left() {
        let cal = Calibration {
            cal_status: 2,
            rpy_calib: [0.0, (-1.5_f64).to_radians(), 4.0_f64.to_radians()],
        };
        assert_eq!(
            cal.pointing().as_deref(),
            Some("Your device is pointed 1.5° up and 4.0° left.")
        );
    }
}
