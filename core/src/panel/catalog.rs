//! Built-in panel tables.
//!
//! Each table is plain data: key, title, description, icon, kind, and an
//! optional visibility rule. Adding a setting means adding a row here.

use super::{PanelDefinition, PanelEntry, Visibility};
use crate::binding::{ControlSpec, StepperSpec};


const ICON_SHELL: &str = "../assets/offroad/icon_shell.png";


pub static TOGGLES: PanelDefinition = PanelDefinition {
    name: "Toggles",
    entries: &[
        PanelEntry::new(ControlSpec::toggle(
            "OpenpilotEnabledToggle",
            "Enable openpilot",
            "Use the openpilot system for adaptive cruise control and lane keep driver \
             assistance. Your attention is required at all times to use this feature. \
             Changing this setting takes effect when the car is powered off.",
            "../assets/offroad/icon_openpilot.png",
        )),
        PanelEntry::new(ControlSpec::toggle(
            "IsLdwEnabled",
            "Enable Lane Departure Warnings",
            "Receive alerts to steer back into the lane when your vehicle drifts over a \
             detected lane line without a turn signal activated while driving over 31 mph \
             (50 km/h).",
            "../assets/offroad/icon_warning.png",
        )),
        PanelEntry::new(ControlSpec::toggle(
            "IsRHD",
            "Enable Right-Hand Drive",
            "Allow openpilot to obey left-hand traffic conventions and perform driver \
             monitoring on right driver seat.",
            "../assets/offroad/icon_openpilot_mirrored.png",
        )),
        PanelEntry::new(ControlSpec::toggle(
            "IsMetric",
            "Use Metric System",
            "Display speed in km/h instead of mph.",
            "../assets/offroad/icon_metric.png",
        )),
        PanelEntry::new(ControlSpec::toggle(
            "RecordFront",
            "Record and Upload Driver Camera",
            "Upload data from the driver facing camera and help improve the driver \
             monitoring algorithm.",
            "../assets/offroad/icon_monitoring.png",
        )),
        PanelEntry::new(ControlSpec::toggle(
            "EndToEndToggle",
            "Enable Lane Selector Mode",
            "Activate lane selection mode. Lane Mode/Lane Less/AUTO can be selected and \
             switched on the screen.",
            "../assets/offroad/icon_road.png",
        )),
        PanelEntry::new(ControlSpec::toggle(
            "OpkrEnableDriverMonitoring",
            "Enable Driver Monitoring",
            "Use the driver monitoring function.",
            ICON_SHELL,
        )),
        PanelEntry::new(ControlSpec::toggle(
            "OpkrEnableLogger",
            "Enable Driving Log Record",
            "Record the driving log locally for data analysis. Only loggers are activated \
             and not uploaded to the server.",
            ICON_SHELL,
        )),
        PanelEntry::new(ControlSpec::toggle(
            "OpkrEnableUploader",
            "Enable Sending Log to Server",
            "Activate the upload process to transmit system logs and other driving data to \
             the server. Upload it only off-road.",
            ICON_SHELL,
        )),
        PanelEntry::when(
            ControlSpec::toggle(
                "DisableRadar",
                "openpilot Longitudinal Control",
                "openpilot will disable the car's radar and will take over control of gas and \
                 brakes. Warning: this disables AEB!",
                "../assets/offroad/icon_speed_limit.png",
            ),
            Visibility::KeyTrue("DisableRadar_Allow"),
        ),
    ],
};


pub static DEVICE: PanelDefinition = PanelDefinition {
    name: "Device",
    entries: &[
        PanelEntry::new(
            ControlSpec::toggle(
                "HoldForSetting",
                "Hold to Open Settings",
                "Require holding the settings button for half a second before the settings \
                 menu opens.",
                ICON_SHELL,
            )
            .default_on(),
        ),
        PanelEntry::new(ControlSpec::stepper(
            "OpkrAutoScreenOff",
            "Screen Off Timer",
            "Turn the screen off after this many minutes while driving. 0 keeps it on.",
            StepperSpec {
                min: 0,
                max: 10,
                step: 1,
                default: 0,
                scale: 1.0,
                decimals: 0,
                unit: " min",
            },
        )),
        PanelEntry::new(ControlSpec::stepper(
            "OpkrUIBrightness",
            "Brightness",
            "Screen brightness. 0 follows the ambient light sensor.",
            StepperSpec {
                min: 0,
                max: 100,
                step: 5,
                default: 0,
                scale: 1.0,
                decimals: 0,
                unit: "%",
            },
        )),
        PanelEntry::new(ControlSpec::toggle(
            "OpkrBatteryChargingControl",
            "Enable Battery Charging Control",
            "Keep the battery between the minimum and maximum charge levels.",
            ICON_SHELL,
        )),
        PanelEntry::when(
            ControlSpec::stepper(
                "OpkrBatteryChargingMin",
                "Battery Minimum",
                "Start charging below this level.",
                StepperSpec {
                    min: 10,
                    max: 90,
                    step: 1,
                    default: 70,
                    scale: 1.0,
                    decimals: 0,
                    unit: "%",
                },
            ),
            Visibility::KeyTrue("OpkrBatteryChargingControl"),
        ),
        PanelEntry::when(
            ControlSpec::stepper(
                "OpkrBatteryChargingMax",
                "Battery Maximum",
                "Stop charging above this level.",
                StepperSpec {
                    min: 10,
                    max: 100,
                    step: 1,
                    default: 80,
                    scale: 1.0,
                    decimals: 0,
                    unit: "%",
                },
            ),
            Visibility::KeyTrue("OpkrBatteryChargingControl"),
        ),
        PanelEntry::new(ControlSpec::toggle(
            "OpkrHotspotOnBoot",
            "Hotspot On Boot",
            "Turn on the hotspot automatically when the device boots.",
            ICON_SHELL,
        )),
        PanelEntry::new(ControlSpec::toggle(
            "OpkrSSHLegacy",
            "Use Legacy SSH Key",
            "Accept the legacy public key for SSH access.",
            ICON_SHELL,
        )),
    ],
};


pub static DRIVING: PanelDefinition = PanelDefinition {
    name: "Driving",
    entries: &[
        PanelEntry::new(ControlSpec::toggle(
            "OpkrAutoResume",
            "Use Auto Resume",
            "Resume from standstill automatically when the car ahead moves off.",
            ICON_SHELL,
        )),
        PanelEntry::new(ControlSpec::toggle(
            "OpkrVariableCruise",
            "Use Variable Cruise",
            "Let openpilot adjust the set speed with the cruise buttons.",
            ICON_SHELL,
        )),
        PanelEntry::when(
            ControlSpec::choice(
                "CruiseStatemodeSelInit",
                "Cruise Start Mode",
                "Cruise mode selected when the car starts.",
                &["OP Stock", "Dist+Curv", "Dist Only", "Curv Only", "One Way"],
                1,
            ),
            Visibility::KeyTrue("OpkrVariableCruise"),
        ),
        PanelEntry::new(ControlSpec::stepper(
            "OpkrLaneChangeSpeed",
            "Lane Change Speed",
            "Minimum speed for assisted lane changes.",
            StepperSpec {
                min: 20,
                max: 160,
                step: 5,
                default: 45,
                scale: 1.0,
                decimals: 0,
                unit: " km/h",
            },
        )),
        PanelEntry::new(ControlSpec::choice(
            "OpkrAutoLaneChangeDelay",
            "Lane Change Delay",
            "Delay before an assisted lane change starts after the signal.",
            &["Nudge", "Nudgeless", "0.5 s", "1.0 s", "1.5 s", "2.0 s"],
            0,
        )),
        PanelEntry::new(ControlSpec::stepper(
            "CameraOffsetAdj",
            "Camera Offset",
            "Lateral offset of the camera from the car centre, in metres.",
            StepperSpec {
                min: -1000,
                max: 1000,
                step: 5,
                default: 60,
                scale: 0.001,
                decimals: 3,
                unit: " m",
            },
        )),
        PanelEntry::new(
            ControlSpec::toggle(
                "OpkrBlindSpotDetect",
                "Show BSM Status",
                "If a car is detected in the rear, it will be displayed on the screen.",
                ICON_SHELL,
            )
            .live(),
        ),
        PanelEntry::new(ControlSpec::choice(
            "LateralControlMethod",
            "Lateral Control",
            "Steering controller used on the road.",
            &["PID", "INDI", "LQR", "TORQUE"],
            0,
        )),
        PanelEntry::when(
            ControlSpec::stepper(
                "PidKp",
                "PID Kp",
                "Proportional gain of the steering controller.",
                StepperSpec {
                    min: 1,
                    max: 50,
                    step: 1,
                    default: 25,
                    scale: 0.01,
                    decimals: 2,
                    unit: "",
                },
            ),
            Visibility::KeyEquals("LateralControlMethod", "0"),
        ),
    ],
};


pub static DEVELOPER: PanelDefinition = PanelDefinition {
    name: "Developer",
    entries: &[
        PanelEntry::new(ControlSpec::toggle(
            "DebugUi1",
            "Show Debug UI 1",
            "Overlay debug information on the driving screen.",
            ICON_SHELL,
        )),
        PanelEntry::new(ControlSpec::toggle(
            "DebugUi2",
            "Show Debug UI 2",
            "Overlay additional debug information.",
            ICON_SHELL,
        )),
        PanelEntry::new(ControlSpec::toggle(
            "LongLogDisplay",
            "Show Longitudinal Log",
            "Display the longitudinal control log instead of the lateral one.",
            ICON_SHELL,
        )),
        PanelEntry::new(ControlSpec::toggle(
            "ShowError",
            "Show Error Messages",
            "Display raw error messages from the car interface.",
            ICON_SHELL,
        )),
        PanelEntry::new(ControlSpec::text(
            "CarModel",
            "Force Car Recognition",
            "Car model name to use instead of fingerprinting. Empty means automatic.",
            "",
        )),
        PanelEntry::new(ControlSpec::text(
            "GitBranch",
            "Update Branch",
            "Branch checked by the updater.",
            "",
        )),
    ],
};


/// Every built-in panel, in tab order.
pub static PANELS: [&PanelDefinition; 4] = [&TOGGLES, &DEVICE, &DRIVING, &DEVELOPER];


#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use super::*;
    use crate::binding::{ControlKind, LiveMirror};
    use crate::panel::PanelBuilder;
    use crate::store::{validate_key, MemoryParams, Params};

    #[test]
    fn every_key_is_valid_and_unique_per_panel() {
        for panel in PANELS {
            let mut seen = HashSet::new();
            for entry in panel.entries {
                assert!(validate_key(entry.control.key).is_ok(), "{}", entry.control.key);
                assert!(seen.insert(entry.control.key), "duplicate {}", entry.control.key);
            }
        }
    }

    #[test]
    fn stepper_defaults_lie_within_bounds() {
        for panel in PANELS {
            for entry in panel.entries {
                if let ControlKind::Stepper(s) = &entry.control.kind {
                    assert!(s.min <= s.default && s.default <= s.max, "{}", entry.control.key);
                    assert!(s.step > 0);
                }
            }
        }
    }

    #[test]
    fn radar_toggle_needs_unlock() {
        let store = Arc::new(MemoryParams::new());
        let builder = PanelBuilder::new(store.clone(), LiveMirror::new());
        assert!(!builder.build(&TOGGLES).keys().contains(&"DisableRadar"));
        store.put_bool("DisableRadar_Allow", true).unwrap();
        assert_eq!(builder.build(&TOGGLES).keys().last(), Some(&"DisableRadar"));
    }

    #[test]
    fn pid_gain_only_for_pid_controller() {
        let store = Arc::new(MemoryParams::new());
        let builder = PanelBuilder::new(store.clone(), LiveMirror::new());
        assert!(!builder.build(&DRIVING).keys().contains(&"PidKp"));
        store.put("LateralControlMethod", b"0").unwrap();
        assert!(builder.build(&DRIVING).keys().contains(&"PidKp"));
        store.put("LateralControlMethod", b"3").unwrap();
        assert!(!builder.build(&DRIVING).keys().contains(&"PidKp"));
    }

    #[test]
    fn blind_spot_toggle_feeds_live_mirror() {
        let store = Arc::new(MemoryParams::with_values([(
            "OpkrBlindSpotDetect",
            b"1".as_slice(),
        )]));
        let mirror = LiveMirror::new();
        let builder = PanelBuilder::new(store, mirror.clone());
        let _panel = builder.build(&DRIVING);
        assert!(mirror.get_bool("OpkrBlindSpotDetect"));
        assert_eq!(mirror.len(), 1);
    }
}
