//! Device commands: "set parameter X to true" is the whole protocol.
//!
//! An external supervisor process watches a handful of boolean keys and acts
//! when one turns on. This module issues those writes. Commands that would
//! disturb a drive are refused unless the vehicle is disengaged, and the
//! check is made when the command executes, not when it was requested.
//!
//! Some commands are pulses: the key goes to `1` and must return to `0` a
//! few seconds later. The reset is recorded as a [`PendingReset`] which the
//! owner's event loop fires via [`Supervisor::fire_due`]; nothing here sleeps.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::CommandError;
use crate::status::TelemetrySnapshot;
use crate::store::{ParamHandle, Params};


pub const KEY_DO_REBOOT: &str = "DoReboot";
pub const KEY_DO_SHUTDOWN: &str = "DoShutdown";
pub const KEY_DO_UNINSTALL: &str = "DoUninstall";
pub const KEY_ON_ROAD_REFRESH: &str = "OnRoadRefresh";
pub const KEY_CALIBRATION_PARAMS: &str = "CalibrationParams";
pub const KEY_LIVE_PARAMETERS: &str = "LiveParameters";

/// How long a refresh pulse stays high.
pub const REFRESH_PULSE: Duration = Duration::from_secs(3);


/// A request for the external supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    Reboot,
    PowerOff,
    Uninstall,
    Refresh,
    ResetCalibration,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::Reboot,
        Command::PowerOff,
        Command::Uninstall,
        Command::Refresh,
        Command::ResetCalibration,
    ];

    /// Whether the command is refused while engaged.
    pub fn requires_disengaged(self) -> bool {
        matches!(self, Command::Reboot | Command::PowerOff | Command::Refresh)
    }

    /// Whether the command may run in `drive`.
    pub fn permitted(self, drive: DriveState) -> Result<(), CommandError> {
        if self.requires_disengaged() && drive != DriveState::Disengaged {
            return Err(CommandError::Engaged(self.verb()));
        }
        Ok(())
    }

    /// Question shown before the command runs.
    pub fn confirmation(self) -> &'static str {
        match self {
            Command::Reboot => "Are you sure you want to reboot?",
            Command::PowerOff => "Are you sure you want to power off?",
            Command::Uninstall => "Are you sure you want to uninstall?",
            Command::Refresh => "Are you sure you want to refresh?",
            Command::ResetCalibration => "Are you sure you want to reset calibration?",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Command::Reboot => "reboot",
            Command::PowerOff => "power off",
            Command::Uninstall => "uninstall",
            Command::Refresh => "refresh",
            Command::ResetCalibration => "reset calibration",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}


/// Whether driver assistance is in control right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveState {
    Disengaged,
    Engaged,
    /// No telemetry to tell.
    Unknown,
}

impl DriveState {
    pub fn from_snapshot(snapshot: Option<&TelemetrySnapshot>) -> Self {
        match snapshot.and_then(|s| s.engaged) {
            Some(false) => DriveState::Disengaged,
            Some(true) => DriveState::Engaged,
            None => DriveState::Unknown,
        }
    }
}


/// A key to return to `0` once `due` has passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReset {
    pub key: &'static str,
    pub due: Instant,
}


/// Issues device commands through the store.
pub struct Supervisor {
    store: ParamHandle,
    pending: Vec<PendingReset>,
}

impl Supervisor {
    pub fn new(store: ParamHandle) -> Self {
        Supervisor {
            store,
            pending: Vec::new(),
        }
    }

    /// Run `command` given the drive state observed right now.
    pub fn execute(
        &mut self,
        command: Command,
        drive: DriveState,
        now: Instant,
    ) -> Result<(), CommandError> {
        command.permitted(drive)?;
        info!("executing {}", command);
        match command {
            Command::Reboot => self.store.put_bool(KEY_DO_REBOOT, true)?,
            Command::PowerOff => self.store.put_bool(KEY_DO_SHUTDOWN, true)?,
            Command::Uninstall => self.store.put_bool(KEY_DO_UNINSTALL, true)?,
            Command::Refresh => self.pulse(KEY_ON_ROAD_REFRESH, now)?,
            Command::ResetCalibration => {
                self.store.remove(KEY_CALIBRATION_PARAMS)?;
                self.store.remove(KEY_LIVE_PARAMETERS)?;
                self.pulse(KEY_ON_ROAD_REFRESH, now)?;
            }
        }
        Ok(())
    }

    fn pulse(&mut self, key: &'static str, now: Instant) -> Result<(), CommandError> {
        self.store.put_bool(key, true)?;
        let due = now + REFRESH_PULSE;
        match self.pending.iter_mut().find(|p| p.key == key) {
            Some(p) => p.due = due,
            None => self.pending.push(PendingReset { key, due }),
        }
        Ok(())
    }

    /// Reset every pulse whose time has come. A reset that fails to write
    /// stays pending and is retried on the next call. Returns the keys reset.
    pub fn fire_due(&mut self, now: Instant) -> Vec<&'static str> {
        let mut fired = Vec::new();
        let store = &self.store;
        self.pending.retain(|p| {
            if p.due > now {
                return true;
            }
            match store.put_bool(p.key, false) {
                Ok(()) => {
                    fired.push(p.key);
                    false
                }
                Err(e) => {
                    warn!("cannot reset {}: {}", p.key, e);
                    true
                }
            }
        });
        fired
    }

    pub fn pending(&self) -> &[PendingReset] {
        &self.pending
    }

    /// Earliest pending reset, for loops that want to sleep until then.
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.iter().map(|p| p.due).min()
    }
}
