//! Everything the settings UI does, minus the terminal.
//!
//! A `Session` owns the current panel, the change watcher, the telemetry
//! source and the supervisor. The terminal loop feeds it key actions and
//! periodic ticks and renders what it exposes. Keeping this apart from the
//! terminal lets the behavior be driven directly in tests.

use std::time::Instant;

use tracing::{debug, info, warn};

use param_deck_core::binding::{ControlBinding, ControlKind, ControlValue, Interaction};
use param_deck_core::calibration::calibration_description;
use param_deck_core::error::BindingError;
use param_deck_core::panel::catalog::DEVICE;
use param_deck_core::panel::{Panel, PanelBuilder, PanelDefinition};
use param_deck_core::status::{Sidebar, TelemetrySnapshot, TelemetrySource};
use param_deck_core::store::ParamHandle;
use param_deck_core::supervisor::{
    Command, DriveState, Supervisor, KEY_CALIBRATION_PARAMS,
};
use param_deck_core::watch::ChangeWatcher;

use crate::app::{App, AppAction, AppState};
use crate::notification::{NotificationCenter, NotificationType};


/// How long errors stay on screen.
pub const ERROR_TTL_MS: u64 = 5_000;
/// How long confirmations and hints stay on screen.
pub const INFO_TTL_MS: u64 = 3_000;
const MAX_NOTIFICATIONS: usize = 16;


pub struct Session {
    store: ParamHandle,
    builder: PanelBuilder,
    panels: &'static [&'static PanelDefinition],
    panel: Panel,
    watcher: Option<ChangeWatcher>,
    telemetry: Box<dyn TelemetrySource>,
    snapshot: Option<TelemetrySnapshot>,
    supervisor: Supervisor,
    notifications: NotificationCenter,
    app: App,
    calibration: String,
}

impl Session {
    /// Start on the first panel. `watcher` may be absent, in which case
    /// external changes show up only when a panel is rebuilt.
    pub fn new(
        builder: PanelBuilder,
        store: ParamHandle,
        panels: &'static [&'static PanelDefinition],
        watcher: Option<ChangeWatcher>,
        telemetry: Box<dyn TelemetrySource>,
    ) -> Self {
        let panel = builder.build(&PanelDefinition {
            name: "",
            entries: &[],
        });
        let calibration = calibration_description(store.as_ref());
        let mut session = Session {
            supervisor: Supervisor::new(store.clone()),
            store,
            builder,
            panels,
            panel,
            watcher,
            telemetry,
            snapshot: None,
            notifications: NotificationCenter::new(MAX_NOTIFICATIONS),
            app: App::new(),
            calibration,
        };
        session.rebuild();
        session.poll_telemetry();
        session
    }

    // -- accessors ----------------------------------------------------------

    pub fn app(&self) -> &App {
        &self.app
    }

    pub fn app_mut(&mut self) -> &mut App {
        &mut self.app
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn panel_names(&self) -> Vec<&'static str> {
        self.panels.iter().map(|p| p.name).collect()
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn snapshot(&self) -> Option<&TelemetrySnapshot> {
        self.snapshot.as_ref()
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub fn selected(&self) -> Option<&ControlBinding> {
        self.panel.bindings().get(self.app.selected_index)
    }

    /// Calibration summary, shown only on the device panel.
    pub fn calibration(&self) -> Option<&str> {
        if self.definition().map(|d| d.name) == Some(DEVICE.name) {
            Some(&self.calibration)
        } else {
            None
        }
    }

    /// Sidebar indicators for the latest telemetry at `now_ns`.
    pub fn sidebar(&self, now_ns: u64) -> Sidebar {
        let empty = TelemetrySnapshot::default();
        Sidebar::from_snapshot(self.snapshot.as_ref().unwrap_or(&empty), now_ns)
    }

    fn definition(&self) -> Option<&'static PanelDefinition> {
        self.panels.get(self.app.panel_index).copied()
    }

    // -- periodic work ------------------------------------------------------

    /// Apply external changes, poll telemetry, fire due pulse resets and
    /// expire old notifications.
    pub fn tick(&mut self, now: Instant, now_ms: u64) {
        let changed = match &self.watcher {
            Some(w) => w.drain(),
            None => Vec::new(),
        };
        let mut rebuild = false;
        for key in &changed {
            if key == KEY_CALIBRATION_PARAMS {
                self.calibration = calibration_description(self.store.as_ref());
            }
            if self.governs_visibility(key) {
                rebuild = true;
            } else if self.panel.refresh_key(key) {
                debug!("{} changed externally", key);
            }
        }
        if rebuild {
            self.rebuild();
        }

        self.poll_telemetry();
        for key in self.supervisor.fire_due(now) {
            debug!("reset {}", key);
        }
        self.notifications.prune(now_ms);
    }

    fn poll_telemetry(&mut self) {
        if let Some(snapshot) = self.telemetry.poll() {
            self.snapshot = Some(snapshot);
        }
    }

    // -- panels -------------------------------------------------------------

    /// Switch to panel `index`, building it fresh.
    pub fn enter_panel(&mut self, index: usize) {
        self.app.set_panel(index, self.panels.len());
        self.rebuild();
    }

    /// Rebuild the current panel, keeping the selection where possible.
    /// Keys are registered before the store is read, so a write landing
    /// mid-build still produces an event.
    fn rebuild(&mut self) {
        let Some(def) = self.definition() else {
            return;
        };
        self.rewatch(def);
        self.panel = self.builder.build(def);
        self.app.clamp_selection(self.panel.len());
    }

    fn rewatch(&self, def: &PanelDefinition) {
        let Some(watcher) = &self.watcher else {
            return;
        };
        let mut keys = def.watch_keys();
        keys.push(KEY_CALIBRATION_PARAMS);
        if let Err(e) = watcher.replace(keys) {
            warn!("cannot watch panel keys: {}", e);
        }
    }

    fn governs_visibility(&self, key: &str) -> bool {
        self.definition()
            .map(|def| {
                def.entries
                    .iter()
                    .any(|e| e.visible_when.map(|v| v.key()) == Some(key))
            })
            .unwrap_or(false)
    }

    // -- actions ------------------------------------------------------------

    /// Carry out `action`. Returns `true` when the UI should quit.
    pub fn handle_action(&mut self, action: AppAction, now: Instant, now_ms: u64) -> bool {
        match action {
            AppAction::Quit => return true,
            AppAction::NextPanel => {
                self.app.next_panel(self.panels.len());
                self.rebuild();
            }
            AppAction::PrevPanel => {
                self.app.prev_panel(self.panels.len());
                self.rebuild();
            }
            AppAction::SelectNext => self.app.select_next(self.panel.len()),
            AppAction::SelectPrev => self.app.select_prev(),
            AppAction::SelectFirst => self.app.select_first(),
            AppAction::SelectLast => self.app.select_last(self.panel.len()),
            AppAction::Interact(interaction) => self.interact(interaction, now_ms),
            AppAction::BeginEdit => self.begin_edit(now_ms),
            AppAction::SubmitText { key, text } => {
                self.app.back();
                self.submit_text(key, text, now_ms);
            }
            AppAction::RequestCommand(command) => self.request_command(command, now_ms),
            AppAction::RunCommand(command) => {
                self.app.back();
                self.run_command(command, now, now_ms);
            }
            AppAction::Cancel => self.app.back(),
        }
        false
    }

    fn interact(&mut self, interaction: Interaction, now_ms: u64) {
        let index = self.app.selected_index;
        let Some(binding) = self.panel.binding_mut(index) else {
            return;
        };
        if interaction == Interaction::Activate && matches!(binding.kind(), ControlKind::Text(_)) {
            self.begin_edit(now_ms);
            return;
        }
        let key = binding.key();
        match binding.interact(interaction) {
            Ok(()) => {
                if self.governs_visibility(key) {
                    self.rebuild();
                }
            }
            Err(e @ BindingError::Unsupported { .. }) => {
                debug!("{}", e);
            }
            Err(e) => self.notify_error(&e.to_string(), now_ms),
        }
    }

    fn begin_edit(&mut self, now_ms: u64) {
        let Some(binding) = self.selected() else {
            return;
        };
        let key = binding.key();
        let current = match (binding.kind(), binding.value()) {
            (ControlKind::Text(_), ControlValue::Text(t)) => Some(t.clone()),
            (ControlKind::Text(_), _) => Some(String::new()),
            _ => None,
        };
        match current {
            Some(text) => self.app.begin_edit(key, &text),
            None => {
                let title = binding.title();
                self.notifications.push(
                    NotificationType::Info,
                    &format!("{} is not a text setting", title),
                    now_ms,
                    Some(INFO_TTL_MS),
                );
            }
        }
    }

    fn submit_text(&mut self, key: &str, text: String, now_ms: u64) {
        let Some(index) = self.panel.bindings().iter().position(|b| b.key() == key) else {
            warn!("edited control {} is no longer on the panel", key);
            return;
        };
        if let Some(binding) = self.panel.binding_mut(index) {
            if let Err(e) = binding.commit(ControlValue::Text(text)) {
                self.notify_error(&e.to_string(), now_ms);
            }
        }
    }

    fn request_command(&mut self, command: Command, now_ms: u64) {
        self.poll_telemetry();
        match command.permitted(DriveState::from_snapshot(self.snapshot.as_ref())) {
            Ok(()) => self.app.transition(AppState::Confirm { command }),
            Err(e) => self.notify_error(&e.to_string(), now_ms),
        }
    }

    /// The drive state is checked again here; it may have changed while the
    /// confirmation was open.
    fn run_command(&mut self, command: Command, now: Instant, now_ms: u64) {
        self.poll_telemetry();
        let drive = DriveState::from_snapshot(self.snapshot.as_ref());
        match self.supervisor.execute(command, drive, now) {
            Ok(()) => {
                info!("{} requested", command);
                if command == Command::ResetCalibration {
                    self.calibration = calibration_description(self.store.as_ref());
                }
                self.notifications.push(
                    NotificationType::Success,
                    &format!("{} requested", command),
                    now_ms,
                    Some(INFO_TTL_MS),
                );
            }
            Err(e) => self.notify_error(&e.to_string(), now_ms),
        }
    }

    fn notify_error(&mut self, message: &str, now_ms: u64) {
        self.notifications
            .push(NotificationType::Error, message, now_ms, Some(ERROR_TTL_MS));
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
