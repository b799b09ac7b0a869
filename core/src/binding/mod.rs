//! Control bindings: one typed control tied to one store key.
//!
//! A binding reads its key on construction (absent means the declared
//! default) and writes through to the store before it changes what it shows.
//! If the write fails, the displayed value is reloaded from the store so the
//! control never shows a value the store rejected.

pub mod kind;
pub mod live;

use tracing::{debug, warn};

use crate::error::BindingError;
use crate::store::ParamHandle;

pub use kind::{
    ChoiceSpec, ControlBehavior, ControlKind, ControlValue, Interaction, StepperSpec, TextSpec,
    ToggleSpec,
};
pub use live::LiveMirror;


/// Declarative description of a control: what it is called, which key backs
/// it, and what kind of value it edits.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlSpec {
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: Option<&'static str>,
    pub kind: ControlKind,
    /// Also publish the value to the live mirror.
    pub live: bool,
}

impl ControlSpec {
    pub const fn toggle(
        key: &'static str,
        title: &'static str,
        description: &'static str,
        icon: &'static str,
    ) -> Self {
        ControlSpec {
            key,
            title,
            description,
            icon: Some(icon),
            kind: ControlKind::Toggle(ToggleSpec { default: false }),
            live: false,
        }
    }

    pub const fn stepper(
        key: &'static str,
        title: &'static str,
        description: &'static str,
        spec: StepperSpec,
    ) -> Self {
        ControlSpec {
            key,
            title,
            description,
            icon: None,
            kind: ControlKind::Stepper(spec),
            live: false,
        }
    }

    pub const fn choice(
        key: &'static str,
        title: &'static str,
        description: &'static str,
        options: &'static [&'static str],
        default: usize,
    ) -> Self {
        ControlSpec {
            key,
            title,
            description,
            icon: None,
            kind: ControlKind::Choice(ChoiceSpec { options, default }),
            live: false,
        }
    }

    pub const fn text(
        key: &'static str,
        title: &'static str,
        description: &'static str,
        default: &'static str,
    ) -> Self {
        ControlSpec {
            key,
            title,
            description,
            icon: None,
            kind: ControlKind::Text(TextSpec { default }),
            live: false,
        }
    }

    /// Toggle that defaults to on when the key is absent.
    pub const fn default_on(self) -> Self {
        match self.kind {
            ControlKind::Toggle(_) => ControlSpec {
                kind: ControlKind::Toggle(ToggleSpec { default: true }),
                ..self
            },
            _ => self,
        }
    }

    /// Mirror the value into the live state.
    pub const fn live(mut self) -> Self {
        self.live = true;
        self
    }
}


/// A control bound to a store key.
pub struct ControlBinding {
    spec: ControlSpec,
    store: ParamHandle,
    mirror: Option<LiveMirror>,
    value: ControlValue,
}

impl ControlBinding {
    /// Create the binding and load its value from the store. If the spec is
    /// live and a mirror is given, the mirror is seeded from the store.
    pub fn new(spec: ControlSpec, store: ParamHandle, mirror: Option<&LiveMirror>) -> Self {
        let value = spec.kind.behavior().decode(store.get(spec.key).as_deref());
        let mirror = if spec.live { mirror.cloned() } else { None };
        let binding = ControlBinding {
            spec,
            store,
            mirror,
            value,
        };
        binding.publish();
        binding
    }

    pub fn key(&self) -> &'static str {
        self.spec.key
    }

    pub fn title(&self) -> &'static str {
        self.spec.title
    }

    pub fn description(&self) -> &'static str {
        self.spec.description
    }

    pub fn icon(&self) -> Option<&'static str> {
        self.spec.icon
    }

    pub fn kind(&self) -> &ControlKind {
        &self.spec.kind
    }

    pub fn value(&self) -> &ControlValue {
        &self.value
    }

    /// Value formatted for display.
    pub fn display(&self) -> String {
        self.spec.kind.behavior().display(&self.value)
    }

    /// Apply a user interaction: write the new value, then show it.
    pub fn interact(&mut self, interaction: Interaction) -> Result<(), BindingError> {
        let behavior = self.spec.kind.behavior();
        let Some(next) = behavior.apply(&self.value, &interaction) else {
            return Err(BindingError::Unsupported {
                key: self.spec.key.to_string(),
                kind: behavior.name(),
                interaction: interaction.name(),
            });
        };
        self.commit(next)
    }

    /// Write `value` to the store and show it. On failure the displayed
    /// value is reloaded from the store.
    pub fn commit(&mut self, value: ControlValue) -> Result<(), BindingError> {
        let bytes = self.spec.kind.behavior().encode(&value);
        if let Err(source) = self.store.put(self.spec.key, &bytes) {
            warn!("write of {} failed: {}", self.spec.key, source);
            self.reload();
            return Err(BindingError::WriteFailed {
                title: self.spec.title.to_string(),
                source,
            });
        }
        debug!("{} = {:?}", self.spec.key, value);
        self.value = value;
        self.publish();
        Ok(())
    }

    /// Re-read the store, e.g. after the watcher reported a change.
    /// Returns whether the displayed value changed.
    pub fn refresh(&mut self) -> bool {
        let before = self.value.clone();
        self.reload();
        before != self.value
    }

    fn reload(&mut self) {
        self.value = self
            .spec
            .kind
            .behavior()
            .decode(self.store.get(self.spec.key).as_deref());
        self.publish();
    }

    fn publish(&self) {
        if let Some(mirror) = &self.mirror {
            mirror.set(self.spec.key, self.value.clone());
        }
    }
}

impl std::fmt::Debug for ControlBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlBinding")
            .field("key", &self.spec.key)
            .field("value", &self.value)
            .finish()
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::{MemoryParams, Params};

    const METRIC: ControlSpec = ControlSpec::toggle(
        "IsMetric",
        "Use Metric System",
        "Display speed in km/h instead of mph.",
        "../assets/offroad/icon_metric.png",
    );

    const BSM: ControlSpec = ControlSpec::toggle(
        "OpkrBlindSpotDetect",
        "Show BSM Status",
        "If a car is detected in the rear, it will be displayed on the screen.",
        "../assets/offroad/icon_shell.png",
    )
    .live();

    fn memory(values: &[(&'static str, &'static str)]) -> Arc<MemoryParams> {
        Arc::new(MemoryParams::with_values(
            values.iter().map(|(k, v)| (*k, v.as_bytes())),
        ))
    }

    #[test]
    fn initial_value_comes_from_store() {
        let store = memory(&[("IsMetric", "1")]);
        let binding = ControlBinding::new(METRIC, store, None);
        assert_eq!(binding.value(), &ControlValue::Bool(true));
        assert_eq!(binding.display(), "ON");
    }

    #[test]
    fn absent_key_uses_declared_default() {
        let store = memory(&[]);
        let off = ControlBinding::new(METRIC, store.clone(), None);
        assert_eq!(off.value(), &ControlValue::Bool(false));
        let on = ControlBinding::new(METRIC.default_on(), store, None);
        assert_eq!(on.value(), &ControlValue::Bool(true));
    }

    #[test]
    fn toggle_writes_store_then_shows() {
        let store = memory(&[("IsMetric", "0")]);
        let mut binding = ControlBinding::new(METRIC, store.clone(), None);
        binding.interact(Interaction::Activate).unwrap();
        assert!(store.get_bool("IsMetric"));
        assert_eq!(binding.value(), &ControlValue::Bool(true));
        assert_eq!(store.writes(), vec![("IsMetric".to_string(), Some(b"1".to_vec()))]);
    }

    #[test]
    fn failed_write_rolls_back_to_store_value() {
        let store = memory(&[("IsMetric", "0")]);
        let mut binding = ControlBinding::new(METRIC, store.clone(), None);
        store.set_fail_writes(true);

        let err = binding.interact(Interaction::Activate).unwrap_err();
        assert!(matches!(err, BindingError::WriteFailed { .. }));
        assert!(err.to_string().contains("Use Metric System"));
        assert_eq!(binding.value(), &ControlValue::Bool(false));
        assert!(!store.get_bool("IsMetric"));
    }

    #[test]
    fn rollback_picks_up_external_change() {
        let store = memory(&[("IsMetric", "0")]);
        let mut binding = ControlBinding::new(METRIC, store.clone(), None);
        // Another process flips the key, then our own write fails.
        store.put_bool("IsMetric", true).unwrap();
        store.set_fail_writes(true);
        assert!(binding.interact(Interaction::Activate).is_err());
        assert_eq!(binding.value(), &ControlValue::Bool(true));
    }

    #[test]
    fn unsupported_interaction_does_not_write() {
        let store = memory(&[]);
        let mut binding = ControlBinding::new(METRIC, store.clone(), None);
        let err = binding.interact(Interaction::Increment).unwrap_err();
        assert!(matches!(err, BindingError::Unsupported { kind: "toggle", .. }));
        assert!(store.writes().is_empty());
    }

    #[test]
    fn live_binding_seeds_mirror_from_store() {
        let store = memory(&[("OpkrBlindSpotDetect", "1")]);
        let mirror = LiveMirror::new();
        let _binding = ControlBinding::new(BSM, store, Some(&mirror));
        assert!(mirror.get_bool("OpkrBlindSpotDetect"));
    }

    #[test]
    fn live_binding_updates_mirror_only_after_successful_write() {
        let store = memory(&[]);
        let mirror = LiveMirror::new();
        let mut binding = ControlBinding::new(BSM, store.clone(), Some(&mirror));
        assert!(!mirror.get_bool("OpkrBlindSpotDetect"));

        store.set_fail_writes(true);
        assert!(binding.interact(Interaction::Activate).is_err());
        assert!(!mirror.get_bool("OpkrBlindSpotDetect"));

        store.set_fail_writes(false);
        binding.interact(Interaction::Activate).unwrap();
        assert!(mirror.get_bool("OpkrBlindSpotDetect"));
    }

    #[test]
    fn non_live_binding_leaves_mirror_alone() {
        let store = memory(&[("IsMetric", "1")]);
        let mirror = LiveMirror::new();
        let _binding = ControlBinding::new(METRIC, store, Some(&mirror));
        assert!(mirror.is_empty());
    }

    #[test]
    fn refresh_reports_change() {
        let store = memory(&[("IsMetric", "0")]);
        let mut binding = ControlBinding::new(METRIC, store.clone(), None);
        assert!(!binding.refresh());
        store.put_bool("IsMetric", true).unwrap();
        assert!(binding.refresh());
        assert_eq!(binding.display(), "ON");
    }

    #[test]
    fn stepper_writes_text_form() {
        let spec = ControlSpec::stepper(
            "OpkrLaneChangeSpeed",
            "Lane Change Speed",
            "",
            StepperSpec {
                min: 20,
                max: 160,
                step: 5,
                default: 45,
                scale: 1.0,
                decimals: 0,
                unit: " km/h",
            },
        );
        let store = memory(&[]);
        let mut binding = ControlBinding::new(spec, store.clone(), None);
        binding.interact(Interaction::Increment).unwrap();
        assert_eq!(store.get_i64("OpkrLaneChangeSpeed"), Some(50));
        assert_eq!(binding.display(), "50 km/h");
    }
}
