//! Panels: ordered, data-driven lists of control bindings.
//!
//! A [`PanelDefinition`] is a static table of entries. [`PanelBuilder`]
//! turns it into a [`Panel`] of live bindings, dropping entries whose
//! visibility predicate is false against the store at build time. Panels are
//! rebuilt, never patched, when the view is re-entered.

pub mod catalog;

use tracing::debug;

use crate::binding::{ControlBinding, ControlSpec, LiveMirror};
use crate::store::{ParamHandle, Params};


/// Condition over another key deciding whether an entry is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Shown when the key reads as boolean true.
    KeyTrue(&'static str),
    /// Shown when the key is absent or reads as false.
    KeyFalse(&'static str),
    /// Shown when the key's trimmed text equals the value.
    KeyEquals(&'static str, &'static str),
}

impl Visibility {
    pub fn evaluate(&self, store: &dyn Params) -> bool {
        match self {
            Visibility::KeyTrue(key) => store.get_bool(key),
            Visibility::KeyFalse(key) => !store.get_bool(key),
            Visibility::KeyEquals(key, want) => store
                .get_string(key)
                .map(|v| v.trim() == *want)
                .unwrap_or(false),
        }
    }

    /// Key the predicate reads.
    pub fn key(&self) -> &'static str {
        match self {
            Visibility::KeyTrue(k) | Visibility::KeyFalse(k) | Visibility::KeyEquals(k, _) => *k,
        }
    }
}


/// One row of a panel table.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelEntry {
    pub control: ControlSpec,
    pub visible_when: Option<Visibility>,
}

impl PanelEntry {
    pub const fn new(control: ControlSpec) -> Self {
        PanelEntry {
            control,
            visible_when: None,
        }
    }

    pub const fn when(control: ControlSpec, visibility: Visibility) -> Self {
        PanelEntry {
            control,
            visible_when: Some(visibility),
        }
    }
}


/// Named, ordered, immutable list of entries.
#[derive(Debug)]
pub struct PanelDefinition {
    pub name: &'static str,
    pub entries: &'static [PanelEntry],
}

impl PanelDefinition {
    /// Every key a built panel can depend on: each entry's control key,
    /// hidden or not, plus the keys gating visibility. Known before building.
    pub fn watch_keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            let gate = entry.visible_when.map(|v| v.key());
            for key in std::iter::once(entry.control.key).chain(gate) {
                if !keys.contains(&key) {
                    keys.push(key);
                }
            }
        }
        keys
    }
}


/// Instantiates panel definitions against a store.
#[derive(Clone)]
pub struct PanelBuilder {
    store: ParamHandle,
    mirror: LiveMirror,
}

impl PanelBuilder {
    pub fn new(store: ParamHandle, mirror: LiveMirror) -> Self {
        PanelBuilder { store, mirror }
    }

    pub fn mirror(&self) -> &LiveMirror {
        &self.mirror
    }

    /// Build a fresh panel, evaluating each predicate against the store now.
    pub fn build(&self, definition: &PanelDefinition) -> Panel {
        let bindings: Vec<ControlBinding> = definition
            .entries
            .iter()
            .filter(|entry| {
                entry
                    .visible_when
                    .map(|v| v.evaluate(self.store.as_ref()))
                    .unwrap_or(true)
            })
            .map(|entry| {
                ControlBinding::new(
                    entry.control.clone(),
                    self.store.clone(),
                    Some(&self.mirror),
                )
            })
            .collect();
        debug!(
            "built panel {} ({} of {} entries visible)",
            definition.name,
            bindings.len(),
            definition.entries.len()
        );
        Panel {
            name: definition.name,
            bindings,
        }
    }
}


/// A built panel.
#[derive(Debug)]
pub struct Panel {
    name: &'static str,
    bindings: Vec<ControlBinding>,
}

impl Panel {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn bindings(&self) -> &[ControlBinding] {
        &self.bindings
    }

    pub fn binding_mut(&mut self, index: usize) -> Option<&mut ControlBinding> {
        self.bindings.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Distinct store keys backing this panel, in display order.
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = Vec::with_capacity(self.bindings.len());
        for b in &self.bindings {
            if !keys.contains(&b.key()) {
                keys.push(b.key());
            }
        }
        keys
    }

    /// Re-read every binding backed by `key`. Returns whether any changed.
    pub fn refresh_key(&mut self, key: &str) -> bool {
        let mut changed = false;
        for b in self.bindings.iter_mut().filter(|b| b.key() == key) {
            changed |= b.refresh();
        }
        changed
    }
}


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
