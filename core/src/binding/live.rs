//! In-memory mirror of selected control values.
//!
//! A running control loop reads these instead of hitting the store every
//! tick. The mirror is only ever written from store-backed values: seeded
//! when a binding is created, updated after a successful write or refresh.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::kind::ControlValue;


/// Cloneable handle to the shared mirror.
#[derive(Debug, Clone, Default)]
pub struct LiveMirror {
    values: Arc<RwLock<HashMap<String, ControlValue>>>,
}

impl LiveMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<ControlValue> {
        self.values.read().ok()?.get(key).cloned()
    }

    /// Boolean view; anything but a stored `true` is `false`.
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.values.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn set(&self, key: &str, value: ControlValue) {
        if let Ok(mut map) = self.values.write() {
            map.insert(key.to_string(), value);
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let mirror = LiveMirror::new();
        let reader = mirror.clone();
        assert!(!reader.get_bool("OpkrBlindSpotDetect"));
        mirror.set("OpkrBlindSpotDetect", ControlValue::Bool(true));
        assert!(reader.get_bool("OpkrBlindSpotDetect"));
        assert_eq!(reader.len(), 1);
    }

    #[test]
    fn non_bool_values_read_false() {
        let mirror = LiveMirror::new();
        mirror.set("CameraOffsetAdj", ControlValue::Int(60));
        assert!(!mirror.get_bool("CameraOffsetAdj"));
        assert_eq!(mirror.get("CameraOffsetAdj"), Some(ControlValue::Int(60)));
    }
}
