//! Control kinds: a closed set, each with one behaviour implementation.
//!
//! A kind knows how to decode its stored bytes (falling back to its declared
//! default), encode a new value, apply a user interaction, and format a
//! value for display.

use std::fmt;

use crate::store::{decode_bool, encode_bool};


/// Typed value held by a control.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlValue {
    Bool(bool),
    Int(i64),
    /// Index into a choice's option list.
    Index(usize),
    Text(String),
}

impl ControlValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ControlValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ControlValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}


/// A user action on a control.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    /// Flip a toggle or cycle a choice.
    Activate,
    Increment,
    Decrement,
    SetText(String),
}

impl Interaction {
    pub fn name(&self) -> &'static str {
        match self {
            Interaction::Activate => "activate",
            Interaction::Increment => "increment",
            Interaction::Decrement => "decrement",
            Interaction::SetText(_) => "set text",
        }
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}


/// Behaviour shared by every control kind.
pub trait ControlBehavior {
    /// Short kind name used in messages.
    fn name(&self) -> &'static str;

    /// Value for the stored bytes; absent or unparseable yields the default.
    fn decode(&self, raw: Option<&[u8]>) -> ControlValue;

    fn encode(&self, value: &ControlValue) -> Vec<u8>;

    /// New value after `interaction`, or `None` if this kind does not
    /// support it.
    fn apply(&self, current: &ControlValue, interaction: &Interaction) -> Option<ControlValue>;

    fn display(&self, value: &ControlValue) -> String;
}


// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// Closed set of control kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlKind {
    Toggle(ToggleSpec),
    Stepper(StepperSpec),
    Choice(ChoiceSpec),
    Text(TextSpec),
}

impl ControlKind {
    pub fn behavior(&self) -> &dyn ControlBehavior {
        match self {
            ControlKind::Toggle(s) => s,
            ControlKind::Stepper(s) => s,
            ControlKind::Choice(s) => s,
            ControlKind::Text(s) => s,
        }
    }
}


#[derive(Debug, Clone, PartialEq)]
pub struct ToggleSpec {
    pub default: bool,
}

impl ControlBehavior for ToggleSpec {
    fn name(&self) -> &'static str {
        "toggle"
    }

    fn decode(&self, raw: Option<&[u8]>) -> ControlValue {
        ControlValue::Bool(raw.map(decode_bool).unwrap_or(self.default))
    }

    fn encode(&self, value: &ControlValue) -> Vec<u8> {
        encode_bool(value.as_bool().unwrap_or(self.default)).to_vec()
    }

    fn apply(&self, current: &ControlValue, interaction: &Interaction) -> Option<ControlValue> {
        match interaction {
            Interaction::Activate => Some(ControlValue::Bool(!current.as_bool()?)),
            _ => None,
        }
    }

    fn display(&self, value: &ControlValue) -> String {
        let label = if value.as_bool() == Some(true) { "ON" } else { "OFF" };
        label.to_string()
    }
}


/// Integer stepper. The stored value is an integer; `scale` converts it for
/// display (stored `5` with scale `0.01` shows as `0.05`).
#[derive(Debug, Clone, PartialEq)]
pub struct StepperSpec {
    pub min: i64,
    pub max: i64,
    pub step: i64,
    pub default: i64,
    pub scale: f64,
    /// Decimal places shown after scaling.
    pub decimals: usize,
    pub unit: &'static str,
}

impl StepperSpec {
    fn clamp(&self, v: i64) -> i64 {
        v.clamp(self.min, self.max)
    }
}

impl ControlBehavior for StepperSpec {
    fn name(&self) -> &'static str {
        "stepper"
    }

    fn decode(&self, raw: Option<&[u8]>) -> ControlValue {
        let parsed = raw
            .and_then(|b| std::str::from_utf8(b).ok())
            .and_then(|s| s.trim().parse::<i64>().ok());
        ControlValue::Int(self.clamp(parsed.unwrap_or(self.default)))
    }

    fn encode(&self, value: &ControlValue) -> Vec<u8> {
        value
            .as_int()
            .unwrap_or(self.default)
            .to_string()
            .into_bytes()
    }

    fn apply(&self, current: &ControlValue, interaction: &Interaction) -> Option<ControlValue> {
        let v = current.as_int()?;
        let next = match interaction {
            Interaction::Increment => v.saturating_add(self.step),
            Interaction::Decrement => v.saturating_sub(self.step),
            _ => return None,
        };
        Some(ControlValue::Int(self.clamp(next)))
    }

    fn display(&self, value: &ControlValue) -> String {
        let v = value.as_int().unwrap_or(self.default);
        if self.decimals == 0 && self.scale == 1.0 {
            format!("{}{}", v, self.unit)
        } else {
            format!("{:.*}{}", self.decimals, v as f64 * self.scale, self.unit)
        }
    }
}


/// Enumerated choice stored as the option index.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceSpec {
    pub options: &'static [&'static str],
    pub default: usize,
}

impl ChoiceSpec {
    fn default_index(&self) -> usize {
        self.default.min(self.options.len().saturating_sub(1))
    }
}

impl ControlBehavior for ChoiceSpec {
    fn name(&self) -> &'static str {
        "choice"
    }

    fn decode(&self, raw: Option<&[u8]>) -> ControlValue {
        let parsed = raw
            .and_then(|b| std::str::from_utf8(b).ok())
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|i| *i < self.options.len());
        ControlValue::Index(parsed.unwrap_or_else(|| self.default_index()))
    }

    fn encode(&self, value: &ControlValue) -> Vec<u8> {
        let i = match value {
            ControlValue::Index(i) => *i,
            _ => self.default_index(),
        };
        i.to_string().into_bytes()
    }

    fn apply(&self, current: &ControlValue, interaction: &Interaction) -> Option<ControlValue> {
        let ControlValue::Index(i) = current else {
            return None;
        };
        let len = self.options.len();
        if len == 0 {
            return None;
        }
        let next = match interaction {
            Interaction::Activate => (i + 1) % len,
            Interaction::Increment => (i + 1).min(len - 1),
            Interaction::Decrement => i.saturating_sub(1),
            Interaction::SetText(_) => return None,
        };
        Some(ControlValue::Index(next))
    }

    fn display(&self, value: &ControlValue) -> String {
        match value {
            ControlValue::Index(i) => self.options.get(*i).copied().unwrap_or("?").to_string(),
            _ => "?".to_string(),
        }
    }
}


#[derive(Debug, Clone, PartialEq)]
pub struct TextSpec {
    pub default: &'static str,
}

impl ControlBehavior for TextSpec {
    fn name(&self) -> &'static str {
        "text"
    }

    fn decode(&self, raw: Option<&[u8]>) -> ControlValue {
        match raw {
            Some(b) => ControlValue::Text(String::from_utf8_lossy(b).into_owned()),
            None => ControlValue::Text(self.default.to_string()),
        }
    }

    fn encode(&self, value: &ControlValue) -> Vec<u8> {
        match value {
            ControlValue::Text(s) => s.clone().into_bytes(),
            _ => self.default.as_bytes().to_vec(),
        }
    }

    fn apply(&self, _current: &ControlValue, interaction: &Interaction) -> Option<ControlValue> {
        match interaction {
            Interaction::SetText(s) => Some(ControlValue::Text(s.clone())),
            _ => None,
        }
    }

    fn display(&self, value: &ControlValue) -> String {
        match value {
            ControlValue::Text(s) if s.is_empty() => "(empty)".to_string(),
            ControlValue::Text(s) => s.clone(),
            _ => String::new(),
        }
    }
}
