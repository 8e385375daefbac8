//! String-keyed property bags, the vocabulary of the paint-event contract.
//!
//! Keys live in a CSS-adjacent namespace (`svg:…`, `draw:…`, `fo:…`,
//! `style:…`, `libwpg:…`). Plain doubles are lengths in inches; the other
//! variants carry their own unit. Insertion order is preserved so that two
//! parses of the same input serialize identically.

use serde_derive::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Length in inches (the default unit of the contract)
    Double(f64),
    /// Unit-less number (angles in degrees, ratios)
    Generic(f64),
    /// Fraction in [0, 1], rendered as a percentage
    Percent(f64),
    /// Length in points
    Point(f64),
    Int(i32),
    Bool(bool),
    Str(String),
}

impl PropertyValue {
    /// Numeric value regardless of unit tag; 0.0 for non-numeric variants.
    pub fn as_double(&self) -> f64 {
        match *self {
            PropertyValue::Double(v)
            | PropertyValue::Generic(v)
            | PropertyValue::Percent(v)
            | PropertyValue::Point(v) => v,
            PropertyValue::Int(v) => v as f64,
            PropertyValue::Bool(b) => {
                if b {
                    1.0
                } else {
                    0.0
                }
            }
            PropertyValue::Str(_) => 0.0,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Serialized form with unit suffix, trailing zeros trimmed.
    pub fn to_propstring(&self) -> String {
        fn num(v: f64) -> String {
            let s = format!("{:.4}", v);
            let s = s.trim_end_matches('0').trim_end_matches('.');
            if s.is_empty() || s == "-" {
                "0".to_string()
            } else {
                s.to_string()
            }
        }
        match self {
            PropertyValue::Double(v) => format!("{}in", num(*v)),
            PropertyValue::Generic(v) => num(*v),
            PropertyValue::Percent(v) => format!("{}%", num(*v * 100.0)),
            PropertyValue::Point(v) => format!("{}pt", num(*v)),
            PropertyValue::Int(v) => v.to_string(),
            PropertyValue::Bool(b) => b.to_string(),
            PropertyValue::Str(s) => s.clone(),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Str(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Str(s)
    }
}

/// Ordered set of key/value properties. Re-inserting a key overwrites the
/// value in place, keeping the original position.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyList {
    entries: Vec<(String, PropertyValue)>,
}

impl PropertyList {
    pub fn new() -> Self {
        PropertyList::default()
    }

    pub fn insert(&mut self, key: &str, value: PropertyValue) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key.to_string(), value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&PropertyValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_double(&self, key: &str) -> Option<f64> {
        self.get(key).map(PropertyValue::as_double)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PropertyValue::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
