use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

use super::{ParameterCollection, ParameterWriter};

/// One decoded token kept for pass-through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedParameter {
    pub name: String,
    pub value: String,
    /// Written back with the UTF-8 marker
    pub utf8: bool,
}

/// Decoded tokens in their original order.
///
/// Holds records of unrecognized kinds and parameter lists this crate does
/// not map field by field, so they can be written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnedParameters {
    entries: Vec<OwnedParameter>,
}

impl OwnedParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode every token of `params`.
    pub fn from_collection(params: &ParameterCollection<'_>, encoding: &'static Encoding) -> Self {
        let entries = params
            .iter()
            .map(|p| OwnedParameter {
                name: p.name().into_owned(),
                value: p.value(encoding).into_owned(),
                utf8: p.is_utf8(),
            })
            .collect();
        Self { entries }
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push(OwnedParameter {
            name: name.into(),
            value: value.into(),
            utf8: false,
        });
    }

    /// Value of the first entry with the given name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
            .map(|e| e.value.as_str())
    }

    /// Drop every entry with the given name.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|e| !e.name.eq_ignore_ascii_case(name));
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OwnedParameter> {
        self.entries.iter()
    }

    /// Write every entry except those named in `skip`.
    pub fn write_to(&self, w: &mut ParameterWriter<'_>, skip: &[&str]) {
        for entry in &self.entries {
            if skip.iter().any(|s| entry.name.eq_ignore_ascii_case(s)) {
                continue;
            }
            if entry.utf8 {
                w.utf8(&[&entry.name], &entry.value);
            } else {
                w.string(&[&entry.name], &entry.value);
            }
        }
    }
}

impl<'a> IntoIterator for &'a OwnedParameters {
    type Item = &'a OwnedParameter;
    type IntoIter = std::slice::Iter<'a, OwnedParameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
