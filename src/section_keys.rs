//! Storage names for library components.
//!
//! Each library component lives in its own storage. Storage names are limited
//! to 31 characters and cannot contain `/`, so longer or unusual component
//! names are mapped to a derived key. Those mappings are listed in the
//! `SectionKeys` stream.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

use encoding_rs::Encoding;

use crate::binary::{BinaryReader, BinaryResult, BinaryWriter};
use crate::error::DecodeError;
use crate::mapping::{FieldError, FieldValue};
use crate::params::{ParameterCollection, ParameterWriter};

pub const SECTION_KEYS_STREAM: &str = "SectionKeys";

/// Longest storage name the container accepts.
pub const MAX_SECTION_KEY_CHARS: usize = 31;

/// Storage name used when no mapping is listed for `name`.
pub fn default_section_key(name: &str) -> Cow<'_, str> {
    if fits_verbatim(name) {
        return Cow::Borrowed(name);
    }
    Cow::Owned(
        name.chars()
            .map(|c| if c == '/' { '_' } else { c })
            .take(MAX_SECTION_KEY_CHARS)
            .collect(),
    )
}

#[inline]
fn fits_verbatim(name: &str) -> bool {
    !name.contains('/') && name.chars().count() <= MAX_SECTION_KEY_CHARS
}

/// Mapping from component name to storage name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionKeys {
    entries: Vec<(String, String)>,
}

impl SectionKeys {
    /// Assign a distinct storage name to every component name, in order.
    ///
    /// Names that cannot be used verbatim, and names whose storage would
    /// collide with an earlier one, are recorded in the returned table.
    /// Collisions compare case-insensitively, as the container does. A name
    /// that occurs more than once is recorded at every occurrence, so
    /// [`resolve`](Self::resolve) can tell the occurrences apart.
    pub fn assign<'n>(names: impl IntoIterator<Item = &'n str>) -> (Vec<String>, SectionKeys) {
        let names: Vec<&str> = names.into_iter().collect();
        let mut occurrences: HashMap<&str, usize> = HashMap::new();
        for &name in &names {
            *occurrences.entry(name).or_default() += 1;
        }

        let mut taken = HashSet::new();
        let mut keys = Vec::with_capacity(names.len());
        let mut table = SectionKeys::default();
        for name in names {
            let base = default_section_key(name);
            let mut key = base.to_string();
            let mut n = 1usize;
            while !taken.insert(key.to_uppercase()) {
                let suffix = format!("_{n}");
                let keep = MAX_SECTION_KEY_CHARS - suffix.len();
                key = base.chars().take(keep).collect::<String>() + &suffix;
                n += 1;
            }
            if key != name || occurrences[name] > 1 {
                table.entries.push((name.to_string(), key.clone()));
            }
            keys.push(key);
        }
        (keys, table)
    }

    /// Storage names for a list of component names, in order.
    ///
    /// The n-th occurrence of a name takes the n-th table entry listed for
    /// it, or the default key once those run out.
    pub fn resolve<'n>(&self, names: impl IntoIterator<Item = &'n str>) -> Vec<String> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        names
            .into_iter()
            .map(|name| {
                let occurrence = seen.entry(name).or_default();
                let listed = self
                    .entries
                    .iter()
                    .filter(|(lib_ref, _)| lib_ref == name)
                    .nth(*occurrence);
                *occurrence += 1;
                match listed {
                    Some((_, key)) => key.clone(),
                    None => default_section_key(name).into_owned(),
                }
            })
            .collect()
    }

    /// Storage name of the first component called `name`.
    pub fn key_for<'a>(&'a self, name: &'a str) -> Cow<'a, str> {
        match self.entries.iter().find(|(lib_ref, _)| lib_ref == name) {
            Some((_, key)) => Cow::Borrowed(key.as_str()),
            None => default_section_key(name),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode the `SectionKeys` stream: one parameter block with `KeyCount`
    /// and zero-based `LibRef{n}`/`SectionKey{n}` pairs.
    pub fn read(data: &[u8], encoding: &'static Encoding) -> Result<Self, DecodeError> {
        let mut reader = BinaryReader::new(data);
        let block = reader.read_parameter_block()?;
        let params = ParameterCollection::parse(block.data());
        let count = i32::read_field(&params, "KeyCount", encoding)?;
        let count = usize::try_from(count)
            .map_err(|_| FieldError::new("KeyCount", format!("negative count {count}")))?;

        // Every listed entry has its own tokens, so indices past the token
        // count cannot match anything.
        let count = count.min(params.len());
        let mut entries = Vec::with_capacity(count);
        let mut index = itoa::Buffer::new();
        for i in 0..count {
            let i = index.format(i);
            let lib_ref = params.get_joined(&["LibRef", i]);
            let key = params.get_joined(&["SectionKey", i]);
            if let (Some(lib_ref), Some(key)) = (lib_ref, key) {
                entries.push((
                    lib_ref.value(encoding).into_owned(),
                    key.value(encoding).into_owned(),
                ));
            }
        }
        Ok(Self { entries })
    }

    pub fn write(&self, encoding: &'static Encoding) -> BinaryResult<Vec<u8>> {
        let mut text = Vec::new();
        let mut w = ParameterWriter::new(&mut text, encoding);
        w.int(&["KeyCount"], self.entries.len() as i64);
        let mut index = itoa::Buffer::new();
        for (i, (lib_ref, key)) in self.entries.iter().enumerate() {
            let i = index.format(i);
            w.string(&["LibRef", i], lib_ref);
            w.string(&["SectionKey", i], key);
        }
        w.finish()?;
        let mut out = BinaryWriter::new(Vec::with_capacity(text.len() + 5));
        out.write_parameter_block(&text)?;
        Ok(out.into_inner())
    }
}
