//! Property records: per-node deltas and fully resolved properties.

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::PropertyError;
use crate::property::{AllowedArchs, Property, PropertyValue};

/// A partial set of properties.
///
/// Tree nodes hold one of these as the delta they introduce; keys that are
/// absent mean "no override at this level".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyRecord {
    values: BTreeMap<Property, PropertyValue>,
}

impl PropertyRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from typed overrides.
    ///
    /// Every key is checked against the schema before any value is looked
    /// at, so an unknown key is reported even when other entries are
    /// malformed.
    pub fn from_overrides<I, K>(overrides: I) -> Result<Self, PropertyError>
    where
        I: IntoIterator<Item = (K, PropertyValue)>,
        K: AsRef<str>,
    {
        let entries = overrides
            .into_iter()
            .map(|(key, value)| Ok((key.as_ref().parse::<Property>()?, value)))
            .collect::<Result<Vec<_>, PropertyError>>()?;

        let mut record = Self::new();
        for (key, value) in entries {
            if value.kind() != key.kind() {
                return Err(PropertyError::InvalidValue {
                    key,
                    expected: key.kind().expected(),
                });
            }
            record.values.insert(key, value);
        }
        Ok(record)
    }

    /// Build a record from a JSON object of overrides.
    pub fn from_json(overrides: &Map<String, Value>) -> Result<Self, PropertyError> {
        let keys = overrides
            .keys()
            .map(|k| k.parse::<Property>())
            .collect::<Result<Vec<_>, _>>()?;

        let mut record = Self::new();
        for (key, value) in keys.into_iter().zip(overrides.values()) {
            record.values.insert(key, PropertyValue::from_json(key, value)?);
        }
        Ok(record)
    }

    /// Read a key set on this record.
    pub fn read(&self, key: Property) -> Result<&PropertyValue, PropertyError> {
        self.values
            .get(&key)
            .ok_or(PropertyError::MissingProperty(key))
    }

    /// Read a key by name.
    pub fn read_key(&self, key: &str) -> Result<&PropertyValue, PropertyError> {
        self.read(key.parse()?)
    }

    pub fn contains(&self, key: Property) -> bool {
        self.values.contains_key(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Property, &PropertyValue)> {
        self.values.iter().map(|(k, v)| (*k, v))
    }

    /// Apply this record on top of `accumulator`.
    ///
    /// `cc_flags` is appended after the accumulator's flags when both sides
    /// have it; every other key overwrites. `self` is left untouched.
    pub fn merge_into(&self, accumulator: &mut PropertyRecord) {
        for (key, value) in &self.values {
            match (value, accumulator.values.get_mut(key)) {
                (PropertyValue::Flags(extra), Some(PropertyValue::Flags(existing))) => {
                    existing.extend(extra.iter().cloned());
                }
                _ => {
                    accumulator.values.insert(*key, value.clone());
                }
            }
        }
    }
}

impl Serialize for PropertyRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (key, value) in &self.values {
            map.serialize_entry(key.as_str(), value)?;
        }
        map.end()
    }
}

/// Why a path is not built or not tested for an architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoExecutable,
    ArchNotAllowed,
    Interactive,
    #[serde(rename = "more_than_1s")]
    MoreThan1s,
    ReceivesSignal,
    RequiresKernelModules,
    SkipRunUnclassified,
}

impl SkipReason {
    /// Whether this reason also prevents building.
    pub fn blocks_build(&self) -> bool {
        matches!(self, SkipReason::NoExecutable | SkipReason::ArchNotAllowed)
    }
}

/// A complete property record: every schema key has a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedProperties {
    pub allowed_archs: AllowedArchs,
    pub c_std: Option<String>,
    pub cc_flags: Vec<String>,
    pub cc_pedantic: bool,
    pub cxx_std: Option<String>,
    pub exit_status: i64,
    pub extra_objs_lkmc_common: bool,
    pub extra_objs_userland_asm: bool,
    pub interactive: bool,
    pub more_than_1s: bool,
    pub no_executable: bool,
    pub pedantic: bool,
    pub receives_signal: bool,
    pub requires_kernel_modules: bool,
    pub skip_run_unclassified: bool,
}

impl ResolvedProperties {
    pub fn get(&self, key: Property) -> PropertyValue {
        match key {
            Property::AllowedArchs => PropertyValue::Archs(self.allowed_archs.clone()),
            Property::CStd => PropertyValue::Std(self.c_std.clone()),
            Property::CcFlags => PropertyValue::Flags(self.cc_flags.clone()),
            Property::CcPedantic => self.cc_pedantic.into(),
            Property::CxxStd => PropertyValue::Std(self.cxx_std.clone()),
            Property::ExitStatus => self.exit_status.into(),
            Property::ExtraObjsLkmcCommon => self.extra_objs_lkmc_common.into(),
            Property::ExtraObjsUserlandAsm => self.extra_objs_userland_asm.into(),
            Property::Interactive => self.interactive.into(),
            Property::MoreThan1s => self.more_than_1s.into(),
            Property::NoExecutable => self.no_executable.into(),
            Property::Pedantic => self.pedantic.into(),
            Property::ReceivesSignal => self.receives_signal.into(),
            Property::RequiresKernelModules => self.requires_kernel_modules.into(),
            Property::SkipRunUnclassified => self.skip_run_unclassified.into(),
        }
    }

    /// Apply a delta with the same rule as [`PropertyRecord::merge_into`].
    pub fn apply(&mut self, delta: &PropertyRecord) {
        // Value kinds are checked when the delta is built.
        for (key, value) in delta.iter() {
            match (key, value) {
                (Property::AllowedArchs, PropertyValue::Archs(v)) => self.allowed_archs = v.clone(),
                (Property::CStd, PropertyValue::Std(v)) => self.c_std = v.clone(),
                (Property::CxxStd, PropertyValue::Std(v)) => self.cxx_std = v.clone(),
                (Property::CcFlags, PropertyValue::Flags(v)) => {
                    self.cc_flags.extend(v.iter().cloned())
                }
                (Property::ExitStatus, PropertyValue::Int(v)) => self.exit_status = *v,
                (key, PropertyValue::Bool(v)) => {
                    if let Some(slot) = self.flag_mut(key) {
                        *slot = *v;
                    }
                }
                _ => {}
            }
        }
    }

    fn flag_mut(&mut self, key: Property) -> Option<&mut bool> {
        match key {
            Property::CcPedantic => Some(&mut self.cc_pedantic),
            Property::ExtraObjsLkmcCommon => Some(&mut self.extra_objs_lkmc_common),
            Property::ExtraObjsUserlandAsm => Some(&mut self.extra_objs_userland_asm),
            Property::Interactive => Some(&mut self.interactive),
            Property::MoreThan1s => Some(&mut self.more_than_1s),
            Property::NoExecutable => Some(&mut self.no_executable),
            Property::Pedantic => Some(&mut self.pedantic),
            Property::ReceivesSignal => Some(&mut self.receives_signal),
            Property::RequiresKernelModules => Some(&mut self.requires_kernel_modules),
            Property::SkipRunUnclassified => Some(&mut self.skip_run_unclassified),
            _ => None,
        }
    }

    pub fn should_be_built(&self, arch: &str) -> bool {
        !self.no_executable && self.allowed_archs.permits(arch)
    }

    pub fn should_be_tested(&self, arch: &str) -> bool {
        self.should_be_built(arch)
            && !self.interactive
            && !self.more_than_1s
            && !self.receives_signal
            && !self.requires_kernel_modules
            && !self.skip_run_unclassified
    }

    /// Every reason that keeps `arch` from being built or tested.
    pub fn skip_reasons(&self, arch: &str) -> Vec<SkipReason> {
        [
            (self.no_executable, SkipReason::NoExecutable),
            (!self.allowed_archs.permits(arch), SkipReason::ArchNotAllowed),
            (self.interactive, SkipReason::Interactive),
            (self.more_than_1s, SkipReason::MoreThan1s),
            (self.receives_signal, SkipReason::ReceivesSignal),
            (self.requires_kernel_modules, SkipReason::RequiresKernelModules),
            (self.skip_run_unclassified, SkipReason::SkipRunUnclassified),
        ]
        .into_iter()
        .filter_map(|(active, reason)| active.then_some(reason))
        .collect()
    }

    /// The same values as a complete [`PropertyRecord`].
    pub fn to_record(&self) -> PropertyRecord {
        PropertyRecord {
            values: Property::ALL.iter().map(|k| (*k, self.get(*k))).collect(),
        }
    }
}

impl TryFrom<&PropertyRecord> for ResolvedProperties {
    type Error = PropertyError;

    fn try_from(record: &PropertyRecord) -> Result<Self, Self::Error> {
        let archs = |key: Property| -> Result<AllowedArchs, PropertyError> {
            match record.read(key)? {
                PropertyValue::Archs(v) => Ok(v.clone()),
                _ => Err(invalid(key)),
            }
        };
        let lang_std = |key: Property| -> Result<Option<String>, PropertyError> {
            match record.read(key)? {
                PropertyValue::Std(v) => Ok(v.clone()),
                _ => Err(invalid(key)),
            }
        };
        let flags = |key: Property| -> Result<Vec<String>, PropertyError> {
            match record.read(key)? {
                PropertyValue::Flags(v) => Ok(v.clone()),
                _ => Err(invalid(key)),
            }
        };
        let int = |key: Property| -> Result<i64, PropertyError> {
            match record.read(key)? {
                PropertyValue::Int(v) => Ok(*v),
                _ => Err(invalid(key)),
            }
        };
        let flag = |key: Property| -> Result<bool, PropertyError> {
            match record.read(key)? {
                PropertyValue::Bool(v) => Ok(*v),
                _ => Err(invalid(key)),
            }
        };

        Ok(Self {
            allowed_archs: archs(Property::AllowedArchs)?,
            c_std: lang_std(Property::CStd)?,
            cc_flags: flags(Property::CcFlags)?,
            cc_pedantic: flag(Property::CcPedantic)?,
            cxx_std: lang_std(Property::CxxStd)?,
            exit_status: int(Property::ExitStatus)?,
            extra_objs_lkmc_common: flag(Property::ExtraObjsLkmcCommon)?,
            extra_objs_userland_asm: flag(Property::ExtraObjsUserlandAsm)?,
            interactive: flag(Property::Interactive)?,
            more_than_1s: flag(Property::MoreThan1s)?,
            no_executable: flag(Property::NoExecutable)?,
            pedantic: flag(Property::Pedantic)?,
            receives_signal: flag(Property::ReceivesSignal)?,
            requires_kernel_modules: flag(Property::RequiresKernelModules)?,
            skip_run_unclassified: flag(Property::SkipRunUnclassified)?,
        })
    }
}

fn invalid(key: Property) -> PropertyError {
    PropertyError::InvalidValue {
        key,
        expected: key.kind().expected(),
    }
}
