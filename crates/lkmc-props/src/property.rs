//! The closed property schema.
//!
//! Every key a declaration may set is a [`Property`] variant. Each key has a
//! fixed [`ValueKind`]; values are carried as [`PropertyValue`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::PropertyError;

/// A property key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Property {
    AllowedArchs,
    CStd,
    CcFlags,
    CcPedantic,
    CxxStd,
    ExitStatus,
    /// Link against the shared lkmc helper objects.
    ExtraObjsLkmcCommon,
    /// Link against the userland assembly helper objects.
    ExtraObjsUserlandAsm,
    Interactive,
    MoreThan1s,
    /// The path only produces intermediate objects.
    NoExecutable,
    Pedantic,
    /// The test is expected to die from a signal.
    ReceivesSignal,
    RequiresKernelModules,
    /// Skipped at run time without a more specific reason.
    SkipRunUnclassified,
}

impl Property {
    /// Every schema key, in schema order.
    pub const ALL: [Property; 15] = [
        Property::AllowedArchs,
        Property::CStd,
        Property::CcFlags,
        Property::CcPedantic,
        Property::CxxStd,
        Property::ExitStatus,
        Property::ExtraObjsLkmcCommon,
        Property::ExtraObjsUserlandAsm,
        Property::Interactive,
        Property::MoreThan1s,
        Property::NoExecutable,
        Property::Pedantic,
        Property::ReceivesSignal,
        Property::RequiresKernelModules,
        Property::SkipRunUnclassified,
    ];

    /// Key as written in declarations.
    pub fn as_str(&self) -> &'static str {
        match self {
            Property::AllowedArchs => "allowed_archs",
            Property::CStd => "c_std",
            Property::CcFlags => "cc_flags",
            Property::CcPedantic => "cc_pedantic",
            Property::CxxStd => "cxx_std",
            Property::ExitStatus => "exit_status",
            Property::ExtraObjsLkmcCommon => "extra_objs_lkmc_common",
            Property::ExtraObjsUserlandAsm => "extra_objs_userland_asm",
            Property::Interactive => "interactive",
            Property::MoreThan1s => "more_than_1s",
            Property::NoExecutable => "no_executable",
            Property::Pedantic => "pedantic",
            Property::ReceivesSignal => "receives_signal",
            Property::RequiresKernelModules => "requires_kernel_modules",
            Property::SkipRunUnclassified => "skip_run_unclassified",
        }
    }

    /// Kind of value this key holds.
    pub fn kind(&self) -> ValueKind {
        match self {
            Property::AllowedArchs => ValueKind::Archs,
            Property::CStd | Property::CxxStd => ValueKind::Std,
            Property::CcFlags => ValueKind::Flags,
            Property::ExitStatus => ValueKind::Int,
            _ => ValueKind::Bool,
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Property {
    type Err = PropertyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Property::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| PropertyError::UnknownProperty(s.to_string()))
    }
}

impl Serialize for Property {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Shape of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Archs,
    Std,
    Flags,
    Bool,
    Int,
}

impl ValueKind {
    /// Human description used in validation errors.
    pub fn expected(&self) -> &'static str {
        match self {
            ValueKind::Archs => "null or a list of architecture names",
            ValueKind::Std => "null or a language standard string",
            ValueKind::Flags => "a list of compiler flag strings",
            ValueKind::Bool => "a boolean",
            ValueKind::Int => "an integer",
        }
    }
}

/// Set of architectures a path may be built for.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AllowedArchs {
    #[default]
    Unrestricted,
    Only(BTreeSet<String>),
}

impl AllowedArchs {
    /// Restrict to the given architectures.
    pub fn only<I, S>(archs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AllowedArchs::Only(archs.into_iter().map(Into::into).collect())
    }

    pub fn permits(&self, arch: &str) -> bool {
        match self {
            AllowedArchs::Unrestricted => true,
            AllowedArchs::Only(archs) => archs.contains(arch),
        }
    }
}

impl Serialize for AllowedArchs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AllowedArchs::Unrestricted => serializer.serialize_none(),
            AllowedArchs::Only(archs) => archs.serialize(serializer),
        }
    }
}

/// A single property value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Archs(AllowedArchs),
    Std(Option<String>),
    Flags(Vec<String>),
    Bool(bool),
    Int(i64),
}

impl PropertyValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            PropertyValue::Archs(_) => ValueKind::Archs,
            PropertyValue::Std(_) => ValueKind::Std,
            PropertyValue::Flags(_) => ValueKind::Flags,
            PropertyValue::Bool(_) => ValueKind::Bool,
            PropertyValue::Int(_) => ValueKind::Int,
        }
    }

    /// Convert a JSON declaration value for `key`.
    pub fn from_json(key: Property, value: &Value) -> Result<Self, PropertyError> {
        let invalid = || PropertyError::InvalidValue {
            key,
            expected: key.kind().expected(),
        };

        match key.kind() {
            ValueKind::Archs => match value {
                Value::Null => Ok(PropertyValue::Archs(AllowedArchs::Unrestricted)),
                Value::Array(_) => string_list(value)
                    .map(|archs| PropertyValue::Archs(AllowedArchs::only(archs)))
                    .ok_or_else(invalid),
                _ => Err(invalid()),
            },
            ValueKind::Std => match value {
                Value::Null => Ok(PropertyValue::Std(None)),
                Value::String(s) => Ok(PropertyValue::Std(Some(s.clone()))),
                _ => Err(invalid()),
            },
            ValueKind::Flags => string_list(value)
                .map(PropertyValue::Flags)
                .ok_or_else(invalid),
            ValueKind::Bool => value.as_bool().map(PropertyValue::Bool).ok_or_else(invalid),
            ValueKind::Int => value.as_i64().map(PropertyValue::Int).ok_or_else(invalid),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Int(value)
    }
}

impl From<AllowedArchs> for PropertyValue {
    fn from(value: AllowedArchs) -> Self {
        PropertyValue::Archs(value)
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}
