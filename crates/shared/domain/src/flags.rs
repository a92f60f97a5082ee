use bitflags::bitflags;
use crate::ordered::OrderedMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

pub const CANVAS_RENDERER: &str = "CANVAS_RENDERER";
pub const WEBGL_RENDERER: &str = "WEBGL_RENDERER";
pub const WEBGL_DEBUG: &str = "WEBGL_DEBUG";
pub const EXPERIMENTAL: &str = "EXPERIMENTAL";
pub const PLUGIN_3D: &str = "PLUGIN_3D";
pub const PLUGIN_CAMERA3D: &str = "PLUGIN_CAMERA3D";
pub const PLUGIN_FBINSTANT: &str = "PLUGIN_FBINSTANT";
pub const FEATURE_SOUND: &str = "FEATURE_SOUND";

bitflags! {
    /// The well-known build flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub struct BuildFlags: u32 {
        const CANVAS_RENDERER = 1 << 0;
        const WEBGL_RENDERER = 1 << 1;
        const WEBGL_DEBUG = 1 << 2;
        const EXPERIMENTAL = 1 << 3;
        const PLUGIN_3D = 1 << 4;
        const PLUGIN_CAMERA3D = 1 << 5;
        const PLUGIN_FBINSTANT = 1 << 6;
        const FEATURE_SOUND = 1 << 7;
    }
}

impl BuildFlags {
    /// Flags that are on unless a build turns them off.
    #[must_use]
    pub const fn defaults() -> Self {
        Self::CANVAS_RENDERER.union(Self::WEBGL_RENDERER).union(Self::FEATURE_SOUND)
    }

    /// `true` if `name` (any case) is one of the well-known flags.
    #[must_use]
    pub fn is_known(name: &str) -> bool {
        !Self::from(name).is_empty()
    }
}

impl From<&str> for BuildFlags {
    fn from(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            CANVAS_RENDERER => Self::CANVAS_RENDERER,
            WEBGL_RENDERER => Self::WEBGL_RENDERER,
            WEBGL_DEBUG => Self::WEBGL_DEBUG,
            EXPERIMENTAL => Self::EXPERIMENTAL,
            PLUGIN_3D => Self::PLUGIN_3D,
            PLUGIN_CAMERA3D => Self::PLUGIN_CAMERA3D,
            PLUGIN_FBINSTANT => Self::PLUGIN_FBINSTANT,
            FEATURE_SOUND => Self::FEATURE_SOUND,
            _ => Self::empty(),
        }
    }
}

/// Flag name → value for one composition run. Names are stored upper-cased.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureFlagSet(BTreeMap<String, bool>);

impl FeatureFlagSet {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn set(&mut self, name: &str, value: bool) {
        self.0.insert(name.to_ascii_uppercase(), value);
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: bool) -> Self {
        self.set(name, value);
        self
    }

    /// The value of `name`, or `None` if the set says nothing about it.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<bool> {
        self.0.get(&name.to_ascii_uppercase()).copied()
    }

    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).unwrap_or(false)
    }

    /// Overlays `other` on top of `self`; values in `other` win.
    pub fn merge(&mut self, other: &Self) {
        for (name, value) in &other.0 {
            self.0.insert(name.clone(), *value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(name, value)| (name.as_str(), *value))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BuildFlags> for FeatureFlagSet {
    /// Every well-known flag, set according to membership in `flags`.
    fn from(flags: BuildFlags) -> Self {
        let mut set = Self::new();
        for (name, flag) in BuildFlags::all().iter_names() {
            set.set(name, flags.contains(flag));
        }
        set
    }
}

impl<'de> Deserialize<'de> for FeatureFlagSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let OrderedMap(raw) = OrderedMap::<bool>::deserialize(deserializer)?;
        let mut set = Self::new();
        for (name, value) in raw {
            let upper = name.to_ascii_uppercase();
            if set.0.insert(upper, value).is_some() {
                return Err(D::Error::custom(format_args!(
                    "duplicate flag '{name}' (names are case-insensitive)"
                )));
            }
        }
        Ok(set)
    }
}
