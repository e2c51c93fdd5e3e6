//! Removal presets and their resolution into a per-category decision.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CleanError;
use crate::taxonomy::{self, Category, TagDescriptor};

/// Identifier of a built-in preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PresetId {
    SocialSafe,
    Anonymous,
    Professional,
    GpsOnly,
    Custom,
}

/// A named removal policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub id: PresetId,
    pub display_name: &'static str,
    pub description: &'static str,
    pub remove_gps: bool,
    pub remove_datetime: bool,
    pub remove_camera: bool,
    pub remove_software: bool,
    /// Dominates the four category flags.
    pub remove_all: bool,
}

pub const SOCIAL_SAFE: Preset = Preset {
    id: PresetId::SocialSafe,
    display_name: "Social Safe",
    description: "Remove location and editing software, keep camera details",
    remove_gps: true,
    remove_datetime: false,
    remove_camera: false,
    remove_software: true,
    remove_all: false,
};

pub const ANONYMOUS: Preset = Preset {
    id: PresetId::Anonymous,
    display_name: "Anonymous",
    description: "Remove all metadata",
    remove_gps: true,
    remove_datetime: true,
    remove_camera: true,
    remove_software: true,
    remove_all: true,
};

pub const PROFESSIONAL: Preset = Preset {
    id: PresetId::Professional,
    display_name: "Professional Photographer",
    description: "Remove location only, keep camera settings and authorship",
    remove_gps: true,
    remove_datetime: false,
    remove_camera: false,
    remove_software: false,
    remove_all: false,
};

pub const GPS_ONLY: Preset = Preset {
    id: PresetId::GpsOnly,
    display_name: "Remove GPS Only",
    description: "Remove only location data",
    remove_gps: true,
    remove_datetime: false,
    remove_camera: false,
    remove_software: false,
    remove_all: false,
};

pub const CUSTOM: Preset = Preset {
    id: PresetId::Custom,
    display_name: "Custom",
    description: "Choose which categories to remove",
    remove_gps: false,
    remove_datetime: false,
    remove_camera: false,
    remove_software: false,
    remove_all: false,
};

impl PresetId {
    pub const ALL: [PresetId; 5] = [
        PresetId::SocialSafe,
        PresetId::Anonymous,
        PresetId::Professional,
        PresetId::GpsOnly,
        PresetId::Custom,
    ];

    pub fn preset(self) -> &'static Preset {
        match self {
            PresetId::SocialSafe => &SOCIAL_SAFE,
            PresetId::Anonymous => &ANONYMOUS,
            PresetId::Professional => &PROFESSIONAL,
            PresetId::GpsOnly => &GPS_ONLY,
            PresetId::Custom => &CUSTOM,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PresetId::SocialSafe => "SOCIAL_SAFE",
            PresetId::Anonymous => "ANONYMOUS",
            PresetId::Professional => "PROFESSIONAL",
            PresetId::GpsOnly => "GPS_ONLY",
            PresetId::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for PresetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts `GPS_ONLY`, `gps-only`, `GpsOnly`, `gps only` and so on.
impl FromStr for PresetId {
    type Err = CleanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "socialsafe" => Ok(PresetId::SocialSafe),
            "anonymous" => Ok(PresetId::Anonymous),
            "professional" => Ok(PresetId::Professional),
            "gpsonly" => Ok(PresetId::GpsOnly),
            "custom" => Ok(PresetId::Custom),
            _ => Err(CleanError::InvalidPreset(s.to_string())),
        }
    }
}

/// Per-category choices supplied at call time. Only honoured for
/// [`PresetId::Custom`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryOverrides {
    pub gps: Option<bool>,
    pub datetime: Option<bool>,
    pub camera: Option<bool>,
    pub software: Option<bool>,
}

impl CategoryOverrides {
    pub fn all(value: bool) -> Self {
        Self {
            gps: Some(value),
            datetime: Some(value),
            camera: Some(value),
            software: Some(value),
        }
    }
}

/// Everything the resolver looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyInput {
    pub preset: PresetId,
    #[serde(default)]
    pub overrides: CategoryOverrides,
}

impl PolicyInput {
    pub fn preset(preset: PresetId) -> Self {
        Self {
            preset,
            overrides: CategoryOverrides::default(),
        }
    }

    pub fn custom(overrides: CategoryOverrides) -> Self {
        Self {
            preset: PresetId::Custom,
            overrides,
        }
    }
}

/// Resolved per-category removal decision for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionSet {
    pub gps: bool,
    pub datetime: bool,
    pub camera: bool,
    pub software: bool,
    pub remove_all: bool,
}

impl DecisionSet {
    pub fn removes(&self, category: Category) -> bool {
        if self.remove_all {
            return true;
        }
        match category {
            Category::Gps => self.gps,
            Category::DateTime => self.datetime,
            Category::Camera => self.camera,
            Category::Software => self.software,
            Category::Other => false,
        }
    }

    pub fn removes_nothing(&self) -> bool {
        !Category::ALL.iter().any(|c| self.removes(*c))
    }

    /// Catalog entries to strip, in reporting order.
    pub fn strip_set(&self) -> Vec<&'static TagDescriptor> {
        taxonomy::all_tags()
            .iter()
            .filter(|d| self.removes(d.category))
            .collect()
    }
}

/// Turn a preset plus optional overrides into a decision set.
///
/// `remove_all` presets ignore overrides entirely. Overrides only apply to
/// the Custom preset, and only for categories where one was supplied.
pub fn resolve(input: &PolicyInput) -> DecisionSet {
    let preset = input.preset.preset();
    if preset.remove_all {
        return DecisionSet {
            gps: true,
            datetime: true,
            camera: true,
            software: true,
            remove_all: true,
        };
    }

    let custom = input.preset == PresetId::Custom;
    let pick = |over: Option<bool>, own: bool| match over {
        Some(v) if custom => v,
        _ => own,
    };

    DecisionSet {
        gps: pick(input.overrides.gps, preset.remove_gps),
        datetime: pick(input.overrides.datetime, preset.remove_datetime),
        camera: pick(input.overrides.camera, preset.remove_camera),
        software: pick(input.overrides.software, preset.remove_software),
        remove_all: false,
    }
}

/// Resolve a preset given by name, e.g. from stored preferences.
pub fn resolve_named(preset: &str, overrides: CategoryOverrides) -> Result<DecisionSet, CleanError> {
    let preset: PresetId = preset.parse()?;
    Ok(resolve(&PolicyInput { preset, overrides }))
}
