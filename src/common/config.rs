use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::error;

pub use crate::animation::AnimationEasing;
use crate::common::collections::{BTreeMap, HashSet};
use crate::model::monitor_rule::MonitorDescription;
use crate::model::workspace_name::WorkspaceName;

const MAX_COLUMN_PRESETS: usize = 16;
const MAX_ANIMATION_DURATION: f64 = 60.0;

pub fn config_file() -> Option<PathBuf> { dirs::home_dir().map(|home| home.join(".strip-wm.toml")) }

#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    settings: Settings,
    #[serde(default)]
    workspaces: WorkspaceSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct Config {
    pub settings: Settings,
    pub workspaces: WorkspaceSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "yes")]
    pub animate: bool,
    /// Seconds.
    #[serde(default = "default_animation_duration")]
    pub animation_duration: f64,
    #[serde(default)]
    pub animation_easing: AnimationEasing,
    #[serde(default)]
    pub layout: LayoutSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct LayoutSettings {
    /// New windows stack into the selected column until it holds this many.
    #[serde(default = "default_max_windows_per_column")]
    pub max_windows_per_column: usize,
    /// Proportion of the working width given to new columns.
    #[serde(default = "default_column_width")]
    pub default_column_width: f64,
    /// Proportions cycled by `switch_preset_width`.
    #[serde(default = "default_preset_column_widths")]
    pub preset_column_widths: Vec<f64>,
    #[serde(default)]
    pub always_center_single_column: bool,
    #[serde(default)]
    pub gaps: GapSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct GapSettings {
    /// Space between the columns and the monitor edges.
    #[serde(default)]
    pub outer: OuterGaps,
    /// Space between neighbouring columns and tiles.
    #[serde(default)]
    pub inner: InnerGaps,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct OuterGaps {
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub bottom: f64,
    #[serde(default)]
    pub right: f64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct InnerGaps {
    /// Between columns.
    #[serde(default)]
    pub horizontal: f64,
    /// Between tiles of one column.
    #[serde(default)]
    pub vertical: f64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceSettings {
    /// Workspaces that always exist, even when empty and hidden.
    #[serde(default)]
    pub persistent: Vec<String>,
    /// Workspace name to monitor descriptions, tried in order.
    /// e.g. `"3" = ["secondary", "main"]` or `code = ["DELL.*"]`
    #[serde(default)]
    pub force_assignment: BTreeMap<String, Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            animate: true,
            animation_duration: default_animation_duration(),
            animation_easing: AnimationEasing::default(),
            layout: LayoutSettings::default(),
        }
    }
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            max_windows_per_column: default_max_windows_per_column(),
            default_column_width: default_column_width(),
            preset_column_widths: default_preset_column_widths(),
            always_center_single_column: false,
            gaps: GapSettings::default(),
        }
    }
}

fn valid_proportion(value: f64) -> bool { value > 0.0 && value <= 1.0 }

fn valid_duration(secs: f64) -> bool { (0.0..=MAX_ANIMATION_DURATION).contains(&secs) }

impl Settings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !valid_duration(self.animation_duration) {
            issues.push(format!(
                "animation_duration must be between 0 and {MAX_ANIMATION_DURATION} seconds, got {}",
                self.animation_duration
            ));
        }

        issues.extend(self.layout.validate());

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if !valid_duration(self.animation_duration) {
            self.animation_duration = default_animation_duration();
            fixes += 1;
        }

        fixes += self.layout.auto_fix_values();

        fixes
    }
}

impl LayoutSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.max_windows_per_column == 0 {
            issues.push("max_windows_per_column must be at least 1".to_string());
        }

        if !valid_proportion(self.default_column_width) {
            issues.push(format!(
                "default_column_width must be in (0, 1], got {}",
                self.default_column_width
            ));
        }

        for (index, preset) in self.preset_column_widths.iter().enumerate() {
            if !valid_proportion(*preset) {
                issues.push(format!(
                    "preset_column_widths[{index}] must be in (0, 1], got {preset}"
                ));
            }
        }
        if self.preset_column_widths.len() > MAX_COLUMN_PRESETS {
            issues.push(format!(
                "preset_column_widths should not have more than {MAX_COLUMN_PRESETS} entries"
            ));
        }

        issues.extend(self.gaps.validate());

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.max_windows_per_column == 0 {
            self.max_windows_per_column = 1;
            fixes += 1;
        }

        if !valid_proportion(self.default_column_width) {
            self.default_column_width = default_column_width();
            fixes += 1;
        }

        let before = self.preset_column_widths.len();
        self.preset_column_widths.retain(|p| valid_proportion(*p));
        self.preset_column_widths.truncate(MAX_COLUMN_PRESETS);
        fixes += before - self.preset_column_widths.len();

        fixes + self.gaps.auto_fix_values()
    }
}

impl GapSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = self.outer.validate();
        issues.extend(self.inner.validate());
        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        self.outer.auto_fix_values() + self.inner.auto_fix_values()
    }
}

fn check_gap(issues: &mut Vec<String>, name: &str, value: f64) {
    if !(value >= 0.0) {
        issues.push(format!("{name} gap must be non-negative, got {value}"));
    }
}

fn fix_gap(value: &mut f64) -> usize {
    if *value >= 0.0 {
        return 0;
    }
    *value = 0.0;
    1
}

impl OuterGaps {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        check_gap(&mut issues, "outer.top", self.top);
        check_gap(&mut issues, "outer.left", self.left);
        check_gap(&mut issues, "outer.bottom", self.bottom);
        check_gap(&mut issues, "outer.right", self.right);
        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        fix_gap(&mut self.top)
            + fix_gap(&mut self.left)
            + fix_gap(&mut self.bottom)
            + fix_gap(&mut self.right)
    }
}

impl InnerGaps {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        check_gap(&mut issues, "inner.horizontal", self.horizontal);
        check_gap(&mut issues, "inner.vertical", self.vertical);
        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        fix_gap(&mut self.horizontal) + fix_gap(&mut self.vertical)
    }
}

impl WorkspaceSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        let mut seen = HashSet::default();
        for name in &self.persistent {
            if let Err(err) = name.parse::<WorkspaceName>() {
                issues.push(format!("persistent workspace '{name}': {err}"));
            }
            if !seen.insert(name) {
                issues.push(format!("duplicate persistent workspace '{name}'"));
            }
        }

        for (name, descriptions) in &self.force_assignment {
            if let Err(err) = name.parse::<WorkspaceName>() {
                issues.push(format!("force_assignment workspace '{name}': {err}"));
            }
            if descriptions.is_empty() {
                issues.push(format!("force_assignment for '{name}' lists no monitors"));
            }
            for description in descriptions {
                if let Err(err) = description.parse::<MonitorDescription>() {
                    issues.push(format!("force_assignment for '{name}': {err}"));
                }
            }
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        let before = self.persistent.len();
        let mut seen = HashSet::default();
        self.persistent
            .retain(|name| name.parse::<WorkspaceName>().is_ok() && seen.insert(name.clone()));
        fixes += before - self.persistent.len();

        for descriptions in self.force_assignment.values_mut() {
            let before = descriptions.len();
            descriptions.retain(|d| d.parse::<MonitorDescription>().is_ok());
            fixes += before - descriptions.len();
        }

        let before = self.force_assignment.len();
        self.force_assignment.retain(|name, descriptions| {
            name.parse::<WorkspaceName>().is_ok() && !descriptions.is_empty()
        });
        fixes += before - self.force_assignment.len();

        fixes
    }

    pub fn persistent_names(&self) -> Vec<WorkspaceName> {
        self.persistent.iter().filter_map(|name| name.parse().ok()).collect()
    }

    pub fn forced_assignments(&self) -> Vec<(WorkspaceName, Vec<MonitorDescription>)> {
        self.force_assignment
            .iter()
            .filter_map(|(name, descriptions)| {
                let name = name.parse().ok()?;
                let descriptions: Vec<_> =
                    descriptions.iter().filter_map(|d| d.parse().ok()).collect();
                (!descriptions.is_empty()).then_some((name, descriptions))
            })
            .collect()
    }
}

fn yes() -> bool { true }

fn default_animation_duration() -> f64 { 0.25 }

fn default_max_windows_per_column() -> usize { 1 }

fn default_column_width() -> f64 { 0.5 }

fn default_preset_column_widths() -> Vec<f64> { vec![1.0 / 3.0, 0.5, 2.0 / 3.0] }

const DEFAULT_CONFIG: &str = include_str!("../../strip-wm.default.toml");

impl Default for Config {
    fn default() -> Config {
        match Self::parse(DEFAULT_CONFIG) {
            Ok(config) => config,
            Err(err) => {
                error!("Built-in default config is invalid: {err}");
                Config {
                    settings: Settings::default(),
                    workspaces: WorkspaceSettings::default(),
                }
            }
        }
    }
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let config_file = ConfigFile {
            settings: self.settings.clone(),
            workspaces: self.workspaces.clone(),
        };

        let toml_string = toml::to_string_pretty(&config_file)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;

        Ok(())
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = self.settings.validate();
        issues.extend(self.workspaces.validate());
        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        self.settings.auto_fix_values() + self.workspaces.auto_fix_values()
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        let c: ConfigFile = toml::from_str(buf)?;
        Ok(Config {
            settings: c.settings,
            workspaces: c.workspaces,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn default_config_parses() {
        let config = Config::parse(DEFAULT_CONFIG).unwrap();
        assert_eq!(config, Config::default());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn empty_config_uses_field_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.settings, Settings::default());
        assert_eq!(config.workspaces, WorkspaceSettings::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(Config::parse("[settings]\nanimation_fps = 60\n").is_err());
    }

    #[test]
    fn parses_layout_and_workspaces() {
        let config = Config::parse(
            r#"
            [settings]
            animate = false
            animation_easing = "ease_in_out_quad"

            [settings.layout]
            max_windows_per_column = 2
            always_center_single_column = true

            [settings.layout.gaps.inner]
            horizontal = 16

            [workspaces]
            persistent = ["1", "2", "mail"]

            [workspaces.force_assignment]
            mail = ["secondary", "main"]
            "#,
        )
        .unwrap();

        assert!(!config.settings.animate);
        assert_eq!(config.settings.animation_easing, AnimationEasing::EaseInOutQuad);
        assert_eq!(config.settings.layout.max_windows_per_column, 2);
        assert_eq!(config.settings.layout.gaps.inner.horizontal, 16.0);
        assert_eq!(config.workspaces.persistent_names().len(), 3);
        let forced = config.workspaces.forced_assignments();
        assert_eq!(forced.len(), 1);
        assert_eq!(forced[0].0.as_str(), "mail");
        assert_eq!(
            forced[0].1,
            vec![MonitorDescription::Secondary, MonitorDescription::Main]
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_empty());

        config.settings.animation_duration = -1.0;
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("animation_duration must be between 0 and 60 seconds"));
        assert_eq!(config.auto_fix_values(), 1);
        assert_eq!(config.settings.animation_duration, 0.25);

        config.settings.layout.gaps.outer.left = -4.0;
        config.settings.layout.max_windows_per_column = 0;
        config.settings.layout.preset_column_widths = vec![0.5, 1.5];
        assert_eq!(config.validate().len(), 3);
        assert_eq!(config.auto_fix_values(), 3);
        assert_eq!(config.settings.layout.preset_column_widths, vec![0.5]);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn unbounded_animation_duration_is_rejected() {
        let mut config = Config::parse("[settings]\nanimation_duration = inf\n").unwrap();
        assert_eq!(config.validate().len(), 1);
        assert_eq!(config.auto_fix_values(), 1);
        assert_eq!(config.settings.animation_duration, 0.25);

        config.settings.animation_duration = 3600.0;
        assert_eq!(config.validate().len(), 1);
        config.settings.animation_duration = f64::NAN;
        assert_eq!(config.validate().len(), 1);
        config.settings.animation_duration = 60.0;
        assert!(config.validate().is_empty());
    }

    #[test]
    fn workspace_settings_validation() {
        let mut workspaces = WorkspaceSettings {
            persistent: vec!["1".into(), "next".into(), "1".into(), "has space".into()],
            force_assignment: BTreeMap::from([
                ("2".to_string(), vec!["main".to_string(), "(".to_string()]),
                ("3".to_string(), vec![]),
            ]),
        };
        assert_eq!(workspaces.validate().len(), 5);
        assert_eq!(workspaces.auto_fix_values(), 5);
        assert_eq!(workspaces.persistent, vec!["1".to_string()]);
        assert_eq!(workspaces.force_assignment.len(), 1);
        assert!(workspaces.validate().is_empty());
    }

    #[test]
    fn save_and_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.settings.layout.max_windows_per_column = 3;
        config.workspaces.persistent = vec!["1".into(), "web".into()];
        config.save(&path).unwrap();
        assert_eq!(Config::read(&path).unwrap(), config);
    }
}
