//! Profile and project configuration for the transformation tool
//!
//! The only conditional logic in a pipeline definition is the resolution of
//! the dbt base path from a single environment-mode flag: `LOCAL` selects
//! the local base path, anything else (including an unset variable) selects
//! the cloud base path. Resolution produces an explicit [`DbtConfig`] that
//! is passed into the runner; there is no ambient global configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable carrying the mode flag.
pub const ENV_MODE_VAR: &str = "MEDALLION_ENV";

/// The only value of [`ENV_MODE_VAR`] that selects local resolution.
pub const LOCAL_TOKEN: &str = "LOCAL";

/// Base path for dbt assets when running locally.
pub const LOCAL_BASE_PATH: &str = "/usr/local/medallion/dbt";

/// Base path for dbt assets when running against the cloud mount.
pub const CLOUD_BASE_PATH: &str = "/mnt/gcs/medallion/dbt";

/// Execution environment, resolved once per process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnvMode {
    /// Local development, dbt assets live on the local file system
    Local,
    /// Cloud execution, dbt assets live on the mounted cloud path
    #[default]
    Cloud,
}

impl EnvMode {
    /// Resolve the mode from a flag value. Exactly two branches: the local
    /// token selects [`EnvMode::Local`], everything else falls through to
    /// [`EnvMode::Cloud`].
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some(LOCAL_TOKEN) => EnvMode::Local,
            _ => EnvMode::Cloud,
        }
    }

    /// Resolve the mode from the process environment.
    pub fn detect() -> Self {
        Self::from_flag(std::env::var(ENV_MODE_VAR).ok().as_deref())
    }

    pub fn base_path(&self) -> &'static Path {
        match self {
            EnvMode::Local => Path::new(LOCAL_BASE_PATH),
            EnvMode::Cloud => Path::new(CLOUD_BASE_PATH),
        }
    }
}

fn default_target() -> String {
    "dev".to_string()
}

/// Connection profile declared in the pipeline definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "schema_gen", derive(schemars::JsonSchema))]
#[serde(rename_all = "snake_case")]
pub struct ProfileSettings {
    /// Profile name within the profiles file
    pub name: String,

    /// Target environment within the profile
    #[serde(default = "default_target")]
    pub target: String,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            target: default_target(),
        }
    }
}

/// Resolved connection profile: name, target and credentials file location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileConfig {
    pub profile_name: String,
    pub target_name: String,
    pub profiles_path: PathBuf,
}

/// Resolved project root for the transformation tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    pub project_dir: PathBuf,
}

/// Complete resolved configuration handed to the stage runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbtConfig {
    pub profile: ProfileConfig,
    pub project: ProjectConfig,
}

impl DbtConfig {
    /// Resolve profile and project paths from the environment mode's base
    /// path.
    pub fn resolve(settings: &ProfileSettings, mode: EnvMode) -> Self {
        Self::with_base_path(settings, mode.base_path())
    }

    /// Resolve against an explicit base path, for layouts that do not follow
    /// the mode constants.
    pub fn with_base_path(settings: &ProfileSettings, base: &Path) -> Self {
        Self {
            profile: ProfileConfig {
                profile_name: settings.name.clone(),
                target_name: settings.target.clone(),
                profiles_path: base.join("profiles.yml"),
            },
            project: ProjectConfig {
                project_dir: base.to_path_buf(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("LOCAL"), EnvMode::Local)]
    #[case(Some("local"), EnvMode::Cloud)]
    #[case(Some("CLOUD"), EnvMode::Cloud)]
    #[case(Some("staging"), EnvMode::Cloud)]
    #[case(Some(""), EnvMode::Cloud)]
    #[case(None, EnvMode::Cloud)]
    fn mode_resolution_has_two_branches(#[case] flag: Option<&str>, #[case] expected: EnvMode) {
        assert_eq!(EnvMode::from_flag(flag), expected);
    }

    #[rstest]
    #[case(EnvMode::Local, LOCAL_BASE_PATH)]
    #[case(EnvMode::Cloud, CLOUD_BASE_PATH)]
    fn base_path_constants(#[case] mode: EnvMode, #[case] expected: &str) {
        assert_eq!(mode.base_path(), Path::new(expected));
    }

    #[test]
    fn resolve_derives_paths_from_base() {
        let settings = ProfileSettings {
            name: "analytics".to_string(),
            target: "dev".to_string(),
        };

        let config = DbtConfig::resolve(&settings, EnvMode::Local);

        assert_eq!(config.profile.profile_name, "analytics");
        assert_eq!(config.profile.target_name, "dev");
        assert_eq!(
            config.profile.profiles_path,
            Path::new(LOCAL_BASE_PATH).join("profiles.yml")
        );
        assert_eq!(config.project.project_dir, Path::new(LOCAL_BASE_PATH));
    }

    #[test]
    fn target_defaults_to_dev() {
        assert_eq!(ProfileSettings::default().target, "dev");
    }
}
