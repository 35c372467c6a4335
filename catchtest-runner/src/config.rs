// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration support for catchtest.
//!
//! The configuration is layered: the defaults embedded in this crate come first, followed by the
//! repository's `.config/catchtest.toml` (or a file passed in explicitly). Settings are grouped
//! into profiles, and every profile falls back to `[profile.default]` for settings it doesn't
//! set.

use crate::{
    errors::{ConfigParseError, ConfigParseErrorKind, ProfileNotFound},
    launcher::DebuggerCommand,
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use itertools::Itertools;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Where test binaries are run from.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkingDir {
    /// The directory containing the test binary.
    ///
    /// Catch tests often load fixtures relative to themselves, so this is the default.
    #[default]
    BinaryDir,

    /// The current directory of catchtest itself.
    Inherit,
}

/// Overall configuration for catchtest.
///
/// This is the root data structure for catchtest configuration. Most runner-specific configuration
/// is managed through [profiles](CatchTestProfile), obtained through the [`profile`](Self::profile)
/// method.
#[derive(Clone, Debug)]
pub struct CatchTestConfig {
    workspace_root: Utf8PathBuf,
    default_profile: DefaultProfileImpl,
    other_profiles: HashMap<String, CustomProfileImpl>,
}

impl CatchTestConfig {
    /// The default location of the config within the workspace root: `.config/catchtest.toml`.
    pub const CONFIG_PATH: &'static str = ".config/catchtest.toml";

    /// Contains the default config as a TOML file.
    ///
    /// Repository-specific configuration is layered on top of the default config.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// The name of the default profile.
    pub const DEFAULT_PROFILE: &'static str = "default";

    /// Reads the catchtest config from the given file, or if not specified from
    /// `.config/catchtest.toml` in the workspace root.
    ///
    /// If the file isn't specified and the default location doesn't exist, the default config is
    /// used.
    pub fn from_sources(
        workspace_root: impl Into<Utf8PathBuf>,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        let workspace_root = workspace_root.into();
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = workspace_root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let (config, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(&config_file, kind))?;

        if !unknown.is_empty() {
            tracing::warn!(
                "ignoring unknown configuration keys in config file {config_file}: {}",
                unknown.iter().join(", "),
            );
        }

        let mut profiles = config.profiles;
        let default_profile = profiles
            .remove(Self::DEFAULT_PROFILE)
            .map(DefaultProfileImpl::new)
            .expect("default profile is always present");

        Ok(Self {
            workspace_root,
            default_profile,
            other_profiles: profiles,
        })
    }

    /// Returns the profile with the given name, or an error if the profile isn't defined.
    pub fn profile(&self, name: impl AsRef<str>) -> Result<CatchTestProfile<'_>, ProfileNotFound> {
        let name = name.as_ref();
        let custom_profile = match name {
            Self::DEFAULT_PROFILE => None,
            other => Some(self.other_profiles.get(other).ok_or_else(|| {
                ProfileNotFound::new(name, self.all_profiles())
            })?),
        };

        Ok(CatchTestProfile {
            name: name.to_owned(),
            workspace_root: &self.workspace_root,
            default_profile: &self.default_profile,
            custom_profile,
        })
    }

    fn all_profiles(&self) -> impl Iterator<Item = &str> {
        self.other_profiles
            .keys()
            .map(String::as_str)
            .chain(std::iter::once(Self::DEFAULT_PROFILE))
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(CatchTestConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: CatchTestConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| {
                // serde_path_to_error already tracks the key, so drop it from the config error.
                let path = error.path().clone();
                let error = match error.into_inner() {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

/// A configuration profile for catchtest. Contains most configuration used by the runner.
///
/// Returned by [`CatchTestConfig::profile`].
#[derive(Clone, Debug)]
pub struct CatchTestProfile<'cfg> {
    name: String,
    workspace_root: &'cfg Utf8Path,
    default_profile: &'cfg DefaultProfileImpl,
    custom_profile: Option<&'cfg CustomProfileImpl>,
}

impl<'cfg> CatchTestProfile<'cfg> {
    /// Returns the name of the profile.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the debugger command used by `catchtest run --debug`.
    pub fn debugger(&self) -> &'cfg DebuggerCommand {
        self.custom_profile
            .and_then(|profile| profile.debugger.as_ref())
            .unwrap_or(&self.default_profile.debugger)
    }

    /// Returns the working directory policy for test binaries.
    pub fn working_dir(&self) -> WorkingDir {
        self.custom_profile
            .and_then(|profile| profile.working_dir)
            .unwrap_or(self.default_profile.working_dir)
    }

    /// Returns the extra environment variables for test processes.
    ///
    /// Variables set by this profile take precedence over those set by the default profile.
    pub fn env(&self) -> BTreeMap<String, String> {
        let mut env = self.default_profile.env.clone();
        if let Some(profile) = self.custom_profile {
            env.extend(
                profile
                    .env
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone())),
            );
        }
        env
    }

    /// Returns the absolute path to write a JUnit report to, if configured.
    pub fn junit_path(&self) -> Option<Utf8PathBuf> {
        self.custom_profile
            .and_then(|profile| profile.junit.path.as_deref())
            .or(self.default_profile.junit.path.as_deref())
            .map(|path| self.workspace_root.join(path))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CatchTestConfigDeserialize {
    #[serde(rename = "profile")]
    profiles: HashMap<String, CustomProfileImpl>,
}

#[derive(Clone, Debug)]
struct DefaultProfileImpl {
    debugger: DebuggerCommand,
    working_dir: WorkingDir,
    env: BTreeMap<String, String>,
    junit: JunitImpl,
}

impl DefaultProfileImpl {
    fn new(p: CustomProfileImpl) -> Self {
        Self {
            debugger: p
                .debugger
                .expect("profile.default.debugger present in default-config.toml"),
            working_dir: p
                .working_dir
                .expect("profile.default.working-dir present in default-config.toml"),
            env: p.env,
            junit: p.junit,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CustomProfileImpl {
    #[serde(default)]
    debugger: Option<DebuggerCommand>,
    #[serde(default)]
    working_dir: Option<WorkingDir>,
    #[serde(default)]
    env: BTreeMap<String, String>,
    #[serde(default)]
    junit: JunitImpl,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct JunitImpl {
    #[serde(default)]
    path: Option<Utf8PathBuf>,
}
