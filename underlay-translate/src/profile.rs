use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use thiserror::Error;

use config_tree_core::KeyFields;

use crate::mapping::Settings;
use crate::underlay::{junos, xr};

/// Underlay schema family a device speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnderlayFlavor {
    Xr,
    Junos,
}

impl UnderlayFlavor {
    pub fn key_fields(self) -> KeyFields {
        match self {
            UnderlayFlavor::Xr => xr::key_fields_registry(),
            UnderlayFlavor::Junos => junos::key_fields_registry(),
        }
    }
}

impl Display for UnderlayFlavor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            UnderlayFlavor::Xr => f.write_str("xr"),
            UnderlayFlavor::Junos => f.write_str("junos"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceProfile {
    pub underlay: UnderlayFlavor,
    #[serde(default = "default_name")]
    pub bgp_instance_name: String,
    #[serde(default = "default_name")]
    pub default_network_instance: String,
    #[serde(default = "default_nexthop_self")]
    pub nexthop_self_policy: String,
    /// Canonical lists to register; empty registers everything the flavor supports.
    #[serde(default)]
    pub enabled_handlers: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_name() -> String {
    "default".to_string()
}

fn default_nexthop_self() -> String {
    "nexthopself".to_string()
}

impl DeviceProfile {
    pub fn settings(&self) -> Settings {
        Settings {
            bgp_instance: self.bgp_instance_name.clone(),
            default_instance: self.default_network_instance.clone(),
            nexthop_self_policy: self.nexthop_self_policy.clone(),
        }
    }

    /// True when `list` should be registered.
    pub fn enables(&self, list: &str) -> bool {
        self.enabled_handlers.is_empty() || self.enabled_handlers.iter().any(|h| h == list)
    }
}

#[derive(Debug, Error)]
pub enum ProfileLoadError {
    #[error("unknown device profile `{0}`")]
    NotFound(String),

    #[error("failed to read profile {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid profile {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("profile enables `{list}`, which the {flavor} underlay does not support")]
    UnknownHandler { list: String, flavor: UnderlayFlavor },
}

/// Names of the profiles compiled into the binary.
pub const EMBEDDED_PROFILES: &[&str] = &["junos17", "xr6"];

pub fn load_profile(name: &str) -> Result<DeviceProfile, ProfileLoadError> {
    load_profile_with_source(name, None).map(|(profile, _)| profile)
}

/// Load `name` from `<profiles_dir>/<name>.toml` when present, else from the embedded set.
/// The second value reports where it came from: `file:<path>` or `embedded`.
pub fn load_profile_with_source(
    name: &str,
    profiles_dir: Option<&Path>,
) -> Result<(DeviceProfile, String), ProfileLoadError> {
    let name = name.trim();
    if let Some(dir) = profiles_dir {
        let path = profile_path(dir, name);
        if path.is_file() {
            let profile = load_profile_file(&path)?;
            return Ok((profile, format!("file:{}", path.display())));
        }
    }
    let raw = embedded_profile(name).ok_or_else(|| ProfileLoadError::NotFound(name.to_string()))?;
    let profile = parse_profile(raw, "embedded")?;
    Ok((profile, "embedded".to_string()))
}

fn embedded_profile(name: &str) -> Option<&'static str> {
    match name {
        "xr6" => Some(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/profiles/xr6.toml"
        ))),
        "junos17" => Some(include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/profiles/junos17.toml"
        ))),
        _ => None,
    }
}

fn profile_path(base: &Path, name: &str) -> PathBuf {
    base.join(format!("{name}.toml"))
}

fn load_profile_file(path: &Path) -> Result<DeviceProfile, ProfileLoadError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ProfileLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_profile(&raw, &path.display().to_string())
}

fn parse_profile(raw: &str, origin: &str) -> Result<DeviceProfile, ProfileLoadError> {
    toml::from_str::<DeviceProfile>(raw).map_err(|source| ProfileLoadError::Parse {
        origin: origin.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::{
        embedded_profile, load_profile, load_profile_with_source, parse_profile,
        ProfileLoadError, UnderlayFlavor, EMBEDDED_PROFILES,
    };
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn every_embedded_profile_parses() {
        for name in EMBEDDED_PROFILES {
            let raw = embedded_profile(name).expect("embedded profile");
            parse_profile(raw, "embedded").expect("valid profile");
        }
    }

    #[test]
    fn xr_profile_carries_device_settings() {
        let profile = load_profile("xr6").expect("profile");
        assert_eq!(profile.underlay, UnderlayFlavor::Xr);
        let settings = profile.settings();
        assert_eq!(settings.bgp_instance, "default");
        assert_eq!(settings.nexthop_self_policy, "nexthopself");
        assert!(profile.enables("neighbor"));
    }

    #[test]
    fn unknown_profile_is_reported() {
        let err = load_profile("ios15").expect_err("no such profile");
        assert!(matches!(err, ProfileLoadError::NotFound(name) if name == "ios15"));
    }

    #[test]
    fn profile_source_reports_embedded() {
        let (_, source) = load_profile_with_source("junos17", None).expect("embedded profile");
        assert_eq!(source, "embedded");
    }

    #[test]
    fn profile_source_reports_override_dir() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("junos17.toml");
        fs::write(
            &path,
            r#"
underlay = "junos"
default_network_instance = "master"
enabled_handlers = ["neighbor"]
"#,
        )
        .expect("write profile");

        let (profile, source) =
            load_profile_with_source("junos17", Some(dir.path())).expect("profile");
        assert!(source.starts_with("file:"));
        assert_eq!(profile.default_network_instance, "master");
        assert_eq!(profile.bgp_instance_name, "default");
        assert!(profile.enables("neighbor"));
        assert!(!profile.enables("protocol"));
    }

    #[test]
    fn broken_override_is_an_error() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("xr6.toml"), "underlay = \"ios\"\n").expect("write profile");
        let err = load_profile_with_source("xr6", Some(dir.path())).expect_err("invalid");
        assert!(matches!(err, ProfileLoadError::Parse { .. }));
    }
}
