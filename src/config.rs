use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{
    settings::{DEFAULT_ISSUER, DEFAULT_QR_DIMENSION},
    OtpHashAlgorithm, Settings,
};

pub const DEFAULT_CONFIG_FILE: &str = ".google-authenticator.yaml";
pub const DEFAULT_INTERVAL: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading from {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("parsing yaml in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("must provide a salt! (--salt or `salt` in the config file)")]
    MissingSalt,
    #[error("the interval must be at least one second (--int or `interval` in the config file)")]
    InvalidInterval,
}

/// Contents of the YAML config file. Every key is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub salt: Option<String>,
    pub interval: Option<u64>,
    pub sha256: bool,
    pub issuer: Option<String>,
    pub qr_dimension: Option<u32>,
}

impl FileConfig {
    /// `$HOME/.google-authenticator.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_CONFIG_FILE))
    }

    /// Reads the config at `path`.
    ///
    /// A missing file, or anything that is not a regular file, yields `None`.
    pub fn load(path: &Path) -> Result<Option<Self>, ConfigError> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        if raw.trim().is_empty() {
            return Ok(Some(Self::default()));
        }

        let config = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Some(config))
    }
}

/// Values given on the command line; `None`/`false` means "not given"
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub salt: Option<String>,
    pub interval: Option<u64>,
    pub sha256: bool,
    pub debug: bool,
}

/// Final options after layering the command line over the config file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    pub salt: Option<String>,
    pub interval: u64,
    pub algorithm: OtpHashAlgorithm,
    pub settings: Settings,
}

impl Options {
    pub fn resolve(overrides: Overrides, file: Option<FileConfig>) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_default();

        let salt = overrides
            .salt
            .filter(|s| !s.is_empty())
            .or(file.salt.filter(|s| !s.is_empty()));

        let interval = overrides
            .interval
            .or(file.interval)
            .unwrap_or(DEFAULT_INTERVAL);
        if interval == 0 {
            return Err(ConfigError::InvalidInterval);
        }

        let algorithm = if overrides.sha256 || file.sha256 {
            OtpHashAlgorithm::SHA256
        } else {
            OtpHashAlgorithm::SHA1
        };

        let settings = Settings {
            debug: overrides.debug,
            issuer: file.issuer.unwrap_or_else(|| DEFAULT_ISSUER.to_string()),
            qr_dimension: file.qr_dimension.unwrap_or(DEFAULT_QR_DIMENSION),
        };

        Ok(Self {
            salt,
            interval,
            algorithm,
            settings,
        })
    }

    pub fn salt(&self) -> Result<&str, ConfigError> {
        self.salt.as_deref().ok_or(ConfigError::MissingSalt)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::NamedTempFile;

    use crate::{
        config::{ConfigError, FileConfig, Options, Overrides},
        OtpHashAlgorithm, Settings,
    };

    fn config_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_yaml() {
        let file = config_file("salt: 3a5bde8d0e4eb6887cb81bc7d51c3cec22b00ad1\ninterval: 60\nsha256: true\n");

        let config = FileConfig::load(file.path()).unwrap().unwrap();

        assert_eq!(
            FileConfig {
                salt: Some("3a5bde8d0e4eb6887cb81bc7d51c3cec22b00ad1".to_string()),
                interval: Some(60),
                sha256: true,
                issuer: None,
                qr_dimension: None,
            },
            config
        );
    }

    #[test]
    fn load_display_keys() {
        let file = config_file("issuer: ACME Co\nqr_dimension: 200\nunknown: ignored\n");

        let config = FileConfig::load(file.path()).unwrap().unwrap();

        assert_eq!(Some("ACME Co".to_string()), config.issuer);
        assert_eq!(Some(200), config.qr_dimension);
        assert_eq!(None, config.salt);
    }

    #[test]
    fn load_empty_file() {
        let file = config_file("");

        assert_eq!(Some(FileConfig::default()), FileConfig::load(file.path()).unwrap());
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();

        assert_eq!(None, FileConfig::load(&dir.path().join("absent.yaml")).unwrap());
        // Not a regular file
        assert_eq!(None, FileConfig::load(dir.path()).unwrap());
    }

    #[test]
    fn load_invalid_yaml() {
        let file = config_file("interval: [not, a, number]\n");

        let err = FileConfig::load(file.path()).unwrap_err();

        assert!(matches!(err, ConfigError::Parse { ref path, .. } if path == file.path()));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[rstest]
    #[case(Some("cli"), Some("file"), Some("cli"))]
    #[case(None, Some("file"), Some("file"))]
    #[case(Some(""), Some("file"), Some("file"))]
    #[case(None, None, None)]
    fn salt_precedence(
        #[case] cli: Option<&str>,
        #[case] file: Option<&str>,
        #[case] expected: Option<&str>,
    ) {
        let overrides = Overrides {
            salt: cli.map(str::to_string),
            ..Overrides::default()
        };
        let file = FileConfig {
            salt: file.map(str::to_string),
            ..FileConfig::default()
        };

        let options = Options::resolve(overrides, Some(file)).unwrap();

        assert_eq!(expected, options.salt.as_deref());
    }

    #[rstest]
    #[case(Some(10), Some(60), 10)]
    #[case(None, Some(60), 60)]
    #[case(None, None, 30)]
    fn interval_precedence(
        #[case] cli: Option<u64>,
        #[case] file: Option<u64>,
        #[case] expected: u64,
    ) {
        let overrides = Overrides {
            interval: cli,
            ..Overrides::default()
        };
        let file = FileConfig {
            interval: file,
            ..FileConfig::default()
        };

        assert_eq!(expected, Options::resolve(overrides, Some(file)).unwrap().interval);
    }

    #[rstest]
    #[case(false, false, OtpHashAlgorithm::SHA1)]
    #[case(true, false, OtpHashAlgorithm::SHA256)]
    #[case(false, true, OtpHashAlgorithm::SHA256)]
    fn algorithm_selection(
        #[case] cli: bool,
        #[case] file: bool,
        #[case] expected: OtpHashAlgorithm,
    ) {
        let overrides = Overrides {
            sha256: cli,
            ..Overrides::default()
        };
        let file = FileConfig {
            sha256: file,
            ..FileConfig::default()
        };

        assert_eq!(expected, Options::resolve(overrides, Some(file)).unwrap().algorithm);
    }

    #[test]
    fn defaults_without_file() {
        let overrides = Overrides {
            debug: true,
            ..Overrides::default()
        };

        let options = Options::resolve(overrides, None).unwrap();

        assert_eq!(
            Settings {
                debug: true,
                ..Settings::default()
            },
            options.settings
        );
        assert!(matches!(options.salt(), Err(ConfigError::MissingSalt)));
    }

    #[rstest]
    #[case(Some(0), None)]
    #[case(None, Some(0))]
    fn zero_interval_is_rejected(#[case] cli: Option<u64>, #[case] file: Option<u64>) {
        let overrides = Overrides {
            interval: cli,
            ..Overrides::default()
        };
        let file = FileConfig {
            interval: file,
            ..FileConfig::default()
        };

        assert!(matches!(
            Options::resolve(overrides, Some(file)),
            Err(ConfigError::InvalidInterval)
        ));
    }
}
