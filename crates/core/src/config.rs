use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_CONFIGURATION: &str = "Debug";
pub const DEFAULT_BUILD_NUMBER: &str = "0";
const DEFAULT_DOTNET: &str = "dotnet";
const DEFAULT_PWSH: &str = "pwsh";
const DEFAULT_GIT: &str = "git";

/// Worker versions the build knows how to target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WorkerVersion {
    #[serde(rename = "7.2")]
    V7_2,
    #[default]
    #[serde(rename = "7.4")]
    V7_4,
}

impl WorkerVersion {
    pub const ALL: [WorkerVersion; 2] = [WorkerVersion::V7_2, WorkerVersion::V7_4];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerVersion::V7_2 => "7.2",
            WorkerVersion::V7_4 => "7.4",
        }
    }
}

impl fmt::Display for WorkerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkerVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkerVersion::ALL
            .into_iter()
            .find(|v| v.as_str() == s.trim())
            .ok_or_else(|| ConfigError::UnsupportedWorkerVersion(s.to_string()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unsupported worker version '{0}'. Supported versions: 7.2, 7.4")]
    UnsupportedWorkerVersion(String),

    #[error("An SBOM utility URL (--sbom-util-url) is required when --add-sbom is set")]
    MissingSbomUtilUrl,

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Immutable input to a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    pub bootstrap: bool,
    pub clean: bool,
    pub no_build: bool,
    pub test: bool,
    pub deploy: bool,
    pub core_tools_dir: Option<PathBuf>,
    pub configuration: String,
    pub build_number: String,
    pub add_sbom: bool,
    pub sbom_util_url: Option<String>,
    pub worker_version: WorkerVersion,
    pub repo_root: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bootstrap: false,
            clean: false,
            no_build: false,
            test: false,
            deploy: false,
            core_tools_dir: None,
            configuration: DEFAULT_CONFIGURATION.to_string(),
            build_number: DEFAULT_BUILD_NUMBER.to_string(),
            add_sbom: false,
            sbom_util_url: None,
            worker_version: WorkerVersion::default(),
            repo_root: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.configuration.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Build configuration label cannot be empty".to_string(),
            ));
        }

        // Passed verbatim as `/p:BuildNumber=` and the SBOM package version.
        if self.build_number.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Build number cannot be empty".to_string(),
            ));
        }

        if self.add_sbom {
            self.sbom_source()?;
        }

        Ok(())
    }

    /// URL of the manifest utility archive. Blank values count as missing.
    pub fn sbom_source(&self) -> Result<&str, ConfigError> {
        self.sbom_util_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingSbomUtilUrl)
    }

    /// The host tool directory override, ignoring empty values.
    pub fn core_tools_override(&self) -> Option<&Path> {
        self.core_tools_dir
            .as_deref()
            .filter(|dir| !dir.as_os_str().is_empty())
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pipeline Configuration:")?;
        writeln!(f, "  Repository: {}", self.repo_root.display())?;
        writeln!(f, "  Worker Version: {}", self.worker_version)?;
        writeln!(f, "  Configuration: {}", self.configuration)?;
        writeln!(f, "  Build Number: {}", self.build_number)?;
        writeln!(
            f,
            "  Stages: bootstrap={} clean={} build={} test={} deploy={}",
            self.bootstrap, self.clean, !self.no_build, self.test, self.deploy
        )?;
        writeln!(f, "  SBOM: {}", self.add_sbom)?;
        if let Some(ref dir) = self.core_tools_dir {
            writeln!(f, "  Core Tools Dir: {}", dir.display())?;
        }
        Ok(())
    }
}

/// External programs and directories the stages invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub dotnet: PathBuf,
    pub pwsh: PathBuf,
    pub git: PathBuf,
    /// User-local .NET SDK location used when the search path has no suitable SDK.
    pub sdk_install_dir: PathBuf,
    /// Scratch space for downloaded installer scripts.
    pub cache_dir: PathBuf,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            dotnet: PathBuf::from(DEFAULT_DOTNET),
            pwsh: PathBuf::from(DEFAULT_PWSH),
            git: PathBuf::from(DEFAULT_GIT),
            sdk_install_dir: dirs::home_dir()
                .map(|home| home.join(".dotnet"))
                .unwrap_or_else(|| PathBuf::from(".dotnet")),
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(env::temp_dir)
                .join("workerforge"),
        }
    }
}

impl Toolchain {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let path_var = |key: &str, fallback: PathBuf| {
            env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(fallback)
        };

        Self {
            dotnet: path_var("WORKERFORGE_DOTNET", defaults.dotnet),
            pwsh: path_var("WORKERFORGE_PWSH", defaults.pwsh),
            git: path_var("WORKERFORGE_GIT", defaults.git),
            sdk_install_dir: path_var("WORKERFORGE_DOTNET_INSTALL_DIR", defaults.sdk_install_dir),
            cache_dir: path_var("WORKERFORGE_CACHE_DIR", defaults.cache_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    #[test]
    fn test_default_configuration() {
        let config = PipelineConfig::default();

        assert!(!config.bootstrap);
        assert!(!config.clean);
        assert!(!config.no_build);
        assert!(!config.test);
        assert!(!config.deploy);
        assert!(!config.add_sbom);
        assert_eq!(config.configuration, DEFAULT_CONFIGURATION);
        assert_eq!(config.build_number, DEFAULT_BUILD_NUMBER);
        assert_eq!(config.worker_version, WorkerVersion::V7_4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_worker_version_parsing() {
        assert_eq!("7.2".parse::<WorkerVersion>(), Ok(WorkerVersion::V7_2));
        assert_eq!("7.4".parse::<WorkerVersion>(), Ok(WorkerVersion::V7_4));
        assert_eq!(
            "7.0".parse::<WorkerVersion>(),
            Err(ConfigError::UnsupportedWorkerVersion("7.0".to_string()))
        );
        assert!("".parse::<WorkerVersion>().is_err());
        assert!("latest".parse::<WorkerVersion>().is_err());
    }

    #[test]
    fn test_worker_version_display_round_trips() {
        for version in WorkerVersion::ALL {
            assert_eq!(version.to_string().parse::<WorkerVersion>(), Ok(version));
        }
    }

    #[test]
    fn test_validation_requires_sbom_url() {
        let config = PipelineConfig {
            add_sbom: true,
            sbom_util_url: None,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingSbomUtilUrl));

        let config = PipelineConfig {
            add_sbom: true,
            sbom_util_url: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingSbomUtilUrl));
    }

    #[test]
    fn test_sbom_url_ignored_without_flag() {
        let config = PipelineConfig {
            add_sbom: false,
            sbom_util_url: None,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sbom_source_trims() {
        let config = PipelineConfig {
            add_sbom: true,
            sbom_util_url: Some(" https://example.com/tool.tar.gz ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.sbom_source(), Ok("https://example.com/tool.tar.gz"));
    }

    #[test]
    fn test_validation_rejects_empty_configuration() {
        let config = PipelineConfig {
            configuration: " ".to_string(),
            ..Default::default()
        };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn test_validation_rejects_empty_build_number() {
        let config = PipelineConfig {
            build_number: String::new(),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ValidationFailed(
                "Build number cannot be empty".to_string()
            ))
        );
    }

    #[test]
    fn test_core_tools_override_ignores_empty() {
        let config = PipelineConfig {
            core_tools_dir: Some(PathBuf::new()),
            ..Default::default()
        };
        assert!(config.core_tools_override().is_none());

        let config = PipelineConfig {
            core_tools_dir: Some(PathBuf::from("/opt/func")),
            ..Default::default()
        };
        assert_eq!(config.core_tools_override(), Some(Path::new("/opt/func")));
    }

    #[test]
    fn test_config_display() {
        let config = PipelineConfig::default();
        let display = format!("{}", config);
        assert!(display.contains("Pipeline Configuration:"));
        assert!(display.contains("Worker Version: 7.4"));
    }

    #[test]
    #[serial]
    fn test_toolchain_from_env_overrides() {
        let _guards = [
            EnvGuard::set("WORKERFORGE_DOTNET", "/opt/dotnet/dotnet"),
            EnvGuard::set("WORKERFORGE_PWSH", "/usr/local/bin/pwsh"),
        ];

        let toolchain = Toolchain::from_env();
        assert_eq!(toolchain.dotnet, PathBuf::from("/opt/dotnet/dotnet"));
        assert_eq!(toolchain.pwsh, PathBuf::from("/usr/local/bin/pwsh"));
        assert_eq!(toolchain.git, PathBuf::from(DEFAULT_GIT));
    }

    #[test]
    #[serial]
    fn test_toolchain_from_env_ignores_blank_values() {
        let _guard = EnvGuard::set("WORKERFORGE_DOTNET", "  ");

        let toolchain = Toolchain::from_env();
        assert_eq!(toolchain.dotnet, PathBuf::from(DEFAULT_DOTNET));
    }
}
