use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_DOCUMENT_EXTENSION: &str = "pdf";
pub const DEFAULT_CONFIG_FILE: &str = "documind.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub backend_url: String,
    /// Extension the service stores documents under, without the dot.
    pub document_extension: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.into(),
            document_extension: DEFAULT_DOCUMENT_EXTENSION.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    backend_url: Option<String>,
    document_extension: Option<String>,
}

/// Defaults, then the TOML file, then environment variables.
///
/// An explicit `config_path` must exist; the implicit `documind.toml` in the
/// working directory is optional.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
            settings.apply_file(file_cfg);
        }
        Err(err) if !required && err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    }

    settings.apply_env(|name| std::env::var(name).ok());
    settings.validated()
}

impl ClientSettings {
    fn apply_file(&mut self, file_cfg: FileSettings) {
        if let Some(v) = file_cfg.backend_url {
            self.backend_url = v;
        }
        if let Some(v) = file_cfg.document_extension {
            self.document_extension = v;
        }
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("BACKEND_URL") {
            self.backend_url = v;
        }
        if let Some(v) = lookup("DOCUMIND__BACKEND_URL") {
            self.backend_url = v;
        }
        if let Some(v) = lookup("DOCUMIND__DOCUMENT_EXTENSION") {
            self.document_extension = v;
        }
    }

    pub fn with_backend_url(mut self, backend_url: impl Into<String>) -> anyhow::Result<Self> {
        self.backend_url = backend_url.into();
        self.validated()
    }

    pub fn validated(mut self) -> anyhow::Result<Self> {
        self.backend_url = normalize_backend_url(&self.backend_url)?;
        self.document_extension = self
            .document_extension
            .trim()
            .trim_start_matches('.')
            .to_string();
        Ok(self)
    }
}

fn normalize_backend_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        bail!("backend url must not be empty");
    }
    let parsed =
        Url::parse(trimmed).with_context(|| format!("invalid backend url '{trimmed}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!(
            "backend url '{trimmed}' must use http or https, not '{}'",
            parsed.scheme()
        );
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    fn temp_config(contents: &str) -> PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("documind_config_test_{suffix}.toml"));
        fs::write(&path, contents).expect("write config");
        path
    }

    #[test]
    fn file_values_override_defaults() {
        let file_cfg: FileSettings = toml::from_str(
            "backend_url = \"http://docs.internal:8080/\"\ndocument_extension = \".txt\"\n",
        )
        .expect("toml");
        let mut settings = ClientSettings::default();
        settings.apply_file(file_cfg);
        let settings = settings.validated().expect("valid");

        assert_eq!(settings.backend_url, "http://docs.internal:8080");
        assert_eq!(settings.document_extension, "txt");
    }

    #[test]
    fn prefixed_env_var_wins_over_plain_one() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("BACKEND_URL", "http://plain:3000"),
            ("DOCUMIND__BACKEND_URL", "https://prefixed:3443"),
        ]);
        let mut settings = ClientSettings::default();
        settings.apply_env(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(settings.backend_url, "https://prefixed:3443");
        assert_eq!(settings.document_extension, DEFAULT_DOCUMENT_EXTENSION);
    }

    #[test]
    fn rejects_non_http_backend() {
        let err = ClientSettings::default()
            .with_backend_url("ftp://files.example")
            .expect_err("must fail");
        assert!(err.to_string().contains("http or https"));
    }

    #[test]
    fn rejects_empty_backend() {
        assert!(ClientSettings::default().with_backend_url("  /").is_err());
    }

    #[test]
    fn explicit_missing_config_file_is_an_error() {
        let path = env::temp_dir().join("documind_config_test_does_not_exist.toml");
        let err = load_settings(Some(&path)).expect_err("must fail");
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let path = temp_config("backend = \"http://typo\"\n");
        let err = load_settings(Some(&path)).expect_err("must fail");
        fs::remove_file(path).expect("cleanup");
        assert!(err.to_string().contains("failed to parse config file"));
    }
}
