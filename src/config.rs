use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::upload::MAX_UPLOAD_BYTES;

/// Server used when neither the rc files nor the CLI name one.
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Auto,
    Light,
    Dark,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub server: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_upload_mb: Option<u64>,
    pub theme: Option<ThemeMode>,
    pub no_images: bool,
    pub force_half_cell: bool,
    pub log_file: Option<PathBuf>,
    pub report_dir: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            server: other.server.clone().or_else(|| self.server.clone()),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            max_upload_mb: other.max_upload_mb.or(self.max_upload_mb),
            theme: other.theme.or(self.theme),
            no_images: self.no_images || other.no_images,
            force_half_cell: self.force_half_cell || other.force_half_cell,
            log_file: other.log_file.clone().or_else(|| self.log_file.clone()),
            report_dir: other.report_dir.clone().or_else(|| self.report_dir.clone()),
        }
    }

    /// Server base URL, falling back to [`DEFAULT_SERVER`].
    pub fn server_or_default(&self) -> &str {
        self.server.as_deref().unwrap_or(DEFAULT_SERVER)
    }

    /// Upload limit in bytes, falling back to [`MAX_UPLOAD_BYTES`].
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb
            .map_or(MAX_UPLOAD_BYTES, |mb| mb.saturating_mul(1024 * 1024))
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("scanlens").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("scanlens")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("scanlens").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("scanlens")
                .join("config");
        }
    }

    PathBuf::from(".scanlensrc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".scanlensrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    tracing::debug!(path = %path.display(), tokens = tokens.len(), "loaded config");
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# scanlens defaults (saved with --save)".to_string());
    if let Some(server) = &flags.server {
        lines.push(format!("--server {server}"));
    }
    if let Some(secs) = flags.timeout_secs {
        lines.push(format!("--timeout {secs}"));
    }
    if let Some(mb) = flags.max_upload_mb {
        lines.push(format!("--max-upload-mb {mb}"));
    }
    if let Some(theme) = flags.theme {
        let theme_str = match theme {
            ThemeMode::Auto => "auto",
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        };
        lines.push(format!("--theme {theme_str}"));
    }
    if flags.no_images {
        lines.push("--no-images".to_string());
    }
    if flags.force_half_cell {
        lines.push("--force-half-cell".to_string());
    }
    if let Some(path) = &flags.log_file {
        lines.push(format!("--log-file {}", path.display()));
    }
    if let Some(path) = &flags.report_dir {
        lines.push(format!("--report-dir {}", path.display()));
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Extract known flags from a token list. Unknown tokens (like the image path)
/// are skipped, and so are values that fail to parse.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let next = tokens.get(i + 1).map(String::as_str);
        let (name, inline_value) = match token.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (token, None),
        };
        let takes_value = matches!(
            name,
            "--server"
                | "--timeout"
                | "--max-upload-mb"
                | "--theme"
                | "--log-file"
                | "--report-dir"
        );
        let value = if takes_value {
            inline_value.or(next)
        } else {
            None
        };

        match name {
            "--no-images" => flags.no_images = true,
            "--force-half-cell" => flags.force_half_cell = true,
            "--server" => flags.server = value.map(ToOwned::to_owned).or(flags.server),
            "--timeout" => {
                flags.timeout_secs = value.and_then(|v| v.parse().ok()).or(flags.timeout_secs);
            }
            "--max-upload-mb" => {
                flags.max_upload_mb = value
                    .and_then(|v| v.parse().ok())
                    .filter(|mb| *mb > 0)
                    .or(flags.max_upload_mb);
            }
            "--theme" => flags.theme = value.and_then(parse_theme).or(flags.theme),
            "--log-file" => flags.log_file = value.map(PathBuf::from).or(flags.log_file),
            "--report-dir" => flags.report_dir = value.map(PathBuf::from).or(flags.report_dir),
            _ => {}
        }

        if takes_value && inline_value.is_none() && next.is_some() {
            i += 1;
        }
        i += 1;
    }
    flags
}

fn parse_theme(s: &str) -> Option<ThemeMode> {
    match s {
        "auto" => Some(ThemeMode::Auto),
        "light" => Some(ThemeMode::Light),
        "dark" => Some(ThemeMode::Dark),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn tokens(args: &[&str]) -> Vec<String> {
        args.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_flag_tokens_extracts_known_flags() {
        let args = tokens(&[
            "scanlens",
            "--server",
            "http://scanner:8080",
            "--timeout=30",
            "--no-images",
            "--theme",
            "dark",
            "--log-file=scan.log",
            "--report-dir",
            "reports",
            "--force-half-cell",
            "chest.png",
        ]);
        let flags = parse_flag_tokens(&args);
        assert_eq!(flags.server.as_deref(), Some("http://scanner:8080"));
        assert_eq!(flags.timeout_secs, Some(30));
        assert!(flags.no_images);
        assert_eq!(flags.theme, Some(ThemeMode::Dark));
        assert_eq!(flags.log_file, Some(PathBuf::from("scan.log")));
        assert_eq!(flags.report_dir, Some(PathBuf::from("reports")));
        assert!(flags.force_half_cell);
    }

    #[test]
    fn test_max_upload_flag_sets_limit() {
        let flags = parse_flag_tokens(&tokens(&["--max-upload-mb", "4"]));
        assert_eq!(flags.max_upload_mb, Some(4));
        assert_eq!(flags.max_upload_bytes(), 4 * 1024 * 1024);

        let zero = parse_flag_tokens(&tokens(&["--max-upload-mb=0"]));
        assert_eq!(zero.max_upload_bytes(), MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_parse_flag_tokens_ignores_bad_timeout() {
        let flags = parse_flag_tokens(&tokens(&["--timeout", "soon"]));
        assert_eq!(flags.timeout_secs, None);
    }

    #[test]
    fn test_config_union_merges_cli_over_file_for_options() {
        let file = ConfigFlags {
            no_images: true,
            server: Some("http://file:5000".to_string()),
            theme: Some(ThemeMode::Light),
            ..ConfigFlags::default()
        };
        let cli = ConfigFlags {
            force_half_cell: true,
            theme: Some(ThemeMode::Dark),
            ..ConfigFlags::default()
        };
        let merged = file.union(&cli);
        assert!(merged.no_images);
        assert!(merged.force_half_cell);
        assert_eq!(merged.theme, Some(ThemeMode::Dark));
        assert_eq!(merged.server_or_default(), "http://file:5000");
    }

    #[test]
    fn test_server_defaults_to_local_backend() {
        assert_eq!(ConfigFlags::default().server_or_default(), DEFAULT_SERVER);
    }

    #[test]
    fn test_save_load_and_clear_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".scanlensrc");
        let flags = ConfigFlags {
            server: Some("http://scanner:8080".to_string()),
            timeout_secs: Some(45),
            max_upload_mb: None,
            theme: Some(ThemeMode::Dark),
            no_images: true,
            force_half_cell: true,
            log_file: Some(PathBuf::from("scan.log")),
            report_dir: Some(PathBuf::from("reports")),
        };

        save_config_flags(&path, &flags).unwrap();
        let loaded = load_config_flags(&path).unwrap();
        assert_eq!(loaded, flags);

        clear_config_flags(&path).unwrap();
        assert!(!path.exists());
    }
}
