use std::path::PathBuf;

use scanlens::config::{
    ConfigFlags, DEFAULT_SERVER, ThemeMode, clear_config_flags, load_config_flags,
    parse_flag_tokens, save_config_flags,
};

fn args(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(ToString::to_string).collect()
}

#[test]
fn test_config_file_parsing_ignores_comments_and_blank_lines() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".scanlensrc");
    let content = r"
# lab server
--server http://radiology:5000

--theme light

--report-dir=reports
";
    std::fs::write(&path, content).unwrap();

    let flags = load_config_flags(&path).unwrap();
    assert_eq!(flags.server.as_deref(), Some("http://radiology:5000"));
    assert_eq!(flags.theme, Some(ThemeMode::Light));
    assert_eq!(flags.report_dir, Some(PathBuf::from("reports")));
    assert!(!flags.no_images);
}

#[test]
fn test_cli_flags_override_file_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".scanlensrc");
    std::fs::write(&path, "--no-images\n--theme light\n--timeout 60\n").unwrap();

    let file_flags = load_config_flags(&path).unwrap();
    let cli_flags = parse_flag_tokens(&args(&[
        "scanlens",
        "scan.png",
        "--theme",
        "dark",
        "--force-half-cell",
    ]));

    let effective = file_flags.union(&cli_flags);
    assert!(effective.no_images, "file flags should remain enabled");
    assert!(effective.force_half_cell, "cli flags should be applied");
    assert_eq!(effective.theme, Some(ThemeMode::Dark), "cli should override theme");
    assert_eq!(
        effective.timeout_secs,
        Some(60),
        "file config should be preserved when CLI does not override"
    );
}

#[test]
fn test_local_override_wins_over_global() {
    let dir = tempfile::tempdir().unwrap();
    let global = dir.path().join("config");
    let local = dir.path().join(".scanlensrc");
    std::fs::write(&global, "--server http://global:5000\n--timeout 10\n").unwrap();
    std::fs::write(&local, "--server http://local:5000\n").unwrap();

    let effective = load_config_flags(&global)
        .unwrap()
        .union(&load_config_flags(&local).unwrap());
    assert_eq!(effective.server_or_default(), "http://local:5000");
    assert_eq!(effective.timeout_secs, Some(10));
}

#[test]
fn test_missing_files_fall_back_to_default_server() {
    let dir = tempfile::tempdir().unwrap();
    let flags = load_config_flags(&dir.path().join("absent")).unwrap();
    assert_eq!(flags, ConfigFlags::default());
    assert_eq!(flags.server_or_default(), DEFAULT_SERVER);
}

#[test]
fn test_save_then_clear_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scanlens").join("config");
    let flags = parse_flag_tokens(&args(&[
        "scanlens",
        "--server=http://scanner:8080",
        "--timeout",
        "45",
        "--max-upload-mb",
        "32",
        "--no-images",
    ]));

    save_config_flags(&path, &flags).unwrap();
    assert_eq!(load_config_flags(&path).unwrap(), flags);

    clear_config_flags(&path).unwrap();
    assert!(!path.exists());
    assert_eq!(load_config_flags(&path).unwrap(), ConfigFlags::default());
}

#[test]
fn test_unparseable_timeout_is_ignored() {
    let flags = parse_flag_tokens(&args(&["scanlens", "--timeout", "soon"]));
    assert_eq!(flags.timeout_secs, None);
}
