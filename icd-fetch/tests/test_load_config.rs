use icd_fetch::cli::Cli;
use icd_fetch::load_config::{load_config, parse_config_str, resolve, Credentials, FileSettings};
use icd_fetch_core::config::{DEFAULT_BASE_URL, DEFAULT_TOKEN_URL};
use icd_fetch_core::error::ConfigError;
use std::fs::write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;

fn config_file(contents: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), contents).expect("write temp config");
    file
}

fn cli_with_config(path: &Path) -> Cli {
    Cli {
        config_file: Some(path.to_path_buf()),
        ..Default::default()
    }
}

#[test]
fn config_file_values_apply_when_no_flags_given() {
    let file = config_file(
        "[DEFAULT]\ntoken = file-token\noutput_dir = out\ndelay = 1.5\nlog_file = run.log\n",
    );
    let resolved = load_config(&cli_with_config(file.path())).expect("config should load");

    assert_eq!(resolved.credentials, Credentials::Token("file-token".into()));
    assert_eq!(resolved.output_dir, PathBuf::from("out"));
    assert_eq!(resolved.delay, Duration::from_millis(1500));
    assert_eq!(resolved.log_file, PathBuf::from("run.log"));
}

#[test]
fn flags_override_config_file() {
    let file = config_file(
        "[DEFAULT]\ntoken = file-token\noutput_dir = out\ndelay = 1.5\nlog_file = run.log\n",
    );
    let cli = Cli {
        token: Some("cli-token".into()),
        output_dir: Some("cli_out".into()),
        delay: Some(Duration::ZERO),
        log_file: Some("cli.log".into()),
        config_file: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    let resolved = load_config(&cli).unwrap();

    assert_eq!(resolved.credentials, Credentials::Token("cli-token".into()));
    assert_eq!(resolved.output_dir, PathBuf::from("cli_out"));
    assert_eq!(resolved.delay, Duration::ZERO);
    assert_eq!(resolved.log_file, PathBuf::from("cli.log"));
}

#[test]
fn defaults_fill_in_everything_but_the_token() {
    let cli = Cli {
        token: Some("t".into()),
        ..Default::default()
    };
    let resolved = load_config(&cli).unwrap();

    assert_eq!(resolved.output_dir, PathBuf::from("icd_data"));
    assert_eq!(resolved.delay, Duration::from_millis(500));
    assert_eq!(resolved.log_file, PathBuf::from("icd_api.log"));
    assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
    assert_eq!(resolved.language, "en");
    assert_eq!(resolved.root, "");
}

#[test]
fn missing_token_everywhere_is_a_configuration_error() {
    let err = load_config(&Cli::default()).unwrap_err();
    assert!(matches!(err, ConfigError::MissingToken));

    let file = config_file("[DEFAULT]\noutput_dir = out\n");
    let err = load_config(&cli_with_config(file.path())).unwrap_err();
    assert!(matches!(err, ConfigError::MissingToken));
}

#[test]
fn blank_tokens_count_as_missing() {
    let file = config_file("[DEFAULT]\ntoken =\n");
    let cli = Cli {
        token: Some("   ".into()),
        config_file: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    assert!(matches!(load_config(&cli), Err(ConfigError::MissingToken)));
}

#[test]
fn client_credentials_stand_in_for_a_token() {
    let file = config_file("[DEFAULT]\nclient_id = abc\nclient_secret = xyz\n");
    let resolved = load_config(&cli_with_config(file.path())).unwrap();

    match resolved.credentials {
        Credentials::Client(creds) => {
            assert_eq!(creds.client_id, "abc");
            assert_eq!(creds.client_secret, "xyz");
            assert_eq!(creds.token_url, DEFAULT_TOKEN_URL);
        }
        other => panic!("expected client credentials, got {other:?}"),
    }
}

#[test]
fn half_a_credential_pair_is_not_enough() {
    let file = config_file("[DEFAULT]\nclient_id = abc\n");
    assert!(matches!(
        load_config(&cli_with_config(file.path())),
        Err(ConfigError::MissingToken)
    ));
}

#[test]
fn explicit_token_wins_over_client_credentials() {
    let file = config_file("[DEFAULT]\ntoken = tok\nclient_id = abc\nclient_secret = xyz\n");
    let resolved = load_config(&cli_with_config(file.path())).unwrap();
    assert_eq!(resolved.credentials, Credentials::Token("tok".into()));
}

#[test]
fn unknown_keys_and_sections_are_ignored() {
    let settings = parse_config_str(
        "[DEFAULT]\ntoken = t\ncolour = blue\n\n[other]\ntoken = not-this-one\n",
        Path::new("test.ini"),
    )
    .unwrap();
    assert_eq!(
        settings,
        FileSettings {
            token: Some("t".into()),
            ..Default::default()
        }
    );
}

#[test]
fn file_without_default_section_yields_nothing() {
    let settings = parse_config_str("[other]\ntoken = x\n", Path::new("test.ini")).unwrap();
    assert_eq!(settings, FileSettings::default());
}

#[test]
fn values_are_read_literally() {
    let settings = parse_config_str(
        "[DEFAULT]\ntoken = \"abc\"\noutput_dir = C:\\data\\new\nclient_secret = s3cr\\t#x\n",
        Path::new("test.ini"),
    )
    .unwrap();
    assert_eq!(settings.token.as_deref(), Some("\"abc\""));
    assert_eq!(settings.output_dir.as_deref(), Some(r"C:\data\new"));
    assert_eq!(settings.client_secret.as_deref(), Some(r"s3cr\t#x"));
}

#[test]
fn keys_match_regardless_of_case() {
    let settings = parse_config_str(
        "[DEFAULT]\nTOKEN = abc\nOutput_Dir = out\n",
        Path::new("test.ini"),
    )
    .unwrap();
    assert_eq!(settings.token.as_deref(), Some("abc"));
    assert_eq!(settings.output_dir.as_deref(), Some("out"));

    let file = config_file("[DEFAULT]\nTOKEN = abc\n");
    let resolved = load_config(&cli_with_config(file.path())).unwrap();
    assert_eq!(resolved.credentials, Credentials::Token("abc".into()));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let file = config_file("[DEFAULT\ntoken = abc\n");
    let err = load_config(&cli_with_config(file.path())).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got {err:?}");
    assert!(err.to_string().contains("parse"));
    assert!(
        std::error::Error::source(&err).is_some(),
        "parse error keeps the underlying INI error"
    );
}

#[test]
fn unreadable_file_is_reported() {
    let err = load_config(&cli_with_config(Path::new("/definitely/not/here.ini"))).unwrap_err();
    assert!(matches!(err, ConfigError::Unreadable { .. }), "got {err:?}");
}

#[test]
fn invalid_delay_in_file_is_rejected() {
    let file = config_file("[DEFAULT]\ntoken = t\ndelay = soon\n");
    let err = load_config(&cli_with_config(file.path())).unwrap_err();
    match err {
        ConfigError::InvalidValue { key, value } => {
            assert_eq!(key, "delay");
            assert_eq!(value, "soon");
        }
        other => panic!("expected invalid delay, got {other:?}"),
    }
}

#[test]
fn root_flag_may_select_the_release_root_explicitly() {
    let cli = Cli {
        token: Some("t".into()),
        root: Some(String::new()),
        ..Default::default()
    };
    let file = FileSettings {
        root: Some("A00".into()),
        ..Default::default()
    };
    assert_eq!(resolve(&cli, file).unwrap().root, "");
}

#[tokio::test]
async fn token_credentials_become_the_effective_config() {
    let cli = Cli {
        token: Some("tok".into()),
        root: Some("X00".into()),
        ..Default::default()
    };
    let config = load_config(&cli).unwrap().into_effective().await.unwrap();
    assert_eq!(config.token, "tok");
    assert_eq!(config.root, "X00");
    assert!(config.seed_fallback().is_empty());
}
