use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        logging: LoggingOverrides {
            log_level: Some("debug".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_are_valid() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert_eq!(settings.server.graceful_shutdown, Duration::from_secs(30));
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert_eq!(settings.transform.runtime_module, DEFAULT_RUNTIME_MODULE);
    assert!(settings.revalidate.timeout.is_none());
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        logging: LoggingOverrides {
            log_json: Some(true),
            ..Default::default()
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn zero_revalidate_timeout_means_unbounded() {
    let mut raw = RawSettings::default();
    raw.revalidate.timeout_seconds = Some(0);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.revalidate.timeout.is_none());

    let mut raw = RawSettings::default();
    raw.apply_serve_overrides(&ServeOverrides {
        revalidate_timeout_seconds: Some(5),
        ..Default::default()
    });
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.revalidate.timeout, Some(Duration::from_secs(5)));
}

#[test]
fn invalid_values_are_rejected() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(0);
    let err = Settings::from_raw(raw).expect_err("port zero");
    assert!(matches!(err, LoadError::Invalid { key: "server.port", .. }));

    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());
    let err = Settings::from_raw(raw).expect_err("bad level");
    assert!(matches!(err, LoadError::Invalid { key: "logging.level", .. }));

    let mut raw = RawSettings::default();
    raw.server.host = Some("not a host".to_string());
    let err = Settings::from_raw(raw).expect_err("bad host");
    assert!(matches!(err, LoadError::Invalid { key: "server.addr", .. }));

    let mut raw = RawSettings::default();
    raw.transform.runtime_module = Some("   ".to_string());
    let err = Settings::from_raw(raw).expect_err("empty runtime module");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "transform.runtime_module",
            ..
        }
    ));
}

#[test]
fn default_to_no_command() {
    let args = CliArgs::parse_from(["retarget"]);
    assert!(args.command.is_none());
    assert!(args.config_file.is_none());
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "retarget",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--server-port",
        "8080",
        "--log-json",
        "yes",
        "--revalidate-timeout-seconds",
        "3",
    ]);

    match args.command {
        Some(Command::Serve(serve)) => {
            let overrides = &serve.overrides;
            assert_eq!(overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(overrides.server_port, Some(8080));
            assert_eq!(overrides.logging.log_json, Some(true));
            assert_eq!(overrides.revalidate_timeout_seconds, Some(3));
        }
        other => panic!("expected serve command, got {other:?}"),
    }
}

#[test]
fn parse_transform_arguments() {
    let args = CliArgs::parse_from([
        "retarget",
        "transform",
        "--root",
        "web",
        "--out-dir",
        "dist",
        "--runtime-module",
        "./runtime.js",
        "web/components.ts",
        "web/other.tsx",
    ]);

    match args.command {
        Some(Command::Transform(transform)) => {
            assert_eq!(transform.root, PathBuf::from("web"));
            assert_eq!(transform.out_dir, Some(PathBuf::from("dist")));
            assert_eq!(transform.files.len(), 2);

            let mut raw = RawSettings::default();
            raw.apply_transform_overrides(&transform);
            let settings = Settings::from_raw(raw).expect("valid settings");
            assert_eq!(settings.transform.runtime_module, "./runtime.js");
        }
        other => panic!("expected transform command, got {other:?}"),
    }
}

#[test]
fn transform_requires_files() {
    let result = CliArgs::try_parse_from(["retarget", "transform"]);
    assert!(result.is_err());
}

#[test]
fn parse_id_arguments() {
    let args = CliArgs::parse_from(["retarget", "id", "test.js", "MyTarget"]);

    match args.command {
        Some(Command::Id(id)) => {
            assert_eq!(id.module_path, "test.js");
            assert_eq!(id.name, "MyTarget");
        }
        other => panic!("expected id command, got {other:?}"),
    }
}
