//! Unit tests for error display and conversions.

use folder_courier::AppError;

#[test]
fn display_prefixes_failure_domain() {
    assert_eq!(
        AppError::Config("bad interval".into()).to_string(),
        "config: bad interval"
    );
    assert_eq!(
        AppError::Webhook("status 500".into()).to_string(),
        "webhook: status 500"
    );
    assert_eq!(AppError::Io("denied".into()).to_string(), "io: denied");
    assert_eq!(
        AppError::NotFound("folder x".into()).to_string(),
        "not found: folder x"
    );
    assert_eq!(
        AppError::Folder("inbox stalled".into()).to_string(),
        "folder: inbox stalled"
    );
}

#[test]
fn converts_toml_errors_to_config() {
    let toml_err = toml::from_str::<folder_courier::GlobalConfig>("not = [valid")
        .expect_err("invalid toml");
    let err: AppError = toml_err.into();
    assert!(matches!(err, AppError::Config(_)), "got {err:?}");
}

#[test]
fn converts_io_errors() {
    let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
    let err: AppError = io_err.into();
    assert!(matches!(err, AppError::Io(_)), "got {err:?}");
}
