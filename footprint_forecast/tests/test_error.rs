use footprint_forecast::{ErrorResponse, ForecastError, StatusClass};
use footprint_math::MathError;
use std::io;

#[test]
fn test_error_display() {
    let err = ForecastError::Validation("No historical data provided".to_string());
    assert_eq!(err.to_string(), "Validation error: No historical data provided");

    let err = ForecastError::Training("too few rows".to_string());
    assert_eq!(err.to_string(), "Model training failed: too few rows");

    let err = ForecastError::Forecast("schema mismatch".to_string());
    assert_eq!(err.to_string(), "Prediction failed: schema mismatch");
}

#[test]
fn test_status_classes() {
    assert_eq!(
        ForecastError::Validation("bad".to_string()).status_class(),
        StatusClass::ClientError
    );
    for err in [
        ForecastError::Training("x".to_string()),
        ForecastError::Forecast("x".to_string()),
        ForecastError::Config("x".to_string()),
        ForecastError::Io(io::Error::new(io::ErrorKind::Other, "disk")),
    ] {
        assert_eq!(err.status_class(), StatusClass::ServerError);
    }

    assert_eq!(StatusClass::ClientError.http_status(), 400);
    assert_eq!(StatusClass::ServerError.http_status(), 500);
}

#[test]
fn test_error_conversions() {
    let err: ForecastError = MathError::InvalidInput("width".to_string()).into();
    assert!(matches!(err, ForecastError::Math(_)));

    let err: ForecastError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(err, ForecastError::Io(_)));

    let err: ForecastError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
    assert!(matches!(err, ForecastError::Serialization(_)));
}

#[test]
fn test_error_response_message() {
    let validation = ForecastError::Validation("Insufficient data".to_string());
    assert_eq!(ErrorResponse::from(&validation).error, "Insufficient data");

    let training = ForecastError::Training("failed".to_string());
    assert_eq!(
        ErrorResponse::from(&training).error,
        "Model training failed: failed"
    );
}
