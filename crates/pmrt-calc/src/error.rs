use crate::calculator::{AssetLoadError, CalculatorError, ConfigurationError};
use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Calculator(CalculatorError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Calculator(CalculatorError::Input(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Calculator(CalculatorError::UnknownModel(_)) => StatusCode::NOT_FOUND,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Calculator(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Calculator(err) => write!(f, "calculator error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Calculator(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<CalculatorError> for AppError {
    fn from(value: CalculatorError) -> Self {
        Self::Calculator(value)
    }
}

impl From<ConfigurationError> for AppError {
    fn from(value: ConfigurationError) -> Self {
        Self::Calculator(CalculatorError::Configuration(value))
    }
}

impl From<AssetLoadError> for AppError {
    fn from(value: AssetLoadError) -> Self {
        Self::Calculator(CalculatorError::Load(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::InputError;

    #[test]
    fn input_errors_are_unprocessable() {
        let error = AppError::from(CalculatorError::Input(InputError::UnknownFeature(
            "bmi".to_string(),
        )));
        assert_eq!(error.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            error.to_string(),
            "calculator error: bmi is not a model input"
        );
    }

    #[test]
    fn unknown_models_are_not_found() {
        let error = AppError::from(CalculatorError::UnknownModel("Ridge".to_string()));
        assert_eq!(error.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn configuration_errors_are_server_faults() {
        let error = AppError::from(ConfigurationError::MissingFallback("age".to_string()));
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
