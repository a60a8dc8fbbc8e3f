//! Data model, geometry, QR payloads, story courses and configuration for the
//! Pohang Storyteller map layer.

pub mod app_config;
pub mod config;
pub mod course;
pub mod geo;
pub mod qr;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use course::{course_markers, load_courses, parse_courses, CourseConfig, CoursesFile};
pub use qr::{decode_qr_data, decode_qr_data_at, encode_qr_data, QrCodeInfo, QrKind};
pub use types::{
    Bounds, Category, Coordinate, Difficulty, ExperienceKind, ExperienceRecord, Location,
    MapCenter, MapState, Marker, MarkerSize, MarkerType, Media, MediaKind, ProviderKind, Reward,
    Route, Stamp, StampStatus,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read course file {path}: {source}")]
    CourseFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse course file: {0}")]
    CourseFileParse(#[source] serde_yaml::Error),

    #[error("course validation failed: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid provider: {0}")]
    InvalidProvider(String),

    #[error("invalid coordinate: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },

    #[error("QR code lifetime of {minutes} minutes is out of range")]
    ExpiryOutOfRange { minutes: i64 },
}
