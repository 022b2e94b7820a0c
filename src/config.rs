//! Configuration manager for loginform.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    /// Listening port.
    pub port: u16,
    /// Directory holding `login.html`, `signup.html` and `css/`.
    pub assets: PathBuf,
    /// Seconds before a request is aborted.
    pub request_timeout: u64,
    /// Related to MongoDB configuration.
    pub mongodb: MongoDb,
    /// Related to `/delete-account` route.
    pub delete: Delete,
    /// Related to metrics and trace export.
    pub telemetry: Telemetry,
    #[serde(skip)]
    path: PathBuf,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            port: 3000,
            assets: PathBuf::from("static"),
            request_timeout: 10,
            mongodb: MongoDb::default(),
            delete: Delete::default(),
            telemetry: Telemetry::default(),
            path: PathBuf::default(),
        }
    }
}

/// MongoDB configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoDb {
    /// Connection string.
    pub uri: String,
    /// Database name.
    pub database: String,
    /// Collection storing user records.
    pub collection: String,
    /// Create a unique index on `name` at startup.
    pub unique_names: bool,
    /// Create an index on `email` at startup.
    pub email_index: bool,
}

impl Default for MongoDb {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017/LoginFormPractice".into(),
            database: "LoginFormPractice".into(),
            collection: "users".into(),
            unique_names: true,
            email_index: true,
        }
    }
}

/// Account deletion configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delete {
    /// Keep accepting `GET /delete-account?email=..&password=..`.
    pub allow_get: bool,
}

impl Default for Delete {
    fn default() -> Self {
        Self { allow_get: true }
    }
}

/// Telemetry configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Telemetry {
    /// Expose Prometheus metrics on `/metrics`.
    pub prometheus: bool,
    /// OTLP gRPC endpoint for traces and logs.
    pub otlp: Option<String>,
}

impl Configuration {
    /// Read the file at `path` instead of `config.yaml`.
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    ///
    /// `PORT` environment variable takes precedence over the file.
    pub fn read(self) -> Arc<Self> {
        let file_path = if self.path.is_file() {
            &self.path
        } else {
            &Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        let mut config = match File::open(file_path) {
            Ok(file) => match serde_yaml::from_reader::<_, Configuration>(file) {
                Ok(config) => config,
                Err(err) => self.error(err),
            },
            Err(err) => self.error(err),
        };

        config.override_port(std::env::var("PORT").ok().as_deref());

        Arc::new(config)
    }

    /// Replace `port` when `value` is a valid port number.
    fn override_port(&mut self, value: Option<&str>) {
        match value.map(str::parse::<u16>) {
            Some(Ok(port)) => self.port = port,
            Some(Err(err)) => {
                tracing::warn!(error = %err, "ignoring invalid `PORT` variable")
            },
            None => (),
        }
    }

    /// Return a default configuration as fallback.
    fn error(&self, err: impl std::error::Error) -> Self {
        tracing::error!(error = %err, "`config.yaml` cannot be read, using defaults");
        Self::default()
    }
}
