//! Connection options.
//!
//! Options can be built in code, set one by one from string key/value pairs
//! (as they arrive from connection strings or keyword arguments), or read
//! from the environment.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::logging::LogConfig;

pub const DEFAULT_SCHEMA_NAME: &str = "default";
pub const DEFAULT_CATALOG_NAME: &str = "AwsDataCatalog";
pub const DEFAULT_FETCH_SIZE: usize = 1000;

const PROFILE_CREDENTIALS_PROVIDER: &str =
    "com.amazonaws.athena.jdbc.shaded.com.amazonaws.auth.profile.ProfileCredentialsProvider";

/// Options passed to [`crate::connect`].
#[derive(Clone)]
pub struct ConnectOptions {
    pub schema_name: String,
    pub catalog_name: String,
    pub s3_staging_dir: Option<String>,
    pub region_name: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub profile_name: Option<String>,
    /// Rows requested from the driver per round trip.
    pub fetch_size: usize,
    pub log: LogConfig,
    /// Driver-specific properties, passed through untouched.
    pub properties: BTreeMap<String, String>,
}

impl Default for ConnectOptions {
    fn default() -> Self {
        Self {
            schema_name: DEFAULT_SCHEMA_NAME.to_string(),
            catalog_name: DEFAULT_CATALOG_NAME.to_string(),
            s3_staging_dir: None,
            region_name: None,
            access_key_id: None,
            secret_access_key: None,
            profile_name: None,
            fetch_size: DEFAULT_FETCH_SIZE,
            log: LogConfig::default(),
            properties: BTreeMap::new(),
        }
    }
}

impl fmt::Debug for ConnectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectOptions")
            .field("schema_name", &self.schema_name)
            .field("catalog_name", &self.catalog_name)
            .field("s3_staging_dir", &self.s3_staging_dir)
            .field("region_name", &self.region_name)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("profile_name", &self.profile_name)
            .field("fetch_size", &self.fetch_size)
            .field("log", &self.log)
            .field("properties", &self.properties)
            .finish()
    }
}

impl ConnectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with the `AWS_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();
        if let Some(schema) = lookup("AWS_ATHENA_SCHEMA_NAME") {
            options.schema_name = schema;
        }
        options.s3_staging_dir = lookup("AWS_ATHENA_S3_STAGING_DIR");
        options.region_name = lookup("AWS_DEFAULT_REGION");
        options.access_key_id = lookup("AWS_ACCESS_KEY_ID");
        options.secret_access_key = lookup("AWS_SECRET_ACCESS_KEY");
        options.profile_name = lookup("AWS_PROFILE");
        options
    }

    pub fn schema_name(mut self, schema_name: impl Into<String>) -> Self {
        self.schema_name = schema_name.into();
        self
    }

    pub fn catalog_name(mut self, catalog_name: impl Into<String>) -> Self {
        self.catalog_name = catalog_name.into();
        self
    }

    pub fn s3_staging_dir(mut self, s3_staging_dir: impl Into<String>) -> Self {
        self.s3_staging_dir = Some(s3_staging_dir.into());
        self
    }

    pub fn region_name(mut self, region_name: impl Into<String>) -> Self {
        self.region_name = Some(region_name.into());
        self
    }

    pub fn credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    pub fn profile_name(mut self, profile_name: impl Into<String>) -> Self {
        self.profile_name = Some(profile_name.into());
        self
    }

    pub fn fetch_size(mut self, fetch_size: usize) -> Self {
        self.fetch_size = fetch_size;
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log.level = Some(level.into());
        self
    }

    pub fn log_file(mut self, file: impl Into<String>) -> Self {
        self.log.file = Some(file.into());
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set an option from its string form. Unknown keys become driver
    /// properties.
    pub fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "schema_name" => self.schema_name = value.to_string(),
            "catalog_name" => self.catalog_name = value.to_string(),
            "s3_staging_dir" => self.s3_staging_dir = Some(value.to_string()),
            "region_name" => self.region_name = Some(value.to_string()),
            "access_key" | "access_key_id" => self.access_key_id = Some(value.to_string()),
            "secret_key" | "secret_access_key" => {
                self.secret_access_key = Some(value.to_string())
            }
            "profile_name" => self.profile_name = Some(value.to_string()),
            "fetch_size" => {
                self.fetch_size = value
                    .parse()
                    .map_err(|_| invalid_option(key, value))?;
            }
            "log_level" => self.log.level = Some(value.to_string()),
            "log_file" => self.log.file = Some(value.to_string()),
            _ => {
                self.properties.insert(key.to_string(), value.to_string());
            }
        }
        Ok(())
    }

    /// Check option values before a session is opened.
    pub fn validate(&self) -> Result<()> {
        if self.fetch_size == 0 {
            return Err(invalid_option("fetch_size", "0"));
        }
        if let Some(ref level) = self.log.level {
            const LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];
            if !LEVELS.iter().any(|l| l.eq_ignore_ascii_case(level)) {
                return Err(invalid_option("log_level", level));
            }
        }
        Ok(())
    }

    /// The Athena JDBC endpoint for the configured region.
    ///
    /// Together with [`ConnectOptions::driver_properties`] this is what a
    /// JDBC-backed [`crate::Driver`] implementation, living outside this
    /// crate, passes to `DriverManager.getConnection` in its `connect`.
    pub fn jdbc_url(&self) -> Option<String> {
        self.region_name
            .as_ref()
            .map(|region| format!("jdbc:awsathena://athena.{}.amazonaws.com:443/", region))
    }

    /// Properties handed to a JDBC-backed driver when opening a session:
    /// `schema`, `s3_staging_dir`, then either the profile credentials
    /// provider or `user`/`password`, on top of the free-form `properties`.
    pub fn driver_properties(&self) -> BTreeMap<String, String> {
        let mut props = self.properties.clone();
        props.insert("schema".to_string(), self.schema_name.clone());
        if let Some(ref dir) = self.s3_staging_dir {
            props.insert("s3_staging_dir".to_string(), dir.clone());
        }
        if let Some(ref profile) = self.profile_name {
            props.insert(
                "aws_credentials_provider_class".to_string(),
                PROFILE_CREDENTIALS_PROVIDER.to_string(),
            );
            props.insert("aws_credentials_provider_arguments".to_string(), profile.clone());
        } else if let (Some(user), Some(password)) =
            (&self.access_key_id, &self.secret_access_key)
        {
            props.insert("user".to_string(), user.clone());
            props.insert("password".to_string(), password.clone());
        }
        props
    }
}

fn invalid_option(key: &str, value: &str) -> Error {
    Error::Programming(format!("invalid value for option {}: {:?}", key, value))
}
