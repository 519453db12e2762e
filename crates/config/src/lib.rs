use std::{fs, io};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

pub mod dashboard;

pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

macro_rules! generate_config_file {
    ($template:literal, $($key:ident = $val:expr),* $(,)?) => {{
        use anyhow::Context;
        use serde::Serialize;
        use toml_edit::ser::ValueSerializer;

        (|| -> anyhow::Result<String> {
            $(
                let $key = Serialize::serialize(&($val), ValueSerializer::new())
                    .with_context(|| format!("failed to serialize config key {}", stringify!($key)))?;
            )*

            Ok(format!(include_str!(concat!("../templates/", $template)), $($key = $key),*))
        })()
    }};
}

pub(crate) use generate_config_file;

/// Serde helpers for humantime-formatted durations, e.g. `"30s"` or `"1m 30s"`.
pub(crate) mod duration {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(val: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*val).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(D::Error::custom)
    }
}

pub fn parse_config<T: DeserializeOwned>(config_str: &str) -> Result<T> {
    basic_toml::from_str(config_str).context("failed to parse config file")
}

fn read_config<T: DeserializeOwned + Default>(
    config_name: &str,
    config_file_generator: fn(&T) -> Result<String>,
) -> Result<T> {
    let mut cfgpath = std::env::current_exe().context("couldn't get path to executable")?;
    cfgpath.set_file_name(config_name);

    let config_str = match fs::read_to_string(&cfgpath) {
        Ok(config_str) => config_str,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            // If config file doesn't exist, create a new default configuration
            let config = T::default();
            let config_file = config_file_generator(&config)?;
            fs::write(&cfgpath, config_file).context("failed to create new config file")?;
            log::info!("Created default config file at {}", cfgpath.display());
            return Ok(config);
        }
        Err(e) => return Err(e).context("failed to read config file"),
    };

    parse_config(&config_str).with_context(|| format!("invalid config at {}", cfgpath.display()))
}
