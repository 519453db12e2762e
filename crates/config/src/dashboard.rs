use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::{generate_config_file, read_config};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub http_port: u16,
    pub log_level: LevelFilter,

    pub enable_tls: bool,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,

    pub api_base_url: String,
    pub tank_location: String,
    pub user_timezone: String,
    pub default_tank: String,

    #[serde(with = "crate::duration")]
    pub request_timeout: Duration,
    #[serde(with = "crate::duration")]
    pub nav_cache: Duration,
    #[serde(with = "crate::duration")]
    pub session_idle: Duration,

    pub polling: PollingConfig,
    pub monitor: MonitorConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            http_port: 5252,
            log_level: LevelFilter::Info,
            enable_tls: false,
            cert_path: PathBuf::new(),
            key_path: PathBuf::new(),
            api_base_url: "http://127.0.0.1:8000".into(),
            tank_location: "default".into(),
            user_timezone: "UTC".into(),
            default_tank: "1".into(),
            request_timeout: Duration::from_secs(10),
            nav_cache: Duration::from_secs(30),
            session_idle: Duration::from_secs(10 * 60),
            polling: PollingConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    #[serde(with = "crate::duration")]
    pub tank: Duration,
    #[serde(with = "crate::duration")]
    pub physical_server: Duration,
    #[serde(with = "crate::duration")]
    pub virtual_server: Duration,
    #[serde(with = "crate::duration")]
    pub monitor: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            tank: Duration::from_secs(1),
            physical_server: Duration::from_secs(30),
            virtual_server: Duration::from_secs(1),
            monitor: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub servers: Vec<String>,
    pub cpu_adapters: Vec<String>,
    pub cpu_cores: Vec<String>,
    pub disks: Vec<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            cpu_adapters: vec!["coretemp-isa-0000".into(), "coretemp-isa-0001".into()],
            cpu_cores: vec!["0".into(), "1".into(), "9".into(), "10".into()],
            disks: vec!["local".into(), "local-lvm".into()],
        }
    }
}

fn humantime_str(val: Duration) -> String {
    humantime::format_duration(val).to_string()
}

pub fn config_file(config: &DashboardConfig) -> Result<String> {
    generate_config_file!(
        "dashboard.toml",
        http_port = config.http_port,
        log_level = config.log_level,
        enable_tls = config.enable_tls,
        cert_path = config.cert_path,
        key_path = config.key_path,
        api_base_url = config.api_base_url,
        tank_location = config.tank_location,
        user_timezone = config.user_timezone,
        default_tank = config.default_tank,
        request_timeout = humantime_str(config.request_timeout),
        nav_cache = humantime_str(config.nav_cache),
        session_idle = humantime_str(config.session_idle),
        polling_tank = humantime_str(config.polling.tank),
        polling_physical_server = humantime_str(config.polling.physical_server),
        polling_virtual_server = humantime_str(config.polling.virtual_server),
        polling_monitor = humantime_str(config.polling.monitor),
        monitor_servers = config.monitor.servers,
        monitor_cpu_adapters = config.monitor.cpu_adapters,
        monitor_cpu_cores = config.monitor.cpu_cores,
        monitor_disks = config.monitor.disks,
    )
}

pub fn get_config() -> Result<DashboardConfig> {
    read_config("dashboard.toml", config_file)
}
