use serde::Deserialize;

use crate::{
    de,
    timestamp::{Timestamp, Timestamped},
};

macro_rules! timestamped {
    ($($typ:ty),* $(,)?) => {
        $(
            impl Timestamped for $typ {
                fn timestamp(&self) -> &Timestamp {
                    &self.timestamp
                }
            }
        )*
    };
}

timestamped!(
    LayerSample,
    CpuSample,
    RamSample,
    TemperatureSample,
    VmCpuSample,
    VmRamSample,
    LoadRecord,
    RamRecord,
    CoreTemperatureRecord,
    DiskStatRecord,
);

/// Splits a `"used/total"` pair as sent for VM RAM and disk usage.
pub fn parse_ratio(raw: &str) -> Option<(f64, f64)> {
    let (used, total) = raw.split_once('/')?;
    let used = used.trim().parse().ok()?;
    let total = total.trim().parse().ok()?;

    Some((used, total))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct TankList(#[serde(deserialize_with = "de::text_list")] pub Vec<String>);

#[derive(Debug, Clone, Deserialize)]
pub struct ServerEntry {
    #[serde(rename = "TANK_ID", deserialize_with = "de::text")]
    pub tank: String,
    #[serde(rename = "SERVER_ID", deserialize_with = "de::text")]
    pub server: String,
    #[serde(rename = "SERVER_IP", default)]
    pub ip: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VirtualServerEntry {
    #[serde(rename = "SERVER_VIRTUAL_NAME", deserialize_with = "de::text")]
    pub name: String,
    #[serde(rename = "TANK_NUM", deserialize_with = "de::text")]
    pub tank: String,
    #[serde(rename = "SERVER_NUM", deserialize_with = "de::text")]
    pub server: String,
}

/// Latest reading of the three tank layers.
#[derive(Debug, Clone, Deserialize)]
pub struct LayerTemperatures {
    #[serde(rename = "L1", deserialize_with = "de::number")]
    pub l1: f64,
    #[serde(rename = "L2", deserialize_with = "de::number")]
    pub l2: f64,
    #[serde(rename = "L3", deserialize_with = "de::number")]
    pub l3: f64,
}

impl LayerTemperatures {
    pub fn layers(&self) -> [f64; 3] {
        [self.l1, self.l2, self.l3]
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayerSample {
    #[serde(rename = "Timestamp")]
    pub timestamp: Timestamp,
    #[serde(rename = "L1", default, deserialize_with = "de::reading")]
    pub l1: Option<f64>,
    #[serde(rename = "L2", default, deserialize_with = "de::reading")]
    pub l2: Option<f64>,
    #[serde(rename = "L3", default, deserialize_with = "de::reading")]
    pub l3: Option<f64>,
}

impl LayerSample {
    /// All three layers, or `None` if the sample is missing any of them.
    pub fn layers(&self) -> Option<[f64; 3]> {
        Some([self.l1?, self.l2?, self.l3?])
    }
}

/// Aggregates shown on a physical server card in the tank view.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerOverview {
    #[serde(rename = "Used_Disk", default, deserialize_with = "de::opt_number")]
    pub used_disk: Option<f64>,
    #[serde(rename = "Total_Disk", default, deserialize_with = "de::opt_number")]
    pub total_disk: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub used_ram: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub total_ram: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub cpu_percent_used: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub logical_cores: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhysicalSummary {
    #[serde(rename = "SERVER_IP", default, deserialize_with = "de::opt_text")]
    pub ip: Option<String>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub temp: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub cpu_used: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub used_ram: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub total_ram: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub used_disk: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub total_disk: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CpuSample {
    #[serde(rename = "Timestamp")]
    pub timestamp: Timestamp,
    #[serde(default, deserialize_with = "de::reading")]
    pub cpu_percent_used: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub logical_cores: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RamSample {
    #[serde(rename = "Timestamp")]
    pub timestamp: Timestamp,
    #[serde(default, deserialize_with = "de::reading")]
    pub used_ram: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub total_ram: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiskUsage {
    #[serde(deserialize_with = "de::number")]
    pub percent_used: f64,
    #[serde(deserialize_with = "de::number")]
    pub used_bytes: f64,
    #[serde(deserialize_with = "de::number")]
    pub total_bytes: f64,
}

/// One sensor's history on a physical server.
#[derive(Debug, Clone, Deserialize)]
pub struct TemperatureSeries {
    #[serde(deserialize_with = "de::text")]
    pub name: String,
    #[serde(default)]
    pub data: Vec<TemperatureSample>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemperatureSample {
    #[serde(rename = "Timestamp")]
    pub timestamp: Timestamp,
    #[serde(default, deserialize_with = "de::reading")]
    pub avg_temp: Option<f64>,
}

/// State of a virtual server at the latest (or picked) time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VmOverview {
    #[serde(rename = "Timestamp", default)]
    pub timestamp: Option<Timestamp>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(rename = "CPU_USAGE", default, deserialize_with = "de::opt_number")]
    pub cpu_usage: Option<f64>,
    #[serde(rename = "NUM_CORES", default, deserialize_with = "de::opt_number")]
    pub num_cores: Option<f64>,
    // Some API versions send this key with a trailing space
    #[serde(
        rename = "Ram_Usage",
        alias = "Ram_Usage ",
        default,
        deserialize_with = "de::opt_text"
    )]
    pub ram_usage: Option<String>,
    #[serde(rename = "Disk_Usage", default, deserialize_with = "de::opt_text")]
    pub disk_usage: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VmCpuSample {
    #[serde(rename = "Timestamp")]
    pub timestamp: Timestamp,
    #[serde(rename = "CPU_USAGE", default, deserialize_with = "de::reading")]
    pub cpu_usage: Option<f64>,
    #[serde(rename = "NUM_CORES", default, deserialize_with = "de::opt_number")]
    pub num_cores: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VmRamSample {
    #[serde(rename = "Timestamp")]
    pub timestamp: Timestamp,
    #[serde(rename = "Ram_Usage", default, deserialize_with = "de::opt_text")]
    pub ram_usage: Option<String>,
}

impl VmRamSample {
    pub fn used(&self) -> Option<f64> {
        parse_ratio(self.ram_usage.as_deref()?).map(|(used, _)| used)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VmDiskUsage {
    #[serde(rename = "Disk_Usage", deserialize_with = "de::text")]
    pub disk_usage: String,
}

impl VmDiskUsage {
    pub fn used_total(&self) -> Option<(f64, f64)> {
        parse_ratio(&self.disk_usage)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerDetails {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text")]
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadRecord {
    pub timestamp: Timestamp,
    #[serde(default)]
    pub load_average: String,
    #[serde(default, deserialize_with = "de::reading")]
    pub cpu_percent_used: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_number")]
    pub logical_cores: Option<f64>,
}

impl LoadRecord {
    /// 1, 5 and 15 minute load averages from `"0.52, 0.61, 0.70"`.
    pub fn loads(&self) -> Option<[f64; 3]> {
        let mut parts = self.load_average.split(',').map(|x| x.trim().parse::<f64>());

        let loads = [parts.next()?.ok()?, parts.next()?.ok()?, parts.next()?.ok()?];

        Some(loads)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RamRecord {
    pub timestamp: Timestamp,
    #[serde(default, deserialize_with = "de::reading")]
    pub used_ram_mb: Option<f64>,
    #[serde(default, deserialize_with = "de::reading")]
    pub free_ram_mb: Option<f64>,
    #[serde(default, deserialize_with = "de::reading")]
    pub total_ram_mb: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoreTemperatureRecord {
    pub timestamp: Timestamp,
    #[serde(default, deserialize_with = "de::reading")]
    pub temperature_celsius: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiskStatRecord {
    pub timestamp: Timestamp,
    #[serde(default, deserialize_with = "de::reading")]
    pub total_bytes: Option<f64>,
    #[serde(default, deserialize_with = "de::reading")]
    pub used_bytes: Option<f64>,
    #[serde(default, deserialize_with = "de::reading")]
    pub available_bytes: Option<f64>,
    #[serde(default, deserialize_with = "de::reading")]
    pub percent_used: Option<f64>,
}
