use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::debug;
use serde::de::DeserializeOwned;

use crate::{
    timestamp::Timestamp,
    types::{
        CoreTemperatureRecord, CpuSample, DiskStatRecord, DiskUsage, LayerSample,
        LayerTemperatures, LoadRecord, PhysicalSummary, RamRecord, RamSample, ServerDetails,
        ServerEntry, ServerOverview, TankList, TemperatureSeries, VirtualServerEntry, VmCpuSample,
        VmDiskUsage, VmOverview, VmRamSample,
    },
    window::TimeWindow,
};

type Query = Vec<(&'static str, String)>;

/// Connection details for the telemetry API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub location: String,
    pub user_timezone: String,
    pub timeout: Duration,
}

/// Typed client for the telemetry REST API. Cheap to clone.
#[derive(Debug, Clone)]
pub struct TelemetryClient {
    http: reqwest::Client,
    base_url: String,
    location: String,
    user_timezone: String,
}

impl TelemetryClient {
    pub fn new(config: ApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build http client")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            location: config.location,
            user_timezone: config.user_timezone,
        })
    }

    fn url(&self, segments: &[&str]) -> String {
        segments.iter().fold(self.base_url.clone(), |mut url, seg| {
            url.push('/');
            url.push_str(&urlencoding::encode(seg));
            url
        })
    }

    fn date_query(&self, date: NaiveDate) -> Query {
        vec![
            ("date", date.format("%Y-%m-%d").to_string()),
            ("user_timezone", self.user_timezone.clone()),
        ]
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String, query: Query) -> Result<T> {
        debug!("GET {url}");

        let resp = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?
            .error_for_status()
            .with_context(|| format!("{url} returned an error status"))?;

        resp.json::<T>()
            .await
            .with_context(|| format!("failed to decode response from {url}"))
    }

    pub async fn tanks(&self) -> Result<Vec<String>> {
        let url = self.url(&["get_tank", &self.location]);
        let TankList(tanks) = self.get_json(url, Vec::new()).await?;

        Ok(tanks)
    }

    pub async fn servers(&self, tank: &str) -> Result<Vec<ServerEntry>> {
        let url = self.url(&["get_server_list", &self.location, tank]);
        self.get_json(url, Vec::new()).await
    }

    pub async fn virtual_servers(&self, tank: &str, server: &str) -> Result<Vec<VirtualServerEntry>> {
        let url = self.url(&["virtual_server", &self.location, tank, server]);
        self.get_json(url, Vec::new()).await
    }

    pub async fn tank_layers(&self, tank: &str) -> Result<LayerTemperatures> {
        let url = self.url(&["text", &self.location, tank]);
        self.get_json(url, Vec::new()).await
    }

    pub async fn tank_temperature(&self, tank: &str, window: &TimeWindow) -> Result<Vec<LayerSample>> {
        let url = self.url(&["temp", &self.location, tank]);
        self.get_json(url, window.query(&self.user_timezone)).await
    }

    pub async fn server_overview(&self, tank: &str, server: &str) -> Result<ServerOverview> {
        let url = self.url(&["overview", &self.location, tank, server]);
        self.get_json(url, Vec::new()).await
    }

    pub async fn physical_summary(&self, tank: &str, server: &str) -> Result<PhysicalSummary> {
        let url = self.url(&["physical-server", "overview", &self.location, tank, server]);
        self.get_json(url, Vec::new()).await
    }

    pub async fn physical_ram(
        &self,
        tank: &str,
        server: &str,
        window: &TimeWindow,
    ) -> Result<Vec<RamSample>> {
        let url = self.url(&["ram", "physical-server", &self.location, tank, server]);
        self.get_json(url, window.query(&self.user_timezone)).await
    }

    pub async fn physical_cpu(
        &self,
        tank: &str,
        server: &str,
        window: &TimeWindow,
    ) -> Result<Vec<CpuSample>> {
        let url = self.url(&["cpu", "physical-server", &self.location, tank, server]);
        self.get_json(url, window.query(&self.user_timezone)).await
    }

    pub async fn physical_disk(&self, tank: &str, server: &str) -> Result<DiskUsage> {
        let url = self.url(&["physical_server", "disk", &self.location, tank, server]);
        self.get_json(url, Vec::new()).await
    }

    pub async fn physical_temperature(
        &self,
        tank: &str,
        server: &str,
        window: &TimeWindow,
    ) -> Result<Vec<TemperatureSeries>> {
        let url = self.url(&["temperature", "physical-server", &self.location, tank, server]);
        self.get_json(url, window.query(&self.user_timezone)).await
    }

    pub async fn vm_overview(
        &self,
        tank: &str,
        server: &str,
        vm: &str,
        picked: Option<&Timestamp>,
    ) -> Result<VmOverview> {
        let url = self.url(&["get_info", "specific_time", &self.location, tank, server, vm]);

        let mut query = vec![("user_timezone", self.user_timezone.clone())];
        if let Some(picked) = picked {
            query.push(("timepick", picked.as_str().to_string()));
        }

        self.get_json(url, query).await
    }

    pub async fn vm_cpu(
        &self,
        tank: &str,
        server: &str,
        vm: &str,
        window: &TimeWindow,
    ) -> Result<Vec<VmCpuSample>> {
        let url = self.url(&["cpu-usage", "virtual-server", &self.location, tank, server, vm]);
        self.get_json(url, window.query(&self.user_timezone)).await
    }

    pub async fn vm_ram(
        &self,
        tank: &str,
        server: &str,
        vm: &str,
        window: &TimeWindow,
    ) -> Result<Vec<VmRamSample>> {
        let url = self.url(&["ram-usage", "virtual-server", &self.location, tank, server, vm]);
        self.get_json(url, window.query(&self.user_timezone)).await
    }

    pub async fn vm_disk(&self, tank: &str, server: &str, vm: &str) -> Result<VmDiskUsage> {
        let url = self.url(&["disk-usage", "by-virtual_server", &self.location, tank, server, vm]);
        self.get_json(url, Vec::new()).await
    }

    pub async fn server_details(&self, host: &str) -> Result<ServerDetails> {
        let url = self.url(&["server-details", host]);
        self.get_json(url, Vec::new()).await
    }

    pub async fn host_load(&self, host: &str, date: NaiveDate) -> Result<Vec<LoadRecord>> {
        let url = self.url(&["cpu-usage", "by-server", host]);
        self.get_json(url, self.date_query(date)).await
    }

    pub async fn host_ram(&self, host: &str, date: NaiveDate) -> Result<Vec<RamRecord>> {
        let url = self.url(&["ram-usage", "by-server", host]);
        self.get_json(url, self.date_query(date)).await
    }

    pub async fn host_core_temperature(
        &self,
        host: &str,
        adapter: &str,
        core: &str,
        date: NaiveDate,
    ) -> Result<Vec<CoreTemperatureRecord>> {
        let url = self.url(&["cpu-temperature", "by-server", host]);

        let mut query = vec![("adapter", adapter.to_string()), ("core", core.to_string())];
        query.extend(self.date_query(date));

        self.get_json(url, query).await
    }

    /// Disk stat history for one disk, newest record first.
    pub async fn host_disk(&self, host: &str, disk: &str) -> Result<Vec<DiskStatRecord>> {
        let url = self.url(&["disk-stats", "by-server-and-disk", host, disk]);
        self.get_json(url, Vec::new()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> TelemetryClient {
        TelemetryClient::new(ApiConfig {
            base_url: base_url.into(),
            location: "north site".into(),
            user_timezone: "UTC".into(),
            timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    #[test]
    fn url_encodes_segments() {
        let client = client("http://telemetry.local/api/");

        assert_eq!(
            client.url(&["virtual_server", "north site", "1", "vm/01"]),
            "http://telemetry.local/api/virtual_server/north%20site/1/vm%2F01"
        );
    }

    #[test]
    fn date_query_includes_timezone() {
        let client = client("http://telemetry.local");
        let date = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();

        assert_eq!(
            client.date_query(date),
            vec![("date", "2025-07-01".to_string()), ("user_timezone", "UTC".to_string())]
        );
    }
}
