use std::{fmt::Display, sync::Arc};

use anyhow::Result;
use chrono::NaiveDate;
use config::dashboard::MonitorConfig;
use futures_util::future::join_all;
use log::{debug, warn};
use telemetry::{
    TelemetryClient, TimeWindow, Timestamp, filter_by_interval,
    timestamp::{Timestamped, sort_chronologically},
    types::{
        CoreTemperatureRecord, CpuSample, DiskStatRecord, DiskUsage, LayerSample,
        LayerTemperatures, LoadRecord, PhysicalSummary, RamRecord, RamSample, ServerDetails,
        ServerEntry, ServerOverview, TemperatureSeries, VmCpuSample, VmDiskUsage, VmOverview,
        VmRamSample,
    },
};

use crate::{
    AppState,
    poller::PollHandle,
    view::{MonitorTab, View},
};

/// Everything a poller needs to fetch one view.
#[derive(Debug, Clone, PartialEq)]
pub struct PollParams {
    pub view: View,
    pub window: TimeWindow,
    pub picked: Option<Timestamp>,
    pub monitor_date: NaiveDate,
}

/// One poll's worth of data for a view. Failed fetches are `None`.
#[derive(Debug)]
pub enum Snapshot {
    Tank(TankSnapshot),
    PhysicalServer(PhysicalSnapshot),
    VirtualServer(VirtualSnapshot),
    Monitor(MonitorSnapshot),
}

#[derive(Debug)]
pub struct TankSnapshot {
    pub layers: Option<LayerTemperatures>,
    pub history: Option<Vec<LayerSample>>,
    pub servers: Option<Vec<ServerCard>>,
}

#[derive(Debug)]
pub struct ServerCard {
    pub entry: ServerEntry,
    pub overview: Option<ServerOverview>,
}

#[derive(Debug)]
pub struct PhysicalSnapshot {
    pub temperatures: Option<Vec<TemperatureSeries>>,
    pub summary: Option<PhysicalSummary>,
    pub ram: Option<Vec<RamSample>>,
    pub cpu: Option<Vec<CpuSample>>,
    pub disk: Option<DiskUsage>,
    pub vms: Option<Vec<VmCard>>,
}

#[derive(Debug)]
pub struct VmCard {
    pub name: String,
    pub overview: Option<VmOverview>,
    pub disk: Option<VmDiskUsage>,
}

#[derive(Debug)]
pub struct VirtualSnapshot {
    pub overview: Option<VmOverview>,
    pub disk: Option<VmDiskUsage>,
    pub ram: Option<Vec<VmRamSample>>,
    pub cpu: Option<Vec<VmCpuSample>>,
}

#[derive(Debug)]
pub struct MonitorSnapshot {
    pub tab: MonitorTab,
    pub hosts: Vec<HostReading>,
}

#[derive(Debug)]
pub struct HostReading {
    pub id: String,
    pub details: Option<ServerDetails>,
    pub data: HostData,
}

#[derive(Debug)]
pub enum HostData {
    Disk(Vec<(String, Option<Vec<DiskStatRecord>>)>),
    Ram(Option<Vec<RamRecord>>),
    CpuTemperature(Vec<(String, Option<Vec<CoreTemperatureRecord>>)>),
    CpuUsage(Option<Vec<LoadRecord>>),
}

fn logged<T>(what: impl Display, res: Result<T>) -> Option<T> {
    match res {
        Ok(val) => Some(val),
        Err(err) => {
            warn!("Failed to fetch {what}: {err:#}");
            None
        }
    }
}

fn sorted<T: Timestamped>(mut samples: Vec<T>) -> Vec<T> {
    sort_chronologically(&mut samples);
    samples
}

pub fn start_poller(state: &AppState, params: PollParams) -> PollHandle<Snapshot> {
    let cadence = params.view.cadence(&state.config.polling);
    let client = state.client.clone();
    let monitor: &'static MonitorConfig = &state.config.monitor;
    let params = Arc::new(params);

    debug!(
        "Starting poller for {} every {}",
        params.view.path(),
        humantime::format_duration(cadence)
    );

    PollHandle::spawn(cadence, move || {
        fetch(client.clone(), params.clone(), monitor)
    })
}

pub async fn fetch(
    client: TelemetryClient,
    params: Arc<PollParams>,
    monitor: &'static MonitorConfig,
) -> Snapshot {
    let window = &params.window;

    match &params.view {
        View::Tank { tank } => Snapshot::Tank(TankSnapshot::fetch(&client, tank, window).await),
        View::PhysicalServer { tank, server } => Snapshot::PhysicalServer(
            PhysicalSnapshot::fetch(&client, tank, server, window).await,
        ),
        View::VirtualServer { tank, server, vm } => Snapshot::VirtualServer(
            VirtualSnapshot::fetch(&client, tank, server, vm, window, params.picked.as_ref()).await,
        ),
        View::Monitor { tab } => Snapshot::Monitor(
            MonitorSnapshot::fetch(&client, *tab, monitor, params.monitor_date).await,
        ),
    }
}

impl TankSnapshot {
    async fn fetch(client: &TelemetryClient, tank: &str, window: &TimeWindow) -> Self {
        let (layers, history, servers) = tokio::join!(
            client.tank_layers(tank),
            client.tank_temperature(tank, window),
            client.servers(tank),
        );

        let servers = logged(format_args!("servers of tank {tank}"), servers);
        let servers = match servers {
            Some(servers) => Some(
                join_all(servers.into_iter().map(|entry| async move {
                    let overview = client.server_overview(tank, &entry.server).await;
                    let overview = logged(format_args!("overview of server {}", entry.server), overview);

                    ServerCard { entry, overview }
                }))
                .await,
            ),
            None => None,
        };

        Self {
            layers: logged(format_args!("layer temperatures of tank {tank}"), layers),
            history: logged(format_args!("temperature history of tank {tank}"), history)
                .map(|samples| filter_by_interval(samples, window.gap)),
            servers,
        }
    }
}

impl PhysicalSnapshot {
    async fn fetch(client: &TelemetryClient, tank: &str, server: &str, window: &TimeWindow) -> Self {
        let (temperatures, summary, ram, cpu, disk, vms) = tokio::join!(
            client.physical_temperature(tank, server, window),
            client.physical_summary(tank, server),
            client.physical_ram(tank, server, window),
            client.physical_cpu(tank, server, window),
            client.physical_disk(tank, server),
            client.virtual_servers(tank, server),
        );

        let vms = logged(format_args!("virtual servers of {server}"), vms);
        let vms = match vms {
            Some(vms) => Some(
                join_all(vms.into_iter().map(|vm| async move {
                    let (overview, disk) = tokio::join!(
                        client.vm_overview(tank, server, &vm.name, None),
                        client.vm_disk(tank, server, &vm.name),
                    );
                    let overview = logged(format_args!("overview of {}", vm.name), overview);
                    let disk = logged(format_args!("disk usage of {}", vm.name), disk);

                    VmCard {
                        name: vm.name,
                        overview,
                        disk,
                    }
                }))
                .await,
            ),
            None => None,
        };

        let temperatures = logged(format_args!("temperatures of {server}"), temperatures).map(|all| {
            all.into_iter()
                .map(|mut series| {
                    series.data = filter_by_interval(std::mem::take(&mut series.data), window.gap);
                    series
                })
                .collect()
        });

        Self {
            temperatures,
            summary: logged(format_args!("summary of {server}"), summary),
            ram: logged(format_args!("RAM history of {server}"), ram)
                .map(|samples| filter_by_interval(samples, window.gap)),
            cpu: logged(format_args!("CPU history of {server}"), cpu)
                .map(|samples| filter_by_interval(samples, window.gap)),
            disk: logged(format_args!("disk usage of {server}"), disk),
            vms,
        }
    }
}

impl VirtualSnapshot {
    async fn fetch(
        client: &TelemetryClient,
        tank: &str,
        server: &str,
        vm: &str,
        window: &TimeWindow,
        picked: Option<&Timestamp>,
    ) -> Self {
        let (overview, disk, ram, cpu) = tokio::join!(
            client.vm_overview(tank, server, vm, picked),
            client.vm_disk(tank, server, vm),
            client.vm_ram(tank, server, vm, window),
            client.vm_cpu(tank, server, vm, window),
        );

        Self {
            overview: logged(format_args!("overview of {vm}"), overview),
            disk: logged(format_args!("disk usage of {vm}"), disk),
            ram: logged(format_args!("RAM history of {vm}"), ram)
                .map(|samples| filter_by_interval(samples, window.gap)),
            cpu: logged(format_args!("CPU history of {vm}"), cpu)
                .map(|samples| filter_by_interval(samples, window.gap)),
        }
    }
}

impl MonitorSnapshot {
    async fn fetch(
        client: &TelemetryClient,
        tab: MonitorTab,
        monitor: &MonitorConfig,
        date: NaiveDate,
    ) -> Self {
        let hosts = join_all(
            monitor
                .servers
                .iter()
                .map(|host| HostReading::fetch(client, tab, monitor, host, date)),
        )
        .await;

        Self { tab, hosts }
    }
}

impl HostReading {
    async fn fetch(
        client: &TelemetryClient,
        tab: MonitorTab,
        monitor: &MonitorConfig,
        host: &str,
        date: NaiveDate,
    ) -> Self {
        let details = client.server_details(host);

        let data = async {
            match tab {
                MonitorTab::Disk => HostData::Disk(
                    join_all(monitor.disks.iter().map(|disk| async move {
                        let records = client.host_disk(host, disk).await;
                        let records = logged(format_args!("disk {disk} of host {host}"), records);

                        (disk.clone(), records.map(sorted))
                    }))
                    .await,
                ),
                MonitorTab::Ram => {
                    let records = client.host_ram(host, date).await;
                    HostData::Ram(logged(format_args!("RAM of host {host}"), records).map(sorted))
                }
                MonitorTab::CpuTemperature => {
                    let cores = monitor.cpu_adapters.iter().flat_map(move |adapter| {
                        monitor.cpu_cores.iter().map(move |core| (adapter, core))
                    });

                    HostData::CpuTemperature(
                        join_all(cores.map(|(adapter, core)| async move {
                            let records = client.host_core_temperature(host, adapter, core, date).await;
                            let records = logged(
                                format_args!("core {core} of {adapter} on host {host}"),
                                records,
                            );

                            (format!("{adapter} core {core}"), records.map(sorted))
                        }))
                        .await,
                    )
                }
                MonitorTab::CpuUsage => {
                    let records = client.host_load(host, date).await;
                    HostData::CpuUsage(logged(format_args!("CPU load of host {host}"), records).map(sorted))
                }
            }
        };

        let (details, data) = tokio::join!(details, data);

        Self {
            id: host.to_string(),
            details: logged(format_args!("details of host {host}"), details),
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::testing::offline_state;

    #[tokio::test]
    async fn unreachable_api_degrades_to_none() {
        let state = offline_state();
        let params = Arc::new(PollParams {
            view: View::PhysicalServer {
                tank: "1".into(),
                server: "pve-01".into(),
            },
            window: TimeWindow::today(),
            picked: None,
            monitor_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        });

        let snapshot = fetch(state.client.clone(), params, &state.config.monitor).await;

        let Snapshot::PhysicalServer(snapshot) = snapshot else {
            panic!("wrong snapshot kind");
        };
        assert!(snapshot.summary.is_none());
        assert!(snapshot.ram.is_none());
        assert!(snapshot.vms.is_none());
    }

    #[tokio::test]
    async fn monitor_without_hosts_is_empty() {
        let state = offline_state();
        let params = PollParams {
            view: View::Monitor {
                tab: MonitorTab::Ram,
            },
            window: TimeWindow::today(),
            picked: None,
            monitor_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        };

        let handle = start_poller(&state, params);
        let snapshot = crate::poller::first_value(handle.subscribe(), Duration::from_secs(5))
            .await
            .unwrap();

        let Snapshot::Monitor(monitor) = &*snapshot else {
            panic!("wrong snapshot kind");
        };
        assert_eq!(monitor.tab, MonitorTab::Ram);
        assert!(monitor.hosts.is_empty());
    }

    #[test]
    fn sorted_orders_records() {
        let records: Vec<DiskStatRecord> = vec![
            DiskStatRecord {
                timestamp: Timestamp::new("2025-07-01 12:00:00"),
                total_bytes: Some(10.),
                used_bytes: Some(6.),
                available_bytes: Some(4.),
                percent_used: Some(60.),
            },
            DiskStatRecord {
                timestamp: Timestamp::new("2025-07-01 11:00:00"),
                total_bytes: Some(10.),
                used_bytes: Some(5.),
                available_bytes: Some(5.),
                percent_used: Some(50.),
            },
        ];

        let records = sorted(records);

        assert_eq!(records[0].used_bytes, Some(5.));
        assert_eq!(records[1].used_bytes, Some(6.));
    }
}
