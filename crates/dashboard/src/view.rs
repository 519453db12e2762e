use std::time::Duration;

use config::dashboard::PollingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorTab {
    Disk,
    Ram,
    CpuTemperature,
    CpuUsage,
}

impl MonitorTab {
    pub const ALL: [Self; 4] = [Self::Disk, Self::Ram, Self::CpuTemperature, Self::CpuUsage];

    pub fn slug(self) -> &'static str {
        match self {
            Self::Disk => "disk",
            Self::Ram => "ram",
            Self::CpuTemperature => "cpu-temperature",
            Self::CpuUsage => "cpu-usage",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tab| tab.slug() == slug)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Disk => "Disk",
            Self::Ram => "RAM",
            Self::CpuTemperature => "CPU Temperature",
            Self::CpuUsage => "CPU Usage",
        }
    }
}

/// What a session is currently looking at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Tank {
        tank: String,
    },
    PhysicalServer {
        tank: String,
        server: String,
    },
    VirtualServer {
        tank: String,
        server: String,
        vm: String,
    },
    Monitor {
        tab: MonitorTab,
    },
}

fn enc(segment: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(segment)
}

/// Restricts `raw` to characters that are safe in a DOM id.
pub fn sanitize_id(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '_' | '-' => c,
            _ => '-',
        })
        .collect()
}

impl View {
    pub fn path(&self) -> String {
        match self {
            Self::Tank { tank } => format!("/tank/{}", enc(tank)),
            Self::PhysicalServer { tank, server } => {
                format!("/tank/{}/server/{}", enc(tank), enc(server))
            }
            Self::VirtualServer { tank, server, vm } => {
                format!("/tank/{}/server/{}/vm/{}", enc(tank), enc(server), enc(vm))
            }
            Self::Monitor { tab } => format!("/monitor/{}", tab.slug()),
        }
    }

    pub fn live_path(&self) -> String {
        self.path() + "/live"
    }

    pub fn title(&self) -> String {
        match self {
            Self::Tank { tank } => format!("Tank {tank}"),
            Self::PhysicalServer { tank, server } => format!("Tank {tank} / Server {server}"),
            Self::VirtualServer { tank, server, vm } => {
                format!("Tank {tank} / Server {server} / {vm}")
            }
            Self::Monitor { tab } => format!("Host Monitor: {}", tab.label()),
        }
    }

    /// Element id for a widget of this view, e.g. `1_pve-01_web_ram_chart`.
    pub fn dom_id(&self, widget: &str) -> String {
        let mut id = match self {
            Self::Tank { tank } => tank.clone(),
            Self::PhysicalServer { tank, server } => format!("{tank}_{server}"),
            Self::VirtualServer { tank, server, vm } => format!("{tank}_{server}_{vm}"),
            Self::Monitor { tab } => format!("monitor_{}", tab.slug()),
        };
        id.push('_');
        id.push_str(widget);

        sanitize_id(&id)
    }

    pub fn cadence(&self, polling: &PollingConfig) -> Duration {
        match self {
            Self::Tank { .. } => polling.tank,
            Self::PhysicalServer { .. } => polling.physical_server,
            Self::VirtualServer { .. } => polling.virtual_server,
            Self::Monitor { .. } => polling.monitor,
        }
    }

    pub fn tank(&self) -> Option<&str> {
        match self {
            Self::Tank { tank }
            | Self::PhysicalServer { tank, .. }
            | Self::VirtualServer { tank, .. } => Some(tank),
            Self::Monitor { .. } => None,
        }
    }

    pub fn server(&self) -> Option<&str> {
        match self {
            Self::PhysicalServer { server, .. } | Self::VirtualServer { server, .. } => Some(server),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vm() -> View {
        View::VirtualServer {
            tank: "1".into(),
            server: "pve 01".into(),
            vm: "web.prod".into(),
        }
    }

    #[test]
    fn paths_are_encoded() {
        assert_eq!(vm().path(), "/tank/1/server/pve%2001/vm/web.prod");
        assert_eq!(vm().live_path(), "/tank/1/server/pve%2001/vm/web.prod/live");
        assert_eq!(
            View::Monitor {
                tab: MonitorTab::CpuTemperature
            }
            .path(),
            "/monitor/cpu-temperature"
        );
    }

    #[test]
    fn dom_ids_follow_hierarchy() {
        assert_eq!(vm().dom_id("ram_chart"), "1_pve-01_web-prod_ram_chart");
        assert_eq!(
            View::Tank { tank: "3".into() }.dom_id("layers"),
            "3_layers"
        );
    }

    #[test]
    fn tabs_round_trip_slugs() {
        for tab in MonitorTab::ALL {
            assert_eq!(MonitorTab::from_slug(tab.slug()), Some(tab));
        }
        assert_eq!(MonitorTab::from_slug("network"), None);
    }

    #[test]
    fn cadence_per_view_kind() {
        let polling = PollingConfig::default();

        assert_eq!(vm().cadence(&polling), polling.virtual_server);
        assert_eq!(
            View::Tank { tank: "1".into() }.cadence(&polling),
            polling.tank
        );
    }
}
