use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use ephemeropt::EphemeralOption;
use futures_util::future::join_all;
use log::warn;
use maud::{Markup, html};
use telemetry::TelemetryClient;

use crate::view::{MonitorTab, View};

/// Tank → server → virtual server hierarchy. `None` marks a list that failed to load.
#[derive(Debug, Clone, PartialEq)]
pub struct NavTree {
    pub tanks: Option<Vec<TankNode>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TankNode {
    pub id: String,
    pub servers: Option<Vec<ServerNode>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerNode {
    pub id: String,
    pub ip: String,
    pub vms: Option<Vec<String>>,
}

impl NavTree {
    pub async fn fetch(client: &TelemetryClient) -> Self {
        let tanks = match client.tanks().await {
            Ok(tanks) => tanks,
            Err(err) => {
                warn!("Failed to load tanks: {err:#}");
                return Self { tanks: None };
            }
        };

        let tanks = join_all(tanks.into_iter().map(|id| async move {
            let servers = match client.servers(&id).await {
                Ok(servers) => Some(
                    join_all(servers.into_iter().map(|server| {
                        let tank = &id;
                        async move {
                            let vms = match client.virtual_servers(tank, &server.server).await {
                                Ok(vms) => Some(vms.into_iter().map(|vm| vm.name).collect()),
                                Err(err) => {
                                    warn!("Failed to load virtual servers of {}: {err:#}", server.server);
                                    None
                                }
                            };

                            ServerNode {
                                id: server.server,
                                ip: server.ip,
                                vms,
                            }
                        }
                    }))
                    .await,
                ),
                Err(err) => {
                    warn!("Failed to load servers of tank {id}: {err:#}");
                    None
                }
            };

            TankNode { id, servers }
        }))
        .await;

        Self { tanks: Some(tanks) }
    }

    pub fn render(&self, current: Option<&View>) -> Markup {
        let current_tank = current.and_then(View::tank);
        let current_server = current.and_then(View::server);

        html! {
            nav {
                ul .tree {
                    @match &self.tanks {
                        None => li .alert { "Failed to load tanks" },
                        Some(tanks) => {
                            @for tank in tanks {
                                @let view = View::Tank { tank: tank.id.clone() };
                                @let open = current_tank == Some(tank.id.as_str());
                                li .open[open] {
                                    a href=(view.path()) .active[current == Some(&view)] {
                                        "Tank " (tank.id)
                                    }
                                    (tank.render_servers(current, open.then_some(current_server).flatten()))
                                }
                            }
                        }
                    }
                    li .open[matches!(current, Some(View::Monitor { .. }))] {
                        a href=(View::Monitor { tab: MonitorTab::Disk }.path()) { "Host Monitor" }
                        ul {
                            @for tab in MonitorTab::ALL {
                                @let view = View::Monitor { tab };
                                li {
                                    a href=(view.path()) .active[current == Some(&view)] { (tab.label()) }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

impl TankNode {
    fn render_servers(&self, current: Option<&View>, current_server: Option<&str>) -> Markup {
        html! {
            ul {
                @match &self.servers {
                    None => li .alert { "Failed to load servers" },
                    Some(servers) => {
                        @for server in servers {
                            @let view = View::PhysicalServer {
                                tank: self.id.clone(),
                                server: server.id.clone(),
                            };
                            li .open[current_server == Some(server.id.as_str())] {
                                a href=(view.path()) .active[current == Some(&view)] {
                                    "Server " (server.id)
                                    @if !server.ip.is_empty() {
                                        " (" (server.ip) ")"
                                    }
                                }
                                (self.render_vms(server, current))
                            }
                        }
                    }
                }
            }
        }
    }

    fn render_vms(&self, server: &ServerNode, current: Option<&View>) -> Markup {
        html! {
            ul {
                @match &server.vms {
                    None => li .alert { "Failed to load virtual servers" },
                    Some(vms) if vms.is_empty() => li .muted { "No virtual servers found." },
                    Some(vms) => {
                        @for vm in vms {
                            @let view = View::VirtualServer {
                                tank: self.id.clone(),
                                server: server.id.clone(),
                                vm: vm.clone(),
                            };
                            li {
                                a href=(view.path()) .active[current == Some(&view)] { (vm) }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Keeps the last good tree for a while so page renders don't refetch the hierarchy.
pub struct NavCache {
    tree: Mutex<EphemeralOption<Arc<NavTree>>>,
}

impl NavCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tree: Mutex::new(EphemeralOption::new_empty(ttl)),
        }
    }

    pub async fn get(&self, client: &TelemetryClient) -> Arc<NavTree> {
        let cached = self
            .tree
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get()
            .cloned();

        if let Some(tree) = cached {
            return tree;
        }

        let tree = Arc::new(NavTree::fetch(client).await);

        // A failed tank list is retried on the next render
        if tree.tanks.is_some() {
            self.tree
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(tree.clone());
        }

        tree
    }
}
