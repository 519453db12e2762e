use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

use chrono::{Local, NaiveDate};
use data_encoding::BASE64URL_NOPAD;
use log::debug;
use telemetry::{TimeWindow, Timestamp};

use crate::{
    charts::ChartRegistry,
    poller::{Latest, PollHandle},
    snapshot::{PollParams, Snapshot},
    view::View,
};

pub const SESSION_COOKIE: &str = "session";

const ID_BYTES: usize = 16;

pub fn new_session_id() -> String {
    BASE64URL_NOPAD.encode(&rand::random::<[u8; ID_BYTES]>())
}

pub fn is_valid_session_id(id: &str) -> bool {
    BASE64URL_NOPAD
        .decode(id.as_bytes())
        .is_ok_and(|bytes| bytes.len() == ID_BYTES)
}

/// Per-browser state: what is being viewed, with which time window, and the
/// poller feeding it.
#[derive(Debug)]
pub struct Session {
    view: Option<View>,
    window: TimeWindow,
    picked: Option<Timestamp>,
    monitor_date: NaiveDate,
    charts: ChartRegistry,
    poller: Option<PollHandle<Snapshot>>,
    last_seen: Instant,
}

/// Settings shown in the page controls.
#[derive(Debug, Clone)]
pub struct Controls {
    pub window: TimeWindow,
    pub picked: Option<Timestamp>,
    pub monitor_date: NaiveDate,
}

impl Session {
    pub fn new() -> Self {
        Self {
            view: None,
            window: TimeWindow::today(),
            picked: None,
            monitor_date: Local::now().date_naive(),
            charts: ChartRegistry::new(),
            poller: None,
            last_seen: Instant::now(),
        }
    }

    pub fn view(&self) -> Option<&View> {
        self.view.as_ref()
    }

    pub fn controls(&self) -> Controls {
        Controls {
            window: self.window.clone(),
            picked: self.picked.clone(),
            monitor_date: self.monitor_date,
        }
    }

    pub fn render_parts(&mut self) -> (&mut ChartRegistry, Option<&Timestamp>) {
        (&mut self.charts, self.picked.as_ref())
    }

    /// Switches to `view`. Moving to a different view resets the time window and
    /// the picked time, stops the poller and drops every chart.
    pub fn navigate(&mut self, view: View) -> bool {
        if self.view.as_ref() == Some(&view) {
            return false;
        }

        debug!("Session switching to {}", view.path());

        self.view = Some(view);
        self.window = TimeWindow::today();
        self.picked = None;
        self.poller = None;
        self.charts.clear();

        true
    }

    fn params(&self) -> Option<PollParams> {
        self.view.clone().map(|view| PollParams {
            view,
            window: self.window.clone(),
            picked: self.picked.clone(),
            monitor_date: self.monitor_date,
        })
    }

    /// Navigates to `view` and returns its snapshots, starting a poller if none is running.
    pub fn open<F>(&mut self, view: View, start: F) -> Latest<Snapshot>
    where
        F: FnOnce(PollParams) -> PollHandle<Snapshot>,
    {
        self.navigate(view.clone());

        let params = PollParams {
            view,
            window: self.window.clone(),
            picked: self.picked.clone(),
            monitor_date: self.monitor_date,
        };

        self.poller.get_or_insert_with(|| start(params)).subscribe()
    }

    #[cfg(test)]
    pub fn subscribe(&self) -> Option<Latest<Snapshot>> {
        self.poller.as_ref().map(PollHandle::subscribe)
    }

    /// Replaces the running poller with one using the current parameters.
    pub fn restart<F>(&mut self, start: F)
    where
        F: FnOnce(PollParams) -> PollHandle<Snapshot>,
    {
        // Stop the old poller before the new one makes its first request
        self.poller = None;
        self.poller = self.params().map(start);
    }

    pub fn set_window(&mut self, window: TimeWindow) {
        self.window = window;
    }

    pub fn reset_window(&mut self) {
        self.window = TimeWindow::today();
        self.picked = None;
    }

    pub fn pick(&mut self, picked: Option<Timestamp>) {
        self.picked = picked;
    }

    pub fn set_monitor_date(&mut self, date: NaiveDate) {
        self.monitor_date = date;
        self.picked = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` on the session for `id`, creating it if needed. The lock is held
    /// for the duration of `f`, so `f` must not block.
    pub fn with<R>(&self, id: &str, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut sessions = self.lock();

        let session = sessions.entry(id.to_string()).or_insert_with(|| {
            debug!("Creating session {id}");
            Session::new()
        });
        session.last_seen = Instant::now();

        f(session)
    }

    /// Drops sessions not seen for `idle`, stopping their pollers.
    pub fn sweep(&self, idle: Duration) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();

        sessions.retain(|_, session| session.last_seen.elapsed() < idle);

        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::{
        charts::{ChartSpec, Series},
        pages::graph::Axis,
        snapshot::MonitorSnapshot,
        view::MonitorTab,
    };

    fn tank(id: &str) -> View {
        View::Tank { tank: id.into() }
    }

    fn counting_poller(starts: Arc<AtomicUsize>) -> impl FnOnce(PollParams) -> PollHandle<Snapshot> {
        move |_| {
            starts.fetch_add(1, Ordering::SeqCst);
            PollHandle::spawn(Duration::from_secs(3600), || async {
                Snapshot::Monitor(MonitorSnapshot {
                    tab: MonitorTab::Disk,
                    hosts: Vec::new(),
                })
            })
        }
    }

    #[test]
    fn session_ids_are_validated() {
        let id = new_session_id();

        assert!(is_valid_session_id(&id));
        assert!(!is_valid_session_id("not-a-session"));
        assert!(!is_valid_session_id(""));
    }

    #[tokio::test]
    async fn switching_view_resets_state() {
        let starts = Arc::new(AtomicUsize::new(0));
        let mut session = Session::new();

        session.open(tank("1"), counting_poller(starts.clone()));
        session.pick(Some(Timestamp::new("2025-07-01 10:00:00")));
        session.set_window(TimeWindow::whole_day(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        ));
        let (charts, _) = session.render_parts();
        charts.render(
            "1_layers",
            ChartSpec::line(Axis::Celsius),
            vec![Series::single("L1", "red", 30.)],
        );

        session.open(tank("2"), counting_poller(starts.clone()));

        assert_eq!(session.view(), Some(&tank("2")));
        assert_eq!(session.controls().picked, None);
        assert_eq!(session.controls().window, TimeWindow::today());
        assert!(session.render_parts().0.is_empty());
        assert_eq!(starts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn reopening_same_view_keeps_poller() {
        let starts = Arc::new(AtomicUsize::new(0));
        let mut session = Session::new();

        session.open(tank("1"), counting_poller(starts.clone()));
        session.pick(Some(Timestamp::new("2025-07-01 10:00:00")));
        session.open(tank("1"), counting_poller(starts.clone()));

        assert_eq!(starts.load(Ordering::SeqCst), 1);
        assert!(session.controls().picked.is_some());
    }

    #[tokio::test]
    async fn restart_needs_a_view() {
        let starts = Arc::new(AtomicUsize::new(0));
        let mut session = Session::new();

        session.restart(counting_poller(starts.clone()));
        assert!(session.subscribe().is_none());

        session.open(tank("1"), counting_poller(starts.clone()));
        session.restart(counting_poller(starts.clone()));

        assert!(session.subscribe().is_some());
        assert_eq!(starts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn sweep_removes_idle_sessions() {
        let sessions = SessionRegistry::new();

        sessions.with("a", |_| ());
        sessions.with("b", |_| ());
        assert_eq!(sessions.len(), 2);

        assert_eq!(sessions.sweep(Duration::from_secs(60)), 0);
        assert_eq!(sessions.sweep(Duration::ZERO), 2);
        assert_eq!(sessions.len(), 0);
    }
}
