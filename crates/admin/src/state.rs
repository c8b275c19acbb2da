//! Application state shared across handlers.
//!
//! `AppState` is the single owner of the record snapshot, the outbound
//! clients, and the set of active logins. Handlers get read-only views of
//! the snapshot through [`SyncCache::snapshot`].
//!
//! A login stays active until it logs out or sits idle for longer than the
//! session expiry. A sweeper runs next to the poller and drops idle logins,
//! so the poller stops once nobody is left.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::DashboardConfig;
use crate::error::AppError;
use crate::gemini::GeminiClient;
use crate::services::{CredentialStore, StaticCredentials, SyncCache, SyncPoller};
use crate::sheets::{AppsScriptGateway, SheetSource};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DashboardConfig,
    cache: SyncCache<SheetSource>,
    gateway: AppsScriptGateway,
    credentials: Box<dyn CredentialStore>,
    gemini: Option<GeminiClient>,
    sessions: Mutex<ActiveLogins>,
}

/// Logins currently holding the poller alive.
#[derive(Default)]
struct ActiveLogins {
    /// Ticket to time of last authenticated request.
    tickets: HashMap<Uuid, Instant>,
    poller: Option<SyncPoller>,
    sweeper: Option<JoinHandle<()>>,
}

impl ActiveLogins {
    /// Drop tickets idle for at least `expiry`; returns how many went.
    fn prune(&mut self, expiry: Duration) -> usize {
        let before = self.tickets.len();
        self.tickets.retain(|_, last_seen| last_seen.elapsed() < expiry);
        before - self.tickets.len()
    }

    /// Stop background work once no ticket is left.
    fn stop_if_idle(&mut self) {
        if self.tickets.is_empty() {
            self.stop();
        }
    }

    fn stop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop();
        }
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.abort();
        }
    }
}

impl AppState {
    /// Build the state with the static credential table.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if an HTTP client cannot be built.
    pub fn new(config: DashboardConfig) -> Result<Self, AppError> {
        let credentials = StaticCredentials::new(&config.auth);
        Self::with_credentials(config, credentials)
    }

    /// Build the state with a custom credential source.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if an HTTP client cannot be built.
    pub fn with_credentials(
        config: DashboardConfig,
        credentials: impl CredentialStore + 'static,
    ) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("pkl-monitor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {e}")))?;

        let cache = SyncCache::new(SheetSource::new(http.clone(), config.sheet.csv_url.clone()));
        let gateway = AppsScriptGateway::new(http, &config.sheet);
        let gemini = config
            .gemini()
            .map(GeminiClient::new)
            .transpose()
            .map_err(|e| AppError::Internal(format!("Failed to build Gemini client: {e}")))?;

        if gemini.is_none() {
            info!("GEMINI_API_KEY not set, AI summaries disabled");
        }

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                cache,
                gateway,
                credentials: Box::new(credentials),
                gemini,
                sessions: Mutex::new(ActiveLogins::default()),
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn cache(&self) -> &SyncCache<SheetSource> {
        &self.inner.cache
    }

    #[must_use]
    pub fn gateway(&self) -> &AppsScriptGateway {
        &self.inner.gateway
    }

    #[must_use]
    pub fn credentials(&self) -> &dyn CredentialStore {
        self.inner.credentials.as_ref()
    }

    /// Gemini client, `None` when AI summaries are disabled.
    #[must_use]
    pub fn gemini(&self) -> Option<&GeminiClient> {
        self.inner.gemini.as_ref()
    }

    /// Register a new login and return its ticket.
    ///
    /// Every login triggers a foreground refresh. The first active login
    /// does so by starting the background poller and the idle sweeper.
    pub async fn begin_login(&self) -> Uuid {
        let ticket = Uuid::new_v4();
        let mut sessions = self.inner.sessions.lock().await;
        sessions.tickets.insert(ticket, Instant::now());

        if sessions.poller.is_none() {
            sessions.poller = Some(SyncPoller::spawn(
                self.inner.cache.clone(),
                self.inner.config.sync.interval,
            ));
            sessions.sweeper = Some(self.spawn_sweeper());
        } else {
            let cache = self.inner.cache.clone();
            tokio::spawn(async move {
                cache.refresh(false).await;
            });
        }
        debug!(active = sessions.tickets.len(), "Login registered");
        ticket
    }

    /// Mark `ticket` as active now.
    ///
    /// Returns `false` when the ticket is unknown or has already been idle
    /// past the session expiry; such a ticket is dropped.
    pub async fn touch_login(&self, ticket: Uuid) -> bool {
        let expiry = self.inner.config.auth.session_expiry;
        let mut sessions = self.inner.sessions.lock().await;

        let alive = sessions
            .tickets
            .get(&ticket)
            .is_some_and(|last_seen| last_seen.elapsed() < expiry);
        if alive {
            sessions.tickets.insert(ticket, Instant::now());
        } else {
            sessions.tickets.remove(&ticket);
            sessions.stop_if_idle();
        }
        alive
    }

    /// Release a login ticket. The last one out stops the poller.
    pub async fn end_login(&self, ticket: Uuid) {
        let mut sessions = self.inner.sessions.lock().await;
        sessions.tickets.remove(&ticket);
        sessions.stop_if_idle();
        debug!(active = sessions.tickets.len(), "Login released");
    }

    /// Drop logins idle past the session expiry.
    pub async fn prune_idle_logins(&self) -> usize {
        let mut sessions = self.inner.sessions.lock().await;
        let pruned = sessions.prune(self.inner.config.auth.session_expiry);
        if pruned > 0 {
            info!(pruned, active = sessions.tickets.len(), "Idle logins expired");
            sessions.stop_if_idle();
        }
        pruned
    }

    /// Periodic [`Self::prune_idle_logins`] while any login is active.
    ///
    /// Holds only a weak reference so the state can still be dropped.
    fn spawn_sweeper(&self) -> JoinHandle<()> {
        let period = self
            .inner
            .config
            .auth
            .session_expiry
            .min(self.inner.config.sync.interval);
        let weak: Weak<AppStateInner> = Arc::downgrade(&self.inner);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                Self { inner }.prune_idle_logins().await;
            }
        })
    }

    /// Number of logins currently registered.
    pub async fn active_logins(&self) -> usize {
        self.inner.sessions.lock().await.tickets.len()
    }

    /// Whether the background poller is running.
    pub async fn is_polling(&self) -> bool {
        self.inner.sessions.lock().await.poller.is_some()
    }

    /// Refresh in the foreground once the write delay has passed.
    ///
    /// Called after a dispatched mutation so its effect shows up through
    /// the normal fetch path.
    pub fn schedule_refresh(&self) {
        let cache = self.inner.cache.clone();
        let delay = self.inner.config.sync.write_refresh_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            cache.refresh(false).await;
        });
    }

    /// Stop background work before the process exits.
    pub async fn shutdown(&self) {
        let mut sessions = self.inner.sessions.lock().await;
        sessions.tickets.clear();
        sessions.stop();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const SHEET: &str = "ID,Tanggal,Nama,Kelurahan,Alamat,Jenis,Status\r\n\
                         1,01/02/2026,Dg. Naba,Losari,Jl. Penghibur,Pisang Epe,Sudah Relokasi\r\n";

    /// State pointing at unreachable upstreams unless overridden.
    pub(crate) fn test_config(overrides: &[(&str, &str)]) -> DashboardConfig {
        let mut vars: HashMap<String, String> = HashMap::from([
            (
                "DASHBOARD_ADMIN_PASSWORD".to_string(),
                "aB3$xY9!mK2@nL5#".to_string(),
            ),
            (
                "SHEET_CSV_URL".to_string(),
                "http://127.0.0.1:9/pub?output=csv".to_string(),
            ),
            (
                "APPS_SCRIPT_URL".to_string(),
                "http://127.0.0.1:9/exec".to_string(),
            ),
            ("WRITE_REFRESH_DELAY_MS".to_string(), "10".to_string()),
        ]);
        for (k, v) in overrides {
            vars.insert((*k).to_string(), (*v).to_string());
        }
        DashboardConfig::from_lookup(&move |key: &str| vars.get(key).cloned()).unwrap()
    }

    #[tokio::test]
    async fn test_poller_follows_logins() {
        let state = AppState::new(test_config(&[])).unwrap();
        assert!(!state.is_polling().await);

        let first = state.begin_login().await;
        let second = state.begin_login().await;
        assert!(state.is_polling().await);
        assert_eq!(state.active_logins().await, 2);

        state.end_login(first).await;
        assert!(state.is_polling().await);

        state.end_login(second).await;
        assert!(!state.is_polling().await);
    }

    #[tokio::test]
    async fn test_shutdown_stops_poller() {
        let state = AppState::new(test_config(&[])).unwrap();
        state.begin_login().await;
        state.shutdown().await;
        assert!(!state.is_polling().await);
        assert_eq!(state.active_logins().await, 0);
    }

    #[tokio::test]
    async fn test_gemini_disabled_without_key() {
        let state = AppState::new(test_config(&[])).unwrap();
        assert!(state.gemini().is_none());

        let state = AppState::new(test_config(&[("GEMINI_API_KEY", "AIza-test")])).unwrap();
        assert!(state.gemini().is_some());
    }

    fn with_session_expiry(expiry: Duration) -> AppState {
        let mut config = test_config(&[]);
        config.auth.session_expiry = expiry;
        AppState::new(config).unwrap()
    }

    /// Sheet endpoint that counts how often it is fetched.
    async fn serve_counting_sheet() -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let router = axum::Router::new().route(
            "/pub",
            axum::routing::get(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    SHEET
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{addr}/pub?output=csv"), hits)
    }

    #[tokio::test]
    async fn test_idle_login_expires_and_stops_poller() {
        let state = with_session_expiry(Duration::from_millis(40));
        let ticket = state.begin_login().await;
        assert!(state.is_polling().await);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(state.active_logins().await, 0);
        assert!(!state.is_polling().await);
        assert!(!state.touch_login(ticket).await);
    }

    #[tokio::test]
    async fn test_activity_keeps_login_alive() {
        let state = with_session_expiry(Duration::from_millis(150));
        let ticket = state.begin_login().await;

        for _ in 0..6 {
            tokio::time::sleep(Duration::from_millis(40)).await;
            assert!(state.touch_login(ticket).await);
        }
        assert_eq!(state.active_logins().await, 1);
        assert!(state.is_polling().await);
        state.shutdown().await;
    }

    #[tokio::test]
    async fn test_touch_unknown_ticket() {
        let state = AppState::new(test_config(&[])).unwrap();
        assert!(!state.touch_login(Uuid::new_v4()).await);
        assert_eq!(state.prune_idle_logins().await, 0);
    }

    #[tokio::test]
    async fn test_every_login_refreshes() {
        let (url, hits) = serve_counting_sheet().await;
        let state = AppState::new(test_config(&[("SHEET_CSV_URL", url.as_str())])).unwrap();

        state.begin_login().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // The poller is already running; the second login still refreshes.
        state.begin_login().await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(state.cache().snapshot().await.records.len(), 1);
        state.shutdown().await;
    }
}
