use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::{ModelStatus, ProjectId};
use crate::services::StatusApi;
use crate::utils::config::Config;
use crate::utils::error::Result;
use crate::workers::task::TaskHandle;

/// Configuration du polling de l'état des modèles
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Délai fixe entre la fin d'un rafraîchissement et le suivant
    pub poll_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(5000),
        }
    }
}

impl From<&Config> for MonitorConfig {
    fn from(config: &Config) -> Self {
        Self {
            poll_interval: config.status_poll_interval(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Liste remplacée, avec le nombre de modèles reçus
    Updated(usize),
    AlreadyRunning,
}

/// Publie le dernier état des modèles d'un projet
pub struct ModelStatusMonitor {
    api: Arc<dyn StatusApi>,
    config: MonitorConfig,
    models: watch::Sender<Vec<ModelStatus>>,
    refreshing: AtomicBool,
    consecutive_failures: AtomicU32,
}

/// Libère le verrou de rafraîchissement, même si la requête est abandonnée
struct RefreshGuard<'a>(&'a AtomicBool);

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ModelStatusMonitor {
    pub fn new(api: Arc<dyn StatusApi>, config: MonitorConfig) -> Self {
        let (models, _) = watch::channel(Vec::new());

        Self {
            api,
            config,
            models,
            refreshing: AtomicBool::new(false),
            consecutive_failures: AtomicU32::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<ModelStatus>> {
        self.models.subscribe()
    }

    pub fn latest(&self) -> Vec<ModelStatus> {
        self.models.borrow().clone()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::SeqCst)
    }

    /// Un rafraîchissement: la liste affichée est remplacée en entier en cas de succès,
    /// laissée intacte en cas d'échec.
    pub async fn refresh_status(&self, project_id: ProjectId) -> Result<RefreshOutcome> {
        if self.refreshing.swap(true, Ordering::SeqCst) {
            debug!(project_id, "status refresh already in flight, request dropped");
            return Ok(RefreshOutcome::AlreadyRunning);
        }
        let guard = RefreshGuard(&self.refreshing);

        let result = self.api.project_status(project_id).await;
        drop(guard);

        match result {
            Ok(models) => {
                let count = models.len();
                self.consecutive_failures.store(0, Ordering::SeqCst);
                debug!(project_id, models = count, "model status refreshed");

                self.models.send_replace(models);
                Ok(RefreshOutcome::Updated(count))
            }
            Err(e) => {
                let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                warn!(project_id, failures, error = %e, "model status refresh failed");
                Err(e)
            }
        }
    }

    /// Polling sans fin: chaque rafraîchissement, réussi ou non, réarme le suivant
    pub fn start(self: &Arc<Self>, project_id: ProjectId) -> TaskHandle {
        let monitor = Arc::clone(self);

        TaskHandle::spawn("model_status", move |mut cancel| async move {
            let interval = monitor.config.poll_interval;
            info!(project_id, interval_ms = interval.as_millis() as u64, "model status polling started");

            loop {
                // Échec déjà journalisé
                let _ = monitor.refresh_status(project_id).await;

                if !cancel.sleep(interval).await {
                    break;
                }
            }

            info!(project_id, "model status polling stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{init_test_logging, model_status, settle, FakeStatusApi};

    const POLL: Duration = Duration::from_millis(5000);

    fn monitor_with(api: &Arc<FakeStatusApi>) -> Arc<ModelStatusMonitor> {
        init_test_logging();
        Arc::new(ModelStatusMonitor::new(api.clone(), MonitorConfig::default()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_replaces_whole_list() {
        let api = Arc::new(FakeStatusApi::new());
        api.push_models(vec![model_status("a", true), model_status("b", false)]);
        api.push_models(vec![model_status("c", true)]);
        let monitor = monitor_with(&api);

        assert_eq!(monitor.refresh_status(4).await.unwrap(), RefreshOutcome::Updated(2));
        assert_eq!(monitor.latest().len(), 2);

        assert_eq!(monitor.refresh_status(4).await.unwrap(), RefreshOutcome::Updated(1));
        assert_eq!(monitor.latest(), vec![model_status("c", true)]);
        assert_eq!(api.projects_seen(), vec![4, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_previous_list() {
        let api = Arc::new(FakeStatusApi::new());
        api.push_models(vec![model_status("a", true)]);
        api.push_failure();
        let monitor = monitor_with(&api);

        monitor.refresh_status(1).await.unwrap();
        assert!(monitor.refresh_status(1).await.is_err());

        assert_eq!(monitor.latest(), vec![model_status("a", true)]);
        assert_eq!(monitor.consecutive_failures(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_survives_failures_at_fixed_interval() {
        let api = Arc::new(FakeStatusApi::new());
        api.push_failure();
        api.push_failure();
        api.push_models(vec![model_status("a", true)]);
        let monitor = monitor_with(&api);

        let handle = monitor.start(2);
        settle().await;
        assert_eq!(api.calls(), 1);
        assert!(monitor.latest().is_empty());

        tokio::time::sleep(POLL).await;
        assert_eq!(api.calls(), 2);
        assert_eq!(monitor.consecutive_failures(), 2);

        tokio::time::sleep(POLL).await;
        assert_eq!(api.calls(), 3);
        assert_eq!(monitor.latest(), vec![model_status("a", true)]);
        assert_eq!(monitor.consecutive_failures(), 0);

        let times = api.call_times();
        for pair in times.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= POLL && gap < POLL + Duration::from_millis(50), "gap {:?}", gap);
        }

        handle.cancel();
        handle.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_polling() {
        let api = Arc::new(FakeStatusApi::new());
        let monitor = monitor_with(&api);

        let handle = monitor.start(2);
        settle().await;
        handle.cancel();
        handle.join().await;

        tokio::time::sleep(POLL * 4).await;
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_refresh_is_dropped() {
        let api = Arc::new(FakeStatusApi::new().with_delay(Duration::from_millis(200)));
        api.push_models(vec![model_status("a", true)]);
        let monitor = monitor_with(&api);

        let background = {
            let monitor = monitor.clone();
            tokio::spawn(async move { monitor.refresh_status(5).await })
        };
        settle().await;

        assert_eq!(monitor.refresh_status(5).await.unwrap(), RefreshOutcome::AlreadyRunning);
        assert_eq!(background.await.unwrap().unwrap(), RefreshOutcome::Updated(1));
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_receive_snapshot() {
        let api = Arc::new(FakeStatusApi::new());
        api.push_models(vec![model_status("a", false)]);
        let monitor = monitor_with(&api);
        let mut rx = monitor.subscribe();

        let _handle = monitor.start(7);
        rx.changed().await.unwrap();

        assert_eq!(*rx.borrow_and_update(), vec![model_status("a", false)]);
    }
}
