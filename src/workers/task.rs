//! Tâche de fond annulable, utilisée par les boucles qui se réarment après chaque étape.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Signal d'arrêt observé par la boucle entre deux étapes
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Attend l'annulation (ou la disparition du handle)
    pub async fn cancelled(&mut self) {
        loop {
            let cancelled = *self.rx.borrow_and_update();
            if cancelled {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }

    /// Attend `delay`; renvoie `false` si l'annulation arrive avant
    pub async fn sleep(&mut self, delay: Duration) -> bool {
        if self.is_cancelled() {
            return false;
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => true,
            _ = self.cancelled() => false,
        }
    }
}

/// Handle d'une tâche de fond; la tâche est interrompue quand le handle est abandonné
#[derive(Debug)]
pub struct TaskHandle {
    name: &'static str,
    cancel_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl TaskHandle {
    pub fn spawn<F, Fut>(name: &'static str, task: F) -> Self
    where
        F: FnOnce(CancelSignal) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (cancel_tx, rx) = watch::channel(false);
        let handle = tokio::spawn(task(CancelSignal { rx }));

        debug!(task = name, "background task spawned");
        Self {
            name,
            cancel_tx,
            handle: Some(handle),
        }
    }

    /// Demande un arrêt coopératif, effectif à la prochaine attente de la boucle
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_tx.borrow()
    }

    /// Attend la fin de la tâche
    pub async fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                debug!(task = self.name, "background task aborted");
            }
            handle.abort();
        }
    }
}
