use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::{Annotation, Instance, InstanceId, ProjectId, Submission};
use crate::services::AnnotationApi;
use crate::utils::config::Config;
use crate::utils::error::Result;
use crate::workers::task::{CancelSignal, TaskHandle};

/// Configuration de la session d'annotation
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Délai fixe avant de retenter la récupération d'une instance
    pub retry_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_millis(1000),
        }
    }
}

impl From<&Config> for SessionConfig {
    fn from(config: &Config) -> Self {
        Self {
            retry_delay: config.retry_delay(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Aucune instance (démarrage ou attente d'une nouvelle tentative)
    #[default]
    Idle,
    Ready,
    Submitting,
    Fetching,
}

/// État publié vers l'affichage
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    pub phase: SessionPhase,
    pub current: Option<Instance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted,
    /// Pas d'instance prête: rien n'est envoyé
    NotReady,
    /// Touche sans raccourci associé
    UnmappedKey,
}

/// Boucle d'annotation: récupère l'instance suivante, envoie les décisions
/// et retente indéfiniment la récupération en cas d'échec.
#[derive(Clone)]
pub struct AnnotationSession {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    api: Arc<dyn AnnotationApi>,
    project_id: ProjectId,
    config: SessionConfig,
    state: watch::Sender<SessionState>,
    // Une seule récupération à la fois, attente de nouvelle tentative comprise
    fetching: AtomicBool,
    // Levé par `stop`: plus aucune récupération, y compris celle enchaînée après un envoi
    stopped: AtomicBool,
    fetch_task: Mutex<Option<TaskHandle>>,
}

impl AnnotationSession {
    pub fn new(api: Arc<dyn AnnotationApi>, project_id: ProjectId, config: SessionConfig) -> Self {
        let (state, _) = watch::channel(SessionState::default());

        Self {
            inner: Arc::new(SessionInner {
                api,
                project_id,
                config,
                state,
                fetching: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                fetch_task: Mutex::new(None),
            }),
        }
    }

    pub fn project_id(&self) -> ProjectId {
        self.inner.project_id
    }

    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.state.borrow().phase
    }

    pub fn current_instance(&self) -> Option<Instance> {
        self.inner.state.borrow().current.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Lance la première récupération
    pub fn start(&self) -> bool {
        self.inner.stopped.store(false, Ordering::SeqCst);
        info!(project_id = self.inner.project_id, "annotation session started");
        self.fetch_next()
    }

    /// Annule la récupération ou l'attente de nouvelle tentative en cours
    pub fn stop(&self) {
        let task = {
            let mut slot = lock(&self.inner.fetch_task);
            self.inner.stopped.store(true, Ordering::SeqCst);
            slot.take()
        };
        if let Some(task) = task {
            task.cancel();
        }
        self.inner.fetching.store(false, Ordering::SeqCst);

        self.inner.state.send_modify(|state| {
            if state.phase == SessionPhase::Fetching {
                state.phase = if state.current.is_some() {
                    SessionPhase::Ready
                } else {
                    SessionPhase::Idle
                };
            }
        });
        info!(project_id = self.inner.project_id, "annotation session stopped");
    }

    /// Demande l'instance suivante en tâche de fond.
    ///
    /// Renvoie `false` quand une récupération est déjà en cours ou que la session
    /// est arrêtée: la demande est ignorée.
    pub fn fetch_next(&self) -> bool {
        let mut slot = lock(&self.inner.fetch_task);

        if self.inner.stopped.load(Ordering::SeqCst) {
            debug!(project_id = self.inner.project_id, "session stopped, fetch request dropped");
            return false;
        }

        if self
            .inner
            .fetching
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(project_id = self.inner.project_id, "fetch already in flight, request dropped");
            return false;
        }

        let weak = Arc::downgrade(&self.inner);
        *slot = Some(TaskHandle::spawn("fetch_next", move |cancel| {
            fetch_until_ready(weak, cancel)
        }));
        true
    }

    /// Envoie une décision pour l'instance courante puis enchaîne sur la suivante.
    ///
    /// En cas d'échec l'instance reste affichée et l'erreur est renvoyée;
    /// aucune nouvelle tentative n'est programmée.
    pub async fn submit(&self, annotation: Annotation) -> Result<SubmitOutcome> {
        let Some(instance_id) = self.claim_current() else {
            debug!(%annotation, "no instance ready, annotation ignored");
            return Ok(SubmitOutcome::NotReady);
        };

        let submission = Submission {
            instance_id,
            annotation,
        };

        match self.inner.api.annotate(&submission).await {
            Ok(()) => {
                info!(
                    project_id = self.inner.project_id,
                    instance_id = %submission.instance_id,
                    %annotation,
                    "annotation submitted"
                );

                let stopped = self.inner.stopped.load(Ordering::SeqCst);
                let cleared = self.inner.state.send_if_modified(|state| {
                    let annotated = state
                        .current
                        .as_ref()
                        .is_some_and(|current| current.id == submission.instance_id);
                    if annotated {
                        state.current = None;
                        state.phase = if stopped {
                            SessionPhase::Idle
                        } else {
                            SessionPhase::Fetching
                        };
                    }
                    annotated
                });

                // Sinon une récupération manuelle a déjà remplacé l'instance
                if cleared && !stopped {
                    self.fetch_next();
                }
                Ok(SubmitOutcome::Submitted)
            }
            Err(e) => {
                warn!(
                    project_id = self.inner.project_id,
                    instance_id = %submission.instance_id,
                    %annotation,
                    error = %e,
                    "annotation submit failed, instance kept"
                );

                self.inner.state.send_modify(|state| {
                    if state.phase == SessionPhase::Submitting {
                        state.phase = SessionPhase::Ready;
                    }
                });
                Err(e)
            }
        }
    }

    pub async fn submit_positive(&self) -> Result<SubmitOutcome> {
        self.submit(Annotation::Positive).await
    }

    pub async fn submit_negative(&self) -> Result<SubmitOutcome> {
        self.submit(Annotation::Negative).await
    }

    pub async fn submit_skip(&self) -> Result<SubmitOutcome> {
        self.submit(Annotation::Skip).await
    }

    /// Raccourcis clavier: A (65) positif, L (76) négatif, G (71) passer
    pub async fn handle_key(&self, key_code: u32) -> Result<SubmitOutcome> {
        match Annotation::from_key_code(key_code) {
            Some(annotation) => self.submit(annotation).await,
            None => Ok(SubmitOutcome::UnmappedKey),
        }
    }

    /// Réserve l'instance courante pour un envoi (Ready -> Submitting)
    fn claim_current(&self) -> Option<InstanceId> {
        let mut claimed = None;
        self.inner.state.send_if_modified(|state| {
            match (state.phase, state.current.as_ref()) {
                (SessionPhase::Ready, Some(instance)) => {
                    claimed = Some(instance.id.clone());
                    state.phase = SessionPhase::Submitting;
                    true
                }
                _ => false,
            }
        });
        claimed
    }
}

async fn fetch_until_ready(weak: Weak<SessionInner>, mut cancel: CancelSignal) {
    loop {
        let Some(inner) = weak.upgrade() else {
            return;
        };

        inner.state.send_modify(|state| state.phase = SessionPhase::Fetching);

        match inner.api.next_instance(inner.project_id).await {
            Ok(instance) => {
                debug!(
                    project_id = inner.project_id,
                    instance_id = %instance.id,
                    "instance ready"
                );

                inner.fetching.store(false, Ordering::SeqCst);
                inner.state.send_modify(|state| {
                    state.current = Some(instance);
                    state.phase = SessionPhase::Ready;
                });
                return;
            }
            Err(e) => {
                let delay = inner.config.retry_delay;
                warn!(
                    project_id = inner.project_id,
                    error = %e,
                    retry_in_ms = delay.as_millis() as u64,
                    "instance fetch failed, retrying"
                );

                inner.state.send_modify(|state| {
                    state.current = None;
                    state.phase = SessionPhase::Idle;
                });
                drop(inner);

                if !cancel.sleep(delay).await {
                    return;
                }
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
