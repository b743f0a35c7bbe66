use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use alaf_annotator::{
    AlafClient, AnnotationSession, Config, ModelStatus, ModelStatusMonitor, MonitorConfig,
    SessionConfig, SessionPhase, SessionState, SubmitOutcome, NAME, VERSION,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> alaf_annotator::Result<()> {
    // Chargement de la configuration
    let config = Config::from_env()?;

    // Initialisation du logging
    setup_tracing(&config);
    info!("🚀 Démarrage de {} v{}", NAME, VERSION);
    info!("🔗 Serveur: {} (projet {})", config.server_url, config.project_id);

    let client = Arc::new(AlafClient::from_config(&config)?);

    // Polling de l'état des modèles
    let monitor = Arc::new(ModelStatusMonitor::new(client.clone(), MonitorConfig::from(&config)));
    let poller = monitor.start(config.project_id);
    let status_logger = tokio::spawn(log_model_status(monitor.subscribe()));

    // Session d'annotation
    let session = AnnotationSession::new(client, config.project_id, SessionConfig::from(&config));
    let instance_printer = tokio::spawn(print_instances(session.subscribe()));
    session.start();

    println!("Touches: [a] positif  [l] négatif  [g] passer  [q] quitter");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let Some(key) = line.trim().chars().next() else {
            continue;
        };
        if key.eq_ignore_ascii_case(&'q') {
            break;
        }

        // Code de la touche physique: lettre majuscule
        let key_code = key.to_ascii_uppercase() as u32;
        match session.handle_key(key_code).await {
            Ok(SubmitOutcome::Submitted) => {}
            Ok(SubmitOutcome::NotReady) => warn!("⏳ Aucune instance prête"),
            Ok(SubmitOutcome::UnmappedKey) => warn!(key = %key, "⚠️  Touche sans raccourci"),
            Err(e) => error!("❌ Annotation non envoyée, réessayez: {}", e),
        }
    }

    session.stop();
    poller.cancel();
    poller.join().await;
    status_logger.abort();
    instance_printer.abort();

    info!("✅ Session terminée");
    Ok(())
}

/// Configure le tracing pour le logging structuré
fn setup_tracing(config: &Config) {
    let log_level = config
        .log_level
        .parse()
        .unwrap_or(tracing::Level::INFO);

    let subscriber = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(log_level.into()),
        )
        .with(if config.is_json_logging() {
            Box::new(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            ) as Box<dyn tracing_subscriber::Layer<_> + Send + Sync>
        } else {
            Box::new(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_line_number(true)
                    .with_file(true)
                    .with_writer(std::io::stderr),
            ) as Box<dyn tracing_subscriber::Layer<_> + Send + Sync>
        });

    subscriber.init();
}

/// Affiche chaque instance dès qu'elle devient prête
async fn print_instances(mut rx: watch::Receiver<SessionState>) {
    let mut last_phase = SessionPhase::Idle;

    while rx.changed().await.is_ok() {
        let state = rx.borrow_and_update().clone();
        if state.phase == SessionPhase::Ready && last_phase != SessionPhase::Ready {
            if let Some(instance) = state.current {
                println!("\n[{}] {}", instance.id, instance.text);
            }
        }
        last_phase = state.phase;
    }
}

async fn log_model_status(mut rx: watch::Receiver<Vec<ModelStatus>>) {
    while rx.changed().await.is_ok() {
        let models = rx.borrow_and_update().clone();
        for model in &models {
            let name = model.name().unwrap_or_else(|| "?".to_string());
            info!(
                model = %name,
                state = ?model.state(),
                count = ?model.count(),
                "📊 État du modèle"
            );
        }
    }
}
