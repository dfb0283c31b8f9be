use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use recap_llm::ClientFactory;
use recap_persist::{InMemoryPersistence, MongoPersistenceClient, PersistenceClient};
use recap_pipeline::Pipeline;
use recap_queue::{InMemoryQueue, JobEvent, JobQueue, MongoJobQueue, Worker};
use recap_transcribe::create_transcriber;
use recap_worker::{build_router, config::Config, handler::PipelineJobHandler, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();
    
    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    
    init_logging(&config);
    
    tracing::info!("Starting Recap worker");
    
    let (store, queue) = connect_backends(&config).await?;
    
    tracing::info!(provider = ?config.llm.provider, model = %config.pipeline.model, "Initializing LLM client");
    let chat_client = ClientFactory::create_chat_client(config.llm.provider_config(&config.openai_api_key)?)?;
    
    let transcriber = create_transcriber(
        config
            .transcription
            .clone()
            .with_api_key(config.transcription_api_key.clone()),
    )?;
    tracing::info!(provider = %transcriber.provider(), "Transcription provider selected");
    
    let pipeline = Pipeline::builder()
        .store(store.clone())
        .chat_client(chat_client)
        .transcriber(transcriber)
        .config(config.pipeline.clone())
        .build()?;
    
    let worker = Arc::new(Worker::new(
        queue.clone(),
        Arc::new(PipelineJobHandler::new(Arc::new(pipeline))),
        config.queue.worker.clone(),
    ));
    spawn_event_log(worker.subscribe());
    
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker_task = {
        let worker = Arc::clone(&worker);
        tokio::spawn(async move { worker.run(shutdown_rx).await })
    };
    
    let state = Arc::new(AppState::new(config.clone(), queue, store));
    let app = build_router(state);
    
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Admin server listening on {}", addr);
    
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    
    tracing::info!("Shutdown requested");
    let _ = shutdown_tx.send(true);
    worker_task.await??;
    
    Ok(())
}

async fn connect_backends(
    config: &Config,
) -> anyhow::Result<(Arc<dyn PersistenceClient>, Arc<dyn JobQueue>)> {
    if !config.mongodb.enabled {
        tracing::warn!("MongoDB disabled, using in-memory store and queue");
        return Ok((
            Arc::new(InMemoryPersistence::new()),
            Arc::new(InMemoryQueue::new(config.queue.jobs.clone())),
        ));
    }
    
    tracing::info!(database = %config.mongodb.database, "Connecting to MongoDB");
    let store = MongoPersistenceClient::connect(&config.mongodb_uri, &config.mongodb.database).await?;
    let queue = MongoJobQueue::connect(
        &config.mongodb_uri,
        &config.mongodb.database,
        config.queue.jobs.clone(),
    )
    .await?;
    tracing::info!("MongoDB connected");
    
    Ok((Arc::new(store), Arc::new(queue)))
}

/// Forward job lifecycle events to the log
fn spawn_event_log(mut events: tokio::sync::broadcast::Receiver<JobEvent>) {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(JobEvent::Progress { job_id, progress, .. }) => {
                    tracing::debug!(job_id = %job_id, stage = %progress.stage, percentage = progress.percentage, "Job progress");
                }
                Ok(JobEvent::Completed { job_id, meeting_id, result }) => {
                    tracing::info!(job_id = %job_id, meeting_id = %meeting_id, summary_id = %result.summary_id, "Job completed");
                }
                Ok(JobEvent::Failed { job_id, meeting_id, error, will_retry }) => {
                    tracing::warn!(job_id = %job_id, meeting_id = %meeting_id, will_retry, error = %error, "Job failed");
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Job event log lagging");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    
    let registry = tracing_subscriber::registry().with(env_filter);
    
    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
