use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tokio::sync::watch;
use tower::ServiceExt;

use recap_llm::{ChatClient, ChatRequest, ChatResponse};
use recap_persist::{InMemoryPersistence, PersistenceClient};
use recap_pipeline::{Pipeline, PipelineConfig};
use recap_queue::{
    InMemoryQueue, Job, JobEvent, JobQueue, JobSettings, JobState, QueueError, Worker, WorkerConfig,
};
use recap_types::{JobPayload, JobResult, Meeting, ProcessingStatus, ProgressEvent};
use recap_worker::{build_router, config::Config, handler::PipelineJobHandler, state::AppState};

const CONFIG: &str = r#"
    [server]
    host = "127.0.0.1"
    port = 0

    [mongodb]
    database = "recap-test"

    [llm]

    [logging]
    level = "debug"
    format = "pretty"
"#;

struct StaticChat;

#[async_trait]
impl ChatClient for StaticChat {
    async fn chat(&self, request: ChatRequest) -> recap_llm::Result<ChatResponse> {
        Ok(ChatResponse {
            content: Some(
                r#"{"overview": "Planning", "actionItems": [{"title": "Book venue", "priority": "low"}]}"#.to_string(),
            ),
            model: request.model,
            usage: None,
            finish_reason: Some("stop".to_string()),
            raw: Value::Null,
        })
    }
    
    fn provider_name(&self) -> &str {
        "static"
    }
}

/// Queue whose backend is unreachable
struct DownQueue;

#[async_trait]
impl JobQueue for DownQueue {
    async fn enqueue(&self, _payload: JobPayload) -> recap_queue::Result<Job> {
        Err(down())
    }
    async fn get_job(&self, _job_id: &str) -> recap_queue::Result<Option<Job>> {
        Err(down())
    }
    async fn list_jobs(&self, _states: &[JobState]) -> recap_queue::Result<Vec<Job>> {
        Err(down())
    }
    async fn find_open_job(&self, _meeting_id: &str) -> recap_queue::Result<Option<Job>> {
        Err(down())
    }
    async fn claim_next(&self) -> recap_queue::Result<Option<Job>> {
        Err(down())
    }
    async fn update_progress(&self, _job_id: &str, _progress: ProgressEvent) -> recap_queue::Result<()> {
        Err(down())
    }
    async fn complete(&self, _job_id: &str, _result: JobResult) -> recap_queue::Result<Job> {
        Err(down())
    }
    async fn fail(&self, _job_id: &str, _reason: &str, _unrecoverable: bool) -> recap_queue::Result<Job> {
        Err(down())
    }
    async fn recover_stalled(&self) -> recap_queue::Result<Vec<Job>> {
        Err(down())
    }
    async fn ping(&self) -> recap_queue::Result<()> {
        Err(down())
    }
}

fn down() -> QueueError {
    QueueError::Unavailable("connection refused".to_string())
}

fn app(queue: Arc<dyn JobQueue>, store: Arc<InMemoryPersistence>) -> axum::Router {
    let config = Config::from_toml(CONFIG).unwrap();
    build_router(Arc::new(AppState::new(config, queue, store)))
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(json) => Body::from(json.to_string()),
            None => Body::empty(),
        })
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_enqueue_refuses_second_open_job() {
    let store = Arc::new(InMemoryPersistence::new());
    store.insert_meeting(Meeting::new("m1").with_video("https://cdn.example.com/m1.mp4")).await;
    let app = app(Arc::new(InMemoryQueue::default()), store);

    let (status, created) = send(&app, "POST", "/jobs", Some(json!({"meetingId": "m1"}))).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(created["state"], "waiting");
    assert_eq!(created["meetingId"], "m1");

    let (status, body) = send(&app, "POST", "/jobs", Some(json!({"meetingId": "m1", "regenerate": true}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains(created["jobId"].as_str().unwrap()));

    let job_uri = format!("/jobs/{}", created["jobId"].as_str().unwrap());
    let (status, job) = send(&app, "GET", &job_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(job["attemptsMade"], 0);

    let (status, open) = send(&app, "GET", "/jobs?state=waiting,active", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(open.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_meeting_and_job() {
    let app = app(Arc::new(InMemoryQueue::default()), Arc::new(InMemoryPersistence::new()));

    let (status, _) = send(&app, "POST", "/jobs", Some(json!({"meetingId": "ghost"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "POST", "/jobs", Some(json!({"meetingId": "  "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/jobs/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unreachable_queue_answers_503() {
    let store = Arc::new(InMemoryPersistence::new());
    store.insert_meeting(Meeting::new("m1")).await;
    let app = app(Arc::new(DownQueue), store);

    let (status, body) = send(&app, "POST", "/jobs", Some(json!({"meetingId": "m1"}))).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Queue unavailable");

    let (status, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["services"]["queue"], "disconnected");
    assert_eq!(health["services"]["storage"], "connected");
}

#[tokio::test]
async fn test_health_reports_connected_backends() {
    let app = app(Arc::new(InMemoryQueue::default()), Arc::new(InMemoryPersistence::new()));
    let (status, health) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
}

#[tokio::test]
async fn test_worker_runs_pipeline_for_queued_job() {
    let store = Arc::new(InMemoryPersistence::new());
    store.insert_meeting(Meeting::new("m1").with_video("https://cdn.example.com/m1.mp4")).await;
    let queue: Arc<dyn JobQueue> = Arc::new(InMemoryQueue::new(JobSettings::default()));

    let pipeline = Pipeline::builder()
        .store(store.clone())
        .chat_client(Arc::new(StaticChat))
        .config(PipelineConfig::default())
        .build()
        .unwrap();
    let worker = Arc::new(Worker::new(
        queue.clone(),
        Arc::new(PipelineJobHandler::new(Arc::new(pipeline))),
        WorkerConfig {
            concurrency: 1,
            poll_interval_ms: 10,
            stalled_check_interval_ms: 60_000,
        },
    ));
    let mut events = worker.subscribe();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let runner = {
        let worker = Arc::clone(&worker);
        tokio::spawn(async move { worker.run(shutdown_rx).await })
    };

    let job = queue.enqueue(JobPayload::new("m1")).await.unwrap();

    let completed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(JobEvent::Completed { job_id, result, .. }) = events.recv().await {
                break (job_id, result);
            }
        }
    })
    .await
    .unwrap();

    shutdown_tx.send(true).unwrap();
    runner.await.unwrap().unwrap();

    assert_eq!(completed.0, job.id);
    assert_eq!(completed.1.version, 1);
    assert_eq!(completed.1.action_items_created, 1);

    let stored = queue.get_job(&job.id).await.unwrap().unwrap();
    assert_eq!(stored.state, JobState::Completed);
    assert_eq!(stored.progress.map(|p| p.percentage), Some(100));

    let meeting = store.get_meeting("m1").await.unwrap().unwrap();
    assert_eq!(meeting.processing_status, ProcessingStatus::Completed);
}
