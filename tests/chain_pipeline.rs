//! End-to-end chain tests against a scripted provider.
//!
//! Runs the three steps, observes the event stream and exports the results
//! without touching the network.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use canvas_forge::canvas::{CanvasField, CanvasInput};
use canvas_forge::chain::{
    ChainError, ChainEvent, ChainRunner, ChainSettings, ChainState, ChainStep, SessionContext,
};
use canvas_forge::export::CanvasExporter;
use canvas_forge::llm::{GenerationRequest, GenerationResponse, LlmProvider, TextStream};
use canvas_forge::LlmError;
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Provider replaying one fragment script per call.
struct ScriptedProvider {
    has_key: bool,
    scripts: Vec<Vec<Result<&'static str, &'static str>>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(scripts: Vec<Vec<Result<&'static str, &'static str>>>) -> Self {
        Self {
            has_key: true,
            scripts,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn has_api_key(&self) -> bool {
        self.has_key
    }

    async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        Err(LlmError::RequestFailed("only streaming is scripted".to_string()))
    }

    async fn generate_stream(&self, request: GenerationRequest) -> Result<TextStream, LlmError> {
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts
            .lock()
            .expect("lock")
            .push(request.user_prompt().unwrap_or_default().to_string());

        let items: Vec<Result<String, LlmError>> = self
            .scripts
            .get(idx)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|item| {
                item.map(str::to_string)
                    .map_err(|e| LlmError::RequestFailed(e.to_string()))
            })
            .collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

fn canvas() -> CanvasInput {
    CanvasInput::new()
        .with(CanvasField::ValueProposition, "Same-day repair of used bikes")
        .with(CanvasField::CustomerProfile, "Urban commuters")
}

#[tokio::test]
async fn test_chain_streams_and_exports_combined_report() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        vec![Ok("Initial "), Ok("canvas.")],
        vec![Ok("Pricing is "), Ok("unclear.")],
        vec![Ok("Optimized "), Ok("canvas.")],
    ]));
    let runner = ChainRunner::new(provider.clone(), ChainSettings::default());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = SessionContext::new();
    runner
        .run_with_events(&mut session, &canvas(), tx)
        .await
        .expect("chain should succeed");

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    let buffers: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            ChainEvent::Fragment {
                step: ChainStep::Critique,
                buffer,
                ..
            } => Some(buffer.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(buffers, vec!["Pricing is ", "Pricing is unclear."]);
    assert_eq!(events.last(), Some(&ChainEvent::ChainCompleted));

    assert_eq!(session.state(), ChainState::Done);
    assert_eq!(session.text(ChainStep::Optimize), Some("Optimized canvas."));

    let prompts = provider.prompts.lock().expect("lock").clone();
    assert!(prompts[0].contains("Value proposition:\nSame-day repair of used bikes"));
    assert!(prompts[1].contains("Initial canvas."));
    assert!(prompts[2].contains("Initial canvas."));
    assert!(prompts[2].contains("Pricing is unclear."));

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let exporter = CanvasExporter::new(temp_dir.path());
    let paths = exporter
        .save_combined(&canvas(), &session)
        .await
        .expect("export should succeed");

    let report = std::fs::read_to_string(&paths.report).expect("read report");
    assert!(report.contains("Initial Analysis:\nInitial canvas."));
    assert!(report.contains("Critical Analysis:\nPricing is unclear."));
    assert!(report.contains("Optimized Business Model:\nOptimized canvas."));

    let reloaded = CanvasExporter::load_json(&paths.json).await.expect("reload");
    assert_eq!(reloaded, canvas());
}

#[tokio::test]
async fn test_failed_step_keeps_earlier_results_for_export() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        vec![Ok("Initial canvas.")],
        vec![Ok("Partial"), Err("connection reset")],
    ]));
    let runner = ChainRunner::new(provider.clone(), ChainSettings::default());

    let mut session = SessionContext::new();
    let err = runner
        .run(&mut session, &canvas())
        .await
        .expect_err("second step fails");

    assert!(matches!(
        err,
        ChainError::Generation {
            step: ChainStep::Critique,
            ..
        }
    ));
    assert_eq!(session.state(), ChainState::Failed);
    assert_eq!(session.text(ChainStep::Build), Some("Initial canvas."));
    assert!(session.text(ChainStep::Critique).is_none());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

    let temp_dir = TempDir::new().expect("failed to create temp dir");
    let paths = CanvasExporter::new(temp_dir.path())
        .save_combined(&canvas(), &session)
        .await
        .expect("export should succeed");
    let report = std::fs::read_to_string(&paths.report).expect("read report");
    assert!(report.contains("Critical Analysis:\nNo critique generated yet"));
    assert!(report.contains("Optimized Business Model:\nNo optimization generated yet"));
}

#[tokio::test]
async fn test_missing_key_aborts_without_calls() {
    let mut provider = ScriptedProvider::new(Vec::new());
    provider.has_key = false;
    let provider = Arc::new(provider);
    let runner = ChainRunner::new(provider.clone(), ChainSettings::default());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = SessionContext::new();
    let err = runner
        .run_with_events(&mut session, &canvas(), tx)
        .await
        .expect_err("no key");

    assert!(err.is_configuration());
    assert_eq!(session.state(), ChainState::Aborted);
    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    assert!(matches!(
        rx.recv().await,
        Some(ChainEvent::ChainAborted { .. })
    ));
}
