//! Sequential runner for the build → critique → optimize chain.
//!
//! Each step streams its answer from the LLM into an accumulating buffer and
//! publishes the growing buffer as a [`ChainEvent::Fragment`]. The buffer at
//! the end of the stream becomes the step's result and is embedded in the
//! next step's prompt.

use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use super::error::{ChainError, ChainResult};
use super::prompts;
use super::types::{ChainEvent, ChainState, ChainStep, ChainStepResult, SessionContext};
use crate::canvas::{CanvasDescription, CanvasInput};
use crate::error::LlmError;
use crate::llm::{GenerationRequest, LlmProvider, Message, DEFAULT_MODEL};

/// Model and sampling parameters used for every chain step.
#[derive(Debug, Clone)]
pub struct ChainSettings {
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum tokens per step.
    pub max_tokens: u32,
    /// Nucleus sampling parameter.
    pub top_p: f64,
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 1.0,
            max_tokens: 1024,
            top_p: 1.0,
        }
    }
}

impl ChainSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = top_p;
        self
    }
}

/// Runs the three chain steps against an LLM provider.
pub struct ChainRunner {
    llm: Arc<dyn LlmProvider>,
    settings: ChainSettings,
}

impl ChainRunner {
    pub fn new(llm: Arc<dyn LlmProvider>, settings: ChainSettings) -> Self {
        Self { llm, settings }
    }

    pub fn settings(&self) -> &ChainSettings {
        &self.settings
    }

    /// Runs the chain for `canvas`, storing results in `session`.
    pub async fn run(&self, session: &mut SessionContext, canvas: &CanvasInput) -> ChainResult<()> {
        self.execute(session, canvas, None).await
    }

    /// Runs the chain and publishes progress on `events`.
    ///
    /// The channel is unbounded so a slow consumer never stalls the stream.
    /// Send failures (receiver dropped) are ignored.
    pub async fn run_with_events(
        &self,
        session: &mut SessionContext,
        canvas: &CanvasInput,
        events: mpsc::UnboundedSender<ChainEvent>,
    ) -> ChainResult<()> {
        self.execute(session, canvas, Some(&events)).await
    }

    async fn execute(
        &self,
        session: &mut SessionContext,
        canvas: &CanvasInput,
        events: Option<&mpsc::UnboundedSender<ChainEvent>>,
    ) -> ChainResult<()> {
        session.begin_run(canvas.clone());

        if !self.llm.has_api_key() {
            let reason = "no API key configured for the generation service".to_string();
            warn!("Attempted to start evaluation without valid API key");
            session.set_state(ChainState::Aborted);
            emit(
                events,
                ChainEvent::ChainAborted {
                    reason: reason.clone(),
                },
            );
            return Err(ChainError::Configuration(reason));
        }

        let start = Instant::now();
        let description = canvas.describe();
        info!(
            model = %self.settings.model,
            filled_fields = canvas.filled_count(),
            "Starting business model evaluation"
        );

        for step in ChainStep::ALL {
            session.set_state(step.running_state());
            emit(events, ChainEvent::StepStarted { step });

            let request = self.step_request(step, &description, session);
            match self.stream_step(step, request, events).await {
                Ok(text) => {
                    if text.is_empty() {
                        warn!(step = %step, "Step produced an empty response");
                    }
                    let result = ChainStepResult::new(step, text);
                    info!(step = %step, chars = result.text.len(), "Step completed");
                    session.record(result.clone());
                    emit(events, ChainEvent::StepCompleted { result });
                }
                Err(source) => {
                    error!(step = %step, error = %source, "Error in GROQ completion");
                    session.set_state(ChainState::Failed);
                    emit(
                        events,
                        ChainEvent::StepFailed {
                            step,
                            error: source.to_string(),
                        },
                    );
                    return Err(ChainError::Generation { step, source });
                }
            }
        }

        session.set_state(ChainState::Done);
        emit(events, ChainEvent::ChainCompleted);
        info!(
            duration_ms = start.elapsed().as_millis() as u64,
            "Successfully completed business model evaluation"
        );
        Ok(())
    }

    /// Builds the request for `step` from the description and prior results.
    fn step_request(
        &self,
        step: ChainStep,
        description: &CanvasDescription,
        session: &SessionContext,
    ) -> GenerationRequest {
        let analysis = session.text(ChainStep::Build).unwrap_or_default();
        let prompt = match step {
            ChainStep::Build => prompts::build_prompt(description.as_str()),
            ChainStep::Critique => prompts::critique_prompt(analysis),
            ChainStep::Optimize => prompts::optimize_prompt(
                analysis,
                session.text(ChainStep::Critique).unwrap_or_default(),
            ),
        };

        GenerationRequest::new(
            self.settings.model.clone(),
            vec![
                Message::system(prompts::system_prompt(step)),
                Message::user(prompt),
            ],
        )
        .with_temperature(self.settings.temperature)
        .with_max_tokens(self.settings.max_tokens)
        .with_top_p(self.settings.top_p)
    }

    /// Folds the step's fragment stream into one buffer.
    async fn stream_step(
        &self,
        step: ChainStep,
        request: GenerationRequest,
        events: Option<&mpsc::UnboundedSender<ChainEvent>>,
    ) -> Result<String, LlmError> {
        let mut fragments = self.llm.generate_stream(request).await?;
        let mut buffer = String::new();

        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            buffer.push_str(&fragment);
            if events.is_some() {
                emit(
                    events,
                    ChainEvent::Fragment {
                        step,
                        fragment,
                        buffer: buffer.clone(),
                    },
                );
            }
        }

        Ok(buffer)
    }
}

fn emit(events: Option<&mpsc::UnboundedSender<ChainEvent>>, event: ChainEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event);
    }
}
