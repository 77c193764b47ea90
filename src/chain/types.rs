//! Core types of the build → critique → optimize chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::canvas::CanvasInput;

// ============================================================================
// Steps and States
// ============================================================================

/// One of the three generation steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainStep {
    /// Build an initial canvas analysis from the user's input.
    Build,
    /// Critique the initial analysis.
    Critique,
    /// Optimize the canvas using the analysis and its critique.
    Optimize,
}

impl ChainStep {
    /// All steps in execution order.
    pub const ALL: [ChainStep; 3] = [ChainStep::Build, ChainStep::Critique, ChainStep::Optimize];

    /// Zero-based position in the chain.
    pub fn index(&self) -> usize {
        match self {
            Self::Build => 0,
            Self::Critique => 1,
            Self::Optimize => 2,
        }
    }

    /// Returns the display name for this step.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Build => "Build",
            Self::Critique => "Critique",
            Self::Optimize => "Optimize",
        }
    }

    /// Heading shown above the step's output.
    pub fn heading(&self) -> &'static str {
        match self {
            Self::Build => "Step 1: Initial business model created based on user input",
            Self::Critique => "Step 2: Critical analysis of the initial business model",
            Self::Optimize => "Step 3: Optimized business model canvas",
        }
    }

    /// Section title used in the combined export report.
    pub fn report_title(&self) -> &'static str {
        match self {
            Self::Build => "Initial Analysis",
            Self::Critique => "Critical Analysis",
            Self::Optimize => "Optimized Business Model",
        }
    }

    /// Placeholder written to the report when the step produced nothing.
    pub fn missing_placeholder(&self) -> &'static str {
        match self {
            Self::Build => "No analysis generated yet",
            Self::Critique => "No critique generated yet",
            Self::Optimize => "No optimization generated yet",
        }
    }

    /// The runner state while this step executes.
    pub fn running_state(&self) -> ChainState {
        match self {
            Self::Build => ChainState::Building,
            Self::Critique => ChainState::Critiquing,
            Self::Optimize => ChainState::Optimizing,
        }
    }
}

impl std::fmt::Display for ChainStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// State of a chain run.
///
/// Runs move `Idle → Building → Critiquing → Optimizing → Done`, or stop in
/// `Failed` (a step errored) or `Aborted` (preconditions not met).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainState {
    Idle,
    Building,
    Critiquing,
    Optimizing,
    Done,
    Failed,
    Aborted,
}

impl ChainState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Aborted)
    }
}

impl std::fmt::Display for ChainState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Building => "building",
            Self::Critiquing => "critiquing",
            Self::Optimizing => "optimizing",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// Results and Events
// ============================================================================

/// Final output of one chain step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStepResult {
    pub step: ChainStep,
    pub text: String,
    pub completed_at: DateTime<Utc>,
}

impl ChainStepResult {
    pub fn new(step: ChainStep, text: impl Into<String>) -> Self {
        Self {
            step,
            text: text.into(),
            completed_at: Utc::now(),
        }
    }
}

/// Events emitted while a chain runs, for progressive rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum ChainEvent {
    /// A step has started.
    StepStarted { step: ChainStep },
    /// A fragment arrived; `buffer` is everything received so far for the step.
    Fragment {
        step: ChainStep,
        fragment: String,
        buffer: String,
    },
    /// A step finished successfully.
    StepCompleted { result: ChainStepResult },
    /// A step failed and the run stopped.
    StepFailed { step: ChainStep, error: String },
    /// All three steps succeeded.
    ChainCompleted,
    /// The run stopped before any step.
    ChainAborted { reason: String },
}

// ============================================================================
// Session Context
// ============================================================================

/// State carried across runs within one user session.
///
/// Created at session start and handed to the runner by `&mut`. Holds the
/// canvas of the latest run, its state, and whichever step results it has
/// produced. Starting a new run clears the previous results.
#[derive(Debug, Clone)]
pub struct SessionContext {
    started_at: DateTime<Utc>,
    canvas: Option<CanvasInput>,
    state: ChainState,
    results: [Option<ChainStepResult>; 3],
    runs: u32,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            canvas: None,
            state: ChainState::Idle,
            results: [None, None, None],
            runs: 0,
        }
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn state(&self) -> ChainState {
        self.state
    }

    /// Canvas used by the latest run.
    pub fn canvas(&self) -> Option<&CanvasInput> {
        self.canvas.as_ref()
    }

    /// Number of runs started in this session.
    pub fn runs(&self) -> u32 {
        self.runs
    }

    pub fn result(&self, step: ChainStep) -> Option<&ChainStepResult> {
        self.results[step.index()].as_ref()
    }

    /// Text of a step result, if the step completed.
    pub fn text(&self, step: ChainStep) -> Option<&str> {
        self.result(step).map(|r| r.text.as_str())
    }

    /// Completed results in step order.
    pub fn results(&self) -> impl Iterator<Item = &ChainStepResult> {
        self.results.iter().flatten()
    }

    pub fn is_complete(&self) -> bool {
        self.state == ChainState::Done
    }

    pub(crate) fn begin_run(&mut self, canvas: CanvasInput) {
        self.canvas = Some(canvas);
        self.state = ChainState::Idle;
        self.results = [None, None, None];
        self.runs += 1;
    }

    pub(crate) fn set_state(&mut self, state: ChainState) {
        self.state = state;
    }

    pub(crate) fn record(&mut self, result: ChainStepResult) {
        let index = result.step.index();
        self.results[index] = Some(result);
    }
}
