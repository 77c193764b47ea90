//! System instructions and prompt templates for the three chain steps.

use super::types::ChainStep;

/// System instruction for the build step.
pub const BUILDER_SYSTEM_PROMPT: &str = "You are an expert at business analysis and creation.";

/// System instruction for the critique step.
pub const CRITIC_SYSTEM_PROMPT: &str = "You are an expert business model critic with more than \
20 years of experience in evaluating business models. You are great at spotting inconsistencies \
in business models and identifying the weaknesses in particular components of the business \
model canvas.";

/// System instruction for the optimize step.
pub const OPTIMIZER_SYSTEM_PROMPT: &str = "You are an expert in optimizing business model \
canvases. You find creative ideas to address the issues raised in a critique, and your main \
function is to improve the business model canvas.";

const BUILD_PROMPT: &str = r#"Create a business model canvas based on the following information. The business model canvas should be coherent and consistent. Pay special attention to the uniqueness of the business model canvas.

Input from user:
{canvas}

Provide a detailed analysis and suggestions for each component."#;

const CRITIQUE_PROMPT: &str = r#"Critique the following business model canvas to identify areas for improvement and optimization. Pay special attention to inconsistencies between different parts of the business model. Identify room for improvement in terms of uniqueness.

Business Model Canvas:
{analysis}

Provide a detailed critical analysis highlighting issues and inconsistencies."#;

const OPTIMIZE_PROMPT: &str = r#"Create an optimized version of the business model canvas by addressing the following critical issues:

Original Business Model:
{analysis}

Critical Analysis:
{critique}

Provide a detailed optimized business model canvas addressing all identified issues."#;

/// Returns the system instruction for a step.
pub fn system_prompt(step: ChainStep) -> &'static str {
    match step {
        ChainStep::Build => BUILDER_SYSTEM_PROMPT,
        ChainStep::Critique => CRITIC_SYSTEM_PROMPT,
        ChainStep::Optimize => OPTIMIZER_SYSTEM_PROMPT,
    }
}

/// Prompt for the build step, embedding the canvas description.
pub fn build_prompt(canvas_description: &str) -> String {
    BUILD_PROMPT.replace("{canvas}", canvas_description)
}

/// Prompt for the critique step, embedding the build output.
pub fn critique_prompt(analysis: &str) -> String {
    CRITIQUE_PROMPT.replace("{analysis}", analysis)
}

/// Prompt for the optimize step, embedding the build and critique outputs.
pub fn optimize_prompt(analysis: &str, critique: &str) -> String {
    // Substitute the critique first so an analysis containing "{critique}"
    // is left untouched.
    OPTIMIZE_PROMPT
        .replace("{critique}", critique)
        .replacen("{analysis}", analysis, 1)
}
