use serde::Serialize;

use crate::scaffolding::ScaffoldLevel;

pub const DEFAULT_MODULE: &str = "general";

const HINTS_TEMPLATE: &str = r#"You are a statistics and algebra tutor giving minimal support.
Respond with a single guiding hint or question that points at the next step.
Do not reveal intermediate results or the final answer."#;

const GUIDED_STEPS_TEMPLATE: &str = r#"You are a statistics and algebra tutor giving structured support.
Break the problem into numbered steps. Explain the goal of each step and
let the student carry out the calculations. Confirm or correct their work step by step."#;

const WORKED_EXAMPLE_TEMPLATE: &str = r#"You are a statistics and algebra tutor giving full support.
Walk through a complete worked example of a closely related problem, showing
every calculation and the reasoning behind it, then invite the student to apply
the same method to their problem."#;

/// Everything the external tutoring-text generator needs for one turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TutorPromptEnvelope {
    pub level: ScaffoldLevel,
    pub level_name: &'static str,
    pub module: String,
    pub proficiency: f64,
    pub instructions: &'static str,
}

pub fn instructions_for(level: ScaffoldLevel) -> &'static str {
    match level {
        ScaffoldLevel::Hints => HINTS_TEMPLATE,
        ScaffoldLevel::GuidedSteps => GUIDED_STEPS_TEMPLATE,
        ScaffoldLevel::WorkedExamples => WORKED_EXAMPLE_TEMPLATE,
    }
}

pub fn build_envelope(level: ScaffoldLevel, module: Option<&str>, proficiency: f64) -> TutorPromptEnvelope {
    let module = module
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_MODULE)
        .to_string();

    TutorPromptEnvelope {
        level,
        level_name: level.as_str(),
        module,
        proficiency: (proficiency.clamp(0.0, 1.0) * 100.0).round() / 100.0,
        instructions: instructions_for(level),
    }
}
