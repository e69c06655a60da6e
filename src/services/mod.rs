pub mod session_registry;
pub mod tutor_prompt;
