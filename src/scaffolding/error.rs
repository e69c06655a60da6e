use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScaffoldError {
    #[error("requested scaffolding level {0} is outside 1..=3")]
    InvalidLevelRequest(i64),
    #[error("invalid scaffolding config: {0}")]
    InvalidConfig(String),
}
