use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuleConfigError {
    #[error("Rule table parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rule table invalid: {0}")]
    Invalid(String),
}

pub type RuleConfigResult<T> = Result<T, RuleConfigError>;
