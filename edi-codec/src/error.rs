use thiserror::Error;

#[derive(Error, Debug)]
pub enum EdiError {
    /// Hard X12 requirement: a claim without diagnosis codes cannot be
    /// rendered. Not a warning.
    #[error("Claim {claim_number} has no diagnosis codes after aggregation")]
    MissingDiagnosis { claim_number: String },

    #[error("Claim graph is missing required field: {0}")]
    MissingField(&'static str),
}

pub type EdiResult<T> = Result<T, EdiError>;

impl From<EdiError> for error_common::RevenueError {
    fn from(err: EdiError) -> Self {
        error_common::RevenueError::Encoding(err.to_string())
    }
}
