use thiserror::Error;

pub type RowcastResult<T> = Result<T, RowcastError>;

#[derive(Error, Debug)]
pub enum RowcastError {
    #[error("upload rejected: {0}")]
    Security(String),

    #[error("spreadsheet parse error: {0}")]
    Parse(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("no element with id '{0}'")]
    NotFound(String),

    #[error("no element selected")]
    NoSelection,
}
