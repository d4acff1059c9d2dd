use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("state lock poisoned")]
    StateLock,
    #[error("no population loaded")]
    NoPopulation,
}
