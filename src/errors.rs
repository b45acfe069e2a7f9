use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("validation: {0}")] Validation(String),
    #[error("provider unavailable: {0}")] ProviderUnavailable(String),
    #[error("provider request failed: {0}")] ProviderRequestFailed(String),
    #[error("persistence unavailable: {0}")] PersistenceUnavailable(String),
}
