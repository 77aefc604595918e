use thiserror::Error;

use crate::event::EventError;
use crate::registry::RegistryError;
use crate::variant::VariantError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Variant error: {0}")]
    Variant(#[from] VariantError),
    #[error("Event error: {0}")]
    Event(#[from] EventError),
    #[error("Config error: {0}")]
    Config(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type InternalResult<T> = Result<T, Error>;

pub type ConsoleFacesError = Error;

impl Error {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Error::Internal(message.into())
    }
}
