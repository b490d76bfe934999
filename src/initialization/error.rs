use std::{
    error::Error,
    fmt::{self, Display},
};

use rand_distr::{NormalError, uniform::Error as UniformError};

/// The specific result type for the `RandParamGen` constructors.
pub type Result<T> = std::result::Result<T, InitError>;

/// Error returned by the `RandParamGen` constructors whenever the requested
/// distribution cannot be built, each constructor has its own constraints.
#[derive(Debug)]
pub struct InitError(String);

impl From<NormalError> for InitError {
    fn from(value: NormalError) -> Self {
        Self(value.to_string())
    }
}

impl From<UniformError> for InitError {
    fn from(value: UniformError) -> Self {
        Self(value.to_string())
    }
}

impl Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Error for InitError {}
