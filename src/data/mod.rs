use std::error::Error;
use std::fmt;
use std::io;

mod continent;
pub use continent::{Continent, ContinentPatch, CountryRef, NewContinent};

mod country;
pub use country::{Country, CountryPatch, NewCountry};

mod state;
pub use state::{NewState, State, StateGroup};

mod language;
pub use language::Language;

pub mod index;

mod dataset;
pub use dataset::{Dataset, LoadError, LoadErrorKind};

pub mod resolve;

pub mod store;
pub use store::DatasetStore;

pub type Result<T> = std::result::Result<T, DataError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Continent,
    Country,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Continent => "Continent",
            EntityKind::Country => "Country",
        })
    }
}

/// Failures of write operations. Reads never fail on a missing key.
#[derive(Debug)]
pub enum DataError {
    NotFound {
        kind: EntityKind,
        code: String,
    },
    /// The country's side-table entry exists but doesn't list the state.
    StateNotFound {
        country_code: String,
        code: String,
    },
    DuplicateKey {
        kind: EntityKind,
        code: String,
    },
    DuplicateState {
        country_code: String,
        code: String,
    },
    Persist(io::Error),
}

impl DataError {
    pub fn not_found(kind: EntityKind, code: &str) -> Self {
        Self::NotFound {
            kind,
            code: code.to_string(),
        }
    }

    pub fn duplicate(kind: EntityKind, code: &str) -> Self {
        Self::DuplicateKey {
            kind,
            code: code.to_string(),
        }
    }
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataError::NotFound { kind, code } => write!(f, "{} with code {} not found", kind, code),
            DataError::StateNotFound { country_code, code } => write!(
                f,
                "State with code {} not found in country {}",
                code, country_code
            ),
            DataError::DuplicateKey { kind, code } => {
                write!(f, "{} with code {} already exists", kind, code)
            }
            DataError::DuplicateState { country_code, code } => write!(
                f,
                "State with code {} already exists in country {}",
                code, country_code
            ),
            DataError::Persist(e) => write!(f, "could not persist dataset: {}", e),
        }
    }
}

impl Error for DataError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DataError::Persist(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for DataError {
    fn from(e: io::Error) -> Self {
        Self::Persist(e)
    }
}
