use crate::data::DataError;
use crate::AppState;

use actix_web::{error, http::StatusCode, web, HttpResponse};
use std::fmt;

pub mod graphql;

type Result<T> = std::result::Result<T, HandlerError>;

#[derive(Debug)]
pub enum HandlerError {
    Persist(DataError),
    PersistenceDisabled,
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HandlerError::Persist(e) => write!(f, "{}", e),
            HandlerError::PersistenceDisabled => f.write_str("Persistence is disabled"),
        }
    }
}

impl From<DataError> for HandlerError {
    fn from(e: DataError) -> Self {
        Self::Persist(e)
    }
}

impl error::ResponseError for HandlerError {
    fn status_code(&self) -> StatusCode {
        match self {
            HandlerError::Persist(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HandlerError::PersistenceDisabled => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type("text/plain")
            .body(self.to_string())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    continents: usize,
    countries: usize,
    state_groups: usize,
    languages: usize,
    dirty: bool,
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let health = state.store.read(|ds| Health {
        continents: ds.continents.len(),
        countries: ds.countries.len(),
        state_groups: ds.states.len(),
        languages: ds.languages.len(),
        dirty: state.store.is_dirty(),
    });
    HttpResponse::Ok().json(health)
}

/// Writes pending changes now instead of waiting for the flush task.
pub async fn flush(state: web::Data<AppState>) -> Result<HttpResponse> {
    if state.store.persist_dir().is_none() {
        return Err(HandlerError::PersistenceDisabled);
    }
    let written = web::block({
        let store = state.store.clone();
        move || store.flush()
    })
    .await
    .map_err(|e| HandlerError::Persist(DataError::Persist(std::io::Error::other(e))))??;
    info!("manual flush; wrote files: {}", written);
    Ok(HttpResponse::NoContent().finish())
}
