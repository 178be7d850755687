use hyper::{Body, Method, Request, Response};

use crate::runs::{self, types::SaveRunRequest};

use super::error::{ApiError, Result};
use super::{cors, json_ok, read_json, AppState};

/// `/api/runs`: POST saves a parsing run, GET returns recent history.
pub async fn handle(state: &AppState, req: Request<Body>) -> Result<Response<Body>> {
    match *req.method() {
        Method::OPTIONS => Ok(cors::preflight()),
        Method::POST => {
            let store = state.runs.as_ref().ok_or(ApiError::NotConfigured)?;
            let body: SaveRunRequest = read_json(req).await?;
            let out = runs::save(store.as_ref(), body).await.map_err(ApiError::Storage)?;
            json_ok(&out)
        }
        Method::GET => {
            let store = state.runs.as_ref().ok_or(ApiError::NotConfigured)?;
            let out = runs::history(store.as_ref()).await.map_err(ApiError::Storage)?;
            json_ok(&out)
        }
        _ => Err(ApiError::MethodNotAllowed),
    }
}
