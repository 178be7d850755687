use hyper::{Body, Method, Request, Response};

use crate::channels::{self, types::{ListChannelsRequest, ServiceIdentity}};

use super::error::{ApiError, Result};
use super::{cors, json_ok, read_json, AppState};

/// `/api/channels`: POST lists channels, GET reports service identity.
pub async fn handle(state: &AppState, req: Request<Body>) -> Result<Response<Body>> {
    match *req.method() {
        Method::OPTIONS => Ok(cors::preflight()),
        Method::POST => {
            let body: ListChannelsRequest = read_json(req).await?;
            let out = channels::list(state.channels.as_ref(), body)
                .await
                .map_err(ApiError::Internal)?;
            json_ok(&out)
        }
        Method::GET => json_ok(&ServiceIdentity::current()),
        _ => Err(ApiError::MethodNotAllowed),
    }
}
