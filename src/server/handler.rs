use crate::{
    common::data::{MockedResponse, RequestLogEntry},
    server::{state::StateManager, RequestMetadata},
};
use async_trait::async_trait;
use bytes::Bytes;
use http::{header::HOST, Request, Response, StatusCode};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid status code: {0}")]
    InvalidStatusCode(#[from] http::status::InvalidStatusCode),
    #[error("cannot reconstruct request URL: {0}")]
    RequestUrlError(#[from] url::ParseError),
    #[error("cannot determine request host: no usable Host header and no local address")]
    MissingHost,
    #[error("cannot convert response body: {0}")]
    ResponseConstructionError(#[from] http::Error),
}

#[async_trait]
pub(crate) trait Handler {
    async fn handle(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Error>;
}

/// Turns a fully buffered request into a request log entry and answers it with the
/// response of the first matching mock route, or with an empty `200 OK`.
pub(crate) struct MockRequestHandler<S>
where
    S: StateManager + Send + Sync + 'static,
{
    state: Arc<S>,
    print_access_log: bool,
}

#[async_trait]
impl<S> Handler for MockRequestHandler<S>
where
    S: StateManager + Send + Sync + 'static,
{
    async fn handle(&self, req: Request<Bytes>) -> Result<Response<Bytes>, Error> {
        tracing::trace!("Handling incoming request: {:?}", req);

        // The request target as it was received. Routes are matched against this string
        // without any normalization.
        let target = req.uri().to_string();
        let url = request_url(&req, &target)?;
        let method = req.method().as_str().to_string();
        let body = String::from_utf8_lossy(req.body()).into_owned();

        let entry = RequestLogEntry::new(url, method.clone(), body);
        let response = match self.state.record_and_resolve(entry, &target) {
            Some(mocked) => to_response(mocked)?,
            None => Response::new(Bytes::new()),
        };

        if self.print_access_log {
            tracing::info!("{} {} {}", method, target, response.status().as_u16());
        }

        Ok(response)
    }
}

impl<S> MockRequestHandler<S>
where
    S: StateManager + Send + Sync + 'static,
{
    pub fn new(state: Arc<S>, print_access_log: bool) -> Self {
        Self {
            state,
            print_access_log,
        }
    }
}

/// Builds the absolute URL of a request by resolving the request target against
/// `http://<Host header>`. If the client did not send a usable `Host` header, the local
/// address of the connection is used instead.
///
/// A target that cannot be resolved (e.g. an absolute-form target with an out of range port)
/// is reduced to its path and query, so the request is still logged.
fn request_url(req: &Request<Bytes>, target: &str) -> Result<Url, Error> {
    let host_base = req
        .headers()
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .filter(|host| !host.is_empty())
        .and_then(|host| Url::parse(&format!("http://{}", host)).ok());

    let base = match host_base {
        Some(base) => base,
        None => {
            let meta = req
                .extensions()
                .get::<RequestMetadata>()
                .ok_or(Error::MissingHost)?;
            Url::parse(&format!("{}://{}", meta.scheme, meta.local_addr))?
        }
    };

    let url = match base.join(target) {
        Ok(url) => url,
        Err(err) => {
            tracing::warn!("cannot resolve request target '{}': {}", target, err);
            let path = req.uri().path_and_query().map_or("/", |p| p.as_str());
            base.join(path).unwrap_or(base)
        }
    };

    Ok(url)
}

fn to_response(mocked: MockedResponse) -> Result<Response<Bytes>, Error> {
    let status = StatusCode::from_u16(mocked.status_code)?;
    let body = mocked.body.map(Bytes::from).unwrap_or_default();

    Ok(Response::builder().status(status).body(body)?)
}
