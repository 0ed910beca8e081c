//! Request construction.
//!
//! # Responsibilities
//! - Validate the path and serialize the JSON body once
//! - Attach content type, request ID and (if signed in) bearer credential
//! - Re-resolve URL and credential for every attempt

use std::fmt;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use uuid::Uuid;

use crate::gateway::error::{GatewayError, GatewayResult};
use crate::session::Session;
use crate::transport::OutgoingRequest;

/// Header carrying the per-call correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Pass as the body argument of [`build_request`] for bodiless requests.
pub const NO_BODY: Option<&()> = None;

/// HTTP methods the backend accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    fn to_http(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A built, not yet sent, request.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    request_id: Uuid,
}

impl RequestDescriptor {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Serialized JSON body, if any.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// Produce the request for one attempt, reading the credential fresh.
    pub(crate) fn resolve(&self, session: &Session) -> GatewayResult<OutgoingRequest> {
        let url = session
            .endpoint(&self.path)
            .map_err(|e| GatewayError::InvalidPath(format!("{}: {}", self.path, e)))?;

        let mut headers = self.headers.clone();
        set_credential(&mut headers, session.token().as_deref().map(String::as_str))?;

        Ok(OutgoingRequest {
            method: self.method.to_http(),
            url,
            headers,
            body: self.body.clone(),
        })
    }
}

/// Build a request descriptor.
///
/// Dates inside `body` serialize through serde; `chrono` types produce
/// ISO-8601 strings. Fails only when the path does not begin with `/` or the
/// body cannot be serialized.
pub fn build_request<B>(
    session: &Session,
    path: &str,
    method: Method,
    body: Option<&B>,
) -> GatewayResult<RequestDescriptor>
where
    B: Serialize + ?Sized,
{
    if !path.starts_with('/') {
        return Err(GatewayError::InvalidPath(path.to_string()));
    }

    let body = body
        .map(serde_json::to_vec)
        .transpose()
        .map_err(|e| GatewayError::Encoding(e.to_string()))?;

    let request_id = Uuid::new_v4();
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(
        X_REQUEST_ID,
        HeaderValue::from_str(&request_id.to_string())
            .map_err(|e| GatewayError::Encoding(e.to_string()))?,
    );
    set_credential(&mut headers, session.token().as_deref().map(String::as_str))?;

    Ok(RequestDescriptor {
        method,
        path: path.to_string(),
        headers,
        body,
        request_id,
    })
}

fn set_credential(headers: &mut HeaderMap, token: Option<&str>) -> GatewayResult<()> {
    headers.remove(AUTHORIZATION);
    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| GatewayError::Encoding(format!("authorization header: {}", e)))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    Ok(())
}
