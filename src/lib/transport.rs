//! The HTTP side of archive downloads.

use std::collections::BTreeMap;

use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};

use crate::error::Error;

/// The body and status of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

/// Performs a blocking `GET` and reads the whole body.
pub trait Transport {
    fn get(&self, url: &str, headers: &HeaderMap) -> Result<Response, Error>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str, headers: &HeaderMap) -> Result<Response, Error> {
        (**self).get(url, headers)
    }
}

/// A [`Transport`] backed by a blocking `reqwest` client. Redirects are followed.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, headers: &HeaderMap) -> Result<Response, Error> {
        let response = self.client.get(url).headers(headers.clone()).send()?;
        let status = response.status();
        let body = response.bytes()?.to_vec();
        Ok(Response { status, body })
    }
}

/// `accept: application/zip`, overridden by any caller-supplied header of the same name
/// (compared case-insensitively).
pub fn merge_headers(extra: &BTreeMap<String, String>) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/zip"));
    for (name, value) in extra {
        let invalid = || Error::InvalidHeader { name: name.clone() };
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
        let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

#[cfg(test)]
mod test_merge_headers {
    use super::*;

    #[test]
    fn accept_zip_by_default() {
        let headers = merge_headers(&BTreeMap::new()).unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[ACCEPT], "application/zip");
    }

    #[test]
    fn caller_headers_win() {
        let extra = BTreeMap::from([
            ("Accept".to_string(), "application/octet-stream".to_string()),
            ("Authorization".to_string(), "token abc".to_string()),
        ]);
        let headers = merge_headers(&extra).unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[ACCEPT], "application/octet-stream");
        assert_eq!(headers["authorization"], "token abc");
    }

    #[test]
    fn bad_header_name_is_an_error() {
        let extra = BTreeMap::from([("bad header".to_string(), "x".to_string())]);
        assert!(matches!(
            merge_headers(&extra),
            Err(Error::InvalidHeader { name }) if name == "bad header"
        ));
    }
}
