//! Transport module
//!
//! The login flow only needs "send this body to that URL, give me the
//! response body". `SoapTransport` is the HTTP implementation.

use std::future::Future;

use anyhow::Error;

pub mod soap;

pub use soap::SoapTransport;

pub trait Transport {
    fn send(
        &self,
        url: &str,
        body: &[u8],
    ) -> impl Future<Output = Result<Vec<u8>, Error>> + Send;
}

impl<T: Transport + Sync> Transport for &T {
    fn send(
        &self,
        url: &str,
        body: &[u8],
    ) -> impl Future<Output = Result<Vec<u8>, Error>> + Send {
        (**self).send(url, body)
    }
}
