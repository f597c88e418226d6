//! Signer module
//!
//! Produces the XML-DSig signed document sent in the token request.
//! Certificate formats and the signature itself are the signer's business;
//! `CommandSigner` hands both to an external program.

use std::future::Future;

use anyhow::Error;

pub mod command;

pub use command::CommandSigner;

pub trait Signer {
    fn sign(
        &self,
        certificate_base64: &str,
        password: &str,
        document: &str,
    ) -> impl Future<Output = Result<Vec<u8>, Error>> + Send;
}

impl<S: Signer + Sync> Signer for &S {
    fn sign(
        &self,
        certificate_base64: &str,
        password: &str,
        document: &str,
    ) -> impl Future<Output = Result<Vec<u8>, Error>> + Send {
        (**self).sign(certificate_base64, password, document)
    }
}
