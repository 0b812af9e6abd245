use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong talking to the mutate service.
///
/// Transport, protocol and decode failures are separate variants so callers
/// can decide which are worth retrying a submit/fetch cycle for.
#[derive(Debug, Error)]
pub enum Error {
    /// Network or connection failure, propagated unchanged.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status. The body is carried verbatim because the
    /// remote side guarantees no structured error schema at this boundary.
    #[error("unexpected status {status}: {body}")]
    Protocol { status: u16, body: String },

    /// Malformed XML on a hand-decoded path.
    #[error("malformed xml: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Structural decode of a response envelope failed.
    #[error("response decode failed: {0}")]
    Decode(#[from] quick_xml::DeError),

    #[error("xml write failed: {0}")]
    Io(#[from] std::io::Error),

    /// An extension whose discriminator has no encoder registered.
    #[error("unknown extension type {0:?}")]
    UnknownExtensionType(String),
}
