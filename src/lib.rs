//! Batch mutate client for an AdWords-style XML API.
//!
//! Two pieces do the real work:
//! - [`BatchJobHelper`] flattens heterogeneous operation groups into one
//!   `mutate` envelope, uploads it to a job's temporary URL and downloads
//!   the deferred result set.
//! - The [`extension`] codec encodes/decodes the polymorphic
//!   extension-setting field, dispatching on the `xsi:type` discriminator
//!   that structural serialization cannot express.
//!
//! Transport and authentication stay behind the [`transport`] traits;
//! retries, pagination and session handling are the caller's business.

pub mod batch;
pub mod config;
pub mod entities;
pub mod error;
pub mod extension;
pub mod service;
pub mod transport;
pub mod types;

mod xml;

// Re-exports for convenience
pub use batch::{build_mutate_envelope, BatchJobHelper, UploadSummary};
pub use config::ClientConfig;
pub use entities::{AdGroup, AdGroupExtensionSetting, Budget, Campaign, OperationGroup, RawEntity};
pub use error::{Error, Result};
pub use extension::{CallFeedItem, Extension, ExtensionSetting, FeedType, RawFeedItem};
pub use service::AdGroupExtensionSettingService;
pub use transport::{AuthSession, HttpResponse, HttpTransport, Transport};
pub use types::{Action, ActionMap, EntityError, MutateResult, TemporaryUrl};

pub use xml::{BASE_NS, XSI_NS};
