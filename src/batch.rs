//! Batch job upload/download.
//!
//! Flattens operation groups into one `mutate` envelope, posts it to the
//! job's upload URL, and decodes the deferred result set from its download
//! URL. The two calls are independent leaves; the caller drives polling
//! until the remote job has produced output.

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::entities::OperationGroup;
use crate::error::{Error, Result};
use crate::transport::{HttpTransport, Transport};
use crate::types::{MutateResult, TemporaryUrl};
use crate::xml::{BASE_NS, XSI_NS};

/// What [`BatchJobHelper::upload_operations`] did with the groups it was
/// given. Skipped entities come from groups with no registered
/// discriminator; the caller decides whether that is acceptable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadSummary {
    /// Operations serialized into the envelope.
    pub uploaded: usize,
    /// Entities dropped because their type is not in the registry.
    pub skipped: usize,
}

/// Uploads batch operations and downloads their deferred results.
pub struct BatchJobHelper<T = HttpTransport> {
    transport: T,
}

impl BatchJobHelper<HttpTransport> {
    pub fn new() -> Self {
        Self {
            transport: HttpTransport::new(),
        }
    }
}

impl Default for BatchJobHelper<HttpTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> BatchJobHelper<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// Serialize every resolvable operation into one envelope and POST it to
    /// the job's upload URL.
    ///
    /// With nothing resolvable to send this is a no-op: no request is made
    /// and the summary reports zero uploads. The upload endpoint normally
    /// always answers 200; on any other status the response body is
    /// surfaced verbatim since no structured error schema exists there.
    pub async fn upload_operations(
        &self,
        groups: &[OperationGroup],
        upload_url: &TemporaryUrl,
    ) -> Result<UploadSummary> {
        let (envelope, summary) = build_mutate_envelope(groups)?;
        if summary.uploaded == 0 {
            debug!(skipped = summary.skipped, "no resolvable operations, skipping upload");
            return Ok(summary);
        }

        debug!(
            operations = summary.uploaded,
            skipped = summary.skipped,
            "uploading batch operations"
        );
        let response = self
            .transport
            .post(&upload_url.url, "text/xml", envelope)
            .await?;
        if !response.is_success() {
            return Err(Error::Protocol {
                status: response.status,
                body: response.body,
            });
        }
        Ok(summary)
    }

    /// Fetch the deferred result set: one [`MutateResult`] per uploaded
    /// operation, in submission order. A single full fetch; the remote side
    /// returns the whole set once the job is done.
    pub async fn download_results(
        &self,
        download_url: &TemporaryUrl,
    ) -> Result<Vec<MutateResult>> {
        let response = self.transport.get(&download_url.url).await?;
        if !response.is_success() {
            return Err(Error::Protocol {
                status: response.status,
                body: response.body,
            });
        }
        let decoded: MutateResponse = quick_xml::de::from_str(&response.body)?;
        debug!(results = decoded.rval.len(), "downloaded batch results");
        Ok(decoded.rval)
    }
}

#[derive(Debug, Default, Deserialize)]
struct MutateResponse {
    #[serde(default)]
    rval: Vec<MutateResult>,
}

/// Serialize all resolvable operations into one namespace-qualified `mutate`
/// envelope. Returned with the counts so the caller can decide whether to
/// send at all.
pub fn build_mutate_envelope(groups: &[OperationGroup]) -> Result<(String, UploadSummary)> {
    let mut summary = UploadSummary::default();
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

    let mut root = BytesStart::new("mutate");
    root.push_attribute(("xmlns", BASE_NS));
    root.push_attribute(("xmlns:xsi", XSI_NS));
    writer.write_event(Event::Start(root))?;

    for group in groups {
        if group.discriminator().is_none() {
            warn!(
                entities = group.len(),
                "skipping operation group with no registered discriminator"
            );
            summary.skipped += group.len();
            continue;
        }
        summary.uploaded += group.write_operations(&mut writer)?;
    }

    writer.write_event(Event::End(BytesEnd::new("mutate")))?;
    let body = String::from_utf8_lossy(&writer.into_inner()).into_owned();
    Ok((body, summary))
}
