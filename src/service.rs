//! Ad group extension setting service.
//!
//! The one concrete service wrapper in this crate; its siblings differ only
//! in field names and live elsewhere. Exercises the extension codec in both
//! directions: mutate encodes settings, query decodes them.

use std::sync::Arc;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use tracing::debug;

use crate::entities::AdGroupExtensionSetting;
use crate::error::Result;
use crate::transport::AuthSession;
use crate::types::{Action, ActionMap};
use crate::xml::{read_trimmed, write_text_element, BASE_NS, XSI_NS};

pub const AD_GROUP_EXTENSION_SETTING_SERVICE_URL: &str =
    "https://adwords.google.com/api/adwords/cm/v201609/AdGroupExtensionSettingService";

pub struct AdGroupExtensionSettingService {
    auth: Arc<dyn AuthSession>,
}

impl AdGroupExtensionSettingService {
    pub fn new(auth: Arc<dyn AuthSession>) -> Self {
        Self { auth }
    }

    /// Run an AWQL query, returning the matching settings in document order
    /// and the total entry count reported by the service.
    pub async fn query(&self, awql: &str) -> Result<(Vec<AdGroupExtensionSetting>, i64)> {
        let body = build_query_envelope(awql)?;
        let response = self
            .auth
            .request(AD_GROUP_EXTENSION_SETTING_SERVICE_URL, "query", body)
            .await?;
        parse_query_response(&response)
    }

    /// Apply the given operations and return the mutated settings.
    ///
    /// Raw extensions are upgraded by each setting's feed type before
    /// encoding; a feed type with no registered variant fails the whole
    /// call before anything is sent.
    pub async fn mutate(
        &self,
        operations: ActionMap<AdGroupExtensionSetting>,
    ) -> Result<Vec<AdGroupExtensionSetting>> {
        let mut resolved = Vec::with_capacity(operations.len());
        for (action, mut setting) in operations {
            setting.resolve_extensions()?;
            resolved.push((action, setting));
        }

        let body = build_mutate_body(&resolved)?;
        debug!(operations = resolved.len(), "mutating ad group extension settings");
        let response = self
            .auth
            .request(AD_GROUP_EXTENSION_SETTING_SERVICE_URL, "mutate", body)
            .await?;
        parse_mutate_response(&response)
    }
}

fn build_query_envelope(awql: &str) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let mut root = BytesStart::new("query");
    root.push_attribute(("xmlns", BASE_NS));
    writer.write_event(Event::Start(root))?;
    write_text_element(&mut writer, "query", awql)?;
    writer.write_event(Event::End(BytesEnd::new("query")))?;
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

fn build_mutate_body(operations: &[(Action, AdGroupExtensionSetting)]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let mut root = BytesStart::new("mutate");
    root.push_attribute(("xmlns", BASE_NS));
    root.push_attribute(("xmlns:xsi", XSI_NS));
    writer.write_event(Event::Start(root))?;

    for (action, setting) in operations {
        writer.write_event(Event::Start(BytesStart::new("operations")))?;
        write_text_element(&mut writer, "operator", action.as_str())?;
        writer.write_event(Event::Start(BytesStart::new("operand")))?;
        setting.write_operand(&mut writer)?;
        writer.write_event(Event::End(BytesEnd::new("operand")))?;
        writer.write_event(Event::End(BytesEnd::new("operations")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("mutate")))?;
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

/// Pull `totalNumEntries` and every `entries` element out of a query
/// response, descending through whatever envelope wraps them.
fn parse_query_response(body: &str) -> Result<(Vec<AdGroupExtensionSetting>, i64)> {
    let mut reader = Reader::from_str(body);
    let mut entries = Vec::new();
    let mut total = 0i64;
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"totalNumEntries" => {
                    total = read_trimmed(&mut reader, e.name())?.parse().unwrap_or_default();
                }
                b"entries" => {
                    entries.push(AdGroupExtensionSetting::read_xml(&mut reader, "entries")?);
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok((entries, total))
}

/// Mutate responses return the settings as repeated `rval > value` elements.
fn parse_mutate_response(body: &str) -> Result<Vec<AdGroupExtensionSetting>> {
    let mut reader = Reader::from_str(body);
    let mut settings = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if e.local_name().as_ref() == b"value" {
                    settings.push(AdGroupExtensionSetting::read_xml(&mut reader, "value")?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_envelope_wraps_awql() {
        let body = build_query_envelope("SELECT AdGroupId WHERE Status = 'ENABLED'").unwrap();
        assert!(body.contains(&format!("<query xmlns=\"{}\">", BASE_NS)));
        assert!(body.contains("<query>SELECT AdGroupId WHERE Status = &apos;ENABLED&apos;</query>"));
    }

    #[test]
    fn test_parse_query_response_preserves_document_order() {
        let body = "<queryResponse><rval>\
                    <totalNumEntries>2</totalNumEntries>\
                    <entries><adGroupId>1</adGroupId><extensionType>CALL</extensionType></entries>\
                    <entries><adGroupId>2</adGroupId><extensionType>CALL</extensionType></entries>\
                    </rval></queryResponse>";
        let (entries, total) = parse_query_response(body).unwrap();
        assert_eq!(total, 2);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].ad_group_id, 1);
        assert_eq!(entries[1].ad_group_id, 2);
    }
}
