//! Shared quick-xml plumbing for the hand-written wire codecs.

use std::io::Write;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};

use crate::error::Result;

/// Base namespace of the mutate service schema.
pub const BASE_NS: &str = "https://adwords.google.com/api/adwords/cm/v201609";

/// XML Schema-instance namespace binding the `xsi:type` discriminator.
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

pub(crate) fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &str,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(value)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Text content of the current element, whitespace-trimmed.
pub(crate) fn read_trimmed<'a>(reader: &mut Reader<&'a [u8]>, end: QName) -> Result<String> {
    Ok(reader.read_text(end)?.trim().to_string())
}

/// Value of the `xsi:type` attribute, if present, with any namespace prefix
/// on the value stripped (responses may write `ns2:CallFeedItem`).
pub(crate) fn xsi_type_of(start: &BytesStart<'_>) -> Option<String> {
    for attr in start.attributes().flatten() {
        if attr.key.as_ref() == b"xsi:type" {
            let value = String::from_utf8_lossy(&attr.value);
            let local = value.rsplit(':').next().unwrap_or_default();
            return Some(local.to_string());
        }
    }
    None
}
