//! Extension-setting codec.
//!
//! On the wire an extension setting's `extensions` children are a tagged
//! union: each element names its concrete variant in an `xsi:type`
//! attribute. Structural (de)serialization cannot branch on that tag, so
//! this codec walks the token stream by hand. Adding a variant means one arm
//! in the encode match and one in the decode dispatch; the envelope-level
//! code never changes.

use std::io::Write;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use tracing::debug;

use crate::error::{Error, Result};
use crate::xml::{read_trimmed, write_text_element, xsi_type_of};

const CALL_FEED_ITEM: &str = "CallFeedItem";

/// Feed type tag carried next to an extension setting. Drives the upgrade of
/// raw extensions to their concrete variant.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FeedType {
    #[default]
    Call,
    Sitelink,
    Callout,
    /// A feed type this crate has no codec for, kept verbatim.
    Other(String),
}

impl FeedType {
    pub fn as_str(&self) -> &str {
        match self {
            FeedType::Call => "CALL",
            FeedType::Sitelink => "SITELINK",
            FeedType::Callout => "CALLOUT",
            FeedType::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "CALL" => FeedType::Call,
            "SITELINK" => FeedType::Sitelink,
            "CALLOUT" => FeedType::Callout,
            other => FeedType::Other(other.to_string()),
        }
    }
}

/// Platform restrictions plus the extension variants served together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionSetting {
    pub platform_restrictions: Vec<String>,
    pub extensions: Vec<Extension>,
}

/// One member of the extension tagged union.
#[derive(Debug, Clone, PartialEq)]
pub enum Extension {
    Call(CallFeedItem),
    /// Wire content whose discriminator no decoder claims, kept verbatim so
    /// a later upgrade by feed type can still classify it.
    Raw(RawFeedItem),
}

/// Call extension fields (representative subset).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallFeedItem {
    pub phone_number: String,
    pub country_code: String,
    pub call_tracking: bool,
}

/// Untyped key/value capture of an unrecognized extension element.
/// Field order is document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeedItem {
    pub xsi_type: Option<String>,
    pub fields: Vec<(String, String)>,
}

impl ExtensionSetting {
    /// Encode as `<{name} xsi:type="{xsi_type}">`: platform restrictions
    /// first, then each extension through its variant encoder.
    pub fn to_xml(&self, name: &str, xsi_type: &str) -> Result<String> {
        let mut writer = Writer::new(Vec::new());
        self.write_xml(&mut writer, name, xsi_type)?;
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }

    /// Decode a fragment whose root element is the setting itself.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    return Self::read_xml(&mut reader, &name);
                }
                Event::Eof => return Ok(ExtensionSetting::default()),
                _ => {}
            }
        }
    }

    pub(crate) fn write_xml<W: Write>(
        &self,
        writer: &mut Writer<W>,
        name: &str,
        xsi_type: &str,
    ) -> Result<()> {
        let mut start = BytesStart::new(name);
        start.push_attribute(("xsi:type", xsi_type));
        writer.write_event(Event::Start(start))?;
        for restriction in &self.platform_restrictions {
            write_text_element(writer, "platformRestrictions", restriction)?;
        }
        for extension in &self.extensions {
            extension.write_xml(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// Consume children until the `end_name` close tag. Unknown child names
    /// are schema additions we do not understand yet and are skipped whole.
    pub(crate) fn read_xml(reader: &mut Reader<&[u8]>, end_name: &str) -> Result<Self> {
        let mut setting = ExtensionSetting::default();
        loop {
            match reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"platformRestrictions" => {
                        setting
                            .platform_restrictions
                            .push(read_trimmed(reader, e.name())?);
                    }
                    b"extensions" => {
                        let extension = Extension::read_xml(reader, &e)?;
                        setting.extensions.push(extension);
                    }
                    other => {
                        debug!(
                            element = %String::from_utf8_lossy(other),
                            "skipping unknown extension setting child"
                        );
                        reader.read_to_end(e.name())?;
                    }
                },
                Event::End(e) if e.local_name().as_ref() == end_name.as_bytes() => break,
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(setting)
    }
}

impl Extension {
    /// Upgrade an unresolved extension to the concrete variant named by the
    /// feed type. Already-concrete extensions pass through untouched.
    pub fn resolve(self, feed_type: &FeedType) -> Result<Extension> {
        match self {
            Extension::Raw(raw) => match feed_type {
                FeedType::Call => Ok(Extension::Call(CallFeedItem::from_raw(&raw))),
                other => Err(Error::UnknownExtensionType(other.as_str().to_string())),
            },
            resolved => Ok(resolved),
        }
    }

    fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        match self {
            Extension::Call(item) => item.write_xml(writer),
            // Refusing beats emitting XML the service will reject wholesale.
            Extension::Raw(item) => Err(Error::UnknownExtensionType(
                item.xsi_type.clone().unwrap_or_default(),
            )),
        }
    }

    /// Dispatch on the element's `xsi:type`. Discriminators without a
    /// registered decoder fall back to a raw capture.
    pub(crate) fn read_xml(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Self> {
        let xsi_type = xsi_type_of(start);
        match xsi_type.as_deref() {
            Some(CALL_FEED_ITEM) => Ok(Extension::Call(CallFeedItem::read_xml(reader)?)),
            _ => Ok(Extension::Raw(RawFeedItem::read_xml(reader, xsi_type)?)),
        }
    }
}

impl CallFeedItem {
    fn write_xml<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new("extensions");
        start.push_attribute(("xsi:type", CALL_FEED_ITEM));
        writer.write_event(Event::Start(start))?;
        write_text_element(writer, "callPhoneNumber", &self.phone_number)?;
        write_text_element(writer, "callCountryCode", &self.country_code)?;
        write_text_element(
            writer,
            "callTracking",
            if self.call_tracking { "true" } else { "false" },
        )?;
        writer.write_event(Event::End(BytesEnd::new("extensions")))?;
        Ok(())
    }

    fn read_xml(reader: &mut Reader<&[u8]>) -> Result<Self> {
        let mut item = CallFeedItem::default();
        loop {
            match reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"callPhoneNumber" => item.phone_number = read_trimmed(reader, e.name())?,
                    b"callCountryCode" => item.country_code = read_trimmed(reader, e.name())?,
                    b"callTracking" => {
                        item.call_tracking = read_trimmed(reader, e.name())? == "true";
                    }
                    _ => {
                        reader.read_to_end(e.name())?;
                    }
                },
                Event::End(e) if e.local_name().as_ref() == b"extensions" => break,
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(item)
    }

    fn from_raw(raw: &RawFeedItem) -> Self {
        let mut item = CallFeedItem::default();
        for (name, value) in &raw.fields {
            match name.as_str() {
                "callPhoneNumber" => item.phone_number = value.clone(),
                "callCountryCode" => item.country_code = value.clone(),
                "callTracking" => item.call_tracking = value == "true",
                _ => {}
            }
        }
        item
    }
}

impl RawFeedItem {
    fn read_xml(reader: &mut Reader<&[u8]>, xsi_type: Option<String>) -> Result<Self> {
        let mut item = RawFeedItem {
            xsi_type,
            fields: Vec::new(),
        };
        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    let value = read_trimmed(reader, e.name())?;
                    item.fields.push((name, value));
                }
                Event::End(e) if e.local_name().as_ref() == b"extensions" => break,
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(item)
    }
}
