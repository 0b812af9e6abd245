//! Entity variants the batcher accepts, and their wire discriminators.
//!
//! The registry is the closed [`OperationGroup`] enum: one variant per
//! supported entity type, each mapped to its operation `xsi:type` in
//! [`OperationGroup::discriminator`]. Entity structs carry a representative
//! field subset only; full per-entity schemas live outside this crate.

use std::io::Write;

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::Result;
use crate::extension::{ExtensionSetting, FeedType};
use crate::types::{Action, ActionMap};
use crate::xml::{read_trimmed, write_text_element};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdGroup {
    pub id: Option<i64>,
    pub campaign_id: i64,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Campaign {
    pub id: Option<i64>,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Budget {
    pub id: Option<i64>,
    pub name: String,
    pub amount_micros: i64,
}

/// Extensions to serve for one ad group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdGroupExtensionSetting {
    pub ad_group_id: i64,
    pub extension_type: FeedType,
    pub extension_setting: ExtensionSetting,
}

/// An entity of a type the registry does not know. Can be queued like any
/// other group but is counted and skipped at upload time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntity {
    pub type_name: String,
    pub fields: Vec<(String, String)>,
}

/// Operation groups the batcher understands, one variant per registered
/// entity type plus the unregistered raw form.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationGroup {
    AdGroups(ActionMap<AdGroup>),
    Campaigns(ActionMap<Campaign>),
    Budgets(ActionMap<Budget>),
    AdGroupExtensionSettings(ActionMap<AdGroupExtensionSetting>),
    Raw(ActionMap<RawEntity>),
}

impl OperationGroup {
    /// Wire discriminator for this group's operations. `None` means the
    /// entity type is not registered and the group cannot be batched.
    pub fn discriminator(&self) -> Option<&'static str> {
        match self {
            OperationGroup::AdGroups(_) => Some("AdGroupOperation"),
            OperationGroup::Campaigns(_) => Some("CampaignOperation"),
            OperationGroup::Budgets(_) => Some("BudgetOperation"),
            OperationGroup::AdGroupExtensionSettings(_) => {
                Some("AdGroupExtensionSettingOperation")
            }
            OperationGroup::Raw(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            OperationGroup::AdGroups(map) => map.len(),
            OperationGroup::Campaigns(map) => map.len(),
            OperationGroup::Budgets(map) => map.len(),
            OperationGroup::AdGroupExtensionSettings(map) => map.len(),
            OperationGroup::Raw(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write one `operations` element per entity, in wire order. Returns the
    /// number written; an unregistered group writes nothing.
    pub(crate) fn write_operations<W: Write>(&self, writer: &mut Writer<W>) -> Result<usize> {
        let Some(xsi_type) = self.discriminator() else {
            return Ok(0);
        };
        match self {
            OperationGroup::AdGroups(map) => {
                write_group(writer, xsi_type, map, AdGroup::write_operand)
            }
            OperationGroup::Campaigns(map) => {
                write_group(writer, xsi_type, map, Campaign::write_operand)
            }
            OperationGroup::Budgets(map) => {
                write_group(writer, xsi_type, map, Budget::write_operand)
            }
            OperationGroup::AdGroupExtensionSettings(map) => {
                write_group(writer, xsi_type, map, AdGroupExtensionSetting::write_operand)
            }
            OperationGroup::Raw(_) => Ok(0),
        }
    }
}

fn write_group<W: Write, T>(
    writer: &mut Writer<W>,
    xsi_type: &str,
    map: &ActionMap<T>,
    write_operand: impl Fn(&T, &mut Writer<W>) -> Result<()>,
) -> Result<usize> {
    let mut written = 0;
    for (action, entity) in map.iter() {
        write_operation(writer, xsi_type, action, |w| write_operand(entity, w))?;
        written += 1;
    }
    Ok(written)
}

fn write_operation<W: Write>(
    writer: &mut Writer<W>,
    xsi_type: &str,
    action: Action,
    operand: impl FnOnce(&mut Writer<W>) -> Result<()>,
) -> Result<()> {
    let mut start = BytesStart::new("operations");
    start.push_attribute(("xsi:type", xsi_type));
    writer.write_event(Event::Start(start))?;
    write_text_element(writer, "operator", action.as_str())?;
    writer.write_event(Event::Start(BytesStart::new("operand")))?;
    operand(writer)?;
    writer.write_event(Event::End(BytesEnd::new("operand")))?;
    writer.write_event(Event::End(BytesEnd::new("operations")))?;
    Ok(())
}

impl AdGroup {
    fn write_operand<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        if let Some(id) = self.id {
            write_text_element(writer, "id", &id.to_string())?;
        }
        write_text_element(writer, "campaignId", &self.campaign_id.to_string())?;
        write_text_element(writer, "name", &self.name)?;
        write_text_element(writer, "status", &self.status)?;
        Ok(())
    }
}

impl Campaign {
    fn write_operand<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        if let Some(id) = self.id {
            write_text_element(writer, "id", &id.to_string())?;
        }
        write_text_element(writer, "name", &self.name)?;
        write_text_element(writer, "status", &self.status)?;
        Ok(())
    }
}

impl Budget {
    fn write_operand<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        if let Some(id) = self.id {
            write_text_element(writer, "budgetId", &id.to_string())?;
        }
        write_text_element(writer, "name", &self.name)?;
        writer.write_event(Event::Start(BytesStart::new("amount")))?;
        write_text_element(writer, "microAmount", &self.amount_micros.to_string())?;
        writer.write_event(Event::End(BytesEnd::new("amount")))?;
        Ok(())
    }
}

impl AdGroupExtensionSetting {
    /// Upgrade raw extensions to the concrete variant named by
    /// `extension_type`. Must run before encoding; raw extensions refuse to
    /// serialize.
    pub fn resolve_extensions(&mut self) -> Result<()> {
        let extensions = std::mem::take(&mut self.extension_setting.extensions);
        for extension in extensions {
            self.extension_setting
                .extensions
                .push(extension.resolve(&self.extension_type)?);
        }
        Ok(())
    }

    pub(crate) fn write_operand<W: Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        write_text_element(writer, "adGroupId", &self.ad_group_id.to_string())?;
        write_text_element(writer, "extensionType", self.extension_type.as_str())?;
        self.extension_setting
            .write_xml(writer, "extensionSetting", "AdGroupExtensionSetting")
    }

    /// Consume children until the `end_name` close tag, leaving unknown
    /// elements alone for forward compatibility.
    pub(crate) fn read_xml(reader: &mut Reader<&[u8]>, end_name: &str) -> Result<Self> {
        let mut setting = AdGroupExtensionSetting::default();
        loop {
            match reader.read_event()? {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"adGroupId" => {
                        setting.ad_group_id =
                            read_trimmed(reader, e.name())?.parse().unwrap_or_default();
                    }
                    b"extensionType" => {
                        setting.extension_type = FeedType::parse(&read_trimmed(reader, e.name())?);
                    }
                    b"extensionSetting" => {
                        setting.extension_setting =
                            ExtensionSetting::read_xml(reader, "extensionSetting")?;
                    }
                    _ => {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminator_registry() {
        let ad_groups = OperationGroup::AdGroups(ActionMap::new());
        assert_eq!(ad_groups.discriminator(), Some("AdGroupOperation"));

        let campaigns = OperationGroup::Campaigns(ActionMap::new());
        assert_eq!(campaigns.discriminator(), Some("CampaignOperation"));

        let settings = OperationGroup::AdGroupExtensionSettings(ActionMap::new());
        assert_eq!(
            settings.discriminator(),
            Some("AdGroupExtensionSettingOperation")
        );
    }

    #[test]
    fn test_raw_group_is_unregistered() {
        let raw = OperationGroup::Raw(ActionMap::new().with(
            Action::Add,
            RawEntity {
                type_name: "Widget".to_string(),
                fields: vec![],
            },
        ));
        assert_eq!(raw.discriminator(), None);
        assert_eq!(raw.len(), 1);
    }

    #[test]
    fn test_resolve_extensions_replaces_raw_in_place() {
        use crate::extension::{Extension, RawFeedItem};

        let mut setting = AdGroupExtensionSetting {
            ad_group_id: 42,
            extension_type: FeedType::Call,
            extension_setting: ExtensionSetting {
                platform_restrictions: vec![],
                extensions: vec![Extension::Raw(RawFeedItem {
                    xsi_type: None,
                    fields: vec![("callPhoneNumber".to_string(), "555".to_string())],
                })],
            },
        };
        setting.resolve_extensions().unwrap();
        assert_eq!(setting.extension_setting.extensions.len(), 1);
        assert!(matches!(
            setting.extension_setting.extensions[0],
            Extension::Call(_)
        ));
    }
}
