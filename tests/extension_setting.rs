use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use adbatch::service::AD_GROUP_EXTENSION_SETTING_SERVICE_URL;
use adbatch::{
    Action, ActionMap, AdGroupExtensionSetting, AdGroupExtensionSettingService, AuthSession,
    CallFeedItem, Error, Extension, ExtensionSetting, FeedType, RawFeedItem,
};

/// Canned session that records the one request it serves.
#[derive(Default)]
struct StubSession {
    reply: String,
    last_request: Mutex<Option<(String, String, String)>>,
}

impl StubSession {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            last_request: Mutex::new(None),
        })
    }

    fn last_request(&self) -> Option<(String, String, String)> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuthSession for StubSession {
    async fn request(
        &self,
        service_url: &str,
        action: &str,
        body: String,
    ) -> adbatch::Result<String> {
        *self.last_request.lock().unwrap() =
            Some((service_url.to_string(), action.to_string(), body));
        Ok(self.reply.clone())
    }
}

fn call_setting(ad_group_id: i64) -> AdGroupExtensionSetting {
    AdGroupExtensionSetting {
        ad_group_id,
        extension_type: FeedType::Call,
        extension_setting: ExtensionSetting {
            platform_restrictions: vec!["MOBILE".to_string()],
            extensions: vec![Extension::Raw(RawFeedItem {
                xsi_type: None,
                fields: vec![
                    ("callPhoneNumber".to_string(), "6505551234".to_string()),
                    ("callCountryCode".to_string(), "US".to_string()),
                    ("callTracking".to_string(), "true".to_string()),
                ],
            })],
        },
    }
}

#[tokio::test]
async fn test_mutate_resolves_raw_extensions_and_encodes_discriminators() {
    let reply = "<mutateResponse><rval><value>\
                 <adGroupId>42</adGroupId>\
                 <extensionType>CALL</extensionType>\
                 <extensionSetting>\
                 <platformRestrictions>MOBILE</platformRestrictions>\
                 <extensions xsi:type=\"CallFeedItem\">\
                 <callPhoneNumber>6505551234</callPhoneNumber>\
                 <callCountryCode>US</callCountryCode>\
                 <callTracking>true</callTracking>\
                 </extensions>\
                 </extensionSetting>\
                 </value></rval></mutateResponse>";
    let session = StubSession::replying(reply);
    let service = AdGroupExtensionSettingService::new(session.clone());

    let operations = ActionMap::new().with(Action::Add, call_setting(42));
    let settings = service.mutate(operations).await.unwrap();

    let (url, action, body) = session.last_request().unwrap();
    assert_eq!(url, AD_GROUP_EXTENSION_SETTING_SERVICE_URL);
    assert_eq!(action, "mutate");
    assert!(body.contains("<operator>ADD</operator>"));
    assert!(body.contains("<extensionSetting xsi:type=\"AdGroupExtensionSetting\">"));
    assert!(body.contains("<extensions xsi:type=\"CallFeedItem\">"));
    assert!(body.contains("<callPhoneNumber>6505551234</callPhoneNumber>"));

    assert_eq!(settings.len(), 1);
    assert_eq!(settings[0].ad_group_id, 42);
    assert_eq!(
        settings[0].extension_setting.extensions[0],
        Extension::Call(CallFeedItem {
            phone_number: "6505551234".to_string(),
            country_code: "US".to_string(),
            call_tracking: true,
        })
    );
}

#[tokio::test]
async fn test_mutate_unknown_feed_type_fails_before_sending() {
    let session = StubSession::replying("<mutateResponse/>");
    let service = AdGroupExtensionSettingService::new(session.clone());

    let mut setting = call_setting(7);
    setting.extension_type = FeedType::Sitelink;
    let operations = ActionMap::new().with(Action::Add, setting);

    let err = service.mutate(operations).await.unwrap_err();
    assert!(matches!(err, Error::UnknownExtensionType(_)));
    assert!(session.last_request().is_none());
}

#[tokio::test]
async fn test_query_decodes_entries_and_ignores_unknown_children() -> anyhow::Result<()> {
    let reply = "<queryResponse><rval>\
                 <totalNumEntries>2</totalNumEntries>\
                 <entries>\
                 <adGroupId>1</adGroupId>\
                 <extensionType>CALL</extensionType>\
                 <extensionSetting>\
                 <futureKnob>ignored</futureKnob>\
                 <platformRestrictions>DESKTOP</platformRestrictions>\
                 <extensions xsi:type=\"CallFeedItem\">\
                 <callPhoneNumber>555</callPhoneNumber>\
                 <callCountryCode>GB</callCountryCode>\
                 <callTracking>false</callTracking>\
                 </extensions>\
                 </extensionSetting>\
                 </entries>\
                 <entries>\
                 <adGroupId>2</adGroupId>\
                 <extensionType>PRICE</extensionType>\
                 </entries>\
                 </rval></queryResponse>";
    let session = StubSession::replying(reply);
    let service = AdGroupExtensionSettingService::new(session.clone());

    let (entries, total) = service.query("SELECT AdGroupId").await?;

    let (_, action, body) = session.last_request().unwrap();
    assert_eq!(action, "query");
    assert!(body.contains("<query>SELECT AdGroupId</query>"));

    assert_eq!(total, 2);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].ad_group_id, 1);
    assert_eq!(
        entries[0].extension_setting.platform_restrictions,
        vec!["DESKTOP".to_string()]
    );
    assert_eq!(
        entries[0].extension_setting.extensions[0],
        Extension::Call(CallFeedItem {
            phone_number: "555".to_string(),
            country_code: "GB".to_string(),
            call_tracking: false,
        })
    );
    // Feed types this crate has no codec for survive verbatim.
    assert_eq!(entries[1].extension_type, FeedType::Other("PRICE".to_string()));
    Ok(())
}
