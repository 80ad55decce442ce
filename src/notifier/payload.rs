use serde::Serialize;

pub const WEBHOOK_USERNAME: &str = "Conmon";
pub const WEBHOOK_ICON: &str = ":bomb:";

/// JSON body posted to a Slack-compatible incoming webhook.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WebhookPayload<'a> {
    pub text: &'a str,
    pub username: &'static str,
    pub icon_emoji: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<&'a str>,
}

impl<'a> WebhookPayload<'a> {
    pub fn new(text: &'a str, channel: Option<&'a str>) -> Self {
        Self {
            text,
            username: WEBHOOK_USERNAME,
            icon_emoji: WEBHOOK_ICON,
            channel,
        }
    }
}
