use serde::{Deserialize, Serialize};

/// A conversation the signed-in user participates in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    /// Unique identifier of the chat.
    pub id: String,

    /// Human-readable title, if one was set.
    #[serde(default)]
    pub title: Option<String>,

    /// Name of the bridged IRC channel, if this chat mirrors one.
    #[serde(default)]
    pub irc_channel_name: Option<String>,

    /// Identifier of the user who owns the chat.
    pub owner_id: String,
}

impl Chat {
    /// The label to show for this chat: title, channel name, or the id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.title
            .as_deref()
            .or(self.irc_channel_name.as_deref())
            .unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_decodes_wire_format() {
        let json = r##"{"id":"c-1","title":"ops","ircChannelName":"#ops","ownerId":"u-9"}"##;
        let chat: Chat = serde_json::from_str(json).unwrap();
        assert_eq!(chat.irc_channel_name.as_deref(), Some("#ops"));
        assert_eq!(chat.display_name(), "ops");
    }

    #[test]
    fn test_display_name_falls_back_to_channel_then_id() {
        let json = r##"{"id":"c-2","ircChannelName":"#dev","ownerId":"u-9"}"##;
        let chat: Chat = serde_json::from_str(json).unwrap();
        assert_eq!(chat.display_name(), "#dev");

        let json = r#"{"id":"c-3","ownerId":"u-9"}"#;
        let chat: Chat = serde_json::from_str(json).unwrap();
        assert_eq!(chat.display_name(), "c-3");
    }
}
