use serde::{Deserialize, Serialize};

/// The subset of a chat message the resolver looks at.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub entities: Vec<MessageEntity>,
    #[serde(default)]
    pub caption_entities: Vec<MessageEntity>,
    #[serde(default)]
    pub reply_to_message: Option<Box<Message>>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    /// UTF-16 code units from the start of the text.
    pub offset: usize,
    pub length: usize,
    #[serde(default)]
    pub url: Option<String>
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Url,
    TextLink,
    #[serde(other)]
    Other
}

/// Finds the first link in a message, falling back to the message it replies to.
pub fn extract_url(message: &Message) -> Option<String> {
    let chain = std::iter::once(message).chain(message.reply_to_message.as_deref());

    for msg in chain {
        if msg.entities.is_empty() {
            if let Some(entity) = msg
                .caption_entities
                .iter()
                .find(|e| e.kind == EntityKind::TextLink)
            {
                return entity.url.clone();
            }
            continue;
        }

        if let Some(entity) = msg.entities.iter().find(|e| e.kind == EntityKind::Url) {
            let text = msg.text.as_deref().or(msg.caption.as_deref())?;
            return utf16_slice(text, entity.offset, entity.length);
        }
    }

    None
}

fn utf16_slice(text: &str, offset: usize, length: usize) -> Option<String> {
    let units: Vec<u16> = text.encode_utf16().collect();
    let end = offset.checked_add(length)?;
    let span = units.get(offset..end)?;
    String::from_utf16(span).ok()
}
