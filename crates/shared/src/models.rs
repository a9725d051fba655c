use serde::Deserialize;

/// Number of title characters used as the dedup identifier.
pub const ID_LEN: usize = 10;

/// The newest item scraped from the changelog index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogEntry {
    pub date: String,
    pub title: String,
    pub description: String,
    /// Status tag plus its minor text, e.g. "New Feature".
    pub kind: String,
    pub link: String,
    pub id: String,
}

impl ChangelogEntry {
    pub fn new(
        date: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        kind: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let id = dedup_id(&title);
        Self {
            date: date.into(),
            title,
            description: description.into(),
            kind: kind.into(),
            link: link.into(),
            id,
        }
    }
}

/// First `ID_LEN` characters of a title. Two titles sharing that prefix collide.
pub fn dedup_id(title: &str) -> String {
    title.chars().take(ID_LEN).collect()
}

/// Text ready to post, plus the identifier the dedup gate searches for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub text: String,
    pub id: String,
}

impl NotificationMessage {
    pub fn compose(entry: &ChangelogEntry, summary: &str) -> Self {
        let text = format!(
            "🔑 Title: *{}*\n📅 Date: {}\n❓Overview: {}\n🗨️ Description: {}\n\n🌀 Type: {}\n🔗 Link: {}",
            entry.title, entry.date, entry.description, summary, entry.kind, entry.link
        );

        Self {
            text,
            id: entry.id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolledUpdate {
    pub entry: ChangelogEntry,
    pub message: NotificationMessage,
}

/// A message read back from the chat channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_id_takes_ten_chars() {
        assert_eq!(dedup_id("New Checkout Extensibility Features"), "New Checko");
    }

    #[test]
    fn test_dedup_id_short_title() {
        assert_eq!(dedup_id("Tiny"), "Tiny");
        assert_eq!(dedup_id(""), "");
    }

    #[test]
    fn test_dedup_id_respects_char_boundaries() {
        assert_eq!(dedup_id("Überprüfung der Zahlungen"), "Überprüfun");
    }

    #[test]
    fn test_compose_title_line_contains_id() {
        let entry = ChangelogEntry::new(
            "March 5, 2024",
            "New Checkout Extensibility Features",
            "Short overview",
            "New Feature",
            "https://changelog.shopify.com/posts/42",
        );
        let message = NotificationMessage::compose(&entry, "A summary");

        let title_line = message.text.lines().next().unwrap();
        assert_eq!(title_line, "🔑 Title: *New Checkout Extensibility Features*");
        assert!(title_line.contains(&message.id));
        assert!(message.text.contains("🗨️ Description: A summary\n\n🌀 Type: New Feature"));
        assert!(message.text.ends_with("🔗 Link: https://changelog.shopify.com/posts/42"));
    }
}
