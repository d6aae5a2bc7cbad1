//! Session state and chat transcript.

use std::fmt;

use crate::upload::ImageUpload;

/// Opaque token returned by `/analyze` that scopes follow-up chat calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the three analysis panes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResultTab {
    #[default]
    Gemini,
    Llama,
    Final,
}

impl ResultTab {
    pub const ALL: [Self; 3] = [Self::Gemini, Self::Llama, Self::Final];

    pub const fn title(self) -> &'static str {
        match self {
            Self::Gemini => "Gemini Analysis",
            Self::Llama => "Llama Analysis",
            Self::Final => "Final Analysis",
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::Gemini => 0,
            Self::Llama => 1,
            Self::Final => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Gemini => Self::Llama,
            Self::Llama => Self::Final,
            Self::Final => Self::Gemini,
        }
    }

    #[must_use]
    pub const fn prev(self) -> Self {
        match self {
            Self::Gemini => Self::Final,
            Self::Llama => Self::Gemini,
            Self::Final => Self::Llama,
        }
    }
}

/// The selected image and its data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    upload: ImageUpload,
    data_url: String,
}

impl PreviewImage {
    pub fn new(upload: ImageUpload) -> Self {
        let data_url = upload.data_url();
        Self { upload, data_url }
    }

    pub const fn upload(&self) -> &ImageUpload {
        &self.upload
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }
}

/// Process-wide UI state: what is loaded, which session it belongs to, and
/// which pane is showing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub preview: Option<PreviewImage>,
    pub session_id: Option<SessionId>,
    pub active_tab: ResultTab,
}

impl SessionState {
    /// Drop the image, the session and return to the first tab.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub role: Role,
    pub text: String,
}

impl ChatEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            role: Role::Error,
            text: text.into(),
        }
    }
}

/// Append-only chat history for one session.
///
/// The "thinking" placeholder is a flag, never an entry, so it cannot be
/// mistaken for a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    entries: Vec<ChatEntry>,
    thinking: bool,
}

impl Transcript {
    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn push(&mut self, entry: ChatEntry) {
        self.entries.push(entry);
    }

    pub const fn is_thinking(&self) -> bool {
        self.thinking
    }

    pub const fn set_thinking(&mut self, thinking: bool) {
        self.thinking = thinking;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.thinking = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_cycle() {
        assert_eq!(ResultTab::Gemini.next(), ResultTab::Llama);
        assert_eq!(ResultTab::Final.next(), ResultTab::Gemini);
        assert_eq!(ResultTab::Gemini.prev(), ResultTab::Final);
        for tab in ResultTab::ALL {
            assert_eq!(tab.next().prev(), tab);
            assert_eq!(ResultTab::from_index(tab.index()), Some(tab));
        }
        assert_eq!(ResultTab::from_index(3), None);
    }

    #[test]
    fn test_session_reset_clears_everything() {
        let upload = ImageUpload::from_bytes("a.png".to_string(), vec![1, 2, 3]).unwrap();
        let mut state = SessionState {
            preview: Some(PreviewImage::new(upload)),
            session_id: Some(SessionId::new("abc")),
            active_tab: ResultTab::Final,
        };
        state.reset();
        assert_eq!(state, SessionState::default());
        assert_eq!(state.active_tab, ResultTab::Gemini);
    }

    #[test]
    fn test_preview_keeps_data_url() {
        let upload = ImageUpload::from_bytes("a.png".to_string(), b"GIF".to_vec()).unwrap();
        let preview = PreviewImage::new(upload);
        assert_eq!(preview.data_url(), "data:image/png;base64,R0lG");
        assert_eq!(preview.upload().file_name(), "a.png");
    }

    #[test]
    fn test_transcript_thinking_is_not_an_entry() {
        let mut transcript = Transcript::default();
        transcript.push(ChatEntry::user("hi"));
        transcript.set_thinking(true);
        assert_eq!(transcript.len(), 1);
        assert!(transcript.is_thinking());

        transcript.clear();
        assert!(transcript.is_empty());
        assert!(!transcript.is_thinking());
    }
}
