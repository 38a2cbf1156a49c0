use serde::Serialize;

/// Yes/no gate in front of destructive or outbound actions.
pub trait ConfirmationPrompt {
    fn confirm(&self, question: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusMessage {
    pub tone: StatusTone,
    pub text: String,
}

/// Non-blocking message area of a screen. Holds the latest outcome only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusRegion {
    current: Option<StatusMessage>,
}

impl StatusRegion {
    pub fn success(&mut self, text: impl Into<String>) {
        self.current = Some(StatusMessage {
            tone: StatusTone::Success,
            text: text.into(),
        });
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.current = Some(StatusMessage {
            tone: StatusTone::Error,
            text: text.into(),
        });
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&StatusMessage> {
        self.current.as_ref()
    }

    pub fn error_text(&self) -> Option<&str> {
        self.current
            .as_ref()
            .filter(|message| message.tone == StatusTone::Error)
            .map(|message| message.text.as_str())
    }
}
