//! Load status reporting.
//!
//! [`StatusDisplay`] is the native stand-in for the host page's status
//! element: a small piece of text the presentation layer shows while the
//! model downloads, hides on success and turns into a fixed error line on
//! failure.

/// Fixed text shown when the model fails to load. There is no retry and no
/// fallback asset; this string is the terminal state.
pub const LOAD_FAILURE_TEXT: &str = "Failed to load avatar. See log for details.";

/// Visual tone of the status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Info,
    Error,
}

/// Mutable status line state, owned by the presentation layer.
#[derive(Debug, Clone)]
pub struct StatusDisplay {
    text: String,
    tone: StatusTone,
    visible: bool,
}

impl Default for StatusDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusDisplay {
    #[must_use]
    pub fn new() -> Self {
        Self {
            text: "LOADING...".to_string(),
            tone: StatusTone::Info,
            visible: true,
        }
    }

    /// Updates the line with a download percentage, when one is known.
    pub fn set_progress(&mut self, percent: Option<u8>) {
        self.visible = true;
        self.tone = StatusTone::Info;
        self.text = match percent {
            Some(p) => format!("LOADING... {p}%"),
            None => "LOADING...".to_string(),
        };
    }

    /// The load completed; the line disappears.
    pub fn finish(&mut self) {
        self.visible = false;
    }

    /// The load failed; the line becomes the fixed failure message.
    pub fn fail(&mut self) {
        self.visible = true;
        self.tone = StatusTone::Error;
        self.text = LOAD_FAILURE_TEXT.to_string();
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn tone(&self) -> StatusTone {
        self.tone
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }
}

/// Integer completion percentage for a partially received payload:
/// `floor(loaded / total * 100)`, clamped to 100. Returns `None` when the
/// total size is unknown or zero.
#[must_use]
pub fn percent_complete(loaded: u64, total: Option<u64>) -> Option<u8> {
    let total = total.filter(|t| *t > 0)?;
    let pct = (loaded as f64 / total as f64 * 100.0).floor();
    Some(pct.clamp(0.0, 100.0) as u8)
}
