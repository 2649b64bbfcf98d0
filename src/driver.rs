//! The browser capability the submission flow is written against.
//!
//! Targets are plain data, so tests can script a driver against them.
//! [`WebDriverSession`](crate::WebDriverSession) is the production
//! implementation.

use crate::error::DriverError;
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// A frame to descend into, evaluated from the top-level document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// `<iframe id="...">`
    Id(String),
    /// First `<iframe>` whose `name` contains the substring.
    NameContains(String),
    /// First displayed `<iframe>`.
    AnyVisible,
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Id(id) => write!(f, "#{}", id),
            Frame::NameContains(part) => write!(f, "iframe[name*={:?}]", part),
            Frame::AnyVisible => write!(f, "iframe:visible"),
        }
    }
}

/// Accessible role used with [`Selector::Role`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    TextBox,
    Button,
}

/// How an element is found inside its frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Element with an accessible role and name (label, aria-label, value).
    Role { role: Role, name: String },
    /// Element whose own text equals (`exact`) or contains `text`.
    Text { text: String, exact: bool },
    Css(String),
    XPath(String),
}

impl Selector {
    pub fn textbox(name: &str) -> Self {
        Selector::Role {
            role: Role::TextBox,
            name: name.to_string(),
        }
    }

    pub fn button(name: &str) -> Self {
        Selector::Role {
            role: Role::Button,
            name: name.to_string(),
        }
    }

    pub fn text(text: &str) -> Self {
        Selector::Text {
            text: text.to_string(),
            exact: false,
        }
    }

    pub fn exact_text(text: &str) -> Self {
        Selector::Text {
            text: text.to_string(),
            exact: true,
        }
    }

    pub fn css(css: &str) -> Self {
        Selector::Css(css.to_string())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Role { role, name } => write!(f, "{:?} {:?}", role, name),
            Selector::Text { text, exact: true } => write!(f, "text {:?}", text),
            Selector::Text { text, exact: false } => write!(f, "text containing {:?}", text),
            Selector::Css(css) => f.write_str(css),
            Selector::XPath(xpath) => f.write_str(xpath),
        }
    }
}

/// An element reached through zero or more nested frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub frames: Vec<Frame>,
    pub selector: Selector,
}

impl Target {
    /// Element in the top-level document.
    pub fn page(selector: Selector) -> Self {
        Target {
            frames: Vec::new(),
            selector,
        }
    }

    pub fn in_frames(frames: Vec<Frame>, selector: Selector) -> Self {
        Target { frames, selector }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for frame in &self.frames {
            write!(f, "{} > ", frame)?;
        }
        write!(f, "{}", self.selector)
    }
}

/// Keystrokes sent to the focused element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Tab,
    Delete,
    /// Ctrl+A, or Cmd+A on macOS.
    SelectAll,
}

/// Browser operations needed to drive Opus.
///
/// One driver serves exactly one submission; every method takes `&mut self`
/// and runs to completion before the next step starts. Keyboard input goes
/// to whichever element holds focus in the frame last interacted with.
#[allow(async_fn_in_trait)]
pub trait UiDriver: Sized {
    /// Starts the browser (or connects to it).
    async fn launch(&mut self) -> DriverResult<()>;

    async fn goto(&mut self, url: &str) -> DriverResult<()>;

    /// Replaces the value of an input element.
    async fn fill(&mut self, target: &Target, value: &str) -> DriverResult<()>;

    async fn click(&mut self, target: &Target) -> DriverResult<()>;

    async fn press_key(&mut self, key: Key) -> DriverResult<()>;

    async fn type_text(&mut self, text: &str) -> DriverResult<()>;

    /// `false` when no matching element is displayed, including when the
    /// target's frames do not exist.
    async fn is_visible(&mut self, target: &Target) -> DriverResult<bool>;

    async fn inner_text(&mut self, target: &Target) -> DriverResult<String>;

    /// Text of every matching element, in document order.
    async fn all_texts(&mut self, target: &Target) -> DriverResult<Vec<String>>;

    /// Polls until the target is displayed. Returns `false` on expiry.
    async fn wait_for_visible(&mut self, target: &Target, timeout: Duration)
        -> DriverResult<bool>;

    /// Waits for the page to finish loading. Returns `false` on expiry.
    async fn wait_for_load(&mut self, timeout: Duration) -> DriverResult<bool>;

    /// Hands `path` to a native file input.
    async fn set_input_files(&mut self, target: &Target, path: &Path) -> DriverResult<()>;

    /// Fixed delay, for UI states that expose no readiness signal.
    async fn pause(&mut self, duration: Duration);

    /// Ends the browser session.
    async fn close(self) -> DriverResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_display_lists_frames() {
        let target = Target::in_frames(
            vec![
                Frame::Id("contentAreaFrame".to_string()),
                Frame::Id("isolatedWorkArea".to_string()),
            ],
            Selector::exact_text("Tekst"),
        );
        assert_eq!(
            target.to_string(),
            "#contentAreaFrame > #isolatedWorkArea > text \"Tekst\""
        );
    }

    #[test]
    fn test_page_target_has_no_frames() {
        let target = Target::page(Selector::textbox("User Account"));
        assert!(target.frames.is_empty());
        assert_eq!(target.to_string(), "TextBox \"User Account\"");
    }
}
