//! Shared fixtures: a valid invoice on disk and a scripted Opus UI.

#![allow(dead_code)]

use opus_invoice::selectors::{FILE_INPUT, LOGIN_ERROR, STATUS_DOCUMENT_OK, STATUS_MESSAGES};
use opus_invoice::{
    DriverError, DriverResult, Frame, InvoiceData, Key, OpusConfig, RawInvoice, Selector,
    Target, UiDriver,
};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;
use tempfile::TempDir;

pub fn config() -> OpusConfig {
    OpusConfig::new(370, r"samdrift\JX00999998", "kode1234").unwrap()
}

/// Creates `opus.csv` and `bilag.txt` in `dir` and returns a complete,
/// valid invoice mapping pointing at them.
pub fn valid_json(dir: &TempDir) -> Value {
    let csv_path = dir.path().join("opus.csv");
    let bilag_path = dir.path().join("bilag.txt");
    fs::write(&csv_path, "").unwrap();
    fs::write(&bilag_path, "faktura").unwrap();

    json!({
        "Debet_PSP": "XG-0000000204-00001",
        "Kredit_PSP": "XG-0000002473-00029",
        "Tekst": "Test af tekst",
        "Reference": "test af reference",
        "Bogføringsdato": "12.09.2025",
        "Kommentar": "test af comment",
        "Debet_Artskonto": "40000000",
        "Kredit_Artskonto": "40000000",
        "Debet_PosteringsTekst": "Test af posterings tekst",
        "Kredit_PosteringsTekst": "Test af posterings tekst",
        "Kost": 4444.22,
        "BilagsFilePath": bilag_path.display().to_string(),
        "csv_filename": csv_path.display().to_string(),
    })
}

pub fn parse(value: Value) -> Result<InvoiceData, opus_invoice::ValidationError> {
    let raw: RawInvoice = serde_json::from_value(value).unwrap();
    InvoiceData::try_from(raw)
}

pub fn invoice(dir: &TempDir) -> InvoiceData {
    parse(valid_json(dir)).unwrap()
}

pub fn invoice_with(dir: &TempDir, key: &str, value: Value) -> InvoiceData {
    let mut json = valid_json(dir);
    json[key] = value;
    parse(json).unwrap()
}

/// What the fake driver was asked to do, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Launch,
    Goto(String),
    Fill(String, String),
    Click(String),
    Key(Key),
    Type(String),
    Upload(String, PathBuf),
    Pause(Duration),
    Close,
}

/// How the scripted Opus instance behaves.
#[derive(Debug, Clone, Default)]
pub struct Script {
    /// Text of `#errorText` after signing in.
    pub login_error: Option<String>,
    /// Spans in the status message area after "check document".
    pub status_messages: Vec<String>,
    /// Name of the upload popup iframe that holds the file input.
    pub popup_frame: Option<String>,
    /// Targets whose description contains any of these do not exist.
    pub missing: Vec<String>,
    pub load_times_out: bool,
    /// Candidate frames whose file input lookup fails with a driver error.
    pub broken_frames: Vec<Frame>,
    /// Time each file input lookup takes.
    pub lookup_delay: Duration,
}

impl Script {
    /// Opus accepting the document.
    pub fn accepting() -> Self {
        Script {
            status_messages: vec![STATUS_DOCUMENT_OK.to_string()],
            popup_frame: Some("URLSPW-0".to_string()),
            ..Script::default()
        }
    }
}

pub type Recording = Rc<RefCell<Vec<Action>>>;

pub struct FakeOpus {
    script: Script,
    actions: Recording,
}

impl FakeOpus {
    pub fn new(script: Script) -> (Self, Recording) {
        let actions = Recording::default();
        let driver = FakeOpus {
            script,
            actions: actions.clone(),
        };
        (driver, actions)
    }

    fn record(&self, action: Action) {
        self.actions.borrow_mut().push(action);
    }

    fn exists(&self, target: &Target) -> bool {
        let description = target.to_string();
        !self
            .script
            .missing
            .iter()
            .any(|m| description.contains(m.as_str()))
    }

    fn popup_matches(&self, frame: &Frame) -> bool {
        let Some(popup) = &self.script.popup_frame else {
            return false;
        };
        match frame {
            Frame::Id(id) => id == popup,
            Frame::NameContains(part) => popup.contains(part.as_str()),
            Frame::AnyVisible => true,
        }
    }
}

fn is_css(target: &Target, css: &str) -> bool {
    target.selector == Selector::Css(css.to_string())
}

impl UiDriver for FakeOpus {
    async fn launch(&mut self) -> DriverResult<()> {
        self.record(Action::Launch);
        Ok(())
    }

    async fn goto(&mut self, url: &str) -> DriverResult<()> {
        self.record(Action::Goto(url.to_string()));
        Ok(())
    }

    async fn fill(&mut self, target: &Target, value: &str) -> DriverResult<()> {
        if !self.exists(target) {
            return Err(DriverError::NotFound(target.to_string()));
        }
        self.record(Action::Fill(target.to_string(), value.to_string()));
        Ok(())
    }

    async fn click(&mut self, target: &Target) -> DriverResult<()> {
        if !self.exists(target) {
            return Err(DriverError::NotFound(target.to_string()));
        }
        self.record(Action::Click(target.to_string()));
        Ok(())
    }

    async fn press_key(&mut self, key: Key) -> DriverResult<()> {
        self.record(Action::Key(key));
        Ok(())
    }

    async fn type_text(&mut self, text: &str) -> DriverResult<()> {
        self.record(Action::Type(text.to_string()));
        Ok(())
    }

    async fn is_visible(&mut self, target: &Target) -> DriverResult<bool> {
        if is_css(target, LOGIN_ERROR) {
            return Ok(self.script.login_error.is_some());
        }
        if is_css(target, FILE_INPUT) {
            if !self.script.lookup_delay.is_zero() {
                tokio::time::sleep(self.script.lookup_delay).await;
            }
            let [frame] = target.frames.as_slice() else {
                return Ok(false);
            };
            if self.script.broken_frames.contains(frame) {
                return Err(DriverError::Command(
                    "stale element reference".to_string(),
                ));
            }
            return Ok(self.popup_matches(frame));
        }
        if is_css(target, STATUS_MESSAGES) {
            return Ok(!self.script.status_messages.is_empty());
        }
        Ok(self.exists(target))
    }

    async fn inner_text(&mut self, target: &Target) -> DriverResult<String> {
        match &self.script.login_error {
            Some(text) if is_css(target, LOGIN_ERROR) => Ok(text.clone()),
            _ => Err(DriverError::NotFound(target.to_string())),
        }
    }

    async fn all_texts(&mut self, target: &Target) -> DriverResult<Vec<String>> {
        if is_css(target, STATUS_MESSAGES) {
            return Ok(self.script.status_messages.clone());
        }
        Ok(Vec::new())
    }

    async fn wait_for_visible(
        &mut self,
        target: &Target,
        _timeout: Duration,
    ) -> DriverResult<bool> {
        self.is_visible(target).await
    }

    async fn wait_for_load(&mut self, _timeout: Duration) -> DriverResult<bool> {
        Ok(!self.script.load_times_out)
    }

    async fn set_input_files(&mut self, target: &Target, path: &Path) -> DriverResult<()> {
        let frame = target
            .frames
            .first()
            .map(ToString::to_string)
            .unwrap_or_default();
        self.record(Action::Upload(frame, path.to_path_buf()));
        Ok(())
    }

    async fn pause(&mut self, duration: Duration) {
        self.record(Action::Pause(duration));
    }

    async fn close(self) -> DriverResult<()> {
        self.record(Action::Close);
        Ok(())
    }
}

pub fn clicks(actions: &[Action]) -> Vec<String> {
    actions
        .iter()
        .filter_map(|a| match a {
            Action::Click(target) => Some(target.clone()),
            _ => None,
        })
        .collect()
}

pub fn typed(actions: &[Action]) -> Vec<String> {
    actions
        .iter()
        .filter_map(|a| match a {
            Action::Type(text) => Some(text.clone()),
            _ => None,
        })
        .collect()
}

pub fn pauses(actions: &[Action], duration: Duration) -> usize {
    actions
        .iter()
        .filter(|a| **a == Action::Pause(duration))
        .count()
}

pub fn uploads(actions: &[Action]) -> Vec<(String, PathBuf)> {
    actions
        .iter()
        .filter_map(|a| match a {
            Action::Upload(frame, path) => Some((frame.clone(), path.clone())),
            _ => None,
        })
        .collect()
}
