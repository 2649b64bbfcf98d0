//! Everything this crate knows about the Opus UI: ids, labels, titles and
//! the status literal. Opus updates that change wording land here.

use crate::driver::{Frame, Selector, Target};

pub const USERNAME_FIELD: &str = "User Account";
pub const PASSWORD_FIELD: &str = "Password";
pub const SIGN_IN_BUTTON: &str = "Sign in";
pub const LOGIN_ERROR: &str = "#errorText";

/// Side menu toggle shown after login.
pub const MENU_BUTTON: &str = "#externalCol button";
pub const MENU_DOCUMENT_PROCESSING: &str = "Bilagsbehandling";
pub const MENU_CREATE_REALLOCATION: &str = "Opret omposteringsbilag";

pub const CONTENT_FRAME: &str = "contentAreaFrame";
pub const WORK_AREA_FRAME: &str = "isolatedWorkArea";

pub const LABEL_BOOKING_DATE: &str = "Bogføringsdato";
pub const LABEL_TEXT: &str = "Tekst";
pub const LABEL_REFERENCE: &str = "Reference";
/// The comment field has no label of its own; it follows this one in tab order.
pub const LABEL_CURRENCY: &str = "Valuta";

pub const ATTACH_DOCUMENT_BUTTON: &str = r#"div[title="Vedhæft et nyt dokument"]"#;
pub const IMPORT_POSTINGS_BUTTON: &str = r#"div[title="Importer konteringslinjer fra EXCEL"]"#;
pub const CHECK_DOCUMENT_BUTTON: &str = r#"div[title*="Kontroller bilag"]"#;

pub const FILE_INPUT: &str = r#"input[type="file"]"#;
pub const POPUP_OK_BUTTON: &str =
    "//div[contains(concat(' ', normalize-space(@class), ' '), ' lsButton ')][.//span[normalize-space()='OK']]";

pub const STATUS_MESSAGES: &str =
    "table.lsHTMLContainer.lsScrollContainer--positionscrolling span.lsTextView";

/// Status text Opus shows when the reallocation document passed its check.
pub const STATUS_DOCUMENT_OK: &str = "Omposteringsbilaget er kontrolleret og OK";

/// Popup iframe name fragments, most specific first.
pub const UPLOAD_FRAME_PATTERNS: [&str; 7] =
    ["URLSPW", "SPW", "popup", "dialog", "modal", "content", "work"];

/// The form's nested frame path.
pub fn work_area_frames() -> Vec<Frame> {
    vec![
        Frame::Id(CONTENT_FRAME.to_string()),
        Frame::Id(WORK_AREA_FRAME.to_string()),
    ]
}

/// An element inside the form's nested frames.
pub fn in_work_area(selector: Selector) -> Target {
    Target::in_frames(work_area_frames(), selector)
}

pub fn file_input_in(frame: &Frame) -> Target {
    Target::in_frames(vec![frame.clone()], Selector::css(FILE_INPUT))
}

pub fn ok_button_in(frame: &Frame) -> Target {
    Target::in_frames(
        vec![frame.clone()],
        Selector::XPath(POPUP_OK_BUTTON.to_string()),
    )
}
