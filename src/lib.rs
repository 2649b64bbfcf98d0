//! # Opus Invoice
//!
//! Creates a reallocation document (omposteringsbilag) in the Opus ERP for a
//! single debit/credit posting pair.
//!
//! ## Flow
//!
//! 1. [`InvoiceData`] validates the caller's raw values.
//! 2. The postings are written to a 25-column, semicolon-separated CSV.
//! 3. A [`UiDriver`] logs in, opens the reallocation form, fills it, uploads
//!    the optional attachment and the CSV, and runs the document check.
//! 4. The status text Opus shows is mapped to a [`SubmissionResult`].
//!
//! ## Example
//!
//! ```no_run
//! use opus_invoice::{
//!     create_invoice, InvoiceData, OpusConfig, RawInvoice, SessionLogger, SessionOptions,
//! };
//!
//! # async fn run() -> opus_invoice::Result<()> {
//! let config = OpusConfig::new(370, r"samdrift\bruger", "hemmeligt")?;
//! let raw: RawInvoice = serde_json::from_str(&std::fs::read_to_string("invoice.json")?)?;
//! let invoice = InvoiceData::try_from(raw)?;
//!
//! let result = create_invoice(
//!     config,
//!     invoice,
//!     SessionOptions::default(),
//!     SessionLogger::global(),
//! )
//! .await?;
//! println!("{}", result.message);
//! # Ok(())
//! # }
//! ```

pub mod amount;
pub mod config;
pub mod driver;
pub mod error;
pub mod export;
pub mod invoice;
pub mod logger;
pub mod outcome;
pub mod probe;
pub mod selectors;
pub mod session;
pub mod webdriver;

pub use amount::Amount;
pub use config::{OpusConfig, RawOpusConfig, SessionOptions, Timeouts};
pub use driver::{DriverResult, Frame, Key, Role, Selector, Target, UiDriver};
pub use error::{
    DriverError, Error, Field, FieldError, FlowError, FlowState, InvoiceError, Phase, Result,
    Rule, ValidationError,
};
pub use export::{write_csv, write_postings, OPUS_CSV_HEADERS};
pub use invoice::{AccountCode, InvoiceData, RawInvoice, RawValue};
pub use logger::SessionLogger;
pub use outcome::{classify, Status, SubmissionResult};
pub use probe::{FixedFrame, FramePatternProbe, UploadFrameLocator};
pub use session::{create_invoice, InvoiceSession};
pub use webdriver::WebDriverSession;
