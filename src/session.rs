//! The submission flow: export the CSV, log in, reach the reallocation form,
//! fill it, upload attachment and postings, and read back the check status.
//!
//! The flow is strictly linear. Each phase either completes or aborts the
//! whole submission with an [`InvoiceError`] naming the phase; nothing is
//! retried. The only non-exceptional failure is Opus rejecting the document,
//! which is reported as a [`SubmissionResult`] with a failure status.

use crate::config::{OpusConfig, SessionOptions};
use crate::driver::{Key, Selector, Target, UiDriver};
use crate::error::{FlowError, FlowState, InvoiceError, Phase};
use crate::export;
use crate::invoice::InvoiceData;
use crate::logger::SessionLogger;
use crate::outcome::{classify, SubmissionResult, NOT_CONTROLLED};
use crate::probe::{FramePatternProbe, UploadFrameLocator};
use crate::selectors::{self, in_work_area};
use crate::webdriver::WebDriverSession;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// One invoice, one browser session.
///
/// Consumed by [`InvoiceSession::submit`], so a session cannot be reused.
pub struct InvoiceSession<D, P = FramePatternProbe> {
    config: OpusConfig,
    invoice: InvoiceData,
    driver: D,
    probe: P,
    options: SessionOptions,
    logger: SessionLogger,
    state: FlowState,
}

impl<D: UiDriver> InvoiceSession<D> {
    pub fn new(
        config: OpusConfig,
        invoice: InvoiceData,
        driver: D,
        options: SessionOptions,
    ) -> Self {
        InvoiceSession {
            config,
            invoice,
            driver,
            probe: FramePatternProbe::default(),
            options,
            logger: SessionLogger::silent(),
            state: FlowState::Idle,
        }
    }
}

impl<D: UiDriver, P: UploadFrameLocator> InvoiceSession<D, P> {
    pub fn with_logger(mut self, logger: SessionLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Replaces the upload-frame probing policy.
    pub fn with_probe<Q: UploadFrameLocator>(self, probe: Q) -> InvoiceSession<D, Q> {
        InvoiceSession {
            config: self.config,
            invoice: self.invoice,
            driver: self.driver,
            probe,
            options: self.options,
            logger: self.logger,
            state: self.state,
        }
    }

    /// Runs the whole flow and closes the browser, whether or not it
    /// succeeded.
    ///
    /// Opus does not deduplicate: submitting the same invoice twice creates
    /// two documents.
    pub async fn submit(mut self) -> Result<SubmissionResult, InvoiceError> {
        let outcome = self.run().await;
        match &outcome {
            Ok(result) => self.logger.info(format_args!(
                "{}: {:?}",
                result.message, result.raw_status_text
            )),
            Err(e) => self.logger.warn(format_args!("submission aborted: {}", e)),
        }

        let InvoiceSession { driver, logger, .. } = self;
        if let Err(e) = driver.close().await {
            logger.warn(format_args!("failed to close browser session: {}", e));
        }
        outcome
    }

    async fn run(&mut self) -> Result<SubmissionResult, InvoiceError> {
        export::write_csv(&self.invoice).map_err(|e| self.failed(Phase::CsvExport, e))?;
        self.logger.debug(format_args!(
            "wrote postings to {}",
            self.invoice.csv_filename().display()
        ));

        self.login().await.map_err(|e| self.failed(Phase::Login, e))?;
        self.advance(FlowState::LoggedIn);

        self.navigate()
            .await
            .map_err(|e| self.failed(Phase::Navigation, e))?;
        self.advance(FlowState::FormReached);

        self.fill_fields()
            .await
            .map_err(|e| self.failed(Phase::FormFill, e))?;
        self.advance(FlowState::FieldsFilled);

        if let Some(path) = self.invoice.attachment().clone() {
            self.upload(selectors::ATTACH_DOCUMENT_BUTTON, &path)
                .await
                .map_err(|e| self.failed(Phase::Attachment, e))?;
        } else {
            self.logger.debug(format_args!("no attachment, skipping"));
        }
        self.advance(FlowState::AttachmentHandled);

        let csv_path: PathBuf = self.invoice.csv_filename().clone();
        self.upload(selectors::IMPORT_POSTINGS_BUTTON, &csv_path)
            .await
            .map_err(|e| self.failed(Phase::CsvImport, e))?;
        self.advance(FlowState::CsvHandled);

        let status_text = self
            .check_document()
            .await
            .map_err(|e| self.failed(Phase::DocumentCheck, e))?;
        self.advance(FlowState::Validated);

        let result = classify(&status_text);
        self.advance(if result.is_success() {
            FlowState::Succeeded
        } else {
            FlowState::Failed
        });
        Ok(result)
    }

    fn advance(&mut self, next: FlowState) {
        self.logger
            .debug(format_args!("{:?} -> {:?}", self.state, next));
        self.state = next;
    }

    fn failed(&self, phase: Phase, source: FlowError) -> InvoiceError {
        InvoiceError::new(phase, self.state, source)
    }

    async fn login(&mut self) -> Result<(), FlowError> {
        let url = self.config.login_url();
        self.logger.info(format_args!(
            "logging in to {} as {}",
            url,
            self.config.username()
        ));

        self.driver.launch().await?;
        self.driver.goto(&url).await?;
        self.driver
            .fill(
                &Target::page(Selector::textbox(selectors::USERNAME_FIELD)),
                self.config.username(),
            )
            .await?;
        self.driver
            .fill(
                &Target::page(Selector::textbox(selectors::PASSWORD_FIELD)),
                self.config.password(),
            )
            .await?;
        self.driver
            .click(&Target::page(Selector::button(selectors::SIGN_IN_BUTTON)))
            .await?;

        let settle = self.options.timeouts.login_settle;
        if !self.driver.wait_for_load(settle).await? {
            self.logger.debug(format_args!(
                "page still loading after {:?}, continuing",
                settle
            ));
        }

        let error = Target::page(Selector::css(selectors::LOGIN_ERROR));
        if self.driver.is_visible(&error).await? {
            let message = self.driver.inner_text(&error).await?;
            return Err(FlowError::LoginRejected(message.trim().to_string()));
        }
        Ok(())
    }

    async fn navigate(&mut self) -> Result<(), FlowError> {
        let steps = [
            Selector::css(selectors::MENU_BUTTON),
            Selector::text(selectors::MENU_DOCUMENT_PROCESSING),
            Selector::text(selectors::MENU_CREATE_REALLOCATION),
        ];
        for step in steps {
            self.driver.click(&Target::page(step)).await?;
        }

        let form = in_work_area(Selector::exact_text(selectors::LABEL_TEXT));
        if !self
            .driver
            .wait_for_visible(&form, self.options.timeouts.form_ready)
            .await?
        {
            return Err(FlowError::NotReady("the reallocation form"));
        }
        Ok(())
    }

    async fn fill_fields(&mut self) -> Result<(), FlowError> {
        let fields = [
            (selectors::LABEL_BOOKING_DATE, self.invoice.booking_date()),
            (selectors::LABEL_TEXT, self.invoice.tekst()),
            (selectors::LABEL_REFERENCE, self.invoice.reference()),
        ];
        for (label, value) in fields {
            fill_labeled(&mut self.driver, &self.logger, label, value).await?;
        }
        fill_comment(&mut self.driver, &self.logger, self.invoice.kommentar()).await
    }

    /// Opens an upload popup with `trigger`, hands it `path` and confirms.
    async fn upload(&mut self, trigger: &str, path: &Path) -> Result<(), FlowError> {
        self.driver
            .click(&in_work_area(Selector::css(trigger)))
            .await?;

        let timeouts = self.options.timeouts;
        let deadline = Instant::now() + timeouts.popup;
        let mut found = None;
        for attempt in 0..timeouts.attempts(timeouts.popup) {
            if attempt > 0 {
                // A sweep against a live browser can take longer than the interval.
                if Instant::now() >= deadline {
                    break;
                }
                self.driver.pause(timeouts.poll_interval).await;
            }
            if let Some(frame) = self.probe.locate(&mut self.driver, &self.logger).await? {
                found = Some(frame);
                break;
            }
        }

        let frame = match found {
            Some(frame) => {
                self.driver
                    .set_input_files(&selectors::file_input_in(&frame), path)
                    .await?;
                self.logger.info(format_args!(
                    "uploaded {} through {}",
                    path.display(),
                    frame
                ));
                frame
            }
            None if self.options.strict_upload => return Err(FlowError::NoFileInput),
            None => {
                self.logger.warn(format_args!(
                    "no popup frame exposed a file input, {} was not uploaded",
                    path.display()
                ));
                self.probe.fallback()
            }
        };

        // Opus gives no signal once the file is processed.
        self.driver.pause(timeouts.upload_settle).await;
        self.driver
            .click(&selectors::ok_button_in(&frame))
            .await?;
        Ok(())
    }

    async fn check_document(&mut self) -> Result<String, FlowError> {
        self.driver
            .click(&in_work_area(Selector::css(
                selectors::CHECK_DOCUMENT_BUTTON,
            )))
            .await?;

        let messages = in_work_area(Selector::css(selectors::STATUS_MESSAGES));
        if !self
            .driver
            .wait_for_visible(&messages, self.options.timeouts.status)
            .await?
        {
            return Ok(NOT_CONTROLLED.to_string());
        }
        let texts = self.driver.all_texts(&messages).await?;
        Ok(texts
            .into_iter()
            .next()
            .unwrap_or_else(|| NOT_CONTROLLED.to_string()))
    }
}

/// Replaces a labeled form value. An empty value leaves the field as Opus
/// rendered it.
async fn fill_labeled<D: UiDriver>(
    driver: &mut D,
    logger: &SessionLogger,
    label: &str,
    value: &str,
) -> Result<(), FlowError> {
    if value.is_empty() {
        logger.debug(format_args!("{} is empty, leaving it unchanged", label));
        return Ok(());
    }
    driver
        .click(&in_work_area(Selector::exact_text(label)))
        .await?;
    driver.press_key(Key::SelectAll).await?;
    driver.press_key(Key::Delete).await?;
    driver.type_text(value).await?;
    driver.press_key(Key::Enter).await?;
    Ok(())
}

/// The comment field is reached by tabbing out of the currency field.
async fn fill_comment<D: UiDriver>(
    driver: &mut D,
    logger: &SessionLogger,
    value: &str,
) -> Result<(), FlowError> {
    if value.is_empty() {
        logger.debug(format_args!("no comment, skipping"));
        return Ok(());
    }
    driver
        .click(&in_work_area(Selector::exact_text(selectors::LABEL_CURRENCY)))
        .await?;
    driver.press_key(Key::Tab).await?;
    driver.type_text(value).await?;
    driver.press_key(Key::Enter).await?;
    Ok(())
}

/// Submits `invoice` through a [`WebDriverSession`] built from `options`.
pub async fn create_invoice(
    config: OpusConfig,
    invoice: InvoiceData,
    options: SessionOptions,
    logger: SessionLogger,
) -> Result<SubmissionResult, InvoiceError> {
    let driver = WebDriverSession::new(&options.webdriver_url, options.headless);
    InvoiceSession::new(config, invoice, driver, options)
        .with_logger(logger)
        .submit()
        .await
}
