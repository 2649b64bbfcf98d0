//! Locating the frame that hosts an upload popup's file input.
//!
//! Opus names the popup iframe per session, so there is no stable selector.
//! [`FramePatternProbe`] tries a prioritized list of name fragments; swap in
//! [`FixedFrame`] once a deterministic frame is known.

use crate::driver::{DriverResult, Frame, UiDriver};
use crate::logger::SessionLogger;
use crate::selectors;

/// Finds the first frame, in priority order, that contains a visible file
/// input.
#[allow(async_fn_in_trait)]
pub trait UploadFrameLocator {
    /// One sweep over the candidates. `None` when no candidate qualifies yet;
    /// a driver error on a candidate counts as no match.
    async fn locate<D: UiDriver>(
        &self,
        driver: &mut D,
        logger: &SessionLogger,
    ) -> DriverResult<Option<Frame>>;

    /// Frame used for the popup's OK button when no file input was found.
    fn fallback(&self) -> Frame;
}

/// Tries each candidate frame in order and stops at the first match.
#[derive(Debug, Clone)]
pub struct FramePatternProbe {
    candidates: Vec<Frame>,
}

impl FramePatternProbe {
    pub fn new(candidates: Vec<Frame>) -> Self {
        FramePatternProbe { candidates }
    }

    pub fn candidates(&self) -> &[Frame] {
        &self.candidates
    }
}

impl Default for FramePatternProbe {
    /// Known popup name fragments, then any visible iframe.
    fn default() -> Self {
        let mut candidates: Vec<Frame> = selectors::UPLOAD_FRAME_PATTERNS
            .iter()
            .map(|part| Frame::NameContains(part.to_string()))
            .collect();
        candidates.push(Frame::AnyVisible);
        FramePatternProbe { candidates }
    }
}

impl UploadFrameLocator for FramePatternProbe {
    async fn locate<D: UiDriver>(
        &self,
        driver: &mut D,
        logger: &SessionLogger,
    ) -> DriverResult<Option<Frame>> {
        for frame in &self.candidates {
            if has_file_input(driver, logger, frame).await {
                return Ok(Some(frame.clone()));
            }
        }
        Ok(None)
    }

    fn fallback(&self) -> Frame {
        self.candidates
            .last()
            .cloned()
            .unwrap_or(Frame::AnyVisible)
    }
}

/// A single known frame.
#[derive(Debug, Clone)]
pub struct FixedFrame(pub Frame);

impl UploadFrameLocator for FixedFrame {
    async fn locate<D: UiDriver>(
        &self,
        driver: &mut D,
        logger: &SessionLogger,
    ) -> DriverResult<Option<Frame>> {
        let visible = has_file_input(driver, logger, &self.0).await;
        Ok(visible.then(|| self.0.clone()))
    }

    fn fallback(&self) -> Frame {
        self.0.clone()
    }
}

/// A popup frame can be torn down while it is being inspected, so a driver
/// error counts as "no file input here".
async fn has_file_input<D: UiDriver>(
    driver: &mut D,
    logger: &SessionLogger,
    frame: &Frame,
) -> bool {
    match driver.is_visible(&selectors::file_input_in(frame)).await {
        Ok(visible) => visible,
        Err(e) => {
            logger.debug(format_args!("skipping {}: {}", frame, e));
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_order() {
        let probe = FramePatternProbe::default();
        let candidates = probe.candidates();
        assert_eq!(candidates.len(), 8);
        assert_eq!(candidates[0], Frame::NameContains("URLSPW".to_string()));
        assert_eq!(candidates[3], Frame::NameContains("dialog".to_string()));
        assert_eq!(candidates[7], Frame::AnyVisible);
        assert_eq!(probe.fallback(), Frame::AnyVisible);
    }

    #[test]
    fn test_fixed_frame_fallback() {
        let probe = FixedFrame(Frame::Id("URLSPW-0".to_string()));
        assert_eq!(probe.fallback(), Frame::Id("URLSPW-0".to_string()));
    }
}
