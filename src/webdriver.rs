//! [`UiDriver`] over the W3C WebDriver protocol, using `fantoccini`.
//!
//! Expects a chromedriver (or compatible) endpoint. The connection is opened
//! lazily by [`UiDriver::launch`], so a session can be constructed before the
//! CSV export runs without starting a browser.

use crate::driver::{DriverResult, Frame, Key, Role, Selector, Target, UiDriver};
use crate::error::DriverError;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::key::Key as WireKey;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{json, Value};
use std::path::Path;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A browser driven through a WebDriver endpoint.
pub struct WebDriverSession {
    webdriver_url: String,
    headless: bool,
    client: Option<Client>,
}

impl WebDriverSession {
    pub fn new(webdriver_url: &str, headless: bool) -> Self {
        WebDriverSession {
            webdriver_url: webdriver_url.to_string(),
            headless,
            client: None,
        }
    }

    fn capabilities(&self) -> serde_json::Map<String, Value> {
        let mut args = vec!["--no-first-run", "--no-default-browser-check"];
        if self.headless {
            args.push("--headless=new");
            args.push("--window-size=1920,1080");
        }

        let mut caps = serde_json::Map::new();
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        caps
    }

    fn client(&self) -> DriverResult<Client> {
        self.client.clone().ok_or(DriverError::NotStarted)
    }

    /// Switches to the innermost frame of `target` and returns every element
    /// its selector matches there.
    async fn find_all(&self, target: &Target) -> DriverResult<Vec<Element>> {
        let client = self.client()?;
        client.enter_frame(None).await.map_err(command)?;
        for frame in &target.frames {
            let element = locate_frame(&client, frame)
                .await?
                .ok_or_else(|| DriverError::NotFound(frame.to_string()))?;
            element.enter_frame().await.map_err(command)?;
        }

        let found = match &target.selector {
            Selector::Css(css) => client.find_all(Locator::Css(css)).await,
            other => {
                let xpath = to_xpath(other);
                client.find_all(Locator::XPath(&xpath)).await
            }
        };
        found.map_err(command)
    }

    /// First displayed match, falling back to the first match.
    async fn find(&self, target: &Target) -> DriverResult<Element> {
        let elements = self.find_all(target).await?;
        for element in &elements {
            if element.is_displayed().await.map_err(command)? {
                return Ok(element.clone());
            }
        }
        elements
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::NotFound(target.to_string()))
    }
}

impl UiDriver for WebDriverSession {
    async fn launch(&mut self) -> DriverResult<()> {
        if self.client.is_some() {
            return Ok(());
        }
        let client = ClientBuilder::native()
            .capabilities(self.capabilities())
            .connect(&self.webdriver_url)
            .await
            .map_err(|e| DriverError::Session(e.to_string()))?;
        self.client = Some(client);
        Ok(())
    }

    async fn goto(&mut self, url: &str) -> DriverResult<()> {
        self.client()?.goto(url).await.map_err(command)
    }

    async fn fill(&mut self, target: &Target, value: &str) -> DriverResult<()> {
        let element = self.find(target).await?;
        element.clear().await.map_err(command)?;
        element.send_keys(value).await.map_err(command)
    }

    async fn click(&mut self, target: &Target) -> DriverResult<()> {
        self.find(target).await?.click().await.map_err(command)
    }

    async fn press_key(&mut self, key: Key) -> DriverResult<()> {
        let keys = match key {
            Key::Enter => char::from(WireKey::Enter).to_string(),
            Key::Tab => char::from(WireKey::Tab).to_string(),
            Key::Delete => char::from(WireKey::Delete).to_string(),
            Key::SelectAll => {
                let modifier = if cfg!(target_os = "macos") {
                    WireKey::Meta
                } else {
                    WireKey::Control
                };
                // Modifiers stay pressed until the null key releases them.
                format!("{}a{}", char::from(modifier), char::from(WireKey::Null))
            }
        };
        self.type_text(&keys).await
    }

    async fn type_text(&mut self, text: &str) -> DriverResult<()> {
        let focused = self.client()?.active_element().await.map_err(command)?;
        focused.send_keys(text).await.map_err(command)
    }

    async fn is_visible(&mut self, target: &Target) -> DriverResult<bool> {
        let elements = match self.find_all(target).await {
            Ok(elements) => elements,
            Err(DriverError::NotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        for element in &elements {
            if element.is_displayed().await.map_err(command)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn inner_text(&mut self, target: &Target) -> DriverResult<String> {
        self.find(target).await?.text().await.map_err(command)
    }

    async fn all_texts(&mut self, target: &Target) -> DriverResult<Vec<String>> {
        let mut texts = Vec::new();
        for element in self.find_all(target).await? {
            texts.push(element.text().await.map_err(command)?);
        }
        Ok(texts)
    }

    async fn wait_for_visible(
        &mut self,
        target: &Target,
        timeout: Duration,
    ) -> DriverResult<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_visible(target).await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn wait_for_load(&mut self, timeout: Duration) -> DriverResult<bool> {
        let client = self.client()?;
        let deadline = Instant::now() + timeout;
        loop {
            // WebDriver has no network-idle signal; readyState is the closest.
            let state = client
                .execute("return document.readyState", Vec::new())
                .await
                .map_err(command)?;
            if state.as_str() == Some("complete") {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn set_input_files(&mut self, target: &Target, path: &Path) -> DriverResult<()> {
        let input = self.find(target).await?;
        let absolute = path
            .canonicalize()
            .map_err(|e| DriverError::Command(format!("{}: {}", path.display(), e)))?;
        input
            .send_keys(&absolute.to_string_lossy())
            .await
            .map_err(command)
    }

    async fn pause(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn close(self) -> DriverResult<()> {
        match self.client {
            Some(client) => client.close().await.map_err(command),
            None => Ok(()),
        }
    }
}

fn command(error: CmdError) -> DriverError {
    DriverError::Command(error.to_string())
}

async fn locate_frame(client: &Client, frame: &Frame) -> DriverResult<Option<Element>> {
    let candidates = match frame {
        Frame::Id(id) => client.find_all(Locator::Id(id)).await,
        Frame::NameContains(part) => {
            let css = format!("iframe[name*={}]", css_string(part));
            client.find_all(Locator::Css(&css)).await
        }
        Frame::AnyVisible => client.find_all(Locator::Css("iframe")).await,
    }
    .map_err(command)?;

    if *frame != Frame::AnyVisible {
        return Ok(candidates.into_iter().next());
    }
    for candidate in candidates {
        if candidate.is_displayed().await.map_err(command)? {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

fn css_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Quotes `value` as an XPath 1.0 string literal.
fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{}'", value)
    } else if !value.contains('"') {
        format!("\"{}\"", value)
    } else {
        let parts: Vec<String> = value.split('\'').map(|p| format!("'{}'", p)).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

fn to_xpath(selector: &Selector) -> String {
    match selector {
        Selector::Role {
            role: Role::TextBox,
            name,
        } => {
            let n = xpath_literal(name);
            format!(
                "//input[not(@type) or @type='text' or @type='email' or @type='password']\
                 [@aria-label={n} or @placeholder={n} or @title={n} or @id=//label[normalize-space()={n}]/@for]\
                 | //textarea[@aria-label={n} or @placeholder={n}]"
            )
        }
        Selector::Role {
            role: Role::Button,
            name,
        } => {
            let n = xpath_literal(name);
            format!(
                "//*[self::button or @role='button' or (self::input and (@type='submit' or @type='button'))]\
                 [normalize-space()={n} or @aria-label={n} or @value={n} or @title={n}]"
            )
        }
        Selector::Text { text, exact: true } => {
            format!("//*[text()[normalize-space()={}]]", xpath_literal(text))
        }
        Selector::Text { text, exact: false } => {
            format!(
                "//*[text()[contains(normalize-space(), {})]]",
                xpath_literal(text)
            )
        }
        Selector::XPath(xpath) => xpath.clone(),
        Selector::Css(css) => css.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xpath_literal_quoting() {
        assert_eq!(xpath_literal("Tekst"), "'Tekst'");
        assert_eq!(xpath_literal("it's"), "\"it's\"");
        assert_eq!(
            xpath_literal(r#"a'b"c"#),
            r#"concat('a', "'", 'b"c')"#
        );
    }

    #[test]
    fn test_exact_text_xpath() {
        assert_eq!(
            to_xpath(&Selector::exact_text("Bogføringsdato")),
            "//*[text()[normalize-space()='Bogføringsdato']]"
        );
        assert_eq!(
            to_xpath(&Selector::text("Bilagsbehandling")),
            "//*[text()[contains(normalize-space(), 'Bilagsbehandling')]]"
        );
    }

    #[test]
    fn test_css_string_escapes_quotes() {
        assert_eq!(css_string("popup"), "\"popup\"");
        assert_eq!(css_string("a\"b"), "\"a\\\"b\"");
    }

    #[test]
    fn test_headless_capabilities() {
        let session = WebDriverSession::new("http://localhost:9515", true);
        let caps = session.capabilities();
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--headless=new"));

        let visible = WebDriverSession::new("http://localhost:9515", false);
        let caps = visible.capabilities();
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(!args.iter().any(|a| a == "--headless=new"));
    }

    #[tokio::test]
    async fn test_commands_before_launch_fail() {
        let mut session = WebDriverSession::new("http://localhost:9515", true);
        let error = session.goto("https://example.org").await.unwrap_err();
        assert!(matches!(error, DriverError::NotStarted));
        assert!(session.close().await.is_ok());
    }
}
