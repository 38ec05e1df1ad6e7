use std::time::Duration;

use async_trait::async_trait;
use thirtyfour::prelude::*;

use super::PageRenderer;
use crate::error::ScraperError;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    /// Address of a running chromedriver, e.g. `http://localhost:9515`.
    pub webdriver_url: String,
    pub headless: bool,
    pub user_agent: String,
    pub window_size: (u32, u32),
    pub disable_images: bool,
    /// Cookie-consent button clicked once after the first navigation.
    pub consent_button: Option<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_owned(),
            headless: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            window_size: (1920, 1080),
            disable_images: true,
            consent_button: None,
        }
    }
}

impl BrowserOptions {
    fn chrome_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.headless {
            args.push("--headless=new".to_owned());
        }
        args.extend(
            [
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--disable-gpu",
                "--disable-blink-features=AutomationControlled",
            ]
            .map(str::to_owned),
        );
        args.push(format!(
            "--window-size={},{}",
            self.window_size.0, self.window_size.1
        ));
        args.push(format!("--user-agent={}", self.user_agent));
        if self.disable_images {
            args.push("--blink-settings=imagesEnabled=false".to_owned());
        }
        args
    }
}

/// A Chrome session driven over WebDriver.
///
/// The session is released by [`PageRenderer::close`]; after that every
/// other call fails with [`ScraperError::SessionClosed`].
pub struct BrowserSession {
    driver: Option<WebDriver>,
    consent_button: Option<String>,
    consent_handled: bool,
}

impl BrowserSession {
    /// Starts a browser session on the configured chromedriver.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::WebDriver`] if the capabilities are rejected
    /// or the driver cannot be reached.
    pub async fn connect(options: &BrowserOptions) -> Result<Self, ScraperError> {
        let mut caps = DesiredCapabilities::chrome();
        for arg in options.chrome_args() {
            caps.add_arg(&arg)?;
        }

        let driver = WebDriver::new(&options.webdriver_url, caps).await?;
        tracing::info!(
            webdriver_url = %options.webdriver_url,
            headless = options.headless,
            "browser session started"
        );

        Ok(Self {
            driver: Some(driver),
            consent_button: options.consent_button.clone(),
            consent_handled: false,
        })
    }

    fn driver(&self) -> Result<&WebDriver, ScraperError> {
        self.driver.as_ref().ok_or(ScraperError::SessionClosed)
    }

    async fn dismiss_consent(&mut self) {
        if self.consent_handled {
            return;
        }
        self.consent_handled = true;

        let Some(selector) = self.consent_button.clone() else {
            return;
        };
        let Ok(driver) = self.driver() else {
            return;
        };
        let clicked = match driver
            .query(By::Css(selector.as_str()))
            .wait(Duration::from_secs(5), POLL_INTERVAL)
            .first()
            .await
        {
            Ok(button) => button.click().await,
            Err(err) => Err(err),
        };
        match clicked {
            Ok(()) => tracing::info!("cookie consent accepted"),
            Err(err) => tracing::warn!(error = %err, "cookie consent not dismissed"),
        }
    }
}

#[async_trait]
impl PageRenderer for BrowserSession {
    async fn open(&mut self, url: &str) -> Result<(), ScraperError> {
        self.driver()?.goto(url).await?;
        self.dismiss_consent().await;
        Ok(())
    }

    async fn wait_until_present(
        &mut self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, ScraperError> {
        let found = self
            .driver()?
            .query(By::Css(selector))
            .wait(timeout, POLL_INTERVAL)
            .exists()
            .await?;
        Ok(found)
    }

    async fn page_source(&mut self) -> Result<String, ScraperError> {
        Ok(self.driver()?.source().await?)
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        if let Some(driver) = self.driver.take() {
            driver.quit().await?;
            tracing::info!("browser session closed");
        }
        Ok(())
    }
}
