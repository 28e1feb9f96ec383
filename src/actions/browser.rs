//! Opening URLs in the default browser

use crate::{Error, Result};

/// Opens URLs somewhere the user can see them
pub trait BrowserLauncher {
    /// Open `url`
    ///
    /// # Errors
    ///
    /// Returns error if the browser could not be started
    fn open(&mut self, url: &str) -> Result<()>;
}

/// Hands URLs to the desktop's default browser
pub struct SystemBrowser {
    opener: fn(&str) -> std::io::Result<()>,
}

impl SystemBrowser {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            opener: webbrowser::open,
        }
    }
}

impl Default for SystemBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserLauncher for SystemBrowser {
    fn open(&mut self, url: &str) -> Result<()> {
        (self.opener)(url).map_err(|e| Error::Browser(format!("{url}: {e}")))?;
        tracing::debug!(url, "opened in browser");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_failure_names_the_url() {
        let mut browser = SystemBrowser {
            opener: |_| Err(std::io::Error::other("no default browser")),
        };

        let err = browser.open("https://example.com").unwrap_err();
        assert!(matches!(
            err,
            Error::Browser(msg) if msg == "https://example.com: no default browser"
        ));
    }

    #[test]
    fn test_open_passes_url_through() {
        let mut browser = SystemBrowser {
            opener: |url| {
                assert_eq!(url, "https://www.youtube.com");
                Ok(())
            },
        };

        assert!(browser.open("https://www.youtube.com").is_ok());
    }
}
