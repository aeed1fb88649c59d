//! Telegram Bot API notifier.
//!
//! Sends messages via `POST /bot<token>/sendMessage`. Handles 429 rate
//! limits by waiting out the `parameters.retry_after` returned in the
//! response body, a bounded number of times. A pending stop request cuts
//! the wait short.

use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde_json::json;

use crate::app::ports::Notifier;
use crate::config::TelegramSettings;
use crate::error::RemoteError;
use crate::shutdown::StopHandle;

pub const TELEGRAM_API: &str = "https://api.telegram.org";

/// Maximum number of attempts for rate-limited requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Upper bound on a single rate-limit wait; the monitor loop is blocked
/// while we wait.
const MAX_RETRY_WAIT: Duration = Duration::from_secs(5);

/// How often a rate-limit wait checks for a stop request.
const STOP_POLL: Duration = Duration::from_millis(100);

/// Telegram `sendMessage` text limit (UTF-8 characters).
const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

const TRUNCATION_SUFFIX: &str = "\n\n[truncated]";

pub struct TelegramNotifier {
    client: Client,
    url: String,
    chat_id: String,
    stop: Option<StopHandle>,
}

impl TelegramNotifier {
    pub fn new(settings: &TelegramSettings, timeout: Duration) -> Result<Self, RemoteError> {
        Self::with_base_url(settings, timeout, TELEGRAM_API)
    }

    /// Point at another Bot API server (self-hosted, or a test stub).
    pub fn with_base_url(
        settings: &TelegramSettings,
        timeout: Duration,
        base_url: &str,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: format!(
                "{}/bot{}/sendMessage",
                base_url.trim_end_matches('/'),
                settings.token
            ),
            chat_id: settings.chat_id.clone(),
            stop: None,
        })
    }

    /// Give up on rate-limit retries once `stop` is requested.
    pub fn with_stop(mut self, stop: StopHandle) -> Self {
        self.stop = Some(stop);
        self
    }

    fn stop_requested(&self) -> bool {
        self.stop.as_ref().is_some_and(StopHandle::is_requested)
    }

    /// Sleep for `wait`, or until a stop is requested. `false` if stopped.
    fn wait_for_retry(&self, wait: Duration) -> bool {
        let deadline = Instant::now() + wait;
        loop {
            if self.stop_requested() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(STOP_POLL));
        }
    }

    fn send_with_retry(&self, payload: &serde_json::Value) -> Result<(), RemoteError> {
        let mut attempts = 0;

        loop {
            attempts += 1;

            let response = self.client.post(&self.url).json(payload).send()?;
            let status = response.status();

            if status.is_success() {
                return Ok(());
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                let body: serde_json::Value = response.json().unwrap_or_default();
                let retry_after = retry_after(&body);

                if attempts >= MAX_RATE_LIMIT_RETRIES {
                    warn!(
                        "Telegram rate limit: max retries ({MAX_RATE_LIMIT_RETRIES}) exceeded, \
                         last retry_after was {retry_after:?}"
                    );
                    return Err(RemoteError::Http {
                        status: status.as_u16(),
                        body: format!("rate limited after {MAX_RATE_LIMIT_RETRIES} attempts"),
                    });
                }

                let wait = retry_wait(retry_after);
                debug!(
                    "Telegram rate limited (429), waiting {wait:?} before retry \
                     (attempt {attempts}/{MAX_RATE_LIMIT_RETRIES})"
                );
                if !self.wait_for_retry(wait) {
                    warn!("Telegram rate limit: stop requested, not retrying");
                    return Err(RemoteError::Http {
                        status: status.as_u16(),
                        body: "rate limited, retry abandoned on shutdown".into(),
                    });
                }
                continue;
            }

            let body = response.text().unwrap_or_default();
            warn!("Telegram sendMessage failed: {status} - {body}");
            return Err(RemoteError::Http {
                status: status.as_u16(),
                body,
            });
        }
    }
}

impl Notifier for TelegramNotifier {
    fn send(&mut self, text: &str) -> Result<(), RemoteError> {
        let text = escape_and_fit(text, TELEGRAM_MESSAGE_LIMIT);
        let payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "HTML",
        });
        self.send_with_retry(&payload)?;
        debug!("Telegram notification sent");
        Ok(())
    }
}

fn retry_after(body: &serde_json::Value) -> Option<Duration> {
    body.get("parameters")
        .and_then(|p| p.get("retry_after"))
        .and_then(serde_json::Value::as_u64)
        .map(Duration::from_secs)
}

fn retry_wait(retry_after: Option<Duration>) -> Duration {
    retry_after
        .unwrap_or(Duration::from_secs(1))
        .min(MAX_RETRY_WAIT)
}

fn entity(c: char) -> Option<&'static str> {
    match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        _ => None,
    }
}

/// Messages are plain text sent with `parse_mode=HTML`; error strings may
/// contain `<` or `&`.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match entity(c) {
            Some(e) => out.push_str(e),
            None => out.push(c),
        }
    }
    out
}

/// Escape `text` and fit it within `limit` characters. The cut falls
/// between source characters, never inside an entity.
fn escape_and_fit(text: &str, limit: usize) -> String {
    let escaped = escape_html(text);
    if escaped.chars().count() <= limit {
        return escaped;
    }

    let budget = limit.saturating_sub(TRUNCATION_SUFFIX.chars().count());
    let mut out = String::with_capacity(limit);
    let mut used = 0;
    for c in text.chars() {
        let width = entity(c).map_or(1, str::len);
        if used + width > budget {
            break;
        }
        match entity(c) {
            Some(e) => out.push_str(e),
            None => out.push(c),
        }
        used += width;
    }
    out.push_str(TRUNCATION_SUFFIX);
    out
}
