//! Randomized browser fingerprint and the stealth init script.

use rand::{Rng, rng};

/// User agents a browser context is given at random.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_2) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

/// Installed before any page script runs: hides the automation flag and
/// fills in the navigator properties headless Chromium leaves empty.
pub const STEALTH_SCRIPT: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
window.chrome = { runtime: {} };
const originalQuery = window.navigator.permissions.query;
window.navigator.permissions.query = (parameters) => (
    parameters.name === 'notifications'
        ? Promise.resolve({ state: Notification.permission })
        : originalQuery(parameters)
);
"#;

/// Per-context browser identity.
#[derive(Debug, Clone)]
pub struct Fingerprint {
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub locale: String,
    pub timezone: String,
}

impl Fingerprint {
    /// Random user agent and a desktop viewport between 1366x768 and
    /// 1920x1080.
    pub fn randomized(locale: &str, timezone: &str) -> Self {
        let mut rng = rng();
        let ua_idx = rng.random_range(0..USER_AGENTS.len());

        Self {
            user_agent: USER_AGENTS[ua_idx].to_string(),
            viewport_width: rng.random_range(1366..=1920),
            viewport_height: rng.random_range(768..=1080),
            locale: locale.to_string(),
            timezone: timezone.to_string(),
        }
    }
}
