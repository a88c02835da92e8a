//! Built-in token sets for user-agent matching.
//!
//! All tokens are lowercase; callers lowercase the user-agent once and use
//! substring matching.

/// Tokens that mark a user-agent as automated: crawlers, scanners, vendor
/// bots and HTTP client libraries.
pub const BOT_KEYWORDS: &[&str] = &[
    // generic
    "bot",
    "crawl",
    "spider",
    "slurp",
    "scanner",
    "scraper",
    "fetcher",
    // search and ads
    "googlebot",
    "adsbot",
    "mediapartners",
    "google-inspectiontool",
    "googleother",
    "feedfetcher",
    "bingpreview",
    "yandex",
    "baiduspider",
    "duckduckgo",
    "petalbot",
    "bytespider",
    "applebot",
    // social previews
    "facebookexternalhit",
    "facebot",
    "embedly",
    "whatsapp",
    "telegram",
    "skypeuripreview",
    // seo tools
    "ahrefs",
    "semrush",
    "mj12",
    "dotbot",
    "screaming frog",
    "lighthouse",
    "pagespeed",
    // security scanners
    "sqlmap",
    "nikto",
    "nmap",
    "masscan",
    "zgrab",
    "nuclei",
    "gobuster",
    "dirbuster",
    "wpscan",
    // http clients
    "curl",
    "wget",
    "python-requests",
    "python-urllib",
    "aiohttp",
    "httpx",
    "go-http-client",
    "java/",
    "okhttp",
    "apache-httpclient",
    "libwww-perl",
    "axios",
    "node-fetch",
    "undici",
    "got (",
    "postmanruntime",
    "insomnia",
    "httpie",
    "reqwest",
    "scrapy",
];

/// Tokens every mainstream browser user-agent carries.
pub const BROWSER_MARKERS: &[&str] = &[
    "mozilla/",
    "chrome/",
    "safari/",
    "firefox/",
    "edg/",
    "opr/",
];

/// Headless-browser and scripting markers that rule out a human verdict.
pub const AUTOMATION_MARKERS: &[&str] = &[
    "headless",
    "phantomjs",
    "selenium",
    "webdriver",
    "puppeteer",
    "playwright",
    "electron/",
    "slimerjs",
    "htmlunit",
];

/// Content-negotiation headers real browsers always send.
pub const BASELINE_HEADERS: [&str; 3] = ["accept", "accept-language", "accept-encoding"];

/// A lowercase keyword set: built-ins plus configured extras.
#[derive(Debug, Clone)]
pub struct KeywordSet {
    tokens: Vec<String>,
}

impl KeywordSet {
    /// Merge built-in tokens with extras, normalized to lowercase.
    pub fn new(builtin: &[&str], extra: &[String]) -> Self {
        let mut tokens: Vec<String> = builtin.iter().map(|t| t.to_string()).collect();
        for token in extra {
            let token = token.trim().to_lowercase();
            if !token.is_empty() && !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        Self { tokens }
    }

    /// First token contained in `haystack`, which must already be lowercase.
    pub fn find_in(&self, haystack: &str) -> Option<&str> {
        self.tokens
            .iter()
            .find(|t| haystack.contains(t.as_str()))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
