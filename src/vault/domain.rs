//! URL helpers: domain extraction and site matching, favicon URLs, and the
//! small heuristics used when importing browser exports.

/// Extract the matchable domain portion of a URL.
///
/// Strips an `http://`/`https://` scheme and a leading `www.`, keeps
/// everything before the first `/`, then drops any `:port`.
///
/// `https://www.github.com:443/login` -> `github.com`
pub fn extract_domain(url: &str) -> &str {
    let rest = url.trim();
    let rest = rest.strip_prefix("https://").unwrap_or(rest);
    let rest = rest.strip_prefix("http://").unwrap_or(rest);
    let rest = rest.strip_prefix("www.").unwrap_or(rest);
    let host = rest.split('/').next().unwrap_or(rest);
    host.split(':').next().unwrap_or(host)
}

/// Labels shorter than this are too loose to use as a substring key.
const MIN_KEY_LEN: usize = 4;

/// Second-level labels that sit under a country code as part of the
/// public suffix (`co.uk`, `com.au`, `ac.jp`).
const SECOND_LEVEL_SUFFIXES: &[&str] = &[
    "ac", "co", "com", "edu", "gob", "gov", "gv", "ltd", "me", "mil", "ne", "net", "nic", "or",
    "org", "plc", "sch",
];

/// The site key used for matching: the label just left of the public
/// suffix of the URL's domain, lowercased.
///
/// `https://mail.google.com/mail` -> `google`, `guardian.co.uk` ->
/// `guardian`, `mail.web.de` -> `web.de`.  Hosts without a dot (and IPv4
/// addresses) are used whole.  Labels shorter than `MIN_KEY_LEN` fall
/// back to the full registrable domain, so `web.de` does not match every
/// domain containing `web`.
pub fn site_key(url: &str) -> String {
    let domain = extract_domain(url).to_lowercase();
    let labels: Vec<&str> = domain.split('.').filter(|l| !l.is_empty()).collect();
    let n = labels.len();
    let is_ipv4 = n == 4 && labels.iter().all(|l| l.bytes().all(|b| b.is_ascii_digit()));
    if n < 2 || is_ipv4 {
        return domain;
    }

    // Two-letter country code under a generic second level: co.uk, com.au, ...
    let start = if n >= 3
        && labels[n - 1].len() == 2
        && SECOND_LEVEL_SUFFIXES.contains(&labels[n - 2])
    {
        n - 3
    } else {
        n - 2
    };
    if labels[start].len() < MIN_KEY_LEN {
        return labels[start..].join(".");
    }
    labels[start].to_string()
}

/// True if the site key of `query_url` appears in the domain of
/// `credential_url` or in `service_name` (case-insensitive substring).
///
/// An empty query never matches.
pub fn matches_url(query_url: &str, credential_url: &str, service_name: &str) -> bool {
    let needle = site_key(query_url);
    if needle.is_empty() {
        return false;
    }
    extract_domain(credential_url)
        .to_lowercase()
        .contains(&needle)
        || service_name.to_lowercase().contains(&needle)
}

/// Host name of a URL with a scheme, or `None`.
fn hostname(url: &str) -> Option<&str> {
    let (_, rest) = url.trim().split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host_port = authority.rsplit('@').next().unwrap_or(authority);
    let host = host_port.split(':').next().unwrap_or(host_port);
    (!host.is_empty()).then_some(host)
}

/// Favicon URL for a site, or an empty string when `url` has no host.
pub fn icon_url(url: &str) -> String {
    match hostname(url) {
        Some(host) => format!("https://www.google.com/s2/favicons?domain={host}&sz=128"),
        None => String::new(),
    }
}

/// A display name guessed from a URL: the capitalized domain.
pub fn service_name_from_url(url: &str) -> String {
    let domain = extract_domain(url);
    let mut chars = domain.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Imported".to_string(),
    }
}

/// Rough category for an imported login, based on well-known sites.
pub fn categorize_by_url(url: &str) -> &'static str {
    const SOCIAL: &[&str] = &[
        "facebook", "twitter", "instagram", "linkedin", "reddit", "tiktok",
    ];
    const FINANCE: &[&str] = &["bank", "paypal", "stripe", "venmo", "invest", "crypto"];
    const WORK: &[&str] = &[
        "github",
        "gitlab",
        "slack",
        "jira",
        "confluence",
        "office",
        "google.com/drive",
        "dropbox",
    ];

    let lower = url.to_lowercase();
    let hit = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if hit(SOCIAL) {
        "Social"
    } else if hit(FINANCE) {
        "Finance"
    } else if hit(WORK) {
        "Work"
    } else {
        "Other"
    }
}
