//! Size, date and title normalization
//!
//! Turns the loosely formatted strings scraped from the results table into
//! typed values, and maps a [`RawTorrent`] onto the host's [`AnimeTorrent`].

use chrono::{DateTime, Duration, Local, Months, NaiveDate, SecondsFormat, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;

use crate::config::ProviderConfig;
use crate::types::{AnimeTorrent, RawTorrent};

static SIZE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([\d.]+)\s*(B|KB|MB|GB|TB)$").unwrap());

static DAYS_AGO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(?:giorno|giorni)\s+fa$").unwrap());
static WEEKS_AGO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(?:settimana|settimane)\s+fa$").unwrap());
static MONTHS_AGO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(?:mese|mesi)\s+fa$").unwrap());
static YEARS_AGO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(?:anno|anni)\s+fa$").unwrap());
static ABSOLUTE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").unwrap());

static SEASON_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)S\d+|Season \d+|Stagione \d+").unwrap());
static EPISODE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)E\d+|Episode \d+").unwrap());

static EPISODE_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)E(\d+)").unwrap(),
        Regex::new(r"(?i)Episode (\d+)").unwrap(),
        // Also fires on trailing group tags or numbers that are not episodes
        Regex::new(r"\b(\d{1,3})\b$").unwrap(),
    ]
});
static SEASON_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)S(\d+)").unwrap(),
        Regex::new(r"(?i)Season (\d+)").unwrap(),
        Regex::new(r"(?i)Stagione (\d+)").unwrap(),
    ]
});

static INFO_HASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)btih:([a-z0-9]+)").unwrap());

const KB: f64 = 1024.0;

/// Parse a displayed size like "1.2 GB" into bytes (binary multiples).
///
/// Returns 0 for anything that is not `<number><unit>`.
pub fn parse_size(size: &str) -> u64 {
    let Some(caps) = SIZE_PATTERN.captures(size.trim()) else {
        return 0;
    };
    let Ok(value) = caps[1].parse::<f64>() else {
        return 0;
    };

    let multiplier = match caps[2].to_ascii_uppercase().as_str() {
        "B" => 1.0,
        "KB" => KB,
        "MB" => KB * KB,
        "GB" => KB * KB * KB,
        "TB" => KB * KB * KB * KB,
        _ => return 0,
    };

    (value * multiplier).round() as u64
}

/// Format bytes to human readable
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    for unit in UNITS {
        if size < KB {
            return format!("{:.1} {}", size, unit);
        }
        size /= KB;
    }
    format!("{:.1} TB", size)
}

/// ISO-8601 in UTC with millisecond precision
pub fn to_iso(date: DateTime<impl TimeZone>) -> String {
    date.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// ISO-8601 from seconds since the epoch
pub fn timestamp_to_iso(secs: i64) -> Option<String> {
    DateTime::from_timestamp(secs, 0).map(|date| to_iso(date))
}

fn captured_count(pattern: &Regex, text: &str) -> Option<u32> {
    pattern.captures(text)?[1].parse().ok()
}

/// Resolve an Italian relative or absolute date against `now`.
///
/// Understands "oggi", "ieri", "N giorni/settimane/mesi/anni fa" and
/// "DD/MM/YYYY". Returns `None` for anything else.
pub fn parse_date_at(text: &str, now: DateTime<Local>) -> Option<DateTime<Local>> {
    let lower = text.trim().to_lowercase();

    match lower.as_str() {
        "oggi" => return Some(now),
        "ieri" => return now.checked_sub_signed(Duration::days(1)),
        _ => {}
    }

    if let Some(days) = captured_count(&DAYS_AGO, &lower) {
        return now.checked_sub_signed(Duration::days(days as i64));
    }
    if let Some(weeks) = captured_count(&WEEKS_AGO, &lower) {
        return now.checked_sub_signed(Duration::days(weeks as i64 * 7));
    }
    if let Some(months) = captured_count(&MONTHS_AGO, &lower) {
        return now.checked_sub_months(Months::new(months));
    }
    if let Some(years) = captured_count(&YEARS_AGO, &lower) {
        return now.checked_sub_months(Months::new(years.checked_mul(12)?));
    }

    let caps = ABSOLUTE_DATE.captures(&lower)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let year: i32 = caps[3].parse().ok()?;
    let midnight = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(0, 0, 0)?;
    Local.from_local_datetime(&midnight).earliest()
}

/// Markers and numbers inferred from a release title
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TitleInfo {
    pub has_season: bool,
    pub has_episode: bool,
    /// -1 when none found
    pub episode_number: i32,
    /// -1 when none found
    pub season_number: i32,
}

impl TitleInfo {
    pub fn parse(title: &str) -> Self {
        Self {
            has_season: SEASON_MARKER.is_match(title),
            has_episode: EPISODE_MARKER.is_match(title),
            episode_number: first_number(EPISODE_PATTERNS.iter(), title),
            season_number: first_number(SEASON_PATTERNS.iter(), title),
        }
    }

    /// A whole season (or more) without a specific episode
    pub fn is_batch(&self) -> bool {
        self.has_season && !self.has_episode
    }
}

fn first_number<'a>(patterns: impl Iterator<Item = &'a Regex>, title: &str) -> i32 {
    patterns
        .filter_map(|p| p.captures(title))
        .find_map(|caps| caps[1].parse().ok())
        .unwrap_or(-1)
}

/// Lowercase hex info hash from a magnet's `btih:` parameter, or empty
pub fn info_hash_from_magnet(magnet: &str) -> String {
    INFO_HASH
        .captures(magnet)
        .map(|caps| caps[1].to_string())
        .filter(|hash| hash.chars().all(|c| c.is_ascii_hexdigit()))
        .map(|hash| hash.to_lowercase())
        .unwrap_or_default()
}

/// Map a scraped row to the host record
pub fn to_anime_torrent(raw: &RawTorrent, confirmed: bool, config: &ProviderConfig) -> AnimeTorrent {
    let info = TitleInfo::parse(&raw.title);

    AnimeTorrent {
        name: raw.title.clone(),
        date: raw.date.clone(),
        size: parse_size(&raw.size),
        formatted_size: raw.size.clone(),
        seeders: raw.seeders,
        leechers: raw.leechers,
        download_count: raw.downloads,
        link: config.absolute_url(&raw.link),
        download_url: (!raw.torrent_url.is_empty()).then(|| config.absolute_url(&raw.torrent_url)),
        magnet_link: (!raw.magnet.is_empty()).then(|| raw.magnet.clone()),
        info_hash: info_hash_from_magnet(&raw.magnet),
        resolution: String::new(),
        is_batch: info.is_batch(),
        is_best_release: false,
        confirmed,
        episode_number: info.episode_number,
    }
}
