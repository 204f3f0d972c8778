// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::models::records::PostItem;

// 3d, 2w, 4mo, 1y, 5h, 10m, 45s (optionally "3 days ago", "3d •")
static RELATIVE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d+)\s*(s|sec|secs|second|seconds|m|min|mins|minute|minutes|h|hr|hrs|hour|hours|d|day|days|w|wk|wks|week|weeks|mo|mos|month|months|y|yr|yrs|year|years)\b",
    )
    .expect("relative time regex is valid")
});

/// 解析动态上显示的时间
///
/// 支持 RFC 3339、`YYYY-MM-DD` 以及站点使用的相对时间缩写。
/// 无法识别时返回 `None`。
pub fn parse_posted_at(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }

    let lowered = raw.to_ascii_lowercase();
    let captures = RELATIVE_TIME.captures(&lowered)?;
    let amount: i64 = captures.get(1)?.as_str().parse().ok()?;
    // Scraped text can carry absurd amounts; overflow means unparseable.
    let age = match captures.get(2)?.as_str() {
        "s" | "sec" | "secs" | "second" | "seconds" => Duration::try_seconds(amount)?,
        "m" | "min" | "mins" | "minute" | "minutes" => Duration::try_minutes(amount)?,
        "h" | "hr" | "hrs" | "hour" | "hours" => Duration::try_hours(amount)?,
        "d" | "day" | "days" => Duration::try_days(amount)?,
        "w" | "wk" | "wks" | "week" | "weeks" => Duration::try_weeks(amount)?,
        "mo" | "mos" | "month" | "months" => Duration::try_days(amount.checked_mul(30)?)?,
        "y" | "yr" | "yrs" | "year" | "years" => Duration::try_days(amount.checked_mul(365)?)?,
        _ => return None,
    };

    now.checked_sub_signed(age)
}

/// 按回溯窗口过滤动态
///
/// 时间可解析且不晚于 `now - days` 的条目被丢弃；时间缺失或无法解析的条目保留。
/// 窗口超出可表示的时间范围时不丢弃任何条目。
pub fn filter_recent(items: Vec<PostItem>, days: i64, now: DateTime<Utc>) -> Vec<PostItem> {
    let cutoff = lookback_cutoff(days, now);
    items
        .into_iter()
        .filter(|item| {
            match item
                .posted_at
                .as_deref()
                .and_then(|raw| parse_posted_at(raw, now))
            {
                Some(posted) => posted > cutoff,
                None => true,
            }
        })
        .collect()
}

/// 回溯窗口的起点，溢出时退回到最早可表示的时间
pub fn lookback_cutoff(days: i64, now: DateTime<Utc>) -> DateTime<Utc> {
    Duration::try_days(days.max(0))
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
