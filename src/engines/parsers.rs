// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 站点页面解析
//!
//! 站点的 HTML 结构经常变化，每个字段按顺序尝试多种选择器策略，
//! 全部失败时退回到 OpenGraph 元数据。

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::domain::models::records::{
    CompanyRecord, JobItem, JobsRecord, PostItem, PostsRecord, ProfileRecord, MAX_JOBS,
};

const CHALLENGE_URL_MARKERS: &[&str] = &["/checkpoint/challenge", "/challenge/", "captcha"];
const CHALLENGE_HTML_MARKERS: &[&str] = &[
    "captcha-internal",
    "g-recaptcha",
    "h-captcha",
    "arkose",
    "<title>security verification",
    "let's do a quick security check",
];
const LOGIN_URL_MARKERS: &[&str] = &["/authwall", "/login", "/uas/login", "/signup", "/checkpoint/lg"];

fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(sel) => Some(sel),
        Err(e) => {
            warn!("Invalid selector {}: {:?}", css, e);
            None
        }
    }
}

fn clean_text(raw: &str) -> Option<String> {
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn element_text(element: ElementRef<'_>) -> Option<String> {
    clean_text(&element.text().collect::<String>())
}

/// 在 `scope` 中按顺序尝试选择器，返回第一个非空文本
fn first_text(scope: ElementRef<'_>, strategies: &[&str]) -> Option<String> {
    strategies.iter().find_map(|css| {
        let sel = selector(css)?;
        scope.select(&sel).find_map(element_text)
    })
}

fn first_attr(scope: ElementRef<'_>, strategies: &[&str], attr: &str) -> Option<String> {
    strategies.iter().find_map(|css| {
        let sel = selector(css)?;
        scope
            .select(&sel)
            .find_map(|el| el.value().attr(attr).and_then(clean_text))
    })
}

fn all_texts(scope: ElementRef<'_>, strategies: &[&str]) -> Vec<String> {
    for css in strategies {
        let Some(sel) = selector(css) else { continue };
        let texts: Vec<String> = scope.select(&sel).filter_map(element_text).collect();
        if !texts.is_empty() {
            return texts;
        }
    }
    Vec::new()
}

/// 读取 `<meta property=..>` 或 `<meta name=..>` 的内容
fn meta_content(document: &Html, key: &str) -> Option<String> {
    let css = format!("meta[property='{key}'], meta[name='{key}']");
    let sel = selector(&css)?;
    document
        .select(&sel)
        .find_map(|el| el.value().attr("content").and_then(clean_text))
}

/// 去掉标题中的站点后缀，例如 "Acme | LinkedIn"
fn strip_site_suffix(title: String) -> String {
    match title.split_once(" | ") {
        Some((head, _)) => head.trim().to_string(),
        None => title,
    }
}

fn absolutize(href: &str, base_url: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.split('?').next().unwrap_or(href).to_string());
    }
    let base = Url::parse(base_url).ok()?;
    let mut joined = base.join(href).ok()?;
    joined.set_query(None);
    Some(joined.to_string())
}

fn parse_count(raw: &str) -> Option<u64> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// 是否为验证码或反爬挑战页
pub fn detect_challenge(url: &str, html: &str) -> bool {
    let url = url.to_ascii_lowercase();
    if CHALLENGE_URL_MARKERS.iter().any(|m| url.contains(m)) {
        return true;
    }
    let html = html.to_ascii_lowercase();
    CHALLENGE_HTML_MARKERS.iter().any(|m| html.contains(m))
}

/// 是否停留在登录墙
pub fn detect_login_wall(url: &str, html: &str) -> bool {
    let path = Url::parse(url)
        .map(|u| u.path().to_ascii_lowercase())
        .unwrap_or_else(|_| url.to_ascii_lowercase());
    if LOGIN_URL_MARKERS.iter().any(|m| path.starts_with(m)) {
        return true;
    }

    let document = Html::parse_document(html);
    ["input[name='session_password']", "form.login__form", "div.authwall-join-form"]
        .iter()
        .filter_map(|css| selector(css))
        .any(|sel| document.select(&sel).next().is_some())
}

/// 解析个人主页
pub fn parse_profile(html: &str) -> ProfileRecord {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let name = first_text(
        root,
        &["h1.text-heading-xlarge", "h1.top-card-layout__title", "main h1", "h1"],
    )
    .or_else(|| meta_content(&document, "og:title").map(strip_site_suffix));

    let headline = first_text(
        root,
        &[
            "div.text-body-medium.break-words",
            "h2.top-card-layout__headline",
            ".pv-text-details__left-panel .text-body-medium",
        ],
    );

    let location = first_text(
        root,
        &[
            "span.text-body-small.inline.t-black--light.break-words",
            "div.top-card__subline-item",
            ".top-card-layout__first-subline span",
        ],
    );

    let about = first_text(
        root,
        &[
            "section.summary p",
            "section[data-section='summary'] .core-section-container__content",
            "#about ~ div .inline-show-more-text span[aria-hidden='true']",
        ],
    )
    .or_else(|| meta_content(&document, "og:description"));

    let experience = all_texts(
        root,
        &[
            "section[data-section='experience'] li h3",
            "section.experience li h3",
            "#experience ~ div li .t-bold span[aria-hidden='true']",
        ],
    );

    let education = all_texts(
        root,
        &[
            "section[data-section='educationsDetails'] li h3",
            "section.education li h3",
            "#education ~ div li .t-bold span[aria-hidden='true']",
        ],
    );

    ProfileRecord {
        name,
        headline,
        location,
        about,
        experience,
        education,
    }
}

/// 解析公司主页
pub fn parse_company(html: &str) -> CompanyRecord {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let mut record = CompanyRecord {
        name: first_text(
            root,
            &[
                "h1.top-card-layout__title",
                "h1.org-top-card-summary__title",
                "main h1",
                "h1",
            ],
        )
        .or_else(|| meta_content(&document, "og:title").map(strip_site_suffix)),
        tagline: first_text(
            root,
            &[
                "h4.top-card-layout__second-subline",
                "p.org-top-card-summary__tagline",
            ],
        ),
        about: first_text(
            root,
            &[
                "p[data-test-id='about-us__description']",
                "section.org-about-module p",
                "p.break-words",
            ],
        )
        .or_else(|| meta_content(&document, "og:description")),
        ..Default::default()
    };

    // About sections are rendered as label/value pairs.
    if let (Some(dt), Some(dd)) = (selector("dt"), selector("dd")) {
        let labels: Vec<String> = root.select(&dt).filter_map(element_text).collect();
        let values: Vec<String> = root.select(&dd).filter_map(element_text).collect();
        for (label, value) in labels.iter().zip(values) {
            match label.to_ascii_lowercase().as_str() {
                "industry" => record.industry = Some(value),
                "company size" | "size" => record.size = Some(value),
                "headquarters" => record.headquarters = Some(value),
                "website" => record.website = Some(value),
                other => debug!("Ignoring company field {}", other),
            }
        }
    }

    record
}

/// 解析动态列表
///
/// `base_url` 用于把相对链接补全为绝对地址
pub fn parse_posts(html: &str, base_url: &str) -> PostsRecord {
    const CONTAINERS: &[&str] = &[
        "div.feed-shared-update-v2",
        "article[data-activity-urn]",
        "li article.main-feed-activity-card",
        "div[data-urn*='activity']",
    ];

    let document = Html::parse_document(html);

    let mut containers: Vec<ElementRef<'_>> = Vec::new();
    let mut used_strategy = "none";
    for css in CONTAINERS {
        let Some(sel) = selector(css) else { continue };
        containers = document.select(&sel).collect();
        if !containers.is_empty() {
            used_strategy = *css;
            break;
        }
    }
    debug!(
        "Post strategy {} matched {} containers",
        used_strategy,
        containers.len()
    );

    let posts = containers
        .into_iter()
        .map(|container| {
            let text = first_text(
                container,
                &[
                    "div.update-components-text",
                    "div.feed-shared-update-v2__description",
                    "p.attributed-text-segment-list__content",
                    ".break-words",
                ],
            );

            let posted_at = first_attr(container, &["time[datetime]"], "datetime")
                .or_else(|| {
                    first_text(
                        container,
                        &[
                            "time",
                            ".update-components-actor__sub-description span[aria-hidden='true']",
                            "span.feed-shared-actor__sub-description",
                        ],
                    )
                });

            let urn = container
                .value()
                .attr("data-urn")
                .or_else(|| container.value().attr("data-activity-urn"))
                .map(str::to_string);
            let url = first_attr(container, &["a[href*='/feed/update/']", "a[href*='/posts/']"], "href")
                .and_then(|href| absolutize(&href, base_url))
                .or_else(|| {
                    urn.and_then(|urn| absolutize(&format!("/feed/update/{}/", urn), base_url))
                });

            let reactions = first_text(
                container,
                &[
                    "span.social-details-social-counts__reactions-count",
                    "[data-test-id='social-actions__reaction-count']",
                ],
            )
            .and_then(|raw| parse_count(&raw));

            PostItem {
                text,
                posted_at,
                url,
                reactions,
            }
        })
        .filter(|post| post.text.is_some() || post.url.is_some())
        .collect();

    PostsRecord { posts }
}

/// 解析职位列表，最多返回 [`MAX_JOBS`] 条
pub fn parse_jobs(html: &str, base_url: &str) -> JobsRecord {
    const CONTAINERS: &[&str] = &[
        "ul.jobs-search__results-list > li",
        "li.job-card-container",
        "div.base-card.job-search-card",
        "li[data-occludable-job-id]",
    ];

    let document = Html::parse_document(html);

    let mut containers: Vec<ElementRef<'_>> = Vec::new();
    for css in CONTAINERS {
        let Some(sel) = selector(css) else { continue };
        containers = document.select(&sel).collect();
        if !containers.is_empty() {
            break;
        }
    }

    let jobs = containers
        .into_iter()
        .map(|container| JobItem {
            title: first_text(
                container,
                &[
                    "h3.base-search-card__title",
                    ".job-card-list__title",
                    "a.job-card-container__link",
                    "h3",
                ],
            ),
            location: first_text(
                container,
                &[
                    "span.job-search-card__location",
                    ".job-card-container__metadata-item",
                ],
            ),
            url: first_attr(
                container,
                &["a.base-card__full-link", "a[href*='/jobs/view/']"],
                "href",
            )
            .and_then(|href| absolutize(&href, base_url)),
            listed_at: first_attr(container, &["time[datetime]"], "datetime")
                .or_else(|| first_text(container, &["time"])),
        })
        .filter(|job| job.title.is_some())
        .take(MAX_JOBS)
        .collect();

    JobsRecord { jobs }
}
