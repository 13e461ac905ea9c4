//! HTML rendering of digest pages.
//!
//! The template is embedded at compile time and compiled once per
//! [`DigestRenderer`]. Release content comes from the feed as HTML and is
//! inserted as-is; every other string goes through the `escape` formatter.

use serde::Serialize;
use tracing::instrument;
use upon::{Engine, Template};

use tracker::{DigestPage, ReleaseItem, RepositoryRecord};

use crate::error::MailerError;

const DIGEST_TEMPLATE: &str = include_str!("../templates/digest.html");

/// Subject line used when none is configured.
pub const DEFAULT_SUBJECT: &str = "New GitHub Releases";

/// Renders [`DigestPage`]s into standalone HTML documents.
pub struct DigestRenderer {
    engine: Engine<'static>,
    template: Template<'static>,
    subject: String,
}

impl std::fmt::Debug for DigestRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigestRenderer")
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

impl DigestRenderer {
    /// Compiles the digest template. `subject` becomes the document title.
    pub fn new(subject: impl Into<String>) -> Result<Self, MailerError> {
        let mut engine = Engine::new();
        addons::configure(&mut engine);
        let template = engine
            .compile(DIGEST_TEMPLATE)
            .map_err(MailerError::Template)?;
        Ok(Self {
            engine,
            template,
            subject: subject.into(),
        })
    }

    /// Subject line for `page`; multi-page runs get a `(n/m)` suffix.
    pub fn subject_for(&self, page: &DigestPage) -> String {
        if page.count > 1 {
            format!("{} ({}/{})", self.subject, page.number, page.count)
        } else {
            self.subject.clone()
        }
    }

    #[instrument(skip_all, fields(page = page.number, groups = page.groups.len()))]
    pub fn render(&self, page: &DigestPage) -> Result<String, MailerError> {
        self.template
            .render(&self.engine, DigestView::new(&self.subject, page))
            .to_string()
            .map_err(|source| MailerError::Render {
                page: page.number,
                source,
            })
    }
}

#[derive(Serialize)]
struct DigestView<'a> {
    subject: &'a str,
    paginated: bool,
    page: usize,
    pages: usize,
    release_count: usize,
    repositories: Vec<RepositoryView<'a>>,
}

#[derive(Serialize)]
struct RepositoryView<'a> {
    full_name: &'a str,
    html_url: &'a str,
    description: Option<&'a str>,
    stars: u64,
    forks: u64,
    watchers: u64,
    releases: Vec<ReleaseView<'a>>,
}

#[derive(Serialize)]
struct ReleaseView<'a> {
    title: &'a str,
    link: Option<&'a str>,
    published: Option<String>,
    content: &'a str,
}

impl<'a> DigestView<'a> {
    fn new(subject: &'a str, page: &'a DigestPage) -> Self {
        Self {
            subject,
            paginated: page.count > 1,
            page: page.number,
            pages: page.count,
            release_count: page.release_count(),
            repositories: page
                .groups
                .iter()
                .map(|g| RepositoryView::new(&g.repository, &g.releases))
                .collect(),
        }
    }
}

impl<'a> RepositoryView<'a> {
    fn new(repository: &'a RepositoryRecord, releases: &'a [ReleaseItem]) -> Self {
        Self {
            full_name: repository.full_name.as_str(),
            html_url: &repository.html_url,
            description: repository.description.as_deref(),
            stars: repository.stargazers_count,
            forks: repository.forks_count,
            watchers: repository.watchers_count,
            releases: releases
                .iter()
                .map(|r| ReleaseView {
                    title: &r.title,
                    link: r.link.as_deref(),
                    published: r
                        .published
                        .map(|t| t.as_datetime().format("%Y-%m-%d %H:%M UTC").to_string()),
                    content: &r.content,
                })
                .collect(),
        }
    }
}

mod addons {
    use std::fmt::Write;

    use upon::{fmt as upon_fmt, Engine, Value};

    /// Escapes the five HTML-significant characters in strings; other values
    /// use the default formatter.
    fn escape_formatter(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        match value {
            Value::String(s) => {
                for c in s.chars() {
                    match c {
                        '&' => f.write_str("&amp;")?,
                        '<' => f.write_str("&lt;")?,
                        '>' => f.write_str("&gt;")?,
                        '"' => f.write_str("&quot;")?,
                        '\'' => f.write_str("&#39;")?,
                        c => f.write_char(c)?,
                    }
                }
            }
            v => upon_fmt::default(f, v)?,
        };
        Ok(())
    }

    pub(super) fn configure(engine: &mut Engine<'_>) {
        engine.add_formatter("escape", escape_formatter);
    }
}
