//! Plain-text rendering of the header and pages for the command line.
use std::fmt::Write;

use crate::pages::create::CreateState;
use crate::pages::detail::DetailState;
use crate::pages::list::ListState;
use crate::pages::login::LoginState;
use crate::pages::PageItem;
use crate::shell::header::{HeaderView, SessionControl};
use crate::shell::Page;

const EXCERPT_CHARS: usize = 160;

pub fn header(view: &HeaderView) -> String {
    let mut out = String::from("TechEndeavor |");
    for link in &view.links {
        let _ = write!(out, " {} ({})", link.label, link.route);
    }
    match &view.control {
        SessionControl::LoginButton => out.push_str(" | Login (/login)"),
        SessionControl::ProfileMenu { identity, open } => {
            match identity {
                Some(identity) => {
                    let _ = write!(out, " | {}", identity.display_name);
                }
                None => out.push_str(" | (signed in)"),
            }
            if *open {
                if let Some(identity) = identity {
                    let _ = write!(out, "\n  Authenticated as {} <{}>", identity.display_name, identity.contact_address);
                }
                out.push_str("\n  [Sign Out]");
            }
        }
    }
    out
}

pub fn page(page: &Page) -> String {
    match page {
        Page::Feed(vm) => feed(&vm.snapshot()),
        Page::Article(vm) => article(&vm.snapshot()),
        Page::CreateArticle(vm) => create_form(&vm.snapshot()),
        Page::Login(vm) => login_form(&vm.snapshot()),
        Page::NotFound(path) => format!("Nothing lives at {path}."),
    }
}

pub fn feed(state: &ListState) -> String {
    if state.show_full_spinner() {
        return "Loading...".to_string();
    }
    let mut out = String::new();
    if let Some(error) = &state.error {
        let _ = writeln!(out, "! {error}");
    }
    if state.is_empty_feed() {
        out.push_str("No articles yet.\n");
    }
    for summary in &state.articles {
        let author = summary
            .author
            .as_ref()
            .map(|a| a.display_name.as_str())
            .unwrap_or("Unknown author");
        let _ = writeln!(
            out,
            "#{} {}\n    {} · {}\n    {}",
            summary.id,
            summary.title,
            summary.created_at.format("%Y-%m-%d"),
            author,
            excerpt(&summary.body_excerpt),
        );
    }
    if state.shows_pagination() {
        out.push_str(&pagination(state));
        out.push('\n');
    }
    out
}

fn pagination(state: &ListState) -> String {
    let window = state.window;
    let mut parts = Vec::new();
    parts.push(if window.has_previous() { "< Prev" } else { "  Prev" }.to_string());
    for item in state.page_items() {
        parts.push(match item {
            PageItem::Page(n) if n == window.current_page() => format!("[{n}]"),
            PageItem::Page(n) => n.to_string(),
            PageItem::Ellipsis => "…".to_string(),
        });
    }
    parts.push(if window.has_next() { "Next >" } else { "Next  " }.to_string());
    parts.join(" ")
}

fn excerpt(body: &str) -> String {
    let mut chars = body.chars();
    let head: String = chars.by_ref().take(EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head.trim_end())
    } else {
        head
    }
}

pub fn article(state: &DetailState) -> String {
    if state.loading {
        return "Loading...".to_string();
    }
    match (&state.article, &state.error) {
        (Some(article), None) => {
            let author = article
                .author
                .as_ref()
                .map(|a| a.display_name.as_str())
                .unwrap_or("Unknown author");
            format!(
                "{}\n{} · {}\n\n{}\n",
                article.title,
                article.created_at.format("%B %-d, %Y"),
                author,
                article.body
            )
        }
        (_, Some(error)) => format!("! {error}\n< Back to Feed (/)"),
        (None, None) => "! Failed to load the article.\n< Back to Feed (/)".to_string(),
    }
}

pub fn create_form(state: &CreateState) -> String {
    let mut out = String::from("Post Article\n");
    if let Some(error) = &state.error {
        let _ = writeln!(out, "! {error}");
    }
    let _ = writeln!(out, "Title: {}", state.draft.title);
    let _ = writeln!(out, "Content: {}", state.draft.body);
    out.push_str(if state.submitting { "[Publishing...]" } else { "[Publish Post] [Cancel]" });
    out
}

pub fn login_form(state: &LoginState) -> String {
    let mut out = String::from("Sign In\n");
    if let Some(error) = &state.error {
        let _ = writeln!(out, "! {error}");
    }
    let _ = writeln!(out, "Username: {}", state.username);
    let _ = writeln!(out, "Password: {}", state.password);
    out.push_str(if state.submitting { "[Logging in...]" } else { "[Sign In]" });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ArticleSummary, PageWindow};
    use chrono::TimeZone;

    #[test]
    fn feed_marks_current_page_and_ellipses() {
        let state = ListState {
            articles: vec![ArticleSummary {
                id: 1,
                title: "Hello".into(),
                body_excerpt: "x".repeat(200),
                created_at: chrono::Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
                author: None,
            }],
            window: PageWindow::new(5, 10),
            requested_page: 5,
            error: None,
            loading: false,
            loaded_once: true,
        };
        let text = feed(&state);
        assert!(text.contains("< Prev 1 … 3 4 [5] 6 7 … 10 Next >"));
        assert!(text.contains("2024-05-01 · Unknown author"));
        assert!(text.contains('…'));
    }

    #[test]
    fn spinner_only_before_first_load() {
        let state = ListState {
            loading: true,
            ..ListState::default()
        };
        assert_eq!(feed(&state), "Loading...");
    }
}
