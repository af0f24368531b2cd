use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static ARTICLE_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/blog/(\d+)$").expect("valid article route pattern"));

/// Every page the shell can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Feed,
    Login,
    CreateArticle,
    Article(i64),
    NotFound(String),
}

impl Route {
    /// Map a URL path (query and fragment ignored) to a route.
    pub fn parse(path: &str) -> Self {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default();
        let trimmed = if path.len() > 1 {
            path.trim_end_matches('/')
        } else {
            path
        };
        match trimmed {
            "" | "/" => Route::Feed,
            "/login" => Route::Login,
            "/create-blog" => Route::CreateArticle,
            other => ARTICLE_PATH
                .captures(other)
                .and_then(|caps| caps[1].parse().ok())
                .map(Route::Article)
                .unwrap_or_else(|| Route::NotFound(path.to_string())),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Feed => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::CreateArticle => "/create-blog".to_string(),
            Route::Article(id) => format!("/blog/{id}"),
            Route::NotFound(path) => path.clone(),
        }
    }

    /// Pages that only make sense with a credential.
    pub fn requires_credential(&self) -> bool {
        matches!(self, Route::CreateArticle)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_paths() {
        assert_eq!(Route::parse("/"), Route::Feed);
        assert_eq!(Route::parse(""), Route::Feed);
        assert_eq!(Route::parse("/login"), Route::Login);
        assert_eq!(Route::parse("/create-blog/"), Route::CreateArticle);
        assert_eq!(Route::parse("/blog/42"), Route::Article(42));
        assert_eq!(Route::parse("/blog/42?ref=feed"), Route::Article(42));
    }

    #[test]
    fn unknown_paths_are_not_found() {
        assert_eq!(Route::parse("/blog/abc"), Route::NotFound("/blog/abc".into()));
        assert_eq!(Route::parse("/blog/"), Route::NotFound("/blog/".into()));
        assert_eq!(Route::parse("/admin"), Route::NotFound("/admin".into()));
    }

    #[test]
    fn paths_round_trip() {
        for route in [Route::Feed, Route::Login, Route::CreateArticle, Route::Article(7)] {
            assert_eq!(Route::parse(&route.path()), route);
        }
        assert!(Route::CreateArticle.requires_credential());
        assert!(!Route::Article(1).requires_credential());
    }
}
