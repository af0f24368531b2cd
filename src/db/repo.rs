use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::instrument;

pub type Pool = SqlitePool;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let options = SqliteConnectOptions::from_str(&normalized)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Full);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/` and ensure the parent
/// directory exists. Leaves in-memory URLs untouched. Returns possibly-updated URL.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = url.trim_start_matches("sqlite:");
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);
    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };
    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded_path = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    let mut rebuilt = String::from("sqlite://");
    rebuilt.push_str(&expanded_path);
    if let Some(q) = query_part {
        rebuilt.push('?');
        rebuilt.push_str(q);
    }
    rebuilt
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[instrument(skip(pool))]
pub async fn get_credential(pool: &Pool, origin: &str) -> Result<Option<String>> {
    let token = sqlx::query_scalar::<_, String>("SELECT token FROM credentials WHERE origin = ?")
        .bind(origin)
        .fetch_optional(pool)
        .await?;
    Ok(token)
}

#[instrument(skip(pool, token))]
pub async fn put_credential(pool: &Pool, origin: &str, token: &str) -> Result<()> {
    sqlx::query(
        "INSERT INTO credentials (origin, token) VALUES (?, ?) \
         ON CONFLICT(origin) DO UPDATE SET token = excluded.token, stored_at = CURRENT_TIMESTAMP",
    )
    .bind(origin)
    .bind(token)
    .execute(pool)
    .await?;
    Ok(())
}

#[instrument(skip(pool))]
pub async fn delete_credential(pool: &Pool, origin: &str) -> Result<()> {
    sqlx::query("DELETE FROM credentials WHERE origin = ?")
        .bind(origin)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_sqlite_url_passes_memory_through() {
        assert_eq!(prepare_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(prepare_sqlite_url("postgres://db"), "postgres://db");
    }

    #[test]
    fn prepare_sqlite_url_creates_parent_and_keeps_query() {
        let td = tempfile::tempdir().unwrap();
        let file = td.path().join("nested/dir/app.db");
        let url = format!("sqlite://{}?mode=rwc", file.display());
        let rebuilt = prepare_sqlite_url(&url);
        assert_eq!(rebuilt, url);
        assert!(td.path().join("nested/dir").exists());
    }

    #[tokio::test]
    async fn credential_upsert_and_delete() {
        let pool = init_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        assert_eq!(get_credential(&pool, "http://a").await.unwrap(), None);
        put_credential(&pool, "http://a", "one").await.unwrap();
        put_credential(&pool, "http://a", "two").await.unwrap();
        put_credential(&pool, "http://b", "other").await.unwrap();
        assert_eq!(get_credential(&pool, "http://a").await.unwrap().as_deref(), Some("two"));

        delete_credential(&pool, "http://a").await.unwrap();
        assert_eq!(get_credential(&pool, "http://a").await.unwrap(), None);
        assert_eq!(get_credential(&pool, "http://b").await.unwrap().as_deref(), Some("other"));
    }
}
