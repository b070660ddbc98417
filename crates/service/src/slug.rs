//! URL slugs derived from titles, with a timestamp suffix on collision.

use std::future::Future;

use async_trait::async_trait;
use tracing::warn;

use crate::errors::ServiceError;
use crate::schema::is_duplicate_slug;

pub const MAX_SLUG_LEN: usize = 120;
/// Insert attempts before a duplicate slug is reported as a conflict.
pub const MAX_ATTEMPTS: u32 = 3;

/// Lowercase ASCII words joined by single hyphens.
pub fn slugify(title: &str) -> Result<String, ServiceError> {
    let mut out = String::with_capacity(title.len());
    let mut pending_dash = false;
    for ch in title.chars() {
        for folded in fold(ch) {
            if folded.is_ascii_alphanumeric() {
                if pending_dash && !out.is_empty() {
                    out.push('-');
                }
                pending_dash = false;
                out.push(folded.to_ascii_lowercase());
            } else if folded != '\0' {
                pending_dash = true;
            }
        }
    }
    if out.len() > MAX_SLUG_LEN {
        let cut = &out[..MAX_SLUG_LEN];
        // keep whole words when a separator exists inside the limit
        let end = if out.as_bytes()[MAX_SLUG_LEN] == b'-' {
            MAX_SLUG_LEN
        } else {
            cut.rfind('-').unwrap_or(MAX_SLUG_LEN)
        };
        out.truncate(end);
    }
    if out.is_empty() {
        return Err(ServiceError::Validation("title does not produce a usable slug".into()));
    }
    Ok(out)
}

/// ASCII replacement for Latin letters with diacritics. `'\0'` means drop.
fn fold(ch: char) -> Vec<char> {
    let s: &str = match ch {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => "a",
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' | 'Å' => "A",
        'é' | 'è' | 'ê' | 'ë' => "e",
        'É' | 'È' | 'Ê' | 'Ë' => "E",
        'í' | 'ì' | 'î' | 'ï' => "i",
        'Í' | 'Ì' | 'Î' | 'Ï' => "I",
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => "O",
        'ú' | 'ù' | 'û' | 'ü' => "u",
        'Ú' | 'Ù' | 'Û' | 'Ü' => "U",
        'ç' => "c",
        'Ç' => "C",
        'ñ' => "n",
        'Ñ' => "N",
        'ý' | 'ÿ' => "y",
        'Ý' => "Y",
        'ß' => "ss",
        'æ' => "ae",
        'Æ' => "AE",
        'œ' => "oe",
        'Œ' => "OE",
        // combining marks left by decomposed input
        '\u{0300}'..='\u{036f}' => "\0",
        '\'' | '’' => "\0",
        _ => return vec![ch],
    };
    s.chars().collect()
}

/// Existence probe for a slugged table.
#[async_trait]
pub trait SlugLookup: Send + Sync {
    async fn slug_exists(&self, slug: &str) -> Result<bool, ServiceError>;
}

fn unix_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Derive a slug from `title` and run `insert` with it, retrying with a
/// suffixed slug when the row collides on the unique index.
pub async fn insert_with_unique_slug<L, T, F, Fut>(
    lookup: &L,
    table: &'static str,
    title: &str,
    mut insert: F,
) -> Result<T, ServiceError>
where
    L: SlugLookup + ?Sized,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    let base = slugify(title)?;
    let stamp = unix_millis();
    let mut candidate = base.clone();
    if lookup.slug_exists(&candidate).await? {
        common::metrics::record_slug_collision(table);
        candidate = format!("{base}-{stamp}");
    }

    let mut attempt = 1;
    loop {
        match insert(candidate.clone()).await {
            Ok(v) => return Ok(v),
            Err(e) if e.db_message().is_some_and(is_duplicate_slug) => {
                common::metrics::record_slug_collision(table);
                if attempt >= MAX_ATTEMPTS {
                    return Err(ServiceError::Conflict(format!("slug {candidate} already taken")));
                }
                warn!(table, slug = %candidate, attempt, "slug collided on insert; retrying");
                candidate = format!("{base}-{stamp}-{attempt}");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    #[test]
    fn folds_portuguese_titles() {
        assert_eq!(slugify("Inauguração da Praça São João").unwrap(), "inauguracao-da-praca-sao-joao");
        assert_eq!(slugify("  Feira -- de   Artesanato!! ").unwrap(), "feira-de-artesanato");
        assert_eq!(slugify("Straße & Café").unwrap(), "strasse-cafe");
        assert_eq!(slugify("d'água").unwrap(), "dagua");
    }

    #[test]
    fn output_is_lowercase_ascii_with_single_hyphens() {
        for title in ["Olá, Mundo!", "A--B__C", "ÁÉÍÓÚ ãõ ç", "2024: Ano Novo", "-x-", "e\u{0301}vora"] {
            let s = slugify(title).unwrap();
            assert!(s.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'), "{s}");
            assert!(!s.starts_with('-') && !s.ends_with('-'), "{s}");
            assert!(!s.contains("--"), "{s}");
        }
    }

    #[test]
    fn long_titles_cut_at_word_boundary() {
        let title = "palavra ".repeat(30);
        let s = slugify(&title).unwrap();
        assert!(s.len() <= MAX_SLUG_LEN);
        assert!(s.ends_with("palavra"));
    }

    #[test]
    fn empty_slug_is_rejected() {
        assert!(matches!(slugify("!!! ???"), Err(ServiceError::Validation(_))));
        assert!(matches!(slugify(""), Err(ServiceError::Validation(_))));
    }

    #[derive(Default)]
    struct Taken(Mutex<HashSet<String>>);

    #[async_trait]
    impl SlugLookup for Taken {
        async fn slug_exists(&self, slug: &str) -> Result<bool, ServiceError> {
            Ok(self.0.lock().unwrap().contains(slug))
        }
    }

    impl Taken {
        fn insert(&self, slug: String) -> Result<String, ServiceError> {
            let mut set = self.0.lock().unwrap();
            if !set.insert(slug.clone()) {
                return Err(ServiceError::Db(r#"duplicate key value violates unique constraint "news_slug_key""#.into()));
            }
            Ok(slug)
        }
    }

    #[tokio::test]
    async fn same_title_twice_yields_distinct_slugs() {
        let taken = Taken::default();
        let a = insert_with_unique_slug(&taken, "news", "Festa Junina", |s| async { taken.insert(s) }).await.unwrap();
        let b = insert_with_unique_slug(&taken, "news", "Festa Junina", |s| async { taken.insert(s) }).await.unwrap();
        assert_eq!(a, "festa-junina");
        assert_ne!(a, b);
        assert!(b.starts_with("festa-junina-"));
    }

    #[tokio::test]
    async fn duplicate_on_insert_retries_with_attempt_suffix() {
        let taken = Taken::default();
        let mut calls = 0;
        let out = insert_with_unique_slug(&taken, "news", "Corrida", |s| {
            calls += 1;
            let first = calls == 1;
            let res = if first {
                // lost the race against a concurrent insert
                Err(ServiceError::Db("duplicate key value violates unique constraint \"news_slug_key\"".into()))
            } else {
                Ok(s)
            };
            async move { res }
        })
        .await
        .unwrap();
        assert!(out.starts_with("corrida-"));
        assert!(out.ends_with("-1"));
    }

    #[tokio::test]
    async fn gives_up_after_bounded_attempts() {
        let taken = Taken::default();
        let mut calls = 0u32;
        let res: Result<String, _> = insert_with_unique_slug(&taken, "news", "Sempre", |_| {
            calls += 1;
            async { Err(ServiceError::Db(r#"duplicate key value violates unique constraint "news_slug_key""#.into())) }
        })
        .await;
        assert!(matches!(res, Err(ServiceError::Conflict(_))));
        assert_eq!(calls, MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn other_unique_keys_are_not_slug_collisions() {
        let taken = Taken::default();
        let mut calls = 0u32;
        let res: Result<String, _> = insert_with_unique_slug(&taken, "subscribers", "Padaria", |_| {
            calls += 1;
            async {
                Err(ServiceError::Db(
                    r#"duplicate key value violates unique constraint "subscribers_user_id_key""#.into(),
                ))
            }
        })
        .await;
        assert!(matches!(res, Err(ServiceError::Db(_))));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let taken = Taken::default();
        let res: Result<String, _> =
            insert_with_unique_slug(&taken, "news", "Falha", |_| async { Err(ServiceError::Db("connection reset".into())) }).await;
        assert!(matches!(res, Err(ServiceError::Db(_))));
    }
}
