use std::{collections::BTreeSet, fs, path::Path};

use async_trait::async_trait;
use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;

use hb_core::{engine::NO_COMPLIMENTS, errors::Error, ports::ComplimentSource, Result};

use crate::{storage, SqliteStore};

/// Placeholder in a typed sentence that receives the random word.
pub const WORD_SLOT: &str = "{}";

/// Compliment data set as stored in a seed file:
///
/// ```json
/// {"sentences": [{"sentence": "You are so {}!", "type": "adjective"}],
///  "words": [{"word": "kind", "type": "adjective"}]}
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub sentences: Vec<SeedSentence>,
    #[serde(default)]
    pub words: Vec<SeedWord>,
}

#[derive(Debug, Deserialize)]
pub struct SeedSentence {
    pub sentence: String,
    #[serde(default, rename = "type")]
    pub word_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedWord {
    pub word: String,
    #[serde(rename = "type")]
    pub word_type: String,
}

impl SqliteStore {
    /// Add a sentence. When `word_type` is set the sentence should contain a
    /// `{}` slot.
    pub fn add_sentence(&self, sentence: &str, word_type: Option<&str>) -> Result<()> {
        insert_sentence(&*self.conn()?, sentence, word_type)
    }

    pub fn add_word(&self, word: &str, word_type: &str) -> Result<()> {
        insert_word(&*self.conn()?, word, word_type)
    }

    /// Import the seed file at `path` unless sentences are already stored.
    ///
    /// Returns the number of rows inserted. The import is all or nothing.
    pub fn seed_if_empty(&self, path: &Path) -> Result<usize> {
        let mut conn = self.conn()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM sentences", [], |row| row.get(0))
            .map_err(storage)?;
        if count > 0 {
            tracing::debug!(sentences = count, "data set present, skipping seed");
            return Ok(0);
        }

        let data: SeedData = serde_json::from_str(&fs::read_to_string(path)?)?;

        let tx = conn.transaction().map_err(storage)?;
        for s in &data.sentences {
            insert_sentence(&tx, &s.sentence, s.word_type.as_deref())?;
        }
        for w in &data.words {
            insert_word(&tx, &w.word, &w.word_type)?;
        }
        tx.commit().map_err(storage)?;

        let inserted = data.sentences.len() + data.words.len();
        tracing::info!(
            path = %path.display(),
            sentences = data.sentences.len(),
            words = data.words.len(),
            "seeded compliment data"
        );
        Ok(inserted)
    }

    fn create_compliment(&self) -> Result<String> {
        let conn = self.conn()?;

        let Some((sentence, word_type)) = random_sentence(&conn)? else {
            return Ok(NO_COMPLIMENTS.to_string());
        };
        let Some(word_type) = word_type else {
            return Ok(sentence);
        };

        let word = random_word(&conn, &word_type)?.ok_or_else(|| {
            Error::Storage(format!("no words of type '{word_type}' for sentence: {sentence}"))
        })?;
        Ok(sentence.replacen(WORD_SLOT, &word, 1))
    }
}

fn insert_sentence(conn: &Connection, sentence: &str, word_type: Option<&str>) -> Result<()> {
    conn.execute(
        "INSERT INTO sentences (sentence, word_type) VALUES (?1, ?2)",
        params![sentence, word_type],
    )
    .map_err(storage)?;
    Ok(())
}

fn insert_word(conn: &Connection, word: &str, word_type: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO words (word, word_type) VALUES (?1, ?2)",
        params![word, word_type],
    )
    .map_err(storage)?;
    Ok(())
}

fn random_offset(count: i64) -> i64 {
    rand::thread_rng().gen_range(0..count)
}

fn random_sentence(conn: &Connection) -> Result<Option<(String, Option<String>)>> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM sentences", [], |row| row.get(0))
        .map_err(storage)?;
    if count == 0 {
        return Ok(None);
    }

    conn.query_row(
        "SELECT sentence, word_type FROM sentences ORDER BY id LIMIT 1 OFFSET ?1",
        [random_offset(count)],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
    .map_err(storage)
}

fn random_word(conn: &Connection, word_type: &str) -> Result<Option<String>> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM words WHERE word_type = ?1",
            [word_type],
            |row| row.get(0),
        )
        .map_err(storage)?;
    if count == 0 {
        return Ok(None);
    }

    conn.query_row(
        "SELECT word FROM words WHERE word_type = ?1 ORDER BY id LIMIT 1 OFFSET ?2",
        params![word_type, random_offset(count)],
        |row| row.get(0),
    )
    .optional()
    .map_err(storage)
}

#[async_trait]
impl ComplimentSource for SqliteStore {
    async fn generate(&self, mentioned: &BTreeSet<String>) -> Result<String> {
        let compliment = self.create_compliment()?;
        tracing::debug!(recipients = mentioned.len(), "generated compliment");
        Ok(compliment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nobody() -> BTreeSet<String> {
        BTreeSet::new()
    }

    #[tokio::test]
    async fn empty_data_set_yields_sentinel() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.generate(&nobody()).await.unwrap(), "No compliments found.");
    }

    #[tokio::test]
    async fn plain_sentence_is_returned_as_is() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.add_sentence("You are a bright light.", None).unwrap();

        let mentioned: BTreeSet<String> = ["@jill".to_string()].into();
        assert_eq!(
            store.generate(&mentioned).await.unwrap(),
            "You are a bright light."
        );
    }

    #[tokio::test]
    async fn typed_sentence_gets_a_word_of_its_type() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.add_sentence("You are so {}!", Some("adjective")).unwrap();
        store.add_word("kind", "adjective").unwrap();
        store.add_word("clever", "adjective").unwrap();
        store.add_word("puppy", "noun").unwrap();

        for _ in 0..20 {
            let text = store.generate(&nobody()).await.unwrap();
            assert!(
                text == "You are so kind!" || text == "You are so clever!",
                "{text}"
            );
        }
    }

    #[tokio::test]
    async fn every_sentence_is_reachable() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.add_sentence("One.", None).unwrap();
        store.add_sentence("Two.", None).unwrap();

        let mut seen = BTreeSet::new();
        for _ in 0..200 {
            seen.insert(store.generate(&nobody()).await.unwrap());
        }
        assert_eq!(seen.len(), 2);
    }

    fn seed_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("hb-seed-{}-{name}.json", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn seed_fills_an_empty_data_set_once() {
        let store = SqliteStore::open_in_memory().unwrap();
        let path = seed_file(
            "once",
            r#"{"sentences": [{"sentence": "You are so {}!", "type": "adjective"}],
                "words": [{"word": "kind", "type": "adjective"}]}"#,
        );

        assert_eq!(store.seed_if_empty(&path).unwrap(), 2);
        assert_eq!(store.seed_if_empty(&path).unwrap(), 0);
        assert_eq!(store.generate(&nobody()).await.unwrap(), "You are so kind!");
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn seed_is_skipped_when_sentences_exist() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.add_sentence("Already here.", None).unwrap();

        let missing = std::env::temp_dir().join("hb-seed-does-not-exist.json");
        assert_eq!(store.seed_if_empty(&missing).unwrap(), 0);
    }

    #[test]
    fn unreadable_seed_is_an_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        let path = seed_file("bad", r#"{"sentences": [{"type": "noun"}]}"#);

        assert!(matches!(store.seed_if_empty(&path), Err(Error::Json(_))));
        std::fs::remove_file(&path).unwrap();

        let missing = std::env::temp_dir().join("hb-seed-does-not-exist.json");
        assert!(matches!(store.seed_if_empty(&missing), Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn typed_sentence_without_words_is_an_error() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.add_sentence("You are a {}.", Some("noun")).unwrap();
        store.add_word("gem", "adjective").unwrap();

        assert!(matches!(
            store.generate(&nobody()).await,
            Err(Error::Storage(_))
        ));
    }
}
