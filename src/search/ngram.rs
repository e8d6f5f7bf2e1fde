//! Bag-of-words approximate matching over character n-grams.
//!
//! Each candidate becomes one document with three n-gram fields (name,
//! command, and the two joined by a space). A query is split into the same
//! n-grams and scored with BM25, so grams shared by few candidates weigh more
//! and long texts are normalized down.

use std::collections::BTreeSet;

use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, Occur, Query, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, Value, STORED,
};
use tantivy::tokenizer::{LowerCaser, NgramTokenizer, TextAnalyzer, Token, TokenStream};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::{debug, warn};

use crate::error::Result;

const NGRAM_TOKENIZER: &str = "candidate_ngram";
const WRITER_MEMORY_BYTES: usize = 20_000_000;

/// Which text of a candidate a lookup runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchField {
    Name,
    Command,
    Combined,
}

pub struct NgramIndex {
    reader: IndexReader,
    analyzer: TextAnalyzer,
    ordinal: Field,
    name: Field,
    command: Field,
    combined: Field,
}

impl NgramIndex {
    /// Index `(name, command)` pairs; document `i` is entry `i`.
    pub fn build<'a>(
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
        min_gram: usize,
        max_gram: usize,
    ) -> Result<Self> {
        let indexing = TextFieldIndexing::default()
            .set_tokenizer(NGRAM_TOKENIZER)
            .set_index_option(IndexRecordOption::WithFreqs);
        let text = TextOptions::default().set_indexing_options(indexing);

        let mut schema_builder = Schema::builder();
        let ordinal = schema_builder.add_u64_field("ordinal", STORED);
        let name = schema_builder.add_text_field("name", text.clone());
        let command = schema_builder.add_text_field("command", text.clone());
        let combined = schema_builder.add_text_field("combined", text);
        let schema = schema_builder.build();

        let analyzer = TextAnalyzer::builder(NgramTokenizer::new(min_gram, max_gram, false)?)
            .filter(LowerCaser)
            .build();

        let index = Index::create_in_ram(schema);
        index.tokenizers().register(NGRAM_TOKENIZER, analyzer.clone());

        let mut writer: IndexWriter = index.writer_with_num_threads(1, WRITER_MEMORY_BYTES)?;
        let mut count = 0u64;
        for (entry_name, entry_command) in entries {
            writer.add_document(doc!(
                ordinal => count,
                name => entry_name.to_string(),
                command => entry_command.to_string(),
                combined => format!("{entry_name} {entry_command}")
            ))?;
            count += 1;
        }
        writer.commit()?;
        writer.wait_merging_threads()?;

        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        debug!(documents = count, "built n-gram index");

        Ok(Self {
            reader,
            analyzer,
            ordinal,
            name,
            command,
            combined,
        })
    }

    /// Up to `limit` entry ordinals closest to `query`, best first. Entries
    /// sharing no n-gram with the query are never returned.
    pub fn closest(&self, field: MatchField, query: &str, limit: usize) -> Vec<usize> {
        if limit == 0 {
            return Vec::new();
        }
        let grams = self.grams(query);
        if grams.is_empty() {
            return Vec::new();
        }

        let field = match field {
            MatchField::Name => self.name,
            MatchField::Command => self.command,
            MatchField::Combined => self.combined,
        };
        let clauses: Vec<(Occur, Box<dyn Query>)> = grams
            .iter()
            .map(|gram| {
                let term = Term::from_field_text(field, gram);
                let query: Box<dyn Query> = Box::new(TermQuery::new(term, IndexRecordOption::WithFreqs));
                (Occur::Should, query)
            })
            .collect();
        let query = BooleanQuery::new(clauses);

        match self.top_ordinals(&query, limit) {
            Ok(ordinals) => ordinals,
            Err(err) => {
                warn!(error = %err, "n-gram lookup failed");
                Vec::new()
            }
        }
    }

    fn top_ordinals(&self, query: &BooleanQuery, limit: usize) -> Result<Vec<usize>> {
        let searcher = self.reader.searcher();
        let top_docs = searcher.search(query, &TopDocs::with_limit(limit))?;

        let mut ordinals = Vec::with_capacity(top_docs.len());
        for (_score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            if let Some(ordinal) = doc.get_first(self.ordinal).and_then(|v| v.as_u64()) {
                ordinals.push(ordinal as usize);
            }
        }
        Ok(ordinals)
    }

    /// Distinct query n-grams taken within words; grams spanning a space are
    /// dropped so they cannot match the join between name and command.
    fn grams(&self, query: &str) -> BTreeSet<String> {
        let mut analyzer = self.analyzer.clone();
        let mut grams = BTreeSet::new();
        let mut stream = analyzer.token_stream(query);
        stream.process(&mut |token: &Token| {
            if !token.text.contains(char::is_whitespace) {
                grams.insert(token.text.clone());
            }
        });
        grams
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(entries: &[(&'static str, &'static str)]) -> NgramIndex {
        NgramIndex::build(entries.iter().copied(), 2, 4).unwrap()
    }

    #[test]
    fn closest_prefers_entries_sharing_rare_grams() {
        let idx = index(&[
            ("hello", "echo hello"),
            ("start-docker:traefik:build", "docker compose up --build"),
            ("hello-docker", "docker run hello-world"),
        ]);
        let hits = idx.closest(MatchField::Combined, "docker build", 3);
        assert_eq!(hits.first(), Some(&1));
    }

    #[test]
    fn unrelated_entries_are_not_returned() {
        let idx = index(&[("lint", "eslint"), ("zzz", "qqq")]);
        let hits = idx.closest(MatchField::Name, "lint fix", 3);
        assert_eq!(hits, vec![0]);
    }

    #[test]
    fn limit_caps_results() {
        let idx = index(&[("build", "a"), ("build:cli", "b"), ("rebuild", "c")]);
        assert_eq!(idx.closest(MatchField::Name, "build it", 2).len(), 2);
        assert!(idx.closest(MatchField::Name, "build it", 0).is_empty());
    }

    #[test]
    fn query_grams_stay_within_words() {
        let idx = index(&[("build", "make")]);
        let grams = idx.grams("Docker  build");
        assert!(grams.contains("dock"));
        assert!(grams.contains("bu"));
        assert!(grams.iter().all(|g| !g.contains(' ')), "{grams:?}");
        assert!(!grams.contains("r b"));
        assert!(idx.grams("a b").is_empty());
    }

    #[test]
    fn lookups_are_repeatable() {
        let idx = index(&[("test", "jest"), ("test:watch", "jest --watch"), ("e2e", "playwright test")]);
        let first = idx.closest(MatchField::Combined, "test watch", 3);
        let second = idx.closest(MatchField::Combined, "test watch", 3);
        assert_eq!(first, second);
    }
}
