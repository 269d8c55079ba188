// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Ensign Contributors

//! The on-disk symbol index.
//!
//! Stored fields carry the symbol verbatim; the two analyzed fields hold
//! token text produced by [`crate::tokenize::tokenize`] and are searched by
//! prefix or fuzzy term queries. Ranking divides the base score by the full
//! name's length, so `java.util.List` outranks deeper packages for the same
//! match.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use en_core::symbol::{local_name_of, DeclaredAs, OffsetSourcePosition, SymbolSearchResult};
use tantivy::collector::TopDocs;
use tantivy::directory::MmapDirectory;
use tantivy::query::{BooleanQuery, FuzzyTermQuery, Occur, Query, TermQuery};
use tantivy::schema::{
    Field, IndexRecordOption, Schema, TextFieldIndexing, TextOptions, Value, FAST, STORED, STRING,
};
use tantivy::tokenizer::{LowerCaser, TextAnalyzer, WhitespaceTokenizer};
use tantivy::{
    DocId, Index, IndexReader, IndexWriter, ReloadPolicy, Score, SegmentReader, TantivyDocument,
    Term,
};

use crate::reindex::IndexMetadata;
use crate::tokenize::tokenize;
use crate::IndexError;

const TAGS_TOKENIZER: &str = "symbol_tags";
const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Cap on how many dictionary terms one prefix keyword may expand to.
const MAX_PREFIX_EXPANSIONS: usize = 512;

/// Minimum similarity a fuzzy match must reach, Lucene-style: the allowed
/// edit distance grows with term length and is capped at 2.
const FUZZY_MIN_SIMILARITY: f32 = 0.6;

struct Fields {
    name: Field,
    local_name: Field,
    doc_type: Field,
    decl_as: Field,
    file: Field,
    offset: Field,
    owner: Field,
    tags: Field,
    local_name_tags: Field,
    name_len: Field,
}

/// Writer, reader, and metadata for the index directory. Owned exclusively
/// by the indexer actor; never shared.
pub struct SearchIndex {
    path: PathBuf,
    index: Index,
    writer: IndexWriter,
    reader: IndexReader,
    fields: Fields,
    metadata: IndexMetadata,
}

impl SearchIndex {
    /// Open or create the index in `dir`.
    pub fn open(dir: &Path) -> Result<Self, IndexError> {
        std::fs::create_dir_all(dir)?;

        let mut builder = Schema::builder();
        let name = builder.add_text_field("name", STRING | STORED);
        let local_name = builder.add_text_field("local_name", STRING | STORED);
        let doc_type = builder.add_text_field("doc_type", STRING | STORED);
        let decl_as = builder.add_text_field("decl_as", STRING | STORED);
        let file = builder.add_text_field("file", STRING | STORED);
        let offset = builder.add_u64_field("offset", STORED);
        let owner = builder.add_text_field("owner", STRING | STORED);

        let tag_options = TextOptions::default().set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(TAGS_TOKENIZER)
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        );
        let tags = builder.add_text_field("tags", tag_options.clone());
        let local_name_tags = builder.add_text_field("local_name_tags", tag_options);
        let name_len = builder.add_u64_field("name_len", FAST);
        let schema = builder.build();

        let directory = MmapDirectory::open(dir)?;
        let index = Index::open_or_create(directory, schema)?;
        index.tokenizers().register(
            TAGS_TOKENIZER,
            TextAnalyzer::builder(WhitespaceTokenizer::default())
                .filter(LowerCaser)
                .build(),
        );

        let writer = index.writer(WRITER_HEAP_BYTES)?;
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        let metadata = match index.load_metas()?.payload {
            Some(payload) => serde_json::from_str(&payload)?,
            None => IndexMetadata::default(),
        };

        Ok(Self {
            path: dir.to_path_buf(),
            index,
            writer,
            reader,
            fields: Fields {
                name,
                local_name,
                doc_type,
                decl_as,
                file,
                offset,
                owner,
                tags,
                local_name_tags,
                name_len,
            },
            metadata,
        })
    }

    /// Delete the index directory. The caller must have dropped any open
    /// [`SearchIndex`] on it first, or the writer lock will survive.
    pub fn wipe(dir: &Path) -> Result<(), IndexError> {
        if dir.exists() {
            std::fs::remove_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    /// Replace the metadata tagged onto every subsequent commit.
    pub fn set_metadata(&mut self, metadata: IndexMetadata) {
        self.metadata = metadata;
    }

    /// Upsert one symbol by its unique `name` term.
    pub fn insert(&mut self, result: &SymbolSearchResult) -> Result<(), IndexError> {
        self.remove(result.name());

        let mut doc = TantivyDocument::new();
        doc.add_text(self.fields.name, result.name());
        doc.add_text(self.fields.local_name, result.local_name());
        doc.add_u64(self.fields.name_len, result.name().len() as u64);
        doc.add_text(self.fields.decl_as, result.decl_as().wire_name());
        doc.add_text(self.fields.tags, tokenize(result.name()));
        doc.add_text(self.fields.local_name_tags, tokenize(result.local_name()));
        match result {
            SymbolSearchResult::Type { .. } => doc.add_text(self.fields.doc_type, "type"),
            SymbolSearchResult::Method { owner, .. } => {
                doc.add_text(self.fields.doc_type, "method");
                doc.add_text(self.fields.owner, owner);
            }
        }
        if let Some(pos) = result.pos() {
            doc.add_text(self.fields.file, pos.file.to_string_lossy());
            doc.add_u64(self.fields.offset, pos.offset as u64);
        }
        self.writer.add_document(doc)?;
        Ok(())
    }

    /// Delete by exact fully qualified name.
    pub fn remove(&mut self, name: &str) {
        self.writer
            .delete_term(Term::from_field_text(self.fields.name, name));
    }

    /// Flush outstanding writes, tagging the commit with the current
    /// metadata, then refresh the reader.
    pub fn commit(&mut self) -> Result<(), IndexError> {
        let payload = serde_json::to_string(&self.metadata)?;
        let mut prepared = self.writer.prepare_commit()?;
        prepared.set_payload(&payload);
        prepared.commit()?;
        self.reader.reload()?;
        Ok(())
    }

    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    /// Keyword query over the analyzed fields.
    ///
    /// Keywords are lowercased and empty ones dropped. With `types_only`
    /// the query runs against `local_name_tags` and requires
    /// `doc_type = "type"`; otherwise it runs against `tags`. Each keyword
    /// becomes a fuzzy-or-prefix query when `fuzzy` is set (combined as
    /// SHOULD) or a scoring prefix expansion otherwise (combined as MUST).
    pub fn keyword_search(
        &self,
        keywords: &[String],
        limit: usize,
        types_only: bool,
        fuzzy: bool,
    ) -> Result<Vec<SymbolSearchResult>, IndexError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let searcher = self.reader.searcher();

        let field = if types_only { self.fields.local_name_tags } else { self.fields.tags };
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        if types_only {
            clauses.push((
                Occur::Must,
                Box::new(TermQuery::new(
                    Term::from_field_text(self.fields.doc_type, "type"),
                    IndexRecordOption::Basic,
                )),
            ));
        }

        let occur = if fuzzy { Occur::Should } else { Occur::Must };
        let mut keyword_count = 0;
        for keyword in keywords {
            let keyword = keyword.to_lowercase();
            if keyword.is_empty() {
                continue;
            }
            keyword_count += 1;
            let prefix: Box<dyn Query> = Box::new(self.prefix_query(&searcher, field, &keyword)?);
            let sub: Box<dyn Query> = if fuzzy {
                // Fuzzy keywords still match by prefix: "list" should reach
                // "listicle", which no bounded edit distance covers.
                let term = Term::from_field_text(field, &keyword);
                let near: Box<dyn Query> =
                    Box::new(FuzzyTermQuery::new(term, fuzzy_distance(&keyword), true));
                Box::new(BooleanQuery::new(vec![
                    (Occur::Should, near),
                    (Occur::Should, prefix),
                ]))
            } else {
                prefix
            };
            clauses.push((occur, sub));
        }
        if keyword_count == 0 {
            return Ok(Vec::new());
        }

        let query = BooleanQuery::new(clauses);
        let collector = TopDocs::with_limit(limit).tweak_score(
            move |segment_reader: &SegmentReader| {
                let name_len = segment_reader.fast_fields().u64("name_len").ok();
                move |doc: DocId, score: Score| {
                    let len = name_len
                        .as_ref()
                        .and_then(|col| col.first(doc))
                        .unwrap_or(1)
                        .max(1);
                    score * (1.0 / len as f32)
                }
            },
        );

        let hits = searcher.search(&query, &collector)?;
        let mut results = Vec::with_capacity(hits.len());
        for (_score, address) in hits {
            let doc: TantivyDocument = searcher.doc(address)?;
            if let Some(result) = self.doc_to_result(&doc) {
                results.push(result);
            }
        }
        Ok(results)
    }

    /// Expand a prefix against the term dictionaries into an OR of scored
    /// term queries. Never a constant-score rewrite: relevance (and with it
    /// the 1/length norm) must survive.
    fn prefix_query(
        &self,
        searcher: &tantivy::Searcher,
        field: Field,
        prefix: &str,
    ) -> Result<BooleanQuery, IndexError> {
        let mut terms: BTreeSet<String> = BTreeSet::new();
        'segments: for segment in searcher.segment_readers() {
            let inverted = segment.inverted_index(field)?;
            let dict = inverted.terms();
            let mut stream = dict.range().ge(prefix.as_bytes()).into_stream()?;
            while stream.advance() {
                if !stream.key().starts_with(prefix.as_bytes()) {
                    break;
                }
                if let Ok(text) = std::str::from_utf8(stream.key()) {
                    terms.insert(text.to_string());
                }
                if terms.len() >= MAX_PREFIX_EXPANSIONS {
                    break 'segments;
                }
            }
        }
        let clauses: Vec<(Occur, Box<dyn Query>)> = terms
            .into_iter()
            .map(|text| {
                let query: Box<dyn Query> = Box::new(TermQuery::new(
                    Term::from_field_text(field, &text),
                    IndexRecordOption::Basic,
                ));
                (Occur::Should, query)
            })
            .collect();
        Ok(BooleanQuery::new(clauses))
    }

    fn doc_to_result(&self, doc: &TantivyDocument) -> Option<SymbolSearchResult> {
        let text = |field: Field| {
            doc.get_first(field)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        let name = text(self.fields.name)?;
        let local_name = text(self.fields.local_name)?;
        let pos = text(self.fields.file).map(|file| OffsetSourcePosition {
            file: PathBuf::from(file),
            offset: doc
                .get_first(self.fields.offset)
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32,
        });

        match text(self.fields.doc_type)?.as_str() {
            "method" => Some(SymbolSearchResult::Method {
                local_name,
                owner: text(self.fields.owner)?,
                name,
                pos,
            }),
            "type" => Some(SymbolSearchResult::Type {
                decl_as: match text(self.fields.decl_as)?.as_str() {
                    "trait" => DeclaredAs::Trait,
                    "object" => DeclaredAs::Object,
                    _ => DeclaredAs::Class,
                },
                local_name,
                name,
                pos,
            }),
            other => {
                tracing::warn!(doc_type = other, "dropping document with unknown doc_type");
                None
            }
        }
    }
}

/// Edit distance allowed for a fuzzy keyword of this length.
fn fuzzy_distance(keyword: &str) -> u8 {
    let len = keyword.chars().count() as f32;
    (((1.0 - FUZZY_MIN_SIMILARITY) * len) as u8).min(2)
}

/// Positionless type result, mostly for seeding tests.
pub fn type_result(name: &str, decl_as: DeclaredAs) -> SymbolSearchResult {
    SymbolSearchResult::Type {
        name: name.to_string(),
        local_name: local_name_of(name).to_string(),
        decl_as,
        pos: None,
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
