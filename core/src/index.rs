use std::collections::{BTreeSet, HashMap};

/// One query hit: a document name and its summed occurrence count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub doc_name: String,
    pub rank: u32,
}

/// Accumulates (word, document) occurrences during the single-threaded build
/// phase. `build` consumes the builder, so no mutating handle survives into
/// the serving phase.
#[derive(Default)]
pub struct IndexBuilder {
    table: HashMap<String, HashMap<String, u32>>,
    docs: BTreeSet<String>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `word` in `doc_name`.
    pub fn record(&mut self, word: &str, doc_name: &str) {
        self.docs.insert(doc_name.to_string());
        *self
            .table
            .entry(word.to_string())
            .or_default()
            .entry(doc_name.to_string())
            .or_insert(0) += 1;
    }

    /// Number of distinct words recorded so far.
    pub fn num_words(&self) -> usize {
        self.table.len()
    }

    pub fn build(self) -> WordIndex {
        WordIndex {
            table: self.table,
            docs: self.docs,
        }
    }
}

/// The built inverted index: word -> (document -> occurrence count), plus the
/// set of all known documents. Every accessor takes `&self` and uses
/// existence-checking lookups only, so a `WordIndex` can be shared across
/// workers with no possibility of a query mutating it.
pub struct WordIndex {
    table: HashMap<String, HashMap<String, u32>>,
    docs: BTreeSet<String>,
}

impl WordIndex {
    pub fn num_words(&self) -> usize {
        self.table.len()
    }

    pub fn num_docs(&self) -> usize {
        self.docs.len()
    }

    /// All documents containing `word` with their occurrence counts, highest
    /// count first, ties broken by document name.
    pub fn lookup_word(&self, word: &str) -> Vec<QueryResult> {
        let mut results: Vec<QueryResult> = match self.table.get(word) {
            Some(postings) => postings
                .iter()
                .map(|(doc, &count)| QueryResult {
                    doc_name: doc.clone(),
                    rank: count,
                })
                .collect(),
            None => Vec::new(),
        };
        sort_results(&mut results);
        results
    }

    /// Conjunctive multi-term search: a document qualifies only if it
    /// contains every term at least once, and its rank is the sum of the
    /// per-term counts. An empty term list matches nothing. O(docs x terms).
    pub fn lookup_query(&self, terms: &[String]) -> Vec<QueryResult> {
        if terms.is_empty() {
            return Vec::new();
        }
        let mut results = Vec::new();
        for doc in &self.docs {
            let mut rank = 0u32;
            let mut all_found = true;
            for term in terms {
                match self.table.get(term).and_then(|postings| postings.get(doc)) {
                    Some(&count) => rank += count,
                    None => {
                        all_found = false;
                        break;
                    }
                }
            }
            if all_found && rank > 0 {
                results.push(QueryResult {
                    doc_name: doc.clone(),
                    rank,
                });
            }
        }
        sort_results(&mut results);
        results
    }
}

fn sort_results(results: &mut [QueryResult]) {
    results.sort_by(|a, b| b.rank.cmp(&a.rank).then_with(|| a.doc_name.cmp(&b.doc_name)));
}
