use eyre::{bail, Result, WrapErr};
use std::fs;
use std::path::Path;

/// A single `(word, count)` entry of a [Document]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordCount {
    pub id: usize,
    pub count: u32,
}

/// A document represented as a bag of words
///
/// The entries keep the order in which they were read, and are never modified once loaded.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    words: Vec<WordCount>,
}

impl Document {
    pub fn new(words: Vec<WordCount>) -> Self {
        Document { words }
    }

    /// Parse a compact word count row, e.g. `"3:5 17:2 42:1"`
    ///
    /// Tokens are separated by whitespace or `:`, and alternate between word id and count.
    pub fn parse(row: &str) -> Result<Self> {
        let tokens: Vec<&str> = row
            .split(|c: char| c.is_whitespace() || c == ':')
            .filter(|token| !token.is_empty())
            .collect();

        if tokens.len() % 2 != 0 {
            bail!(
                "Expected alternating word ids and counts, found {} tokens",
                tokens.len()
            );
        }

        let words = tokens
            .chunks(2)
            .map(|pair| {
                let id = pair[0]
                    .parse::<usize>()
                    .wrap_err_with(|| format!("Invalid word id '{}'", pair[0]))?;
                let count = pair[1]
                    .parse::<u32>()
                    .wrap_err_with(|| format!("Invalid count '{}' for word {}", pair[1], id))?;
                Ok(WordCount { id, count })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Document { words })
    }

    pub fn words(&self) -> &[WordCount] {
        &self.words
    }

    /// Number of distinct words in the document
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Sum of all word counts
    pub fn word_count(&self) -> u64 {
        self.words.iter().map(|w| w.count as u64).sum()
    }

    /// Largest word id referenced by the document, if any
    pub fn max_word_id(&self) -> Option<usize> {
        self.words.iter().map(|w| w.id).max()
    }
}

/// A collection of [Document]s over a vocabulary of fixed size
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
    documents: Vec<Document>,
    vocabulary_size: usize,
}

impl Corpus {
    /// Create a new corpus, checking that every word id is within the vocabulary
    pub fn new(documents: Vec<Document>, vocabulary_size: usize) -> Result<Self> {
        if vocabulary_size == 0 {
            bail!("The vocabulary size must be positive");
        }
        for (d, document) in documents.iter().enumerate() {
            if let Some(id) = document.max_word_id() {
                if id >= vocabulary_size {
                    bail!(
                        "Document {} references word {} outside the vocabulary of size {}",
                        d,
                        id,
                        vocabulary_size
                    );
                }
            }
        }
        Ok(Corpus {
            documents,
            vocabulary_size,
        })
    }

    /// Parse the documents of a corpus, one document per line
    ///
    /// Empty lines are skipped. The vocabulary size is not validated here, see [Corpus::new].
    pub fn parse_documents(content: &str) -> Result<Vec<Document>> {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                Document::parse(line).wrap_err_with(|| format!("Malformed document on line {}", index + 1))
            })
            .collect()
    }

    /// Read the documents in `path`, see [Corpus::parse_documents]
    pub fn read_documents(path: impl AsRef<Path>) -> Result<Vec<Document>> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .wrap_err_with(|| format!("Unable to read documents from {:?}", path))?;
        Self::parse_documents(&content).wrap_err_with(|| format!("In file {:?}", path))
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Number of documents, `N`
    pub fn ndocs(&self) -> usize {
        self.documents.len()
    }

    /// Vocabulary size, `W`
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary_size
    }

    /// Sum of all word counts in the corpus
    pub fn total_word_count(&self) -> u64 {
        self.documents.iter().map(|d| d.word_count()).sum()
    }

    pub fn average_unique_words(&self) -> f64 {
        if self.documents.is_empty() {
            return 0.0;
        }
        let sum: usize = self.documents.iter().map(|d| d.len()).sum();
        sum as f64 / self.documents.len() as f64
    }
}

/// Reads a vocabulary file, one word per line
///
/// The (zero-based) index of the non-empty line is the word id.
pub fn read_vocabulary(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Unable to read vocabulary from {:?}", path))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compact_row() {
        let document = Document::parse("3:5 17:2 42:1").unwrap();
        assert_eq!(
            document.words(),
            &[
                WordCount { id: 3, count: 5 },
                WordCount { id: 17, count: 2 },
                WordCount { id: 42, count: 1 }
            ]
        );
        assert_eq!(document.word_count(), 8);
        assert_eq!(document.max_word_id(), Some(42));
    }

    #[test]
    fn test_parse_mixed_separators() {
        let document = Document::parse("  1 4\t2:3  ").unwrap();
        assert_eq!(document.len(), 2);
        assert_eq!(document.words()[1], WordCount { id: 2, count: 3 });
    }

    #[test]
    fn test_parse_odd_token_count() {
        assert!(Document::parse("1:2 3").is_err());
    }

    #[test]
    fn test_parse_invalid_number() {
        let error = Document::parse("1:two").unwrap_err();
        assert!(format!("{:#}", error).contains("two"));
    }

    #[test]
    fn test_empty_lines_are_skipped() {
        let documents = Corpus::parse_documents("0:1\n\n   \n1:2 2:1\n").unwrap();
        assert_eq!(documents.len(), 2);
    }

    #[test]
    fn test_error_reports_line() {
        let error = Corpus::parse_documents("0:1\n1:x\n").unwrap_err();
        assert!(format!("{:#}", error).contains("line 2"));
    }

    #[test]
    fn test_corpus_rejects_out_of_vocabulary() {
        let documents = Corpus::parse_documents("0:1 4:2").unwrap();
        assert!(Corpus::new(documents.clone(), 4).is_err());
        assert!(Corpus::new(documents, 5).is_ok());
    }

    #[test]
    fn test_corpus_statistics() {
        let documents = Corpus::parse_documents("0:3 1:2\n1:1 2:4\n2:2 3:1").unwrap();
        let corpus = Corpus::new(documents, 4).unwrap();
        assert_eq!(corpus.ndocs(), 3);
        assert_eq!(corpus.total_word_count(), 13);
        assert_eq!(corpus.average_unique_words(), 2.0);
    }
}
