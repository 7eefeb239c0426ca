//! Text tokenization and preprocessing
//!
//! This module provides tools for:
//! - Text cleaning and normalization
//! - Tokenization (splitting text into words)
//! - Stop word removal by language
//! - N-gram generation

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use unicode_segmentation::UnicodeSegmentation;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"https?://\S+").unwrap());
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").unwrap());
static MARKUP_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static PUNCT_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").unwrap());
static NUMBER_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+\b").unwrap());
static WHITESPACE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Languages with a built-in stop word list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    French,
}

impl Language {
    /// Stop words for this language.
    pub fn stop_words(&self) -> HashSet<String> {
        let words: &[&str] = match self {
            Language::English => ENGLISH_STOP_WORDS,
            Language::French => FRENCH_STOP_WORDS,
        };
        words.iter().map(|s| s.to_string()).collect()
    }
}

/// Tokenizer configuration and functionality
#[derive(Debug, Clone)]
pub struct Tokenizer {
    /// Stop words to filter out
    stop_words: HashSet<String>,
    /// Minimum token length
    min_length: usize,
    /// Maximum token length
    max_length: usize,
    /// Remove standalone digit runs
    remove_numbers: bool,
    /// Custom patterns to strip before tokenization
    remove_patterns: Vec<Regex>,
}

impl Tokenizer {
    /// Create a tokenizer with English stop words.
    pub fn new() -> Self {
        Self::for_language(Language::English)
    }

    /// Create a tokenizer with the stop word list of the given language.
    pub fn for_language(language: Language) -> Self {
        Self {
            stop_words: language.stop_words(),
            min_length: 2,
            max_length: 50,
            remove_numbers: true,
            remove_patterns: vec![],
        }
    }

    /// Create a tokenizer that keeps every token.
    pub fn without_stop_words() -> Self {
        Self {
            stop_words: HashSet::new(),
            min_length: 2,
            max_length: 50,
            remove_numbers: true,
            remove_patterns: vec![],
        }
    }

    /// Add custom stop words
    pub fn add_stop_words(&mut self, words: &[&str]) {
        for word in words {
            self.stop_words.insert(word.to_lowercase());
        }
    }

    /// Set minimum token length
    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = len;
        self
    }

    /// Set maximum token length
    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = len;
        self
    }

    /// Enable/disable number removal
    pub fn remove_numbers(mut self, enable: bool) -> Self {
        self.remove_numbers = enable;
        self
    }

    /// Add a pattern to strip from text before tokenization
    pub fn add_remove_pattern(&mut self, pattern: &str) -> Result<(), regex::Error> {
        let regex = Regex::new(pattern)?;
        self.remove_patterns.push(regex);
        Ok(())
    }

    /// Clean and normalize text: strip URLs, mail addresses, markup,
    /// punctuation and (optionally) digit runs, then lowercase and
    /// collapse whitespace.
    pub fn clean(&self, text: &str) -> String {
        let mut cleaned = text.to_string();

        for pattern in &self.remove_patterns {
            cleaned = pattern.replace_all(&cleaned, " ").to_string();
        }

        cleaned = URL_PATTERN.replace_all(&cleaned, " ").to_string();
        cleaned = EMAIL_PATTERN.replace_all(&cleaned, " ").to_string();
        cleaned = MARKUP_PATTERN.replace_all(&cleaned, " ").to_string();
        cleaned = PUNCT_PATTERN.replace_all(&cleaned, " ").to_string();

        if self.remove_numbers {
            cleaned = NUMBER_PATTERN.replace_all(&cleaned, " ").to_string();
        }

        cleaned = cleaned.to_lowercase();
        cleaned = WHITESPACE_PATTERN.replace_all(&cleaned, " ").to_string();

        cleaned.trim().to_string()
    }

    /// Tokenize text into words
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let cleaned = self.clean(text);

        cleaned
            .unicode_words()
            .filter(|word| {
                let len = word.chars().count();
                len >= self.min_length
                    && len <= self.max_length
                    && !self.stop_words.contains(*word)
            })
            .map(|s| s.to_string())
            .collect()
    }

    /// Tokenize multiple documents
    pub fn tokenize_documents(&self, documents: &[String]) -> Vec<Vec<String>> {
        documents.iter().map(|doc| self.tokenize(doc)).collect()
    }

    /// Tokenize a document, appending n-grams up to the given order.
    ///
    /// Order 1 returns plain tokens; order 2 adds bigrams, and so on.
    pub fn tokenize_with_ngrams(&self, text: &str, order: usize) -> Vec<String> {
        let tokens = self.tokenize(text);
        let mut result = tokens.clone();
        for n in 2..=order {
            let generator = NGramGenerator::new(n);
            result.extend(generator.generate(&tokens));
        }
        result
    }

    /// Get unique vocabulary from tokenized documents
    pub fn build_vocabulary(&self, tokenized_docs: &[Vec<String>]) -> Vec<String> {
        let mut vocab_set: HashSet<String> = HashSet::new();

        for doc in tokenized_docs {
            for token in doc {
                vocab_set.insert(token.clone());
            }
        }

        let mut vocab: Vec<String> = vocab_set.into_iter().collect();
        vocab.sort();
        vocab
    }

    /// Get vocabulary with document frequencies, most frequent first.
    pub fn vocabulary_with_frequencies(
        &self,
        tokenized_docs: &[Vec<String>],
    ) -> Vec<(String, usize)> {
        let mut doc_freq: std::collections::HashMap<String, usize> =
            std::collections::HashMap::new();

        for doc in tokenized_docs {
            let unique_tokens: HashSet<&String> = doc.iter().collect();
            for token in unique_tokens {
                *doc_freq.entry(token.clone()).or_insert(0) += 1;
            }
        }

        let mut vocab: Vec<(String, usize)> = doc_freq.into_iter().collect();
        vocab.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        vocab
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// N-gram generator
#[derive(Debug, Clone)]
pub struct NGramGenerator {
    n: usize,
}

impl NGramGenerator {
    /// Create a new n-gram generator
    pub fn new(n: usize) -> Self {
        Self { n }
    }

    /// Generate n-grams from tokens
    pub fn generate(&self, tokens: &[String]) -> Vec<String> {
        if self.n == 0 || tokens.len() < self.n {
            return vec![];
        }

        tokens
            .windows(self.n)
            .map(|window| window.join("_"))
            .collect()
    }

    /// Generate n-grams for multiple documents
    pub fn generate_for_documents(&self, tokenized_docs: &[Vec<String>]) -> Vec<Vec<String>> {
        tokenized_docs
            .iter()
            .map(|doc| self.generate(doc))
            .collect()
    }
}

const ENGLISH_STOP_WORDS: &[&str] = &[
    // Articles
    "a", "an", "the",
    // Pronouns
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those",
    // Verbs
    "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "having",
    "do", "does", "did", "doing", "would", "should", "could", "ought", "might", "must",
    "shall", "will", "can", "may",
    // Prepositions
    "at", "by", "for", "from", "in", "into", "of", "on", "to", "with", "about", "against",
    "between", "during", "before", "after", "above", "below", "up", "down", "out", "off",
    "over", "under", "again", "further", "then", "once",
    // Conjunctions
    "and", "but", "or", "nor", "so", "yet", "both", "either", "neither", "not", "only",
    "than", "when", "where", "while", "if", "because", "as", "until", "although",
    // Other common words
    "here", "there", "all", "each", "few", "more", "most", "other", "some", "such", "no",
    "any", "own", "same", "too", "very", "just", "also", "now", "how", "why", "well",
];

const FRENCH_STOP_WORDS: &[&str] = &[
    // Articles, determiners
    "le", "la", "les", "un", "une", "des", "du", "de", "au", "aux", "ce", "cet", "cette",
    "ces", "mon", "ma", "mes", "ton", "ta", "tes", "son", "sa", "ses", "notre", "nos",
    "votre", "vos", "leur", "leurs",
    // Pronouns
    "je", "tu", "il", "elle", "on", "nous", "vous", "ils", "elles", "me", "te", "se",
    "moi", "toi", "lui", "eux", "en", "qui", "que", "quoi", "dont", "celui", "celle",
    "ceux", "celles", "cela", "ceci",
    // Common verbs
    "est", "sont", "suis", "es", "sommes", "êtes", "était", "étaient", "être", "été",
    "avoir", "ai", "as", "avons", "avez", "ont", "avait", "avaient", "fait", "faire",
    "peut", "peuvent", "doit", "doivent", "sera", "seront",
    // Prepositions, conjunctions
    "à", "dans", "par", "pour", "sur", "sous", "avec", "sans", "vers", "chez", "entre",
    "pendant", "avant", "après", "et", "ou", "où", "mais", "donc", "car", "ni", "si",
    "comme", "lorsque", "quand", "parce",
    // Other frequent words
    "pas", "plus", "moins", "très", "bien", "tout", "tous", "toute", "toutes", "autre",
    "autres", "même", "aussi", "encore", "déjà", "ici", "ainsi", "alors", "peu", "non",
    "oui",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenizer_basic() {
        let tokenizer = Tokenizer::new();
        let tokens = tokenizer.tokenize("Hello World! This is a test.");

        assert!(!tokens.contains(&"a".to_string())); // Stop word
        assert!(!tokens.contains(&"is".to_string())); // Stop word
        assert!(tokens.contains(&"hello".to_string()));
        assert!(tokens.contains(&"world".to_string()));
        assert!(tokens.contains(&"test".to_string()));
    }

    #[test]
    fn test_tokenizer_french() {
        let tokenizer = Tokenizer::for_language(Language::French);
        let tokens = tokenizer.tokenize("La fouille de textes est une discipline");

        assert!(!tokens.contains(&"la".to_string()));
        assert!(!tokens.contains(&"est".to_string()));
        assert!(tokens.contains(&"fouille".to_string()));
        assert!(tokens.contains(&"textes".to_string()));
        assert!(tokens.contains(&"discipline".to_string()));
    }

    #[test]
    fn test_clean_text() {
        let tokenizer = Tokenizer::new();
        let cleaned = tokenizer.clean("Visit https://example.com for more info!");

        assert!(!cleaned.contains("https://"));
        assert!(!cleaned.contains("!"));
    }

    #[test]
    fn test_number_removal() {
        let tokenizer = Tokenizer::new();
        let tokens = tokenizer.tokenize("published in 2009 by the lab");
        assert!(!tokens.contains(&"2009".to_string()));

        let keeping = Tokenizer::new().remove_numbers(false);
        let tokens = keeping.tokenize("published in 2009 by the lab");
        assert!(tokens.contains(&"2009".to_string()));
    }

    #[test]
    fn test_ngram_generator() {
        let generator = NGramGenerator::new(2);
        let tokens = vec![
            "topic".to_string(),
            "model".to_string(),
            "browser".to_string(),
        ];
        let ngrams = generator.generate(&tokens);

        assert_eq!(ngrams.len(), 2);
        assert!(ngrams.contains(&"topic_model".to_string()));
        assert!(ngrams.contains(&"model_browser".to_string()));
    }

    #[test]
    fn test_tokenize_with_ngrams() {
        let tokenizer = Tokenizer::without_stop_words();
        let tokens = tokenizer.tokenize_with_ngrams("latent topic structure", 2);

        assert!(tokens.contains(&"latent".to_string()));
        assert!(tokens.contains(&"latent_topic".to_string()));
        assert!(tokens.contains(&"topic_structure".to_string()));
    }

    #[test]
    fn test_vocabulary_building() {
        let tokenizer = Tokenizer::new();
        let docs = vec![
            "topic modeling infers latent structure".to_string(),
            "document clustering and topic browsing".to_string(),
        ];

        let tokenized = tokenizer.tokenize_documents(&docs);
        let vocab = tokenizer.build_vocabulary(&tokenized);

        assert!(vocab.contains(&"topic".to_string()));
        assert!(vocab.contains(&"latent".to_string()));
        assert!(vocab.contains(&"browsing".to_string()));
    }
}
