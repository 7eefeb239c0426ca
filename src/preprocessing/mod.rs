//! Text preprocessing module
//!
//! Provides tokenization, text cleaning, and vectorization utilities
//! for turning raw documents into document-term matrices.

pub mod tokenizer;
pub mod vectorizer;

pub use tokenizer::{Language, NGramGenerator, Tokenizer};
pub use vectorizer::{CountVectorizer, IdfWeighting, TermWeighting, TfIdfVectorizer};
