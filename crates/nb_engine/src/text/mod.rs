pub mod stopwords;
pub mod tokenizer;

pub use tokenizer::Tokenizer;
