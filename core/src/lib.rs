pub mod corpus;
pub mod index;
pub mod tokenizer;

pub use index::{IndexBuilder, QueryResult, WordIndex};
