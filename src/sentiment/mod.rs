pub mod classifier;
pub mod ensemble;
pub mod lexical;
pub mod lexicon;
pub mod polarity;
