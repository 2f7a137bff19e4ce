//! Parsing of benchmark profile logs into a keyed measurement store and the
//! epoch aligned history kept on disk between invocations.

pub mod collector;
pub mod corpus;
pub mod identifier;
pub mod parser;
pub mod store;

pub use collector::{
    CollectError, Collection, CorpusBuilder, FailurePolicy, FileFailure, ProfileCollector,
};
pub use corpus::{Corpus, CorpusError, History, RunMapping, MISSING};
pub use identifier::{Identifier, IdentifierError, SEPARATOR};
pub use parser::{ParseError, RunParameters};
pub use store::{Store, StoreError};
