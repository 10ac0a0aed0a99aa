pub mod decompose;
pub mod metadata;
pub mod vocabulary;

mod error;

pub use decompose::{Decomposition, QueryDecomposer, QueryKind};
pub use error::{Error, Result};
pub use metadata::{MetadataExtractor, QueryMetadata};
pub use vocabulary::Vocabulary;
