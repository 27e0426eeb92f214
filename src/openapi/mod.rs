pub mod descriptor;
pub mod expand;
pub mod translate;

pub use descriptor::ServiceDescriptor;
pub use expand::{expand_schema, Expansion};
pub use translate::{translate_descriptor, SchemaCycle, SkippedOperation, TranslatedOperation, Translation};
