// ── Normalized entity store ──

mod collection;
mod data_store;
mod ingest;
pub mod selectors;
mod table;

pub use collection::EntityCollection;
pub use data_store::DataStore;
pub use ingest::{decode_echo, decode_record, extract_list, ingest_list, normalize_record};
pub use selectors::Memoized;
pub use table::{EntityAdapter, EntityTable};
