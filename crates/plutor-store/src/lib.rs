//! Plutor Store
//!
//! Transactional persistence for users, profiles, DID metadata and email
//! verifications. Records are stored as JSON in a key-value backend
//! (in-memory or RocksDB) with unique indexes on wallet address, email, DID
//! and verification token. Write transactions are serialized and commit as a
//! single atomic batch; dropping a transaction rolls it back.

pub mod backend;
pub mod error;
pub mod memory;
pub mod records;
pub mod rocks;
pub mod store;
pub mod transaction;

pub use backend::{BatchOp, KvBackend};
pub use error::{StoreError, UniqueField};
pub use memory::MemoryBackend;
pub use records::Records;
pub use rocks::RocksBackend;
pub use store::IdentityStore;
pub use transaction::Transaction;
