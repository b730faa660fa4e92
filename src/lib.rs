pub mod browser_store;
pub mod clock;
pub mod diag;
pub mod loader;
pub mod run_store;
pub mod session;
pub mod store;

pub use loader::{browse_puzzles, load_puzzle, PuzzleCard, PuzzleLoadError};
pub use run_store::RunStore;
pub use session::{GameSession, SAVE_DEBOUNCE_MS};
pub use store::{
    DocumentStore, FixedIdentity, IdentityProvider, LocalStore, MemoryDocumentStore,
    MemoryLocalStore, PuzzleQuery, QueryOrder, StoreError, UserId,
};
