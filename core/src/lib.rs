pub mod catalog;
pub mod evaluate;
pub mod normalize;
pub mod puzzle;
pub mod run;
pub mod shuffle;
pub mod snapshot;

pub use catalog::{catalog_entry, puzzle_by_slug, CatalogEntry, CATALOG, DEMO_PUZZLE_SLUG};
pub use evaluate::{evaluate, Evaluation};
pub use normalize::{normalize, NormalizeError, RawForm};
pub use puzzle::{
    Category, GroupId, Puzzle, Word, GRID_COUNT_MAX, GRID_COUNT_MIN, GROUP_SIZE_MAX,
    GROUP_SIZE_MIN,
};
pub use run::{RunPhase, RunState};
pub use shuffle::{shuffle, Lcg};
pub use snapshot::{
    decode_snapshot, local_run_key, pack_found_ids, remote_payload, unpack_found_ids, RunSnapshot,
};
