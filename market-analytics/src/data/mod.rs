pub mod loader;
pub mod types;

pub use loader::{load_json, LoaderError, LoaderResult, SnapshotLoader, EXPECTED_COLUMNS};
pub use types::{
    HistoricalMove, OptionContract, OptionType, OptionsChain, OptionsSnapshot, CONTRACT_MULTIPLIER,
};
