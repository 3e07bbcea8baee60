//! Holding and refreshing the current exchange snapshot.

pub mod updater;

pub use updater::{RateUpdater, RefreshStatus, UpdaterConfig};
