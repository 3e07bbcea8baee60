pub mod convert;
pub mod serve;
pub mod setup;
pub mod show;
pub mod ui;
