pub mod hnb;

pub use hnb::HnbProvider;
