pub mod filter;
pub mod nearest;
pub mod selector;

pub use filter::filter_drivers;
pub use nearest::NearestSelector;
pub use selector::DriverSelector;
