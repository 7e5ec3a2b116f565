pub mod sample;
pub mod route;

pub use sample::{RouteRecord, Sample};
pub use route::Route;
