pub mod clock;
pub mod distance;
pub mod error;
pub mod geo_point;
pub mod projection;
pub mod render;
pub mod sample;
pub mod session;
pub mod speed_window;
pub mod workout;
