pub mod clock;
pub mod notifier;
pub mod sample_source;
pub mod session_runner;
pub mod svg_canvas;
pub mod tracker_state;
