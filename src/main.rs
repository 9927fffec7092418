//! Sierpinski tetrahedron viewer.
//!
//! Run with: `cargo run --release -- [point_count]`
//!
//! Set `RUST_LOG=info` for adapter and FPS output.

use sierp::{Viewer, DEFAULT_POINT_COUNT};

fn main() {
    env_logger::init();

    let count: usize = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_POINT_COUNT);

    if let Err(e) = Viewer::new().with_point_count(count).run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
