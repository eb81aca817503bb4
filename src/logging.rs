//! Global `env_logger` setup.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Crates whose `info` output drowns out the demo's own messages.
const GPU_CRATES: [&str; 3] = ["wgpu_core", "wgpu_hal", "naga"];

/// Installs the global logger at `info`, with the GPU stack held at `warn`.
/// `RUST_LOG` directives override both.
///
/// Returns `false` when a logger was already installed.
pub fn init_logging() -> bool {
    let mut builder = Builder::new();
    builder.filter_level(LevelFilter::Info);
    for name in GPU_CRATES {
        builder.filter_module(name, LevelFilter::Warn);
    }
    builder.parse_env(Env::default());
    builder.try_init().is_ok()
}
