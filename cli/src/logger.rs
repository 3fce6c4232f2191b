use env_logger::{Builder, Env};

/// Print messages from the `log` crate to STDERR. `RUST_LOG` overrides the default `info` level.
pub fn setup() {
    Builder::from_env(Env::default().default_filter_or("info")).init();
}
