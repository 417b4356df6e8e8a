//! Process-wide tracing setup.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

static INIT_GUARD: OnceLock<()> = OnceLock::new();

/// Install a stderr `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive` (e.g. `"seqgan=info"`). Safe to call more than once.
pub fn init_tracing(default_directive: &str) {
    INIT_GUARD.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));
        let result = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
        if let Err(err) = result {
            eprintln!("warning: tracing subscriber not installed: {err}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_tracing("seqgan=warn");
        init_tracing("seqgan=debug");
        tracing::info!("still alive");
    }
}
