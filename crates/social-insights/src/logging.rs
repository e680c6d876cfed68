//! Tracing setup shared by the binaries

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter when `RUST_LOG` is unset: info for the library and the binary
pub fn default_filter(bin_target: &str) -> String {
    format!("social_insights=info,{bin_target}=info")
}

/// Install the global subscriber. Output goes to stderr so it never mixes
/// with program output on stdout.
pub fn init(bin_target: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(bin_target))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
