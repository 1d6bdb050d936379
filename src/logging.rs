use tracing_subscriber::{fmt, EnvFilter};

/// `RUST_LOG` が無ければ本クレートを info で出す
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("physio_tracker=info,workout=info,warn"));
    // 二重初期化（テストなど）は無視する
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
