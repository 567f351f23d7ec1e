use chrono::Local;
use env_logger::{Builder, Env};
use std::io::Write;

/// Local-time prefixed log lines. `RUST_LOG` overrides the default `info`.
pub fn init() {
    let _ = Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .try_init();

    log::info!("Logger initialized.");
}
