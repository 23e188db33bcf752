use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

fn pace_builder() -> Builder {
    let mut builder = Builder::new();
    builder.format(|buf, record| {
        writeln!(
            buf,
            "c {} {} - {}",
            record.level(),
            record.target(),
            record.args()
        )
    });
    builder
}

/// Installs a logger writing every line as a PACE comment, so log output can be mixed
/// with a decomposition on stdout.
pub fn build_pace_logger_for_level(level: LevelFilter) {
    let _ = pace_builder().filter(None, level).try_init();
}

pub fn build_pace_logger() {
    build_pace_logger_for_level(LevelFilter::Warn);
}
