use anyhow::Result;
use num_format::{CustomFormat, Grouping};

/// Digit grouping for log output: `1_234_567`
pub fn number_format() -> Result<CustomFormat> {
    Ok(CustomFormat::builder()
        .grouping(Grouping::Standard)
        .minus_sign("-")
        .separator("_")
        .build()?)
}

#[cfg(test)]
#[ctor::ctor]
fn init() {
    let _ = env_logger::builder()
        .format_timestamp_secs()
        .filter_level(log::LevelFilter::Debug)
        .parse_default_env()
        .is_test(true)
        .try_init();
}
