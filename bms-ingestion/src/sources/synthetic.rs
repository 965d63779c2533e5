use std::ops::Range;

use bms_client::domain::{CanonicalColumn, Cell, Column, Dataset, TimeSeriesRecord};
use rand::{rngs::StdRng, Rng, SeedableRng};
use time::{Duration, OffsetDateTime, PrimitiveDateTime};

pub const DEMO_ROWS: usize = 30;
pub const ELECTRICITY_KWH_RANGE: Range<f64> = 200.0..500.0;
pub const WATER_LITERS_RANGE: Range<f64> = 50.0..150.0;
pub const EFFICIENCY_SCORE_RANGE: Range<f64> = 80.0..99.0;
pub const EFFICIENCY_SCORE_LABEL: &str = "Efficiency_Score";

/// Demo data generator used whenever no valid upload exists.
///
/// With a seed, every call draws the same values; the dates still end at the
/// moment of generation.
#[derive(Debug, Clone, Default)]
pub struct SyntheticSource {
    seed: Option<u64>,
}

impl SyntheticSource {
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    pub fn generate(&self) -> Dataset {
        let end = now_naive();
        match self.seed {
            Some(seed) => generate_with(&mut StdRng::seed_from_u64(seed), end),
            None => generate_with(&mut rand::thread_rng(), end),
        }
    }
}

/// 30 daily rows ending now, with uniformly random readings.
pub fn generate() -> Dataset {
    SyntheticSource::default().generate()
}

/// 30 rows one calendar day apart, the last one at `end`.
pub fn generate_with<R: Rng>(rng: &mut R, end: PrimitiveDateTime) -> Dataset {
    let records = (0..DEMO_ROWS)
        .map(|i| {
            let days_before_end = (DEMO_ROWS - 1 - i) as i64;
            TimeSeriesRecord::new(
                Some(end - Duration::days(days_before_end)),
                Some(rng.gen_range(ELECTRICITY_KWH_RANGE)),
                Some(rng.gen_range(WATER_LITERS_RANGE)),
            )
            .with_passthrough(vec![Cell::Number(rng.gen_range(EFFICIENCY_SCORE_RANGE))])
        })
        .collect();

    let columns = vec![
        Column::Canonical(CanonicalColumn::Date),
        Column::Canonical(CanonicalColumn::ElectricityKwh),
        Column::Canonical(CanonicalColumn::WaterLiters),
        Column::Passthrough(EFFICIENCY_SCORE_LABEL.to_string()),
    ];

    // Layout and widths are fixed above, so construction cannot fail.
    match Dataset::new(columns, records) {
        Ok(ds) => ds,
        Err(e) => unreachable!("synthetic layout is always valid: {e}"),
    }
}

/// Current wall-clock time without an offset, truncated to microseconds so
/// that an exported timestamp reads back identically.
fn now_naive() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    let now = now.replace_microsecond(now.microsecond()).unwrap_or(now);
    PrimitiveDateTime::new(now.date(), now.time())
}
