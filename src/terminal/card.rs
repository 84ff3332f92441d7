//! Synthetic card data for delivered payment outcomes.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

const SECONDS_PER_DAY: u64 = 86_400;

/// 6-digit authorization number.
pub(crate) fn authorization_number(rng: &mut impl Rng) -> String {
    rng.gen_range(100_000..=999_999u32).to_string()
}

/// Masked primary account number: 6 leading digits, 6 masked, 4 trailing.
pub(crate) fn masked_card_number(rng: &mut impl Rng) -> String {
    let head = rng.gen_range(100_000..=999_999u32);
    let tail = rng.gen_range(1_000..=9_999u32);
    format!("{head}######{tail}")
}

/// EMV application identifier with a random suffix.
pub(crate) fn card_aid(rng: &mut impl Rng) -> String {
    format!("A00000000{}", rng.gen_range(10_000..=999_999_999_999u64))
}

/// Card expiry as `YYMM`, always next calendar year.
pub(crate) fn expiry_yymm(rng: &mut impl Rng) -> String {
    let year = (current_year_utc() + 1).rem_euclid(100);
    let month = rng.gen_range(1..=12u32);
    format!("{year:02}{month:02}")
}

fn current_year_utc() -> i64 {
    let days = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() / SECONDS_PER_DAY)
        .unwrap_or(0);
    year_of_unix_days(days as i64)
}

/// Civil year containing the given day count since 1970-01-01.
///
/// Year part of Howard Hinnant's `civil_from_days` algorithm.
fn year_of_unix_days(days: i64) -> i64 {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    // mp counts from March, so January and February belong to the next year.
    if mp >= 10 { year + 1 } else { year }
}
