#![no_main]

use libfuzzer_sys::fuzz_target;
use logistic_forecaster::{config::InputConfig, io::read_csv_from_bytes};

fuzz_target!(|data: &[u8]| {
    // Any accepted series must satisfy the series invariants.
    if let Ok(series) = read_csv_from_bytes(data, &InputConfig::default()) {
        assert!(series.len() >= 2);
        assert!(series.time().windows(2).all(|w| w[0] <= w[1]));
        assert!(series.value().iter().all(|v| v.is_finite() && *v >= 0.0));
    }
});
