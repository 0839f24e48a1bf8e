#![no_main]

use inbursts_engine::BurstSeries;
use inbursts_engine::report::BurstRecord;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        for line in text.lines() {
            let _ = line.parse::<BurstRecord>();
        }
    }

    // 잘못된 줄은 건너뛸 뿐 패닉하지 않아야 한다
    if let Ok(series) = BurstSeries::from_reader(data) {
        let summary = series.summary();
        assert_eq!(summary.records, series.points().len() as u64);
        let total = series
            .points()
            .iter()
            .fold(0u64, |acc, p| acc.saturating_add(p.record.packets_in));
        assert_eq!(summary.total_packets, total);
    }
});
