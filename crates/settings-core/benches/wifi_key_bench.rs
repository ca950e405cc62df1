//! Criterion benchmarks for WiFi key derivation and document extraction.
//!
//! Key derivation runs once per saved network on every flat-store write, and
//! extraction runs on every boot with the card inserted.
//!
//! Run with:
//! ```bash
//! cargo bench --package settings-core --bench wifi_key_bench
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use settings_core::flat::wifi_key::{ssid_checksum, wifi_keys};
use settings_core::{ConfigRecord, DeviceProfile, SettingsDocument};

const DEVICE: &str = "24:a:c4:0:1b:ff";

// ── Benchmarks: key derivation ────────────────────────────────────────────────

fn bench_wifi_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("wifi_key");

    group.bench_function("checksum_short", |b| {
        b.iter(|| ssid_checksum(black_box("Home")))
    });

    // 32 bytes is the longest SSID 802.11 allows.
    let longest = "x".repeat(32);
    group.bench_with_input(BenchmarkId::new("wifi_keys", 32), &longest, |b, ssid| {
        b.iter(|| wifi_keys(black_box(ssid)))
    });

    group.finish();
}

// ── Benchmarks: document extraction ───────────────────────────────────────────

fn bench_extract(c: &mut Criterion) {
    let mut group = c.benchmark_group("document");
    let profile = DeviceProfile::default();

    for networks in [1usize, 20] {
        let mut record = ConfigRecord::defaults(&profile);
        for i in 0..networks {
            record.wifi_mut().upsert(format!("network-{i}"), "password");
        }
        let mut doc = SettingsDocument::new();
        doc.write_record(&record, DEVICE);
        let text = doc.to_pretty_string().unwrap_or_default();

        group.bench_with_input(BenchmarkId::new("parse_extract", networks), &text, |b, text| {
            b.iter(|| {
                let doc = SettingsDocument::parse(black_box(text)).ok()?;
                let mut target = ConfigRecord::defaults(&profile);
                Some(doc.extract_into(&mut target, DEVICE, &profile).missing_count())
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_wifi_keys, bench_extract);
criterion_main!(benches);
