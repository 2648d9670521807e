// Benchmark for temperature encoding and full bus round trips
// Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};
use ds1621_sim::bus::VirtualBus;
use ds1621_sim::client::Ds1621Client;
use ds1621_sim::codec;
use ds1621_sim::device::Ds1621;
use std::hint::black_box;

fn bench_codec(c: &mut Criterion) {
    c.bench_function("encode + extended registers (20k values)", |b| {
        b.iter(|| {
            let mut acc = 0i32;
            for milli in (-55_000..125_000).step_by(9) {
                let (native, counter, slope) = codec::extended_resolution_registers(black_box(milli));
                acc = acc.wrapping_add(codec::recover_extended_milli(native, counter, slope));
            }
            acc
        });
    });
}

fn bench_bus_read_temperature(c: &mut Criterion) {
    let mut bus = VirtualBus::new();
    let sensor = Ds1621::attach(&mut bus, 0x48, 21_000).unwrap();
    let mut client = Ds1621Client::new(&mut bus, 0x48);
    client.start_conversion().unwrap();
    c.bench_function("high precision read over virtual bus (1k)", |b| {
        b.iter(|| {
            for i in 0..1_000 {
                sensor.set_ambient_milli(i * 10);
                black_box(client.read_temperature_high_precision_milli().unwrap());
            }
        });
    });
}

criterion_group!(benches, bench_codec, bench_bus_read_temperature);
criterion_main!(benches);
