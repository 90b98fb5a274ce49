//! Benchmark the chunk codecs.
#![allow(missing_docs)]

use std::borrow::Cow;

use criterion::{
    AxisScale, BenchmarkId, Criterion, PlotConfiguration, Throughput, criterion_group,
    criterion_main,
};
use earray::array::codec::{
    Bz2Codec, BytesRepresentation, BytesToBytesCodecTraits, CodecOptions, Fletcher32Codec,
    ShuffleCodec, ZlibCodec,
};
use earray::array::{Complib, FilterPipeline, Filters};

fn codec_bytes_to_bytes(c: &mut Criterion, name: &str, codec: &dyn BytesToBytesCodecTraits) {
    let plot_config = PlotConfiguration::default().summary_scale(AxisScale::Logarithmic);
    let mut group = c.benchmark_group(name);
    group.plot_config(plot_config);

    for size in [32u64, 64, 128, 256].iter() {
        let size3 = size * size * size;
        let rep = BytesRepresentation::FixedSize(size3);
        let data_decoded: Vec<u8> = (0..size3).map(|i| (i % 251) as u8).collect();
        let data_encoded = codec
            .encode(Cow::Borrowed(data_decoded.as_slice()), &CodecOptions::default())
            .unwrap()
            .into_owned();
        group.throughput(Throughput::Bytes(size3));
        group.bench_function(BenchmarkId::new("encode", size3), |b| {
            b.iter(|| {
                codec
                    .encode(Cow::Borrowed(data_decoded.as_slice()), &CodecOptions::default())
                    .unwrap()
            });
        });
        group.bench_function(BenchmarkId::new("decode", size3), |b| {
            b.iter(|| {
                codec
                    .decode(
                        Cow::Borrowed(data_encoded.as_slice()),
                        &rep,
                        &CodecOptions::default(),
                    )
                    .unwrap()
            });
        });
    }
    group.finish();
}

fn codec_shuffle(c: &mut Criterion) {
    codec_bytes_to_bytes(c, "codec_shuffle", &ShuffleCodec::new(8));
}

fn codec_zlib(c: &mut Criterion) {
    codec_bytes_to_bytes(c, "codec_zlib", &ZlibCodec::new(5));
}

fn codec_bz2(c: &mut Criterion) {
    codec_bytes_to_bytes(c, "codec_bz2", &Bz2Codec::new(5));
}

fn codec_fletcher32(c: &mut Criterion) {
    codec_bytes_to_bytes(c, "codec_fletcher32", &Fletcher32Codec::new());
}

fn filter_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_pipeline");
    let filters = Filters::new()
        .with_complevel(5)
        .with_complib(Complib::Zlib)
        .with_shuffle(true)
        .with_fletcher32(true);
    let pipeline = FilterPipeline::from_filters(&filters, 4);
    let size = 1u64 << 22;
    let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
    let encoded = pipeline.encode(&data, &CodecOptions::default()).unwrap();
    group.throughput(Throughput::Bytes(size));
    group.bench_function("encode", |b| {
        b.iter(|| pipeline.encode(&data, &CodecOptions::default()).unwrap());
    });
    group.bench_function("decode", |b| {
        b.iter(|| {
            pipeline
                .decode(&encoded, data.len(), &CodecOptions::default())
                .unwrap()
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    codec_shuffle,
    codec_zlib,
    codec_bz2,
    codec_fletcher32,
    filter_pipeline
);
criterion_main!(benches);
