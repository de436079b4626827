//! Benchmarks for probe output parsing
//!
//! Measures ffprobe `-show_format` JSON parsing for a bare format section and
//! for documents padded with stream and tag data that the parser skips.

use cf_av::parse_ffprobe_output;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Output of `ffprobe -v quiet -print_format json -show_format` for a short upload
const FFPROBE_FORMAT_ONLY: &str = r#"{
    "format": {
        "filename": "data/videos/3f1c2b7e9a0d4c5e8f6a1b2c3d4e5f60_original.mp4",
        "nb_streams": 2,
        "nb_programs": 0,
        "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
        "format_long_name": "QuickTime / MOV",
        "start_time": "0.000000",
        "duration": "12.480000",
        "size": "3145728",
        "bit_rate": "2016491",
        "probe_score": 100,
        "tags": {
            "major_brand": "isom",
            "minor_version": "512",
            "compatible_brands": "isomiso2avc1mp41",
            "encoder": "Lavf60.16.100"
        }
    }
}"#;

/// Same file probed with `-show_streams` as well
const FFPROBE_WITH_STREAMS: &str = r#"{
    "streams": [
        {
            "index": 0,
            "codec_name": "h264",
            "codec_type": "video",
            "width": 1280,
            "height": 720,
            "r_frame_rate": "30/1",
            "duration": "12.466667",
            "disposition": {"default": 1, "forced": 0},
            "tags": {"language": "und", "handler_name": "VideoHandler"}
        },
        {
            "index": 1,
            "codec_name": "aac",
            "codec_type": "audio",
            "sample_rate": "44100",
            "channels": 2,
            "duration": "12.480000",
            "disposition": {"default": 1, "forced": 0},
            "tags": {"language": "und", "handler_name": "SoundHandler"}
        }
    ],
    "format": {
        "filename": "data/videos/3f1c2b7e9a0d4c5e8f6a1b2c3d4e5f60_merged.mp4",
        "nb_streams": 2,
        "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
        "duration": "24.960000",
        "size": "6291456",
        "bit_rate": "2016491"
    }
}"#;

/// Parser input that fails late, on the size field
const FFPROBE_BAD_SIZE: &str = r#"{
    "format": {
        "format_name": "matroska,webm",
        "duration": "8.000000",
        "size": "N/A"
    }
}"#;

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("ffprobe_parse");

    for (name, input) in [
        ("format_only", FFPROBE_FORMAT_ONLY),
        ("with_streams", FFPROBE_WITH_STREAMS),
    ] {
        group.throughput(Throughput::Bytes(input.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), input, |b, input| {
            b.iter(|| parse_ffprobe_output(black_box(input)).unwrap())
        });
    }

    group.finish();
}

fn bench_parse_error(c: &mut Criterion) {
    c.bench_function("ffprobe_parse_bad_size", |b| {
        b.iter(|| parse_ffprobe_output(black_box(FFPROBE_BAD_SIZE)).unwrap_err())
    });
}

criterion_group!(benches, bench_parse, bench_parse_error);
criterion_main!(benches);
