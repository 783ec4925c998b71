//! bpack benchmark

use bencher::{benchmark_group, benchmark_main, black_box, Bencher};
use bpack::{BpackBuf, Builder, Options, Validator, Value};

const DOCUMENT: &str = r#"{"key1": 123, "key2": true, "key3": null, "key4": [456, false, null, {"key1": true, "key2": 789}, [10, false, null]], "key5": {"key1": true, "key2": 789, "key3": null}, "key6": "some longer string payload here"}"#;

fn bench_build_object(bench: &mut Bencher) {
    bench.iter(|| {
        let mut builder = Builder::new();
        builder.open_object(true, true).unwrap();
        builder.add("key1", Value::String("string")).unwrap();
        builder.add("key2", Value::Int(123)).unwrap();
        builder.add("key3", Value::Bool(true)).unwrap();
        builder.add("key4", Value::Null).unwrap();
        builder.close().unwrap();
        black_box(builder.finish().unwrap());
    })
}

fn bench_build_array(bench: &mut Bencher) {
    bench.iter(|| {
        let mut builder = Builder::new();
        builder.open_array(true).unwrap();
        for i in 0..32 {
            builder.add_value(Value::Int(i)).unwrap();
        }
        builder.close().unwrap();
        black_box(builder.finish().unwrap());
    })
}

fn bench_build_sorted_keys(bench: &mut Bencher) {
    let keys = ["keykey", "keyk", "key", "keyke", "ke"];
    bench.iter(|| {
        let mut builder = Builder::new();
        builder.open_object(true, true).unwrap();
        for key in keys {
            builder.add(key, Value::Null).unwrap();
        }
        builder.close().unwrap();
        black_box(builder.finish().unwrap());
    })
}

fn bench_build_unsorted_keys(bench: &mut Bencher) {
    let keys = ["keykey", "keyk", "key", "keyke", "ke"];
    bench.iter(|| {
        let mut builder = Builder::new();
        builder.open_object(true, false).unwrap();
        for key in keys {
            builder.add(key, Value::Null).unwrap();
        }
        builder.close().unwrap();
        black_box(builder.finish().unwrap());
    })
}

fn bench_object_get(bench: &mut Bencher) {
    let buf = BpackBuf::parse_json(DOCUMENT).unwrap();
    let object = buf.as_slice().object().unwrap();
    bench.iter(|| {
        black_box(object.get("key5").unwrap().unwrap());
    })
}

fn bench_object_get_missing(bench: &mut Bencher) {
    let buf = BpackBuf::parse_json(DOCUMENT).unwrap();
    let object = buf.as_slice().object().unwrap();
    bench.iter(|| {
        black_box(object.get("nope").unwrap());
    })
}

fn bench_array_at(bench: &mut Bencher) {
    let buf = BpackBuf::parse_json("[456, false, null, [10], \"tail\"]").unwrap();
    let array = buf.as_slice().array().unwrap();
    bench.iter(|| {
        black_box(array.at(4).unwrap());
    })
}

fn bench_parse_json(bench: &mut Bencher) {
    bench.iter(|| {
        black_box(BpackBuf::parse_json(DOCUMENT).unwrap());
    })
}

fn bench_dump_json(bench: &mut Bencher) {
    let buf = BpackBuf::parse_json(DOCUMENT).unwrap();
    bench.iter(|| {
        black_box(buf.as_slice().to_json().unwrap());
    })
}

fn bench_validate(bench: &mut Bencher) {
    let buf = BpackBuf::parse_json(DOCUMENT).unwrap();
    let validator = Validator::new(Options::new());
    bench.iter(|| {
        validator.validate(black_box(buf.as_bytes())).unwrap();
    })
}

benchmark_group!(
    bpack_benches,
    bench_build_object,
    bench_build_array,
    bench_build_sorted_keys,
    bench_build_unsorted_keys,
    bench_object_get,
    bench_object_get_missing,
    bench_array_at,
    bench_parse_json,
    bench_dump_json,
    bench_validate,
);

benchmark_main!(bpack_benches);
