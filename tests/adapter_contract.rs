//! Contract invariants that must hold for every backend.

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use cachebear::{open, Cache, CacheError, Codec, Options};

struct Ctx {
    name: &'static str,
    cache: Cache,
    _dir: Option<TempDir>,
}

fn each_adapter(interval: u64) -> Vec<Ctx> {
    let dir = tempfile::tempdir().unwrap();
    let file = open(Options::file(dir.path().to_str().unwrap(), interval)).unwrap();
    vec![
        Ctx {
            name: "memory",
            cache: open(Options::memory(interval)).unwrap(),
            _dir: None,
        },
        Ctx {
            name: "file",
            cache: file,
            _dir: Some(dir),
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    name: String,
    age: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Wrap {
    k: String,
    v: i64,
    x: Vec<User>,
}

fn sample_wrap() -> Wrap {
    Wrap {
        k: "test".into(),
        v: 100,
        x: vec![User { name: "A".into(), age: 6 }],
    }
}

#[test]
fn basic_operations() {
    for ctx in each_adapter(0) {
        let c = &ctx.cache;

        c.put("uname", "unknwon", 1).unwrap();
        c.put("uname2", "unknwon2", 1).unwrap();
        assert!(c.is_exist("uname").unwrap(), "{}", ctx.name);

        assert_eq!(c.string("404"), "", "{}", ctx.name);
        assert_eq!(c.string("uname"), "unknwon", "{}", ctx.name);

        thread::sleep(Duration::from_millis(1200));
        assert_eq!(c.string("uname"), "", "{}", ctx.name);
        assert_eq!(c.string("uname2"), "", "{}", ctx.name);

        c.put("uname", "unknwon", 0).unwrap();
        c.delete("uname").unwrap();
        assert_eq!(c.string("uname"), "", "{}", ctx.name);

        c.put("uname", "unknwon", 0).unwrap();
        c.flush().unwrap();
        assert_eq!(c.string("uname"), "", "{}", ctx.name);

        c.put("struct", &sample_wrap(), 0).unwrap();
        assert_eq!(c.get::<Wrap>("struct").unwrap(), sample_wrap(), "{}", ctx.name);

        c.close().unwrap();
    }
}

#[test]
fn unbounded_entries_survive_until_removed() {
    for ctx in each_adapter(0) {
        let c = &ctx.cache;
        c.put("k", "v", 0).unwrap();
        thread::sleep(Duration::from_millis(1100));
        assert_eq!(c.string("k"), "v", "{}", ctx.name);
        c.delete("k").unwrap();
        assert_eq!(
            c.get::<String>("k").unwrap_err(),
            CacheError::NotFound,
            "{}",
            ctx.name
        );
    }
}

#[test]
fn counter_operations() {
    for ctx in each_adapter(0) {
        let c = &ctx.cache;
        assert!(c.incr("404").is_err(), "{}", ctx.name);
        assert!(c.decr("404").is_err(), "{}", ctx.name);

        c.put("int32", &0i32, 0).unwrap();
        c.put("int64", &0i64, 0).unwrap();
        c.put("uint32", &0u32, 0).unwrap();
        c.put("uint64", &0u64, 0).unwrap();
        c.put("string", "hi", 0).unwrap();

        assert!(c.decr("uint32").is_err(), "{}", ctx.name);
        assert!(c.decr("uint64").is_err(), "{}", ctx.name);
        assert_eq!(c.uint32("uint32"), 0, "{}", ctx.name);

        for key in ["int32", "int64", "uint32", "uint64"] {
            c.incr(key).unwrap();
            c.incr(key).unwrap();
            c.decr(key).unwrap();
        }
        assert_eq!(c.int32("int32"), 1, "{}", ctx.name);
        assert_eq!(c.int64("int64"), 1, "{}", ctx.name);
        assert_eq!(c.uint32("uint32"), 1, "{}", ctx.name);
        assert_eq!(c.uint64("uint64"), 1, "{}", ctx.name);

        assert!(c.incr("string").is_err(), "{}", ctx.name);
        assert!(c.decr("string").is_err(), "{}", ctx.name);

        c.close().unwrap();
    }
}

#[test]
fn sweep_reclaims_expired_entries() {
    for ctx in each_adapter(1) {
        let c = &ctx.cache;
        c.put("gone", "v", 1).unwrap();
        c.put("kept", "v", 0).unwrap();

        thread::sleep(Duration::from_millis(2500));
        assert!(!c.is_exist("gone").unwrap(), "{}", ctx.name);
        assert!(c.is_exist("kept").unwrap(), "{}", ctx.name);

        c.close().unwrap();
        c.close().unwrap();
    }
}

#[test]
fn alternate_codecs_round_trip() {
    for codec in [Codec::Json, Codec::MessagePack] {
        let dir = tempfile::tempdir().unwrap();
        let setups = [
            Options::memory(0),
            Options::file(dir.path().to_str().unwrap(), 0),
        ];
        for options in setups {
            let mut c = open(options).unwrap();
            c.set_codec(codec);

            c.put("struct", &sample_wrap(), 0).unwrap();
            assert_eq!(c.get::<Wrap>("struct").unwrap(), sample_wrap());

            c.put("n", &5i64, 0).unwrap();
            c.incr("n").unwrap();
            assert_eq!(c.int64("n"), 6, "codec {}", codec.name());
        }
    }
}
