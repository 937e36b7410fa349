//! Property tests for path resolution
//!
//! Run with: `cargo test --test resolution_properties`

use lkmc_pathprops::{Property, PropertyError, PropertyRecord, Resolver};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn resolver() -> Resolver {
    Resolver::builtin().unwrap().with_separator('/')
}

/// Segments drawn mostly from names that exist in the built-in tree.
fn arb_segment() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => prop::sample::select(vec![
            "userland", "arch", "arm", "aarch64", "x86_64", "c", "freestanding",
            "ring0.c", "posix", "count.c", "lkmc", "gcc", "linux", "libs",
            "kernel_modules", "false.c", "empty.S",
        ])
        .prop_map(str::to_string),
        1 => "[a-z_]{1,8}(\\.[cS])?",
    ]
}

fn arb_path() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(arb_segment(), 0..7)
}

fn unknown_key() -> impl Strategy<Value = String> {
    "[a-z_]{1,16}".prop_filter("must not be a schema key", |k| k.parse::<Property>().is_err())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_resolution_is_complete(segments in arb_path()) {
        let props = resolver().resolve(&segments.join("/"));
        let record = props.to_record();
        for key in Property::ALL {
            prop_assert!(record.read(key).is_ok());
        }
    }

    #[test]
    fn prop_flags_grow_monotonically(segments in arb_path()) {
        let r = resolver();
        let mut previous = r.resolve("").cc_flags;
        for depth in 1..=segments.len() {
            let flags = r.resolve(&segments[..depth].join("/")).cc_flags;
            prop_assert!(flags.starts_with(&previous));
            previous = flags;
        }
    }

    #[test]
    fn prop_walk_stops_at_first_miss(
        segments in arb_path(),
        tail in prop::collection::vec(arb_segment(), 0..4),
    ) {
        let r = resolver();
        let path = segments.join("/");
        let resolution = r.trace(&path);

        // an empty path stops at the empty segment before any real one
        if resolution.stopped_at.is_some() && !segments.is_empty() {
            let matched = resolution.matched.len();
            let prefix = segments[..=matched].join("/");
            let mut diverged = segments[..=matched].to_vec();
            diverged.extend(tail);

            prop_assert_eq!(&r.resolve(&prefix), &resolution.properties);
            prop_assert_eq!(&r.resolve(&diverged.join("/")), &resolution.properties);
        }
    }

    #[test]
    fn prop_unknown_key_always_rejected(
        key in unknown_key(),
        interactive in any::<bool>(),
        exit_status in any::<i64>(),
    ) {
        let mut overrides = Map::new();
        overrides.insert("interactive".to_string(), json!(interactive));
        overrides.insert("exit_status".to_string(), json!(exit_status));
        overrides.insert(key.clone(), Value::Null);

        prop_assert_eq!(
            PropertyRecord::from_json(&overrides),
            Err(PropertyError::UnknownProperty(key))
        );
    }
}

#[test]
fn test_scalar_override_replaces_parent_value() {
    let r = resolver();
    let parent = r.resolve("userland/c");
    let child = r.resolve("userland/c/false.c");

    assert_eq!(parent.exit_status, 0);
    assert_eq!(child.exit_status, 1);
    assert_eq!(child.cc_flags, parent.cc_flags);
}
