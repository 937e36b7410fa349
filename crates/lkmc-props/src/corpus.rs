//! Built-in declaration for the userland example corpus.

use serde_json::{json, Value};

use crate::tree::{Declaration, Overrides};

/// Overrides for sources that use GNU extensions.
fn gnu_extensions() -> Overrides {
    overrides(json!({
        "c_std": "gnu11",
        "cc_pedantic": false,
        "cxx_std": "gnu++17",
    }))
}

/// Overrides for sources that run without libc.
fn freestanding() -> Declaration {
    Declaration::Leaf(overrides(json!({
        "cc_flags": ["-ffreestanding", "-nostdlib", "-static"],
        "extra_objs_userland_asm": false,
    })))
}

fn overrides(value: Value) -> Overrides {
    match value {
        Value::Object(map) => map,
        _ => Overrides::new(),
    }
}

fn leaf(value: Value) -> Declaration {
    Declaration::Leaf(overrides(value))
}

fn branch<const N: usize>(value: Value, children: [(&str, Declaration); N]) -> Declaration {
    Declaration::Branch(
        overrides(value),
        children
            .into_iter()
            .map(|(segment, child)| (segment.to_string(), child))
            .collect(),
    )
}

fn with(mut base: Overrides, extra: Value) -> Declaration {
    base.extend(overrides(extra));
    Declaration::Leaf(base)
}

/// Subtree shared by every architecture directory.
fn arch_dir<const N: usize>(allowed: Value, c_children: [(&str, Declaration); N]) -> Declaration {
    let mut c = vec![("freestanding", freestanding())];
    c.extend(c_children);

    branch(
        allowed,
        [
            (
                "c",
                Declaration::Branch(
                    overrides(json!({"extra_objs_userland_asm": false})),
                    c.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
                ),
            ),
            ("freestanding", freestanding()),
        ],
    )
}

/// The built-in declaration.
///
/// The root supplies a default for every schema key.
pub fn declaration() -> Declaration {
    let arm = {
        let mut props = overrides(json!({"allowed_archs": ["arm"]}));
        props.insert(
            "cc_flags".to_string(),
            json!([
                "-Xassembler", "-mcpu=cortex-a72",
                // vfp instructions need an FPU that QEMU supports in ARM mode
                "-Xassembler", "-mfpu=crypto-neon-fp-armv8.1",
                "-Xassembler", "-meabi=5",
                // inline assembly as ARM, not Thumb
                "-marm",
                "-masm-syntax-unified",
            ]),
        );
        arch_dir(Value::Object(props), [])
    };

    branch(
        json!({
            "allowed_archs": null,
            "c_std": null,
            "cc_flags": [],
            "cc_pedantic": true,
            "cxx_std": null,
            "exit_status": 0,
            "extra_objs_lkmc_common": false,
            "extra_objs_userland_asm": false,
            "interactive": false,
            "more_than_1s": false,
            "no_executable": false,
            "pedantic": false,
            "receives_signal": false,
            "requires_kernel_modules": false,
            "skip_run_unclassified": false,
        }),
        [(
            "userland",
            branch(
                json!({}),
                [
                    (
                        "arch",
                        branch(
                            json!({
                                "cc_flags": ["-fno-pie", "-no-pie"],
                                "extra_objs_userland_asm": true,
                            }),
                            [
                                ("arm", arm),
                                ("aarch64", arch_dir(json!({"allowed_archs": ["aarch64"]}), [])),
                                ("empty.S", leaf(json!({"no_executable": true}))),
                                ("fail.S", leaf(json!({"no_executable": true}))),
                                ("main.c", leaf(json!({"no_executable": true}))),
                                (
                                    "x86_64",
                                    arch_dir(
                                        json!({"allowed_archs": ["x86_64"]}),
                                        [("ring0.c", leaf(json!({"receives_signal": true})))],
                                    ),
                                ),
                            ],
                        ),
                    ),
                    (
                        "c",
                        branch(
                            json!({}),
                            [
                                ("false.c", leaf(json!({"exit_status": 1}))),
                                ("getchar.c", leaf(json!({"interactive": true}))),
                                ("infinite_loop.c", leaf(json!({"more_than_1s": true}))),
                            ],
                        ),
                    ),
                    ("gcc", Declaration::Leaf(gnu_extensions())),
                    (
                        "kernel_modules",
                        with(gnu_extensions(), json!({"requires_kernel_modules": true})),
                    ),
                    (
                        "lkmc",
                        branch(
                            json!({"extra_objs_lkmc_common": true}),
                            [("assert_fail.c", leaf(json!({"exit_status": 1})))],
                        ),
                    ),
                    ("libs", leaf(json!({"skip_run_unclassified": true}))),
                    (
                        "linux",
                        with(gnu_extensions(), json!({"skip_run_unclassified": true})),
                    ),
                    (
                        "posix",
                        branch(
                            json!({}),
                            [
                                ("count.c", leaf(json!({"more_than_1s": true}))),
                                ("sleep_forever.c", leaf(json!({"more_than_1s": true}))),
                                ("virt_to_phys_test.c", leaf(json!({"more_than_1s": true}))),
                            ],
                        ),
                    ),
                ],
            ),
        )],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::OverrideTree;

    #[test]
    fn test_builtin_declaration_builds() {
        let tree = OverrideTree::build(&declaration()).unwrap();
        let userland = tree.child("userland").unwrap();
        assert!(userland.properties().is_empty());
        assert!(userland.child("arch").and_then(|a| a.child("x86_64")).is_some());
    }

    #[test]
    fn test_arch_subtrees_share_layout() {
        let tree = OverrideTree::build(&declaration()).unwrap();
        let arch = tree.child("userland").and_then(|u| u.child("arch")).unwrap();
        for name in ["arm", "aarch64", "x86_64"] {
            let dir = arch.child(name).unwrap();
            assert!(dir.child("freestanding").is_some(), "{name}");
            assert!(dir.child("c").and_then(|c| c.child("freestanding")).is_some(), "{name}");
        }
        assert!(arch
            .child("x86_64")
            .and_then(|x| x.child("c"))
            .and_then(|c| c.child("ring0.c"))
            .is_some());
        assert!(arch
            .child("arm")
            .and_then(|x| x.child("c"))
            .and_then(|c| c.child("ring0.c"))
            .is_none());
    }

    #[test]
    fn test_round_trips_through_json() {
        let text = serde_json::to_string(&declaration()).unwrap();
        assert_eq!(Declaration::from_json_str(&text).unwrap(), declaration());
    }
}
