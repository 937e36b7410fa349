//! Resolution scenarios against the built-in userland declaration
//!
//! Each test resolves a concrete corpus path and checks the merged
//! properties and the build/test decisions derived from them.

use lkmc_pathprops::{AllowedArchs, Resolver};

fn resolver() -> Resolver {
    Resolver::builtin().unwrap().with_separator('/')
}

const ARM_FLAGS: &[&str] = &[
    "-Xassembler",
    "-mcpu=cortex-a72",
    "-Xassembler",
    "-mfpu=crypto-neon-fp-armv8.1",
    "-Xassembler",
    "-meabi=5",
    "-marm",
    "-masm-syntax-unified",
];

const FREESTANDING_FLAGS: &[&str] = &["-ffreestanding", "-nostdlib", "-static"];

// =============================================================================
// Architecture directories
// =============================================================================

#[test]
fn test_arm_freestanding_flag_order() {
    let props = resolver().resolve("userland/arch/arm/freestanding/foo.S");

    assert_eq!(props.allowed_archs, AllowedArchs::only(["arm"]));
    assert!(!props.no_executable);

    let mut expected = vec!["-fno-pie", "-no-pie"];
    expected.extend_from_slice(ARM_FLAGS);
    expected.extend_from_slice(FREESTANDING_FLAGS);
    assert_eq!(props.cc_flags, expected);
    assert!(!props.extra_objs_userland_asm);

    assert!(props.should_be_built("arm"));
    assert!(!props.should_be_built("aarch64"));
}

#[test]
fn test_arch_level_asm_objects() {
    let props = resolver().resolve("userland/arch/aarch64/add.S");
    assert!(props.extra_objs_userland_asm);
    assert_eq!(props.cc_flags, vec!["-fno-pie", "-no-pie"]);

    let props = resolver().resolve("userland/arch/aarch64/c/inline_asm.c");
    assert!(!props.extra_objs_userland_asm);
}

#[test]
fn test_arm_c_freestanding() {
    let props = resolver().resolve("userland/arch/arm/c/freestanding/hello.c");
    let mut expected = vec!["-fno-pie", "-no-pie"];
    expected.extend_from_slice(ARM_FLAGS);
    expected.extend_from_slice(FREESTANDING_FLAGS);
    assert_eq!(props.cc_flags, expected);
}

#[test]
fn test_x86_64_ring0_receives_signal() {
    let props = resolver().resolve("userland/arch/x86_64/c/ring0.c");
    assert!(props.receives_signal);
    assert!(props.should_be_built("x86_64"));
    assert!(!props.should_be_tested("x86_64"));
}

#[test]
fn test_x86_64_rdtsc_is_tested() {
    let props = resolver().resolve("userland/arch/x86_64/c/rdtsc.c");
    assert!(props.should_be_tested("x86_64"));
    assert!(!props.should_be_built("arm"));
}

#[test]
fn test_no_executable_helpers() {
    for path in [
        "userland/arch/empty.S",
        "userland/arch/fail.S",
        "userland/arch/main.c",
    ] {
        let props = resolver().resolve(path);
        assert!(props.no_executable, "{path}");
        assert!(!props.should_be_built("x86_64"), "{path}");
    }
}

// =============================================================================
// Portable directories
// =============================================================================

#[test]
fn test_false_exits_one_and_is_tested() {
    let props = resolver().resolve("userland/c/false.c");
    assert_eq!(props.exit_status, 1);
    assert!(props.should_be_tested("x86_64"));
    assert!(props.should_be_tested("aarch64"));
}

#[test]
fn test_sleep_forever_built_not_tested() {
    let props = resolver().resolve("userland/posix/sleep_forever.c");
    assert!(props.more_than_1s);
    for arch in ["x86_64", "arm", "aarch64"] {
        assert!(props.should_be_built(arch));
        assert!(!props.should_be_tested(arch));
    }
}

#[test]
fn test_getchar_is_interactive() {
    let props = resolver().resolve("userland/c/getchar.c");
    assert!(props.interactive);
    assert!(!props.should_be_tested("x86_64"));
}

#[test]
fn test_gnu_extension_directories() {
    for path in ["userland/gcc/busy_loop.c", "userland/linux/futex.c"] {
        let props = resolver().resolve(path);
        assert_eq!(props.c_std.as_deref(), Some("gnu11"), "{path}");
        assert_eq!(props.cxx_std.as_deref(), Some("gnu++17"), "{path}");
        assert!(!props.cc_pedantic, "{path}");
    }
    assert!(resolver().resolve("userland/linux/futex.c").skip_run_unclassified);
}

#[test]
fn test_kernel_modules_need_modules() {
    let props = resolver().resolve("userland/kernel_modules/ioctl.c");
    assert!(props.requires_kernel_modules);
    assert_eq!(props.c_std.as_deref(), Some("gnu11"));
    assert!(props.should_be_built("arm"));
    assert!(!props.should_be_tested("arm"));
}

#[test]
fn test_lkmc_common_objects() {
    let props = resolver().resolve("userland/lkmc/assert_fail.c");
    assert!(props.extra_objs_lkmc_common);
    assert_eq!(props.exit_status, 1);

    let props = resolver().resolve("userland/lkmc/other.c");
    assert!(props.extra_objs_lkmc_common);
    assert_eq!(props.exit_status, 0);
}

#[test]
fn test_root_defaults() {
    let props = resolver().resolve("baremetal/start.S");
    assert_eq!(props.allowed_archs, AllowedArchs::Unrestricted);
    assert_eq!(props.c_std, None);
    assert!(props.cc_flags.is_empty());
    assert!(props.cc_pedantic);
    assert!(!props.pedantic);
    assert_eq!(props.exit_status, 0);
}

// =============================================================================
// Traversal policy
// =============================================================================

#[test]
fn test_diverging_path_ignores_deeper_nodes() {
    // "false.c" only counts directly under userland/c
    let props = resolver().resolve("userland/posix/c/false.c");
    assert_eq!(props.exit_status, 0);
}

#[test]
fn test_segments_match_case_sensitively() {
    let props = resolver().resolve("userland/C/false.c");
    assert_eq!(props.exit_status, 0);
}

#[test]
fn test_trace_stop_point() {
    let resolution = resolver().trace("userland/arch/riscv/foo.S");
    assert_eq!(resolution.matched.len(), 2);
    assert_eq!(resolution.stopped_at.as_deref(), Some("riscv"));
    assert_eq!(resolution.properties.cc_flags, vec!["-fno-pie", "-no-pie"]);
}
