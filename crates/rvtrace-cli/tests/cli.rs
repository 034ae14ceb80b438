//! End-to-end tests driving the compiled `rvtrace` binary: write a
//! fixture trace to a temp dir, shell out, assert on stdout.

use std::process::Command;

use rvtrace_core::{BasicInfo, CycleBuilder, CycleConfig, IoState, NodeKind, PcPair};

fn rvtrace() -> Command {
    Command::new(env!("CARGO_BIN_EXE_rvtrace"))
}

fn one_cycle(cycle: u32, pc: u64, host_io: u32) -> Vec<u8> {
    let mut cfg = CycleConfig::new();
    cfg.set_count(NodeKind::BasicInfo, 1);
    cfg.set_count(NodeKind::Pc64, 1);
    cfg.set_count(NodeKind::Io, 1);
    let mut b = CycleBuilder::new(&cfg).unwrap();
    b.set_basic_info(BasicInfo { cycle, xlen: 64, pc }).unwrap();
    b.set_pc64(PcPair { virt: pc, phys: pc }).unwrap();
    b.set_io(IoState { host_io }).unwrap();
    b.into_bytes()
}

#[test]
fn dump_pc_prints_one_hex_pc_per_line() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.tbin");
    let mut bytes = Vec::new();
    bytes.extend(one_cycle(0, 0x8000_0000, 0));
    bytes.extend(one_cycle(1, 0x8000_0004, 0));
    std::fs::write(&path, &bytes).unwrap();

    let output = rvtrace()
        .arg("dump-pc")
        .arg(&path)
        .output()
        .expect("failed to run rvtrace dump-pc");
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout, "80000000\n80000004\n");
}

#[test]
fn dump_respects_begin_and_count() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trace.tbin");
    let mut bytes = Vec::new();
    for i in 0..5u32 {
        bytes.extend(one_cycle(i, 0x1000 + u64::from(i) * 4, 0));
    }
    std::fs::write(&path, &bytes).unwrap();

    let output = rvtrace()
        .args(["dump", "--begin", "1", "--count", "2"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.matches("BREAK").count(), 2);
    assert!(stdout.contains("PC 1004 1004"));
    assert!(stdout.contains("PC 1008 1008"));
    assert!(!stdout.contains("PC 1000 1000"));
}

#[test]
fn check_io_passes_when_last_cycle_host_io_is_one() {
    let dir = tempfile::tempdir().unwrap();
    let pass_path = dir.path().join("pass.tbin");
    let fail_path = dir.path().join("fail.tbin");

    let mut pass_bytes = Vec::new();
    pass_bytes.extend(one_cycle(0, 0x1000, 0));
    pass_bytes.extend(one_cycle(1, 0x1004, 1));
    std::fs::write(&pass_path, &pass_bytes).unwrap();

    let mut fail_bytes = Vec::new();
    fail_bytes.extend(one_cycle(0, 0x1000, 0));
    std::fs::write(&fail_path, &fail_bytes).unwrap();

    let output = rvtrace()
        .arg("check-io")
        .arg(&pass_path)
        .arg(&fail_path)
        .output()
        .unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("[ PASS ]"));
    assert!(stdout.contains("[ FAILED ]"));
    assert!(stdout.contains("1/2 passed"));
    assert!(!output.status.success());
}

#[test]
fn conv_produces_a_sharded_index_trace() {
    let dir = tempfile::tempdir().unwrap();
    let in_path = dir.path().join("trace.tbin");
    let mut bytes = Vec::new();
    for i in 0..3u32 {
        bytes.extend(one_cycle(i, 0x1000 + u64::from(i) * 4, 0));
    }
    std::fs::write(&in_path, &bytes).unwrap();

    let out_base = dir.path().join("out");
    let status = rvtrace()
        .arg("conv")
        .arg(&in_path)
        .arg(&out_base)
        .status()
        .unwrap();
    assert!(status.success());
    assert!(dir.path().join("out.tidx").exists());
    assert!(dir.path().join("out.0.tbin").exists());

    let dump_pc_output = rvtrace()
        .arg("dump-pc")
        .arg(dir.path().join("out.tidx"))
        .output()
        .unwrap();
    let stdout = String::from_utf8(dump_pc_output.stdout).unwrap();
    assert_eq!(stdout, "1000\n1004\n1008\n");
}
