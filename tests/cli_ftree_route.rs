use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "ftree-rs-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

fn generate(dir: &Path, extra: &[&str]) -> (PathBuf, PathBuf) {
    let subnet = dir.join("subnet.json");
    let roots = dir.join("roots.txt");
    let mut args = vec![
        "--quiet",
        "--out",
        subnet.to_str().unwrap(),
        "--roots-out",
        roots.to_str().unwrap(),
    ];
    args.extend_from_slice(extra);
    let output = Command::new(env!("CARGO_BIN_EXE_gen_fat_tree"))
        .args(&args)
        .output()
        .expect("run gen_fat_tree");
    assert!(
        output.status.success(),
        "gen_fat_tree failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    (subnet, roots)
}

fn route(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ftree_route"))
        .arg("--quiet")
        .args(args)
        .output()
        .expect("run ftree_route")
}

#[test]
fn ftree_route_writes_tables_and_ca_order() {
    let dir = unique_temp_dir("route-k4");
    let (subnet, _roots) = generate(&dir, &["--kind", "fat-tree", "--k", "4"]);
    let out = dir.join("tables.json");
    let dump_dir = dir.join("dump");

    let output = route(&[
        "--subnet",
        subnet.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--dump-dir",
        dump_dir.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "ftree_route failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stats: Value =
        serde_json::from_slice(&output.stdout).expect("stdout must be stats JSON");
    assert_eq!(stats["cn_routes"], 16);
    assert_eq!(stats["dummy_routes"], 0);
    assert_eq!(stats["switch_routes"], 20);

    let raw = fs::read_to_string(&out).expect("read tables.json");
    let tables: Value = serde_json::from_str(&raw).expect("parse tables.json");
    let switches = tables["switches"].as_array().expect("switches array");
    assert_eq!(switches.len(), 20);
    let max_lid = tables["max_lid"].as_u64().expect("max_lid");
    assert_eq!(max_lid, 36);
    assert!(
        switches
            .iter()
            .all(|s| s["lft"].as_array().map(Vec::len) == Some(max_lid as usize + 1))
    );

    let order = fs::read_to_string(dump_dir.join("opensm-ftree-ca-order.dump"))
        .expect("read ca order dump");
    assert_eq!(order.lines().count(), 16);
    assert!(order.lines().all(|l| l.starts_with("0x") && l.contains('\t')));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn ftree_route_uses_root_and_cn_files_from_config() {
    let dir = unique_temp_dir("route-config");
    let (subnet, roots) = generate(
        &dir,
        &["--kind", "two-level", "--leaves", "2", "--spines", "2"],
    );
    // 生成器中第一个 CA 的端口 1
    let cns = write_file(&dir, "cns.txt", "# compute nodes\n0x0002c90300000011 h0_0\n");
    let config = write_file(
        &dir,
        "ftree.json",
        &serde_json::json!({
            "root_guid_file": roots,
            "cn_guid_file": cns,
        })
        .to_string(),
    );

    let output = route(&[
        "--subnet",
        subnet.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "ftree_route failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stats: Value = serde_json::from_slice(&output.stdout).expect("stats JSON");
    assert_eq!(stats["cn_routes"], 1);
    assert_eq!(stats["non_cn_routes"], 3);
    // 只有一个叶子连接计算节点
    assert_eq!(stats["dummy_routes"], 0);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn ftree_route_fails_without_valid_roots() {
    let dir = unique_temp_dir("route-bad-roots");
    let (subnet, _roots) = generate(&dir, &["--kind", "two-level"]);
    let roots = write_file(&dir, "roots.txt", "0xdeadbeef not-a-switch\n");
    let out = dir.join("tables.json");

    let output = route(&[
        "--subnet",
        subnet.to_str().unwrap(),
        "--root-guid-file",
        roots.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("fat-tree routing failed"), "stderr={stderr}");
    assert!(!out.exists(), "no tables on failure");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn ftree_route_rejects_bad_guid_file() {
    let dir = unique_temp_dir("route-bad-guid");
    let (subnet, _roots) = generate(&dir, &["--kind", "two-level"]);
    let roots = write_file(&dir, "roots.txt", "0x10\nspine-b\n");

    let output = route(&[
        "--subnet",
        subnet.to_str().unwrap(),
        "--root-guid-file",
        roots.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2"), "stderr={stderr}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn ftree_route_rejects_nonzero_lmc() {
    let dir = unique_temp_dir("route-lmc");
    let (subnet, _roots) = generate(&dir, &["--kind", "two-level"]);

    let output = route(&["--subnet", subnet.to_str().unwrap(), "--lmc", "2"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn ftree_route_rejects_empty_cn_file() {
    let dir = unique_temp_dir("route-empty-cn");
    let (subnet, _roots) = generate(&dir, &["--kind", "two-level"]);
    let cns = write_file(&dir, "cns.txt", "# nothing here\n\n");

    let output = route(&[
        "--subnet",
        subnet.to_str().unwrap(),
        "--cn-guid-file",
        cns.to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("has no valid guids"), "stderr={stderr}");

    let _ = fs::remove_dir_all(&dir);
}
