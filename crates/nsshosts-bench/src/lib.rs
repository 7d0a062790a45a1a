//! Benchmark support crate for nsshosts.
//!
//! Run benchmarks with: `cargo bench -p nsshosts-bench`

/// Synthetic hosts file with `entries` IPv4 lines followed by the same number
/// of IPv6 lines. Entry `i` is named `host-i` with aliases `alias-i-a` and
/// `alias-i-b`.
pub fn synthetic_hosts(entries: usize) -> String {
    let mut text = String::from("# generated\n");
    for i in 0..entries {
        text.push_str(&format!(
            "10.{}.{}.{} host-{i} alias-{i}-a alias-{i}-b\n",
            (i >> 16) & 0xff,
            (i >> 8) & 0xff,
            i & 0xff
        ));
    }
    for i in 0..entries {
        text.push_str(&format!("fd00::{i:x} host-{i} v6-{i}\n"));
    }
    text
}
