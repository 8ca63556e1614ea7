//! Integration tests for platform-to-artifact resolution.
//!
//! The resolver must be total over every reachable platform tuple and must
//! pick deterministically: one descriptor per tuple, most specific rule
//! first. These tests enumerate the tuples the cascade distinguishes and a
//! few it must fold into defaults.

use std::collections::HashSet;

use uabuild::platform::PlatformTuple;
use uabuild::resolver::resolve;

fn tuples_under_test() -> Vec<(&'static str, PlatformTuple)> {
    vec![
        ("windows", PlatformTuple::windows("x86_64")),
        (
            "ubuntu-18.04",
            PlatformTuple::linux("x86_64", Some("ubuntu"), Some("18.04")),
        ),
        (
            "ubuntu-20.04",
            PlatformTuple::linux("x86_64", Some("ubuntu"), Some("20.04")),
        ),
        (
            "ubuntu-unknown-version",
            PlatformTuple::linux("x86_64", Some("ubuntu"), None),
        ),
        (
            "debian",
            PlatformTuple::linux("x86_64", Some("debian"), Some("10")),
        ),
        (
            "rhel",
            PlatformTuple::linux("x86_64", Some("rhel"), Some("8.4")),
        ),
        ("unknown-distro", PlatformTuple::linux("x86_64", None, None)),
    ]
}

#[test]
fn every_tuple_resolves() {
    for (label, tuple) in tuples_under_test() {
        let descriptor = resolve(&tuple);
        assert!(
            descriptor.remote_url.starts_with("https://"),
            "{label}: bad URL {}",
            descriptor.remote_url
        );
        assert!(
            !descriptor.archive_file_name.is_empty(),
            "{label}: empty archive name"
        );
    }
}

#[test]
fn resolution_is_deterministic() {
    for (label, tuple) in tuples_under_test() {
        assert_eq!(resolve(&tuple), resolve(&tuple), "{label}");
    }
}

#[test]
fn distro_branches_yield_distinct_artifacts() {
    // ubuntu 18.04, modern ubuntu, debian, and rhel must all download
    // different archives.
    let urls: HashSet<String> = [
        PlatformTuple::linux("x86_64", Some("ubuntu"), Some("18.04")),
        PlatformTuple::linux("x86_64", Some("ubuntu"), Some("20.04")),
        PlatformTuple::linux("x86_64", Some("debian"), Some("10")),
        PlatformTuple::linux("x86_64", Some("rhel"), Some("8.4")),
    ]
    .iter()
    .map(|t| resolve(t).remote_url)
    .collect();

    assert_eq!(urls.len(), 4, "Linux distro branches must not collide");
}

#[test]
fn windows_differs_from_every_linux_branch() {
    let windows = resolve(&PlatformTuple::windows("x86_64"));
    for (label, tuple) in tuples_under_test() {
        if label == "windows" {
            continue;
        }
        let linux = resolve(&tuple);
        assert_ne!(windows.remote_url, linux.remote_url, "{label}");
        assert_ne!(
            windows.local_relative_path, linux.local_relative_path,
            "{label}: Windows uses an import library, Linux a static archive"
        );
    }
}

#[test]
fn modern_ubuntu_is_not_the_1804_artifact() {
    let focal = resolve(&PlatformTuple::linux("x86_64", Some("ubuntu"), Some("20.04")));
    let bionic = resolve(&PlatformTuple::linux("x86_64", Some("ubuntu"), Some("18.04")));
    assert_ne!(focal.remote_url, bionic.remote_url);
    assert!(focal.remote_url.contains("ubuntu2004"));
}

#[test]
fn unknown_distro_gets_the_documented_generic_fallback() {
    let unknown = resolve(&PlatformTuple::linux("x86_64", Some("gentoo"), Some("2.14")));
    let modern_ubuntu = resolve(&PlatformTuple::linux("x86_64", Some("ubuntu"), Some("22.04")));
    assert_eq!(unknown, modern_ubuntu);
}
