//! Architecture contract tests.

mod support;

use support::architecture::{find_lines_containing, find_non_export_lines_in_mod_files, path_exists};

#[test]
fn domain_has_no_io_or_outer_layer_imports() {
    let hits = find_lines_containing(
        "src/domain",
        &[
            "crate::adapter",
            "crate::infrastructure",
            "crate::application",
            "crate::port",
            "tokio::",
            "std::fs",
            "std::process",
        ],
    );

    assert!(
        hits.is_empty(),
        "found forbidden imports in domain layer: {hits:#?}"
    );
}

#[test]
fn ports_depend_only_on_domain() {
    let hits = find_lines_containing(
        "src/port",
        &["crate::adapter", "crate::application", "crate::infrastructure"],
    );

    assert!(hits.is_empty(), "ports should only know the domain: {hits:#?}");
}

#[test]
fn application_layer_has_no_direct_adapter_imports() {
    let hits = find_lines_containing(
        "src/application",
        &["crate::adapter::", "crate::infrastructure::"],
    );
    assert!(
        hits.is_empty(),
        "application layer should not import adapters directly: {hits:#?}"
    );
}

#[test]
fn application_never_spawns_processes() {
    let hits = find_lines_containing(
        "src/application",
        &["tokio::process", "std::process::Command"],
    );
    assert!(
        hits.is_empty(),
        "commands must go through the executor port: {hits:#?}"
    );
}

#[test]
fn mod_rs_is_export_only() {
    let violations = find_non_export_lines_in_mod_files("src");
    assert!(
        violations.is_empty(),
        "found non-export content in mod.rs files: {violations:#?}"
    );
}

#[test]
fn formation_is_split_by_stage() {
    for file in [
        "src/application/formation/provisioner.rs",
        "src/application/formation/resolver.rs",
        "src/application/formation/mesh.rs",
        "src/application/formation/installer.rs",
        "src/application/formation/joiner.rs",
    ] {
        assert!(path_exists(file), "expected formation stage module `{file}`");
    }
}

#[test]
fn outbound_ports_live_under_port() {
    assert!(path_exists("src/port/outbound/executor.rs"));
    assert!(path_exists("src/port/outbound/state.rs"));
}
