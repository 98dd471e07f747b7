#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
#![cfg(unix)]
//! Integration tests for moving files into the repository and back out.
mod common;

use std::os::unix::fs::{PermissionsExt, symlink};
use std::sync::Arc;

use common::TestContextBuilder;
use dotlink::error::LinkError;
use dotlink::logging::Level;
use dotlink::tasks::{Confirm, adopt, create_links, orphan, status};

#[derive(Debug)]
struct Decline;

impl Confirm for Decline {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

fn mode(path: &std::path::Path) -> u32 {
    std::fs::metadata(path).unwrap().permissions().mode() & 0o7777
}

// ---------------------------------------------------------------------------
// adopt
// ---------------------------------------------------------------------------

#[test]
fn adopt_moves_file_and_leaves_link() {
    let t = TestContextBuilder::new()
        .with_home_file(".newrc", "set -o vi\n")
        .build();
    let (ctx, _log) = t.context();

    let report = adopt(&ctx, &t.home.join(".newrc"), "home").unwrap();

    let dest = t.repo.join("home/.newrc");
    assert_eq!(report.adopted.len(), 1);
    assert_eq!(report.adopted[0].source, dest);
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "set -o vi\n");
    assert_eq!(std::fs::read_link(t.home.join(".newrc")).unwrap(), dest);

    let again = create_links(&ctx).unwrap();
    assert_eq!(again.created, 0);
    assert_eq!(again.already_linked, 1);
}

#[test]
fn adopt_accepts_path_relative_to_home() {
    let t = TestContextBuilder::new()
        .with_home_file(".config/app/settings.ini", "[a]\n")
        .build();
    let (ctx, _log) = t.context();

    adopt(&ctx, std::path::Path::new("~/.config/app/settings.ini"), "home").unwrap();

    assert!(t.repo.join("home/.config/app/settings.ini").is_file());
    assert!(t.home.join(".config/app/settings.ini").is_symlink());
}

#[test]
fn adopt_refuses_existing_destination() {
    let t = TestContextBuilder::new()
        .with_home_file(".bashrc", "local")
        .with_repo_file("home/.bashrc", "repo")
        .build();
    let (ctx, _log) = t.context();

    let err = adopt(&ctx, &t.home.join(".bashrc"), "home").unwrap_err();

    assert!(matches!(err, LinkError::DestinationExists(_)));
    assert_eq!(std::fs::read_to_string(t.home.join(".bashrc")).unwrap(), "local");
    assert_eq!(std::fs::read_to_string(t.repo.join("home/.bashrc")).unwrap(), "repo");
}

#[test]
fn adopt_reports_already_adopted_link() {
    let t = TestContextBuilder::new()
        .with_repo_file("home/.bashrc", "x")
        .build();
    let (ctx, _log) = t.context();
    create_links(&ctx).unwrap();

    let err = adopt(&ctx, &t.home.join(".bashrc"), "home").unwrap_err();

    assert!(matches!(err, LinkError::AlreadyAdopted { .. }));
}

#[test]
fn adopt_rejects_unknown_mapping_and_outside_home() {
    let t = TestContextBuilder::new()
        .with_home_file(".newrc", "x")
        .build();
    let outside = t.root.join("elsewhere.txt");
    std::fs::write(&outside, "x").unwrap();
    let (ctx, _log) = t.context();

    let err = adopt(&ctx, &t.home.join(".newrc"), "nope").unwrap_err();
    assert!(matches!(err, LinkError::UnknownMapping(ref name) if name == "nope"));

    let err = adopt(&ctx, &outside, "home").unwrap_err();
    assert!(matches!(err, LinkError::OutsideHome(_)));
    assert!(outside.is_file());
}

#[test]
fn adopt_directory_mirrors_tree_and_skips_existing() {
    let t = TestContextBuilder::new()
        .with_home_file(".config/tool/a.conf", "a")
        .with_home_file(".config/tool/sub/b.conf", "b")
        .with_home_file(".config/tool/c.conf", "local c")
        .with_repo_file("home/.config/tool/c.conf", "repo c")
        .build();
    let (ctx, log) = t.context();

    let report = adopt(&ctx, &t.home.join(".config/tool"), "home").unwrap();

    assert_eq!(report.adopted.len(), 2);
    assert_eq!(report.skipped, vec![t.home.join(".config/tool/c.conf")]);
    assert!(t.home.join(".config/tool").is_dir());
    assert!(!t.home.join(".config/tool").is_symlink());
    assert!(t.home.join(".config/tool/a.conf").is_symlink());
    assert!(t.home.join(".config/tool/sub/b.conf").is_symlink());
    assert_eq!(
        std::fs::read_to_string(t.repo.join("home/.config/tool/sub/b.conf")).unwrap(),
        "b"
    );
    assert_eq!(
        std::fs::read_to_string(t.home.join(".config/tool/c.conf")).unwrap(),
        "local c"
    );
    assert!(log.contains(Level::Info, "already exists in the repository"));
}

#[test]
fn declined_directory_adoption_changes_nothing() {
    let t = TestContextBuilder::new()
        .with_home_file(".config/tool/a.conf", "a")
        .build();
    let (ctx, _log) = t.context();
    let ctx = ctx.with_confirm(Arc::new(Decline));

    let err = adopt(&ctx, &t.home.join(".config/tool"), "home").unwrap_err();

    assert!(matches!(err, LinkError::Cancelled(_)));
    assert!(!t.home.join(".config/tool/a.conf").is_symlink());
    assert!(!t.repo.join("home").exists());
}

#[test]
fn adopt_dry_run_touches_nothing() {
    let t = TestContextBuilder::new()
        .with_home_file(".newrc", "x")
        .build();
    let (ctx, log) = t.dry_run_context();

    let report = adopt(&ctx, &t.home.join(".newrc"), "home").unwrap();

    assert_eq!(report.adopted.len(), 1);
    assert!(t.home.join(".newrc").is_file());
    assert!(!t.repo.join("home").exists());
    assert_eq!(log.messages(Level::DryRun).len(), 2);
}

// ---------------------------------------------------------------------------
// orphan
// ---------------------------------------------------------------------------

#[test]
fn adopt_then_orphan_restores_identical_file() {
    let t = TestContextBuilder::new()
        .with_home_file(".secretrc", "token = abc\n")
        .build();
    let original = t.home.join(".secretrc");
    std::fs::set_permissions(&original, std::fs::Permissions::from_mode(0o600)).unwrap();
    let (ctx, _log) = t.context();

    adopt(&ctx, &original, "home").unwrap();
    assert!(original.is_symlink());

    let report = orphan(&ctx, &original).unwrap();

    assert_eq!(report.restored, vec![original.clone()]);
    assert!(report.warnings.is_empty());
    let meta = original.symlink_metadata().unwrap();
    assert!(meta.is_file());
    assert_eq!(std::fs::read(&original).unwrap(), b"token = abc\n");
    assert_eq!(mode(&original), 0o600);
    assert!(!t.repo.join("home/.secretrc").exists());
    assert!(status(&ctx).unwrap().is_empty());
}

#[test]
fn orphan_directory_restores_every_link_inside() {
    let t = TestContextBuilder::new()
        .with_repo_file("home/.config/tool/a.conf", "a")
        .with_repo_file("home/.config/tool/sub/b.conf", "b")
        .with_repo_file("home/.bashrc", "keep")
        .build();
    let (ctx, _log) = t.context();
    create_links(&ctx).unwrap();

    let report = orphan(&ctx, &t.home.join(".config/tool")).unwrap();

    assert_eq!(report.restored.len(), 2);
    assert!(t.home.join(".config/tool/a.conf").symlink_metadata().unwrap().is_file());
    assert_eq!(
        std::fs::read_to_string(t.home.join(".config/tool/sub/b.conf")).unwrap(),
        "b"
    );
    assert!(t.home.join(".bashrc").is_symlink());
    assert!(t.repo.join("home/.bashrc").exists());
}

#[test]
fn orphan_unit_directory_keeps_inner_symlinks() {
    let t = TestContextBuilder::new()
        .with_config(
            r#"
[[link_mappings]]
source = "home"
target = "~/"
link_as_unit = [".nvim"]
"#,
        )
        .with_repo_file("home/.nvim/init.lua", "-- init\n")
        .build();
    symlink("init.lua", t.repo.join("home/.nvim/alias.lua")).unwrap();
    let (ctx, _log) = t.context();
    create_links(&ctx).unwrap();
    assert!(t.home.join(".nvim").is_symlink());

    orphan(&ctx, &t.home.join(".nvim")).unwrap();

    let restored = t.home.join(".nvim");
    assert!(restored.symlink_metadata().unwrap().is_dir());
    let alias = restored.join("alias.lua");
    assert!(alias.symlink_metadata().unwrap().is_symlink());
    assert_eq!(std::fs::read_link(&alias).unwrap(), std::path::PathBuf::from("init.lua"));
    assert_eq!(std::fs::read_to_string(&alias).unwrap(), "-- init\n");
    assert!(!t.repo.join("home/.nvim").exists());
}

#[test]
fn orphan_plain_file_is_rejected_without_changes() {
    let t = TestContextBuilder::new()
        .with_home_file("plain.txt", "unchanged")
        .build();
    let (ctx, _log) = t.context();

    let err = orphan(&ctx, &t.home.join("plain.txt")).unwrap_err();

    assert!(matches!(err, LinkError::NotSymlink(_)));
    assert_eq!(
        std::fs::read_to_string(t.home.join("plain.txt")).unwrap(),
        "unchanged"
    );
}

#[test]
fn orphan_rejects_foreign_and_broken_links() {
    let t = TestContextBuilder::new()
        .with_home_file("notes.txt", "mine")
        .build();
    symlink(t.home.join("notes.txt"), t.home.join("foreign")).unwrap();
    symlink(t.repo.join("home/gone"), t.home.join("gone")).unwrap();
    let (ctx, _log) = t.context();

    let err = orphan(&ctx, &t.home.join("foreign")).unwrap_err();
    assert!(matches!(err, LinkError::NotManaged(_)));

    let err = orphan(&ctx, &t.home.join("gone")).unwrap_err();
    assert!(matches!(err, LinkError::TargetMissing { .. }));
    assert!(t.home.join("gone").is_symlink());
}

#[test]
fn orphan_empty_directory_has_no_managed_links() {
    let t = TestContextBuilder::new()
        .with_home_file("dir/file", "x")
        .build();
    let (ctx, _log) = t.context();

    let err = orphan(&ctx, &t.home.join("dir")).unwrap_err();

    assert!(matches!(err, LinkError::NoManagedLinks(_)));
}
