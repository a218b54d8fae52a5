mod common;

use libinflate::notices::{
    MAX_ASSET_LEN, NoticesError, PackageCheck, PackagePolicy, asset_path, load_notices,
};
use std::fs;
use std::path::PathBuf;

/// Lays out `<tmp>/<name>/app` with the compressed notices next to it.
fn bundle(name: &str, notices: &[u8]) -> PathBuf {
    let root = std::env::temp_dir().join(format!("libinflate-{}-{}", name, std::process::id()));
    let exe = root.join("app");
    let asset = asset_path(&exe).unwrap();
    fs::create_dir_all(asset.parent().unwrap()).unwrap();
    fs::write(&asset, notices).unwrap();
    exe
}

fn notices_text(packages: &[&[&str]]) -> String {
    let rule = "-".repeat(80);
    packages
        .iter()
        .map(|names| format!("{}\n\nPermission is hereby granted...\n", names.join("\n")))
        .collect::<Vec<_>>()
        .join(&format!("{}\n", rule))
}

#[test]
fn test_clean_bundle_is_memoized() {
    let text = notices_text(&[&["media_kit", "media_kit_video"], &["http"], &["media_kit_libs_linux"]]);
    let exe = bundle("clean", &common::zlib(text.as_bytes(), 9));

    assert_eq!(load_notices(&asset_path(&exe).unwrap()).unwrap(), text);

    let check = PackageCheck::new(PackagePolicy::default());
    assert!(check.run(&exe).unwrap().is_clean());

    // A later scan returns the memoized report without touching the asset.
    fs::remove_file(asset_path(&exe).unwrap()).unwrap();
    assert!(check.run(&exe).unwrap().is_clean());
}

#[test]
fn test_violations_are_reported() {
    let text = notices_text(&[&["media_kit", "media_kit_core_video"], &["fancy_videoplayer"]]);
    let exe = bundle("dirty", &common::zlib(text.as_bytes(), 6));

    let check = PackageCheck::default();
    let report = check.run(&exe).unwrap();
    assert_eq!(report.unsupported.iter().collect::<Vec<_>>(), ["media_kit_core_video"]);
    assert_eq!(report.incompatible.iter().collect::<Vec<_>>(), ["fancy_videoplayer"]);
    assert!(report.to_string().contains("    * media_kit_core_video\n"));

    // Dirty reports are not memoized.
    fs::remove_file(asset_path(&exe).unwrap()).unwrap();
    assert!(matches!(check.run(&exe), Err(NoticesError::Io(_))));
}

#[test]
fn test_corrupt_asset() {
    let mut stream = common::zlib(notices_text(&[&["media_kit"]]).as_bytes(), 6);
    let last = stream.len() - 1;
    stream[last] ^= 0x01;
    let exe = bundle("corrupt", &stream);
    assert!(matches!(
        PackageCheck::default().run(&exe),
        Err(NoticesError::Inflate(libinflate::InflateError::ChecksumMismatch { .. }))
    ));
}

#[test]
fn test_executable_without_parent() {
    assert!(matches!(
        PackageCheck::default().run(std::path::Path::new("/")),
        Err(NoticesError::InvalidExecutablePath(_))
    ));
}

#[test]
fn test_oversized_asset_rejected() {
    let exe = bundle("oversized", &vec![0u8; MAX_ASSET_LEN + 1]);
    let asset = asset_path(&exe).unwrap();
    assert!(matches!(
        load_notices(&asset),
        Err(NoticesError::AssetTooLarge { len, max }) if len == MAX_ASSET_LEN + 1 && max == MAX_ASSET_LEN
    ));
    assert!(matches!(
        PackageCheck::default().run(&exe),
        Err(NoticesError::AssetTooLarge { .. })
    ));

    // Exactly at the limit the size check passes and the content is judged.
    fs::write(&asset, vec![0u8; MAX_ASSET_LEN]).unwrap();
    assert!(matches!(
        load_notices(&asset),
        Err(NoticesError::Inflate(libinflate::InflateError::UnsupportedMethod(0)))
    ));
}
