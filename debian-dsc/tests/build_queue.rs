// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Processing an incoming queue of source packages end to end.

use {
    debian_dsc::{
        architecture::Architecture,
        build_order::BuildOrderResolver,
        debian_source_control::DebianSourceControlFile,
        debian_source_package_list::DebianSourcePackageList,
        error::{DebianError, Result},
        io::{digest_reader, ChecksumType},
    },
    std::path::Path,
};

/// A detached signature block from a throwaway key. Only the framing is parsed.
const SIGNATURE: &str = "-----BEGIN PGP SIGNATURE-----

iQEzBAEBCAAdFiEEn75aYUJoF4y9p1cTyFfKVNdXAZIFAmrRyv0ACgkQyFfKVNdX
AZK2SAf+M7878cW2JYkVQ+ebBPTTRrwlC+7SRQvLW3yye7AiKv7ybOXLYjoRDRLN
DBIwtPh8I7A85bsv/voBivmhdMgPtlesbE3Utpz1ZmTebMW8aSN4UD/xz6uYbEPj
y02QGDx7xi59BSGheRI3AFIPirWDFEacM/THIWShoHz4yjmE/xIuiPtXr9C700IO
grBGPusFc2yx32YI4uRnGEnZIdcHWMsEw4IvAgQepUjp3cjvXUtDcplz7yu7x01N
XE1Ej+zX9tCxWAWHGO8J+bkeSpowmV4DhC4vzk2pwpuE3HkOcCxs+bfNNyhiqBl0
ZIXSH74bJ++vCQieFlRZmIUIJAYDrg==
=6xF0
-----END PGP SIGNATURE-----
";

/// Write a source package with one tarball into `dir`, returning the `.dsc` path.
fn write_source_package(
    dir: &Path,
    source: &str,
    binaries: &str,
    build_depends: &str,
) -> Result<std::path::PathBuf> {
    let tarball = format!("{}_1.0.tar.xz", source);
    let content = format!("contents of {}", source);
    std::fs::write(dir.join(&tarball), &content)?;

    let (size, digest) = digest_reader(ChecksumType::Md5, content.as_bytes())?;

    let dsc = format!(
        "-----BEGIN PGP SIGNED MESSAGE-----\n\
         Hash: SHA256\n\
         \n\
         Format: 3.0 (native)\n\
         Source: {source}\n\
         Binary: {binaries}\n\
         Architecture: any\n\
         Version: 1.0\n\
         Maintainer: Queue Test <queue@example.com>\n\
         Build-Depends: {build_depends}\n\
         Files:\n \
         {digest} {size} {tarball}\n\
         {signature}",
        source = source,
        binaries = binaries,
        build_depends = build_depends,
        digest = digest.digest_hex(),
        size = size,
        tarball = tarball,
        signature = SIGNATURE,
    );

    let path = dir.join(format!("{}_1.0.dsc", source));
    std::fs::write(&path, dsc)?;

    Ok(path)
}

#[test]
fn parse_resolve_and_publish() -> Result<()> {
    let incoming = tempfile::tempdir()?;
    let accepted = tempfile::tempdir()?;

    let paths = vec![
        write_source_package(incoming.path(), "app", "app", "libnet-dev, debhelper")?,
        write_source_package(incoming.path(), "net", "libnet1, libnet-dev", "libcore-dev")?,
        write_source_package(incoming.path(), "core", "libcore-dev", "debhelper")?,
    ];

    let packages = paths
        .iter()
        .map(DebianSourceControlFile::from_path)
        .collect::<Result<DebianSourcePackageList>>()?;

    for cf in packages.iter() {
        cf.verify_files()?;
    }

    let resolver = BuildOrderResolver::new(Architecture::parse("amd64")?);
    let ordered = packages.into_build_order(&resolver)?;

    assert_eq!(
        ordered.iter().map(|cf| cf.source()).collect::<Vec<_>>(),
        vec!["core", "net", "app"]
    );

    for mut cf in ordered {
        cf.move_to(accepted.path())?;

        assert!(cf.path().starts_with(accepted.path()));
        cf.verify_files()?;
    }

    assert_eq!(std::fs::read_dir(incoming.path())?.count(), 0);
    assert_eq!(std::fs::read_dir(accepted.path())?.count(), 6);

    Ok(())
}

#[test]
fn corrupt_artifact_is_detected() -> Result<()> {
    let incoming = tempfile::tempdir()?;

    let path = write_source_package(incoming.path(), "core", "libcore-dev", "make")?;
    std::fs::write(incoming.path().join("core_1.0.tar.xz"), "tampered contents!")?;

    let cf = DebianSourceControlFile::from_path(&path)?;

    assert!(matches!(
        cf.verify_files(),
        Err(DebianError::SizeMismatch { .. }) | Err(DebianError::DigestMismatch { .. })
    ));

    Ok(())
}
