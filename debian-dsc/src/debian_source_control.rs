// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Debian source control files (`.dsc`). */

use {
    crate::{
        architecture::Architecture,
        control::{ControlParagraph, ControlParagraphReader},
        dependency::{DependencyList, SingleDependency},
        error::{DebianError, Result},
        field_table::{decode_paragraph, Cardinality, Delimiter, FieldSpec, FieldValue},
        io::{digest_path, ChecksumType, ContentDigest},
        package_version::PackageVersion,
    },
    pgp_cleartext::{CleartextSignatureReader, CleartextSignatures},
    std::{
        fmt::{Debug, Formatter},
        io::Read,
        path::{Path, PathBuf},
        str::FromStr,
        sync::Arc,
    },
};

const PGP_SIGNED_MESSAGE: &[u8] = b"-----BEGIN PGP SIGNED MESSAGE-----";

/// A single file as described by a `Files` or `Checksums-*` field in a [DebianSourceControlFile].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DebianSourceControlFileEntry {
    /// The filename, relative to the directory holding the `.dsc`.
    pub filename: String,

    /// The content digest of this file.
    pub digest: ContentDigest,

    /// The size in bytes of the file.
    pub size: u64,
}

impl DebianSourceControlFileEntry {
    /// Parse a `<digest> <size> <filename>` line.
    pub fn parse_line(checksum: ChecksumType, line: &str) -> Result<Self> {
        let mut parts = line.split_ascii_whitespace();

        let digest = parts
            .next()
            .ok_or(DebianError::ChecksumEntryMissingDigest)?;
        let size = parts.next().ok_or(DebianError::ChecksumEntryMissingSize)?;
        let filename = parts.next().ok_or(DebianError::ChecksumEntryMissingPath)?;

        if parts.next().is_some() {
            return Err(DebianError::ChecksumEntryPathWithSpaces(line.to_string()));
        }

        Ok(Self {
            filename: filename.to_string(),
            digest: ContentDigest::from_hex_digest(checksum, digest)?,
            size: u64::from_str(size)?,
        })
    }
}

/// Describes a single binary package entry in a `Package-List` field in a [DebianSourceControlFile].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DebianSourceControlFilePackage {
    /// The name of the binary package.
    pub name: String,
    /// The package type.
    pub package_type: String,
    /// The section it appears in.
    pub section: String,
    /// The package priority.
    pub priority: String,
    /// Extra fields.
    pub extra: Vec<String>,
}

impl DebianSourceControlFilePackage {
    fn parse_line(line: &str) -> Result<Self> {
        let mut words = line.split_ascii_whitespace().map(|x| x.to_string());

        let name = words
            .next()
            .ok_or(DebianError::ControlPackageListMissingField("name"))?;
        let package_type = words
            .next()
            .ok_or(DebianError::ControlPackageListMissingField("type"))?;
        let section = words
            .next()
            .ok_or(DebianError::ControlPackageListMissingField("section"))?;
        let priority = words
            .next()
            .ok_or(DebianError::ControlPackageListMissingField("priority"))?;

        Ok(Self {
            name,
            package_type,
            section,
            priority,
            extra: words.collect(),
        })
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum SourceField {
    Format,
    Source,
    Binary,
    Architecture,
    Version,
    Origin,
    Maintainer,
    Uploaders,
    Homepage,
    StandardsVersion,
    BuildDepends,
    BuildDependsArch,
    BuildDependsIndep,
    ChecksumsSha1,
    ChecksumsSha256,
    Files,
    PackageList,
}

const SOURCE_CONTROL_FIELDS: &[FieldSpec<SourceField>] = &[
    FieldSpec::new("Format", Cardinality::Optional, Delimiter::None, SourceField::Format),
    FieldSpec::new("Source", Cardinality::One, Delimiter::None, SourceField::Source),
    FieldSpec::new("Binary", Cardinality::Many, Delimiter::Comma, SourceField::Binary),
    FieldSpec::new(
        "Architecture",
        Cardinality::Many,
        Delimiter::Whitespace,
        SourceField::Architecture,
    ),
    FieldSpec::new("Version", Cardinality::One, Delimiter::None, SourceField::Version),
    FieldSpec::new("Origin", Cardinality::Optional, Delimiter::None, SourceField::Origin),
    FieldSpec::new(
        "Maintainer",
        Cardinality::One,
        Delimiter::None,
        SourceField::Maintainer,
    ),
    FieldSpec::new(
        "Uploaders",
        Cardinality::Many,
        Delimiter::Comma,
        SourceField::Uploaders,
    ),
    FieldSpec::new(
        "Homepage",
        Cardinality::Optional,
        Delimiter::None,
        SourceField::Homepage,
    ),
    FieldSpec::new(
        "Standards-Version",
        Cardinality::Optional,
        Delimiter::None,
        SourceField::StandardsVersion,
    ),
    FieldSpec::new(
        "Build-Depends",
        Cardinality::Optional,
        Delimiter::None,
        SourceField::BuildDepends,
    ),
    FieldSpec::new(
        "Build-Depends-Arch",
        Cardinality::Optional,
        Delimiter::None,
        SourceField::BuildDependsArch,
    ),
    FieldSpec::new(
        "Build-Depends-Indep",
        Cardinality::Optional,
        Delimiter::None,
        SourceField::BuildDependsIndep,
    ),
    FieldSpec::new(
        "Checksums-Sha1",
        Cardinality::Many,
        Delimiter::Newline,
        SourceField::ChecksumsSha1,
    ),
    FieldSpec::new(
        "Checksums-Sha256",
        Cardinality::Many,
        Delimiter::Newline,
        SourceField::ChecksumsSha256,
    ),
    FieldSpec::new("Files", Cardinality::Many, Delimiter::Newline, SourceField::Files),
    FieldSpec::new(
        "Package-List",
        Cardinality::Many,
        Delimiter::Newline,
        SourceField::PackageList,
    ),
];

/// A Debian source control file.
///
/// This control file consists of a single paragraph and defines a source package.
/// This paragraph is typically found in `.dsc` files and in `Sources` files in repositories.
///
/// The fields are defined at
/// <https://www.debian.org/doc/debian-policy/ch-controlfields.html#debian-source-control-files-dsc>.
///
/// Instances are bound to the filesystem path of the control file. Files referenced by the
/// `Files` and `Checksums-*` fields are resolved relative to the directory containing that
/// path. The path is the only state changed after construction, by
/// [Self::copy_to()] and [Self::move_to()].
#[derive(Clone, Debug)]
pub struct DebianSourceControlFile {
    path: PathBuf,
    paragraph: ControlParagraph<'static>,
    format: Option<String>,
    source: String,
    binaries: Vec<String>,
    architectures: Vec<Architecture>,
    version: PackageVersion,
    origin: Option<String>,
    maintainer: String,
    uploaders: Vec<String>,
    homepage: Option<String>,
    standards_version: Option<String>,
    build_depends: DependencyList,
    build_depends_arch: DependencyList,
    build_depends_indep: DependencyList,
    checksums_sha1: Vec<DebianSourceControlFileEntry>,
    checksums_sha256: Vec<DebianSourceControlFileEntry>,
    files: Vec<DebianSourceControlFileEntry>,
    package_list: Vec<DebianSourceControlFilePackage>,
    signatures: Option<SignatureState>,
}

/// Shares parsed signatures between clones of a control file.
#[derive(Clone)]
struct SignatureState(Arc<CleartextSignatures>);

impl Debug for SignatureState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CleartextSignatures")
            .field("count", &self.0.iter_signatures().count())
            .finish()
    }
}

impl DebianSourceControlFile {
    /// Construct an instance from a parsed paragraph and the path it was read from.
    pub fn from_paragraph(
        paragraph: ControlParagraph<'static>,
        path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let mut format = None;
        let mut source = String::new();
        let mut binaries = vec![];
        let mut architectures = vec![];
        let mut version = None;
        let mut origin = None;
        let mut maintainer = String::new();
        let mut uploaders = vec![];
        let mut homepage = None;
        let mut standards_version = None;
        let mut build_depends = DependencyList::default();
        let mut build_depends_arch = DependencyList::default();
        let mut build_depends_indep = DependencyList::default();
        let mut checksums_sha1 = vec![];
        let mut checksums_sha256 = vec![];
        let mut files = vec![];
        let mut package_list = vec![];

        let owned = |v: &FieldValue| v.as_single().unwrap_or_default().to_string();
        let owned_list = |v: FieldValue| {
            v.into_list()
                .into_iter()
                .map(|x| x.to_string())
                .collect::<Vec<_>>()
        };
        let entries = |checksum: ChecksumType, v: FieldValue| {
            v.into_list()
                .into_iter()
                .map(|line| DebianSourceControlFileEntry::parse_line(checksum, line))
                .collect::<Result<Vec<_>>>()
        };

        for (slot, value) in decode_paragraph(&paragraph, SOURCE_CONTROL_FIELDS)? {
            match slot {
                SourceField::Format => format = Some(owned(&value)),
                SourceField::Source => source = owned(&value),
                SourceField::Binary => binaries = owned_list(value),
                SourceField::Architecture => {
                    architectures = value
                        .into_list()
                        .into_iter()
                        .map(Architecture::parse)
                        .collect::<Result<Vec<_>>>()?;
                }
                SourceField::Version => {
                    version = Some(PackageVersion::parse(value.as_single().unwrap_or_default())?);
                }
                SourceField::Origin => origin = Some(owned(&value)),
                SourceField::Maintainer => maintainer = owned(&value),
                SourceField::Uploaders => uploaders = owned_list(value),
                SourceField::Homepage => homepage = Some(owned(&value)),
                SourceField::StandardsVersion => standards_version = Some(owned(&value)),
                SourceField::BuildDepends => {
                    build_depends = DependencyList::parse(value.as_single().unwrap_or_default())?;
                }
                SourceField::BuildDependsArch => {
                    build_depends_arch =
                        DependencyList::parse(value.as_single().unwrap_or_default())?;
                }
                SourceField::BuildDependsIndep => {
                    build_depends_indep =
                        DependencyList::parse(value.as_single().unwrap_or_default())?;
                }
                SourceField::ChecksumsSha1 => checksums_sha1 = entries(ChecksumType::Sha1, value)?,
                SourceField::ChecksumsSha256 => {
                    checksums_sha256 = entries(ChecksumType::Sha256, value)?
                }
                SourceField::Files => files = entries(ChecksumType::Md5, value)?,
                SourceField::PackageList => {
                    package_list = value
                        .into_list()
                        .into_iter()
                        .map(DebianSourceControlFilePackage::parse_line)
                        .collect::<Result<Vec<_>>>()?;
                }
            }
        }

        if source.is_empty() {
            return Err(DebianError::DebianSourceControlEmptySource);
        }

        let version =
            version.ok_or_else(|| DebianError::ControlRequiredFieldMissing("Version".into()))?;

        Ok(Self {
            path: path.into(),
            paragraph,
            format,
            source,
            binaries,
            architectures,
            version,
            origin,
            maintainer,
            uploaders,
            homepage,
            standards_version,
            build_depends,
            build_depends_arch,
            build_depends_indep,
            checksums_sha1,
            checksums_sha256,
            files,
            package_list,
            signatures: None,
        })
    }

    /// Construct an instance by reading data from a reader.
    ///
    /// The source must be a Debian source control file with exactly 1 paragraph. It may be
    /// wrapped in a PGP cleartext signature (`-----BEGIN PGP SIGNED MESSAGE-----`), in which
    /// case the parsed signatures are available via [Self::signatures()].
    ///
    /// The PGP signature is NOT validated. The file will be parsed despite lack of
    /// signature verification.
    ///
    /// `path` is recorded as the location of the control file.
    pub fn from_reader<R: Read>(mut reader: R, path: impl Into<PathBuf>) -> Result<Self> {
        let mut data = vec![];
        reader.read_to_end(&mut data)?;

        let start = data
            .iter()
            .position(|b| !b.is_ascii_whitespace())
            .unwrap_or(data.len());
        let data = &data[start..];

        let (text, signatures) = if data.starts_with(PGP_SIGNED_MESSAGE) {
            let mut reader = CleartextSignatureReader::new(data);
            let mut text = String::new();
            reader.read_to_string(&mut text)?;

            (text, Some(SignatureState(Arc::new(reader.finalize()))))
        } else {
            let text = std::str::from_utf8(data)
                .map_err(|e| DebianError::ControlParseError(format!("invalid UTF-8: {}", e)))?;

            (text.to_string(), None)
        };

        let mut paragraphs = ControlParagraphReader::new(std::io::Cursor::new(text.as_bytes()))
            .collect::<Result<Vec<_>>>()?;

        if paragraphs.len() != 1 {
            return Err(DebianError::DebianSourceControlFileParagraphMismatch(
                paragraphs.len(),
            ));
        }

        let paragraph = paragraphs.remove(0);

        let mut slf = Self::from_paragraph(paragraph, path)?;
        slf.signatures = signatures;

        Ok(slf)
    }

    /// Construct an instance by reading a `.dsc` file from the filesystem.
    ///
    /// Relative paths are made absolute against the current directory so later
    /// transfers are unaffected by directory changes.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let fh = std::fs::File::open(&path).map_err(|e| DebianError::io_transfer(&path, e))?;

        Self::from_reader(fh, path)
    }

    /// The filesystem path of the control file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn set_path(&mut self, path: PathBuf) {
        self.path = path;
    }

    /// PGP signatures from the cleartext signature wrapping the control file, if any.
    ///
    /// Signatures are parsed but not verified.
    pub fn signatures(&self) -> Option<&CleartextSignatures> {
        self.signatures.as_ref().map(|s| s.0.as_ref())
    }

    /// The paragraph this instance was constructed from.
    ///
    /// Fields without a typed accessor can be read from here.
    pub fn paragraph(&self) -> &ControlParagraph<'static> {
        &self.paragraph
    }

    /// The format of the source package.
    ///
    /// See <https://www.debian.org/doc/debian-policy/ch-controlfields.html#s-f-format>.
    pub fn format(&self) -> Option<&str> {
        self.format.as_deref()
    }

    /// The name of the source package.
    ///
    /// See <https://www.debian.org/doc/debian-policy/ch-controlfields.html#s-f-source>.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The binary packages this source package produces.
    ///
    /// See <https://www.debian.org/doc/debian-policy/ch-controlfields.html#s-f-binary>.
    pub fn binaries(&self) -> impl Iterator<Item = &str> {
        self.binaries.iter().map(|x| x.as_str())
    }

    /// The architectures this source package will build for.
    ///
    /// See <https://www.debian.org/doc/debian-policy/ch-controlfields.html#s-f-architecture>.
    pub fn architectures(&self) -> &[Architecture] {
        &self.architectures
    }

    /// The parsed version of the source package.
    pub fn version(&self) -> &PackageVersion {
        &self.version
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// The package maintainer.
    pub fn maintainer(&self) -> &str {
        &self.maintainer
    }

    /// The list of uploaders and co-maintainers.
    pub fn uploaders(&self) -> impl Iterator<Item = &str> {
        self.uploaders.iter().map(|x| x.as_str())
    }

    pub fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref()
    }

    pub fn standards_version(&self) -> Option<&str> {
        self.standards_version.as_deref()
    }

    /// The `Build-Depends` field.
    pub fn build_depends(&self) -> &DependencyList {
        &self.build_depends
    }

    /// The `Build-Depends-Arch` field.
    pub fn build_depends_arch(&self) -> &DependencyList {
        &self.build_depends_arch
    }

    /// The `Build-Depends-Indep` field.
    pub fn build_depends_indep(&self) -> &DependencyList {
        &self.build_depends_indep
    }

    /// List of associated files with MD5 checksums.
    ///
    /// This is the authoritative list of files making up the source package.
    pub fn files(&self) -> &[DebianSourceControlFileEntry] {
        &self.files
    }

    /// List of associated files with SHA-1 checksums.
    pub fn checksums_sha1(&self) -> &[DebianSourceControlFileEntry] {
        &self.checksums_sha1
    }

    /// List of associated files with SHA-256 checksums.
    pub fn checksums_sha256(&self) -> &[DebianSourceControlFileEntry] {
        &self.checksums_sha256
    }

    /// Packages that can be built from this source package.
    ///
    /// See <https://www.debian.org/doc/debian-policy/ch-controlfields.html#s-f-package-list>.
    pub fn package_list(&self) -> &[DebianSourceControlFilePackage] {
        &self.package_list
    }

    /// Whether any architecture is exactly `all`, meaning architecture independent
    /// binaries are built.
    pub fn has_arch_all(&self) -> bool {
        self.architectures.iter().any(|a| a.is_all())
    }

    /// Everybody responsible for the package.
    ///
    /// The first element is always the maintainer, followed by uploaders in order.
    pub fn maintainers(&self) -> Vec<&str> {
        std::iter::once(self.maintainer.as_str())
            .chain(self.uploaders())
            .collect()
    }

    /// Concrete build dependency alternatives that apply to `arch`.
    ///
    /// `Build-Depends`, `Build-Depends-Arch` and `Build-Depends-Indep` are consulted in that
    /// order. Every alternative of a `|` group is emitted.
    pub fn build_dependency_candidates<'a>(
        &'a self,
        arch: &'a Architecture,
    ) -> impl Iterator<Item = &'a SingleDependency> + 'a {
        self.build_depends
            .possibilities(arch)
            .chain(self.build_depends_arch.possibilities(arch))
            .chain(self.build_depends_indep.possibilities(arch))
    }

    /// Verify files referenced by this control file against their recorded size and digests.
    ///
    /// Every `Files` entry is checked with MD5. `Checksums-Sha256` entries are checked too.
    /// The first failure is returned.
    pub fn verify_files(&self) -> Result<()> {
        for (path, entry) in self
            .resolve_artifact_paths()
            .into_iter()
            .chain(self.resolve_paths(&self.checksums_sha256))
        {
            let (size, digest) = digest_path(entry.digest.checksum_type(), &path)?;

            if size != entry.size {
                return Err(DebianError::SizeMismatch {
                    path,
                    expected: entry.size,
                    actual: size,
                });
            }

            if digest != entry.digest {
                return Err(DebianError::DigestMismatch {
                    path,
                    expected: entry.digest.digest_hex(),
                    actual: digest.digest_hex(),
                });
            }

            log::debug!("verified {}", path.display());
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use {super::*, indoc::indoc};

    const ZSTD_DSC: &[u8] = include_bytes!("testdata/libzstd_1.4.8+dfsg-3.dsc");

    #[test]
    fn parse_cleartext_armored() -> Result<()> {
        let cf = DebianSourceControlFile::from_reader(ZSTD_DSC, "/pool/libzstd.dsc")?;

        assert_eq!(cf.path(), Path::new("/pool/libzstd.dsc"));
        assert_eq!(
            cf.signatures().map(|s| s.iter_signatures().count()),
            Some(1)
        );
        assert_eq!(cf.format(), Some("3.0 (quilt)"));
        assert_eq!(cf.source(), "libzstd");
        assert_eq!(
            cf.binaries().collect::<Vec<_>>(),
            vec!["libzstd-dev", "libzstd1", "zstd", "libzstd1-udeb"]
        );
        assert_eq!(cf.architectures(), &[Architecture::any()]);
        assert!(!cf.has_arch_all());
        assert_eq!(cf.version().to_string(), "1.4.8+dfsg-3");
        assert_eq!(
            cf.maintainers(),
            vec![
                "Debian Med Packaging Team <debian-med-packaging@lists.alioth.debian.org>",
                "Kevin Murray <kdmfoss@gmail.com>",
                "Olivier Sallou <osallou@debian.org>",
                "Alexandre Mestiashvili <mestia@debian.org>",
            ]
        );
        assert_eq!(cf.homepage(), Some("https://github.com/facebook/zstd"));
        assert_eq!(cf.standards_version(), Some("4.6.0"));
        assert_eq!(cf.origin(), None);
        assert_eq!(cf.paragraph().field_str("Testsuite"), Some("autopkgtest"));
        assert_eq!(cf.build_depends().requirements().count(), 5);
        assert!(cf.build_depends_arch().is_empty());

        assert_eq!(cf.package_list().len(), 4);
        assert_eq!(
            cf.package_list()[2],
            DebianSourceControlFilePackage {
                name: "libzstd1-udeb".into(),
                package_type: "udeb".into(),
                section: "debian-installer".into(),
                priority: "optional".into(),
                extra: vec!["arch=any".into()],
            }
        );

        assert_eq!(
            cf.files(),
            &[
                DebianSourceControlFileEntry {
                    filename: "libzstd_1.4.8+dfsg.orig.tar.xz".into(),
                    digest: ContentDigest::md5_hex("943bed8b8d98a50c8d8a101b12693bb4")?,
                    size: 1331996,
                },
                DebianSourceControlFileEntry {
                    filename: "libzstd_1.4.8+dfsg-3.debian.tar.xz".into(),
                    digest: ContentDigest::md5_hex("4d2692830e1f481ce769e2dd24cbc9db")?,
                    size: 12184,
                }
            ]
        );
        assert_eq!(cf.checksums_sha1().len(), 2);
        assert_eq!(
            cf.checksums_sha256()[1].digest,
            ContentDigest::sha256_hex(
                "fecd87a469d5a07b6deeeef53ed24b2f1a74ee097ce11528fe3b58540f05c147"
            )?
        );

        Ok(())
    }

    #[test]
    fn arch_all_and_candidates() -> Result<()> {
        let cf = DebianSourceControlFile::from_reader(
            indoc! {"
                Source: foo
                Version: 1.0-1
                Maintainer: A <a@example.com>
                Architecture: amd64 all
                Build-Depends: libc-dev, libwin [!linux-any]
                Build-Depends-Arch: libarch-dev [amd64] | libalt-dev
                Build-Depends-Indep: ${misc:Depends}, python3-sphinx
            "}
            .as_bytes(),
            "foo.dsc",
        )?;

        assert!(cf.has_arch_all());
        assert!(cf.signatures().is_none());
        assert_eq!(cf.maintainers(), vec!["A <a@example.com>"]);
        assert!(cf.files().is_empty());

        let amd64 = Architecture::parse("amd64")?;
        assert_eq!(
            cf.build_dependency_candidates(&amd64)
                .map(|d| d.package.as_str())
                .collect::<Vec<_>>(),
            vec!["libc-dev", "libarch-dev", "libalt-dev", "python3-sphinx"]
        );

        Ok(())
    }

    #[test]
    fn parse_errors() {
        let parse = |s: &str| DebianSourceControlFile::from_reader(s.as_bytes(), "x.dsc");

        assert!(matches!(
            parse("Version: 1.0\nMaintainer: a\n"),
            Err(DebianError::ControlRequiredFieldMissing(f)) if f == "Source"
        ));
        assert!(matches!(
            parse("Source:\nVersion: 1.0\nMaintainer: a\n"),
            Err(DebianError::DebianSourceControlEmptySource)
        ));
        assert!(matches!(
            parse("Source: a\nVersion: 1.0\nMaintainer: a\n\nSource: b\n"),
            Err(DebianError::DebianSourceControlFileParagraphMismatch(2))
        ));
        assert!(matches!(
            parse("Source: a\nVersion: 1.0\nMaintainer: a\nFiles:\n abcd 12\n"),
            Err(DebianError::ChecksumEntryMissingPath)
        ));
        assert!(matches!(
            parse("Source: a\nVersion: 1.0\nMaintainer: a\nFiles:\n abcd 12 a b\n"),
            Err(DebianError::ChecksumEntryPathWithSpaces(_))
        ));
        assert!(matches!(
            parse("Source: a\nVersion: 1.0\nMaintainer: a\nBuild-Depends: (>= 1)\n"),
            Err(DebianError::DependencyParse(_))
        ));

        // Cleartext framing requires at least one Hash header.
        assert!(matches!(
            parse("-----BEGIN PGP SIGNED MESSAGE-----\n\nSource: a\nVersion: 1.0\nMaintainer: a\n"),
            Err(DebianError::Io(_))
        ));
        assert!(matches!(
            DebianSourceControlFile::from_reader(&b"Source: a\xff\n"[..], "x.dsc"),
            Err(DebianError::ControlParseError(_))
        ));
    }

    #[test]
    fn verify_files_on_disk() -> Result<()> {
        let td = tempfile::tempdir()?;

        std::fs::write(td.path().join("foo_1.0.orig.tar.gz"), b"hello world")?;

        let dsc = indoc! {"
            Source: foo
            Version: 1.0
            Maintainer: A <a@example.com>
            Files:
             5eb63bbbe01eeed093cb22bb8f5acdc3 11 foo_1.0.orig.tar.gz
        "};
        let cf = DebianSourceControlFile::from_reader(dsc.as_bytes(), td.path().join("foo.dsc"))?;
        cf.verify_files()?;

        std::fs::write(td.path().join("foo_1.0.orig.tar.gz"), b"hello there")?;
        assert!(matches!(
            cf.verify_files(),
            Err(DebianError::DigestMismatch { .. })
        ));

        std::fs::write(td.path().join("foo_1.0.orig.tar.gz"), b"hello")?;
        assert!(matches!(
            cf.verify_files(),
            Err(DebianError::SizeMismatch { expected: 11, actual: 5, .. })
        ));

        std::fs::remove_file(td.path().join("foo_1.0.orig.tar.gz"))?;
        assert!(matches!(
            cf.verify_files(),
            Err(DebianError::IoTransfer { .. })
        ));

        Ok(())
    }
}
