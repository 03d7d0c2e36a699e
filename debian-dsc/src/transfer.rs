// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Moving source packages around the filesystem.

A source package is a `.dsc` file plus every file listed in its `Files` field. Tools
watching a directory (e.g. an `incoming` queue driven by inotify) commonly key off the
appearance of the `.dsc`. The transfer operations here therefore order I/O so the `.dsc`
is always the last file to appear on copy or move, and the last file to disappear on
removal. A watcher that sees the `.dsc` can rely on every referenced file already being
present.

Operations abort on the first failure. Files transferred before the failure are left in
place; there is no rollback.
*/

use {
    crate::{
        debian_source_control::{DebianSourceControlFile, DebianSourceControlFileEntry},
        error::{DebianError, Result},
    },
    log::{debug, info},
    std::{
        ffi::OsString,
        path::{Component, Path, PathBuf},
    },
};

/// Performs the primitive file operations used by transfers.
///
/// [FilesystemTransport] is the implementation used by default. Other implementations
/// can redirect or observe I/O.
pub trait FileTransport {
    /// Duplicate `source` at `dest`, preserving content.
    fn copy_file(&self, source: &Path, dest: &Path) -> std::io::Result<()>;

    /// Move `source` to `dest`. `source` must not exist afterwards.
    fn rename_file(&self, source: &Path, dest: &Path) -> std::io::Result<()>;

    /// Delete `path`.
    fn remove_file(&self, path: &Path) -> std::io::Result<()>;

    /// Whether `path` exists and is something other than a directory.
    fn is_existing_non_directory(&self, path: &Path) -> bool;

    /// Whether `a` and `b` name the same existing file.
    fn is_same_file(&self, a: &Path, b: &Path) -> bool;
}

#[cfg(unix)]
fn is_cross_device(e: &std::io::Error) -> bool {
    // EXDEV
    e.raw_os_error() == Some(18)
}

#[cfg(windows)]
fn is_cross_device(e: &std::io::Error) -> bool {
    // ERROR_NOT_SAME_DEVICE
    e.raw_os_error() == Some(17)
}

#[cfg(not(any(unix, windows)))]
fn is_cross_device(_: &std::io::Error) -> bool {
    false
}

/// A [FileTransport] operating on the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FilesystemTransport;

impl FileTransport for FilesystemTransport {
    fn copy_file(&self, source: &Path, dest: &Path) -> std::io::Result<()> {
        std::fs::copy(source, dest).map(|_| ())
    }

    fn rename_file(&self, source: &Path, dest: &Path) -> std::io::Result<()> {
        match std::fs::rename(source, dest) {
            Err(e) if is_cross_device(&e) => {
                debug!(
                    "rename {} -> {} failed ({}); copying instead",
                    source.display(),
                    dest.display(),
                    e
                );
                std::fs::copy(source, dest)?;
                std::fs::remove_file(source)
            }
            res => res,
        }
    }

    fn remove_file(&self, path: &Path) -> std::io::Result<()> {
        std::fs::remove_file(path)
    }

    fn is_existing_non_directory(&self, path: &Path) -> bool {
        std::fs::metadata(path)
            .map(|m| !m.is_dir())
            .unwrap_or(false)
    }

    fn is_same_file(&self, a: &Path, b: &Path) -> bool {
        match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum TransferMode {
    Copy,
    Move,
}

impl TransferMode {
    fn verb(&self) -> &'static str {
        match self {
            Self::Copy => "copying",
            Self::Move => "moving",
        }
    }
}

/// Join a relative filename onto `base` without ever leaving `base`.
///
/// Root and `.` components are ignored. `..` only cancels components contributed by
/// `filename` itself.
fn join_contained(base: &Path, filename: &str) -> PathBuf {
    let mut added: Vec<OsString> = vec![];

    for component in Path::new(filename).components() {
        match component {
            Component::Normal(part) => added.push(part.to_os_string()),
            Component::ParentDir => {
                added.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }

    let mut path = base.to_path_buf();
    path.extend(added);

    path
}

impl DebianSourceControlFile {
    /// The directory containing the control file.
    pub fn base_dir(&self) -> &Path {
        self.path().parent().unwrap_or_else(|| Path::new(""))
    }

    pub(crate) fn resolve_paths<'a>(
        &self,
        entries: &'a [DebianSourceControlFileEntry],
    ) -> Vec<(PathBuf, &'a DebianSourceControlFileEntry)> {
        let base = self.base_dir();

        entries
            .iter()
            .map(|entry| (join_contained(base, &entry.filename), entry))
            .collect()
    }

    /// Resolve every `Files` entry to a path.
    ///
    /// Paths are the entry filenames joined onto [Self::base_dir()], in manifest order.
    /// The result always lies within [Self::base_dir()].
    pub fn resolve_artifact_paths(&self) -> Vec<(PathBuf, &DebianSourceControlFileEntry)> {
        self.resolve_paths(self.files())
    }

    /// Copy the `.dsc` file and all referenced files into directory `dest`.
    ///
    /// The `.dsc` is copied last. On success, [Self::path()] is updated to the copy.
    pub fn copy_to(&mut self, dest: impl AsRef<Path>) -> Result<()> {
        self.copy_to_with(&FilesystemTransport, dest)
    }

    /// Move the `.dsc` file and all referenced files into directory `dest`.
    ///
    /// The `.dsc` is moved last. On success, [Self::path()] is updated to the new location.
    pub fn move_to(&mut self, dest: impl AsRef<Path>) -> Result<()> {
        self.move_to_with(&FilesystemTransport, dest)
    }

    /// Delete the `.dsc` file and all referenced files.
    ///
    /// The `.dsc` is deleted last.
    pub fn remove(&self) -> Result<()> {
        self.remove_with(&FilesystemTransport)
    }

    /// [Self::copy_to()] using a custom [FileTransport].
    pub fn copy_to_with(
        &mut self,
        transport: &dyn FileTransport,
        dest: impl AsRef<Path>,
    ) -> Result<()> {
        self.transfer(transport, dest.as_ref(), TransferMode::Copy)
    }

    /// [Self::move_to()] using a custom [FileTransport].
    pub fn move_to_with(
        &mut self,
        transport: &dyn FileTransport,
        dest: impl AsRef<Path>,
    ) -> Result<()> {
        self.transfer(transport, dest.as_ref(), TransferMode::Move)
    }

    /// [Self::remove()] using a custom [FileTransport].
    pub fn remove_with(&self, transport: &dyn FileTransport) -> Result<()> {
        info!("removing source package {}", self.source());

        for (path, _) in self.resolve_artifact_paths() {
            debug!("removing {}", path.display());
            transport
                .remove_file(&path)
                .map_err(|e| DebianError::io_transfer(&path, e))?;
        }

        debug!("removing {}", self.path().display());
        transport
            .remove_file(self.path())
            .map_err(|e| DebianError::io_transfer(self.path(), e))
    }

    fn transfer(
        &mut self,
        transport: &dyn FileTransport,
        dest: &Path,
        mode: TransferMode,
    ) -> Result<()> {
        if transport.is_existing_non_directory(dest) {
            return Err(DebianError::InvalidDestination(dest.to_path_buf()));
        }

        // Every destination is computed before any I/O so a bad name cannot leave a
        // partial transfer behind.
        let mut plan = Vec::with_capacity(self.files().len() + 1);

        for (source, _) in self.resolve_artifact_paths() {
            let target = dest.join(file_name(&source)?);
            plan.push((source, target));
        }

        let dsc_target = dest.join(file_name(self.path())?);
        plan.push((self.path().to_path_buf(), dsc_target.clone()));

        if let Some((source, _)) = plan
            .iter()
            .find(|(source, target)| transport.is_same_file(source, target))
        {
            return Err(DebianError::DestinationIsSource(source.clone()));
        }

        info!(
            "{} source package {} ({} files) to {}",
            mode.verb(),
            self.source(),
            plan.len(),
            dest.display()
        );

        for (source, target) in plan {
            debug!("{} {} -> {}", mode.verb(), source.display(), target.display());

            let res = match mode {
                TransferMode::Copy => transport.copy_file(&source, &target),
                TransferMode::Move => transport.rename_file(&source, &target),
            };
            res.map_err(|e| DebianError::io_transfer(&source, e))?;
        }

        self.set_path(dsc_target);

        Ok(())
    }
}

fn file_name(path: &Path) -> Result<&std::ffi::OsStr> {
    path.file_name().ok_or_else(|| {
        DebianError::io_transfer(
            path,
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        )
    })
}

#[cfg(test)]
mod test {
    use {
        super::*,
        std::{cell::RefCell, io::ErrorKind},
    };

    fn dsc_content(files: &[&str]) -> String {
        let mut s = "Source: foo\nVersion: 1.0-1\nMaintainer: A <a@example.com>\nFiles:\n".to_string();

        for f in files {
            s.push_str(&format!(" d41d8cd98f00b204e9800998ecf8427e 0 {}\n", f));
        }

        s
    }

    /// Writes a `.dsc` and its files into `dir`.
    fn write_package(dir: &Path, files: &[&str]) -> Result<DebianSourceControlFile> {
        let content = dsc_content(files);
        let dsc_path = dir.join("foo_1.0-1.dsc");
        std::fs::write(&dsc_path, &content)?;

        for f in files {
            std::fs::write(dir.join(f), f.as_bytes())?;
        }

        DebianSourceControlFile::from_path(&dsc_path)
    }

    #[derive(Debug, Eq, PartialEq)]
    enum Op {
        Copy(PathBuf, PathBuf),
        Rename(PathBuf, PathBuf),
        Remove(PathBuf),
    }

    /// Records operations and fails on a chosen source path.
    #[derive(Default)]
    struct RecordingTransport {
        ops: RefCell<Vec<Op>>,
        fail_on: Option<PathBuf>,
        non_directory: bool,
    }

    impl RecordingTransport {
        fn check(&self, path: &Path) -> std::io::Result<()> {
            if self.fail_on.as_deref() == Some(path) {
                Err(std::io::Error::new(ErrorKind::PermissionDenied, "denied"))
            } else {
                Ok(())
            }
        }
    }

    impl FileTransport for RecordingTransport {
        fn copy_file(&self, source: &Path, dest: &Path) -> std::io::Result<()> {
            self.check(source)?;
            self.ops
                .borrow_mut()
                .push(Op::Copy(source.to_path_buf(), dest.to_path_buf()));
            Ok(())
        }

        fn rename_file(&self, source: &Path, dest: &Path) -> std::io::Result<()> {
            self.check(source)?;
            self.ops
                .borrow_mut()
                .push(Op::Rename(source.to_path_buf(), dest.to_path_buf()));
            Ok(())
        }

        fn remove_file(&self, path: &Path) -> std::io::Result<()> {
            self.check(path)?;
            self.ops.borrow_mut().push(Op::Remove(path.to_path_buf()));
            Ok(())
        }

        fn is_existing_non_directory(&self, _path: &Path) -> bool {
            self.non_directory
        }

        fn is_same_file(&self, a: &Path, b: &Path) -> bool {
            a == b
        }
    }

    fn package_at(path: &str, files: &[&str]) -> Result<DebianSourceControlFile> {
        DebianSourceControlFile::from_reader(dsc_content(files).as_bytes(), path)
    }

    #[test]
    fn artifact_paths_stay_in_base_dir() -> Result<()> {
        let cf = package_at(
            "/srv/incoming/foo.dsc",
            &["a.tar.gz", "./b.tar.gz", "sub/../c.tar.gz", "/abs/d.tar.gz", "../../e"],
        )?;

        let paths = cf
            .resolve_artifact_paths()
            .into_iter()
            .map(|(p, _)| p)
            .collect::<Vec<_>>();

        assert_eq!(
            paths,
            vec![
                PathBuf::from("/srv/incoming/a.tar.gz"),
                PathBuf::from("/srv/incoming/b.tar.gz"),
                PathBuf::from("/srv/incoming/c.tar.gz"),
                PathBuf::from("/srv/incoming/abs/d.tar.gz"),
                PathBuf::from("/srv/incoming/e"),
            ]
        );
        assert!(paths.iter().all(|p| p.starts_with(cf.base_dir())));

        Ok(())
    }

    #[test]
    fn descriptor_is_transferred_last() -> Result<()> {
        let mut cf = package_at("/src/foo.dsc", &["a.orig.tar.gz", "a.debian.tar.xz"])?;
        let transport = RecordingTransport::default();

        cf.copy_to_with(&transport, "/dest")?;

        assert_eq!(
            transport.ops.into_inner(),
            vec![
                Op::Copy("/src/a.orig.tar.gz".into(), "/dest/a.orig.tar.gz".into()),
                Op::Copy("/src/a.debian.tar.xz".into(), "/dest/a.debian.tar.xz".into()),
                Op::Copy("/src/foo.dsc".into(), "/dest/foo.dsc".into()),
            ]
        );
        assert_eq!(cf.path(), Path::new("/dest/foo.dsc"));

        let transport = RecordingTransport::default();
        cf.move_to_with(&transport, "/final")?;
        assert_eq!(
            transport.ops.into_inner().last(),
            Some(&Op::Rename("/dest/foo.dsc".into(), "/final/foo.dsc".into()))
        );
        assert_eq!(cf.path(), Path::new("/final/foo.dsc"));

        Ok(())
    }

    #[test]
    fn transfer_failure_aborts_without_descriptor() -> Result<()> {
        let mut cf = package_at("/src/foo.dsc", &["one", "two", "three"])?;
        let transport = RecordingTransport {
            fail_on: Some("/src/two".into()),
            ..Default::default()
        };

        let err = cf.move_to_with(&transport, "/dest").unwrap_err();
        assert!(matches!(
            &err,
            DebianError::IoTransfer { path, .. } if path == Path::new("/src/two")
        ));

        assert_eq!(
            transport.ops.into_inner(),
            vec![Op::Rename("/src/one".into(), "/dest/one".into())]
        );
        assert_eq!(cf.path(), Path::new("/src/foo.dsc"));

        Ok(())
    }

    #[test]
    fn invalid_destination_performs_no_io() -> Result<()> {
        let mut cf = package_at("/src/foo.dsc", &["one"])?;
        let transport = RecordingTransport {
            non_directory: true,
            ..Default::default()
        };

        assert!(matches!(
            cf.copy_to_with(&transport, "/dest"),
            Err(DebianError::InvalidDestination(_))
        ));
        assert!(transport.ops.into_inner().is_empty());

        Ok(())
    }

    #[test]
    fn transfer_onto_itself_performs_no_io() -> Result<()> {
        let mut cf = package_at("/src/foo.dsc", &["one"])?;
        let transport = RecordingTransport::default();

        assert!(matches!(
            cf.move_to_with(&transport, "/src"),
            Err(DebianError::DestinationIsSource(p)) if p == Path::new("/src/one")
        ));
        assert!(transport.ops.into_inner().is_empty());
        assert_eq!(cf.path(), Path::new("/src/foo.dsc"));

        Ok(())
    }

    #[test]
    fn removal_failure_keeps_descriptor() -> Result<()> {
        let cf = package_at("/src/foo.dsc", &["one", "two", "three"])?;
        let transport = RecordingTransport {
            fail_on: Some("/src/two".into()),
            ..Default::default()
        };

        assert!(cf.remove_with(&transport).is_err());
        assert_eq!(
            transport.ops.into_inner(),
            vec![Op::Remove("/src/one".into())]
        );

        let transport = RecordingTransport::default();
        cf.remove_with(&transport)?;
        assert_eq!(
            transport.ops.into_inner().last(),
            Some(&Op::Remove("/src/foo.dsc".into()))
        );

        Ok(())
    }

    #[test]
    fn filesystem_copy_and_move() -> Result<()> {
        let src = tempfile::tempdir()?;
        let copy_dest = tempfile::tempdir()?;
        let move_dest = tempfile::tempdir()?;

        let mut cf = write_package(src.path(), &["foo.orig.tar.gz", "foo.debian.tar.xz"])?;

        cf.copy_to(copy_dest.path())?;
        assert_eq!(cf.path(), copy_dest.path().join("foo_1.0-1.dsc"));
        for name in ["foo.orig.tar.gz", "foo.debian.tar.xz", "foo_1.0-1.dsc"] {
            assert!(src.path().join(name).exists());
            assert!(copy_dest.path().join(name).exists());
        }
        assert_eq!(
            std::fs::read(copy_dest.path().join("foo.orig.tar.gz"))?,
            b"foo.orig.tar.gz"
        );

        cf.move_to(move_dest.path())?;
        assert_eq!(cf.path(), move_dest.path().join("foo_1.0-1.dsc"));
        for name in ["foo.orig.tar.gz", "foo.debian.tar.xz", "foo_1.0-1.dsc"] {
            assert!(!copy_dest.path().join(name).exists());
            assert!(move_dest.path().join(name).exists());
        }

        cf.remove()?;
        assert_eq!(std::fs::read_dir(move_dest.path())?.count(), 0);

        Ok(())
    }

    #[test]
    fn filesystem_destination_is_file() -> Result<()> {
        let src = tempfile::tempdir()?;
        let dest = tempfile::tempdir()?;
        let not_a_dir = dest.path().join("file");
        std::fs::write(&not_a_dir, b"")?;

        let mut cf = write_package(src.path(), &["foo.orig.tar.gz"])?;

        assert!(matches!(
            cf.copy_to(&not_a_dir),
            Err(DebianError::InvalidDestination(p)) if p == not_a_dir
        ));
        assert_eq!(cf.path(), src.path().join("foo_1.0-1.dsc"));

        Ok(())
    }

    #[test]
    fn filesystem_copy_into_own_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("a.tar.gz"), b"hello world")?;
        let dsc_path = dir.path().join("a_1.0.dsc");
        std::fs::write(
            &dsc_path,
            "Source: a\nVersion: 1.0\nMaintainer: A <a@example.com>\nFiles:\n \
             5eb63bbbe01eeed093cb22bb8f5acdc3 11 a.tar.gz\n",
        )?;

        let mut cf = DebianSourceControlFile::from_path(&dsc_path)?;

        assert!(matches!(
            cf.copy_to(dir.path()),
            Err(DebianError::DestinationIsSource(_))
        ));
        // A different spelling of the same directory.
        assert!(matches!(
            cf.copy_to(dir.path().join(".")),
            Err(DebianError::DestinationIsSource(_))
        ));

        assert_eq!(std::fs::read(dir.path().join("a.tar.gz"))?, b"hello world");
        assert_eq!(cf.path(), dsc_path);
        cf.verify_files()?;

        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn rename_falls_back_only_across_devices() -> Result<()> {
        assert!(is_cross_device(&std::io::Error::from_raw_os_error(18)));
        assert!(!is_cross_device(&std::io::Error::new(
            ErrorKind::PermissionDenied,
            "denied"
        )));

        let dir = tempfile::tempdir()?;
        let source = dir.path().join("one");
        std::fs::write(&source, b"one")?;

        let target = dir.path().join("missing").join("one");
        assert!(FilesystemTransport.rename_file(&source, &target).is_err());
        assert!(source.exists());
        assert!(!target.exists());

        Ok(())
    }

    #[test]
    fn filesystem_partial_failures() -> Result<()> {
        let src = tempfile::tempdir()?;
        let dest = tempfile::tempdir()?;

        let mut cf = write_package(src.path(), &["one", "two", "three"])?;
        std::fs::remove_file(src.path().join("two"))?;

        assert!(matches!(
            cf.copy_to(dest.path()),
            Err(DebianError::IoTransfer { .. })
        ));
        assert!(dest.path().join("one").exists());
        assert!(!dest.path().join("three").exists());
        assert!(!dest.path().join("foo_1.0-1.dsc").exists());

        assert!(matches!(cf.remove(), Err(DebianError::IoTransfer { .. })));
        assert!(!src.path().join("one").exists());
        assert!(src.path().join("three").exists());
        assert!(src.path().join("foo_1.0-1.dsc").exists());

        Ok(())
    }
}
