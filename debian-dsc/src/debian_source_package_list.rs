// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! A collection of source control package control files. */

use {
    crate::{
        architecture::Architecture,
        build_order::BuildOrderResolver,
        debian_source_control::DebianSourceControlFile,
        error::Result,
    },
    std::ops::{Deref, DerefMut},
};

/// Represents a collection of Debian source control files.
///
/// This provides a wrapper around [Vec<DebianSourceControlFile>] for convenience.
#[derive(Clone, Debug, Default)]
pub struct DebianSourcePackageList {
    packages: Vec<DebianSourceControlFile>,
}

impl Deref for DebianSourcePackageList {
    type Target = Vec<DebianSourceControlFile>;

    fn deref(&self) -> &Self::Target {
        &self.packages
    }
}

impl DerefMut for DebianSourcePackageList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.packages
    }
}

impl IntoIterator for DebianSourcePackageList {
    type Item = DebianSourceControlFile;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.packages.into_iter()
    }
}

impl From<Vec<DebianSourceControlFile>> for DebianSourcePackageList {
    fn from(packages: Vec<DebianSourceControlFile>) -> Self {
        Self { packages }
    }
}

impl FromIterator<DebianSourceControlFile> for DebianSourcePackageList {
    fn from_iter<I: IntoIterator<Item = DebianSourceControlFile>>(iter: I) -> Self {
        Self {
            packages: iter.into_iter().collect(),
        }
    }
}

impl DebianSourcePackageList {
    /// Find source packages with the given `Source` name.
    pub fn iter_with_source<'a>(
        &'a self,
        source: &'a str,
    ) -> impl Iterator<Item = &'a DebianSourceControlFile> {
        self.packages.iter().filter(move |cf| cf.source() == source)
    }

    /// Find source packages providing the given binary package.
    ///
    /// This consults the list of binary packages in the `Binary` field and returns control
    /// files where `package` appears in that list.
    pub fn iter_with_binary_package<'a>(
        &'a self,
        package: &'a str,
    ) -> impl Iterator<Item = &'a DebianSourceControlFile> {
        self.packages
            .iter()
            .filter(move |cf| cf.binaries().any(|p| p == package))
    }

    /// Find source packages providing packages for the given architecture.
    ///
    /// This consults the list of architectures in the `Architecture` field and returns
    /// control files having an entry matching `architecture`. Wildcards like `any` and
    /// `linux-any` match concrete architectures.
    pub fn iter_with_architecture<'a>(
        &'a self,
        architecture: &'a Architecture,
    ) -> impl Iterator<Item = &'a DebianSourceControlFile> {
        self.packages
            .iter()
            .filter(move |cf| cf.architectures().iter().any(|a| a.is(architecture)))
    }

    /// Consume the list, returning its packages in build order.
    pub fn into_build_order(self, resolver: &BuildOrderResolver) -> Result<Self> {
        Ok(resolver.resolve(self.packages)?.into())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn package(source: &str, binaries: &str, arch: &str, deps: &str) -> Result<DebianSourceControlFile> {
        let s = format!(
            "Source: {}\nBinary: {}\nArchitecture: {}\nVersion: 1\nMaintainer: M <m@example.com>\nBuild-Depends: {}\n",
            source, binaries, arch, deps
        );

        DebianSourceControlFile::from_reader(s.as_bytes(), format!("{}.dsc", source))
    }

    fn list() -> Result<DebianSourcePackageList> {
        Ok(vec![
            package("tool", "tool", "any", "libfoo-dev")?,
            package("foo", "libfoo1, libfoo-dev", "linux-any", "make")?,
            package("foo-doc", "foo-doc", "all", "foo")?,
        ]
        .into())
    }

    #[test]
    fn lookups() -> Result<()> {
        let list = list()?;
        assert_eq!(list.len(), 3);

        assert_eq!(
            list.iter_with_binary_package("libfoo-dev")
                .map(|cf| cf.source())
                .collect::<Vec<_>>(),
            vec!["foo"]
        );
        assert_eq!(list.iter_with_binary_package("nope").count(), 0);
        assert_eq!(list.iter_with_source("foo-doc").count(), 1);

        let amd64 = Architecture::parse("amd64")?;
        assert_eq!(
            list.iter_with_architecture(&amd64)
                .map(|cf| cf.source())
                .collect::<Vec<_>>(),
            vec!["tool", "foo"]
        );
        assert_eq!(
            list.iter_with_architecture(&Architecture::all())
                .map(|cf| cf.source())
                .collect::<Vec<_>>(),
            vec!["tool", "foo-doc"]
        );

        Ok(())
    }

    #[test]
    fn build_order() -> Result<()> {
        let resolver = BuildOrderResolver::new(Architecture::parse("amd64")?);
        let ordered = list()?.into_build_order(&resolver)?;

        assert_eq!(
            ordered.iter().map(|cf| cf.source()).collect::<Vec<_>>(),
            vec!["foo", "tool", "foo-doc"]
        );

        Ok(())
    }
}
