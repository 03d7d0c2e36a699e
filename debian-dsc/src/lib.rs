// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Debian source package primitives.

This crate defines pure Rust implementations for working with Debian source packages: the
`.dsc` files describing them, the files they reference and the order in which a batch of
them must be built.

# Goals

## Compliance and Compatibility

We want this crate to be as-compliant and as-compatible as possible with in-the-wild Debian
source packages so it can be used as a basis for tools which consume and shuffle around
packages that are compatible with the official Debian packaging implementations, such as
build daemons and upload queue processors.

## Determinism and Reproducibility

Given the same input, operations should produce identical results. Notably, the build order
computed for a batch of source packages only depends on the contents and order of that
batch. Packages without a dependency relationship keep their relative order.

## Observable file operations

Tools frequently watch directories for the arrival of `.dsc` files. Operations moving
source packages around the filesystem order I/O so the `.dsc` is always written last and
deleted last. A `.dsc` appearing in a directory implies the files it references are
already there.

# A Tour of Functionality

A common primitive within Debian packaging is *control files*. These consist of *paragraphs*
of key-value metadata. Low-level control file primitives are defined in the [control] module.
[control::ControlParagraph] defines a paragraph, which consists of [control::ControlField].
[control::ControlFile] provides an interface for a *control file*, which consists of multiple
paragraphs. [control::ControlParagraphReader] implements a streaming reader of control files.
`.dsc` files are commonly PGP cleartext signed. The signed content is read through
[pgp_cleartext::CleartextSignatureReader] and the signatures are retained, unverified, on
the parsed descriptor.

The [field_table] module decodes paragraphs against a declarative table of field names,
cardinalities and delimiters.

[debian_source_control::DebianSourceControlFile] represents a `.dsc` file bound to its
location on the filesystem. It exposes the fields of the source package, verification of
the files it references and, via the [transfer] module, copying, moving and deleting the
source package as a unit. [transfer::FileTransport] abstracts the underlying file operations.
[debian_source_package_list::DebianSourcePackageList] is a collection of source packages.

There is a meta language for expressing dependencies between Debian packages. The
[dependency] module defines types for parsing and writing this language. e.g.
[dependency::DependencyList] represents a parsed list of dependencies like
`libc6 (>= 2.4), libx11-6`. The [architecture] module defines architecture names and
wildcards, which dependencies can be restricted to.

The [package_version] module implements Debian package version string parsing,
serialization, and comparison. [package_version::PackageVersion] is the main type used for this.

The [build_order] module computes the order in which a batch of source packages must be
built. [build_order::BuildOrderResolver] is the main type for this. Its building blocks,
[build_order::BinarySourceIndex] and [build_order::BuildGraph], are usable on their own.

[io] defines I/O helpers, including content digests.
*/

pub mod architecture;
pub mod build_order;
pub mod control;
pub mod debian_source_control;
pub mod debian_source_package_list;
pub mod dependency;
pub mod error;
pub mod field_table;
pub mod io;
pub mod package_version;
pub mod transfer;
