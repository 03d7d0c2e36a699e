// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Ordering source packages for building.

Given a batch of source packages, [BuildOrderResolver] determines an order in which they
can be built such that every package is built after the packages providing its build
dependencies.

Resolution happens in three steps:

1. A [BinarySourceIndex] maps each binary package name to the source package producing it.
2. A [BuildGraph] gets a node per source package. For every build dependency naming a
   binary in the index, an edge is added from the producing source to the dependent source.
   Dependencies on packages outside the batch impose no ordering.
3. The graph is topologically sorted. Packages without an ordering constraint between them
   retain their relative input order.
*/

use {
    crate::{
        architecture::Architecture,
        debian_source_control::DebianSourceControlFile,
        error::{DebianError, Result},
    },
    log::{debug, info, warn},
    std::{
        cmp::Reverse,
        collections::{BTreeSet, BinaryHeap, HashMap},
    },
};

/// How to react to multiple source packages producing the same binary package.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DuplicateBinaryPolicy {
    /// The last source package seen wins. A warning is logged.
    LastWins,
    /// Fail with [DebianError::DuplicateBinaryProvider].
    Error,
}

impl Default for DuplicateBinaryPolicy {
    fn default() -> Self {
        Self::LastWins
    }
}

/// Maps binary package names to the name of the source package producing them.
#[derive(Clone, Debug, Default)]
pub struct BinarySourceIndex {
    binaries: HashMap<String, String>,
}

impl BinarySourceIndex {
    /// Index the `Binary` field of every package.
    pub fn from_packages(
        packages: &[DebianSourceControlFile],
        policy: DuplicateBinaryPolicy,
    ) -> Result<Self> {
        let mut index = Self::default();

        for cf in packages {
            for binary in cf.binaries() {
                index.insert(binary, cf.source(), policy)?;
            }
        }

        Ok(index)
    }

    fn insert(&mut self, binary: &str, source: &str, policy: DuplicateBinaryPolicy) -> Result<()> {
        match self.binaries.get(binary) {
            Some(existing) if existing != source => match policy {
                DuplicateBinaryPolicy::LastWins => {
                    warn!(
                        "binary package {} is produced by both {} and {}; using {}",
                        binary, existing, source, source
                    );
                }
                DuplicateBinaryPolicy::Error => {
                    return Err(DebianError::DuplicateBinaryProvider {
                        binary: binary.to_string(),
                        first: existing.clone(),
                        second: source.to_string(),
                    });
                }
            },
            _ => {}
        }

        self.binaries.insert(binary.to_string(), source.to_string());

        Ok(())
    }

    /// Obtain the source package producing a binary package.
    pub fn source_for_binary(&self, binary: &str) -> Option<&str> {
        self.binaries.get(binary).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.binaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.binaries.is_empty()
    }

    /// Iterate over `(binary, source)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.binaries
            .iter()
            .map(|(binary, source)| (binary.as_str(), source.as_str()))
    }
}

#[derive(Clone, Debug)]
struct Node<T> {
    name: String,
    payload: T,
    outgoing: BTreeSet<usize>,
}

/// A directed graph of named nodes carrying a payload.
///
/// Nodes are identified by their insertion index. An edge `a -> b` means `a` must come
/// before `b`.
#[derive(Clone, Debug)]
pub struct BuildGraph<T> {
    nodes: Vec<Node<T>>,
    names: HashMap<String, usize>,
}

impl<T> Default for BuildGraph<T> {
    fn default() -> Self {
        Self {
            nodes: vec![],
            names: HashMap::new(),
        }
    }
}

impl<T> BuildGraph<T> {
    /// Add a node, returning its index.
    ///
    /// Names need not be unique. [Self::node_index()] resolves a name to the first node
    /// registered with it.
    pub fn add_node(&mut self, name: impl ToString, payload: T) -> usize {
        let index = self.nodes.len();
        let name = name.to_string();

        self.names.entry(name.clone()).or_insert(index);
        self.nodes.push(Node {
            name,
            payload,
            outgoing: BTreeSet::new(),
        });

        index
    }

    /// Add an edge requiring `from` to precede `to`.
    ///
    /// Returns whether the edge is new. Self edges are ignored.
    pub fn add_edge(&mut self, from: usize, to: usize) -> Result<bool> {
        for index in [from, to] {
            if index >= self.nodes.len() {
                return Err(DebianError::BuildGraphUnknownNode(index));
            }
        }

        if from == to {
            return Ok(false);
        }

        Ok(self.nodes[from].outgoing.insert(to))
    }

    /// Resolve a name to the index of the first node registered with it.
    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.names.get(name).copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct edges.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.outgoing.len()).sum()
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.nodes.get(index).map(|n| n.name.as_str())
    }

    pub fn payload(&self, index: usize) -> Option<&T> {
        self.nodes.get(index).map(|n| &n.payload)
    }

    /// Indices of nodes that must come after `index`.
    pub fn successors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .get(index)
            .into_iter()
            .flat_map(|n| n.outgoing.iter().copied())
    }

    /// Topologically sort the graph, returning node indices.
    ///
    /// Among nodes that are ready at the same time, the lowest index is emitted first. So
    /// the order is fully determined by the graph and matches insertion order where no
    /// edge says otherwise.
    pub fn sort(&self) -> Result<Vec<usize>> {
        let mut in_degree = vec![0usize; self.nodes.len()];
        for node in &self.nodes {
            for &to in &node.outgoing {
                in_degree[to] += 1;
            }
        }

        let mut ready = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(index, _)| Reverse(index))
            .collect::<BinaryHeap<_>>();

        let mut order = Vec::with_capacity(self.nodes.len());

        while let Some(Reverse(index)) = ready.pop() {
            order.push(index);

            for &to in &self.nodes[index].outgoing {
                in_degree[to] -= 1;
                if in_degree[to] == 0 {
                    ready.push(Reverse(to));
                }
            }
        }

        if order.len() != self.nodes.len() {
            return Err(DebianError::CycleDetected(self.find_cycle(&in_degree)));
        }

        Ok(order)
    }

    /// Names of the nodes on one cycle, in edge order, with the first name repeated last.
    ///
    /// `remaining` holds the residual in-degrees after sorting stalled. Every node with a
    /// non-zero residual has a predecessor that also does, so walking predecessors from
    /// any such node must revisit a node.
    fn find_cycle(&self, remaining: &[usize]) -> Vec<String> {
        let mut predecessor = vec![None; self.nodes.len()];
        for (from, node) in self.nodes.iter().enumerate() {
            if remaining[from] == 0 {
                continue;
            }
            for &to in &node.outgoing {
                if remaining[to] != 0 && predecessor[to].is_none() {
                    predecessor[to] = Some(from);
                }
            }
        }

        let mut position = vec![None; self.nodes.len()];
        let mut walk = vec![];
        let mut current = remaining.iter().position(|degree| *degree != 0);

        while let Some(index) = current {
            if let Some(start) = position[index] {
                let mut cycle = walk[start..]
                    .iter()
                    .rev()
                    .map(|&i: &usize| self.nodes[i].name.clone())
                    .collect::<Vec<_>>();
                if let Some(first) = cycle.first().cloned() {
                    cycle.push(first);
                }
                return cycle;
            }

            position[index] = Some(walk.len());
            walk.push(index);
            current = predecessor[index];
        }

        walk.into_iter()
            .map(|i| self.nodes[i].name.clone())
            .collect()
    }

    /// Consume the graph, returning payloads in topological order.
    pub fn into_sorted(self) -> Result<Vec<T>> {
        let order = self.sort()?;

        let mut payloads = self
            .nodes
            .into_iter()
            .map(|n| Some(n.payload))
            .collect::<Vec<_>>();

        Ok(order
            .into_iter()
            .filter_map(|index| payloads[index].take())
            .collect())
    }
}

/// Resolves the order in which source packages should be built.
#[derive(Clone, Debug)]
pub struct BuildOrderResolver {
    architecture: Architecture,
    duplicate_binary_policy: DuplicateBinaryPolicy,
    strict_sources: bool,
}

impl BuildOrderResolver {
    /// Construct an instance resolving build dependencies for the given architecture.
    pub fn new(architecture: Architecture) -> Self {
        Self {
            architecture,
            duplicate_binary_policy: DuplicateBinaryPolicy::default(),
            strict_sources: false,
        }
    }

    pub fn architecture(&self) -> &Architecture {
        &self.architecture
    }

    /// Set how multiple producers of one binary package are handled.
    pub fn set_duplicate_binary_policy(&mut self, policy: DuplicateBinaryPolicy) {
        self.duplicate_binary_policy = policy;
    }

    /// Set whether a batch naming the same source package twice is rejected.
    ///
    /// When not strict, every package is retained and dependencies on a repeated source
    /// resolve to its first occurrence.
    pub fn set_strict_sources(&mut self, strict: bool) {
        self.strict_sources = strict;
    }

    /// Build the dependency graph for a batch of packages.
    pub fn build_graph(
        &self,
        packages: Vec<DebianSourceControlFile>,
    ) -> Result<BuildGraph<DebianSourceControlFile>> {
        let index = BinarySourceIndex::from_packages(&packages, self.duplicate_binary_policy)?;

        let mut graph = BuildGraph::default();

        for cf in packages {
            if self.strict_sources && graph.node_index(cf.source()).is_some() {
                return Err(DebianError::DuplicateSource(cf.source().to_string()));
            }

            let name = cf.source().to_string();
            graph.add_node(name, cf);
        }

        let mut edges = vec![];

        for dependent in 0..graph.node_count() {
            let cf = match graph.payload(dependent) {
                Some(cf) => cf,
                None => continue,
            };

            for dep in cf.build_dependency_candidates(&self.architecture) {
                let provider = match index.source_for_binary(&dep.package) {
                    Some(source) => source,
                    None => continue,
                };

                if provider == cf.source() {
                    continue;
                }

                if let Some(from) = graph.node_index(provider) {
                    debug!(
                        "{} builds before {} (provides {})",
                        provider,
                        cf.source(),
                        dep.package
                    );
                    edges.push((from, dependent));
                }
            }
        }

        for (from, to) in edges {
            graph.add_edge(from, to)?;
        }

        Ok(graph)
    }

    /// Order packages so each comes after the packages providing its build dependencies.
    ///
    /// The passed packages are returned reordered. On error, nothing is returned.
    pub fn resolve(
        &self,
        packages: Vec<DebianSourceControlFile>,
    ) -> Result<Vec<DebianSourceControlFile>> {
        info!(
            "resolving build order of {} source packages for {}",
            packages.len(),
            self.architecture
        );

        let graph = self.build_graph(packages)?;
        debug!(
            "build graph has {} nodes and {} edges",
            graph.node_count(),
            graph.edge_count()
        );

        graph.into_sorted()
    }
}

/// Order packages for building on `architecture` using default settings.
pub fn order_for_build(
    packages: Vec<DebianSourceControlFile>,
    architecture: &Architecture,
) -> Result<Vec<DebianSourceControlFile>> {
    BuildOrderResolver::new(architecture.clone()).resolve(packages)
}
