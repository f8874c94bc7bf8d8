//! Dependency resolution and mixin ordering
//!
//! Every dependency gets a satisfier. Next-call dependencies satisfied by
//! other mixins and mixin dependencies become ordering edges; the mixins
//! are then sorted so that each comes after everything it depends on.
//! Among mixins that are ready at the same time the one declared first
//! wins, which keeps the order stable for equal contexts.

use rustc_hash::FxHashSet;

use super::DefinitionBuild;
use crate::definitions::{DependencyId, MixinId, RequirementKind, Satisfier};
use crate::error::{ConfigurationError, ConfigurationResult};

impl DefinitionBuild<'_> {
    pub(super) fn resolve_dependencies(&mut self) -> ConfigurationResult<()> {
        for index in 0..self.def.dependencies.len() {
            let id = DependencyId::from_index(index);
            let satisfier = self.find_satisfier(id)?;
            self.def.dependency_mut(id).satisfier = Some(satisfier);
        }
        Ok(())
    }

    /// Resolve one dependency; aggregated dependencies come after their
    /// aggregate in the arena, so they are resolved here on demand
    fn find_satisfier(&self, id: DependencyId) -> ConfigurationResult<Satisfier> {
        let dependency = self.def.dependency(id);
        let ty = dependency.required_type;
        let depender = dependency.depender;
        let target = self.target_type();

        let found = match dependency.kind {
            RequirementKind::TargetCall => {
                if self.universe.is_assignable(ty, target) {
                    Some(Satisfier::Target)
                } else if let Some(introduction) = self.def.interface_introduction(ty) {
                    Some(Satisfier::Mixin(introduction.introducer))
                } else if self
                    .def
                    .composed_interfaces()
                    .iter()
                    .any(|&composed| self.universe.is_assignable(ty, composed))
                {
                    Some(Satisfier::ComposedInterface)
                } else {
                    self.satisfy_by_parts_or_duck_typing(id)?
                }
            }
            RequirementKind::NextCall => {
                if self.universe.is_assignable(ty, target) {
                    Some(Satisfier::Target)
                } else if let Some(provider) = self.next_call_providers(depender, ty).first() {
                    Some(Satisfier::Mixin(*provider))
                } else {
                    self.satisfy_by_parts_or_duck_typing(id)?
                }
            }
            RequirementKind::Mixin => {
                let candidates: Vec<MixinId> = self
                    .mixin_ids()
                    .into_iter()
                    .filter(|&other| {
                        other != depender
                            && self
                                .universe
                                .is_assignable(ty, self.def.mixins[other.index()].ty)
                    })
                    .collect();
                match candidates.as_slice() {
                    [] => None,
                    [single] => Some(Satisfier::Mixin(*single)),
                    [first, second, ..] => {
                        return Err(ConfigurationError::AmbiguousDependency {
                            mixin: self.mixin_name(depender),
                            required: self.universe.full_name(ty),
                            first: self.mixin_name(*first),
                            second: self.mixin_name(*second),
                        })
                    }
                }
            }
        };

        match found {
            Some(satisfier) => {
                tracing::trace!(
                    kind = %dependency.kind,
                    mixin = %self.mixin_name(depender),
                    required = %self.universe.full_name(ty),
                    ?satisfier,
                    "dependency satisfied"
                );
                Ok(satisfier)
            }
            None => Err(ConfigurationError::UnsatisfiedRequirement {
                kind: dependency.kind.to_string(),
                mixin: self.mixin_name(depender),
                required: self.universe.full_name(ty),
                target: self.def.full_name.clone(),
            }),
        }
    }

    fn satisfy_by_parts_or_duck_typing(
        &self,
        id: DependencyId,
    ) -> ConfigurationResult<Option<Satisfier>> {
        let dependency = self.def.dependency(id);
        if !dependency.aggregated.is_empty() {
            for &part in &dependency.aggregated {
                self.find_satisfier(part)?;
            }
            return Ok(Some(Satisfier::Aggregate));
        }
        if self.is_duck_typed_by_target(dependency.required_type) {
            return Ok(Some(Satisfier::TargetDuckTyped));
        }
        Ok(None)
    }

    /// Other mixins implementing a next-call interface, in declaration
    /// order
    fn next_call_providers(&self, depender: MixinId, interface: braid_types::TypeId) -> Vec<MixinId> {
        self.mixin_ids()
            .into_iter()
            .filter(|&other| {
                other != depender
                    && self
                        .universe
                        .is_assignable(interface, self.def.mixins[other.index()].ty)
            })
            .collect()
    }

    /// Mixins each mixin must come after
    fn ordering_edges(&self) -> Vec<Vec<MixinId>> {
        let mut edges = vec![Vec::new(); self.def.mixins.len()];
        for dependency in &self.def.dependencies {
            let providers = match (dependency.kind, dependency.satisfier) {
                (RequirementKind::Mixin, Some(Satisfier::Mixin(provider))) => vec![provider],
                (RequirementKind::NextCall, Some(Satisfier::Mixin(_))) => {
                    self.next_call_providers(dependency.depender, dependency.required_type)
                }
                _ => Vec::new(),
            };
            let after: &mut Vec<MixinId> = &mut edges[dependency.depender.index()];
            for provider in providers {
                if !after.contains(&provider) {
                    after.push(provider);
                }
            }
        }
        edges
    }

    pub(super) fn order_mixins(&mut self) -> ConfigurationResult<()> {
        let edges = self.ordering_edges();
        let count = self.def.mixins.len();
        let mut placed = vec![false; count];
        let mut order = Vec::with_capacity(count);

        while order.len() < count {
            let ready = (0..count).find(|&index| {
                !placed[index] && edges[index].iter().all(|dep| placed[dep.index()])
            });
            match ready {
                Some(index) => {
                    placed[index] = true;
                    order.push(MixinId::from_index(index));
                }
                None => {
                    let cycle = self.find_cycle(&edges, &placed);
                    return Err(ConfigurationError::CyclicDependency {
                        target: self.def.full_name.clone(),
                        cycle,
                    });
                }
            }
        }

        self.def.set_order(order);
        Ok(())
    }

    /// Describe a cycle among the unplaced mixins as `A -> B -> A`
    fn find_cycle(&self, edges: &[Vec<MixinId>], placed: &[bool]) -> String {
        let mut visited = FxHashSet::default();
        for start in 0..edges.len() {
            if placed[start] || visited.contains(&start) {
                continue;
            }
            let mut path = Vec::new();
            if let Some(cycle) = Self::dfs_cycle(start, edges, placed, &mut visited, &mut path) {
                return cycle
                    .iter()
                    .map(|&index| self.mixin_name(MixinId::from_index(index)))
                    .collect::<Vec<_>>()
                    .join(" -> ");
            }
        }
        String::new()
    }

    fn dfs_cycle(
        node: usize,
        edges: &[Vec<MixinId>],
        placed: &[bool],
        visited: &mut FxHashSet<usize>,
        path: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        if let Some(position) = path.iter().position(|&n| n == node) {
            let mut cycle = path[position..].to_vec();
            cycle.push(node);
            return Some(cycle);
        }
        if !visited.insert(node) {
            return None;
        }
        path.push(node);
        for dep in &edges[node] {
            if placed[dep.index()] {
                continue;
            }
            if let Some(cycle) = Self::dfs_cycle(dep.index(), edges, placed, visited, path) {
                return Some(cycle);
            }
        }
        path.pop();
        None
    }
}
