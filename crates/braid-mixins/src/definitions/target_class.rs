//! The target class definition arena

use std::sync::Arc;

use braid_types::{MethodRef, TypeId};

use super::dependencies::DependencyDefinition;
use super::introductions::{AttributeIntroduction, InterfaceIntroduction};
use super::members::{MemberDefinition, MemberKind, MemberOwner};
use super::mixin::MixinDefinition;
use super::requirements::{RequiredTypeDefinition, RequirementKind};
use super::{DependencyId, MemberId, MixinId, RequirementId};
use crate::builder::PersistentMixinFinder;
use crate::context::ClassContext;
use crate::error::{ConfigurationError, ConfigurationResult};

/// The validated composition of a target class with its mixins
///
/// Built once per class context by the
/// [`TargetClassDefinitionBuilder`](crate::builder::TargetClassDefinitionBuilder)
/// and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetClassDefinition {
    pub(crate) context: Arc<ClassContext>,
    pub(crate) ty: TypeId,
    pub(crate) full_name: String,
    pub(crate) is_abstract: bool,
    pub(crate) mixins: Vec<MixinDefinition>,
    pub(crate) order: Vec<MixinId>,
    pub(crate) members: Vec<MemberDefinition>,
    pub(crate) target_members: Vec<MemberId>,
    pub(crate) requirements: Vec<RequiredTypeDefinition>,
    pub(crate) dependencies: Vec<DependencyDefinition>,
    pub(crate) persistence: PersistentMixinFinder,
    pub(crate) base_class: Option<Arc<TargetClassDefinition>>,
}

impl TargetClassDefinition {
    pub(crate) fn new(context: Arc<ClassContext>, full_name: String, is_abstract: bool) -> Self {
        Self {
            ty: context.class_type(),
            context,
            full_name,
            is_abstract,
            mixins: Vec::new(),
            order: Vec::new(),
            members: Vec::new(),
            target_members: Vec::new(),
            requirements: Vec::new(),
            dependencies: Vec::new(),
            persistence: PersistentMixinFinder::default(),
            base_class: None,
        }
    }

    /// The context the definition was built from
    pub fn context(&self) -> &Arc<ClassContext> {
        &self.context
    }

    /// Target type
    pub fn ty(&self) -> TypeId {
        self.ty
    }

    /// Full name of the target type
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Whether the target type is abstract
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Mixins in dependency order
    pub fn mixins(&self) -> impl Iterator<Item = &MixinDefinition> + '_ {
        self.order.iter().map(move |id| &self.mixins[id.index()])
    }

    /// Number of mixins
    pub fn mixin_count(&self) -> usize {
        self.mixins.len()
    }

    /// Mixin types in dependency order
    pub fn mixin_types(&self) -> Vec<TypeId> {
        self.mixins().map(|m| m.ty).collect()
    }

    /// The mixin of exactly `ty`
    pub fn mixin(&self, ty: TypeId) -> Option<&MixinDefinition> {
        self.mixins.iter().find(|m| m.ty == ty)
    }

    /// The mixin with the given id
    pub fn mixin_by_id(&self, id: MixinId) -> &MixinDefinition {
        &self.mixins[id.index()]
    }

    /// The mixin at position `index` of the dependency order
    pub fn mixin_at(&self, index: usize) -> Option<&MixinDefinition> {
        self.order.get(index).map(|id| &self.mixins[id.index()])
    }

    /// Any member definition
    pub fn member(&self, id: MemberId) -> &MemberDefinition {
        &self.members[id.index()]
    }

    /// Members of the target class, accessors included
    pub fn target_members(&self) -> impl Iterator<Item = &MemberDefinition> + '_ {
        self.target_members.iter().map(move |id| self.member(*id))
    }

    /// Target methods that are not accessors
    pub fn methods(&self) -> impl Iterator<Item = &MemberDefinition> + '_ {
        self.target_members()
            .filter(|m| m.is_method() && !m.is_accessor())
    }

    /// Target properties
    pub fn properties(&self) -> impl Iterator<Item = &MemberDefinition> + '_ {
        self.target_members().filter(|m| m.is_property())
    }

    /// Target events
    pub fn events(&self) -> impl Iterator<Item = &MemberDefinition> + '_ {
        self.target_members().filter(|m| m.is_event())
    }

    /// The target member defined for `method`
    pub fn target_method(&self, method: MethodRef) -> Option<&MemberDefinition> {
        self.target_members()
            .find(|m| m.method() == Some(method))
    }

    /// A target method by name
    pub fn find_method(&self, name: &str) -> Option<&MemberDefinition> {
        self.target_members()
            .find(|m| m.is_method() && m.name == name)
    }

    /// Member name qualified with its declaring type, for messages
    pub fn member_name(&self, id: MemberId) -> String {
        let member = self.member(id);
        let owner = match member.owner {
            MemberOwner::Target => self.full_name.as_str(),
            MemberOwner::Mixin(mixin) => self.mixins[mixin.index()].full_name.as_str(),
        };
        format!("{}.{}", owner, member.name)
    }

    /// All required types
    pub fn requirements(&self) -> &[RequiredTypeDefinition] {
        &self.requirements
    }

    /// A required type definition
    pub fn requirement(&self, id: RequirementId) -> &RequiredTypeDefinition {
        &self.requirements[id.index()]
    }

    /// The requirement of `kind` on `ty`
    pub fn find_requirement(&self, kind: RequirementKind, ty: TypeId) -> Option<&RequiredTypeDefinition> {
        self.requirements
            .iter()
            .find(|r| r.kind == kind && r.ty == ty)
    }

    /// Types mixins call on the target
    pub fn target_call_requirements(&self) -> impl Iterator<Item = &RequiredTypeDefinition> + '_ {
        self.requirements_of(RequirementKind::TargetCall)
    }

    /// Types mixins call on the next implementation
    pub fn next_call_requirements(&self) -> impl Iterator<Item = &RequiredTypeDefinition> + '_ {
        self.requirements_of(RequirementKind::NextCall)
    }

    /// Mixin types other mixins depend on
    pub fn mixin_requirements(&self) -> impl Iterator<Item = &RequiredTypeDefinition> + '_ {
        self.requirements_of(RequirementKind::Mixin)
    }

    fn requirements_of(&self, kind: RequirementKind) -> impl Iterator<Item = &RequiredTypeDefinition> + '_ {
        self.requirements.iter().filter(move |r| r.kind == kind)
    }

    /// A dependency definition
    pub fn dependency(&self, id: DependencyId) -> &DependencyDefinition {
        &self.dependencies[id.index()]
    }

    /// All dependency definitions
    pub fn dependencies(&self) -> &[DependencyDefinition] {
        &self.dependencies
    }

    /// Interfaces introduced by the mixins, in mixin order
    pub fn introduced_interfaces(&self) -> impl Iterator<Item = &InterfaceIntroduction> + '_ {
        self.mixins().flat_map(|m| m.interface_introductions.iter())
    }

    /// The introduction of `interface`, if any mixin introduces it
    pub fn interface_introduction(&self, interface: TypeId) -> Option<&InterfaceIntroduction> {
        self.introduced_interfaces()
            .find(|i| i.interface == interface)
    }

    /// Attributes introduced by the mixins, in mixin order
    pub fn introduced_attributes(&self) -> impl Iterator<Item = &AttributeIntroduction> + '_ {
        self.mixins().flat_map(|m| m.attribute_introductions.iter())
    }

    /// Interfaces the mixed type must implement
    pub fn composed_interfaces(&self) -> &[TypeId] {
        self.context.composed_interfaces()
    }

    /// Persistent mixins and whether inherited ones are included
    pub fn persistent_mixin_finder(&self) -> &PersistentMixinFinder {
        &self.persistence
    }

    /// Mixins whose state must be persisted with this class
    pub fn persistent_mixins(&self) -> &[TypeId] {
        self.persistence.persistent_mixins()
    }

    /// Definition of the nearest configured ancestor class
    pub fn base_class(&self) -> Option<&Arc<TargetClassDefinition>> {
        self.base_class.as_ref()
    }

    /// The least derived definition along the base class chain
    pub fn inheritance_root_class(&self) -> &TargetClassDefinition {
        let mut current = self;
        while let Some(base) = current.base_class.as_deref() {
            current = base;
        }
        current
    }

    /// Whether any target member is overridden by a mixin or any mixin
    /// member by the target
    pub fn has_overrides(&self) -> bool {
        self.members.iter().any(|m| m.has_overrides())
    }

    pub(crate) fn add_mixin(&mut self, mixin: MixinDefinition) -> MixinId {
        let id = mixin.id;
        self.mixins.push(mixin);
        self.order.push(id);
        id
    }

    pub(crate) fn add_member(
        &mut self,
        owner: MemberOwner,
        name: &str,
        kind: MemberKind,
        is_accessor: bool,
    ) -> MemberId {
        let id = MemberId::from_index(self.members.len());
        self.members.push(MemberDefinition {
            id,
            owner,
            name: name.to_string(),
            kind,
            is_accessor,
            overrides: Vec::new(),
            base_as_member: None,
        });
        match owner {
            MemberOwner::Target => self.target_members.push(id),
            MemberOwner::Mixin(mixin) => self.mixins[mixin.index()].members.push(id),
        }
        id
    }

    pub(crate) fn get_or_add_requirement(
        &mut self,
        kind: RequirementKind,
        ty: TypeId,
        full_name: String,
        is_aggregator: bool,
    ) -> RequirementId {
        if let Some(existing) = self.find_requirement(kind, ty) {
            return existing.id;
        }
        let id = RequirementId::from_index(self.requirements.len());
        self.requirements.push(RequiredTypeDefinition {
            id,
            kind,
            ty,
            full_name,
            is_aggregator,
            required_by: Vec::new(),
            methods: Vec::new(),
        });
        id
    }

    pub(crate) fn add_dependency(
        &mut self,
        kind: RequirementKind,
        depender: MixinId,
        requirement: RequirementId,
        aspect: Option<DependencyId>,
    ) -> DependencyId {
        let id = DependencyId::from_index(self.dependencies.len());
        let required_type = self.requirements[requirement.index()].ty;
        self.dependencies.push(DependencyDefinition {
            id,
            kind,
            depender,
            requirement,
            required_type,
            aspect,
            aggregated: Vec::new(),
            satisfier: None,
        });
        self.requirements[requirement.index()].required_by.push(id);
        match aspect {
            Some(parent) => self.dependencies[parent.index()].aggregated.push(id),
            None => {
                let mixin = &mut self.mixins[depender.index()];
                match kind {
                    RequirementKind::TargetCall => mixin.target_call_dependencies.push(id),
                    RequirementKind::NextCall => mixin.next_call_dependencies.push(id),
                    RequirementKind::Mixin => mixin.mixin_dependencies.push(id),
                }
            }
        }
        id
    }

    pub(crate) fn dependency_mut(&mut self, id: DependencyId) -> &mut DependencyDefinition {
        &mut self.dependencies[id.index()]
    }

    /// Record that `overrider` overrides `overridden`
    ///
    /// A member overrides at most one other member, and a member is
    /// overridden at most once per declaring side.
    pub(crate) fn declare_override(
        &mut self,
        overridden: MemberId,
        overrider: MemberId,
    ) -> ConfigurationResult<()> {
        if let Some(existing) = self.members[overrider.index()].base_as_member {
            return Err(ConfigurationError::DuplicateOverride {
                overridden: self.member_name(existing),
                existing: self.member_name(overrider),
                member: self.member_name(overrider),
            });
        }
        let owner = self.members[overrider.index()].owner;
        if let Some(&existing) = self.members[overridden.index()]
            .overrides
            .iter()
            .find(|&&o| self.members[o.index()].owner == owner)
        {
            return Err(ConfigurationError::DuplicateOverride {
                overridden: self.member_name(overridden),
                existing: self.member_name(existing),
                member: self.member_name(overrider),
            });
        }
        self.members[overridden.index()].overrides.push(overrider);
        self.members[overrider.index()].base_as_member = Some(overridden);
        Ok(())
    }

    /// Apply the dependency order and renumber the mixins
    pub(crate) fn set_order(&mut self, order: Vec<MixinId>) {
        for (index, id) in order.iter().enumerate() {
            self.mixins[id.index()].mixin_index = index;
        }
        self.order = order;
    }

    /// Sort every override list by the overriding mixin's position
    pub(crate) fn sort_overrides(&mut self) {
        let positions: Vec<usize> = self.mixins.iter().map(|m| m.mixin_index).collect();
        let owners: Vec<MemberOwner> = self.members.iter().map(|m| m.owner).collect();
        for member in &mut self.members {
            member.overrides.sort_by_key(|o| match owners[o.index()] {
                MemberOwner::Target => usize::MAX,
                MemberOwner::Mixin(mixin) => positions[mixin.index()],
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MixinKind;
    use braid_types::{MemberVisibility, MethodRef};

    fn definition() -> TargetClassDefinition {
        let context = Arc::new(ClassContext::new(TypeId(1)));
        let mut def = TargetClassDefinition::new(context, "T.Target".to_string(), false);
        for (index, name) in ["T.M1", "T.M2"].iter().enumerate() {
            def.add_mixin(MixinDefinition::new(
                MixinId::from_index(index),
                TypeId(10 + index as u32),
                name.to_string(),
                MixinKind::Extending,
                MemberVisibility::Private,
            ));
        }
        def
    }

    fn method(def: &mut TargetClassDefinition, owner: MemberOwner, index: usize) -> MemberId {
        def.add_member(
            owner,
            "Run",
            MemberKind::Method {
                method: MethodRef::new(TypeId(1), index),
            },
            false,
        )
    }

    #[test]
    fn test_base_as_member_is_single_assignment() {
        let mut def = definition();
        let target = method(&mut def, MemberOwner::Target, 0);
        let other = method(&mut def, MemberOwner::Target, 1);
        let overrider = method(&mut def, MemberOwner::Mixin(MixinId(0)), 2);

        def.declare_override(target, overrider).unwrap();
        assert_eq!(def.member(overrider).base_as_member(), Some(target));
        assert_eq!(def.member(target).overrides(), &[overrider]);

        let err = def.declare_override(other, overrider).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateOverride { .. }));
        assert!(def.member(other).overrides().is_empty());
    }

    #[test]
    fn test_one_override_per_mixin() {
        let mut def = definition();
        let target = method(&mut def, MemberOwner::Target, 0);
        let first = method(&mut def, MemberOwner::Mixin(MixinId(0)), 1);
        let second = method(&mut def, MemberOwner::Mixin(MixinId(0)), 2);

        def.declare_override(target, first).unwrap();
        assert!(def.declare_override(target, second).is_err());
    }

    #[test]
    fn test_overrides_follow_mixin_order() {
        let mut def = definition();
        let target = method(&mut def, MemberOwner::Target, 0);
        let from_first = method(&mut def, MemberOwner::Mixin(MixinId(0)), 1);
        let from_second = method(&mut def, MemberOwner::Mixin(MixinId(1)), 2);
        def.declare_override(target, from_first).unwrap();
        def.declare_override(target, from_second).unwrap();

        def.set_order(vec![MixinId(1), MixinId(0)]);
        def.sort_overrides();
        assert_eq!(def.member(target).overrides(), &[from_second, from_first]);
        assert_eq!(def.mixin_types(), vec![TypeId(11), TypeId(10)]);
        assert_eq!(def.mixin_by_id(MixinId(0)).mixin_index(), 1);
    }
}
