//! Member collection
//!
//! Instance methods, properties and events that are not private, taking
//! the most derived declaration along the base chain. Accessor methods
//! are collected with their property or event, not as plain methods.

use braid_types::{EventRef, MethodRef, PropertyRef, TypeId, Visibility};
use rustc_hash::FxHashSet;

use super::DefinitionBuild;
use crate::definitions::{MemberId, MemberKind, MemberOwner, MixinId};

impl DefinitionBuild<'_> {
    pub(super) fn collect_members(&mut self) {
        let target = self.target_type();
        self.collect_members_of(MemberOwner::Target, target);
        for id in self.mixin_ids() {
            let ty = self.def.mixins[id.index()].ty;
            self.collect_members_of(MemberOwner::Mixin(id), ty);
        }
    }

    fn collect_members_of(&mut self, owner: MemberOwner, ty: TypeId) {
        for method in self.universe.instance_methods(ty) {
            let handle = self.universe.method(method);
            let def = handle.def();
            if def.attributes.visibility() == Visibility::Private {
                continue;
            }
            if handle
                .owner()
                .accessor_indices()
                .contains(&method.index)
            {
                continue;
            }
            self.def
                .add_member(owner, &def.name, MemberKind::Method { method }, false);
        }

        let mut seen_properties = FxHashSet::default();
        let mut seen_events = FxHashSet::default();
        for declaring in self.universe.base_chain(ty) {
            let def = self.universe.get(declaring);
            for (index, property) in def.properties.iter().enumerate() {
                if !seen_properties.insert(property.name.clone()) {
                    continue;
                }
                let [getter, setter] =
                    self.add_accessors(owner, declaring, [property.getter, property.setter]);
                if getter.is_none() && setter.is_none() {
                    continue;
                }
                self.def.add_member(
                    owner,
                    &property.name,
                    MemberKind::Property {
                        property: PropertyRef::new(declaring, index),
                        getter,
                        setter,
                    },
                    false,
                );
            }
            for (index, event) in def.events.iter().enumerate() {
                if !seen_events.insert(event.name.clone()) {
                    continue;
                }
                let [add, remove] =
                    self.add_accessors(owner, declaring, [event.add_method, event.remove_method]);
                if add.is_none() && remove.is_none() {
                    continue;
                }
                self.def.add_member(
                    owner,
                    &event.name,
                    MemberKind::Event {
                        event: EventRef::new(declaring, index),
                        add,
                        remove,
                    },
                    false,
                );
            }
        }
        tracing::trace!(owner = ?owner, ty = %self.universe.full_name(ty), "collected members");
    }

    /// Add the visible accessors of a property or event
    fn add_accessors(
        &mut self,
        owner: MemberOwner,
        declaring: TypeId,
        accessors: [Option<u32>; 2],
    ) -> [Option<MemberId>; 2] {
        accessors.map(|index| {
            let method = MethodRef::new(declaring, index? as usize);
            let handle = self.universe.method(method);
            let def = handle.def();
            if def.attributes.visibility() == Visibility::Private || def.attributes.is_static() {
                return None;
            }
            Some(
                self.def
                    .add_member(owner, &def.name, MemberKind::Method { method }, true),
            )
        })
    }

    /// The method a member definition stands for, if it is a method
    pub(super) fn member_method(&self, id: MemberId) -> Option<MethodRef> {
        self.def.member(id).method()
    }

    pub(super) fn mixin_members(&self, mixin: MixinId) -> Vec<MemberId> {
        self.def.mixins[mixin.index()].members.clone()
    }
}
