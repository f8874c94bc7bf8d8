//! Concrete type builder
//!
//! Owns the current module scope and generates mixed types into it. A
//! type is generated at most once per class context and scope; resetting
//! the scope with [`ConcreteTypeBuilder::set_current`] makes the next
//! request generate again.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use braid_pipe::{
    ConstructorDescriptor, MutableType, PipeError, PipeResult, TypeEmitter, UniverseEmitter,
};
use braid_types::{
    ConstructorRef, CoreTypes, Dispatch, Expr, MemberVisibility, MethodAttributes, MethodBody,
    MethodRef, TypeId, TypeRef, TypeUniverse, Visibility,
};
use parking_lot::RwLock;

use super::mixin_type::build_mixin_type;
use super::module_scope::{ConcreteType, ModuleScope};
use super::next_call_proxy::{build_proxy, overridden_methods, OverriddenMethod};
use super::{forwarding_method, mixin_field, FIRST_FIELD};
use crate::definitions::{
    AttributeTarget, InterfaceIntroduction, MemberKind, Satisfier, TargetClassDefinition,
};
use crate::error::{MixinError, MixinResult};

/// Default name of generated mixed types
pub const DEFAULT_NAME_TEMPLATE: &str = "{type}_Mixed_{index}";

/// Generates concrete mixed types
pub struct ConcreteTypeBuilder {
    universe: Arc<TypeUniverse>,
    emitter: Box<dyn TypeEmitter + Send + Sync>,
    current: RwLock<Option<Arc<ModuleScope>>>,
    next_scope: AtomicU64,
    next_index: AtomicUsize,
    name_template: String,
}

impl std::fmt::Debug for ConcreteTypeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcreteTypeBuilder")
            .field("current", &self.current.read().as_ref().map(|s| s.id()))
            .field("name_template", &self.name_template)
            .finish()
    }
}

impl ConcreteTypeBuilder {
    /// Builder emitting into `universe`
    pub fn new(universe: Arc<TypeUniverse>) -> Self {
        Self::with_emitter(universe, Box::new(UniverseEmitter::new()))
    }

    /// Builder using another code-generation backend
    pub fn with_emitter(universe: Arc<TypeUniverse>, emitter: Box<dyn TypeEmitter + Send + Sync>) -> Self {
        Self {
            universe,
            emitter,
            current: RwLock::new(None),
            next_scope: AtomicU64::new(1),
            next_index: AtomicUsize::new(0),
            name_template: DEFAULT_NAME_TEMPLATE.to_string(),
        }
    }

    /// Name generated types with `template`; `{type}` is replaced by the
    /// target name and `{index}` by a running number
    pub fn with_name_template(mut self, template: &str) -> Self {
        self.name_template = template.to_string();
        self
    }

    /// The current scope, created on first use
    pub fn current_scope(&self) -> Arc<ModuleScope> {
        if let Some(scope) = self.current.read().as_ref() {
            return Arc::clone(scope);
        }
        let mut current = self.current.write();
        match current.as_ref() {
            Some(scope) => Arc::clone(scope),
            None => {
                let scope = Arc::new(ModuleScope::new(self.next_scope.fetch_add(1, Ordering::Relaxed)));
                tracing::debug!(scope = scope.id(), "created module scope");
                *current = Some(Arc::clone(&scope));
                scope
            }
        }
    }

    /// Replace the current scope; `None` makes the next request start a
    /// new one
    pub fn set_current(&self, scope: Option<Arc<ModuleScope>>) {
        *self.current.write() = scope;
    }

    /// The concrete type for `definition`, generating it on first request
    pub fn get_or_create(&self, definition: &Arc<TargetClassDefinition>) -> MixinResult<Arc<ConcreteType>> {
        let scope = self.current_scope();
        let cell = scope.cell(definition.context());
        cell.get_or_try_init(|| self.generate(&scope, definition).map(Arc::new))
            .cloned()
    }

    #[tracing::instrument(level = "debug", skip_all, fields(target = %definition.full_name()))]
    fn generate(&self, scope: &ModuleScope, definition: &Arc<TargetClassDefinition>) -> MixinResult<ConcreteType> {
        let target = self.universe.get(definition.ty());
        let name = self.next_name(&target.namespace, &target.name);
        let full_name = join(&target.namespace, &name);
        let generation_error = |source: PipeError| MixinError::CodeGeneration {
            type_name: full_name.clone(),
            source,
        };

        let mut mixin_instance_types = Vec::with_capacity(definition.mixin_count());
        for mixin in definition.mixins() {
            let mixin_name = format!("{}_{}", name, self.universe.get(mixin.ty()).name);
            let described = build_mixin_type(
                &self.universe,
                definition,
                mixin,
                &mixin_name,
                scope.module_name(),
            )
            .map_err(generation_error)?;
            let instance_type = match described {
                Some(ty) => self.emitter.emit(&ty).map_err(generation_error)?,
                None => mixin.ty(),
            };
            mixin_instance_types.push(instance_type);
        }

        let overridden = overridden_methods(definition);
        let proxy = build_proxy(
            &self.universe,
            definition,
            &overridden,
            &target.namespace,
            &format!("{}_NextCallProxy", name),
            scope.module_name(),
        )
        .map_err(generation_error)?;
        let proxy_type = self.emitter.emit(&proxy).map_err(generation_error)?;

        let mixed = self
            .describe_mixed_type(definition, &name, scope.module_name(), proxy_type, &overridden)
            .map_err(generation_error)?;
        let type_id = self.emitter.emit(&mixed).map_err(generation_error)?;
        tracing::debug!(ty = %full_name, proxy = %proxy_type, "generated concrete type");

        Ok(ConcreteType {
            type_id,
            definition: Arc::clone(definition),
            proxy_type,
            mixin_instance_types,
        })
    }

    fn describe_mixed_type(
        &self,
        definition: &TargetClassDefinition,
        name: &str,
        module: &str,
        proxy_type: TypeId,
        overridden: &[OverriddenMethod],
    ) -> PipeResult<MutableType> {
        let universe = &self.universe;
        let target_type = definition.ty();
        let target = universe.get(target_type);
        let mut ty = MutableType::derived_from(Arc::clone(universe), target_type, &target.namespace, name, module);
        ty.set_generated_from(target_type);

        ty.add_field(FIRST_FIELD, TypeRef::Named(proxy_type), Visibility::Private)?;
        for mixin in definition.mixins() {
            ty.add_field(&mixin_field(mixin.mixin_index()), TypeRef::Named(mixin.ty()), Visibility::Private)?;
        }
        if let Some(core) = CoreTypes::lookup(universe) {
            if !ty.implemented_interfaces().contains(&core.mixin_target) {
                ty.add_interface(core.mixin_target)?;
            }
        }

        // overridden target members enter the chain through the proxy
        let proxy = universe.get(proxy_type);
        for method in overridden {
            let handle = universe.method(method.target_method);
            let def = handle.def();
            let proxy_method = proxy
                .find_method(&def.name, &def.signature())
                .map(|index| MethodRef::new(proxy_type, index))
                .ok_or_else(|| PipeError::CodeGeneration {
                    type_name: ty.full_name(),
                    reason: format!("the proxy has no method for '{}'", handle.qualified_name()),
                })?;
            let id = ty.get_or_add_override(method.target_method)?;
            let body = Expr::forward(Expr::this_field(FIRST_FIELD), proxy_method, def.arity(), Dispatch::Virtual);
            if let Some(mutable) = ty.method_mut(id) {
                mutable.set_body(MethodBody::Expression(body))?;
            }
        }
        let abstract_left = universe.instance_methods(target_type).into_iter().any(|method| {
            universe.method(method).def().attributes.is_abstract()
                && !overridden.iter().any(|o| o.target_method == method)
        });
        ty.set_abstract(abstract_left && definition.is_abstract());

        for introduction in definition.introduced_interfaces() {
            self.introduce_interface(&mut ty, definition, introduction)?;
        }
        self.implement_composed_interfaces(&mut ty, definition)?;

        for introduction in definition.introduced_attributes() {
            match introduction.target {
                AttributeTarget::Class => ty.add_custom_attribute(introduction.attribute.clone())?,
                AttributeTarget::Member(member) => {
                    let methods = match definition.member(member).kind() {
                        MemberKind::Method { method } => vec![*method],
                        _ => definition
                            .member(member)
                            .accessors()
                            .iter()
                            .flatten()
                            .filter_map(|&accessor| definition.member(accessor).method())
                            .collect(),
                    };
                    for method in methods {
                        let id = ty.get_or_add_override(method)?;
                        ty.add_method_custom_attribute(id, introduction.attribute.clone())?;
                    }
                }
            }
        }

        for (index, constructor) in target.constructors.iter().enumerate() {
            if constructor.attributes.is_static() {
                continue;
            }
            let body = Expr::BaseConstructor {
                constructor: ConstructorRef::new(target_type, index),
                arguments: Expr::forwarded_arguments(constructor.parameters.len()),
            };
            ty.add_constructor(ConstructorDescriptor::like(constructor, MethodBody::Expression(body)))?;
        }
        Ok(ty)
    }

    /// Forward the members of an introduced interface to the introducing
    /// mixin, as public members or as explicit interface implementations
    fn introduce_interface(
        &self,
        ty: &mut MutableType,
        definition: &TargetClassDefinition,
        introduction: &InterfaceIntroduction,
    ) -> PipeResult<()> {
        let universe = &self.universe;
        if !ty.implemented_interfaces().contains(&introduction.interface) {
            ty.add_interface(introduction.interface)?;
        }
        let slot = mixin_field(definition.mixin_by_id(introduction.introducer).mixin_index());
        let target = definition.ty();

        for member in &introduction.members {
            let handle = universe.method(member.interface_member);
            let def = handle.def();
            let signature = def.signature();
            let body = Expr::forward(
                Expr::this_field(&slot),
                member.interface_member,
                def.arity(),
                Dispatch::Virtual,
            );
            let name_taken = universe.find_method(target, &def.name, &signature).is_some()
                || ty
                    .added_methods()
                    .iter()
                    .any(|m| m.name() == def.name && m.signature() == signature);
            if introduction.visibility == MemberVisibility::Public && !name_taken {
                ty.add_method(forwarding_method(
                    universe,
                    member.interface_member,
                    &def.name,
                    MethodAttributes::public_virtual(),
                    body,
                ))?;
            } else {
                ty.add_explicit_override(member.interface_member, Some(MethodBody::Expression(body)))?;
            }
        }
        Ok(())
    }

    /// Composed interfaces and duck-typed target-call requirements become
    /// interfaces of the mixed type
    fn implement_composed_interfaces(&self, ty: &mut MutableType, definition: &TargetClassDefinition) -> PipeResult<()> {
        let universe = &self.universe;
        let mut interfaces: Vec<TypeId> = definition.composed_interfaces().to_vec();
        for requirement in definition.target_call_requirements() {
            let duck_typed = requirement.required_by().iter().any(|&d| {
                definition.dependency(d).satisfier() == Some(Satisfier::TargetDuckTyped)
            });
            if duck_typed && !interfaces.contains(&requirement.ty()) {
                interfaces.push(requirement.ty());
            }
        }

        for interface in interfaces {
            if ty.implemented_interfaces().contains(&interface) {
                continue;
            }
            let mut closure = vec![interface];
            closure.extend(universe.all_interfaces(interface));
            // interfaces the mixed type does not implement yet need
            // explicit forwarding for members only a mixin provides
            let missing: Vec<TypeId> = closure
                .into_iter()
                .filter(|&i| !ty.implemented_interfaces().contains(&i))
                .collect();
            ty.add_interface(interface)?;
            for part in missing {
                for index in 0..universe.get(part).methods.len() {
                    let interface_method = MethodRef::new(part, index);
                    let def = universe.method(interface_method).def().clone();
                    let on_target = ty.underlying().and_then(|t| {
                        universe
                            .find_method(t, &def.name, &def.signature())
                            .filter(|&m| universe.method(m).def().attributes.visibility() == Visibility::Public)
                    });
                    if on_target.is_some() {
                        continue;
                    }
                    let implementer = definition.mixins().find(|m| universe.is_assignable(part, m.ty()));
                    let body = match implementer {
                        Some(mixin) => Expr::forward(
                            Expr::this_field(&mixin_field(mixin.mixin_index())),
                            interface_method,
                            def.arity(),
                            Dispatch::Virtual,
                        ),
                        None => Expr::Fail(format!(
                            "No implementation of '{}' on '{}'",
                            universe.method(interface_method).qualified_name(),
                            definition.full_name()
                        )),
                    };
                    ty.add_explicit_override(interface_method, Some(MethodBody::Expression(body)))?;
                }
            }
        }
        Ok(())
    }

    fn next_name(&self, namespace: &str, type_name: &str) -> String {
        loop {
            let index = self.next_index.fetch_add(1, Ordering::Relaxed);
            let name = self
                .name_template
                .replace("{type}", type_name)
                .replace("{index}", &index.to_string());
            if self.universe.find(&join(namespace, &name)).is_none() {
                return name;
            }
        }
    }
}

fn join(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", namespace, name)
    }
}
