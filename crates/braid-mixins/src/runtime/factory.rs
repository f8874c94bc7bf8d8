//! Type and object factories
//!
//! [`TypeFactory`] maps a requested type to its concrete mixed type,
//! building the target class definition and generating the type on first
//! use. [`ObjectFactory`] instantiates mixed types and wires their mixin
//! instances.

use std::sync::Arc;

use braid_types::{ConstructorRef, TypeId, TypeUniverse, Value, Visibility};

use super::interpreter::Runtime;
use crate::cache::TargetClassDefinitionCache;
use crate::codegen::{
    mixin_field, ConcreteType, ConcreteTypeBuilder, DEPTH_FIELD, FIRST_FIELD, NEXT_FIELD,
    TARGET_FIELD, THIS_FIELD,
};
use crate::context::MixinConfiguration;
use crate::definitions::TargetClassDefinition;
use crate::error::{MixinError, MixinResult};

/// Whether unconfigured types get a generated type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationPolicy {
    /// Unconfigured types are used as they are
    #[default]
    GenerateOnlyIfConfigured,
    /// Generate a mixed type even without mixins
    ForceGeneration,
}

/// Type factory settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeFactoryOptions {
    /// Name template of generated types; `{type}` and `{index}` are replaced
    pub name_template: String,
    /// Whether object creation may use non-public constructors
    pub allow_non_public_constructors: bool,
}

impl Default for TypeFactoryOptions {
    fn default() -> Self {
        Self {
            name_template: crate::codegen::DEFAULT_NAME_TEMPLATE.to_string(),
            allow_non_public_constructors: false,
        }
    }
}

/// Maps requested types to concrete mixed types
#[derive(Debug)]
pub struct TypeFactory {
    universe: Arc<TypeUniverse>,
    configuration: Arc<MixinConfiguration>,
    definitions: TargetClassDefinitionCache,
    builder: ConcreteTypeBuilder,
    options: TypeFactoryOptions,
}

impl TypeFactory {
    /// Factory for `configuration` with default options
    pub fn new(configuration: Arc<MixinConfiguration>) -> Self {
        Self::with_options(configuration, TypeFactoryOptions::default())
    }

    /// Factory for `configuration`
    pub fn with_options(configuration: Arc<MixinConfiguration>, options: TypeFactoryOptions) -> Self {
        let universe = Arc::clone(configuration.universe());
        Self {
            definitions: TargetClassDefinitionCache::new(Arc::clone(&universe)),
            builder: ConcreteTypeBuilder::new(Arc::clone(&universe))
                .with_name_template(&options.name_template),
            universe,
            configuration,
            options,
        }
    }

    /// The universe types are generated into
    pub fn universe(&self) -> &Arc<TypeUniverse> {
        &self.universe
    }

    /// The active configuration
    pub fn configuration(&self) -> &Arc<MixinConfiguration> {
        &self.configuration
    }

    /// Settings
    pub fn options(&self) -> &TypeFactoryOptions {
        &self.options
    }

    /// The concrete type builder, for scope management
    pub fn builder(&self) -> &ConcreteTypeBuilder {
        &self.builder
    }

    /// The definition cache
    pub fn definitions(&self) -> &TargetClassDefinitionCache {
        &self.definitions
    }

    /// The target class definition of `ty`, if it is configured
    pub fn definition(&self, ty: TypeId) -> MixinResult<Option<Arc<TargetClassDefinition>>> {
        match self.configuration.get_context(ty) {
            Some(context) => Ok(Some(self.definitions.get_or_build(&self.configuration, &context)?)),
            None => Ok(None),
        }
    }

    /// The generated type for `ty`, or `None` when `ty` is used as it is
    pub fn concrete_type(&self, ty: TypeId, policy: GenerationPolicy) -> MixinResult<Option<Arc<ConcreteType>>> {
        let context = match (self.configuration.get_context(ty), policy) {
            (Some(context), _) => context,
            (None, GenerationPolicy::ForceGeneration) => self.configuration.get_context_force(ty),
            (None, GenerationPolicy::GenerateOnlyIfConfigured) => return Ok(None),
        };
        let definition = self.definitions.get_or_build(&self.configuration, &context)?;
        Ok(Some(self.builder.get_or_create(&definition)?))
    }

    /// The type to instantiate for a request of `ty`
    pub fn get_concrete_type(&self, ty: TypeId, policy: GenerationPolicy) -> MixinResult<TypeId> {
        Ok(self
            .concrete_type(ty, policy)?
            .map(|concrete| concrete.type_id())
            .unwrap_or(ty))
    }
}

/// Creates instances of mixed types
#[derive(Debug, Clone)]
pub struct ObjectFactory {
    types: Arc<TypeFactory>,
    policy: GenerationPolicy,
}

impl ObjectFactory {
    /// Factory creating objects through `types`
    pub fn new(types: Arc<TypeFactory>) -> Self {
        Self {
            types,
            policy: GenerationPolicy::GenerateOnlyIfConfigured,
        }
    }

    /// Use `policy` for unconfigured types
    pub fn with_policy(mut self, policy: GenerationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The type factory
    pub fn types(&self) -> &Arc<TypeFactory> {
        &self.types
    }

    /// Create an instance for a request of `ty`
    ///
    /// `mixin_instances` replace the instances the factory would create;
    /// each must be assignable to exactly one configured mixin. The
    /// constructor taking `args` runs after the mixins are wired, so it
    /// can already call into them.
    #[tracing::instrument(level = "debug", skip_all, fields(ty = %self.types.universe().full_name(ty)))]
    pub fn create(
        &self,
        runtime: &mut Runtime,
        ty: TypeId,
        args: Vec<Value>,
        mixin_instances: Vec<Value>,
    ) -> MixinResult<Value> {
        let universe = Arc::clone(self.types.universe());
        let concrete = self.types.concrete_type(ty, self.policy)?;
        let instance_type = concrete.as_ref().map(|c| c.type_id()).unwrap_or(ty);
        let def = universe.get(instance_type);
        if def.is_abstract || def.is_interface() {
            return Err(MixinError::MissingMethod(format!(
                "Cannot create an instance of abstract type '{}'",
                def.full_name()
            )));
        }

        let slots = match &concrete {
            Some(concrete) => assign_instances(runtime, concrete, mixin_instances)?,
            None => {
                if let Some(supplied) = mixin_instances.first() {
                    return Err(unconfigured(runtime, supplied, &universe.full_name(ty)));
                }
                Vec::new()
            }
        };

        let constructor = self.find_constructor(instance_type, args.len())?;
        let instance = runtime.allocate(instance_type);
        if let Some(concrete) = &concrete {
            wire_mixins(runtime, concrete, &instance, slots)?;
        }
        if let Some(constructor) = constructor {
            runtime.construct(&instance, constructor, args)?;
        }
        tracing::debug!(ty = %def.full_name(), "created object");
        Ok(instance)
    }

    fn find_constructor(&self, ty: TypeId, arity: usize) -> MixinResult<Option<ConstructorRef>> {
        let universe = self.types.universe();
        let def = universe.get(ty);
        if def.constructors.is_empty() && arity == 0 {
            return Ok(None);
        }
        let index = def
            .constructors
            .iter()
            .position(|c| !c.attributes.is_static() && c.parameters.len() == arity)
            .ok_or_else(|| {
                MixinError::MissingMethod(format!(
                    "Type '{}' has no constructor taking {} argument(s)",
                    def.full_name(),
                    arity
                ))
            })?;
        let constructor = &def.constructors[index];
        if constructor.attributes.visibility() != Visibility::Public
            && !self.types.options().allow_non_public_constructors
        {
            return Err(MixinError::MissingMethod(format!(
                "The constructor of '{}' taking {} argument(s) is not public; allow non-public constructors to use it",
                def.full_name(),
                arity
            )));
        }
        Ok(Some(ConstructorRef::new(ty, index)))
    }
}

/// Sort supplied mixin instances into their slots; empty slots get a new
/// instance later
fn assign_instances(
    runtime: &Runtime,
    concrete: &ConcreteType,
    supplied: Vec<Value>,
) -> MixinResult<Vec<Option<Value>>> {
    let definition = concrete.definition();
    let universe = runtime.universe();
    let mut slots: Vec<Option<Value>> = vec![None; definition.mixin_count()];
    for instance in supplied {
        let instance_type = runtime
            .type_of(&instance)
            .ok_or_else(|| MixinError::NotAnObject(instance.to_string()))?;
        let slot = definition
            .mixins()
            .find(|mixin| universe.is_assignable(mixin.ty(), instance_type))
            .map(|mixin| mixin.mixin_index())
            .ok_or_else(|| unconfigured(runtime, &instance, definition.full_name()))?;
        slots[slot] = Some(instance);
    }
    Ok(slots)
}

fn unconfigured(runtime: &Runtime, instance: &Value, target: &str) -> MixinError {
    let mixin = runtime
        .type_of(instance)
        .map(|ty| runtime.universe().full_name(ty))
        .unwrap_or_else(|| instance.to_string());
    MixinError::UnconfiguredMixinInstance {
        mixin,
        target: target.to_string(),
    }
}

fn new_proxy(runtime: &mut Runtime, concrete: &ConcreteType, target: &Value, depth: usize) -> MixinResult<Value> {
    let proxy = runtime.allocate(concrete.proxy_type());
    runtime.set_field(&proxy, THIS_FIELD, target.clone())?;
    runtime.set_field(&proxy, DEPTH_FIELD, Value::Int(depth as i64))?;
    Ok(proxy)
}

/// Create missing mixin instances and link every mixin to the target and
/// its next-call proxy
fn wire_mixins(
    runtime: &mut Runtime,
    concrete: &ConcreteType,
    target: &Value,
    slots: Vec<Option<Value>>,
) -> MixinResult<()> {
    for (index, slot) in slots.into_iter().enumerate() {
        let mixin = match slot {
            Some(mixin) => mixin,
            None => runtime.instantiate(concrete.mixin_instance_types()[index], Vec::new())?,
        };
        runtime.set_field(&mixin, TARGET_FIELD, target.clone())?;
        let next = new_proxy(runtime, concrete, target, index)?;
        runtime.set_field(&mixin, NEXT_FIELD, next)?;
        runtime.set_field(target, &mixin_field(index), mixin)?;
    }
    let first = new_proxy(runtime, concrete, target, concrete.definition().mixin_count())?;
    runtime.set_field(target, FIRST_FIELD, first)?;
    Ok(())
}
