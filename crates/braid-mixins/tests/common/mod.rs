//! Shared fixtures for the integration tests
//!
//! A small sample domain: `BaseType1` mixed with `BT1Mixin1` and
//! `BT1Mixin2`, both of which override `VirtualMethod` and call the next
//! implementation; `BaseType2` implements `IBaseType2`, `BaseType3` does
//! not.

#![allow(dead_code)]

use std::sync::Arc;

use braid_mixins::{MixinCalls, MixinConfiguration, MixinConfigurationBuilder};
use braid_types::{
    AttributeData, AttributeUsage, CoreTypes, MethodBody, MethodDefBuilder, TypeDefBuilder,
    TypeId, TypeRef, TypeUniverse, Value, Visibility,
};

pub const NS: &str = "Braid.Samples";

pub struct Fixtures {
    pub universe: Arc<TypeUniverse>,
    pub core: CoreTypes,
    pub bt1_attribute: TypeId,
    pub ivirtual: TypeId,
    pub ibt1_mixin1: TypeId,
    pub ibase_type2: TypeId,
    pub icomposed: TypeId,
    pub base_type1: TypeId,
    pub derived_type1: TypeId,
    pub base_type2: TypeId,
    pub base_type3: TypeId,
    pub bt1_mixin1: TypeId,
    pub bt1_mixin2: TypeId,
    pub bt2_mixin: TypeId,
    pub bt3_mixin: TypeId,
    pub hidden_ctor_type: TypeId,
    pub unrelated: TypeId,
}

/// Native body wrapping the next implementation: `Name(next)`
fn wrapping_next(name: &'static str) -> MethodDefBuilder {
    MethodDefBuilder::new("VirtualMethod")
        .returns(TypeRef::Str)
        .as_virtual()
        .overrides_target()
        .native(move |ctx, _| {
            let next = ctx.call_next("VirtualMethod", Vec::new())?;
            Ok(Value::Str(format!("{}({})", name, next)))
        })
}

pub fn fixtures() -> Fixtures {
    let universe = Arc::new(TypeUniverse::new());
    let core = CoreTypes::install(&universe).unwrap();

    let bt1_attribute = TypeDefBuilder::attribute(NS, "BT1Attribute", core.attribute, AttributeUsage::default())
        .constructor(&[], MethodBody::Empty)
        .define(&universe)
        .unwrap();

    let ivirtual = TypeDefBuilder::interface(NS, "IVirtual")
        .method(MethodDefBuilder::new("VirtualMethod").returns(TypeRef::Str))
        .define(&universe)
        .unwrap();
    let ibt1_mixin1 = TypeDefBuilder::interface(NS, "IBT1Mixin1")
        .method(MethodDefBuilder::new("IntroducedMethod").returns(TypeRef::Str))
        .define(&universe)
        .unwrap();
    let ibase_type2 = TypeDefBuilder::interface(NS, "IBaseType2")
        .method(MethodDefBuilder::new("IfcMethod").returns(TypeRef::Str))
        .define(&universe)
        .unwrap();

    let base_type1 = TypeDefBuilder::class(NS, "BaseType1")
        .extends(core.object)
        .constructor(&[], MethodBody::Empty)
        .field("name", TypeRef::Str)
        .constructor(
            &[("name", TypeRef::Str)],
            MethodBody::Expression(braid_types::Expr::Assign {
                instance: Box::new(braid_types::Expr::This),
                name: "name".to_string(),
                value: Box::new(braid_types::Expr::Argument(0)),
            }),
        )
        .method(
            MethodDefBuilder::new("VirtualMethod")
                .returns(TypeRef::Str)
                .as_virtual()
                .returning("BaseType1.VirtualMethod"),
        )
        .method(MethodDefBuilder::new("PlainMethod").returns(TypeRef::Str).returning("plain"))
        .define(&universe)
        .unwrap();
    let derived_type1 = TypeDefBuilder::class(NS, "DerivedType1")
        .extends(base_type1)
        .constructor(&[], MethodBody::Empty)
        .define(&universe)
        .unwrap();

    let icomposed = TypeDefBuilder::interface(NS, "IBaseType1Composed")
        .implements(ivirtual)
        .implements(ibt1_mixin1)
        .define(&universe)
        .unwrap();

    let bt1_mixin1 = TypeDefBuilder::class(NS, "BT1Mixin1")
        .extends(core.object)
        .implements(ibt1_mixin1)
        .constructor(&[], MethodBody::Empty)
        .attribute_data(AttributeData::new(bt1_attribute))
        .method(
            MethodDefBuilder::new("IntroducedMethod")
                .returns(TypeRef::Str)
                .as_virtual()
                .native(|ctx, _| {
                    let target = ctx.target()?;
                    let name = ctx.field(&target, "name")?;
                    Ok(Value::Str(format!("BT1Mixin1.IntroducedMethod on {}", name)))
                }),
        )
        .method(wrapping_next("BT1Mixin1"))
        .define(&universe)
        .unwrap();
    let bt1_mixin2 = TypeDefBuilder::class(NS, "BT1Mixin2")
        .extends(core.object)
        .constructor(&[], MethodBody::Empty)
        .method(wrapping_next("BT1Mixin2"))
        .define(&universe)
        .unwrap();

    let base_type2 = TypeDefBuilder::class(NS, "BaseType2")
        .extends(core.object)
        .implements(ibase_type2)
        .constructor(&[], MethodBody::Empty)
        .method(
            MethodDefBuilder::new("IfcMethod")
                .returns(TypeRef::Str)
                .as_virtual()
                .returning("BaseType2.IfcMethod"),
        )
        .define(&universe)
        .unwrap();
    let bt2_mixin = TypeDefBuilder::class(NS, "BT2Mixin")
        .extends(core.object)
        .requires_target(ibase_type2)
        .constructor(&[], MethodBody::Empty)
        .method(
            MethodDefBuilder::new("Describe")
                .returns(TypeRef::Str)
                .native(|ctx, _| {
                    let answer = ctx.call_target("IfcMethod", Vec::new())?;
                    Ok(Value::Str(format!("target says {}", answer)))
                }),
        )
        .define(&universe)
        .unwrap();

    let base_type3 = TypeDefBuilder::class(NS, "BaseType3")
        .extends(core.object)
        .constructor(&[], MethodBody::Empty)
        .method(
            MethodDefBuilder::new("Hook")
                .returns(TypeRef::Str)
                .as_virtual()
                .overrides_mixin(None)
                .returning("BaseType3.Hook"),
        )
        .define(&universe)
        .unwrap();
    let bt3_mixin = TypeDefBuilder::class(NS, "BT3Mixin")
        .extends(core.object)
        .abstract_class()
        .constructor(&[], MethodBody::Empty)
        .method(MethodDefBuilder::new("Hook").returns(TypeRef::Str).as_abstract())
        .method(
            MethodDefBuilder::new("Describe")
                .returns(TypeRef::Str)
                .native(|ctx, _| {
                    let this = ctx.this();
                    let hook = ctx.call(&this, "Hook", Vec::new())?;
                    Ok(Value::Str(format!("hooked: {}", hook)))
                }),
        )
        .define(&universe)
        .unwrap();

    let hidden_ctor_type = TypeDefBuilder::class(NS, "HiddenCtorType")
        .extends(core.object)
        .constructor_with_visibility(&[], MethodBody::Empty, Visibility::Family)
        .method(
            MethodDefBuilder::new("VirtualMethod")
                .returns(TypeRef::Str)
                .as_virtual()
                .returning("HiddenCtorType.VirtualMethod"),
        )
        .define(&universe)
        .unwrap();
    let unrelated = TypeDefBuilder::class(NS, "Unrelated")
        .extends(core.object)
        .constructor(&[], MethodBody::Empty)
        .define(&universe)
        .unwrap();

    Fixtures {
        universe,
        core,
        bt1_attribute,
        ivirtual,
        ibt1_mixin1,
        ibase_type2,
        icomposed,
        base_type1,
        derived_type1,
        base_type2,
        base_type3,
        bt1_mixin1,
        bt1_mixin2,
        bt2_mixin,
        bt3_mixin,
        hidden_ctor_type,
        unrelated,
    }
}

impl Fixtures {
    pub fn builder(&self) -> MixinConfigurationBuilder {
        MixinConfiguration::build_new(Arc::clone(&self.universe))
    }

    /// `BaseType1` with `BT1Mixin1` and `BT1Mixin2`
    pub fn base_type1_configuration(&self) -> Arc<MixinConfiguration> {
        let mut builder = self.builder();
        builder
            .for_class(self.base_type1)
            .add_mixin(self.bt1_mixin1)
            .add_mixin(self.bt1_mixin2);
        Arc::new(builder.build_configuration().unwrap())
    }

    pub fn class(&self, name: &str) -> TypeDefBuilder {
        TypeDefBuilder::class(NS, name).extends(self.core.object)
    }

    pub fn mixin(&self, name: &str) -> TypeId {
        self.class(name)
            .constructor(&[], MethodBody::Empty)
            .define(&self.universe)
            .unwrap()
    }
}
