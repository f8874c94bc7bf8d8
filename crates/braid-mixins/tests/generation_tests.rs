//! Integration tests for concrete type generation and object creation
//!
//! Generates mixed types for the sample domain in `common`, instantiates
//! them through the object factory and calls into the composed objects.

mod common;

use std::sync::Arc;

use braid_mixins::{
    GenerationPolicy, Mixin, MixinError, ObjectFactory, Runtime, TypeFactory, TypeFactoryOptions,
};
use braid_types::{Dispatch, MemberVisibility, MethodRef, Value};
use common::{fixtures, Fixtures};

fn factory(configuration: Arc<braid_mixins::MixinConfiguration>) -> ObjectFactory {
    ObjectFactory::new(Arc::new(TypeFactory::new(configuration)))
}

fn runtime(fx: &Fixtures) -> Runtime {
    Runtime::new(Arc::clone(&fx.universe))
}

mod concrete_types {
    use super::*;

    #[test]
    fn test_generated_type_derives_from_target() {
        let fx = fixtures();
        let types = TypeFactory::new(fx.base_type1_configuration());
        let concrete = types
            .concrete_type(fx.base_type1, GenerationPolicy::GenerateOnlyIfConfigured)
            .unwrap()
            .expect("configured type is generated");

        let def = fx.universe.get(concrete.type_id());
        assert_eq!(def.base_type, Some(fx.base_type1));
        assert_eq!(def.generated_from, Some(fx.base_type1));
        assert!(def.name.starts_with("BaseType1_Mixed_"));
        assert!(fx.universe.is_assignable(fx.core.mixin_target, concrete.type_id()));
        assert!(fx.universe.is_assignable(fx.ibt1_mixin1, concrete.type_id()));
        assert!(def.has_attribute(fx.bt1_attribute));
        assert!(def.find_field("__mixin_0").is_some());
        assert!(def.find_field("__mixin_1").is_some());
        assert!(def.find_field("__first").is_some());
        assert_eq!(concrete.mixin_instance_types(), &[fx.bt1_mixin1, fx.bt1_mixin2]);
    }

    #[test]
    fn test_same_type_until_scope_reset() {
        let fx = fixtures();
        let types = TypeFactory::new(fx.base_type1_configuration());
        let policy = GenerationPolicy::GenerateOnlyIfConfigured;

        let first = types.get_concrete_type(fx.base_type1, policy).unwrap();
        let again = types.get_concrete_type(fx.base_type1, policy).unwrap();
        assert_eq!(first, again);
        assert_eq!(types.builder().current_scope().len(), 1);

        types.builder().set_current(None);
        let regenerated = types.get_concrete_type(fx.base_type1, policy).unwrap();
        assert_ne!(first, regenerated);
        assert_ne!(fx.universe.get(first).name, fx.universe.get(regenerated).name);
    }

    #[test]
    fn test_unconfigured_type_is_generated_only_when_forced() {
        let fx = fixtures();
        let types = TypeFactory::new(fx.base_type1_configuration());

        let plain = types
            .get_concrete_type(fx.base_type2, GenerationPolicy::GenerateOnlyIfConfigured)
            .unwrap();
        assert_eq!(plain, fx.base_type2);

        let forced = types
            .get_concrete_type(fx.base_type2, GenerationPolicy::ForceGeneration)
            .unwrap();
        assert_ne!(forced, fx.base_type2);
        assert_eq!(fx.universe.get(forced).generated_from, Some(fx.base_type2));
        assert!(types.configuration().get_context(fx.base_type2).is_none());
    }

    #[test]
    fn test_generated_type_resolves_to_target_context() {
        let fx = fixtures();
        let types = TypeFactory::new(fx.base_type1_configuration());
        let generated = types
            .get_concrete_type(fx.base_type1, GenerationPolicy::GenerateOnlyIfConfigured)
            .unwrap();

        let context = types.configuration().get_context(generated).unwrap();
        assert_eq!(context.class_type(), fx.base_type1);
        let again = types
            .get_concrete_type(generated, GenerationPolicy::GenerateOnlyIfConfigured)
            .unwrap();
        assert_eq!(again, generated);
    }

    #[test]
    fn test_name_template_is_applied() {
        let fx = fixtures();
        let options = TypeFactoryOptions {
            name_template: "{type}Composed{index}".to_string(),
            ..TypeFactoryOptions::default()
        };
        let types = TypeFactory::with_options(fx.base_type1_configuration(), options);
        let generated = types
            .get_concrete_type(fx.base_type1, GenerationPolicy::GenerateOnlyIfConfigured)
            .unwrap();
        assert!(fx.universe.get(generated).name.starts_with("BaseType1Composed"));
    }
}

mod calls {
    use super::*;

    #[test]
    fn test_overrides_chain_through_every_mixin() {
        let fx = fixtures();
        let objects = factory(fx.base_type1_configuration());
        let mut rt = runtime(&fx);
        let instance = objects.create(&mut rt, fx.base_type1, vec![], vec![]).unwrap();

        let result = rt.call(&instance, "VirtualMethod", vec![]).unwrap();
        assert_eq!(result, Value::Str("BT1Mixin2(BT1Mixin1(BaseType1.VirtualMethod))".to_string()));

        // calls through the target's slot reach the same chain
        let slot = fx.universe.find_method_by_name(fx.base_type1, "VirtualMethod", 0).unwrap();
        let through_slot = rt.invoke(&instance, slot, vec![], Dispatch::Virtual).unwrap();
        assert_eq!(through_slot, result);
    }

    #[test]
    fn test_introduced_interface_is_callable() {
        let fx = fixtures();
        let objects = factory(fx.base_type1_configuration());
        let mut rt = runtime(&fx);
        let instance = objects
            .create(&mut rt, fx.base_type1, vec![Value::from("order-7")], vec![])
            .unwrap();

        let expected = Value::Str("BT1Mixin1.IntroducedMethod on order-7".to_string());
        assert_eq!(rt.call(&instance, "IntroducedMethod", vec![]).unwrap(), expected);
        let interface_method = MethodRef::new(fx.ibt1_mixin1, 0);
        assert_eq!(
            rt.invoke(&instance, interface_method, vec![], Dispatch::Virtual).unwrap(),
            expected
        );
    }

    #[test]
    fn test_public_introduction_adds_public_member() {
        let fx = fixtures();
        let mut builder = fx.builder();
        builder
            .for_class(fx.base_type1)
            .add_mixin(fx.bt1_mixin1)
            .with_introduced_member_visibility(MemberVisibility::Public);
        let configuration = Arc::new(builder.build_configuration().unwrap());
        let types = TypeFactory::new(configuration);
        let generated = types
            .get_concrete_type(fx.base_type1, GenerationPolicy::GenerateOnlyIfConfigured)
            .unwrap();

        let def = fx.universe.get(generated);
        let method = def.methods.iter().find(|m| m.name == "IntroducedMethod").unwrap();
        assert_eq!(method.attributes.visibility(), braid_types::Visibility::Public);
    }

    #[test]
    fn test_target_implements_abstract_mixin_member() {
        let fx = fixtures();
        let mut builder = fx.builder();
        builder.for_class(fx.base_type3).add_mixin(fx.bt3_mixin);
        let objects = factory(Arc::new(builder.build_configuration().unwrap()));
        let mut rt = runtime(&fx);
        let instance = objects.create(&mut rt, fx.base_type3, vec![], vec![]).unwrap();

        let mixin = Mixin::get(&rt, &instance, fx.bt3_mixin).unwrap().expect("mixin instance");
        assert_ne!(rt.type_of(&mixin), Some(fx.bt3_mixin), "a concrete subclass is instantiated");
        assert_eq!(
            rt.call(&mixin, "Describe", vec![]).unwrap(),
            Value::Str("hooked: BaseType3.Hook".to_string())
        );
    }

    #[test]
    fn test_mixin_calls_target_through_requirement() {
        let fx = fixtures();
        let mut builder = fx.builder();
        builder.for_class(fx.base_type2).add_mixin(fx.bt2_mixin);
        let objects = factory(Arc::new(builder.build_configuration().unwrap()));
        let mut rt = runtime(&fx);
        let instance = objects.create(&mut rt, fx.base_type2, vec![], vec![]).unwrap();

        let mixin = Mixin::get(&rt, &instance, fx.bt2_mixin).unwrap().unwrap();
        assert_eq!(
            rt.call(&mixin, "Describe", vec![]).unwrap(),
            Value::Str("target says BaseType2.IfcMethod".to_string())
        );
    }

    #[test]
    fn test_composed_interface_is_implemented() {
        let fx = fixtures();
        let mut builder = fx.builder();
        builder
            .for_class(fx.base_type1)
            .add_mixin(fx.bt1_mixin1)
            .add_composed_interface(fx.icomposed);
        let objects = factory(Arc::new(builder.build_configuration().unwrap()));
        let mut rt = runtime(&fx);
        let instance = objects.create(&mut rt, fx.base_type1, vec![], vec![]).unwrap();

        let ty = rt.type_of(&instance).unwrap();
        assert!(fx.universe.is_assignable(fx.icomposed, ty));
        let virtual_method = MethodRef::new(fx.ivirtual, 0);
        assert_eq!(
            rt.invoke(&instance, virtual_method, vec![], Dispatch::Virtual).unwrap(),
            Value::Str("BT1Mixin1(BaseType1.VirtualMethod)".to_string())
        );
    }
}

mod objects {
    use super::*;

    #[test]
    fn test_supplied_mixin_instance_is_used() {
        let fx = fixtures();
        let objects = factory(fx.base_type1_configuration());
        let mut rt = runtime(&fx);
        let supplied = rt.instantiate(fx.bt1_mixin2, vec![]).unwrap();
        let instance = objects
            .create(&mut rt, fx.base_type1, vec![], vec![supplied.clone()])
            .unwrap();

        assert_eq!(Mixin::get(&rt, &instance, fx.bt1_mixin2).unwrap(), Some(supplied.clone()));
        assert_eq!(rt.field(&supplied, "__target").unwrap(), instance);
    }

    #[test]
    fn test_unconfigured_mixin_instance_is_rejected() {
        let fx = fixtures();
        let objects = factory(fx.base_type1_configuration());
        let mut rt = runtime(&fx);
        let stranger = rt.instantiate(fx.unrelated, vec![]).unwrap();

        let err = objects
            .create(&mut rt, fx.base_type1, vec![], vec![stranger.clone()])
            .unwrap_err();
        assert!(matches!(err, MixinError::UnconfiguredMixinInstance { .. }), "{:?}", err);

        let err = objects
            .create(&mut rt, fx.unrelated, vec![], vec![stranger])
            .unwrap_err();
        assert!(matches!(err, MixinError::UnconfiguredMixinInstance { .. }), "{:?}", err);
    }

    #[test]
    fn test_non_public_constructor_requires_opt_in() {
        let fx = fixtures();
        let mut builder = fx.builder();
        builder.for_class(fx.hidden_ctor_type).add_mixin(fx.bt1_mixin2);
        let configuration = Arc::new(builder.build_configuration().unwrap());
        let mut rt = runtime(&fx);

        let err = factory(Arc::clone(&configuration))
            .create(&mut rt, fx.hidden_ctor_type, vec![], vec![])
            .unwrap_err();
        assert!(matches!(err, MixinError::MissingMethod(_)), "{:?}", err);

        let options = TypeFactoryOptions {
            allow_non_public_constructors: true,
            ..TypeFactoryOptions::default()
        };
        let types = Arc::new(TypeFactory::with_options(configuration, options));
        let instance = ObjectFactory::new(types)
            .create(&mut rt, fx.hidden_ctor_type, vec![], vec![])
            .unwrap();
        assert_ne!(rt.type_of(&instance), Some(fx.hidden_ctor_type));
        let result = rt.call(&instance, "VirtualMethod", vec![]).unwrap();
        assert_eq!(result, Value::Str("BT1Mixin2(HiddenCtorType.VirtualMethod)".to_string()));
    }

    #[test]
    fn test_constructor_arity_must_match() {
        let fx = fixtures();
        let objects = factory(fx.base_type1_configuration());
        let mut rt = runtime(&fx);

        let err = objects
            .create(&mut rt, fx.base_type1, vec![Value::Int(1), Value::Int(2)], vec![])
            .unwrap_err();
        assert!(matches!(err, MixinError::MissingMethod(_)), "{:?}", err);
    }

    #[test]
    fn test_ambiguous_mixin_lookup() {
        let fx = fixtures();
        let objects = factory(fx.base_type1_configuration());
        let mut rt = runtime(&fx);
        let instance = objects.create(&mut rt, fx.base_type1, vec![], vec![]).unwrap();

        let err = Mixin::get(&rt, &instance, fx.core.object).unwrap_err();
        assert!(matches!(err, MixinError::AmbiguousMixin { .. }), "{:?}", err);
        assert_eq!(Mixin::get(&rt, &instance, fx.unrelated).unwrap(), None);
        assert!(matches!(
            Mixin::get(&rt, &Value::Int(3), fx.bt1_mixin1),
            Err(MixinError::NotAnObject(_))
        ));
    }
}
