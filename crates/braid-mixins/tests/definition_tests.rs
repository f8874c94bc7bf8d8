//! Integration tests for target class definitions
//!
//! Builds definitions through the definition cache from configurations
//! over the sample domain in `common`.

mod common;

use std::sync::Arc;

use braid_mixins::definitions::{NonIntroductionReason, Satisfier};
use braid_mixins::{
    ConfigurationError, MixinConfiguration, TargetClassDefinition, TargetClassDefinitionBuilder,
    TargetClassDefinitionCache,
};
use braid_types::{MethodDefBuilder, TypeDefBuilder, TypeId, TypeRef};
use common::{fixtures, Fixtures, NS};

fn build(
    fx: &Fixtures,
    configuration: &MixinConfiguration,
    ty: TypeId,
) -> Result<Arc<TargetClassDefinition>, ConfigurationError> {
    let cache = TargetClassDefinitionCache::new(Arc::clone(&fx.universe));
    let context = configuration.get_context(ty).expect("configured");
    cache.get_or_build(configuration, &context)
}

mod scenarios {
    use super::*;

    #[test]
    fn test_base_type1_has_both_mixins() {
        let fx = fixtures();
        let configuration = fx.base_type1_configuration();
        let definition = build(&fx, &configuration, fx.base_type1).unwrap();

        assert_eq!(definition.mixin_count(), 2);
        assert!(definition.mixin(fx.bt1_mixin1).is_some());
        assert_eq!(definition.mixin_types(), vec![fx.bt1_mixin1, fx.bt1_mixin2]);
        assert_eq!(definition.full_name(), "Braid.Samples.BaseType1");
    }

    #[test]
    fn test_target_call_requirement_satisfied_by_target() {
        let fx = fixtures();
        let mut builder = fx.builder();
        builder.for_class(fx.base_type2).add_mixin(fx.bt2_mixin);
        let configuration = builder.build_configuration().unwrap();
        let definition = build(&fx, &configuration, fx.base_type2).unwrap();

        let mixin = definition.mixin(fx.bt2_mixin).unwrap();
        let dependency = definition.dependency(mixin.target_call_dependencies()[0]);
        assert_eq!(dependency.required_type(), fx.ibase_type2);
        assert_eq!(dependency.satisfier(), Some(Satisfier::Target));
    }

    #[test]
    fn test_unsatisfied_target_call_requirement_names_the_interface() {
        let fx = fixtures();
        let target = fx
            .class("NoInterfaceTarget")
            .constructor(&[], braid_types::MethodBody::Empty)
            .define(&fx.universe)
            .unwrap();
        let mut builder = fx.builder();
        builder.for_class(target).add_mixin(fx.bt2_mixin);
        let configuration = builder.build_configuration().unwrap();

        let err = build(&fx, &configuration, target).unwrap_err();
        match &err {
            ConfigurationError::UnsatisfiedRequirement { required, mixin, .. } => {
                assert_eq!(required, "Braid.Samples.IBaseType2");
                assert_eq!(mixin, "Braid.Samples.BT2Mixin");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(err.to_string().contains("IBaseType2"));
    }

    #[test]
    fn test_memberless_required_interface_must_be_implemented() {
        let fx = fixtures();
        let marker = TypeDefBuilder::interface(NS, "IPriced").define(&fx.universe).unwrap();
        let mixin = fx
            .class("PricingMixin")
            .requires_target(marker)
            .constructor(&[], braid_types::MethodBody::Empty)
            .define(&fx.universe)
            .unwrap();
        let plain = fx.mixin("PlainTarget");
        let priced = fx
            .class("PricedTarget")
            .implements(marker)
            .constructor(&[], braid_types::MethodBody::Empty)
            .define(&fx.universe)
            .unwrap();
        let mut builder = fx.builder();
        builder.for_class(plain).add_mixin(mixin);
        builder.for_class(priced).add_mixin(mixin);
        let configuration = builder.build_configuration().unwrap();

        let err = build(&fx, &configuration, plain).unwrap_err();
        assert!(
            matches!(&err, ConfigurationError::UnsatisfiedRequirement { required, .. } if required == "Braid.Samples.IPriced"),
            "{:?}",
            err
        );

        let definition = build(&fx, &configuration, priced).unwrap();
        let mixin = definition.mixin(mixin).unwrap();
        let dependency = definition.dependency(mixin.target_call_dependencies()[0]);
        assert_eq!(dependency.satisfier(), Some(Satisfier::Target));
    }

    #[test]
    fn test_memberless_next_call_interface_without_provider_fails() {
        let fx = fixtures();
        let marker = TypeDefBuilder::interface(NS, "IAudited").define(&fx.universe).unwrap();
        let mixin = fx
            .class("AuditingMixin")
            .requires_next(marker)
            .constructor(&[], braid_types::MethodBody::Empty)
            .define(&fx.universe)
            .unwrap();
        let target = fx.mixin("UnauditedTarget");
        let mut builder = fx.builder();
        builder.for_class(target).add_mixin(mixin);
        let configuration = builder.build_configuration().unwrap();

        let err = build(&fx, &configuration, target).unwrap_err();
        assert!(matches!(err, ConfigurationError::UnsatisfiedRequirement { .. }), "{:?}", err);
    }

    #[test]
    fn test_only_the_inheritance_root_includes_inherited_persistent_mixins() {
        let fx = fixtures();
        let configuration = fx.base_type1_configuration();
        let cache = TargetClassDefinitionCache::new(Arc::clone(&fx.universe));

        let derived_context = configuration.get_context(fx.derived_type1).unwrap();
        let derived = cache.get_or_build(&configuration, &derived_context).unwrap();
        let base = derived.base_class().expect("base class definition").clone();

        assert!(!derived.persistent_mixin_finder().include_inherited());
        assert!(base.persistent_mixin_finder().include_inherited());
        assert_eq!(derived.inheritance_root_class().ty(), fx.base_type1);
        assert_eq!(derived.mixin_types(), base.mixin_types());
    }
}

mod ordering {
    use super::*;

    #[test]
    fn test_lowest_ready_declaration_index_goes_first() {
        let fx = fixtures();
        let target = fx.mixin("OrderedTarget");
        let a = fx.mixin("MixinA");
        let b = fx.mixin("MixinB");
        let c = fx.mixin("MixinC");
        let mut builder = fx.builder();
        builder
            .for_class(target)
            .add_mixin(a)
            .with_dependency(c)
            .add_mixin(b)
            .add_mixin(c);
        let configuration = builder.build_configuration().unwrap();

        let definition = build(&fx, &configuration, target).unwrap();
        assert_eq!(definition.mixin_types(), vec![b, c, a]);
        assert_eq!(definition.mixin(a).unwrap().mixin_index(), 2);
    }

    #[test]
    fn test_order_respects_every_dependency_edge() {
        let fx = fixtures();
        let target = fx.mixin("ChainTarget");
        let names = ["M0", "M1", "M2", "M3", "M4"];
        let mixins: Vec<_> = names.iter().map(|n| fx.mixin(n)).collect();
        // M0 -> M3, M1 -> M0, M3 -> M4
        let edges = [(0, 3), (1, 0), (3, 4)];
        let mut builder = fx.builder();
        let class = builder.for_class(target);
        for (i, &mixin) in mixins.iter().enumerate() {
            class.add_mixin(mixin);
            for &(_, to) in edges.iter().filter(|(from, _)| *from == i) {
                class.with_dependency(mixins[to]);
            }
        }
        let configuration = builder.build_configuration().unwrap();
        let definition = build(&fx, &configuration, target).unwrap();

        for (from, to) in edges {
            let depender = definition.mixin(mixins[from]).unwrap().mixin_index();
            let dependee = definition.mixin(mixins[to]).unwrap().mixin_index();
            assert!(dependee < depender, "{} must precede {}", names[to], names[from]);
        }
    }

    #[test]
    fn test_equal_contexts_build_equal_orderings() {
        let fx = fixtures();
        let configuration = fx.base_type1_configuration();
        let context = configuration.get_context(fx.base_type1).unwrap();
        let builder = TargetClassDefinitionBuilder::new(Arc::clone(&fx.universe));

        let first = builder.build(&context, None).unwrap();
        let second = builder.build(&Arc::new(context.as_ref().clone()), None).unwrap();
        assert_eq!(first.mixin_types(), second.mixin_types());
        assert_eq!(first, second);
    }

    #[test]
    fn test_cycle_is_reported_with_its_members() {
        let fx = fixtures();
        let target = fx.mixin("CycleTarget");
        let a = fx.mixin("CycleA");
        let b = fx.mixin("CycleB");
        let mut builder = fx.builder();
        builder
            .for_class(target)
            .add_mixin(a)
            .with_dependency(b)
            .add_mixin(b)
            .with_dependency(a);
        let configuration = builder.build_configuration().unwrap();

        match build(&fx, &configuration, target).unwrap_err() {
            ConfigurationError::CyclicDependency { cycle, .. } => {
                assert!(cycle.contains("CycleA"));
                assert!(cycle.contains("CycleB"));
                assert!(cycle.contains("->"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_ambiguous_explicit_dependency() {
        let fx = fixtures();
        let target = fx.mixin("AmbiguousTarget");
        let shared = fx.mixin("SharedBase");
        let left = fx
            .class("LeftMixin")
            .extends(shared)
            .constructor(&[], braid_types::MethodBody::Empty)
            .define(&fx.universe)
            .unwrap();
        let right = fx
            .class("RightMixin")
            .extends(shared)
            .constructor(&[], braid_types::MethodBody::Empty)
            .define(&fx.universe)
            .unwrap();
        let depender = fx.mixin("Depender");
        let mut builder = fx.builder();
        builder
            .for_class(target)
            .add_mixin(left)
            .add_mixin(right)
            .add_mixin(depender)
            .with_dependency(shared);
        let configuration = builder.build_configuration().unwrap();

        let err = build(&fx, &configuration, target).unwrap_err();
        assert!(matches!(err, ConfigurationError::AmbiguousDependency { .. }), "{:?}", err);
    }
}

mod introductions {
    use super::*;

    #[test]
    fn test_interface_and_attribute_are_introduced() {
        let fx = fixtures();
        let configuration = fx.base_type1_configuration();
        let definition = build(&fx, &configuration, fx.base_type1).unwrap();

        let introduction = definition.interface_introduction(fx.ibt1_mixin1).unwrap();
        assert_eq!(definition.mixin_by_id(introduction.introducer).ty(), fx.bt1_mixin1);
        assert_eq!(introduction.members.len(), 1);
        assert!(definition
            .introduced_attributes()
            .any(|a| a.attribute.attribute_type == fx.bt1_attribute));
    }

    #[test]
    fn test_interface_already_on_target_is_not_introduced() {
        let fx = fixtures();
        let mixin = fx
            .class("IfcMixin")
            .implements(fx.ibase_type2)
            .constructor(&[], braid_types::MethodBody::Empty)
            .method(
                MethodDefBuilder::new("IfcMethod")
                    .returns(TypeRef::Str)
                    .as_virtual()
                    .returning("mixin"),
            )
            .define(&fx.universe)
            .unwrap();
        let mut builder = fx.builder();
        builder.for_class(fx.base_type2).add_mixin(mixin);
        let configuration = builder.build_configuration().unwrap();
        let definition = build(&fx, &configuration, fx.base_type2).unwrap();

        assert!(definition.interface_introduction(fx.ibase_type2).is_none());
        let non_introduced = definition.mixin(mixin).unwrap().non_interface_introductions();
        assert_eq!(non_introduced[0].reason, NonIntroductionReason::AlreadyOnTarget);
    }

    #[test]
    fn test_later_mixin_suppresses_introduction() {
        let fx = fixtures();
        let suppressor = fx
            .class("Suppressor")
            .suppresses_interface(fx.ibt1_mixin1, Some(fx.bt1_mixin1))
            .constructor(&[], braid_types::MethodBody::Empty)
            .define(&fx.universe)
            .unwrap();
        let mut builder = fx.builder();
        builder
            .for_class(fx.base_type1)
            .add_mixin(fx.bt1_mixin1)
            .add_mixin(suppressor)
            .with_dependency(fx.bt1_mixin1);
        let configuration = builder.build_configuration().unwrap();
        let definition = build(&fx, &configuration, fx.base_type1).unwrap();

        assert!(definition.mixin(suppressor).unwrap().mixin_index() > 0);
        assert!(definition.introduced_interfaces().all(|i| i.interface != fx.ibt1_mixin1));
        let suppressed = definition.mixin(fx.bt1_mixin1).unwrap().suppressed_interface_introductions();
        assert_eq!(suppressed.len(), 1);
        assert_eq!(definition.mixin_by_id(suppressed[0].suppressor).ty(), suppressor);
    }

    #[test]
    fn test_duplicate_introduction_is_an_error() {
        let fx = fixtures();
        let copy = TypeDefBuilder::class(NS, "BT1Mixin1Copy")
            .extends(fx.core.object)
            .implements(fx.ibt1_mixin1)
            .constructor(&[], braid_types::MethodBody::Empty)
            .method(
                MethodDefBuilder::new("IntroducedMethod")
                    .returns(TypeRef::Str)
                    .as_virtual()
                    .returning("copy"),
            )
            .define(&fx.universe)
            .unwrap();
        let mut builder = fx.builder();
        builder.for_class(fx.base_type1).add_mixin(fx.bt1_mixin1).add_mixin(copy);
        let configuration = builder.build_configuration().unwrap();

        let err = build(&fx, &configuration, fx.base_type1).unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicateIntroduction { .. }), "{:?}", err);
    }
}

mod overrides {
    use super::*;

    #[test]
    fn test_override_chain_follows_mixin_order() {
        let fx = fixtures();
        let configuration = fx.base_type1_configuration();
        let definition = build(&fx, &configuration, fx.base_type1).unwrap();

        let target_method = definition.find_method("VirtualMethod").unwrap();
        let overriders: Vec<_> = target_method
            .overrides()
            .iter()
            .map(|&o| definition.member_name(o))
            .collect();
        assert_eq!(
            overriders,
            vec![
                "Braid.Samples.BT1Mixin1.VirtualMethod".to_string(),
                "Braid.Samples.BT1Mixin2.VirtualMethod".to_string()
            ]
        );
        let first = definition.member(target_method.overrides()[0]);
        assert_eq!(first.base_as_member(), Some(target_method.id()));
        assert!(definition.has_overrides());
    }

    #[test]
    fn test_override_of_non_virtual_member_is_rejected() {
        let fx = fixtures();
        let mixin = fx
            .class("PlainOverrider")
            .constructor(&[], braid_types::MethodBody::Empty)
            .method(
                MethodDefBuilder::new("PlainMethod")
                    .returns(TypeRef::Str)
                    .as_virtual()
                    .overrides_target()
                    .returning("no"),
            )
            .define(&fx.universe)
            .unwrap();
        let mut builder = fx.builder();
        builder.for_class(fx.base_type1).add_mixin(mixin);
        let configuration = builder.build_configuration().unwrap();

        match build(&fx, &configuration, fx.base_type1).unwrap_err() {
            ConfigurationError::NotOverridable { reason, .. } => assert_eq!(reason, "it is not virtual"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_override_without_counterpart_is_rejected() {
        let fx = fixtures();
        let mixin = fx
            .class("LonelyOverrider")
            .constructor(&[], braid_types::MethodBody::Empty)
            .method(MethodDefBuilder::new("Missing").as_virtual().overrides_target())
            .define(&fx.universe)
            .unwrap();
        let mut builder = fx.builder();
        builder.for_class(fx.base_type1).add_mixin(mixin);
        let configuration = builder.build_configuration().unwrap();

        let err = build(&fx, &configuration, fx.base_type1).unwrap_err();
        assert!(matches!(err, ConfigurationError::OverrideTargetNotFound { .. }), "{:?}", err);
    }

    #[test]
    fn test_abstract_mixin_member_needs_target_override() {
        let fx = fixtures();
        let mut builder = fx.builder();
        builder.for_class(fx.base_type1).add_mixin(fx.bt3_mixin);
        let configuration = builder.build_configuration().unwrap();

        let err = build(&fx, &configuration, fx.base_type1).unwrap_err();
        assert!(matches!(err, ConfigurationError::AbstractMemberNotOverridden { .. }), "{:?}", err);

        let mut builder = fx.builder();
        builder.for_class(fx.base_type3).add_mixin(fx.bt3_mixin);
        let configuration = builder.build_configuration().unwrap();
        let definition = build(&fx, &configuration, fx.base_type3).unwrap();
        let hook = definition
            .mixin(fx.bt3_mixin)
            .unwrap()
            .members()
            .iter()
            .map(|&m| definition.member(m))
            .find(|m| m.name() == "Hook")
            .unwrap();
        assert_eq!(hook.overrides().len(), 1);
    }
}

mod caching {
    use super::*;

    #[test]
    fn test_equal_contexts_share_one_definition() {
        let fx = fixtures();
        let configuration = fx.base_type1_configuration();
        let cache = TargetClassDefinitionCache::new(Arc::clone(&fx.universe));
        let context = configuration.get_context(fx.base_type1).unwrap();

        let first = cache.get_or_build(&configuration, &context).unwrap();
        let equal_context = Arc::new(context.as_ref().clone());
        let second = cache.get_or_build(&configuration, &equal_context).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_requests_build_once() {
        let fx = fixtures();
        let configuration = fx.base_type1_configuration();
        let cache = TargetClassDefinitionCache::new(Arc::clone(&fx.universe));
        let context = configuration.get_context(fx.base_type1).unwrap();

        let results: Vec<_> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| cache.get_or_build(&configuration, &context).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for result in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], result));
        }
    }
}
