//! Configuration from composition markers
//!
//! Types describe their own composition: a mixin lists the targets it
//! extends, a target lists the mixins it uses, and an interface lists the
//! targets it is a composed interface for. The analyzer scans the
//! universe in definition order and feeds these markers into a builder.

use std::sync::Arc;

use braid_types::{MixinApplication, TypeUniverse};

use super::builder::MixinConfigurationBuilder;
use super::class_context::MixinKind;
use super::configuration::MixinConfiguration;
use crate::error::ConfigurationResult;

/// Reads composition markers into a configuration builder
#[derive(Debug, Clone)]
pub struct DeclarativeConfigurationAnalyzer {
    universe: Arc<TypeUniverse>,
}

impl DeclarativeConfigurationAnalyzer {
    /// Analyzer over `universe`
    pub fn new(universe: Arc<TypeUniverse>) -> Self {
        Self { universe }
    }

    /// Add every declared mixin application to `builder`
    pub fn analyze(&self, builder: &mut MixinConfigurationBuilder) {
        for def in self.universe.types() {
            if def.generated_from.is_some() || !def.composition.declares_configuration() {
                continue;
            }
            for application in &def.composition.uses {
                Self::apply(builder, def.id, application.other, application, MixinKind::Used);
            }
            for application in &def.composition.extends {
                Self::apply(builder, application.other, def.id, application, MixinKind::Extending);
            }
            for &target in &def.composition.composed_interface_for {
                builder.for_class(target).add_composed_interface(def.id);
            }
            tracing::trace!(ty = %def.full_name(), "analyzed composition markers");
        }
    }

    /// Build a configuration from the markers alone
    pub fn build_configuration(&self) -> ConfigurationResult<MixinConfiguration> {
        let mut builder = MixinConfigurationBuilder::new(Arc::clone(&self.universe));
        self.analyze(&mut builder);
        builder.build_configuration()
    }

    fn apply(
        builder: &mut MixinConfigurationBuilder,
        target: braid_types::TypeId,
        mixin: braid_types::TypeId,
        application: &MixinApplication,
        kind: MixinKind,
    ) {
        builder
            .for_class(target)
            .add_mixin(mixin)
            .of_kind(kind)
            .with_dependencies(&application.additional_dependencies)
            .with_introduced_member_visibility(application.introduced_member_visibility);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use braid_types::{CoreTypes, TypeDefBuilder};

    #[test]
    fn test_extends_and_uses_markers() {
        let universe = Arc::new(TypeUniverse::new());
        let core = CoreTypes::install(&universe).unwrap();
        let logging = TypeDefBuilder::class("Shop", "LoggingMixin")
            .extends(core.object)
            .define(&universe)
            .unwrap();
        let order = TypeDefBuilder::class("Shop", "Order")
            .extends(core.object)
            .uses(logging, &[])
            .introducing_public_members()
            .define(&universe)
            .unwrap();
        let audit = TypeDefBuilder::class("Shop", "AuditMixin")
            .extends(core.object)
            .extends_target(order, &[logging])
            .define(&universe)
            .unwrap();
        let composed = TypeDefBuilder::interface("Shop", "IAuditedOrder")
            .composed_interface_for(order)
            .define(&universe)
            .unwrap();

        let config = DeclarativeConfigurationAnalyzer::new(Arc::clone(&universe))
            .build_configuration()
            .unwrap();
        let context = config.get_context(order).unwrap();

        let used = context.mixin(logging).unwrap();
        assert_eq!(used.kind, MixinKind::Used);
        assert_eq!(
            used.introduced_member_visibility,
            braid_types::MemberVisibility::Public
        );
        let extending = context.mixin(audit).unwrap();
        assert_eq!(extending.kind, MixinKind::Extending);
        assert_eq!(extending.explicit_dependencies, vec![logging]);
        assert_eq!(context.composed_interfaces(), &[composed]);
    }
}
