//! Attribute validation and visibility adjustment

use braid_types::{MethodAttributes, Visibility};

use crate::error::{PipeError, PipeResult};

fn describe(flags: MethodAttributes) -> String {
    let names: Vec<&str> = flags.iter_names().map(|(name, _)| name).collect();
    names.join(" | ")
}

fn reject(
    attributes: MethodAttributes,
    invalid: MethodAttributes,
    member_kind: &str,
) -> PipeResult<()> {
    // access bits overlap flag values, so compare outside the access mask
    let flags = attributes.difference(MethodAttributes::MEMBER_ACCESS_MASK);
    let offending = flags.intersection(invalid);
    if offending.is_empty() {
        Ok(())
    } else {
        Err(PipeError::Argument(format!(
            "The following MethodAttributes are not supported for {}: {}",
            member_kind,
            describe(offending)
        )))
    }
}

/// Check attributes of a constructor to add
pub fn validate_constructor_attributes(attributes: MethodAttributes) -> PipeResult<()> {
    reject(
        attributes,
        MethodAttributes::ABSTRACT
            | MethodAttributes::HIDE_BY_SIG
            | MethodAttributes::PINVOKE_IMPL
            | MethodAttributes::REQUIRE_SEC_OBJECT
            | MethodAttributes::UNMANAGED_EXPORT
            | MethodAttributes::VIRTUAL,
        "constructors",
    )?;
    if attributes.is_static() {
        return Err(PipeError::NotSupported(
            "Adding static constructors is not (yet) supported".to_string(),
        ));
    }
    Ok(())
}

/// Check attributes of a method to add
pub fn validate_method_attributes(attributes: MethodAttributes) -> PipeResult<()> {
    reject(
        attributes,
        MethodAttributes::PINVOKE_IMPL
            | MethodAttributes::REQUIRE_SEC_OBJECT
            | MethodAttributes::UNMANAGED_EXPORT,
        "methods",
    )?;
    if attributes.is_new_slot() && !attributes.is_virtual() {
        return Err(PipeError::Argument(
            "NewSlot methods must also be virtual".to_string(),
        ));
    }
    if attributes.is_abstract() && !attributes.is_virtual() {
        return Err(PipeError::Argument(
            "Abstract methods must also be virtual".to_string(),
        ));
    }
    Ok(())
}

/// Normalize attributes copied from an existing member for a type in
/// another module: `FamilyOrAssembly` becomes `Family`
pub fn adjust_visibility_for_assembly_boundary(attributes: MethodAttributes) -> MethodAttributes {
    if attributes.visibility() == Visibility::FamilyOrAssembly {
        attributes.with_visibility(Visibility::Family)
    } else {
        attributes
    }
}
