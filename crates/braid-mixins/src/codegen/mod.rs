//! Concrete type generation
//!
//! A mixed type derives from the target class and holds one instance per
//! mixin:
//!
//! ```text
//! Order_Mixed_0 : Order, IMixinTarget
//!   __mixin_0 .. __mixin_{n-1}     mixin instances, in mixin order
//!   __first                        next-call proxy at depth n
//!   overrides of overridden target members -> __first
//!   introduced interface members           -> __mixin_i
//!
//! Order_Mixed_0_NextCallProxy
//!   __this                         the mixed object
//!   __depth                        position in the chain
//!   one method per overridden member or next-call interface member,
//!   switching on __depth to reach the next lower override or the target
//! ```
//!
//! Mixin `i` gets the proxy at depth `i` as its `__next` and the mixed
//! object as its `__target`.

mod concrete_type_builder;
mod mixin_type;
mod module_scope;
mod next_call_proxy;

pub use concrete_type_builder::{ConcreteTypeBuilder, DEFAULT_NAME_TEMPLATE};
pub use module_scope::{ConcreteType, ModuleScope};

/// Field of the mixed object holding the outermost proxy
pub const FIRST_FIELD: &str = "__first";
/// Field of a proxy holding the mixed object
pub const THIS_FIELD: &str = "__this";
/// Field of a proxy holding its depth
pub const DEPTH_FIELD: &str = "__depth";
/// Field of a mixin instance holding the mixed object
pub const TARGET_FIELD: &str = "__target";
/// Field of a mixin instance holding its next-call proxy
pub const NEXT_FIELD: &str = "__next";
/// Prefix of the mixin slot fields
pub const MIXIN_FIELD_PREFIX: &str = "__mixin_";

/// Name of the slot field for the mixin at `index`
pub fn mixin_field(index: usize) -> String {
    format!("{}{}", MIXIN_FIELD_PREFIX, index)
}

/// A method with the shape of `method` whose body is `body`
fn forwarding_method(
    universe: &braid_types::TypeUniverse,
    method: braid_types::MethodRef,
    name: &str,
    attributes: braid_types::MethodAttributes,
    body: braid_types::Expr,
) -> braid_pipe::MethodDescriptor {
    let handle = universe.method(method);
    let def = handle.def();
    braid_pipe::MethodDescriptor {
        name: name.to_string(),
        attributes,
        return_type: def.return_type,
        parameters: def.parameters.clone(),
        generic_parameters: def.generic_parameters.clone(),
        body: Some(braid_types::MethodBody::Expression(body)),
        custom_attributes: Vec::new(),
    }
}
