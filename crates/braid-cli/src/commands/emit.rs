//! `braid emit`: generate the concrete types of a class and print them

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use braid_mixins::{ConcreteType, GenerationPolicy, TypeFactory, TypeFactoryOptions};
use braid_types::{MethodDef, TypeDef, TypeRef, TypeUniverse, Visibility};
use serde_json::{json, Value as Json};

use crate::project::Project;

/// Output format of `emit`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum EmitFormat {
    /// Indented declarations
    Text,
    /// One JSON document with every generated type
    Json,
}

pub fn execute(
    project: &Project,
    class: &str,
    options: TypeFactoryOptions,
    format: EmitFormat,
    out: &mut dyn Write,
) -> Result<()> {
    let ty = project.resolve(class)?;
    let types = TypeFactory::with_options(Arc::clone(&project.configuration), options);
    let Some(concrete) = types.concrete_type(ty, GenerationPolicy::ForceGeneration)? else {
        anyhow::bail!("'{}' produced no concrete type", class);
    };
    let generated = generated_types(&project.universe, &concrete);
    tracing::debug!(class, types = generated.len(), "emitted concrete types");

    match format {
        EmitFormat::Text => {
            for def in &generated {
                render_text(&project.universe, def, out)?;
            }
        }
        EmitFormat::Json => {
            let documents: Vec<Json> = generated
                .iter()
                .map(|def| render_json(&project.universe, def))
                .collect();
            serde_json::to_writer_pretty(&mut *out, &json!({ "class": class, "types": documents }))?;
            writeln!(out)?;
        }
    }
    Ok(())
}

/// Mixed type, next-call proxy, then generated mixin subclasses
fn generated_types(universe: &TypeUniverse, concrete: &ConcreteType) -> Vec<Arc<TypeDef>> {
    let declared = concrete.definition().mixin_types();
    let mut types = vec![universe.get(concrete.type_id()), universe.get(concrete.proxy_type())];
    types.extend(
        concrete
            .mixin_instance_types()
            .iter()
            .filter(|ty| !declared.contains(ty))
            .map(|&ty| universe.get(ty)),
    );
    types
}

fn type_name(universe: &TypeUniverse, ty: &TypeRef) -> String {
    match ty {
        TypeRef::Named(id) => universe.full_name(*id),
        other => other.to_string(),
    }
}

fn visibility(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Private => "private",
        Visibility::FamilyAndAssembly => "family-and-assembly",
        Visibility::Assembly => "assembly",
        Visibility::Family => "family",
        Visibility::FamilyOrAssembly => "family-or-assembly",
        Visibility::Public => "public",
    }
}

fn method_header(universe: &TypeUniverse, def: &TypeDef, method: &MethodDef) -> String {
    let mut modifiers = vec![visibility(method.attributes.visibility())];
    if method.attributes.is_abstract() {
        modifiers.push("abstract");
    } else if method.attributes.is_virtual() {
        modifiers.push("virtual");
    }
    let parameters: Vec<String> = method.parameters.iter().map(|p| type_name(universe, &p.ty)).collect();
    let mut header = format!(
        "{} {} {}({})",
        modifiers.join(" "),
        type_name(universe, &method.return_type),
        method.name,
        parameters.join(", ")
    );
    for overridden in &method.explicit_overrides {
        if overridden.declaring_type != def.id {
            header.push_str(&format!(" implements {}", universe.method(*overridden).qualified_name()));
        }
    }
    header
}

fn render_text(universe: &TypeUniverse, def: &TypeDef, out: &mut dyn Write) -> Result<()> {
    let abstract_flag = if def.is_abstract { "abstract " } else { "" };
    write!(out, "{}class {}", abstract_flag, def.full_name())?;
    if let Some(base) = def.base_type {
        write!(out, " : {}", universe.full_name(base))?;
    }
    writeln!(out)?;
    if !def.interfaces.is_empty() {
        let names: Vec<String> = def.interfaces.iter().map(|&i| universe.full_name(i)).collect();
        writeln!(out, "  implements {}", names.join(", "))?;
    }
    for attribute in &def.custom_attributes {
        writeln!(out, "  [{}]", universe.full_name(attribute.attribute_type))?;
    }
    for field in &def.fields {
        writeln!(out, "  field {} {}", type_name(universe, &field.ty), field.name)?;
    }
    for constructor in &def.constructors {
        let parameters: Vec<String> = constructor
            .parameters
            .iter()
            .map(|p| type_name(universe, &p.ty))
            .collect();
        writeln!(
            out,
            "  {} .ctor({})",
            visibility(constructor.attributes.visibility()),
            parameters.join(", ")
        )?;
    }
    for method in &def.methods {
        writeln!(out, "  {}", method_header(universe, def, method))?;
    }
    writeln!(out)?;
    Ok(())
}

fn render_json(universe: &TypeUniverse, def: &TypeDef) -> Json {
    json!({
        "name": def.full_name(),
        "base": def.base_type.map(|base| universe.full_name(base)),
        "abstract": def.is_abstract,
        "interfaces": def.interfaces.iter().map(|&i| universe.full_name(i)).collect::<Vec<_>>(),
        "attributes": def
            .custom_attributes
            .iter()
            .map(|a| universe.full_name(a.attribute_type))
            .collect::<Vec<_>>(),
        "fields": def
            .fields
            .iter()
            .map(|f| json!({ "name": f.name, "type": type_name(universe, &f.ty) }))
            .collect::<Vec<_>>(),
        "constructors": def.constructors.len(),
        "methods": def
            .methods
            .iter()
            .map(|m| method_header(universe, def, m))
            .collect::<Vec<_>>(),
    })
}
