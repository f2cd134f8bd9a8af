//! Detecting components and their variables in parsed source.
//!
//! The builder runs once per [`Design`]: it walks the execution flow, recognizes
//! creations of toolkit classes, decides the variable of each one from the place the
//! creation sits in, and links children to parents through association invocations.

use jvar_java::flow::{self, DeclarationKind};
use jvar_java::{FlowDescription, NodeId, NodeKind, SourceEditor};
use tracing::{debug, info};

use crate::config::VariablePreferences;
use crate::error::{VariableError, VariableResult};
use crate::model::{Association, ComponentId, Design, EditMode};
use crate::toolkit::ToolkitDescription;
use crate::variable::lazy_utils::{self, LazyAccessor};
use crate::variable::{reuse_references, EmptyFlavor, EmptyVariable, NamedVariable, Variable};

pub(super) fn build(
    editor: SourceEditor,
    toolkit: ToolkitDescription,
    preferences: VariablePreferences,
) -> VariableResult<Design> {
    let ast = editor.ast();
    let ty = *ast
        .types()
        .first()
        .ok_or_else(|| VariableError::illegal_state("the compilation unit declares no type"))?;
    let flow = FlowDescription::detect(ast, ty, &toolkit.entry_methods);
    let mut design = Design::new(editor, toolkit, preferences, ty, flow);

    detect_this(&mut design);
    detect_parameters(&mut design);
    let lazies = detect_lazies(&mut design);
    detect_creations(&mut design, &lazies);
    detect_exposed_and_wrapped(&mut design)?;
    link_associations(&mut design)?;
    detect_implicit(&mut design)?;

    if design.root.is_none() {
        design.root = design
            .components
            .iter()
            .flatten()
            .find(|c| c.parent.is_none())
            .map(|c| c.id);
    }
    design.mode = EditMode::Editing;
    info!(
        components = design.component_ids().len(),
        entries = design.flow.entries().len(),
        "built component model"
    );
    Ok(design)
}

/// The qualified class of a type as written, if it is a toolkit component.
fn component_class(design: &Design, type_node: NodeId) -> Option<String> {
    let text = design.editor.node_source(type_node);
    design
        .toolkit
        .resolve(design.ast(), text)
        .map(|d| d.class_name.clone())
}

fn detect_this(design: &mut Design) {
    let NodeKind::TypeDeclaration {
        superclass: Some(superclass),
        ..
    } = design.ast().kind(design.ty)
    else {
        return;
    };
    if let Some(class_name) = component_class(design, *superclass) {
        let id = design.add_component_record(&class_name, Variable::This);
        design.root = Some(id);
        debug!(component = %id, class = %class_name, "edited class is a component");
    }
}

fn detect_parameters(design: &mut Design) {
    let ast = design.ast();
    let mut found = Vec::new();
    for &entry in design.flow.entries() {
        for &parameter in ast.method_parameters(entry) {
            if let NodeKind::Parameter { ty, name, .. } = ast.kind(parameter) {
                if let Some(class_name) = component_class(design, *ty) {
                    found.push((class_name, *name));
                }
            }
        }
    }
    for (class_name, name) in found {
        let references = flow::references(design.ast(), name);
        let id = design.add_component_record(&class_name, Variable::MethodParameter(NamedVariable::declared(name)));
        if let Ok(component) = design.component_mut(id) {
            component.related = references;
        }
    }
}

fn detect_lazies(design: &mut Design) -> Vec<LazyAccessor> {
    let ast = design.ast();
    let mut found = Vec::new();
    for method in ast.methods(design.ty) {
        let Some(accessor) = lazy_utils::detect(ast, method) else {
            continue;
        };
        let type_node = match ast.kind(accessor.creation) {
            NodeKind::New { ty, .. } => Some(*ty),
            _ => flow::declaration_statement(ast, accessor.field).and_then(|d| ast.declared_type(d)),
        };
        if let Some(class_name) = type_node.and_then(|t| component_class(design, t)) {
            found.push((class_name, accessor));
        }
    }
    let mut lazies = Vec::new();
    for (class_name, accessor) in found {
        let ast = design.ast();
        let mut related: Vec<NodeId> = crate::variable::lazy_invocations(ast, design.ty, &accessor);
        related.extend(
            flow::references(ast, accessor.field)
                .into_iter()
                .filter(|&r| ast.contains(accessor.method, r)),
        );
        let id = design.add_component_record(&class_name, Variable::Lazy(accessor));
        if let Ok(component) = design.component_mut(id) {
            component.creation = Some(accessor.creation);
            component.related = related;
        }
        debug!(component = %id, class = %class_name, "lazy accessor");
        lazies.push(accessor);
    }
    lazies
}

enum Creation {
    New { node: NodeId, class_name: String },
    Void { node: NodeId, class_name: String },
}

fn creations_in(design: &Design, nodes: Vec<NodeId>, out: &mut Vec<Creation>) {
    let ast = design.ast();
    for node in nodes {
        match ast.kind(node) {
            NodeKind::New { ty, .. } => {
                if let Some(class_name) = component_class(design, *ty) {
                    out.push(Creation::New { node, class_name });
                }
            }
            NodeKind::MethodCall { name, .. } => {
                let factory = ast.identifier(*name).and_then(|n| design.toolkit.void_factory(n));
                if let Some(factory) = factory {
                    out.push(Creation::Void {
                        node,
                        class_name: factory.class_name.clone(),
                    });
                }
            }
            _ => {}
        }
    }
}

fn detect_creations(design: &mut Design, lazies: &[LazyAccessor]) {
    let ast = design.ast();
    let mut creations = Vec::new();
    for field in ast.fields(design.ty) {
        for &fragment in ast.fragments(field) {
            if let NodeKind::Fragment {
                initializer: Some(init), ..
            } = ast.kind(fragment)
            {
                creations_in(design, ast.descendants(*init), &mut creations);
            }
        }
    }
    for statement in design.flow.statements(ast) {
        creations_in(design, flow::statement_expressions(ast, statement), &mut creations);
    }

    for creation in creations {
        match creation {
            Creation::New { node, class_name } => {
                let known = lazies.iter().any(|l| l.creation == node)
                    || design.components.iter().flatten().any(|c| c.creation == Some(node));
                if known {
                    continue;
                }
                let variable = variable_for(design, node);
                let related = related_for(design, &variable);
                let id = design.add_component_record(&class_name, variable);
                if let Ok(component) = design.component_mut(id) {
                    component.creation = Some(node);
                    component.related = related;
                }
            }
            Creation::Void { node, class_name } => {
                let id = design.add_component_record(&class_name, Variable::VoidInvocation { invocation: node });
                if let Ok(component) = design.component_mut(id) {
                    component.creation = Some(node);
                }
            }
        }
    }
}

/// The variable of a creation, decided by where the creation sits.
fn variable_for(design: &Design, creation: NodeId) -> Variable {
    let ast = design.ast();
    let wrapped = design.wrapped(creation);
    let empty = |flavor| {
        Variable::Empty(EmptyVariable {
            initializer: creation,
            flavor,
        })
    };
    let Some(parent) = ast.parent(wrapped) else {
        return empty(EmptyFlavor::Plain);
    };
    match ast.kind(parent) {
        NodeKind::Fragment {
            name,
            initializer: Some(init),
        } if *init == wrapped => {
            let nv = NamedVariable::declared(*name);
            match flow::declaration_kind(ast, *name) {
                Some(DeclarationKind::Field) => Variable::FieldInitializer(nv),
                Some(DeclarationKind::Local) if flow::assignments(ast, *name).len() > 1 => Variable::LocalReuse(nv),
                Some(DeclarationKind::Local) => Variable::LocalUnique(nv),
                _ => empty(EmptyFlavor::Plain),
            }
        }
        NodeKind::Assignment { left, right } if *right == wrapped => {
            let Some(variable) = flow::assigned_name(ast, *left) else {
                return empty(EmptyFlavor::Plain);
            };
            let Some(declaration) = flow::resolve(ast, variable) else {
                return empty(EmptyFlavor::Plain);
            };
            let nv = NamedVariable { variable, declaration };
            let reused = flow::assignments(ast, declaration).len() > 1;
            match flow::declaration_kind(ast, declaration) {
                Some(DeclarationKind::Local) if reused => Variable::LocalReuse(nv),
                Some(DeclarationKind::Local) => Variable::LocalUnique(nv),
                Some(DeclarationKind::Field) if reused => Variable::FieldReuse(nv),
                Some(DeclarationKind::Field) => Variable::FieldUnique(nv),
                _ => empty(EmptyFlavor::Plain),
            }
        }
        NodeKind::ExpressionStatement { .. } => empty(EmptyFlavor::Pure),
        _ => empty(EmptyFlavor::Plain),
    }
}

fn related_for(design: &Design, variable: &Variable) -> Vec<NodeId> {
    let ast = design.ast();
    match variable {
        Variable::LocalUnique(nv) | Variable::FieldUnique(nv) | Variable::FieldInitializer(nv) => {
            let mut related = flow::references(ast, nv.declaration);
            if !related.contains(&nv.variable) {
                related.push(nv.variable);
            }
            related
        }
        Variable::LocalReuse(nv) | Variable::FieldReuse(nv) => {
            let mut related = vec![nv.variable];
            related.extend(reuse_references(ast, *nv));
            related
        }
        _ => Vec::new(),
    }
}

// ============================================================================
// Children
// ============================================================================

/// Check if an invocation target denotes the component: a represented expression, or
/// an implicit or explicit `this` for the edited class.
fn receiver_is(design: &Design, id: ComponentId, receiver: Option<NodeId>) -> bool {
    let is_this = design
        .component(id)
        .is_ok_and(|c| matches!(c.variable, Variable::This));
    match receiver {
        None => is_this,
        Some(r) => design.represented_by(id, r),
    }
}

fn calls_on(design: &Design, id: ComponentId, method: &str) -> Vec<NodeId> {
    let ast = design.ast();
    ast.descendants(design.ty)
        .into_iter()
        .filter(|&n| match ast.kind(n) {
            NodeKind::MethodCall {
                target,
                name,
                arguments,
            } => arguments.is_empty() && ast.identifier(*name) == Some(method) && receiver_is(design, id, *target),
            _ => false,
        })
        .collect()
}

fn field_accesses_on(design: &Design, id: ComponentId, field: &str) -> Vec<NodeId> {
    let ast = design.ast();
    ast.descendants(design.ty)
        .into_iter()
        .filter(|&n| match ast.kind(n) {
            NodeKind::FieldAccess { target, name } => {
                ast.identifier(*name) == Some(field) && receiver_is(design, id, Some(*target))
            }
            _ => false,
        })
        .collect()
}

/// A local initialized by one of `calls`: `T x = (T) parent.getX();`.
fn local_for_call(design: &Design, calls: &[NodeId]) -> Option<(NodeId, NodeId)> {
    let ast = design.ast();
    calls.iter().find_map(|&call| {
        let parent = ast.parent(design.wrapped(call))?;
        match ast.kind(parent) {
            NodeKind::Fragment { name, .. } if flow::declaration_kind(ast, *name) == Some(DeclarationKind::Local) => {
                Some((call, *name))
            }
            _ => None,
        }
    })
}

fn detect_exposed_and_wrapped(design: &mut Design) -> VariableResult<()> {
    for parent in design.component_ids() {
        let class_name = design.component(parent)?.class_name.clone();
        let Some(description) = design.toolkit.component(&class_name).cloned() else {
            continue;
        };
        for exposed in &description.exposed {
            let (variable, related) = if exposed.is_field {
                (
                    Variable::ExposedField {
                        field: exposed.member.clone(),
                    },
                    field_accesses_on(design, parent, &exposed.member),
                )
            } else {
                (
                    Variable::ExposedProperty {
                        getter: exposed.member.clone(),
                    },
                    calls_on(design, parent, &exposed.member),
                )
            };
            let child = design.add_component_record(&exposed.class_name, variable);
            design.component_mut(child)?.related = related;
            design.link_child(parent, child, Association::Exposed)?;
        }
        if let Some(wrapper) = &description.wrapper {
            let calls = calls_on(design, parent, &wrapper.method);
            let (variable, creation) = match local_for_call(design, &calls) {
                Some((call, name)) => (Variable::LocalUnique(NamedVariable::declared(name)), Some(call)),
                None => (
                    Variable::WrapperControl {
                        method: wrapper.method.clone(),
                    },
                    None,
                ),
            };
            let mut related = related_for(design, &variable);
            related.extend(calls);
            let child = design.add_component_record(&wrapper.control_class, variable);
            let component = design.component_mut(child)?;
            component.creation = creation;
            component.related = related;
            design.link_child(parent, child, Association::Wrapped)?;
        }
    }
    Ok(())
}

fn link_associations(design: &mut Design) -> VariableResult<()> {
    let ast = design.ast();
    let mut links: Vec<(ComponentId, ComponentId, Association, NodeId)> = Vec::new();
    let ids = design.component_ids();
    for node in ast.descendants(design.ty) {
        let NodeKind::MethodCall {
            target,
            name,
            arguments,
        } = ast.kind(node)
        else {
            continue;
        };
        let Some(method) = ast.identifier(*name) else {
            continue;
        };
        if !design.toolkit.association_methods.iter().any(|m| m == method) {
            continue;
        }
        let Some(parent) = ids.iter().copied().find(|&p| receiver_is(design, p, *target)) else {
            continue;
        };
        for &argument in arguments {
            let child = ids.iter().copied().find(|&c| {
                c != parent
                    && design.represented_by(c, argument)
                    && !links.iter().any(|(_, linked, _, _)| *linked == c)
            });
            if let Some(child) = child {
                let association = Association::Invocation {
                    invocation: node,
                    method: method.to_string(),
                };
                links.push((parent, child, association, node));
            }
        }
    }

    for &child in &ids {
        let component = design.component(child)?;
        let Some(creation) = component.creation else {
            continue;
        };
        let parent_index = match &component.variable {
            Variable::VoidInvocation { .. } => design.toolkit.void_factories.iter().find_map(|f| {
                match ast.kind(creation) {
                    NodeKind::MethodCall { name, .. } if ast.identifier(*name) == Some(f.method.as_str()) => {
                        Some(f.parent_argument)
                    }
                    _ => None,
                }
            }),
            _ => design
                .toolkit
                .component(&component.class_name)
                .and_then(|d| d.constructor_parent),
        };
        let argument = parent_index.and_then(|i| match ast.kind(creation) {
            NodeKind::New { arguments, .. } | NodeKind::MethodCall { arguments, .. } => arguments.get(i).copied(),
            _ => None,
        });
        let Some(argument) = argument else {
            continue;
        };
        if links.iter().any(|(_, linked, _, _)| *linked == child) {
            continue;
        }
        if let Some(parent) = ids.iter().copied().find(|&p| p != child && design.represented_by(p, argument)) {
            links.push((parent, child, Association::Constructor { creation }, creation));
        }
    }

    for (parent, child, association, node) in links {
        if design.component(child)?.parent.is_some() {
            continue;
        }
        design.component_mut(child)?.add_related(node);
        design.link_child(parent, child, association)?;
    }
    Ok(())
}

fn detect_implicit(design: &mut Design) -> VariableResult<()> {
    for parent in design.component_ids() {
        let class_name = design.component(parent)?.class_name.clone();
        let Some(description) = design.toolkit.component(&class_name).cloned() else {
            continue;
        };
        for implicit in &description.implicit_children {
            let replaced = implicit.replaced_by.as_ref().is_some_and(|method| {
                design.component(parent).is_ok_and(|p| {
                    p.children.iter().any(|&c| {
                        matches!(
                            design.component(c).ok().and_then(|c| c.association.as_ref()),
                            Some(Association::Invocation { method: m, .. }) if m == method
                        )
                    })
                })
            });
            if replaced {
                continue;
            }
            let calls = calls_on(design, parent, &implicit.getter);
            let (variable, creation) = match local_for_call(design, &calls) {
                Some((call, name)) => (Variable::LocalUnique(NamedVariable::declared(name)), Some(call)),
                None => (
                    Variable::Implicit {
                        getter: implicit.getter.clone(),
                    },
                    None,
                ),
            };
            let mut related = related_for(design, &variable);
            related.extend(calls);
            let child = design.add_component_record(&implicit.class_name, variable);
            let component = design.component_mut(child)?;
            component.creation = creation;
            component.related = related;
            design.link_child(parent, child, Association::Implicit)?;
        }
    }
    Ok(())
}
