// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Java node kinds, generic over how children are referenced.
//!
//! The parser produces an owned tree (`NodeKind<Box<Syntax>>`), the arena stores
//! `NodeKind<NodeId>`. [`NodeKind::map`] converts one into the other.

use jvar_core::Span;

/// Declaration modifiers and marker annotations, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modifiers(pub Vec<String>);

impl Modifiers {
    pub fn contains(&self, keyword: &str) -> bool {
        self.0.iter().any(|m| m == keyword)
    }

    pub fn is_static(&self) -> bool {
        self.contains("static")
    }
}

/// The kind of a node together with its children.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind<C> {
    CompilationUnit {
        package: Option<String>,
        imports: Vec<C>,
        types: Vec<C>,
    },
    Import {
        name: String,
        is_static: bool,
        on_demand: bool,
    },
    TypeDeclaration {
        modifiers: Modifiers,
        name: C,
        superclass: Option<C>,
        interfaces: Vec<C>,
        members: Vec<C>,
    },
    FieldDeclaration {
        modifiers: Modifiers,
        ty: C,
        fragments: Vec<C>,
    },
    /// A method or, when `return_type` is `None`, a constructor.
    MethodDeclaration {
        modifiers: Modifiers,
        return_type: Option<C>,
        name: C,
        parameters: Vec<C>,
        body: Option<C>,
    },
    Parameter {
        modifiers: Modifiers,
        ty: C,
        name: C,
    },
    /// One `name [= initializer]` of a local or field declaration.
    Fragment {
        name: C,
        initializer: Option<C>,
    },

    // statements
    Block {
        statements: Vec<C>,
    },
    LocalDeclaration {
        modifiers: Modifiers,
        ty: C,
        fragments: Vec<C>,
    },
    ExpressionStatement {
        expression: C,
    },
    If {
        condition: C,
        then_branch: C,
        else_branch: Option<C>,
    },
    Return {
        expression: Option<C>,
    },
    Try {
        body: C,
        catches: Vec<C>,
        finally: Option<C>,
    },
    CatchClause {
        parameter: C,
        body: C,
    },
    SuperConstructorCall {
        arguments: Vec<C>,
    },
    Empty,

    // expressions
    Name {
        identifier: String,
    },
    FieldAccess {
        target: C,
        name: C,
    },
    MethodCall {
        target: Option<C>,
        name: C,
        arguments: Vec<C>,
    },
    /// Instance creation, `body` holds the members of an anonymous class.
    New {
        ty: C,
        arguments: Vec<C>,
        body: Option<Vec<C>>,
    },
    Assignment {
        left: C,
        right: C,
    },
    Binary {
        operator: String,
        left: C,
        right: C,
    },
    Unary {
        operator: String,
        operand: C,
    },
    Cast {
        ty: C,
        expression: C,
    },
    Parenthesized {
        expression: C,
    },
    This,
    Null,
    Literal {
        text: String,
    },
    Type {
        text: String,
    },
}

impl<C> NodeKind<C> {
    /// Children in source order.
    pub fn children(&self) -> Vec<&C> {
        use NodeKind::*;
        let mut out: Vec<&C> = Vec::new();
        match self {
            CompilationUnit { imports, types, .. } => {
                out.extend(imports);
                out.extend(types);
            }
            TypeDeclaration {
                name,
                superclass,
                interfaces,
                members,
                ..
            } => {
                out.push(name);
                out.extend(superclass);
                out.extend(interfaces);
                out.extend(members);
            }
            FieldDeclaration { ty, fragments, .. } | LocalDeclaration { ty, fragments, .. } => {
                out.push(ty);
                out.extend(fragments);
            }
            MethodDeclaration {
                return_type,
                name,
                parameters,
                body,
                ..
            } => {
                out.extend(return_type);
                out.push(name);
                out.extend(parameters);
                out.extend(body);
            }
            Parameter { ty, name, .. } => {
                out.push(ty);
                out.push(name);
            }
            Fragment { name, initializer } => {
                out.push(name);
                out.extend(initializer);
            }
            Block { statements } => out.extend(statements),
            ExpressionStatement { expression } | Parenthesized { expression } => out.push(expression),
            If {
                condition,
                then_branch,
                else_branch,
            } => {
                out.push(condition);
                out.push(then_branch);
                out.extend(else_branch);
            }
            Return { expression } => out.extend(expression),
            Try {
                body,
                catches,
                finally,
            } => {
                out.push(body);
                out.extend(catches);
                out.extend(finally);
            }
            CatchClause { parameter, body } => {
                out.push(parameter);
                out.push(body);
            }
            SuperConstructorCall { arguments } => out.extend(arguments),
            FieldAccess { target, name } => {
                out.push(target);
                out.push(name);
            }
            MethodCall {
                target,
                name,
                arguments,
            } => {
                out.extend(target);
                out.push(name);
                out.extend(arguments);
            }
            New {
                ty,
                arguments,
                body,
            } => {
                out.push(ty);
                out.extend(arguments);
                if let Some(members) = body {
                    out.extend(members);
                }
            }
            Assignment { left, right } | Binary { left, right, .. } => {
                out.push(left);
                out.push(right);
            }
            Unary { operand, .. } => out.push(operand),
            Cast { ty, expression } => {
                out.push(ty);
                out.push(expression);
            }
            Import { .. } | Empty | Name { .. } | This | Null | Literal { .. } | Type { .. } => {}
        }
        out
    }

    /// Mutable references to every child slot, in source order.
    pub fn children_mut(&mut self) -> Vec<&mut C> {
        use NodeKind::*;
        let mut out: Vec<&mut C> = Vec::new();
        match self {
            CompilationUnit { imports, types, .. } => {
                out.extend(imports);
                out.extend(types);
            }
            TypeDeclaration {
                name,
                superclass,
                interfaces,
                members,
                ..
            } => {
                out.push(name);
                out.extend(superclass);
                out.extend(interfaces);
                out.extend(members);
            }
            FieldDeclaration { ty, fragments, .. } | LocalDeclaration { ty, fragments, .. } => {
                out.push(ty);
                out.extend(fragments);
            }
            MethodDeclaration {
                return_type,
                name,
                parameters,
                body,
                ..
            } => {
                out.extend(return_type);
                out.push(name);
                out.extend(parameters);
                out.extend(body);
            }
            Parameter { ty, name, .. } => {
                out.push(ty);
                out.push(name);
            }
            Fragment { name, initializer } => {
                out.push(name);
                out.extend(initializer);
            }
            Block { statements } => out.extend(statements),
            ExpressionStatement { expression } | Parenthesized { expression } => out.push(expression),
            If {
                condition,
                then_branch,
                else_branch,
            } => {
                out.push(condition);
                out.push(then_branch);
                out.extend(else_branch);
            }
            Return { expression } => out.extend(expression),
            Try {
                body,
                catches,
                finally,
            } => {
                out.push(body);
                out.extend(catches);
                out.extend(finally);
            }
            CatchClause { parameter, body } => {
                out.push(parameter);
                out.push(body);
            }
            SuperConstructorCall { arguments } => out.extend(arguments),
            FieldAccess { target, name } => {
                out.push(target);
                out.push(name);
            }
            MethodCall {
                target,
                name,
                arguments,
            } => {
                out.extend(target);
                out.push(name);
                out.extend(arguments);
            }
            New {
                ty,
                arguments,
                body,
            } => {
                out.push(ty);
                out.extend(arguments);
                if let Some(members) = body {
                    out.extend(members);
                }
            }
            Assignment { left, right } | Binary { left, right, .. } => {
                out.push(left);
                out.push(right);
            }
            Unary { operand, .. } => out.push(operand),
            Cast { ty, expression } => {
                out.push(ty);
                out.push(expression);
            }
            Import { .. } | Empty | Name { .. } | This | Null | Literal { .. } | Type { .. } => {}
        }
        out
    }

    /// Convert every child with `f`, keeping the shape.
    pub fn map<D>(self, mut f: impl FnMut(C) -> D) -> NodeKind<D> {
        use NodeKind::*;
        fn all<C, D>(items: Vec<C>, f: &mut impl FnMut(C) -> D) -> Vec<D> {
            items.into_iter().map(f).collect()
        }
        match self {
            CompilationUnit {
                package,
                imports,
                types,
            } => CompilationUnit {
                package,
                imports: all(imports, &mut f),
                types: all(types, &mut f),
            },
            Import {
                name,
                is_static,
                on_demand,
            } => Import {
                name,
                is_static,
                on_demand,
            },
            TypeDeclaration {
                modifiers,
                name,
                superclass,
                interfaces,
                members,
            } => TypeDeclaration {
                modifiers,
                name: f(name),
                superclass: superclass.map(&mut f),
                interfaces: all(interfaces, &mut f),
                members: all(members, &mut f),
            },
            FieldDeclaration {
                modifiers,
                ty,
                fragments,
            } => FieldDeclaration {
                modifiers,
                ty: f(ty),
                fragments: all(fragments, &mut f),
            },
            MethodDeclaration {
                modifiers,
                return_type,
                name,
                parameters,
                body,
            } => MethodDeclaration {
                modifiers,
                return_type: return_type.map(&mut f),
                name: f(name),
                parameters: all(parameters, &mut f),
                body: body.map(&mut f),
            },
            Parameter {
                modifiers,
                ty,
                name,
            } => Parameter {
                modifiers,
                ty: f(ty),
                name: f(name),
            },
            Fragment { name, initializer } => Fragment {
                name: f(name),
                initializer: initializer.map(&mut f),
            },
            Block { statements } => Block {
                statements: all(statements, &mut f),
            },
            LocalDeclaration {
                modifiers,
                ty,
                fragments,
            } => LocalDeclaration {
                modifiers,
                ty: f(ty),
                fragments: all(fragments, &mut f),
            },
            ExpressionStatement { expression } => ExpressionStatement {
                expression: f(expression),
            },
            If {
                condition,
                then_branch,
                else_branch,
            } => If {
                condition: f(condition),
                then_branch: f(then_branch),
                else_branch: else_branch.map(&mut f),
            },
            Return { expression } => Return {
                expression: expression.map(&mut f),
            },
            Try {
                body,
                catches,
                finally,
            } => Try {
                body: f(body),
                catches: all(catches, &mut f),
                finally: finally.map(&mut f),
            },
            CatchClause { parameter, body } => CatchClause {
                parameter: f(parameter),
                body: f(body),
            },
            SuperConstructorCall { arguments } => SuperConstructorCall {
                arguments: all(arguments, &mut f),
            },
            Empty => Empty,
            Name { identifier } => Name { identifier },
            FieldAccess { target, name } => FieldAccess {
                target: f(target),
                name: f(name),
            },
            MethodCall {
                target,
                name,
                arguments,
            } => MethodCall {
                target: target.map(&mut f),
                name: f(name),
                arguments: all(arguments, &mut f),
            },
            New {
                ty,
                arguments,
                body,
            } => New {
                ty: f(ty),
                arguments: all(arguments, &mut f),
                body: body.map(|members| all(members, &mut f)),
            },
            Assignment { left, right } => Assignment {
                left: f(left),
                right: f(right),
            },
            Binary {
                operator,
                left,
                right,
            } => Binary {
                operator,
                left: f(left),
                right: f(right),
            },
            Unary { operator, operand } => Unary {
                operator,
                operand: f(operand),
            },
            Cast { ty, expression } => Cast {
                ty: f(ty),
                expression: f(expression),
            },
            Parenthesized { expression } => Parenthesized {
                expression: f(expression),
            },
            This => This,
            Null => Null,
            Literal { text } => Literal { text },
            Type { text } => Type { text },
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            NodeKind::Block { .. }
                | NodeKind::LocalDeclaration { .. }
                | NodeKind::ExpressionStatement { .. }
                | NodeKind::If { .. }
                | NodeKind::Return { .. }
                | NodeKind::Try { .. }
                | NodeKind::SuperConstructorCall { .. }
                | NodeKind::Empty
        )
    }

    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            NodeKind::Name { .. }
                | NodeKind::FieldAccess { .. }
                | NodeKind::MethodCall { .. }
                | NodeKind::New { .. }
                | NodeKind::Assignment { .. }
                | NodeKind::Binary { .. }
                | NodeKind::Unary { .. }
                | NodeKind::Cast { .. }
                | NodeKind::Parenthesized { .. }
                | NodeKind::This
                | NodeKind::Null
                | NodeKind::Literal { .. }
        )
    }

    pub fn is_body_declaration(&self) -> bool {
        matches!(
            self,
            NodeKind::FieldDeclaration { .. }
                | NodeKind::MethodDeclaration { .. }
                | NodeKind::TypeDeclaration { .. }
        )
    }

    /// Short label for diagnostics.
    pub fn label(&self) -> &'static str {
        use NodeKind::*;
        match self {
            CompilationUnit { .. } => "compilation unit",
            Import { .. } => "import",
            TypeDeclaration { .. } => "type declaration",
            FieldDeclaration { .. } => "field declaration",
            MethodDeclaration { .. } => "method declaration",
            Parameter { .. } => "parameter",
            Fragment { .. } => "variable fragment",
            Block { .. } => "block",
            LocalDeclaration { .. } => "local declaration",
            ExpressionStatement { .. } => "expression statement",
            If { .. } => "if statement",
            Return { .. } => "return statement",
            Try { .. } => "try statement",
            CatchClause { .. } => "catch clause",
            SuperConstructorCall { .. } => "super constructor call",
            Empty => "empty statement",
            Name { .. } => "name",
            FieldAccess { .. } => "field access",
            MethodCall { .. } => "method invocation",
            New { .. } => "instance creation",
            Assignment { .. } => "assignment",
            Binary { .. } => "binary expression",
            Unary { .. } => "unary expression",
            Cast { .. } => "cast",
            Parenthesized { .. } => "parenthesized expression",
            This => "this",
            Null => "null",
            Literal { .. } => "literal",
            Type { .. } => "type",
        }
    }
}

/// An owned syntax tree as produced by the parser. Spans are relative to the parsed text.
#[derive(Debug, Clone, PartialEq)]
pub struct Syntax {
    pub kind: NodeKind<Box<Syntax>>,
    pub span: Span,
}

impl Syntax {
    pub fn new(start: usize, end: usize, kind: NodeKind<Box<Syntax>>) -> Self {
        Syntax {
            kind,
            span: Span::new(start, end),
        }
    }
}
