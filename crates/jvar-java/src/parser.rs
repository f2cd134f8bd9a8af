// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! PEG grammar for the Java subset found in GUI construction code.
//!
//! The grammar works directly on `str` and records byte positions with `position!()`.
//! Rules never consume trailing whitespace, so a node's span ends at its last token.

use peg::str::LineCol;
use thiserror::Error;

use crate::syntax::{Modifiers, NodeKind, Syntax};
use crate::validation::is_java_keyword;

/// Error for source or snippet text that does not parse.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("parse error at {line}:{column}: expected {expected}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
    pub expected: String,
}

impl From<peg::error::ParseError<LineCol>> for ParseError {
    fn from(err: peg::error::ParseError<LineCol>) -> Self {
        ParseError {
            line: err.location.line,
            column: err.location.column,
            offset: err.location.offset,
            expected: err.expected.to_string(),
        }
    }
}

fn boxed(items: Vec<Syntax>) -> Vec<Box<Syntax>> {
    items.into_iter().map(Box::new).collect()
}

fn infix(left: Syntax, operator: &str, right: Syntax) -> Syntax {
    let (start, end) = (left.span.start, right.span.end);
    Syntax::new(
        start,
        end,
        NodeKind::Binary {
            operator: operator.to_string(),
            left: Box::new(left),
            right: Box::new(right),
        },
    )
}

type Selector = (Syntax, Option<Vec<Syntax>>, usize);

fn fold_selectors(primary: Syntax, selectors: Vec<Selector>) -> Syntax {
    let start = primary.span.start;
    selectors
        .into_iter()
        .fold(primary, |target, (name, arguments, end)| match arguments {
            Some(arguments) => Syntax::new(
                start,
                end,
                NodeKind::MethodCall {
                    target: Some(Box::new(target)),
                    name: Box::new(name),
                    arguments: boxed(arguments),
                },
            ),
            None => Syntax::new(
                start,
                end,
                NodeKind::FieldAccess {
                    target: Box::new(target),
                    name: Box::new(name),
                },
            ),
        })
}

peg::parser! {
    grammar java() for str {
        rule _() = quiet!{ ([' ' | '\t' | '\r' | '\n'] / "//" (!['\n'] [_])* / "/*" (!"*/" [_])* "*/")* }

        rule ident_start() = ['a'..='z' | 'A'..='Z' | '_' | '$']
        rule ident_char() = ['a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '$']

        rule kw(k: &'static str)
            = quiet!{ i:$(ident_start() ident_char()*) {? if i == k { Ok(()) } else { Err(k) } } }
            / expected!(k)

        rule identifier() -> &'input str
            = quiet!{ i:$(ident_start() ident_char()*) {?
                if is_java_keyword(i) { Err("identifier") } else { Ok(i) }
            } }
            / expected!("identifier")

        rule name() -> Syntax
            = s:position!() i:identifier() e:position!() {
                Syntax::new(s, e, NodeKind::Name { identifier: i.to_string() })
            }

        rule qualified() = identifier() ++ "."

        // ---- types

        rule primitive()
            = ("boolean" / "byte" / "char" / "short" / "int" / "long" / "float" / "double" / "void") !ident_char()

        rule type_argument()
            = "?" (_ (kw("extends") / kw("super")) _ type_text())?
            / type_text()

        rule type_arguments() = "<" _ (type_argument() ** (_ "," _)) _ ">"

        rule type_text() = (primitive() / qualified()) (_ type_arguments())? (_ "[" _ "]")*

        rule ty() -> Syntax
            = s:position!() t:$(type_text()) e:position!() {
                Syntax::new(s, e, NodeKind::Type { text: t.to_string() })
            }

        rule modifier() -> String
            = m:$(("public" / "protected" / "private" / "static" / "final" / "abstract"
                  / "synchronized" / "transient" / "volatile" / "native" / "strictfp") !ident_char()) {
                m.to_string()
            }
            / a:$("@" qualified() (_ "(" (!")" [_])* ")")?) { a.to_string() }

        rule modifiers() -> Modifiers = m:(m:modifier() _ { m })* { Modifiers(m) }

        // ---- expressions

        rule string_literal() = "\"" ("\\" [_] / !['"' | '\\' | '\n'] [_])* "\""
        rule char_literal() = "'" ("\\" [_] / !['\'' | '\\' | '\n'] [_])* "'"
        rule number() = ['0'..='9']+ ("." ['0'..='9']+)? ['l' | 'L' | 'f' | 'F' | 'd' | 'D']? !ident_char()

        rule literal() -> Syntax
            = s:position!() t:$(string_literal() / char_literal() / number() / kw("true") / kw("false")) e:position!() {
                Syntax::new(s, e, NodeKind::Literal { text: t.to_string() })
            }

        rule arguments() -> Vec<Syntax> = "(" _ a:(expression() ** (_ "," _)) _ ")" { a }

        rule class_body() -> Vec<Syntax> = "{" _ m:(x:member() _ { x })* "}" { m }

        rule creation() -> Syntax
            = s:position!() kw("new") _ t:ty() _ a:arguments() b:(_ b:class_body() { b })? e:position!() {
                Syntax::new(s, e, NodeKind::New {
                    ty: Box::new(t),
                    arguments: boxed(a),
                    body: b.map(boxed),
                })
            }

        rule primary() -> Syntax
            = s:position!() "(" _ x:expression() _ ")" e:position!() {
                Syntax::new(s, e, NodeKind::Parenthesized { expression: Box::new(x) })
            }
            / creation()
            / s:position!() kw("this") e:position!() { Syntax::new(s, e, NodeKind::This) }
            / s:position!() kw("null") e:position!() { Syntax::new(s, e, NodeKind::Null) }
            / literal()
            / s:position!() n:name() a:(_ a:arguments() { a })? e:position!() {
                match a {
                    Some(arguments) => Syntax::new(s, e, NodeKind::MethodCall {
                        target: None,
                        name: Box::new(n),
                        arguments: boxed(arguments),
                    }),
                    None => n,
                }
            }

        rule selector() -> Selector
            = _ "." _ n:name() a:(_ a:arguments() { a })? e:position!() { (n, a, e) }

        rule postfix() -> Syntax = p:primary() s:selector()* { fold_selectors(p, s) }

        rule cast() -> Syntax
            = s:position!() "(" _ t:ty() _ ")" _ x:postfix() {
                let e = x.span.end;
                Syntax::new(s, e, NodeKind::Cast { ty: Box::new(t), expression: Box::new(x) })
            }

        rule unary() -> Syntax
            = s:position!() op:$("!" / "-" / "+" / "~") _ x:unary() {
                let e = x.span.end;
                Syntax::new(s, e, NodeKind::Unary { operator: op.to_string(), operand: Box::new(x) })
            }
            / cast()
            / postfix()

        rule binary() -> Syntax = precedence!{
            l:(@) _ "||" _ r:@ { infix(l, "||", r) }
            --
            l:(@) _ "&&" _ r:@ { infix(l, "&&", r) }
            --
            l:(@) _ "|" !['|' | '='] _ r:@ { infix(l, "|", r) }
            --
            l:(@) _ "&" !['&' | '='] _ r:@ { infix(l, "&", r) }
            --
            l:(@) _ "==" _ r:@ { infix(l, "==", r) }
            l:(@) _ "!=" _ r:@ { infix(l, "!=", r) }
            --
            l:(@) _ "<=" _ r:@ { infix(l, "<=", r) }
            l:(@) _ ">=" _ r:@ { infix(l, ">=", r) }
            l:(@) _ "<" _ r:@ { infix(l, "<", r) }
            l:(@) _ ">" _ r:@ { infix(l, ">", r) }
            --
            l:(@) _ "+" !['+' | '='] _ r:@ { infix(l, "+", r) }
            l:(@) _ "-" !['-' | '='] _ r:@ { infix(l, "-", r) }
            --
            l:(@) _ "*" !"=" _ r:@ { infix(l, "*", r) }
            l:(@) _ "/" !['/' | '*' | '='] _ r:@ { infix(l, "/", r) }
            l:(@) _ "%" !"=" _ r:@ { infix(l, "%", r) }
            --
            u:unary() { u }
        }

        rule assignment() -> Syntax
            = l:postfix() _ "=" !"=" _ r:expression() {
                let (s, e) = (l.span.start, r.span.end);
                Syntax::new(s, e, NodeKind::Assignment { left: Box::new(l), right: Box::new(r) })
            }
            / binary()

        pub rule expression() -> Syntax = assignment()

        // ---- statements

        rule fragment() -> Syntax
            = s:position!() n:name() (_ "[" _ "]")* i:(_ "=" !"=" _ x:expression() { x })? e:position!() {
                Syntax::new(s, e, NodeKind::Fragment { name: Box::new(n), initializer: i.map(Box::new) })
            }

        rule fragments() -> Vec<Syntax> = f:(fragment() ++ (_ "," _)) { f }

        rule block() -> Syntax
            = s:position!() "{" _ st:(x:statement() _ { x })* "}" e:position!() {
                Syntax::new(s, e, NodeKind::Block { statements: boxed(st) })
            }

        rule if_statement() -> Syntax
            = s:position!() kw("if") _ "(" _ c:expression() _ ")" _ t:statement()
              el:(_ kw("else") _ x:statement() { x })? e:position!() {
                Syntax::new(s, e, NodeKind::If {
                    condition: Box::new(c),
                    then_branch: Box::new(t),
                    else_branch: el.map(Box::new),
                })
            }

        rule return_statement() -> Syntax
            = s:position!() kw("return") x:(_ x:expression() { x })? _ ";" e:position!() {
                Syntax::new(s, e, NodeKind::Return { expression: x.map(Box::new) })
            }

        rule catch_clause() -> Syntax
            = s:position!() kw("catch") _ "(" _ p:parameter() _ ")" _ b:block() e:position!() {
                Syntax::new(s, e, NodeKind::CatchClause { parameter: Box::new(p), body: Box::new(b) })
            }

        rule try_statement() -> Syntax
            = s:position!() kw("try") _ b:block() c:(_ c:catch_clause() { c })*
              f:(_ kw("finally") _ f:block() { f })? e:position!() {
                Syntax::new(s, e, NodeKind::Try {
                    body: Box::new(b),
                    catches: boxed(c),
                    finally: f.map(Box::new),
                })
            }

        rule super_call() -> Syntax
            = s:position!() kw("super") _ a:arguments() _ ";" e:position!() {
                Syntax::new(s, e, NodeKind::SuperConstructorCall { arguments: boxed(a) })
            }

        rule local_declaration() -> Syntax
            = s:position!() m:modifiers() t:ty() _ f:fragments() _ ";" e:position!() {
                Syntax::new(s, e, NodeKind::LocalDeclaration { modifiers: m, ty: Box::new(t), fragments: boxed(f) })
            }

        rule expression_statement() -> Syntax
            = s:position!() x:expression() _ ";" e:position!() {
                Syntax::new(s, e, NodeKind::ExpressionStatement { expression: Box::new(x) })
            }

        pub rule statement() -> Syntax
            = block()
            / if_statement()
            / return_statement()
            / try_statement()
            / super_call()
            / s:position!() ";" e:position!() { Syntax::new(s, e, NodeKind::Empty) }
            / local_declaration()
            / expression_statement()

        // ---- declarations

        rule parameter() -> Syntax
            = s:position!() m:modifiers() t:ty() _ ("..." _)? n:name() (_ "[" _ "]")* e:position!() {
                Syntax::new(s, e, NodeKind::Parameter { modifiers: m, ty: Box::new(t), name: Box::new(n) })
            }

        rule throws_clause() = kw("throws") _ (qualified() ++ (_ "," _)) _

        rule method_declaration() -> Syntax
            = s:position!() m:modifiers() rt:(t:ty() _ &(name() _ "(") { t })? n:name() _
              "(" _ p:(parameter() ** (_ "," _)) _ ")" _ throws_clause()?
              b:(b:block() { Some(b) } / ";" { None }) e:position!() {
                Syntax::new(s, e, NodeKind::MethodDeclaration {
                    modifiers: m,
                    return_type: rt.map(Box::new),
                    name: Box::new(n),
                    parameters: boxed(p),
                    body: b.map(Box::new),
                })
            }

        rule field_declaration() -> Syntax
            = s:position!() m:modifiers() t:ty() _ f:fragments() _ ";" e:position!() {
                Syntax::new(s, e, NodeKind::FieldDeclaration { modifiers: m, ty: Box::new(t), fragments: boxed(f) })
            }

        rule type_declaration() -> Syntax
            = s:position!() m:modifiers() kw("class") _ n:name() _
              sup:(kw("extends") _ t:ty() _ { t })?
              ifs:(kw("implements") _ l:(ty() ++ (_ "," _)) _ { l })?
              b:class_body() e:position!() {
                Syntax::new(s, e, NodeKind::TypeDeclaration {
                    modifiers: m,
                    name: Box::new(n),
                    superclass: sup.map(Box::new),
                    interfaces: boxed(ifs.unwrap_or_default()),
                    members: boxed(b),
                })
            }

        rule member() -> Syntax
            = method_declaration()
            / field_declaration()
            / type_declaration()

        rule package_declaration() -> String
            = kw("package") _ n:$(qualified()) _ ";" { n.to_string() }

        rule import_declaration() -> Syntax
            = s:position!() kw("import") _ st:(kw("static") _)? n:$(qualified()) d:("." "*")? _ ";" e:position!() {
                Syntax::new(s, e, NodeKind::Import {
                    name: n.to_string(),
                    is_static: st.is_some(),
                    on_demand: d.is_some(),
                })
            }

        pub rule compilation_unit() -> Syntax
            = _ p:(p:package_declaration() _ { p })? i:(x:import_declaration() _ { x })*
              t:(x:type_declaration() _ { x })* ![_] {
                Syntax::new(0, 0, NodeKind::CompilationUnit {
                    package: p,
                    imports: boxed(i),
                    types: boxed(t),
                })
            }

        pub rule statement_snippet() -> Syntax = _ s:statement() _ ![_] { s }
        pub rule expression_snippet() -> Syntax = _ x:expression() _ ![_] { x }
        pub rule member_snippet() -> Syntax = _ m:member() _ ![_] { m }
        pub rule import_snippet() -> Syntax = _ i:import_declaration() _ ![_] { i }
    }
}

/// Parse a whole compilation unit. The root span covers the entire source.
pub fn parse_compilation_unit(source: &str) -> Result<Syntax, ParseError> {
    let mut unit = java::compilation_unit(source)?;
    unit.span.end = source.len();
    Ok(unit)
}

/// Parse a single statement. Spans are relative to `source`.
pub fn parse_statement(source: &str) -> Result<Syntax, ParseError> {
    Ok(java::statement_snippet(source)?)
}

/// Parse a single expression. Spans are relative to `source`.
pub fn parse_expression(source: &str) -> Result<Syntax, ParseError> {
    Ok(java::expression_snippet(source)?)
}

/// Parse a single field, method or nested type declaration.
pub fn parse_member(source: &str) -> Result<Syntax, ParseError> {
    Ok(java::member_snippet(source)?)
}

/// Parse a single import declaration.
pub fn parse_import(source: &str) -> Result<Syntax, ParseError> {
    Ok(java::import_snippet(source)?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn text<'a>(source: &'a str, syntax: &Syntax) -> &'a str {
        &source[syntax.span.start..syntax.span.end]
    }

    mod statements {
        use super::*;

        #[test]
        fn local_declaration_with_creation() {
            let source = "JButton button = new JButton(\"OK\");";
            let stmt = parse_statement(source).unwrap();
            assert_eq!(text(source, &stmt), source);
            let NodeKind::LocalDeclaration { ty, fragments, .. } = &stmt.kind else {
                panic!("expected local declaration, got {:?}", stmt.kind);
            };
            assert_eq!(text(source, ty), "JButton");
            assert_eq!(fragments.len(), 1);
            let NodeKind::Fragment { name, initializer } = &fragments[0].kind else {
                panic!("expected fragment");
            };
            assert_eq!(text(source, name), "button");
            let init = initializer.as_ref().unwrap();
            assert_eq!(text(source, init), "new JButton(\"OK\")");
            assert!(matches!(init.kind, NodeKind::New { .. }));
        }

        #[test]
        fn expression_statement_not_declaration() {
            let stmt = parse_statement("panel.add(button);").unwrap();
            let NodeKind::ExpressionStatement { expression } = &stmt.kind else {
                panic!("expected expression statement");
            };
            let NodeKind::MethodCall { target, name, arguments } = &expression.kind else {
                panic!("expected invocation");
            };
            assert!(target.is_some());
            assert_eq!(name.kind, NodeKind::Name { identifier: "add".to_string() });
            assert_eq!(arguments.len(), 1);
        }

        #[test]
        fn assignment_statement() {
            let source = "this.button = new JButton();";
            let stmt = parse_statement(source).unwrap();
            let NodeKind::ExpressionStatement { expression } = &stmt.kind else {
                panic!("expected expression statement");
            };
            let NodeKind::Assignment { left, .. } = &expression.kind else {
                panic!("expected assignment");
            };
            assert!(matches!(left.kind, NodeKind::FieldAccess { .. }));
            assert_eq!(text(source, left), "this.button");
        }

        #[test]
        fn lazy_if_with_null_guard() {
            let source = "if (button == null) {\n  button = new JButton();\n}";
            let stmt = parse_statement(source).unwrap();
            let NodeKind::If { condition, then_branch, else_branch } = &stmt.kind else {
                panic!("expected if");
            };
            assert!(else_branch.is_none());
            let NodeKind::Binary { operator, right, .. } = &condition.kind else {
                panic!("expected binary condition");
            };
            assert_eq!(operator, "==");
            assert_eq!(right.kind, NodeKind::Null);
            assert!(matches!(then_branch.kind, NodeKind::Block { .. }));
        }

        #[test]
        fn try_catch_finally() {
            let source = "try { a(); } catch (Exception e) { b(); } finally { c(); }";
            let stmt = parse_statement(source).unwrap();
            let NodeKind::Try { catches, finally, .. } = &stmt.kind else {
                panic!("expected try");
            };
            assert_eq!(catches.len(), 1);
            assert!(finally.is_some());
        }

        #[test]
        fn cast_and_binary_operators() {
            let source = "FlowLayout layout = (FlowLayout) panel.getLayout();";
            assert!(parse_statement(source).is_ok());
            let expr = parse_expression("SWT.BORDER | SWT.V_SCROLL").unwrap();
            assert!(matches!(expr.kind, NodeKind::Binary { ref operator, .. } if operator == "|"));
            let expr = parse_expression("(a) + b").unwrap();
            assert!(matches!(expr.kind, NodeKind::Binary { .. }));
        }

        #[test]
        fn keywords_are_not_names() {
            assert!(parse_expression("class").is_err());
            assert!(parse_statement("return;").is_ok());
        }
    }

    mod units {
        use super::*;

        #[test]
        fn class_with_members() {
            let source = r#"package test;
import javax.swing.*;
import java.awt.BorderLayout;

// comment
public class Test extends JPanel {
  private JButton button;
  public Test() {
    super();
    button = new JButton();
    add(button);
  }
  public static void main(String args[]) {
  }
  private JButton getButton() {
    return button;
  }
}
"#;
            let unit = parse_compilation_unit(source).unwrap();
            assert_eq!(unit.span.end, source.len());
            let NodeKind::CompilationUnit { package, imports, types } = &unit.kind else {
                panic!("expected unit");
            };
            assert_eq!(package.as_deref(), Some("test"));
            assert_eq!(imports.len(), 2);
            assert!(matches!(imports[0].kind, NodeKind::Import { on_demand: true, .. }));
            let NodeKind::TypeDeclaration { superclass, members, .. } = &types[0].kind else {
                panic!("expected type");
            };
            assert_eq!(text(source, superclass.as_ref().unwrap()), "JPanel");
            assert_eq!(members.len(), 4);
            assert!(matches!(members[1].kind, NodeKind::MethodDeclaration { return_type: None, .. }));
            let NodeKind::MethodDeclaration { modifiers, parameters, .. } = &members[2].kind else {
                panic!("expected main");
            };
            assert!(modifiers.is_static());
            assert_eq!(parameters.len(), 1);
        }

        #[test]
        fn constructor_has_no_return_type() {
            let source = "class Test {\n  Test(JPanel container) throws Exception {\n    super();\n  }\n  Test() {\n  }\n}";
            let unit = parse_compilation_unit(source).unwrap();
            let NodeKind::CompilationUnit { types, .. } = &unit.kind else {
                panic!("expected unit");
            };
            let NodeKind::TypeDeclaration { members, .. } = &types[0].kind else {
                panic!("expected type");
            };
            assert_eq!(members.len(), 2);
            let NodeKind::MethodDeclaration { return_type, name, parameters, body, .. } = &members[0].kind else {
                panic!("expected constructor");
            };
            assert!(return_type.is_none());
            assert_eq!(text(source, name), "Test");
            assert_eq!(parameters.len(), 1);
            assert!(body.is_some());
            assert!(matches!(members[1].kind, NodeKind::MethodDeclaration { return_type: None, .. }));
        }

        #[test]
        fn method_return_type_is_kept() {
            let source = "class Test {\n  private JButton getButton() {\n    return null;\n  }\n}";
            let unit = parse_compilation_unit(source).unwrap();
            let NodeKind::CompilationUnit { types, .. } = &unit.kind else {
                panic!("expected unit");
            };
            let NodeKind::TypeDeclaration { members, .. } = &types[0].kind else {
                panic!("expected type");
            };
            let NodeKind::MethodDeclaration { return_type, .. } = &members[0].kind else {
                panic!("expected method");
            };
            assert_eq!(text(source, return_type.as_ref().unwrap()), "JButton");
        }

        #[test]
        fn anonymous_class_body() {
            let source = "button.addActionListener(new ActionListener() {\n  public void actionPerformed(ActionEvent e) {\n  }\n});";
            let stmt = parse_statement(source).unwrap();
            assert_eq!(text(source, &stmt), source);
        }

        #[test]
        fn error_reports_location() {
            let err = parse_compilation_unit("class Test {\n  int x = ;\n}").unwrap_err();
            assert_eq!(err.line, 2);
        }
    }
}
