//! End-to-end tests for artifact generation

use astgen_codegen::{declarations_unit, generate, Artifacts, EmitOptions};
use astgen_common::GenError;
use astgen_schema::{builtin_registry, parse_schema_text, registry_from_tables};
use pretty_assertions::assert_eq;
use std::collections::HashSet;

#[test]
fn test_generation_is_idempotent() {
    let options = EmitOptions::default();
    let first = generate(&builtin_registry().unwrap(), &options);
    let second = generate(&builtin_registry().unwrap(), &options);
    assert_eq!(first, second);
}

#[test]
fn test_discriminator_completeness() {
    let registry = builtin_registry().unwrap();
    let unit = declarations_unit(&registry, &EmitOptions::default());
    let node_type = unit.enum_named("NodeType").unwrap();

    assert_eq!(node_type.members.len(), registry.variant_count());
    let unique: HashSet<_> = node_type.members.iter().collect();
    assert_eq!(unique.len(), node_type.members.len());

    for (family, variant) in registry.variants() {
        let tag = format!("NODE_{}", variant.name.to_uppercase());
        assert!(
            node_type.members.contains(&tag),
            "{} ({}) has no discriminator",
            variant.name,
            family.group
        );
    }
}

#[test]
fn test_break_statement_scenario() {
    let registry = registry_from_tables(&[(
        "stmt",
        &["Stmt: Node self", "Break: Token keyword"] as &[&str],
    )])
    .unwrap();
    let Artifacts {
        operations,
        declarations,
    } = generate(&registry, &EmitOptions::default());

    assert!(declarations.contains("typedef enum {\n    NODE_BREAK,\n} NodeType;"));
    assert!(declarations.contains("struct Break {\n    Stmt self;\n    Token keyword;\n};"));
    assert!(operations.contains("void writeStmtArray(StmtArray* stmtArray, Stmt* stmt) {"));
    assert!(operations.contains("GROW_ARRAY(Stmt*, stmtArray->stmts, oldCapacity, stmtArray->capacity);"));
    assert!(operations.contains("FREE_ARRAY(Stmt*, stmtArray->stmts, stmtArray->capacity);"));
}

#[test]
fn test_field_order_is_preserved() {
    let registry = builtin_registry().unwrap();
    let unit = declarations_unit(&registry, &EmitOptions::default());

    for (family, variant) in registry.variants() {
        let record = unit.record(&variant.name).unwrap();
        assert_eq!(record.members[0].name, "self");
        assert_eq!(record.members[0].ty.base, family.base_name());
        assert_eq!(&record.members[1..], variant.fields.as_slice());
    }
}

#[test]
fn test_builtin_declarations_header() {
    let declarations = generate(&builtin_registry().unwrap(), &EmitOptions::default()).declarations;
    let expected_prefix = r#"#ifndef saffron_AST_H
#define saffron_AST_H

#include "../scanner.h"
#include "../value.h"
#include "../memory.h"

typedef enum {
    TYPE_FUNCTION,
    TYPE_SCRIPT,
    TYPE_METHOD,
    TYPE_INITIALIZER,
} FunctionType;

typedef enum {
    TYPE_FIELD,
    TYPE_VARIABLE,
} AssignmentType;

#define ALLOCATE_NODE(type, nodeType) (type*) allocateNode(sizeof(type), nodeType)

#ifndef GROW_CAPACITY
#define GROW_CAPACITY(capacity) ((capacity) < 8 ? 8 : (capacity) * 2)
#endif

typedef enum {
    NODE_SIMPLE,
    NODE_FUNCTOR,
"#;
    assert!(declarations.starts_with(expected_prefix));

    let family_block = r#"typedef struct {
    Node self;
    TypeNode* type;
} Expr;

typedef struct {
    int count;
    int capacity;
    Expr** exprs;
} ExprArray;

void initExprArray(ExprArray* exprArray);
void writeExprArray(ExprArray* exprArray, Expr* expr);
void freeExprArray(ExprArray* exprArray);
"#;
    assert!(declarations.contains(family_block));
    assert!(declarations.contains(
        "struct Class {\n    Stmt self;\n    Token name;\n    struct Variable* superclass;\n    StmtArray body;\n    TypeNodeArray generics;\n};"
    ));
}

#[test]
fn test_malformed_schema_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("generated");

    let result = parse_schema_text("[stmt]\nStmt : Node self\nBreak Token keyword\n", "bad.schema")
        .map(|registry| generate(&registry, &EmitOptions::default()))
        .and_then(|artifacts| artifacts.write_to(&out, &EmitOptions::default()));

    assert!(matches!(result, Err(GenError::MissingSeparator { .. })));
    assert!(!out.exists());
}

#[test]
fn test_collision_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("generated");

    let schema = "[expr]\nExpr : Node self\nGetItem : Token name\n[stmt]\nStmt : Node self\nGETITEM : Token name\n";
    let result = parse_schema_text(schema, "bad.schema")
        .map(|registry| generate(&registry, &EmitOptions::default()))
        .and_then(|artifacts| artifacts.write_to(&out, &EmitOptions::default()));

    assert!(matches!(result, Err(GenError::DiscriminatorCollision { .. })));
    assert!(!out.exists());
}
