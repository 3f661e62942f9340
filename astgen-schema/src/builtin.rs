//! Built-in schema of the interpreter's front end
//!
//! Families are declared in dependency order: `typeNode` first because the
//! `expr` and `parameter` base records point at `TypeNode`.

use crate::registry::{Registry, RegistryBuilder};
use astgen_common::{GenError, SourceLocation};

pub const TYPE_NODES: &[&str] = &[
    "TypeNode         : Node self",
    "Simple           : Token name, TypeNodeArray generics",
    "Functor          : TypeNodeArray arguments, TypeNode *returnType, TypeNodeArray generics",
    "Union            : TypeNode* left, TypeNode* right",
    "Interface        : Token name, struct Variable* superType, StmtArray body, TypeNodeArray generics",
    "TypeDeclaration  : Token name, TypeNode* target, TypeNodeArray generics",
];

pub const EXPRS: &[&str] = &[
    "Expr     : Node self, TypeNode *type",
    "Binary   : Expr *left, Token operator, Expr* right",
    "Grouping : Expr* expression",
    "Literal  : Value value",
    "Unary    : Token operator, Expr* right",
    "Variable : Token name",
    "AltAssign: Token name, Token operator, Expr* value",
    "Assign   : Token name, Expr* value",
    "Logical  : Expr* left, Token operator, Expr* right",
    "Call     : Expr* callee, Token paren, ExprArray arguments",
    "GetItem  : Expr* object, Token bracket, Expr* index",
    "Get      : Expr* object, Token name",
    "Set      : Expr* object, Token name, Expr* value",
    "Super    : Token keyword, Token method",
    "This     : Token keyword",
    "Yield    : Expr* expression",
    "Lambda   : ParameterArray params, StmtArray body, TypeNodeArray generics",
    "List     : ExprArray items, Token bracket",
    "Map      : ExprArray keys, ExprArray values, Token brace",
];

pub const STMTS: &[&str] = &[
    "Stmt       : Node self",
    "Expression : Expr* expression, TypeNode* type",
    "Var        : Token name, Expr* initializer, TypeNode *type, AssignmentType assignmentType",
    "Block      : StmtArray statements",
    "Function   : Token name, ParameterArray params, TypeNodeArray generics, StmtArray body, FunctionType functionType, TypeNode *returnType",
    "Class      : Token name, struct Variable* superclass, StmtArray body, TypeNodeArray generics",
    "If         : Expr* condition, Stmt* thenBranch, Stmt* elseBranch",
    "While      : Expr* condition, Stmt* body",
    "For        : Stmt* initializer, Expr* condition, Expr* increment, Stmt* body",
    "Break      : Token keyword",
    "Return     : Token keyword, Expr* value",
    "Import     : Expr* expression, Token name",
    "Enum       : Token name, StmtArray body",
    "EnumItem   : Token name, ParameterArray params",
    "MethodSig  : Token name, ParameterArray params, TypeNode *returnType, FunctionType functionType, TypeNodeArray generics",
];

pub const PARAMETERS: &[&str] = &[
    "Parameter  : Node self, Token name, TypeNode* type",
    "Positional : ",
    "Keyword    : Expr* default_",
    "Variadic   : ",
];

pub const FUNCTION_TYPES: &[&str] = &[
    "TYPE_FUNCTION",
    "TYPE_SCRIPT",
    "TYPE_METHOD",
    "TYPE_INITIALIZER",
];

pub const ASSIGNMENT_TYPES: &[&str] = &["TYPE_FIELD", "TYPE_VARIABLE"];

/// Family tables in declaration order
pub const FAMILIES: &[(&str, &[&str])] = &[
    ("typeNode", TYPE_NODES),
    ("expr", EXPRS),
    ("stmt", STMTS),
    ("parameter", PARAMETERS),
];

/// Registry for the built-in schema
pub fn builtin_registry() -> Result<Registry, GenError> {
    let mut builder = RegistryBuilder::new();
    builder
        .prelude_enum("FunctionType", FUNCTION_TYPES, SourceLocation::builtin("enums", 0))
        .prelude_enum("AssignmentType", ASSIGNMENT_TYPES, SourceLocation::builtin("enums", 1));
    for (group, entries) in FAMILIES {
        builder.family(group, entries);
    }
    builder.build()
}
