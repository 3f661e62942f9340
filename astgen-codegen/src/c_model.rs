//! C item model
//!
//! Both emitters build a [`CUnit`] first and render it afterwards. Layout
//! reflection walks the same records, so what is checked is exactly what
//! gets printed.

use astgen_schema::{Field, TypeSpec};

const INDENT: &str = "    ";

/// How a record is declared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// `typedef struct { ... } Name;`
    Typedef,
    /// `typedef struct Name { ... } Name;` for self-referential records
    TaggedTypedef,
    /// `struct Name { ... };`
    Struct,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CRecord {
    pub name: String,
    pub kind: RecordKind,
    pub members: Vec<Field>,
}

impl CRecord {
    pub fn new(name: &str, kind: RecordKind, members: Vec<Field>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            members,
        }
    }

    fn render(&self) -> String {
        let mut out = match self.kind {
            RecordKind::Typedef => "typedef struct {\n".to_string(),
            RecordKind::TaggedTypedef => format!("typedef struct {} {{\n", self.name),
            RecordKind::Struct => format!("struct {} {{\n", self.name),
        };
        for member in &self.members {
            out.push_str(&format!("{}{};\n", INDENT, member));
        }
        match self.kind {
            RecordKind::Typedef | RecordKind::TaggedTypedef => {
                out.push_str(&format!("}} {};", self.name))
            }
            RecordKind::Struct => out.push_str("};"),
        }
        out
    }
}

/// `typedef enum { ... } Name;`
#[derive(Debug, Clone, PartialEq)]
pub struct CEnum {
    pub name: String,
    pub members: Vec<String>,
}

impl CEnum {
    fn render(&self) -> String {
        let mut out = "typedef enum {\n".to_string();
        for member in &self.members {
            out.push_str(&format!("{}{},\n", INDENT, member));
        }
        out.push_str(&format!("}} {};", self.name));
        out
    }
}

/// Statement inside a function body
#[derive(Debug, Clone, PartialEq)]
pub enum CStmt {
    Line(String),
    Blank,
    If { condition: String, body: Vec<CStmt> },
}

impl CStmt {
    fn render_into(&self, depth: usize, out: &mut String) {
        match self {
            CStmt::Line(line) => {
                out.push_str(&INDENT.repeat(depth));
                out.push_str(line);
                out.push('\n');
            }
            CStmt::Blank => out.push('\n'),
            CStmt::If { condition, body } => {
                out.push_str(&format!("{}if ({}) {{\n", INDENT.repeat(depth), condition));
                for stmt in body {
                    stmt.render_into(depth + 1, out);
                }
                out.push_str(&format!("{}}}\n", INDENT.repeat(depth)));
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CFunction {
    pub return_type: TypeSpec,
    pub name: String,
    pub params: Vec<Field>,
    pub body: Vec<CStmt>,
}

impl CFunction {
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} {}({})", self.return_type, self.name, params)
    }

    pub fn prototype(&self) -> String {
        format!("{};", self.signature())
    }

    fn render_definition(&self) -> String {
        let mut out = format!("{} {{\n", self.signature());
        for stmt in &self.body {
            stmt.render_into(1, &mut out);
        }
        out.push('}');
        out
    }
}

/// One blank-line separated block of a translation unit
#[derive(Debug, Clone, PartialEq)]
pub enum CItem {
    /// Preprocessor lines kept together
    Directives(Vec<String>),
    Enum(CEnum),
    Record(CRecord),
    /// Consecutive prototypes with no blank line between them
    Prototypes(Vec<CFunction>),
    Definition(CFunction),
}

impl CItem {
    fn render(&self) -> String {
        match self {
            CItem::Directives(lines) => lines.join("\n"),
            CItem::Enum(e) => e.render(),
            CItem::Record(r) => r.render(),
            CItem::Prototypes(functions) => functions
                .iter()
                .map(CFunction::prototype)
                .collect::<Vec<_>>()
                .join("\n"),
            CItem::Definition(function) => function.render_definition(),
        }
    }
}

/// A complete generated source unit
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CUnit {
    pub items: Vec<CItem>,
}

impl CUnit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: CItem) {
        self.items.push(item);
    }

    pub fn records(&self) -> impl Iterator<Item = &CRecord> {
        self.items.iter().filter_map(|item| match item {
            CItem::Record(r) => Some(r),
            _ => None,
        })
    }

    pub fn record(&self, name: &str) -> Option<&CRecord> {
        self.records().find(|r| r.name == name)
    }

    pub fn enums(&self) -> impl Iterator<Item = &CEnum> {
        self.items.iter().filter_map(|item| match item {
            CItem::Enum(e) => Some(e),
            _ => None,
        })
    }

    pub fn enum_named(&self, name: &str) -> Option<&CEnum> {
        self.enums().find(|e| e.name == name)
    }

    /// Render the unit; blocks are separated by one blank line
    pub fn render(&self) -> String {
        let mut out = self
            .items
            .iter()
            .map(CItem::render)
            .collect::<Vec<_>>()
            .join("\n\n");
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_records() {
        let members = vec![Field::new(TypeSpec::value("Stmt"), "self")];
        let plain = CRecord::new("Pass", RecordKind::Struct, members.clone());
        assert_eq!(plain.render(), "struct Pass {\n    Stmt self;\n};");

        let typedef = CRecord::new("Wrapper", RecordKind::Typedef, members.clone());
        assert_eq!(typedef.render(), "typedef struct {\n    Stmt self;\n} Wrapper;");

        let tagged = CRecord::new("Wrapper", RecordKind::TaggedTypedef, members);
        assert_eq!(
            tagged.render(),
            "typedef struct Wrapper {\n    Stmt self;\n} Wrapper;"
        );
    }

    #[test]
    fn test_render_function_with_if() {
        let function = CFunction {
            return_type: TypeSpec::value("void"),
            name: "touch".to_string(),
            params: vec![Field::new(TypeSpec::pointer("int"), "x")],
            body: vec![
                CStmt::If {
                    condition: "*x < 1".to_string(),
                    body: vec![CStmt::Line("*x = 1;".to_string())],
                },
                CStmt::Blank,
                CStmt::Line("(*x)++;".to_string()),
            ],
        };
        assert_eq!(function.prototype(), "void touch(int* x);");
        assert_eq!(
            function.render_definition(),
            "void touch(int* x) {\n    if (*x < 1) {\n        *x = 1;\n    }\n\n    (*x)++;\n}"
        );
    }

    #[test]
    fn test_unit_render_and_lookup() {
        let mut unit = CUnit::new();
        unit.push(CItem::Directives(vec!["#include \"a.h\"".to_string()]));
        unit.push(CItem::Enum(CEnum {
            name: "Color".to_string(),
            members: vec!["RED".to_string(), "BLUE".to_string()],
        }));

        assert_eq!(
            unit.render(),
            "#include \"a.h\"\n\ntypedef enum {\n    RED,\n    BLUE,\n} Color;\n"
        );
        assert!(unit.enum_named("Color").is_some());
        assert!(unit.record("Color").is_none());
    }
}
