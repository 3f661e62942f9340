//! Naming rules shared by the registry and the emitters
//!
//! All derived C names (discriminators, container types, operation names)
//! come from here so the registry can detect clashes using exactly the
//! names the emitters will print.

/// Prefix of every discriminator entry
pub const DISCRIMINATOR_PREFIX: &str = "NODE_";

/// Upper-case the first character, leave the rest untouched (`typeNode` -> `TypeNode`)
pub fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Discriminator entry for a variant (`GetItem` -> `NODE_GETITEM`)
pub fn discriminator_name(variant: &str) -> String {
    format!("{}{}", DISCRIMINATOR_PREFIX, variant.to_ascii_uppercase())
}

/// Container type of a family (`expr` -> `ExprArray`)
pub fn container_type_name(group: &str) -> String {
    format!("{}Array", title_case(group))
}

/// Buffer member of a family container (`expr` -> `exprs`)
pub fn container_member_name(group: &str) -> String {
    format!("{}s", group)
}

/// True if `name` is a valid C identifier
pub fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
