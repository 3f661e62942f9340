//! Handle-indexed node storage
//!
//! Nodes of any variant live in one [`NodeArena`] and are addressed by
//! [`NodeId`] handles. The arena shapes each node from the registry (base
//! extras first, then the variant's own fields), enforces exclusive
//! ownership of child nodes, keeps the collector's bookkeeping (mark bits
//! and the set of live allocations) and tears owned subtrees down.

use crate::array::NodeArray;
use astgen_common::GenError;
use astgen_schema::{Family, Field, Ownership, Registry, Variant};
use log::{debug, trace};

/// Handle of a node; stale once the node is freed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Slot index inside the arena
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// The shared header of every node, reachable from any handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeHeader {
    /// Ordinal of the variant's discriminator
    pub kind: usize,
    /// Originating source line
    pub line: u32,
}

/// Storage for one field, shaped by the field's ownership kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSlot {
    Value(Option<String>),
    Child(Option<NodeId>),
    Children(NodeArray<NodeId>),
}

impl FieldSlot {
    fn for_field(field: &Field) -> Self {
        match field.ownership() {
            Ownership::Value => FieldSlot::Value(None),
            Ownership::OwnedChild => FieldSlot::Child(None),
            Ownership::OwnedSequence => FieldSlot::Children(NodeArray::new()),
        }
    }
}

#[derive(Debug, Clone)]
struct NodeData {
    header: NodeHeader,
    slots: Vec<FieldSlot>,
}

#[derive(Debug, Clone)]
struct Entry {
    generation: u32,
    marked: bool,
    owner: Option<NodeId>,
    node: Option<NodeData>,
}

pub struct NodeArena<'r> {
    registry: &'r Registry,
    entries: Vec<Entry>,
    free_list: Vec<u32>,
    live: usize,
}

impl<'r> NodeArena<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            entries: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }

    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Allocate a node of `variant` with every field empty
    pub fn alloc(&mut self, variant: &str, line: u32) -> Result<NodeId, GenError> {
        let registry = self.registry;
        let unknown = || GenError::UnknownVariant {
            name: variant.to_string(),
        };
        let (family, record) = registry.variant(variant).ok_or_else(unknown)?;
        let kind = registry.discriminator_of(variant).ok_or_else(unknown)?;

        let slots = family
            .base
            .extra_fields()
            .iter()
            .chain(record.fields.iter())
            .map(FieldSlot::for_field)
            .collect();
        let node = NodeData {
            header: NodeHeader { kind, line },
            slots,
        };

        let id = match self.free_list.pop() {
            Some(index) => {
                let entry = &mut self.entries[index as usize];
                entry.node = Some(node);
                entry.marked = false;
                entry.owner = None;
                NodeId {
                    index,
                    generation: entry.generation,
                }
            }
            None => {
                let index = self.entries.len() as u32;
                self.entries.push(Entry {
                    generation: 0,
                    marked: false,
                    owner: None,
                    node: Some(node),
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        };

        self.live += 1;
        trace!("alloc {} #{} (line {})", variant, id.index, line);
        Ok(id)
    }

    /// True if `id` refers to a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.entry(id).is_ok()
    }

    /// Upcast: the header shared by every variant
    pub fn header(&self, id: NodeId) -> Result<&NodeHeader, GenError> {
        Ok(&self.data(id)?.header)
    }

    pub fn variant_name(&self, id: NodeId) -> Result<&'r str, GenError> {
        let kind = self.header(id)?.kind;
        Ok(&self.shape(kind)?.1.name)
    }

    /// Emitted discriminator of the node, e.g. `NODE_BINARY`
    pub fn discriminator(&self, id: NodeId) -> Result<&'r str, GenError> {
        let kind = self.header(id)?.kind;
        let registry = self.registry;
        registry
            .discriminators()
            .get(kind)
            .map(|d| d.name.as_str())
            .ok_or(GenError::StaleNode { index: id.index })
    }

    pub fn family(&self, id: NodeId) -> Result<&'r Family, GenError> {
        let kind = self.header(id)?.kind;
        Ok(self.shape(kind)?.0)
    }

    /// Parent that owns `id`, if any
    pub fn owner(&self, id: NodeId) -> Result<Option<NodeId>, GenError> {
        Ok(self.entry(id)?.owner)
    }

    /// Store a value field, returning the previous value
    pub fn set_value(
        &mut self,
        id: NodeId,
        field: &str,
        value: impl Into<String>,
    ) -> Result<Option<String>, GenError> {
        let (index, def, variant) = self.locate(id, field)?;
        match &mut self.data_mut(id)?.slots[index] {
            FieldSlot::Value(slot) => Ok(slot.replace(value.into())),
            _ => Err(mismatch(variant, def, Ownership::Value)),
        }
    }

    pub fn value(&self, id: NodeId, field: &str) -> Result<Option<&str>, GenError> {
        let (index, def, variant) = self.locate(id, field)?;
        match &self.data(id)?.slots[index] {
            FieldSlot::Value(slot) => Ok(slot.as_deref()),
            _ => Err(mismatch(variant, def, Ownership::Value)),
        }
    }

    /// Attach `child` as the owned child in `field`.
    ///
    /// The previously attached child, if any, is detached and returned; it
    /// becomes an unowned root again.
    pub fn set_child(
        &mut self,
        id: NodeId,
        field: &str,
        child: NodeId,
    ) -> Result<Option<NodeId>, GenError> {
        let (index, def, variant) = self.locate(id, field)?;
        if def.ownership() != Ownership::OwnedChild {
            return Err(mismatch(variant, def, Ownership::OwnedChild));
        }
        self.check_attachable(id, child)?;
        self.check_family(variant, def, child)?;

        let previous = match &mut self.data_mut(id)?.slots[index] {
            FieldSlot::Child(slot) => slot.replace(child),
            _ => return Err(mismatch(variant, def, Ownership::OwnedChild)),
        };
        self.set_owner(child, Some(id));
        if let Some(previous) = previous {
            self.set_owner(previous, None);
        }
        Ok(previous)
    }

    pub fn child(&self, id: NodeId, field: &str) -> Result<Option<NodeId>, GenError> {
        let (index, def, variant) = self.locate(id, field)?;
        match &self.data(id)?.slots[index] {
            FieldSlot::Child(slot) => Ok(*slot),
            _ => Err(mismatch(variant, def, Ownership::OwnedChild)),
        }
    }

    /// Append `child` to the owned sequence in `field`
    pub fn push_child(&mut self, id: NodeId, field: &str, child: NodeId) -> Result<(), GenError> {
        let (index, def, variant) = self.locate(id, field)?;
        if def.ownership() != Ownership::OwnedSequence {
            return Err(mismatch(variant, def, Ownership::OwnedSequence));
        }
        self.check_attachable(id, child)?;
        self.check_family(variant, def, child)?;

        match &mut self.data_mut(id)?.slots[index] {
            FieldSlot::Children(array) => array.write(child),
            _ => return Err(mismatch(variant, def, Ownership::OwnedSequence)),
        }
        self.set_owner(child, Some(id));
        Ok(())
    }

    pub fn children(&self, id: NodeId, field: &str) -> Result<&NodeArray<NodeId>, GenError> {
        let (index, def, variant) = self.locate(id, field)?;
        match &self.data(id)?.slots[index] {
            FieldSlot::Children(array) => Ok(array),
            _ => Err(mismatch(variant, def, Ownership::OwnedSequence)),
        }
    }

    /// Set the collector's mark bit, returning the previous value
    pub fn mark(&mut self, id: NodeId) -> Result<bool, GenError> {
        let entry = self.entry_mut(id)?;
        Ok(std::mem::replace(&mut entry.marked, true))
    }

    pub fn is_marked(&self, id: NodeId) -> Result<bool, GenError> {
        Ok(self.entry(id)?.marked)
    }

    pub fn clear_marks(&mut self) {
        for entry in &mut self.entries {
            entry.marked = false;
        }
    }

    /// Every live allocation, in slot order
    pub fn live(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.node.is_some())
            .map(|(index, entry)| NodeId {
                index: index as u32,
                generation: entry.generation,
            })
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Free `root` and everything it transitively owns.
    ///
    /// An owned root is detached from its parent first. Returns the number
    /// of nodes freed.
    pub fn free_tree(&mut self, root: NodeId) -> Result<usize, GenError> {
        if let Some(parent) = self.entry(root)?.owner {
            self.detach(parent, root);
        }

        let mut stack = vec![root];
        let mut freed = 0;
        while let Some(id) = stack.pop() {
            let Some(entry) = self
                .entries
                .get_mut(id.index as usize)
                .filter(|e| e.generation == id.generation)
            else {
                continue;
            };
            let Some(mut node) = entry.node.take() else {
                continue;
            };
            entry.generation = entry.generation.wrapping_add(1);
            entry.marked = false;
            entry.owner = None;
            self.free_list.push(id.index);
            self.live -= 1;
            freed += 1;

            for slot in &mut node.slots {
                match slot {
                    FieldSlot::Child(Some(child)) => stack.push(*child),
                    FieldSlot::Children(array) => stack.extend(array.take()),
                    _ => {}
                }
            }
        }

        debug!("Freed {} node(s) rooted at #{}", freed, root.index);
        Ok(freed)
    }

    fn entry(&self, id: NodeId) -> Result<&Entry, GenError> {
        match self.entries.get(id.index as usize) {
            Some(entry) if entry.generation == id.generation && entry.node.is_some() => Ok(entry),
            _ => Err(GenError::StaleNode { index: id.index }),
        }
    }

    fn entry_mut(&mut self, id: NodeId) -> Result<&mut Entry, GenError> {
        match self.entries.get_mut(id.index as usize) {
            Some(entry) if entry.generation == id.generation && entry.node.is_some() => Ok(entry),
            _ => Err(GenError::StaleNode { index: id.index }),
        }
    }

    fn data(&self, id: NodeId) -> Result<&NodeData, GenError> {
        self.entry(id)?
            .node
            .as_ref()
            .ok_or(GenError::StaleNode { index: id.index })
    }

    fn data_mut(&mut self, id: NodeId) -> Result<&mut NodeData, GenError> {
        self.entry_mut(id)?
            .node
            .as_mut()
            .ok_or(GenError::StaleNode { index: id.index })
    }

    fn shape(&self, kind: usize) -> Result<(&'r Family, &'r Variant), GenError> {
        let registry = self.registry;
        let name = registry
            .discriminators()
            .get(kind)
            .map(|d| d.variant.as_str())
            .unwrap_or_default();
        registry.variant(name).ok_or_else(|| GenError::UnknownVariant {
            name: name.to_string(),
        })
    }

    /// Slot index and definition of `field`; the variant's own fields shadow base extras
    fn locate(&self, id: NodeId, field: &str) -> Result<(usize, &'r Field, &'r str), GenError> {
        let kind = self.header(id)?.kind;
        let (family, variant) = self.shape(kind)?;
        let extras = family.base.extra_fields();

        let found = variant
            .fields
            .iter()
            .position(|f| f.name == field)
            .map(|pos| (extras.len() + pos, &variant.fields[pos]))
            .or_else(|| {
                extras
                    .iter()
                    .position(|f| f.name == field)
                    .map(|pos| (pos, &extras[pos]))
            });

        match found {
            Some((index, def)) => Ok((index, def, variant.name.as_str())),
            None => Err(GenError::UnknownField {
                variant: variant.name.clone(),
                field: field.to_string(),
            }),
        }
    }

    fn check_attachable(&self, parent: NodeId, child: NodeId) -> Result<(), GenError> {
        if self.entry(child)?.owner.is_some() {
            return Err(GenError::AlreadyOwned { index: child.index });
        }

        // Walk up from the parent; meeting the child means a cycle
        let mut current = Some(parent);
        while let Some(node) = current {
            if node == child {
                return Err(GenError::OwnershipCycle { index: child.index });
            }
            current = self.entry(node)?.owner;
        }
        Ok(())
    }

    /// The child must be of the type the field declares: a family base
    /// (`Expr*`), a container of a family (`ExprArray`) or one variant
    /// (`struct Variable*`). Types outside the registry accept anything.
    fn check_family(&self, variant: &str, def: &Field, child: NodeId) -> Result<(), GenError> {
        let registry = self.registry;
        let expected = def.ty.type_name();
        let actual = self.variant_name(child)?;

        let accepted = if let Some(family) = registry
            .family_by_base(expected)
            .or_else(|| registry.family_by_container(expected))
        {
            self.family(child)?.group == family.group
        } else if registry.variant(expected).is_some() {
            actual == expected
        } else {
            true
        };

        if accepted {
            Ok(())
        } else {
            Err(GenError::FamilyMismatch {
                variant: variant.to_string(),
                field: def.name.clone(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            })
        }
    }

    fn set_owner(&mut self, id: NodeId, owner: Option<NodeId>) {
        if let Ok(entry) = self.entry_mut(id) {
            entry.owner = owner;
        }
    }

    fn detach(&mut self, parent: NodeId, child: NodeId) {
        let Ok(node) = self.data_mut(parent) else {
            return;
        };
        for slot in &mut node.slots {
            match slot {
                FieldSlot::Child(current) if *current == Some(child) => *current = None,
                FieldSlot::Children(array) if array.iter().any(|c| *c == child) => {
                    for kept in array.take().into_iter().filter(|c| *c != child) {
                        array.write(kept);
                    }
                }
                _ => {}
            }
        }
        self.set_owner(child, None);
    }
}

fn mismatch(variant: &str, def: &Field, expected: Ownership) -> GenError {
    GenError::OwnershipMismatch {
        variant: variant.to_string(),
        field: def.name.clone(),
        expected: expected.to_string(),
        actual: def.ownership().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use astgen_schema::registry_from_tables;

    fn registry() -> Registry {
        registry_from_tables(&[
            (
                "expr",
                &[
                    "Expr    : Node self, TypeNode *type",
                    "Literal : Value value",
                    "Binary  : Expr *left, Token operator, Expr* right",
                ] as &[&str],
            ),
            (
                "stmt",
                &["Stmt : Node self", "Block : StmtArray statements", "Pass : "] as &[&str],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_alloc_and_header() {
        let registry = registry();
        let mut arena = NodeArena::new(&registry);
        let id = arena.alloc("Binary", 7).unwrap();

        assert_eq!(arena.header(id).unwrap(), &NodeHeader { kind: 1, line: 7 });
        assert_eq!(arena.variant_name(id).unwrap(), "Binary");
        assert_eq!(arena.discriminator(id).unwrap(), "NODE_BINARY");
        assert_eq!(arena.family(id).unwrap().group, "expr");
        assert_eq!(arena.len(), 1);

        assert!(matches!(
            arena.alloc("Missing", 1),
            Err(GenError::UnknownVariant { .. })
        ));
    }

    #[test]
    fn test_base_extra_fields_are_addressable() {
        let registry = registry();
        let mut arena = NodeArena::new(&registry);
        let literal = arena.alloc("Literal", 1).unwrap();

        // `type` comes from the Expr base, `value` from the variant
        assert_eq!(arena.child(literal, "type").unwrap(), None);
        arena.set_value(literal, "value", "42").unwrap();
        assert_eq!(arena.value(literal, "value").unwrap(), Some("42"));
    }

    #[test]
    fn test_field_errors() {
        let registry = registry();
        let mut arena = NodeArena::new(&registry);
        let binary = arena.alloc("Binary", 1).unwrap();
        let literal = arena.alloc("Literal", 1).unwrap();

        assert!(matches!(
            arena.set_value(binary, "left", "x"),
            Err(GenError::OwnershipMismatch { .. })
        ));
        assert!(matches!(
            arena.set_child(binary, "operator", literal),
            Err(GenError::OwnershipMismatch { .. })
        ));
        assert!(matches!(
            arena.child(binary, "nope"),
            Err(GenError::UnknownField { .. })
        ));
    }

    #[test]
    fn test_exclusive_ownership() {
        let registry = registry();
        let mut arena = NodeArena::new(&registry);
        let outer = arena.alloc("Binary", 1).unwrap();
        let inner = arena.alloc("Binary", 1).unwrap();
        let leaf = arena.alloc("Literal", 1).unwrap();

        arena.set_child(outer, "left", inner).unwrap();
        arena.set_child(inner, "left", leaf).unwrap();
        assert_eq!(arena.owner(leaf).unwrap(), Some(inner));

        assert_eq!(
            arena.set_child(outer, "right", leaf),
            Err(GenError::AlreadyOwned { index: leaf.index() })
        );
        assert_eq!(
            arena.set_child(inner, "right", outer),
            Err(GenError::OwnershipCycle { index: outer.index() })
        );
        assert_eq!(
            arena.set_child(outer, "right", outer),
            Err(GenError::OwnershipCycle { index: outer.index() })
        );
    }

    #[test]
    fn test_children_must_match_the_declared_family() {
        let registry = registry();
        let mut arena = NodeArena::new(&registry);
        let binary = arena.alloc("Binary", 1).unwrap();
        let block = arena.alloc("Block", 1).unwrap();
        let pass = arena.alloc("Pass", 1).unwrap();

        assert_eq!(
            arena.set_child(binary, "left", pass),
            Err(GenError::FamilyMismatch {
                variant: "Binary".to_string(),
                field: "left".to_string(),
                expected: "Expr".to_string(),
                actual: "Pass".to_string(),
            })
        );
        assert!(matches!(
            arena.push_child(block, "statements", binary),
            Err(GenError::FamilyMismatch { .. })
        ));

        // A rejected child stays unowned and can be attached elsewhere
        assert_eq!(arena.owner(pass).unwrap(), None);
        arena.push_child(block, "statements", pass).unwrap();
    }

    #[test]
    fn test_replacing_a_child_releases_it() {
        let registry = registry();
        let mut arena = NodeArena::new(&registry);
        let binary = arena.alloc("Binary", 1).unwrap();
        let first = arena.alloc("Literal", 1).unwrap();
        let second = arena.alloc("Literal", 2).unwrap();

        assert_eq!(arena.set_child(binary, "left", first).unwrap(), None);
        assert_eq!(arena.set_child(binary, "left", second).unwrap(), Some(first));
        assert_eq!(arena.owner(first).unwrap(), None);
        assert_eq!(arena.owner(second).unwrap(), Some(binary));
    }

    #[test]
    fn test_marks_and_live_enumeration() {
        let registry = registry();
        let mut arena = NodeArena::new(&registry);
        let a = arena.alloc("Pass", 1).unwrap();
        let b = arena.alloc("Pass", 2).unwrap();

        assert!(!arena.mark(a).unwrap());
        assert!(arena.mark(a).unwrap());
        assert!(arena.is_marked(a).unwrap());
        assert!(!arena.is_marked(b).unwrap());

        arena.clear_marks();
        assert!(!arena.is_marked(a).unwrap());
        assert_eq!(arena.live().collect::<Vec<_>>(), vec![a, b]);
    }

    #[test]
    fn test_freed_slots_are_reused_with_new_generation() {
        let registry = registry();
        let mut arena = NodeArena::new(&registry);
        let old = arena.alloc("Pass", 1).unwrap();
        assert_eq!(arena.free_tree(old).unwrap(), 1);

        let new = arena.alloc("Pass", 2).unwrap();
        assert_eq!(new.index(), old.index());
        assert_ne!(new, old);
        assert!(!arena.contains(old));
        assert_eq!(arena.header(old), Err(GenError::StaleNode { index: old.index() }));
        assert_eq!(arena.header(new).unwrap().line, 2);
    }
}
