//! Declaration arena
//!
//! Every declaration found in a snapshot is an [`Item`] stored in an
//! [`ItemArena`]. Items point at their owning scope through `outer`; the
//! arena never stores child lists, so the tree is walked upwards by id.

use std::ops::{Index, Range};

use crate::path::ItemPath;

/// Index of a source file within a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(pub u32);

impl FileId {
    /// Position in the snapshot's file list
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of an item within an [`ItemArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId(u32);

/// Declaration kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Function,
    Method,
    Struct,
    Enum,
    Union,
    Trait,
    TypeAlias,
    /// Go named type
    Type,
    Module,
    Const,
    Static,
    Var,
    Macro,
    /// Rust `impl` block, named after the implemented type
    Impl,
    Field,
    Variant,
}

impl ItemKind {
    /// Lowercase name used in messages
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            ItemKind::Function => "function",
            ItemKind::Method => "method",
            ItemKind::Struct => "struct",
            ItemKind::Enum => "enum",
            ItemKind::Union => "union",
            ItemKind::Trait => "trait",
            ItemKind::TypeAlias => "type alias",
            ItemKind::Type => "type",
            ItemKind::Module => "module",
            ItemKind::Const => "constant",
            ItemKind::Static => "static",
            ItemKind::Var => "variable",
            ItemKind::Macro => "macro",
            ItemKind::Impl => "impl block",
            ItemKind::Field => "field",
            ItemKind::Variant => "variant",
        }
    }

    /// Whether the kind names a type
    #[inline]
    #[must_use]
    pub fn is_type(self) -> bool {
        matches!(
            self,
            ItemKind::Struct
                | ItemKind::Enum
                | ItemKind::Union
                | ItemKind::Trait
                | ItemKind::TypeAlias
                | ItemKind::Type
        )
    }
}

/// A named declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub name: String,
    pub kind: ItemKind,
    pub file: FileId,
    /// Byte range removed when the declaration is deleted
    pub span: Range<usize>,
    /// Byte range of the declared name
    pub name_span: Range<usize>,
    /// Byte range of the initializer, for constants and variables
    pub value: Option<Range<usize>>,
    /// Receiver type name of a Go method
    pub receiver: Option<String>,
    /// Owning scope, `None` at file or package level
    pub outer: Option<ItemId>,
}

/// Arena of parent-linked declarations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemArena {
    items: Vec<Item>,
}

impl ItemArena {
    /// Create empty arena
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Add item, returning its id
    pub fn push(&mut self, item: Item) -> ItemId {
        let id = ItemId(u32::try_from(self.items.len()).unwrap_or(u32::MAX));
        self.items.push(item);
        id
    }

    /// Get item by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(id.0 as usize)
    }

    /// Get mutable item by id
    #[inline]
    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(id.0 as usize)
    }

    /// Re-parent an item
    pub fn set_outer(&mut self, id: ItemId, outer: Option<ItemId>) {
        if let Some(item) = self.items.get_mut(id.0 as usize) {
            item.outer = outer;
        }
    }

    /// Number of items
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over all items in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &Item)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| (ItemId(i as u32), item))
    }

    /// Top-level declaration enclosing `id`
    ///
    /// Walks `outer` references until an item without an owner is reached.
    #[must_use]
    pub fn top_item(&self, id: ItemId) -> ItemId {
        let mut current = id;
        while let Some(outer) = self.get(current).and_then(|item| item.outer) {
            current = outer;
        }
        current
    }

    /// Direct members of `id`
    pub fn children(&self, id: ItemId) -> impl Iterator<Item = ItemId> + '_ {
        self.iter()
            .filter(move |(_, item)| item.outer == Some(id))
            .map(|(child, _)| child)
    }

    /// Items declared at file or package level
    pub fn top_level(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.iter()
            .filter(|(_, item)| item.outer.is_none())
            .map(|(id, _)| id)
    }

    /// Full path of an item, from its top-level ancestor down
    #[must_use]
    pub fn path_of(&self, id: ItemId) -> ItemPath {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(item) = current.and_then(|c| self.get(c)) {
            names.push(item.name.clone());
            current = item.outer;
        }
        names.reverse();
        ItemPath::new(names)
    }

    /// All items named by `path`
    ///
    /// An `impl` block answers to the name of its type, so `Server.run`
    /// finds a method declared in any `impl Server` block.
    #[must_use]
    pub fn resolve(&self, path: &ItemPath) -> Vec<ItemId> {
        let mut segments = path.segments().iter();
        let Some(first) = segments.next() else {
            return Vec::new();
        };

        let mut matched: Vec<ItemId> = self
            .top_level()
            .filter(|&id| self[id].name == *first)
            .collect();

        for segment in segments {
            matched = self
                .iter()
                .filter(|(_, item)| {
                    item.name == *segment && item.outer.is_some_and(|o| matched.contains(&o))
                })
                .map(|(id, _)| id)
                .collect();
        }

        matched
    }
}

impl Index<ItemId> for ItemArena {
    type Output = Item;

    fn index(&self, id: ItemId) -> &Self::Output {
        &self.items[id.0 as usize]
    }
}
