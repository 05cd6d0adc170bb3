//! Syntax-tree walkers
//!
//! Builds the [`ItemArena`] for one file, reports syntax errors, and finds
//! identifier occurrences for rename-style edits.

use std::ops::Range;
use std::path::Path;

use tree_sitter::Node;

use crate::diagnostic::{Diagnostic, Location};
use crate::item::{FileId, Item, ItemArena, ItemId, ItemKind};
use crate::language::Language;

/// A Go method whose receiver type still has to be linked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReceiver {
    pub method: ItemId,
    pub type_name: String,
}

/// Collect declarations of one parsed file into `arena`
///
/// Go methods are returned as [`PendingReceiver`]s because their receiver
/// type may live in another file of the same package.
pub fn collect_items(
    tree: &tree_sitter::Tree,
    source: &str,
    file: FileId,
    language: Language,
    arena: &mut ItemArena,
) -> Vec<PendingReceiver> {
    let mut collector = Collector {
        source,
        file,
        arena,
        pending: Vec::new(),
    };
    match language {
        Language::Rust => collector.rust_block(tree.root_node(), None),
        Language::Go => collector.go_file(tree.root_node()),
    }
    collector.pending
}

struct Collector<'a> {
    source: &'a str,
    file: FileId,
    arena: &'a mut ItemArena,
    pending: Vec<PendingReceiver>,
}

impl Collector<'_> {
    fn text(&self, node: Node<'_>) -> &str {
        node.utf8_text(self.source.as_bytes()).unwrap_or("")
    }

    fn push(
        &mut self,
        name_node: Node<'_>,
        kind: ItemKind,
        span: Range<usize>,
        outer: Option<ItemId>,
    ) -> ItemId {
        let name = self.text(name_node).to_string();
        self.arena.push(Item {
            name,
            kind,
            file: self.file,
            span,
            name_span: name_node.byte_range(),
            value: None,
            receiver: None,
            outer,
        })
    }

    fn rust_block(&mut self, block: Node<'_>, outer: Option<ItemId>) {
        let in_impl_or_trait = outer
            .and_then(|o| self.arena.get(o))
            .is_some_and(|o| matches!(o.kind, ItemKind::Impl | ItemKind::Trait));

        for node in named_children(block) {
            let span = removable_span(node);
            let kind = match node.kind() {
                "function_item" | "function_signature_item" if in_impl_or_trait => ItemKind::Method,
                "function_item" | "function_signature_item" => ItemKind::Function,
                "struct_item" => ItemKind::Struct,
                "enum_item" => ItemKind::Enum,
                "union_item" => ItemKind::Union,
                "trait_item" => ItemKind::Trait,
                "type_item" => ItemKind::TypeAlias,
                "mod_item" => ItemKind::Module,
                "const_item" => ItemKind::Const,
                "static_item" => ItemKind::Static,
                "macro_definition" => ItemKind::Macro,
                "impl_item" => {
                    if let Some(type_node) = node.child_by_field_name("type").map(impl_type_name) {
                        let id = self.push(type_node, ItemKind::Impl, span, outer);
                        if let Some(body) = node.child_by_field_name("body") {
                            self.rust_block(body, Some(id));
                        }
                    }
                    continue;
                }
                _ => continue,
            };

            let Some(name) = node.child_by_field_name("name") else {
                continue;
            };
            let id = self.push(name, kind, span, outer);

            match kind {
                ItemKind::Const | ItemKind::Static => {
                    let value = node.child_by_field_name("value").map(|v| v.byte_range());
                    if let Some(item) = self.arena_item_mut(id) {
                        item.value = value;
                    }
                }
                ItemKind::Struct | ItemKind::Union => {
                    if let Some(body) = node.child_by_field_name("body") {
                        self.rust_members(body, "field_declaration", ItemKind::Field, id);
                    }
                }
                ItemKind::Enum => {
                    if let Some(body) = node.child_by_field_name("body") {
                        self.rust_members(body, "enum_variant", ItemKind::Variant, id);
                    }
                }
                ItemKind::Trait | ItemKind::Module => {
                    if let Some(body) = node.child_by_field_name("body") {
                        self.rust_block(body, Some(id));
                    }
                }
                _ => {}
            }
        }
    }

    fn rust_members(&mut self, body: Node<'_>, member_kind: &str, kind: ItemKind, outer: ItemId) {
        for member in named_children(body) {
            if member.kind() != member_kind {
                continue;
            }
            if let Some(name) = member.child_by_field_name("name") {
                self.push(name, kind, removable_span(member), Some(outer));
            }
        }
    }

    fn go_file(&mut self, root: Node<'_>) {
        for node in named_children(root) {
            match node.kind() {
                "function_declaration" => {
                    if let Some(name) = node.child_by_field_name("name") {
                        self.push(name, ItemKind::Function, removable_span(node), None);
                    }
                }
                "method_declaration" => {
                    let Some(name) = node.child_by_field_name("name") else {
                        continue;
                    };
                    let id = self.push(name, ItemKind::Method, removable_span(node), None);
                    let receiver = node
                        .child_by_field_name("receiver")
                        .and_then(|r| go_receiver_type(r))
                        .map(|t| self.text(t).to_string());
                    if let Some(type_name) = receiver {
                        if let Some(item) = self.arena_item_mut(id) {
                            item.receiver = Some(type_name.clone());
                        }
                        self.pending.push(PendingReceiver {
                            method: id,
                            type_name,
                        });
                    }
                }
                "type_declaration" => self.go_specs(node, &["type_spec", "type_alias"], ItemKind::Type),
                "const_declaration" => self.go_specs(node, &["const_spec"], ItemKind::Const),
                "var_declaration" => self.go_specs(node, &["var_spec"], ItemKind::Var),
                _ => {}
            }
        }
    }

    fn go_specs(&mut self, decl: Node<'_>, spec_kinds: &[&str], kind: ItemKind) {
        let specs: Vec<Node<'_>> = named_children(decl)
            .into_iter()
            .flat_map(|child| {
                if child.kind().ends_with("_list") {
                    named_children(child)
                } else {
                    vec![child]
                }
            })
            .filter(|child| spec_kinds.contains(&child.kind()))
            .collect();
        let lone_spec = specs.len() == 1;

        for spec in specs {
            let mut cursor = spec.walk();
            let names: Vec<Node<'_>> = spec.children_by_field_name("name", &mut cursor).collect();
            let lone_name = names.len() == 1;
            let span = if lone_spec && lone_name {
                removable_span(decl)
            } else {
                removable_span(spec)
            };

            for name in names {
                let id = self.push(name, kind, span.clone(), None);
                if lone_name {
                    let value = spec.child_by_field_name("value").map(|v| v.byte_range());
                    if let Some(item) = self.arena_item_mut(id) {
                        item.value = value;
                    }
                }
                if kind == ItemKind::Type {
                    if let Some(ty) = spec.child_by_field_name("type") {
                        self.go_fields(ty, id);
                    }
                }
            }
        }
    }

    fn go_fields(&mut self, ty: Node<'_>, outer: ItemId) {
        if ty.kind() != "struct_type" {
            return;
        }
        let Some(list) = named_children(ty)
            .into_iter()
            .find(|c| c.kind() == "field_declaration_list")
        else {
            return;
        };
        for field in named_children(list) {
            if field.kind() != "field_declaration" {
                continue;
            }
            let mut cursor = field.walk();
            let names: Vec<Node<'_>> = field.children_by_field_name("name", &mut cursor).collect();
            for name in names {
                self.push(name, ItemKind::Field, removable_span(field), Some(outer));
            }
        }
    }

    fn arena_item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.arena.get_mut(id)
    }
}

fn impl_type_name(node: Node<'_>) -> Node<'_> {
    match node.kind() {
        "generic_type" => node.child_by_field_name("type").unwrap_or(node),
        "scoped_type_identifier" => node.child_by_field_name("name").unwrap_or(node),
        _ => node,
    }
}

fn go_receiver_type(receiver: Node<'_>) -> Option<Node<'_>> {
    let param = named_children(receiver)
        .into_iter()
        .find(|c| c.kind() == "parameter_declaration")?;
    let mut ty = param.child_by_field_name("type")?;
    loop {
        ty = match ty.kind() {
            "pointer_type" => ty.named_child(0)?,
            "generic_type" => ty.child_by_field_name("type")?,
            "type_identifier" => return Some(ty),
            _ => return None,
        };
    }
}

/// Node range extended over leading attributes and doc comments and a trailing comma
fn removable_span(node: Node<'_>) -> Range<usize> {
    let mut start = node.start_byte();
    let mut start_row = node.start_position().row;
    let mut prev = node.prev_sibling();
    while let Some(p) = prev {
        if matches!(p.kind(), "attribute_item" | "line_comment" | "block_comment" | "comment")
            && is_adjacent(p, start_row)
        {
            start = p.start_byte();
            start_row = p.start_position().row;
            prev = p.prev_sibling();
        } else {
            break;
        }
    }

    let mut end = node.end_byte();
    if let Some(next) = node.next_sibling() {
        if next.kind() == "," {
            end = next.end_byte();
        }
    }
    start..end
}

/// `prev` ends on the line directly above `row`, or on `row` itself
fn is_adjacent(prev: Node<'_>, row: usize) -> bool {
    let prev_row = prev.end_position().row;
    row <= prev_row + 1 && prev_row <= row
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut out = Vec::with_capacity(node.named_child_count());
    for i in 0..node.named_child_count() {
        if let Some(child) = node.named_child(i) {
            out.push(child);
        }
    }
    out
}

/// One diagnostic per top-most ERROR node and per MISSING node
#[must_use]
pub fn syntax_diagnostics(tree: &tree_sitter::Tree, source: &str, path: &Path) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    walk_errors(tree.root_node(), source, path, &mut out);
    out
}

fn walk_errors(node: Node<'_>, source: &str, path: &Path, out: &mut Vec<Diagnostic>) {
    if node.is_error() {
        let text = node.utf8_text(source.as_bytes()).unwrap_or("");
        let snippet: String = text.lines().next().unwrap_or("").chars().take(24).collect();
        out.push(Diagnostic::at(
            Location::from_offset(path, source, node.start_byte()),
            format!("syntax error: unexpected {snippet:?}"),
        ));
        return;
    }
    if node.is_missing() {
        out.push(Diagnostic::at(
            Location::from_offset(path, source, node.start_byte()),
            format!("syntax error: missing {}", node.kind()),
        ));
        return;
    }
    if !node.has_error() {
        return;
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            walk_errors(child, source, path, out);
        }
    }
}

/// Rows covered by string literals that span more than one line
///
/// Each range starts at the literal's opening row and ends after its
/// closing row. Whitespace on these rows belongs to the literal.
#[must_use]
pub fn literal_rows(tree: &tree_sitter::Tree, language: Language) -> Vec<Range<usize>> {
    let mut out = Vec::new();
    walk_literals(tree.root_node(), language, &mut out);
    out
}

fn walk_literals(node: Node<'_>, language: Language, out: &mut Vec<Range<usize>>) {
    if language.literal_kinds().contains(&node.kind()) {
        let (first, last) = (node.start_position().row, node.end_position().row);
        if first < last {
            out.push(first..last + 1);
        }
        return;
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            walk_literals(child, language, out);
        }
    }
}

/// How an identifier occurrence is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Occurrence {
    /// A bare name: `Foo`, `foo()`
    Plain,
    /// A member access: `x.foo`, `x.foo()`
    Member,
    /// A path-qualified name: `Foo::bar`, `crate::Foo`, `pkg.Foo`
    Qualified(String),
}

/// An identifier occurrence in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub range: Range<usize>,
    pub occurrence: Occurrence,
}

/// Every identifier spelled `name` in the tree
#[must_use]
pub fn references(
    tree: &tree_sitter::Tree,
    source: &str,
    language: Language,
    name: &str,
) -> Vec<Reference> {
    let mut out = Vec::new();
    walk_references(tree.root_node(), source, language, name, &mut out);
    out
}

fn walk_references(
    node: Node<'_>,
    source: &str,
    language: Language,
    name: &str,
    out: &mut Vec<Reference>,
) {
    if language.identifier_kinds().contains(&node.kind())
        && node.utf8_text(source.as_bytes()).is_ok_and(|t| t == name)
    {
        out.push(Reference {
            range: node.byte_range(),
            occurrence: classify(node, source),
        });
        return;
    }
    for i in 0..node.child_count() {
        if let Some(child) = node.child(i) {
            walk_references(child, source, language, name, out);
        }
    }
}

fn classify(node: Node<'_>, source: &str) -> Occurrence {
    let Some(parent) = node.parent() else {
        return Occurrence::Plain;
    };
    let is_name_of_parent = parent
        .child_by_field_name("name")
        .is_some_and(|n| n.id() == node.id());
    let qualifier = |field: &str| {
        parent
            .child_by_field_name(field)
            .and_then(|q| q.utf8_text(source.as_bytes()).ok())
            .map(str::to_string)
    };

    match parent.kind() {
        "scoped_identifier" | "scoped_type_identifier" if is_name_of_parent => {
            qualifier("path").map_or(Occurrence::Plain, Occurrence::Qualified)
        }
        "qualified_type" if is_name_of_parent => {
            qualifier("package").map_or(Occurrence::Plain, Occurrence::Qualified)
        }
        _ if node.kind() == "field_identifier" => Occurrence::Member,
        _ => Occurrence::Plain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(language: Language, source: &str) -> (ItemArena, Vec<PendingReceiver>) {
        let tree = language.parse(source).unwrap();
        let mut arena = ItemArena::new();
        let pending = collect_items(&tree, source, FileId(0), language, &mut arena);
        (arena, pending)
    }

    fn paths(arena: &ItemArena) -> Vec<String> {
        arena.iter().map(|(id, _)| arena.path_of(id).to_string()).collect()
    }

    #[test]
    fn rust_items_and_members() {
        let source = "\
/// A server.
#[derive(Debug)]
struct Server {
    addr: String,
}

impl Server {
    fn run(&self) {}
}

mod util {
    pub fn helper() {}
}

const LIMIT: usize = 4 * 1024;
";
        let (arena, pending) = collect(Language::Rust, source);
        assert!(pending.is_empty());
        assert_eq!(
            paths(&arena),
            vec![
                "Server",
                "Server.addr",
                "Server",
                "Server.run",
                "util",
                "util.helper",
                "LIMIT"
            ]
        );

        let (server, item) = arena.iter().next().unwrap();
        assert_eq!(item.kind, ItemKind::Struct);
        assert!(source[item.span.clone()].starts_with("/// A server."));
        assert_eq!(arena.top_item(server), server);

        let limit = arena.resolve(&"LIMIT".parse().unwrap())[0];
        let value = arena[limit].value.clone().unwrap();
        assert_eq!(&source[value], "4 * 1024");
    }

    #[test]
    fn rust_method_kind_inside_impl() {
        let (arena, _) = collect(Language::Rust, "impl A { fn f() {} }\nfn g() {}\n");
        let f = arena.resolve(&"A.f".parse().unwrap())[0];
        let g = arena.resolve(&"g".parse().unwrap())[0];
        assert_eq!(arena[f].kind, ItemKind::Method);
        assert_eq!(arena[g].kind, ItemKind::Function);
    }

    #[test]
    fn go_items_and_receivers() {
        let source = "\
package main

type Server struct {
\tAddr string
}

func (s *Server) Run() {}

const (
\tA = 1
\tB = 2
)

var Debug = false

func main() {}
";
        let (arena, pending) = collect(Language::Go, source);
        assert_eq!(
            paths(&arena),
            vec!["Server", "Server.Addr", "Run", "A", "B", "Debug", "main"]
        );
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].type_name, "Server");

        let a = arena.resolve(&"A".parse().unwrap())[0];
        assert_eq!(&source[arena[a].span.clone()], "A = 1");

        let debug = arena.resolve(&"Debug".parse().unwrap())[0];
        assert_eq!(&source[arena[debug].span.clone()], "var Debug = false");
        assert_eq!(&source[arena[debug].value.clone().unwrap()], "false");
    }

    #[test]
    fn syntax_errors_are_located() {
        let source = "fn ok() {}\nfn broken( {\n";
        let tree = Language::Rust.parse(source).unwrap();
        let diags = syntax_diagnostics(&tree, source, Path::new("lib.rs"));
        assert!(!diags.is_empty());
        assert!(diags[0].message.starts_with("syntax error"));

        let tree = Language::Rust.parse("fn ok() {}\n").unwrap();
        assert!(syntax_diagnostics(&tree, "fn ok() {}\n", Path::new("lib.rs")).is_empty());
    }

    #[test]
    fn multi_line_literals_are_found() {
        let source = "const A: &str = \"one\";\nconst B: &str = \"two   \n\n  three\";\nconst C: &str = r#\"\nx\n\"#;\n";
        let tree = Language::Rust.parse(source).unwrap();
        assert_eq!(literal_rows(&tree, Language::Rust), vec![1..4, 4..7]);

        let source = "package p\n\nvar s = `a\n\n b`\nvar t = \"c\"\n";
        let tree = Language::Go.parse(source).unwrap();
        assert_eq!(literal_rows(&tree, Language::Go), vec![2..5]);
    }

    #[test]
    fn references_classify_occurrences() {
        let source = "struct Foo;\nimpl Foo { fn new() -> Foo { Foo } }\nfn f(x: Foo) { Foo::new(); x.Foo; }\n";
        let tree = Language::Rust.parse(source).unwrap();
        let refs = references(&tree, source, Language::Rust, "Foo");
        assert!(refs.iter().all(|r| &source[r.range.clone()] == "Foo"));
        assert!(refs.iter().any(|r| r.occurrence == Occurrence::Member));
        assert!(refs.iter().filter(|r| r.occurrence == Occurrence::Plain).count() >= 5);

        let refs = references(&tree, source, Language::Rust, "new");
        assert!(refs
            .iter()
            .any(|r| r.occurrence == Occurrence::Qualified("Foo".to_string())));
    }
}
