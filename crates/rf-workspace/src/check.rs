//! Semantic checks run on every load
//!
//! Syntax errors come from the parser; this module adds the one
//! cross-declaration rule a refactoring can easily break: two declarations
//! with the same name in the same scope.

use std::path::Path;

use indexmap::IndexMap;
use rf_source::{Diagnostic, FileId, ItemArena, ItemId, ItemKind, Language, Location};

use crate::snapshot::SourceFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Scope<'a> {
    /// Rust file level
    File(FileId),
    /// Go package level (one directory)
    Package(&'a Path),
    /// Go methods whose receiver type is not declared in the package
    Receiver(&'a Path, &'a str),
    /// Members of a declaration
    Item(ItemId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Namespace {
    Type,
    Value,
    Macro,
}

/// One diagnostic per declaration that repeats an earlier name in its scope
pub(crate) fn duplicate_declarations(files: &[SourceFile], items: &ItemArena) -> Vec<Diagnostic> {
    let mut seen: IndexMap<(Scope<'_>, Namespace, &str), ItemId> = IndexMap::new();
    let mut out = Vec::new();

    for (id, item) in items.iter() {
        let Some(file) = files.get(item.file.index()) else {
            continue;
        };
        if item.name == "_" {
            continue;
        }
        if file.language == Language::Go && item.outer.is_none() && item.name == "init" {
            continue;
        }
        let Some(namespace) = namespace(file.language, item.kind) else {
            continue;
        };
        let dir = file.path.parent().unwrap_or(Path::new(""));
        let scope = match (item.outer, file.language, item.receiver.as_deref()) {
            (Some(outer), ..) => Scope::Item(outer),
            (None, Language::Go, Some(receiver)) => Scope::Receiver(dir, receiver),
            (None, Language::Go, None) => Scope::Package(dir),
            (None, Language::Rust, _) => Scope::File(item.file),
        };

        match seen.get(&(scope, namespace, item.name.as_str())) {
            Some(&previous) => {
                let prev = &items[previous];
                let prev_loc = files
                    .get(prev.file.index())
                    .map(|f| Location::from_offset(&f.path, &f.text, prev.name_span.start));
                let here = Location::from_offset(&file.path, &file.text, item.name_span.start);
                let message = match prev_loc {
                    Some(loc) => format!(
                        "{} {} redeclared (previous declaration at {loc})",
                        item.kind.describe(),
                        item.name
                    ),
                    None => format!("{} {} redeclared", item.kind.describe(), item.name),
                };
                out.push(Diagnostic::at(here, message));
            }
            None => {
                seen.insert((scope, namespace, item.name.as_str()), id);
            }
        }
    }

    out
}

fn namespace(language: Language, kind: ItemKind) -> Option<Namespace> {
    if kind == ItemKind::Impl {
        return None;
    }
    if language == Language::Go {
        return Some(Namespace::Value);
    }
    Some(match kind {
        ItemKind::Macro => Namespace::Macro,
        k if k.is_type() || k == ItemKind::Module => Namespace::Type,
        _ => Namespace::Value,
    })
}
