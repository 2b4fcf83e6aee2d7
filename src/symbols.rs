//! Symbol table over a declaration snapshot.
//!
//! Pieces live in an arena in discovery order (file order, then source order,
//! depth first). Logical types are indexed by qualified name plus generic
//! arity, so every partial piece of a type lands on one symbol.
use indexmap::IndexMap;

use crate::model::{Compilation, DeclKind, TypeDecl, has_modifier};

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(usize);

#[derive(Debug, Clone, Copy)]
pub struct Piece<'a> {
    pub decl: &'a TypeDecl,
    pub path: &'a str,
    pub symbol: SymbolId,
}

#[derive(Debug, Clone)]
pub struct TypeSymbol {
    pub name: String,
    pub namespace: Option<String>,
    pub arity: usize,
    pub containing: Option<SymbolId>,
    pub pieces: Vec<PieceId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accessibility {
    Public,
    Internal,
    Protected,
    ProtectedInternal,
    PrivateProtected,
    Private,
}

/// Enclosing types from outermost to the candidate itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyChain {
    links: Vec<SymbolId>,
}

pub struct SymbolTable<'a> {
    pieces: Vec<Piece<'a>>,
    symbols: IndexMap<String, TypeSymbol>,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl<'a> SymbolTable<'a> {
    pub fn build(compilation: &'a Compilation) -> Self {
        let mut table = Self { pieces: Vec::new(), symbols: IndexMap::new() };
        for file in &compilation.files {
            for decl in &file.types {
                table.insert(decl, &file.path, None);
            }
        }
        table
    }

    fn insert(&mut self, decl: &'a TypeDecl, path: &'a str, containing: Option<SymbolId>) {
        let arity = decl.type_parameters.len();
        let (key, namespace) = match containing {
            Some(parent) => {
                let (parent_key, parent_symbol) = self
                    .symbols
                    .get_index(parent.0)
                    .map(|(k, s)| (k.clone(), s.namespace.clone()))
                    .unwrap_or_default();
                (format!("{parent_key}+{}`{arity}", decl.name), parent_symbol)
            }
            None => {
                let namespace = decl.namespace.clone().filter(|ns| !ns.is_empty());
                let prefix = namespace.as_deref().unwrap_or("");
                (format!("{prefix}::{}`{arity}", decl.name), namespace)
            }
        };

        let piece = PieceId(self.pieces.len());
        let entry = self.symbols.entry(key);
        let symbol = SymbolId(entry.index());
        entry
            .or_insert_with(|| TypeSymbol {
                name: decl.name.clone(),
                namespace,
                arity,
                containing,
                pieces: Vec::new(),
            })
            .pieces
            .push(piece);
        self.pieces.push(Piece { decl, path, symbol });

        for nested in &decl.nested {
            self.insert(nested, path, Some(symbol));
        }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Symbols in order of their first piece.
    pub fn symbol_ids(&self) -> impl Iterator<Item = SymbolId> + '_ {
        (0..self.symbols.len()).map(SymbolId)
    }

    pub fn symbol(&self, id: SymbolId) -> &TypeSymbol {
        &self.symbols[id.0]
    }

    pub fn piece(&self, id: PieceId) -> &Piece<'a> {
        &self.pieces[id.0]
    }

    pub fn pieces_of(&self, id: SymbolId) -> impl Iterator<Item = &Piece<'a>> + '_ {
        self.symbol(id).pieces.iter().map(move |p| self.piece(*p))
    }

    pub fn first_piece(&self, id: SymbolId) -> &Piece<'a> {
        // every symbol is created together with its first piece
        self.piece(self.symbol(id).pieces[0])
    }

    /// Declaration kind as written on the first piece.
    pub fn kind(&self, id: SymbolId) -> DeclKind {
        self.first_piece(id).decl.kind
    }

    pub fn chain(&self, id: SymbolId) -> HierarchyChain {
        let mut links = vec![id];
        let mut cursor = self.symbol(id).containing;
        while let Some(parent) = cursor {
            links.push(parent);
            cursor = self.symbol(parent).containing;
        }
        links.reverse();
        HierarchyChain { links }
    }

    /// `Outer.Inner` style path inside the namespace.
    pub fn nested_name(&self, id: SymbolId) -> String {
        self.chain(id)
            .links()
            .iter()
            .map(|link| self.symbol(*link).name.as_str())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Accessibility from the first piece that spells one out, else the
    /// language default for the declaration's position.
    pub fn accessibility(&self, id: SymbolId) -> Accessibility {
        self.pieces_of(id)
            .find_map(|piece| Accessibility::from_modifiers(&piece.decl.modifiers))
            .unwrap_or_else(|| match self.symbol(id).containing {
                None => Accessibility::Internal,
                Some(parent) if self.kind(parent) == DeclKind::Interface => Accessibility::Public,
                Some(_) => Accessibility::Private,
            })
    }

    /// First piece missing the `partial` modifier, if any.
    pub fn non_partial_piece(&self, id: SymbolId) -> Option<&Piece<'a>> {
        self.pieces_of(id).find(|piece| !piece.decl.has_modifier("partial"))
    }
}

impl Accessibility {
    pub fn from_modifiers(modifiers: &[String]) -> Option<Self> {
        let public = has_modifier(modifiers, "public");
        let internal = has_modifier(modifiers, "internal");
        let protected = has_modifier(modifiers, "protected");
        let private = has_modifier(modifiers, "private");
        match (public, internal, protected, private) {
            (true, ..) => Some(Self::Public),
            (_, true, true, _) => Some(Self::ProtectedInternal),
            (_, _, true, true) => Some(Self::PrivateProtected),
            (_, true, ..) => Some(Self::Internal),
            (_, _, true, _) => Some(Self::Protected),
            (_, _, _, true) => Some(Self::Private),
            _ => None,
        }
    }
}

impl HierarchyChain {
    pub fn links(&self) -> &[SymbolId] {
        &self.links
    }

    pub fn candidate(&self) -> SymbolId {
        // a chain always ends at the symbol it was built for
        self.links[self.links.len() - 1]
    }

    /// Enclosing types, outermost first, without the candidate.
    pub fn ancestors(&self) -> &[SymbolId] {
        &self.links[..self.links.len() - 1]
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————
