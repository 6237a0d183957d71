//! Flat node arena for the AST.
//!
//! All recursive node families (expressions, statements, declarations,
//! types, asm operands) live in per-family `Vec`s; children are referenced
//! by typed 32-bit ids. Ids stay valid until the arena is dropped. The
//! parser can take a mark before a speculative parse and truncate back to
//! it when the speculation is rewound.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use crate::ast::{AsmExpr, Decl, Expr, Stmt, Type};

/// Typed index into one of the arena's node families.
pub struct Id<T>(u32, PhantomData<fn() -> T>);

impl<T> Id<T> {
    #[inline]
    pub(crate) fn new(raw: u32) -> Self {
        Id(raw, PhantomData)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

// Manual impls: derives would bound on `T`.
impl<T> Copy for Id<T> {}
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl<T> Eq for Id<T> {}
impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}
impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node family stored by the arena.
pub trait ArenaNode: Sized {
    fn items(arena: &NodeArena) -> &Vec<Self>;
    fn items_mut(arena: &mut NodeArena) -> &mut Vec<Self>;
}

macro_rules! arena_family {
    ($ty:ty, $field:ident) => {
        impl ArenaNode for $ty {
            #[inline]
            fn items(arena: &NodeArena) -> &Vec<Self> {
                &arena.$field
            }
            #[inline]
            fn items_mut(arena: &mut NodeArena) -> &mut Vec<Self> {
                &mut arena.$field
            }
        }
    };
}

/// Snapshot of arena lengths, for speculative rollback.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ArenaMark {
    exprs: usize,
    stmts: usize,
    decls: usize,
    types: usize,
    asm_exprs: usize,
}

/// Arena owning every AST node of one parsed module.
#[derive(Default)]
pub struct NodeArena {
    exprs: Vec<Expr>,
    stmts: Vec<Stmt>,
    decls: Vec<Decl>,
    types: Vec<Type>,
    asm_exprs: Vec<AsmExpr>,
}

arena_family!(Expr, exprs);
arena_family!(Stmt, stmts);
arena_family!(Decl, decls);
arena_family!(Type, types);
arena_family!(AsmExpr, asm_exprs);

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a node, returning its id.
    ///
    /// # Panics
    ///
    /// Panics if a family exceeds `u32::MAX` nodes.
    #[inline]
    pub fn alloc<T: ArenaNode>(&mut self, node: T) -> Id<T> {
        let items = T::items_mut(self);
        let raw = u32::try_from(items.len())
            .unwrap_or_else(|_| panic!("arena family exceeded u32::MAX nodes"));
        items.push(node);
        Id::new(raw)
    }

    #[inline]
    pub fn get<T: ArenaNode>(&self, id: Id<T>) -> &T {
        &T::items(self)[id.raw() as usize]
    }

    #[inline]
    pub fn get_mut<T: ArenaNode>(&mut self, id: Id<T>) -> &mut T {
        &mut T::items_mut(self)[id.raw() as usize]
    }

    /// Number of nodes in one family.
    pub fn len<T: ArenaNode>(&self) -> usize {
        T::items(self).len()
    }

    /// Release hint for a node the parser deliberately drops.
    ///
    /// The slot is not reclaimed; the id simply becomes unreferenced and
    /// is freed with the arena.
    pub fn release<T: ArenaNode>(&mut self, id: Id<T>) {
        let _ = id;
    }

    /// Take a snapshot of every family's length.
    pub fn mark(&self) -> ArenaMark {
        ArenaMark {
            exprs: self.exprs.len(),
            stmts: self.stmts.len(),
            decls: self.decls.len(),
            types: self.types.len(),
            asm_exprs: self.asm_exprs.len(),
        }
    }

    /// Discard every node allocated since `mark`.
    ///
    /// Only valid when no id allocated before the mark refers to a node
    /// allocated after it, which holds for the parser's LIFO speculation
    /// discipline.
    pub fn reset_to(&mut self, mark: ArenaMark) {
        self.exprs.truncate(mark.exprs);
        self.stmts.truncate(mark.stmts);
        self.decls.truncate(mark.decls);
        self.types.truncate(mark.types);
        self.asm_exprs.truncate(mark.asm_exprs);
    }
}

impl fmt::Debug for NodeArena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeArena")
            .field("exprs", &self.exprs.len())
            .field("stmts", &self.stmts.len())
            .field("decls", &self.decls.len())
            .field("types", &self.types.len())
            .field("asm_exprs", &self.asm_exprs.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, ExprKind};
    use crate::Loc;

    #[test]
    fn alloc_and_get() {
        let mut arena = NodeArena::new();
        let id = arena.alloc(Expr {
            kind: ExprKind::Dollar,
            loc: Loc::DUMMY,
        });
        assert!(matches!(arena.get(id).kind, ExprKind::Dollar));
        assert_eq!(arena.len::<Expr>(), 1);
    }

    #[test]
    fn mark_and_reset_discard_speculative_nodes() {
        let mut arena = NodeArena::new();
        let kept = arena.alloc(Expr {
            kind: ExprKind::This,
            loc: Loc::DUMMY,
        });
        let mark = arena.mark();
        for _ in 0..4 {
            arena.alloc(Expr {
                kind: ExprKind::Null,
                loc: Loc::DUMMY,
            });
        }
        assert_eq!(arena.len::<Expr>(), 5);
        arena.reset_to(mark);
        assert_eq!(arena.len::<Expr>(), 1);
        assert!(matches!(arena.get(kept).kind, ExprKind::This));
    }
}
