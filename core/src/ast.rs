//! The AST — the central entity of the engine
//!
//! Nodes are reference-counted and treated as value-identity keys by the
//! interpreter's memoization tables, so every constructor and rewrite in
//! this module hands back `Arc<Ast>` rather than an owned `Ast`.

use crate::check::Check;
use crate::issue::Issue;
use crate::options::ParseOptions;
use crate::transform::{Getter, Transformation};
use crate::value::Value;
use dashmap::DashMap;
use futures::future::BoxFuture;
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A literal scalar payload for [`AstNode::LiteralType`].
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Str(String),
    Num(f64),
    Bool(bool),
    BigInt(i128),
}

/// One member of an [`AstNode::Enums`] closed set.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    pub value: EnumValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnumValue {
    Str(String),
    Num(f64),
}

/// One property of a [`AstNode::TypeLiteral`].
#[derive(Debug, Clone)]
pub struct PropertySignature {
    pub name: String,
    pub ty: Arc<Ast>,
}

/// A user-supplied combiner resolving a key collision between an explicit
/// property write and an index-signature write.
#[derive(Clone)]
pub struct Merge {
    pub decode: Arc<
        dyn Fn((crate::value::Key, Value), (crate::value::Key, Value)) -> (crate::value::Key, Value)
            + Send
            + Sync,
    >,
    pub encode: Arc<
        dyn Fn((crate::value::Key, Value), (crate::value::Key, Value)) -> (crate::value::Key, Value)
            + Send
            + Sync,
    >,
}

impl fmt::Debug for Merge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Merge(..)")
    }
}

impl Merge {
    /// Swap the decode and encode combiners.
    #[must_use]
    pub fn flip(self) -> Self {
        Merge {
            decode: self.encode,
            encode: self.decode,
        }
    }
}

/// One index signature of a [`AstNode::TypeLiteral`].
#[derive(Clone)]
pub struct IndexSignature {
    pub parameter: Arc<Ast>,
    pub ty: Arc<Ast>,
    pub merge: Option<Merge>,
}

impl fmt::Debug for IndexSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexSignature")
            .field("parameter", &self.parameter)
            .field("ty", &self.ty)
            .field("has_merge", &self.merge.is_some())
            .finish()
    }
}

/// Disjoint (`OneOf`) vs. inclusive (`AnyOf`) union semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionMode {
    AnyOf,
    OneOf,
}

/// One span of a [`AstNode::TemplateLiteral`]: a permitted sub-pattern node
/// (`StringKw` | `NumberKw` | `LiteralType` | `TemplateLiteral` | `UnionType`)
/// followed by the literal text up to the next span, or the tail.
#[derive(Debug, Clone)]
pub struct TemplateSpan {
    pub pattern: Arc<Ast>,
    pub literal: String,
}

/// A lazily-forced, memoized recursive reference.
#[derive(Clone)]
pub struct SuspendCell {
    thunk: Arc<dyn Fn() -> Arc<Ast> + Send + Sync>,
    forced: Arc<OnceCell<Arc<Ast>>>,
}

impl fmt::Debug for SuspendCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuspendCell")
            .field("forced", &self.forced.get().is_some())
            .finish()
    }
}

impl SuspendCell {
    pub fn new(thunk: impl Fn() -> Arc<Ast> + Send + Sync + 'static) -> Self {
        SuspendCell {
            thunk: Arc::new(thunk),
            forced: Arc::new(OnceCell::new()),
        }
    }

    /// Force the thunk, memoizing the result so subsequent forces return the
    /// same `Arc` pointer.
    #[must_use]
    pub fn force(&self) -> Arc<Ast> {
        Arc::clone(self.forced.get_or_init(|| (self.thunk)()))
    }
}

/// Outcome of a [`DeclarationHook`] invocation: resolved immediately, or
/// suspended pending an asynchronous computation.
pub enum DeclOutcome {
    Done(Result<Option<Value>, Issue>),
    Pending(BoxFuture<'static, Result<Option<Value>, Issue>>),
}

/// The user-supplied parser behind an [`AstNode::Declaration`]. Defined
/// here, rather than in the interpreter crate, so a `Declaration` node is
/// self-sufficient: the AST crate never depends on the crate that hosts
/// the `go`/`Parser` dispatch.
pub trait DeclarationHook: Send + Sync {
    fn decode(&self, input: Option<Value>, self_ast: &Arc<Ast>, options: ParseOptions) -> DeclOutcome;
    fn encode(&self, input: Option<Value>, self_ast: &Arc<Ast>, options: ParseOptions) -> DeclOutcome;
}

impl fmt::Debug for dyn DeclarationHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn DeclarationHook")
    }
}

/// One step of an [`Extensions::encoding`] chain.
#[derive(Clone)]
pub struct Link {
    pub to: Arc<Ast>,
    pub transformation: Transformation,
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link").field("to", &self.to).finish()
    }
}

/// Semantic markers attached to a node when it appears as a property or
/// element type.
#[derive(Debug, Clone, Default)]
pub struct Context {
    pub is_optional: bool,
    pub is_readonly: bool,
    pub ctor_default: Option<Transformation>,
}

/// Free-form annotation map: title, description, examples, JSON-Schema
/// fragments, provider-specific metadata.
pub type Annotations = HashMap<String, Value>;

/// The fields every AST variant carries.
#[derive(Debug, Clone, Default)]
pub struct Extensions {
    pub annotations: Annotations,
    pub checks: Option<Vec<Check>>,
    pub encoding: Option<Vec<Link>>,
    pub context: Option<Context>,
}

/// One AST node. Carries its [`Extensions`] alongside the
/// variant-specific payload in [`AstNode`].
#[derive(Debug, Clone)]
pub struct Ast {
    pub node: AstNode,
    pub ext: Extensions,
}

/// Every distinct node shape the engine understands.
#[derive(Debug, Clone)]
pub enum AstNode {
    NullKw,
    UndefinedKw,
    VoidKw,
    NeverKw,
    AnyKw,
    UnknownKw,
    StringKw,
    NumberKw,
    BoolKw,
    BigIntKw,
    SymbolKw,
    ObjectKw,
    LiteralType(LiteralValue),
    UniqueSymbol(u64),
    Enums(Vec<EnumMember>),
    TemplateLiteral {
        head: String,
        spans: Vec<TemplateSpan>,
    },
    TupleType {
        is_readonly: bool,
        elements: Vec<Arc<Ast>>,
        rest: Vec<Arc<Ast>>,
    },
    TypeLiteral {
        property_sigs: Vec<PropertySignature>,
        index_sigs: Vec<IndexSignature>,
    },
    UnionType {
        types: Vec<Arc<Ast>>,
        mode: UnionMode,
    },
    Suspend(SuspendCell),
    Declaration {
        type_params: Vec<Arc<Ast>>,
        hook: Arc<dyn DeclarationHook>,
    },
}

macro_rules! keyword_ctor {
    ($(($fn_name:ident, $variant:ident)),* $(,)?) => {
        $(
            #[must_use]
            pub fn $fn_name() -> Ast {
                Ast { node: AstNode::$variant, ext: Extensions::default() }
            }
        )*
    };
}

impl Ast {
    keyword_ctor!(
        (null_kw, NullKw),
        (undefined_kw, UndefinedKw),
        (void_kw, VoidKw),
        (never_kw, NeverKw),
        (any_kw, AnyKw),
        (unknown_kw, UnknownKw),
        (string_kw, StringKw),
        (number_kw, NumberKw),
        (bool_kw, BoolKw),
        (bigint_kw, BigIntKw),
        (symbol_kw, SymbolKw),
        (object_kw, ObjectKw),
    );

    #[must_use]
    pub fn literal(value: LiteralValue) -> Ast {
        Ast {
            node: AstNode::LiteralType(value),
            ext: Extensions::default(),
        }
    }

    #[must_use]
    pub fn unique_symbol(id: u64) -> Ast {
        Ast {
            node: AstNode::UniqueSymbol(id),
            ext: Extensions::default(),
        }
    }

    #[must_use]
    pub fn enums(members: Vec<EnumMember>) -> Ast {
        Ast {
            node: AstNode::Enums(members),
            ext: Extensions::default(),
        }
    }

    #[must_use]
    pub fn template_literal(head: impl Into<String>, spans: Vec<TemplateSpan>) -> Ast {
        Ast {
            node: AstNode::TemplateLiteral {
                head: head.into(),
                spans,
            },
            ext: Extensions::default(),
        }
    }

    #[must_use]
    pub fn tuple(elements: Vec<Arc<Ast>>, rest: Vec<Arc<Ast>>) -> Ast {
        Ast {
            node: AstNode::TupleType {
                is_readonly: false,
                elements,
                rest,
            },
            ext: Extensions::default(),
        }
    }

    #[must_use]
    pub fn type_literal(
        property_sigs: Vec<PropertySignature>,
        index_sigs: Vec<IndexSignature>,
    ) -> Ast {
        Ast {
            node: AstNode::TypeLiteral {
                property_sigs,
                index_sigs,
            },
            ext: Extensions::default(),
        }
    }

    #[must_use]
    pub fn union(types: Vec<Arc<Ast>>, mode: UnionMode) -> Ast {
        Ast {
            node: AstNode::UnionType { types, mode },
            ext: Extensions::default(),
        }
    }

    #[must_use]
    pub fn suspend(thunk: impl Fn() -> Arc<Ast> + Send + Sync + 'static) -> Ast {
        Ast {
            node: AstNode::Suspend(SuspendCell::new(thunk)),
            ext: Extensions::default(),
        }
    }

    #[must_use]
    pub fn declare(type_params: Vec<Arc<Ast>>, hook: Arc<dyn DeclarationHook>) -> Ast {
        Ast {
            node: AstNode::Declaration { type_params, hook },
            ext: Extensions::default(),
        }
    }

    /// Build a `Declaration` from a named, reusable type rather than a
    /// closure, for callers who want a `struct Foo; impl DeclarationImpl for
    /// Foo` instead of capturing state in two `Arc<dyn Fn>`s.
    #[must_use]
    pub fn declare_with_impl(type_params: Vec<Arc<Ast>>, imp: Arc<dyn DeclarationImpl>) -> Ast {
        Ast::declare(type_params, Arc::new(DeclarationImplHook(imp)))
    }

    /// `true` when `context.is_optional` is set.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.ext
            .context
            .as_ref()
            .map(|c| c.is_optional)
            .unwrap_or(false)
    }

    #[must_use]
    pub fn is_readonly(&self) -> bool {
        self.ext
            .context
            .as_ref()
            .map(|c| c.is_readonly)
            .unwrap_or(false)
    }

    #[must_use]
    pub fn has_encoding(&self) -> bool {
        self.ext.encoding.is_some()
    }
}

/// Build a new `Ast` sharing `node` with `base` but with `ext` replaced —
/// the common shape behind every universal rewrite.
fn with_ext(base: &Arc<Ast>, ext: Extensions) -> Arc<Ast> {
    Arc::new(Ast {
        node: base.node.clone(),
        ext,
    })
}

/// Swap the encoding chain. Callers that need identity
/// preservation on a true no-op should compare before calling; the
/// universal rewrites only guarantee pointer identity for the global
/// rewrites ([`type_ast`], [`flip`]).
#[must_use]
pub fn replace_encoding(ast: &Arc<Ast>, enc: Option<Vec<Link>>) -> Arc<Ast> {
    with_ext(
        ast,
        Extensions {
            encoding: enc,
            ..ast.ext.clone()
        },
    )
}

/// Replace the check list wholesale.
#[must_use]
pub fn replace_checks(ast: &Arc<Ast>, checks: Option<Vec<Check>>) -> Arc<Ast> {
    with_ext(
        ast,
        Extensions {
            checks,
            ..ast.ext.clone()
        },
    )
}

/// Concatenate `more` onto the existing check list, or set it if absent
///.
#[must_use]
pub fn append_checks(ast: &Arc<Ast>, more: Vec<Check>) -> Arc<Ast> {
    if more.is_empty() {
        return Arc::clone(ast);
    }
    let mut checks = ast.ext.checks.clone().unwrap_or_default();
    checks.extend(more);
    replace_checks(ast, Some(checks))
}

/// Append `more` to the innermost Link's `to` when the node has an encoding
/// chain; otherwise behaves like [`append_checks`].
#[must_use]
pub fn append_encoded_checks(ast: &Arc<Ast>, more: Vec<Check>) -> Arc<Ast> {
    if more.is_empty() {
        return Arc::clone(ast);
    }
    match &ast.ext.encoding {
        None => append_checks(ast, more),
        Some(chain) => {
            let mut chain = chain.clone();
            let innermost = chain.last().expect("encoding is non-empty");
            let new_to = append_checks(&innermost.to, more);
            let last_idx = chain.len() - 1;
            chain[last_idx] = Link {
                to: new_to,
                transformation: innermost.transformation.clone(),
            };
            replace_encoding(ast, Some(chain))
        }
    }
}

fn ast_key(ast: &Arc<Ast>) -> usize {
    Arc::as_ptr(ast) as *const () as usize
}

/// Identity-keyed memo tables for the two global rewrites. Keyed by
/// `Arc` pointer address rather than a weak map: Rust has no tracing GC to
/// hook a weak-keyed cache into, so entries live for the process lifetime.
/// This trades a small, bounded memory cost (one cached node per distinct
/// AST pointer ever rewritten) for termination on recursive schemas, which
/// is the property these caches actually exist to provide.
static TYPE_AST_MEMO: OnceCell<DashMap<usize, Arc<Ast>>> = OnceCell::new();
static FLIP_MEMO: OnceCell<DashMap<usize, Arc<Ast>>> = OnceCell::new();

fn type_ast_memo() -> &'static DashMap<usize, Arc<Ast>> {
    TYPE_AST_MEMO.get_or_init(DashMap::new)
}

fn flip_memo() -> &'static DashMap<usize, Arc<Ast>> {
    FLIP_MEMO.get_or_init(DashMap::new)
}

/// Drop every `encoding` field recursively, returning the "typed view"
///. Memoized by identity.
#[must_use]
pub fn type_ast(ast: &Arc<Ast>) -> Arc<Ast> {
    let key = ast_key(ast);
    if let Some(cached) = type_ast_memo().get(&key) {
        return Arc::clone(&cached);
    }

    let stripped_node = match &ast.node {
        AstNode::TupleType {
            is_readonly,
            elements,
            rest,
        } => AstNode::TupleType {
            is_readonly: *is_readonly,
            elements: elements.iter().map(type_ast).collect(),
            rest: rest.iter().map(type_ast).collect(),
        },
        AstNode::TypeLiteral {
            property_sigs,
            index_sigs,
        } => AstNode::TypeLiteral {
            property_sigs: property_sigs
                .iter()
                .map(|p| PropertySignature {
                    name: p.name.clone(),
                    ty: type_ast(&p.ty),
                })
                .collect(),
            index_sigs: index_sigs
                .iter()
                .map(|i| IndexSignature {
                    parameter: type_ast(&i.parameter),
                    ty: type_ast(&i.ty),
                    merge: i.merge.clone(),
                })
                .collect(),
        },
        AstNode::UnionType { types, mode } => AstNode::UnionType {
            types: types.iter().map(type_ast).collect(),
            mode: *mode,
        },
        AstNode::Suspend(cell) => {
            let cell = cell.clone();
            AstNode::Suspend(SuspendCell::new(move || type_ast(&cell.force())))
        }
        AstNode::Declaration { type_params, hook } => AstNode::Declaration {
            type_params: type_params.iter().map(type_ast).collect(),
            hook: Arc::clone(hook),
        },
        other => other.clone(),
    };

    let result = Arc::new(Ast {
        node: stripped_node,
        ext: Extensions {
            encoding: None,
            ..ast.ext.clone()
        },
    });
    type_ast_memo().insert(key, Arc::clone(&result));
    result
}

fn flip_node_children(node: &AstNode) -> (AstNode, bool) {
    match node {
        AstNode::TupleType {
            is_readonly,
            elements,
            rest,
        } => {
            let new_elements: Vec<_> = elements.iter().map(flip).collect();
            let new_rest: Vec<_> = rest.iter().map(flip).collect();
            let changed = new_elements
                .iter()
                .zip(elements)
                .any(|(a, b)| !Arc::ptr_eq(a, b))
                || new_rest.iter().zip(rest).any(|(a, b)| !Arc::ptr_eq(a, b));
            (
                AstNode::TupleType {
                    is_readonly: *is_readonly,
                    elements: new_elements,
                    rest: new_rest,
                },
                changed,
            )
        }
        AstNode::TypeLiteral {
            property_sigs,
            index_sigs,
        } => {
            let new_props: Vec<_> = property_sigs
                .iter()
                .map(|p| PropertySignature {
                    name: p.name.clone(),
                    ty: flip(&p.ty),
                })
                .collect();
            let new_index: Vec<_> = index_sigs
                .iter()
                .map(|i| IndexSignature {
                    parameter: flip(&i.parameter),
                    ty: flip(&i.ty),
                    merge: i.merge.clone().map(Merge::flip),
                })
                .collect();
            let changed = new_props
                .iter()
                .zip(property_sigs)
                .any(|(a, b)| !Arc::ptr_eq(&a.ty, &b.ty))
                || new_index.iter().zip(index_sigs).any(|(a, b)| {
                    !Arc::ptr_eq(&a.ty, &b.ty) || !Arc::ptr_eq(&a.parameter, &b.parameter)
                });
            (
                AstNode::TypeLiteral {
                    property_sigs: new_props,
                    index_sigs: new_index,
                },
                changed,
            )
        }
        AstNode::UnionType { types, mode } => {
            let new_types: Vec<_> = types.iter().map(flip).collect();
            let changed = new_types.iter().zip(types).any(|(a, b)| !Arc::ptr_eq(a, b));
            (
                AstNode::UnionType {
                    types: new_types,
                    mode: *mode,
                },
                changed,
            )
        }
        AstNode::Suspend(cell) => {
            let cell = cell.clone();
            (
                AstNode::Suspend(SuspendCell::new(move || flip(&cell.force()))),
                true,
            )
        }
        AstNode::Declaration { type_params, hook } => {
            let new_params: Vec<_> = type_params.iter().map(flip).collect();
            let changed = new_params
                .iter()
                .zip(type_params)
                .any(|(a, b)| !Arc::ptr_eq(a, b));
            (
                AstNode::Declaration {
                    type_params: new_params,
                    hook: Arc::clone(hook),
                },
                changed,
            )
        }
        other => (other.clone(), false),
    }
}

/// Swap encode and decode globally. Memoized on input identity.
#[must_use]
pub fn flip(ast: &Arc<Ast>) -> Arc<Ast> {
    let key = ast_key(ast);
    if let Some(cached) = flip_memo().get(&key) {
        return Arc::clone(&cached);
    }

    let result = match &ast.ext.encoding {
        None => {
            let (new_node, changed) = flip_node_children(&ast.node);
            if changed {
                Arc::new(Ast {
                    node: new_node,
                    ext: ast.ext.clone(),
                })
            } else {
                Arc::clone(ast)
            }
        }
        Some(chain) => {
            // Flip the node with its encoding stripped, pair with the first
            // link's flipped transformation; then walk the remaining links,
            // flipping each `to` and pairing it with its flipped
            // transformation; finally splice onto `flip(last.to)`, which may
            // itself carry encoding.
            let bare = replace_encoding(ast, None);
            let bare_flipped = flip(&bare);

            let mut new_chain: Vec<Link> = Vec::with_capacity(chain.len());
            let mut prev_to = bare_flipped;
            for link in chain {
                new_chain.push(Link {
                    to: prev_to,
                    transformation: link.transformation.clone().flip(),
                });
                prev_to = flip(&link.to);
            }
            let mut spliced = new_chain;
            let base = match &prev_to.ext.encoding {
                Some(existing) => {
                    spliced.extend(existing.iter().cloned());
                    replace_encoding(&prev_to, None)
                }
                None => Arc::clone(&prev_to),
            };
            replace_encoding(&base, Some(spliced))
        }
    };

    flip_memo().insert(key, Arc::clone(&result));
    result
}

/// A synchronous-only `DeclarationHook` built from two plain getters — the
/// common case where the user's `run` hook never needs to suspend.
pub struct SyncDeclarationHook {
    pub decode: Getter,
    pub encode: Getter,
}

impl DeclarationHook for SyncDeclarationHook {
    fn decode(&self, input: Option<Value>, self_ast: &Arc<Ast>, options: ParseOptions) -> DeclOutcome {
        match self.decode.call(input, self_ast, options) {
            crate::transform::GetterOutcome::Ready(r) => DeclOutcome::Done(r),
            crate::transform::GetterOutcome::Pending(fut) => DeclOutcome::Pending(fut),
        }
    }

    fn encode(&self, input: Option<Value>, self_ast: &Arc<Ast>, options: ParseOptions) -> DeclOutcome {
        match self.encode.call(input, self_ast, options) {
            crate::transform::GetterOutcome::Ready(r) => DeclOutcome::Done(r),
            crate::transform::GetterOutcome::Pending(fut) => DeclOutcome::Pending(fut),
        }
    }
}

/// A named, reusable alternative to `SyncDeclarationHook`/closures: a plain
/// `decode`/`encode` pair over already-resolved values, with no suspension
/// and no access to `self_ast`/`options`. Implementors are wrapped in a
/// `DeclarationHook` by [`Ast::declare_with_impl`].
pub trait DeclarationImpl: Send + Sync {
    fn decode(&self, input: Option<Value>) -> Result<Option<Value>, Issue>;
    fn encode(&self, input: Option<Value>) -> Result<Option<Value>, Issue>;
}

struct DeclarationImplHook(Arc<dyn DeclarationImpl>);

impl DeclarationHook for DeclarationImplHook {
    fn decode(&self, input: Option<Value>, _self_ast: &Arc<Ast>, _options: ParseOptions) -> DeclOutcome {
        DeclOutcome::Done(self.0.decode(input))
    }

    fn encode(&self, input: Option<Value>, _self_ast: &Arc<Ast>, _options: ParseOptions) -> DeclOutcome {
        DeclOutcome::Done(self.0.encode(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suspend_force_is_memoized() {
        let cell = SuspendCell::new(|| Arc::new(Ast::string_kw()));
        let a = cell.force();
        let b = cell.force();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn append_checks_is_noop_identity_preserving_on_empty() {
        let ast = Arc::new(Ast::string_kw());
        let same = append_checks(&ast, vec![]);
        assert!(Arc::ptr_eq(&ast, &same));
    }

    #[test]
    fn type_ast_strips_encoding_and_is_memoized() {
        let inner = Arc::new(Ast::number_kw());
        let link = Link {
            to: Arc::clone(&inner),
            transformation: crate::transform::string_coercion(),
        };
        let outer = Arc::new(Ast {
            node: AstNode::StringKw,
            ext: Extensions {
                encoding: Some(vec![link]),
                ..Extensions::default()
            },
        });
        let typed = type_ast(&outer);
        assert!(typed.ext.encoding.is_none());
        let typed_again = type_ast(&outer);
        assert!(Arc::ptr_eq(&typed, &typed_again));
    }

    #[test]
    fn flip_is_its_own_inverse_on_plain_tuple() {
        let el = Arc::new(Ast::string_kw());
        let tuple = Arc::new(Ast::tuple(vec![el], vec![]));
        let flipped = flip(&tuple);
        let flipped_twice = flip(&flipped);
        assert!(Arc::ptr_eq(&tuple, &flipped_twice));
    }

    #[test]
    fn flip_swaps_transformation_directions() {
        let inner = Arc::new(Ast::number_kw());
        let outer = Arc::new(Ast {
            node: AstNode::StringKw,
            ext: Extensions {
                encoding: Some(vec![Link {
                    to: Arc::clone(&inner),
                    transformation: crate::transform::string_coercion(),
                }]),
                ..Extensions::default()
            },
        });
        let flipped = flip(&outer);
        let chain = flipped.ext.encoding.as_ref().expect("expected encoding chain");
        assert_eq!(chain.len(), 1);
    }

    struct Double;

    impl DeclarationImpl for Double {
        fn decode(&self, input: Option<Value>) -> Result<Option<Value>, Issue> {
            match input {
                Some(Value::Num(n)) => Ok(Some(Value::Num(n * 2.0))),
                other => Ok(other),
            }
        }

        fn encode(&self, input: Option<Value>) -> Result<Option<Value>, Issue> {
            match input {
                Some(Value::Num(n)) => Ok(Some(Value::Num(n / 2.0))),
                other => Ok(other),
            }
        }
    }

    #[test]
    fn declare_with_impl_runs_the_named_impl() {
        let ast = Ast::declare_with_impl(vec![], Arc::new(Double));
        let hook = match &ast.node {
            AstNode::Declaration { hook, .. } => hook,
            _ => panic!("expected a Declaration node"),
        };
        let self_ast = Arc::new(Ast::number_kw());
        match hook.decode(Some(Value::Num(3.0)), &self_ast, ParseOptions::default()) {
            DeclOutcome::Done(Ok(Some(Value::Num(n)))) => assert_eq!(n, 6.0),
            _ => panic!("unexpected decode outcome"),
        }
        match hook.encode(Some(Value::Num(6.0)), &self_ast, ParseOptions::default()) {
            DeclOutcome::Done(Ok(Some(Value::Num(n)))) => assert_eq!(n, 3.0),
            _ => panic!("unexpected encode outcome"),
        }
    }
}
