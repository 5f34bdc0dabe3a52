//! Understudy Derive Macros: signature tables from trait definitions
//!
//! A type-checked double needs the method shapes of the collaborator it
//! replaces. Writing a `SignatureTable` by hand repeats the trait and drifts
//! from it; `#[signatures]` reads the trait once at compile time instead.
//!
//! # Example
//!
//! ```ignore
//! use understudy::{signatures, Double};
//!
//! #[signatures]
//! pub trait Collaborator {
//!     fn query(&self, arg: &str) -> String;
//!     fn command(&mut self, arg: &str) -> (String, Option<String>);
//!     fn notify(&self, items: &[u32]);
//! }
//!
//! // Generates `pub struct CollaboratorSignatures;` implementing
//! // `understudy::Signatures`:
//! //
//! //   query:   [String]   -> [String]
//! //   command: [String]   -> [String, Option<String>]
//! //   notify:  [Vec<u32>] -> []
//! let double = Double::with_type::<CollaboratorSignatures>();
//! ```
//!
//! # Rules
//!
//! - The receiver is not a parameter.
//! - References are described by their owned form: `&str` as `String`,
//!   `&[T]` as `Vec<T>`, `&T` as `T`. Other lifetimes become `'static`.
//! - `impl Trait`, generic parameters and anything mentioning `Self` become
//!   interface kinds, which accept any value.
//! - A tuple return type gives one return kind per element; `()` or no return
//!   type gives none.

use std::collections::HashSet;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote, ToTokens};
use syn::visit_mut::{self, VisitMut};
use syn::{
    parse_macro_input, parse_quote, FnArg, GenericParam, Generics, ItemTrait, LitStr, ReturnType,
    TraitItem, TraitItemFn, Type,
};

/// Attribute macro generating a signature table for a trait.
///
/// The trait is emitted unchanged. Next to it the macro emits a unit struct
/// `<Trait>Signatures` with the trait's visibility, implementing
/// `understudy::Signatures`. The table is built on first use and shared.
///
/// # Attributes
///
/// - `#[signatures(name = "Custom")]` - Override the type name used in
///   diagnostics (defaults to the trait name)
#[proc_macro_attribute]
pub fn signatures(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut type_name: Option<String> = None;
    let attr_parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            let value: LitStr = meta.value()?.parse()?;
            type_name = Some(value.value());
            Ok(())
        } else {
            Err(meta.error("unsupported signatures attribute, expected `name = \"...\"`"))
        }
    });
    parse_macro_input!(attr with attr_parser);

    let item_trait = parse_macro_input!(item as ItemTrait);
    TokenStream::from(expand(&item_trait, type_name))
}

fn expand(item_trait: &ItemTrait, type_name: Option<String>) -> TokenStream2 {
    let trait_ident = &item_trait.ident;
    let vis = &item_trait.vis;
    let struct_ident = format_ident!("{}Signatures", trait_ident);
    let type_name = type_name.unwrap_or_else(|| trait_ident.to_string());
    let doc = format!("Signature table of [`{trait_ident}`]");

    let trait_generics = generic_names(&item_trait.generics);
    let methods = item_trait.items.iter().filter_map(|item| match item {
        TraitItem::Fn(method) => Some(method_tokens(method, &trait_generics)),
        _ => None,
    });

    quote! {
        #item_trait

        #[doc = #doc]
        #[derive(Debug, Clone, Copy, Default)]
        #vis struct #struct_ident;

        impl ::understudy::Signatures for #struct_ident {
            fn signature_table() -> ::std::sync::Arc<::understudy::SignatureTable> {
                static TABLE: ::std::sync::OnceLock<::std::sync::Arc<::understudy::SignatureTable>> =
                    ::std::sync::OnceLock::new();
                ::std::sync::Arc::clone(TABLE.get_or_init(|| {
                    ::std::sync::Arc::new(
                        ::understudy::SignatureTable::new(#type_name)
                            #(#methods)*
                    )
                }))
            }
        }
    }
}

/// `.method("name", [params], [returns])` for one trait method
fn method_tokens(method: &TraitItemFn, trait_generics: &HashSet<String>) -> TokenStream2 {
    let name = method.sig.ident.to_string();

    let mut generics = trait_generics.clone();
    generics.extend(generic_names(&method.sig.generics));

    let params = method.sig.inputs.iter().filter_map(|input| match input {
        FnArg::Receiver(_) => None,
        FnArg::Typed(pat_type) => Some(kind_tokens(&pat_type.ty, &generics)),
    });
    let returns = return_types(&method.sig.output)
        .into_iter()
        .map(|ty| kind_tokens(&ty, &generics));

    quote! {
        .method(#name, [#(#params),*], [#(#returns),*])
    }
}

/// Names of the type and const parameters in `generics`
fn generic_names(generics: &Generics) -> HashSet<String> {
    generics
        .params
        .iter()
        .filter_map(|param| match param {
            GenericParam::Type(ty) => Some(ty.ident.to_string()),
            GenericParam::Const(constant) => Some(constant.ident.to_string()),
            GenericParam::Lifetime(_) => None,
        })
        .collect()
}

/// Declared return kinds: one per tuple element, none for `()`
fn return_types(output: &ReturnType) -> Vec<Type> {
    match output {
        ReturnType::Default => Vec::new(),
        ReturnType::Type(_, ty) => match strip_parens(ty) {
            Type::Tuple(tuple) => tuple.elems.iter().cloned().collect(),
            other => vec![other.clone()],
        },
    }
}

fn strip_parens(ty: &Type) -> &Type {
    match ty {
        Type::Paren(inner) => strip_parens(&inner.elem),
        Type::Group(inner) => strip_parens(&inner.elem),
        other => other,
    }
}

/// Expression building the `TypeKind` for `ty`
fn kind_tokens(ty: &Type, generics: &HashSet<String>) -> TokenStream2 {
    let mut normalized = owned_form(ty);
    let mut normalizer = Normalizer::new(generics);
    normalizer.visit_type_mut(&mut normalized);

    if normalizer.opaque {
        let name = render_type(ty);
        quote! { ::understudy::TypeKind::interface(#name) }
    } else {
        quote! { ::understudy::TypeKind::of::<#normalized>() }
    }
}

/// Owned form of a parameter type: references are dropped, `&[T]` becomes
/// `Vec<T>`.
fn owned_form(ty: &Type) -> Type {
    match strip_parens(ty) {
        Type::Reference(reference) => match strip_parens(&reference.elem) {
            Type::Slice(slice) => {
                let elem = &slice.elem;
                parse_quote!(::std::vec::Vec<#elem>)
            }
            elem => owned_form(elem),
        },
        other => other.clone(),
    }
}

/// Rewrites lifetimes to `'static` and flags types that cannot be named
/// outside the trait.
struct Normalizer<'a> {
    generics: &'a HashSet<String>,
    bound_lifetimes: HashSet<String>,
    opaque: bool,
}

impl<'a> Normalizer<'a> {
    fn new(generics: &'a HashSet<String>) -> Self {
        Self {
            generics,
            bound_lifetimes: HashSet::new(),
            opaque: false,
        }
    }
}

impl VisitMut for Normalizer<'_> {
    fn visit_lifetime_mut(&mut self, lifetime: &mut syn::Lifetime) {
        if !self.bound_lifetimes.contains(&lifetime.ident.to_string()) {
            *lifetime = parse_quote!('static);
        }
    }

    // `for<'a>` binders stay as written. The enclosing bare fn or trait
    // bound restores the outer set once its binder goes out of scope.
    fn visit_bound_lifetimes_mut(&mut self, node: &mut syn::BoundLifetimes) {
        for param in &node.lifetimes {
            if let GenericParam::Lifetime(param) = param {
                self.bound_lifetimes.insert(param.lifetime.ident.to_string());
            }
        }
    }

    fn visit_trait_bound_mut(&mut self, node: &mut syn::TraitBound) {
        let outer = self.bound_lifetimes.clone();
        visit_mut::visit_trait_bound_mut(self, node);
        self.bound_lifetimes = outer;
    }

    fn visit_type_impl_trait_mut(&mut self, _node: &mut syn::TypeImplTrait) {
        self.opaque = true;
    }

    fn visit_type_infer_mut(&mut self, _node: &mut syn::TypeInfer) {
        self.opaque = true;
    }

    fn visit_type_bare_fn_mut(&mut self, node: &mut syn::TypeBareFn) {
        // Elided lifetimes of a function pointer are late bound.
        let outer = self.bound_lifetimes.clone();
        if let Some(binder) = &mut node.lifetimes {
            self.visit_bound_lifetimes_mut(binder);
        }
        for input in &mut node.inputs {
            self.visit_type_mut(&mut input.ty);
        }
        if let ReturnType::Type(_, ty) = &mut node.output {
            self.visit_type_mut(ty);
        }
        self.bound_lifetimes = outer;
    }

    // Const parameters show up as expressions, e.g. the length in `[u8; N]`.
    fn visit_expr_path_mut(&mut self, node: &mut syn::ExprPath) {
        if let Some(first) = node.path.segments.first() {
            if node.path.segments.len() == 1 && self.generics.contains(&first.ident.to_string()) {
                self.opaque = true;
            }
        }
        visit_mut::visit_expr_path_mut(self, node);
    }

    fn visit_type_path_mut(&mut self, node: &mut syn::TypePath) {
        if node.qself.is_some() {
            self.opaque = true;
        }
        if let Some(first) = node.path.segments.first() {
            let ident = first.ident.to_string();
            if ident == "Self" || self.generics.contains(&ident) {
                self.opaque = true;
            }
        }
        visit_mut::visit_type_path_mut(self, node);
    }
}

/// Source form of a type for diagnostics, e.g. `impl Display`
fn render_type(ty: &Type) -> String {
    let raw = ty.to_token_stream().to_string();
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ' ' {
            let prev = out.chars().last();
            let next = chars.peek().copied();
            let tight_after = matches!(prev, Some('&' | '<' | ':' | '(' | '['));
            let tight_before = matches!(next, Some('<' | '>' | ',' | ':' | ';' | ')' | ']'));
            if tight_after || tight_before {
                continue;
            }
        }
        out.push(c);
    }
    out
}
