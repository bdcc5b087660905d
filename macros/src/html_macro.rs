//! `html!` macro: parse JSX-like markup and generate markup builder calls.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::{braced, Error, Expr, Ident, LitStr, Result, Token};

// ---------------------------------------------------------------------------
// AST types
// ---------------------------------------------------------------------------

/// An attribute value: a string literal or a braced expression.
#[derive(Clone)]
pub(crate) enum AttrValue {
    Lit(LitStr),
    Expr(Expr),
}

/// A parsed attribute: `name="value"`, `name={expr}` or `on:event={handler}`.
#[derive(Clone)]
pub(crate) struct Attribute {
    pub name: String,
    /// Set for `on:<event>` attributes.
    pub event: bool,
    pub value: AttrValue,
    pub span: Span,
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("event", &self.event)
            .finish()
    }
}

/// A child of an element.
#[derive(Clone)]
pub(crate) enum Node {
    Element(Element),
    Text(LitStr),
    Expr(Expr),
}

/// `<tag attrs... />` or `<tag attrs...> children </tag>`.
#[derive(Clone)]
pub(crate) struct Element {
    pub tag: String,
    pub attrs: Vec<Attribute>,
    pub children: Vec<Node>,
    pub self_closing: bool,
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("attrs", &self.attrs)
            .field("children", &self.children.len())
            .field("self_closing", &self.self_closing)
            .finish()
    }
}

/// The whole input: `cx, <root>...`.
struct HtmlInput {
    cx: Expr,
    roots: Vec<Element>,
}

/// Attributes that map to placement builder methods instead of DOM attributes.
const DIRECTIVES: &[&str] = &[
    "parent",
    "reset_parent",
    "replace_parent",
    "first_of_parent",
    "reconcile_parent",
];

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

impl Parse for HtmlInput {
    fn parse(input: ParseStream) -> Result<Self> {
        let cx: Expr = input.parse()?;
        input.parse::<Token![,]>()?;
        let mut roots = Vec::new();
        while !input.is_empty() {
            roots.push(parse_element(input)?);
        }
        Ok(HtmlInput { cx, roots })
    }
}

/// A possibly hyphenated name: `div`, `my-card`, `data-id`, `_`.
fn parse_name(input: ParseStream) -> Result<(String, Span)> {
    let first = Ident::parse_any(input)?;
    let span = first.span();
    let mut name = first.to_string();
    while input.peek(Token![-]) {
        input.parse::<Token![-]>()?;
        let next = Ident::parse_any(input)?;
        name.push('-');
        name.push_str(&next.to_string());
    }
    Ok((name, span))
}

fn parse_attribute(input: ParseStream) -> Result<Attribute> {
    let (mut name, span) = parse_name(input)?;
    let mut event = false;
    if name == "on" && input.peek(Token![:]) {
        input.parse::<Token![:]>()?;
        name = parse_name(input)?.0;
        event = true;
    }
    input.parse::<Token![=]>()?;
    let value = if input.peek(LitStr) {
        AttrValue::Lit(input.parse()?)
    } else {
        let content;
        braced!(content in input);
        AttrValue::Expr(content.parse()?)
    };
    if event && matches!(value, AttrValue::Lit(_)) {
        return Err(Error::new(span, "event handlers must be braced expressions"));
    }
    Ok(Attribute {
        name,
        event,
        value,
        span,
    })
}

/// Parse a single element from the token stream.
pub(crate) fn parse_element(input: ParseStream) -> Result<Element> {
    input.parse::<Token![<]>()?;
    let (tag, _) = parse_name(input)?;

    let mut attrs = Vec::new();
    loop {
        if input.peek(Token![/]) {
            input.parse::<Token![/]>()?;
            input.parse::<Token![>]>()?;
            return Ok(Element {
                tag,
                attrs,
                children: Vec::new(),
                self_closing: true,
            });
        }
        if input.peek(Token![>]) {
            input.parse::<Token![>]>()?;
            break;
        }
        attrs.push(parse_attribute(input)?);
    }

    let mut children = Vec::new();
    loop {
        if input.peek(Token![<]) && input.peek2(Token![/]) {
            input.parse::<Token![<]>()?;
            input.parse::<Token![/]>()?;
            let (closing, span) = parse_name(input)?;
            if closing != tag {
                return Err(Error::new(
                    span,
                    format!("mismatched closing tag: expected `</{tag}>`, found `</{closing}>`"),
                ));
            }
            input.parse::<Token![>]>()?;
            break;
        }
        if input.is_empty() {
            return Err(input.error(format!("unclosed element `<{tag}>`")));
        }
        if input.peek(Token![<]) {
            children.push(Node::Element(parse_element(input)?));
        } else if input.peek(LitStr) {
            children.push(Node::Text(input.parse()?));
        } else if input.peek(syn::token::Brace) {
            let content;
            braced!(content in input);
            children.push(Node::Expr(content.parse()?));
        } else {
            return Err(input.error("expected a child element, a string literal or a braced expression"));
        }
    }

    Ok(Element {
        tag,
        attrs,
        children,
        self_closing: false,
    })
}

// ---------------------------------------------------------------------------
// Code generation
// ---------------------------------------------------------------------------

fn value_tokens(value: &AttrValue) -> TokenStream {
    match value {
        AttrValue::Lit(lit) => quote! { #lit },
        AttrValue::Expr(expr) => quote! { #expr },
    }
}

fn generate_attrs(attrs: &[Attribute]) -> Option<TokenStream> {
    if attrs.is_empty() {
        return None;
    }
    let calls = attrs.iter().map(|attr| {
        let value = value_tokens(&attr.value);
        let name = &attr.name;
        if attr.event {
            quote! { .on(#name, #value) }
        } else if DIRECTIVES.contains(&name.as_str()) {
            let method = Ident::new(name, attr.span);
            quote! { .#method(#value) }
        } else {
            quote! { .attr(#name, #value) }
        }
    });
    Some(quote! {
        ::openscript::Arg::from(::openscript::Attrs::new() #(#calls)*)
    })
}

/// Generate a `Result`-propagating handle call for one element.
///
/// Expects `__cx` to be in scope.
fn generate_element(elem: &Element) -> TokenStream {
    let tag = &elem.tag;
    let mut args: Vec<TokenStream> = Vec::new();
    if let Some(attrs) = generate_attrs(&elem.attrs) {
        args.push(attrs);
    }
    for child in &elem.children {
        args.push(match child {
            Node::Element(inner) => {
                let call = generate_element(inner);
                quote! { ::openscript::Arg::from(#call) }
            }
            Node::Text(text) => quote! { ::openscript::Arg::from(#text) },
            Node::Expr(expr) => quote! { ::openscript::Arg::from(#expr) },
        });
    }
    quote! {
        __cx.handle(#tag, &[#(#args),*])?
    }
}

/// Entry point: generate code for the entire html! macro.
pub(crate) fn html_impl(input: TokenStream) -> Result<TokenStream> {
    let parsed: HtmlInput = syn::parse2(input)?;
    let cx = &parsed.cx;

    let body = match parsed.roots.as_slice() {
        [] => {
            return Err(Error::new(
                Span::call_site(),
                "html! macro requires at least one element",
            ))
        }
        [root] => generate_element(root),
        roots => {
            let calls = roots.iter().map(|root| {
                let call = generate_element(root);
                quote! { ::openscript::Arg::from(#call) }
            });
            quote! { __cx.handle("_", &[#(#calls),*])? }
        }
    };

    Ok(quote! {
        {
            let __cx: &::openscript::Context = &#cx;
            (|| -> ::openscript::Result<::openscript::Markup> {
                ::std::result::Result::Ok(#body)
            })()
        }
    })
}

// ===========================================================================
// Tests
// ===========================================================================
