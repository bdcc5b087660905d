//! Proc macros for openscript: the `html!` markup macro.
//!
//! This crate is not meant to be used directly; enable the `macros` feature on `openscript`.

use proc_macro::TokenStream;

mod html_macro;

/// JSX-like markup compiled into [`Context::handle`] calls.
///
/// The first argument is the context; the rest is one or more elements. The
/// expansion evaluates to `openscript::Result<openscript::Markup>`. Several
/// root elements are wrapped in a fragment.
///
/// # Syntax
///
/// - `<tag />`, `<tag> children </tag>`: elements; names may contain hyphens
/// - `name="literal"`, `name={expr}`: attributes
/// - `on:event={handler}`: node listener
/// - `parent`, `reset_parent`, `replace_parent`, `first_of_parent`,
///   `reconcile_parent`: placement directives
/// - children: elements, `"text"`, or `{expr}` (anything convertible to `Arg`)
///
/// Capitalized tag names resolve to components, as with `handle`.
///
/// # Example
///
/// ```ignore
/// let markup = html!(cx,
///     <ul class="todos" parent={body}>
///         <li>"first"</li>
///         <TodoItem>{&state}</TodoItem>
///     </ul>
/// )?;
/// ```
///
/// [`Context::handle`]: https://docs.rs/openscript
#[proc_macro]
pub fn html(input: TokenStream) -> TokenStream {
    html_macro::html_impl(input.into())
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
