use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, FnArg, ItemFn};

/// Attribute macro that turns a render function into a named component type.
///
/// The function must take exactly one `&mut RenderContext` argument and return
/// anything that implements `IntoNode`. The macro keeps the function as-is and
/// adds a unit struct, named after the function in `UpperCamelCase`, that
/// implements `Component` by calling it.
///
/// # Example
/// ```ignore
/// #[component]
/// fn counter(cx: &mut RenderContext) -> Node {
///     let (count, set_count) = cx.use_state(0);
///     element!("p", "Count: ", count).into_node()
/// }
///
/// App::new().mount(host, container, Counter);
/// ```
#[proc_macro_attribute]
pub fn component(attr: TokenStream, input: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        let attr = proc_macro2::TokenStream::from(attr);
        return syn::Error::new_spanned(attr, "#[component] takes no arguments")
            .to_compile_error()
            .into();
    }

    let func = parse_macro_input!(input as ItemFn);

    match expand(func) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(func: ItemFn) -> syn::Result<proc_macro2::TokenStream> {
    let sig = &func.sig;

    if sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            sig.asyncness,
            "components render synchronously and cannot be async",
        ));
    }

    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "component functions cannot be generic",
        ));
    }

    if sig.inputs.len() != 1 {
        return Err(syn::Error::new_spanned(
            &sig.inputs,
            "component functions take exactly one `&mut RenderContext` argument",
        ));
    }

    if let Some(FnArg::Receiver(receiver)) = sig.inputs.first() {
        return Err(syn::Error::new_spanned(
            receiver,
            "#[component] only applies to free functions",
        ));
    }

    let fn_name = &sig.ident;
    let struct_name_str = to_pascal_case(&fn_name.to_string());

    if struct_name_str == fn_name.to_string() {
        return Err(syn::Error::new_spanned(
            fn_name,
            "component function names must be snake_case",
        ));
    }

    let vis = &func.vis;
    let struct_name = syn::Ident::new(&struct_name_str, fn_name.span());
    let doc = format!("Component that renders through [`{}`].", fn_name);

    Ok(quote! {
        #func

        #[doc = #doc]
        #[derive(Clone, Copy, Debug, Default)]
        #vis struct #struct_name;

        impl ::slotview::Component for #struct_name {
            fn render(&self, cx: &mut ::slotview::RenderContext) -> ::slotview::Node {
                ::slotview::IntoNode::into_node(#fn_name(cx))
            }
        }
    })
}

fn to_pascal_case(s: &str) -> String {
    let mut result = String::new();

    for segment in s.split('_').filter(|segment| !segment.is_empty()) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            result.extend(first.to_uppercase());
            result.push_str(chars.as_str());
        }
    }

    result
}
