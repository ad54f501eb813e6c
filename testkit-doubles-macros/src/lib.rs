//! Procedural macros for testkit-doubles
//!
//! This crate provides the `#[responds]` attribute, which makes the methods of
//! an ordinary inherent `impl` block callable by name through
//! `testkit_doubles::Respond`, so the type can be wrapped in a `Mock` without
//! losing its native behavior.
//!
//! # Example
//!
//! ```rust,ignore
//! use testkit_doubles::prelude::*;
//!
//! struct Greeter;
//!
//! #[responds]
//! impl Greeter {
//!     fn greet(&self) -> String {
//!         "native".to_string()
//!     }
//! }
//!
//! let mock = Mock::wrap(Greeter);
//! assert_eq!(mock.call("greet", &[]).unwrap(), json!("native"));
//! ```

use std::collections::HashSet;

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{
    ext::IdentExt,
    parse::{Parse, ParseStream},
    parse_macro_input, Attribute, FnArg, Ident, ImplItem, ImplItemFn, ItemImpl, LitStr, Meta,
    Path, Token, Type,
};

const ATTR: &str = "responds";

/// Options on the `impl` block.
#[derive(Default)]
struct ImplConfig {
    /// Path to the `testkit_doubles` crate (default: `::testkit_doubles`)
    krate: Option<Path>,
    /// Receiver name used in error messages (default: the type name)
    name: Option<String>,
}

impl Parse for ImplConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut config = ImplConfig::default();

        while !input.is_empty() {
            let ident = Ident::parse_any(input)?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "crate" => {
                    config.krate = Some(input.parse()?);
                }
                "name" => {
                    let lit: LitStr = input.parse()?;
                    config.name = Some(lit.value());
                }
                _ => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {ident}"),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(config)
    }
}

/// Options on a single method.
#[derive(Default)]
struct MethodConfig {
    /// Dispatch name to use instead of the Rust method name
    rename: Option<String>,
    /// Leave the method out of the dispatch table
    skip: bool,
}

impl Parse for MethodConfig {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut config = MethodConfig::default();

        while !input.is_empty() {
            let ident: Ident = input.parse()?;

            match ident.to_string().as_str() {
                "skip" => config.skip = true,
                "rename" => {
                    input.parse::<Token![=]>()?;
                    let lit: LitStr = input.parse()?;
                    config.rename = Some(lit.value());
                }
                _ => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown attribute: {ident}"),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(config)
    }
}

/// Removes `#[responds(...)]` from a method and returns its options.
fn take_method_config(attrs: &mut Vec<Attribute>) -> syn::Result<MethodConfig> {
    let mut config = MethodConfig::default();
    let mut result = Ok(());

    attrs.retain(|attr| {
        if !attr.path().is_ident(ATTR) {
            return true;
        }
        if !matches!(attr.meta, Meta::Path(_)) {
            match attr.parse_args::<MethodConfig>() {
                Ok(parsed) => {
                    config.skip |= parsed.skip;
                    if parsed.rename.is_some() {
                        config.rename = parsed.rename;
                    }
                }
                Err(err) => result = Err(err),
            }
        }
        false
    });

    result.map(|()| config)
}

/// One dispatchable method.
struct Entry {
    dispatch_name: String,
    ident: Ident,
    params: Vec<Type>,
}

/// Validates a method signature and collects its parameter types.
fn entry_for(method: &ImplItemFn, dispatch_name: String) -> syn::Result<Entry> {
    let sig = &method.sig;

    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "generic methods cannot be dispatched by name; add #[responds(skip)]",
        ));
    }
    if sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            sig.asyncness,
            "async methods cannot be dispatched by name; add #[responds(skip)]",
        ));
    }

    let mut params = Vec::new();
    for arg in &sig.inputs {
        match arg {
            FnArg::Receiver(receiver) => {
                if receiver.reference.is_none() {
                    return Err(syn::Error::new_spanned(
                        receiver,
                        "methods taking `self` by value cannot be dispatched by name",
                    ));
                }
            }
            FnArg::Typed(pat_type) => match &*pat_type.ty {
                Type::Reference(_) | Type::ImplTrait(_) => {
                    return Err(syn::Error::new_spanned(
                        &pat_type.ty,
                        "dispatchable parameters must be owned, deserializable types",
                    ));
                }
                ty => params.push(ty.clone()),
            },
        }
    }

    Ok(Entry {
        dispatch_name,
        ident: sig.ident.clone(),
        params,
    })
}

/// Implements `testkit_doubles::Respond` for an inherent `impl` block.
///
/// Every method with a `&self` or `&mut self` receiver becomes callable by
/// name. Arguments are decoded from `Value`s with serde, so parameters must be
/// owned `DeserializeOwned` types; return values must be `Serialize` (`()`
/// becomes null). Associated functions without a receiver are left alone.
///
/// A method returning `Result<T, E>` is encoded like any other `Serialize`
/// value, as `{"Ok": ..}` or `{"Err": ..}`. Its `Err` is not turned into a
/// dispatch error, and `testkit_doubles::Error` itself cannot be returned
/// because it is not `Serialize`. Only arity, argument decoding and return
/// encoding failures come back as `Err` from `dispatch`.
///
/// # Configuration Options
///
/// On the `impl` block:
///
/// - `crate = path` - Path to `testkit_doubles` if it was renamed
/// - `name = "Greeter"` - Receiver name used in error messages
///
/// On a method:
///
/// - `#[responds(rename = "//")]` - Dispatch under a different name,
///   including names that are not Rust identifiers
/// - `#[responds(skip)]` - Keep the method out of the dispatch table
///
/// ```rust,ignore
/// use testkit_doubles::prelude::*;
///
/// struct Path;
///
/// #[responds(name = "Path")]
/// impl Path {
///     #[responds(rename = "//")]
///     fn join(&self, left: String, right: String) -> String {
///         format!("{left}/{right}")
///     }
///
///     #[responds(skip)]
///     fn helper<T>(&self, _: T) {}
/// }
/// ```
#[proc_macro_attribute]
pub fn responds(attr: TokenStream, item: TokenStream) -> TokenStream {
    let config = parse_macro_input!(attr as ImplConfig);
    let input = parse_macro_input!(item as ItemImpl);

    expand_responds(config, input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_responds(config: ImplConfig, mut input: ItemImpl) -> syn::Result<TokenStream2> {
    if let Some((_, trait_path, _)) = &input.trait_ {
        return Err(syn::Error::new_spanned(
            trait_path,
            "#[responds] must be placed on an inherent impl block",
        ));
    }

    let mut entries = Vec::new();
    let mut seen = HashSet::new();

    for item in &mut input.items {
        let ImplItem::Fn(method) = item else {
            continue;
        };
        let method_config = take_method_config(&mut method.attrs)?;
        if method_config.skip || method.sig.receiver().is_none() {
            continue;
        }

        let dispatch_name = method_config
            .rename
            .unwrap_or_else(|| method.sig.ident.to_string());
        if !seen.insert(dispatch_name.clone()) {
            return Err(syn::Error::new_spanned(
                &method.sig.ident,
                format!("duplicate dispatch name: {dispatch_name}"),
            ));
        }
        entries.push(entry_for(method, dispatch_name)?);
    }

    let krate = config
        .krate
        .unwrap_or_else(|| syn::parse_quote!(::testkit_doubles));
    let self_ty = &input.self_ty;
    let (impl_generics, _, where_clause) = input.generics.split_for_impl();

    let arms = entries.iter().map(|entry| {
        let name = LitStr::new(&entry.dispatch_name, Span::call_site());
        let ident = &entry.ident;
        let arity = entry.params.len();
        let args: Vec<Ident> = (0..arity).map(|i| format_ident!("__arg{}", i)).collect();
        let decodes = entry.params.iter().enumerate().map(|(index, ty)| {
            let arg = &args[index];
            quote! {
                let #arg = #krate::dispatch::coerce::decode_arg::<#ty>(__method, __args, #index)?;
            }
        });

        quote! {
            #name => ::core::option::Option::Some((|| -> #krate::Result<#krate::Value> {
                #krate::dispatch::coerce::check_arity(__method, __args, #arity)?;
                #(#decodes)*
                #krate::dispatch::coerce::encode_return(__method, self.#ident(#(#args),*))
            })()),
        }
    });

    let names: Vec<LitStr> = entries
        .iter()
        .map(|entry| LitStr::new(&entry.dispatch_name, Span::call_site()))
        .collect();
    let responds_to = if names.is_empty() {
        quote! { false }
    } else {
        quote! { ::core::matches!(__method, #(#names)|*) }
    };

    let receiver_name = config.name.map(|name| {
        quote! {
            fn receiver_name(&self) -> ::std::string::String {
                ::std::string::String::from(#name)
            }
        }
    });

    Ok(quote! {
        #input

        impl #impl_generics #krate::Respond for #self_ty #where_clause {
            #[allow(unused_variables, clippy::redundant_closure_call)]
            fn respond(
                &mut self,
                __method: &str,
                __args: &[#krate::Value],
            ) -> ::core::option::Option<#krate::Result<#krate::Value>> {
                match __method {
                    #(#arms)*
                    _ => ::core::option::Option::None,
                }
            }

            fn responds_to(&self, __method: &str) -> bool {
                #responds_to
            }

            #receiver_name
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impl_config_parse_empty() {
        let config: ImplConfig = syn::parse_str("").unwrap();
        assert!(config.krate.is_none());
        assert!(config.name.is_none());
    }

    #[test]
    fn test_impl_config_parse_multiple() {
        let config: ImplConfig =
            syn::parse_str("crate = my_doubles, name = \"Greeter\"").unwrap();
        assert!(config.krate.unwrap().is_ident("my_doubles"));
        assert_eq!(config.name, Some("Greeter".to_string()));
    }

    #[test]
    fn test_impl_config_rejects_unknown() {
        assert!(syn::parse_str::<ImplConfig>("mode = \"strict\"").is_err());
    }

    #[test]
    fn test_method_config_parse() {
        let config: MethodConfig = syn::parse_str("rename = \"//\"").unwrap();
        assert_eq!(config.rename, Some("//".to_string()));
        assert!(!config.skip);

        let config: MethodConfig = syn::parse_str("skip").unwrap();
        assert!(config.skip);
    }

    #[test]
    fn test_expand_strips_helper_attributes() {
        let input: ItemImpl = syn::parse_quote! {
            impl Greeter {
                #[responds(rename = "hello")]
                fn greet(&self, times: usize) -> String {
                    "hi".repeat(times)
                }

                #[responds(skip)]
                fn internal(&self) {}

                fn new() -> Self {
                    Greeter
                }
            }
        };

        let output = expand_responds(ImplConfig::default(), input)
            .unwrap()
            .to_string();

        assert!(!output.contains("[responds"));
        assert!(output.contains("\"hello\" =>"));
        assert!(!output.contains("\"internal\""));
        assert!(!output.contains("\"new\""));
        assert!(output.contains("decode_arg"));
        assert!(output.contains("usize"));
    }

    #[test]
    fn test_expand_rejects_trait_impls() {
        let input: ItemImpl = syn::parse_quote! {
            impl Clone for Greeter {
                fn clone(&self) -> Self {
                    Greeter
                }
            }
        };
        assert!(expand_responds(ImplConfig::default(), input).is_err());
    }

    #[test]
    fn test_expand_rejects_borrowed_params() {
        let input: ItemImpl = syn::parse_quote! {
            impl Greeter {
                fn greet(&self, name: &str) -> String {
                    name.to_string()
                }
            }
        };
        assert!(expand_responds(ImplConfig::default(), input).is_err());
    }

    #[test]
    fn test_expand_rejects_duplicate_names() {
        let input: ItemImpl = syn::parse_quote! {
            impl Greeter {
                fn greet(&self) {}

                #[responds(rename = "greet")]
                fn hello(&self) {}
            }
        };
        assert!(expand_responds(ImplConfig::default(), input).is_err());
    }
}
