//! Procedural macros for **gptfn**
#![forbid(unsafe_code)]

use proc_macro::TokenStream;
use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro_error::{abort, proc_macro_error};
use proc_macro2::{Ident, Span};
use quote::{ToTokens, quote};
use syn::{
    Attribute, Expr, ExprLit, FnArg, ItemFn, Lit, LitInt, LitStr, Meta, Pat, PatIdent, PatType,
    ReturnType, Type, TypePath, parse::Parser, parse_macro_input,
};

/// Highest temperature the chat completions API accepts.
const MAX_TEMPERATURE: f32 = 2.0;

// ============================================================================
// ATTRIBUTE ARGUMENTS
// ============================================================================

/// `#[gpt(model = "...", temperature = 0.2, max_tokens = 64, client = path)]`
#[derive(Default)]
struct GptArgs {
    model: Option<LitStr>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    client: Option<syn::Path>,
}

fn parse_args(tokens: proc_macro2::TokenStream) -> syn::Result<GptArgs> {
    let mut args = GptArgs::default();

    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("model") {
            let model: LitStr = meta.value()?.parse()?;
            if model.value().trim().is_empty() {
                return Err(syn::Error::new_spanned(model, "model must not be empty"));
            }
            args.model = Some(model);
        } else if meta.path.is_ident("temperature") {
            let expr: Expr = meta.value()?.parse()?;
            args.temperature = Some(temperature(&expr)?);
        } else if meta.path.is_ident("max_tokens") {
            let lit: LitInt = meta.value()?.parse()?;
            let max_tokens = lit.base10_parse::<u32>()?;
            if max_tokens == 0 {
                return Err(syn::Error::new_spanned(
                    lit,
                    "max_tokens must be greater than zero",
                ));
            }
            args.max_tokens = Some(max_tokens);
        } else if meta.path.is_ident("client") {
            args.client = Some(meta.value()?.parse()?);
        } else {
            return Err(meta.error(
                "unsupported `#[gpt]` option; expected `model`, `temperature`, `max_tokens` or `client`",
            ));
        }
        Ok(())
    });

    parser.parse2(tokens)?;
    Ok(args)
}

fn temperature(expr: &Expr) -> syn::Result<f32> {
    let value = match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Float(f), ..
        }) => f.base10_parse::<f32>()?,
        Expr::Lit(ExprLit {
            lit: Lit::Int(i), ..
        }) => i.base10_parse::<f32>()?,
        _ => {
            return Err(syn::Error::new_spanned(
                expr,
                "temperature must be a number literal",
            ));
        }
    };

    if !(0.0..=MAX_TEMPERATURE).contains(&value) {
        return Err(syn::Error::new_spanned(
            expr,
            "temperature must be within 0.0..=2.0",
        ));
    }
    Ok(value)
}

// ============================================================================
// SIGNATURE INSPECTION
// ============================================================================

fn get_crate_path() -> proc_macro2::TokenStream {
    for candidate in ["gptfn", "gptfn_core"] {
        match crate_name(candidate) {
            Ok(FoundCrate::Itself) => return quote!(crate),
            Ok(FoundCrate::Name(name)) => {
                let ident = Ident::new(&name, Span::call_site());
                return quote!(::#ident);
            }
            Err(_) => continue,
        }
    }
    quote!(::gptfn)
}

/// Gather `///` doc-comments into a single string, dropping the one space
/// rustdoc puts after `///`. Deeper indentation is kept.
fn docs(attrs: &[Attribute]) -> String {
    attrs
        .iter()
        .filter_map(|a| match &a.meta {
            Meta::NameValue(nv) if a.path().is_ident("doc") => {
                if let Expr::Lit(ExprLit {
                    lit: Lit::Str(s), ..
                }) = &nv.value
                {
                    let line = s.value();
                    Some(line.strip_prefix(' ').unwrap_or(&line).to_owned())
                } else {
                    None
                }
            }
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Canonical name of a supported return type.
fn return_type_name(ty: &Type) -> Option<&'static str> {
    let Type::Path(TypePath { qself: None, path }) = ty else {
        return None;
    };
    let last = path.segments.last()?;
    if !last.arguments.is_none() {
        return None;
    }

    if last.ident == "String" {
        Some("String")
    } else if last.ident == "bool" {
        Some("bool")
    } else if last.ident == "CompletionStream" {
        Some("CompletionStream")
    } else {
        None
    }
}

/// Render a type the way it is usually written: `Vec<u32>`, not `Vec < u32 >`.
fn type_string(ty: &Type) -> String {
    let raw = ty.to_token_stream().to_string();
    let chars: Vec<char> = raw.chars().collect();
    let word = |c: char| c.is_alphanumeric() || c == '_';

    let mut out = String::with_capacity(raw.len());
    for (i, &c) in chars.iter().enumerate() {
        if c == ' ' {
            let prev = out.chars().last();
            let next = chars.get(i + 1).copied();
            let keep = match (prev, next) {
                (Some(p), Some(n)) => {
                    (word(p) && word(n)) || p == ',' || p == '+' || n == '+'
                }
                _ => false,
            };
            if !keep {
                continue;
            }
        }
        out.push(c);
    }
    out
}

// ============================================================================
// GPT ATTRIBUTE MACRO
// ============================================================================

/// Implement an `async fn` with a chat completion.
///
/// The doc comment is the behaviour specification, the parameters become the
/// prompt inputs, and the return type (`String`, `bool` or
/// `CompletionStream`) picks the decoder. The written body is discarded and
/// the return type becomes `Result<T, GptError>`.
///
/// ```ignore
/// #[gpt(model = "gpt-4", temperature = 0.2)]
/// /// Rewrite the sentence the way a pirate would say it.
/// async fn pirate(sentence: &str) -> String {}
/// ```
#[proc_macro_error]
#[proc_macro_attribute]
pub fn gpt(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = match parse_args(attr.into()) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error().into(),
    };
    let func: ItemFn = parse_macro_input!(item);
    expand(args, func).into()
}

fn expand(args: GptArgs, func: ItemFn) -> proc_macro2::TokenStream {
    let ItemFn {
        attrs, vis, sig, ..
    } = func;
    let fn_name = &sig.ident;
    let fn_name_str = fn_name.to_string();

    // ───────── Decoration-time checks ─────────
    if sig.asyncness.is_none() {
        abort!(sig.fn_token, "`#[gpt]` functions must be `async`");
    }
    if !sig.generics.params.is_empty() {
        abort!(sig.generics, "`#[gpt]` functions may not be generic");
    }

    if let Some(attr) = attrs.iter().find(|a| {
        matches!(&a.meta, Meta::NameValue(nv)
            if a.path().is_ident("doc") && !matches!(nv.value, Expr::Lit(_)))
    }) {
        abort!(
            attr,
            "`#[gpt]` needs the doc comment as literal text; computed docs such as `include_str!` are not supported"
        );
    }

    let doc = docs(&attrs);
    if doc.trim().is_empty() {
        abort!(
            fn_name,
            "`#[gpt]` functions need a doc comment describing what they do"
        );
    }
    let doc_lit = LitStr::new(&doc, Span::call_site());

    let ret_ty = match &sig.output {
        ReturnType::Type(_, ty) => (**ty).clone(),
        ReturnType::Default => abort!(
            sig,
            "`#[gpt]` functions must return `String`, `bool` or `CompletionStream`"
        ),
    };
    let Some(return_name) = return_type_name(&ret_ty) else {
        abort!(
            ret_ty,
            "unsupported return type; `#[gpt]` functions return `String`, `bool` or `CompletionStream`"
        );
    };

    // ───────── Inputs → declared parameters ─────────
    let (idents, types): (Vec<_>, Vec<_>) = sig
        .inputs
        .iter()
        .map(|arg| match arg {
            FnArg::Typed(PatType { pat, ty, .. }) => {
                let Pat::Ident(PatIdent { ident, .. }) = &**pat else {
                    abort!(pat, "`#[gpt]` supports only identifier patterns");
                };
                (ident.clone(), type_string(ty))
            }
            FnArg::Receiver(_) => abort!(arg, "`#[gpt]` may not be used on `self` methods"),
        })
        .unzip();
    let names: Vec<String> = idents.iter().map(|i| i.to_string()).collect();

    // ───────── Model settings ─────────
    let model = args.model.map(|m| quote!(.model(#m)));
    let temperature = args.temperature.map(|t| quote!(.temperature(#t)));
    let max_tokens = args.max_tokens.map(|n| {
        let n = proc_macro2::Literal::u32_unsuffixed(n);
        quote!(.max_tokens(#n))
    });

    let crate_path = get_crate_path();
    let client = args
        .client
        .map(|path| quote!(#path))
        .unwrap_or_else(|| quote!(#crate_path::default_client));

    // ───────── Macro expansion ─────────
    let mut wrapper_sig = sig.clone();
    wrapper_sig.output = syn::parse_quote! {
        -> ::core::result::Result<#ret_ty, #crate_path::GptError>
    };

    quote! {
        #(#attrs)*
        #vis #wrapper_sig {
            static __GPT_FUNCTION: #crate_path::once_cell::sync::Lazy<
                ::core::result::Result<#crate_path::GptFunction, #crate_path::ConfigurationError>,
            > = #crate_path::once_cell::sync::Lazy::new(|| {
                #crate_path::GptFunction::builder(#fn_name_str)
                    .doc(#doc_lit)
                    #( .param(#names, #types) )*
                    .returns(#return_name)
                    #model
                    #temperature
                    #max_tokens
                    .build()
            });

            #crate_path::inventory::submit! {
                #crate_path::FunctionRegistration::new(#fn_name_str, #doc_lit, || {
                    __GPT_FUNCTION.as_ref().map_err(::core::clone::Clone::clone)
                })
            }

            let __gpt_function = __GPT_FUNCTION
                .as_ref()
                .map_err(::core::clone::Clone::clone)?;
            let __gpt_client = #client()?;
            let __gpt_arguments = #crate_path::Arguments::new()
                #( .bind(#names, &#idents)? )*;

            __gpt_function
                .call::<#ret_ty>(&*__gpt_client, __gpt_arguments)
                .await
        }
    }
}
