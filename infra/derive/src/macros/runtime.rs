use proc_macro2::TokenStream;
use quote::quote;
use syn::{Error, ItemFn, ReturnType, Type};

/// Expands the `#[carve_runtime::main]` attribute macro.
#[must_use]
pub fn expand_main(args: TokenStream, input: ItemFn) -> TokenStream {
    if input.sig.asyncness.is_none() {
        return Error::new_spanned(
            &input.sig.ident,
            "The #[carve_runtime::main] attribute can only be used on async functions",
        )
        .to_compile_error();
    }

    if !returns_result(&input.sig.output) {
        return Error::new_spanned(
            &input.sig.output,
            "The #[carve_runtime::main] attribute requires a Result return type",
        )
        .to_compile_error();
    }

    let runtime_call = match parse_profile(args) {
        Ok(profile) => profile,
        Err(err) => return err,
    };

    let ItemFn { attrs, vis, sig, block } = input;
    let name = &sig.ident;
    let output = &sig.output;

    quote! {
        #(#attrs)*
        #vis fn #name() #output {
            let config = #runtime_call;
            let rt = ::carve_runtime::build_runtime_with_config(&config)?;
            rt.block_on(async #block)
        }
    }
}

fn parse_profile(args: TokenStream) -> Result<TokenStream, TokenStream> {
    if args.is_empty() {
        return Ok(quote! { ::carve_runtime::RuntimeConfig::default() });
    }

    let ident: syn::Ident = syn::parse2(args).map_err(|err| err.to_compile_error())?;
    match ident.to_string().as_str() {
        "parallel_builds" => Ok(quote! { ::carve_runtime::RuntimeConfig::parallel_builds() }),
        "single_build" => Ok(quote! { ::carve_runtime::RuntimeConfig::single_build() }),
        "default" => Ok(quote! { ::carve_runtime::RuntimeConfig::default() }),
        _ => Err(Error::new_spanned(
            ident,
            "Unknown runtime profile. Use: parallel_builds, single_build, or default",
        )
        .to_compile_error()),
    }
}

fn returns_result(output: &ReturnType) -> bool {
    let ReturnType::Type(_, ty) = output else {
        return false;
    };
    let Type::Path(path) = &**ty else {
        return false;
    };
    path.path.segments.last().is_some_and(|seg| seg.ident == "Result")
}
