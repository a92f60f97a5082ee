use fxhash::FxHashSet;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Field, Fields, FieldsNamed, Ident, Type, Variant};

const CONTEXT_FIELD: &str = "context";
const INTERNAL_VARIANT: &str = "Internal";

struct VariantMeta<'a> {
    ident: &'a Ident,
    source: Option<&'a Field>,
    has_context: bool,
    cfg_attrs: Vec<Attribute>,
}

impl VariantMeta<'_> {
    fn source_parts(&self) -> Option<(&Ident, &Type)> {
        let field = self.source?;
        Some((field.ident.as_ref()?, &field.ty))
    }
}

pub fn expand_derive(input: DeriveInput) -> TokenStream {
    let name = &input.ident;
    let trait_name = format_ident!("{}Ext", name);

    let Data::Enum(data) = &input.data else {
        return quote! { compile_error!("carve_error can only be applied to enums"); };
    };

    let variants = match data.variants.iter().map(parse_variant).collect::<Result<Vec<_>, _>>() {
        Ok(v) => v,
        Err(err) => return err,
    };
    if let Some(err) = check_source_context(&variants) {
        return err;
    }

    let extra_derives = missing_derives(&input);
    let context_impl = generate_context_trait(name, &trait_name, &variants);
    let from_impls = variants.iter().filter_map(|v| generate_from_impl(name, &trait_name, v));
    let internal_impls = generate_internal_impls(name, &variants);
    let kind_impl = generate_kind(name, &variants);

    quote! {
        #[allow(non_shorthand_field_patterns)]
        #extra_derives
        #input

        #context_impl
        #(#from_impls)*
        #internal_impls
        #kind_impl

        #[allow(dead_code)]
        fn format_context(context: &Option<std::borrow::Cow<'static, str>>) -> std::borrow::Cow<'static, str> {
            context.as_ref().map_or(std::borrow::Cow::Borrowed(""), |c| std::borrow::Cow::Owned(format!(" ({c})")))
        }
    }
}

fn parse_variant(v: &Variant) -> Result<VariantMeta<'_>, TokenStream> {
    let Fields::Named(fields) = &v.fields else {
        return Err(syn::Error::new_spanned(
            v,
            "carve_error requires named fields so source/context can be wired",
        )
        .to_compile_error());
    };

    Ok(VariantMeta {
        ident: &v.ident,
        source: find_source_field(fields),
        has_context: find_context_field(fields)?.is_some(),
        cfg_attrs: v.attrs.iter().filter(|attr| attr.path().is_ident("cfg")).cloned().collect(),
    })
}

fn find_context_field(fields: &FieldsNamed) -> Result<Option<&Field>, TokenStream> {
    let Some(field) =
        fields.named.iter().find(|f| f.ident.as_ref().is_some_and(|i| i == CONTEXT_FIELD))
    else {
        return Ok(None);
    };

    if is_context_type(&field.ty) {
        Ok(Some(field))
    } else {
        Err(syn::Error::new_spanned(&field.ty, "context field must be Option<Cow<'static, str>>")
            .to_compile_error())
    }
}

fn find_source_field(fields: &FieldsNamed) -> Option<&Field> {
    fields.named.iter().find(|field| {
        field.ident.as_ref().is_some_and(|ident| ident == "source")
            || field_has_attr(field, "source")
            || field_has_attr(field, "from")
    })
}

fn missing_derives(input: &DeriveInput) -> TokenStream {
    let derived = derived_trait_names(input);
    let mut tokens = Vec::new();
    if !derived.contains("Debug") {
        tokens.push(quote! { Debug });
    }
    if !derived.contains("Error") {
        tokens.push(quote! { ::thiserror::Error });
    }
    if tokens.is_empty() { quote! {} } else { quote! { #[derive(#(#tokens),*)] } }
}

fn generate_context_trait(
    name: &Ident,
    trait_name: &Ident,
    variants: &[VariantMeta<'_>],
) -> TokenStream {
    let arms = variants.iter().filter(|v| v.has_context).map(|v| {
        let cfg_attrs = &v.cfg_attrs;
        let ident = v.ident;
        quote! { #(#cfg_attrs)* #name::#ident { context: c, .. } => *c = Some(context.into()), }
    });

    quote! {
        pub trait #trait_name<T> {
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Result<T, #name>;
        }

        #[automatically_derived]
        impl<T> #trait_name<T> for Result<T, #name> {
            #[inline]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Self {
                self.map_err(|mut e| {
                    match &mut e {
                        #( #arms )*
                        _ => {}
                    }
                    e
                })
            }
        }
    }
}

fn generate_from_impl(
    name: &Ident,
    trait_name: &Ident,
    v: &VariantMeta<'_>,
) -> Option<TokenStream> {
    if v.ident == INTERNAL_VARIANT {
        return None;
    }
    let (source_field, source_ty) = v.source_parts()?;
    let v_ident = v.ident;
    let cfg_attrs = &v.cfg_attrs;

    Some(quote! {
        #(#cfg_attrs)*
        #[automatically_derived]
        impl From<#source_ty> for #name {
            #[inline]
            fn from(#source_field: #source_ty) -> Self { Self::#v_ident { #source_field, context: None } }
        }

        #(#cfg_attrs)*
        impl<T> #trait_name<T> for std::result::Result<T, #source_ty> {
            #[inline]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> std::result::Result<T, #name> {
                self.map_err(|#source_field| #name::#v_ident { #source_field, context: Some(context.into()) })
            }
        }
    })
}

fn generate_internal_impls(name: &Ident, variants: &[VariantMeta<'_>]) -> TokenStream {
    let Some(internal) = variants.iter().find(|v| v.ident == INTERNAL_VARIANT) else {
        return quote!();
    };
    let cfg_attrs = &internal.cfg_attrs;

    quote! {
        #(#cfg_attrs)*
        impl From<&'static str> for #name {
            #[inline]
            fn from(s: &'static str) -> Self { Self::Internal { message: std::borrow::Cow::Borrowed(s), context: None } }
        }
        #(#cfg_attrs)*
        impl From<String> for #name {
            #[inline]
            fn from(s: String) -> Self { Self::Internal { message: std::borrow::Cow::Owned(s), context: None } }
        }
    }
}

fn generate_kind(name: &Ident, variants: &[VariantMeta<'_>]) -> TokenStream {
    let arms = variants.iter().map(|v| {
        let cfg_attrs = &v.cfg_attrs;
        let ident = v.ident;
        let label = ident.to_string();
        quote! { #(#cfg_attrs)* Self::#ident { .. } => #label, }
    });

    quote! {
        #[automatically_derived]
        impl #name {
            /// Name of the error variant, stable across releases.
            #[must_use]
            pub const fn kind(&self) -> &'static str {
                match self {
                    #( #arms )*
                }
            }
        }
    }
}

fn field_has_attr(field: &Field, name: &str) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident(name))
}

fn derived_trait_names(input: &DeriveInput) -> FxHashSet<String> {
    let mut traits = FxHashSet::default();

    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("derive")) {
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(seg) = meta.path.segments.last() {
                traits.insert(seg.ident.to_string());
            }
            Ok(())
        });
    }

    traits
}

fn check_source_context(variants: &[VariantMeta<'_>]) -> Option<TokenStream> {
    variants.iter().find(|v| v.source.is_some() && !v.has_context).map(|v| {
        syn::Error::new_spanned(
            v.ident,
            "carve_error requires `context: Option<Cow<'static, str>>` for variants with a source",
        )
        .to_compile_error()
    })
}

/// Matches `Option<Cow<'static, str>>` regardless of path prefix.
fn is_context_type(ty: &Type) -> bool {
    let Some(option) = last_segment(ty).filter(|seg| seg.ident == "Option") else {
        return false;
    };
    let Some(cow) = first_type_arg(&option.arguments)
        .and_then(last_segment)
        .filter(|seg| seg.ident == "Cow")
    else {
        return false;
    };
    let syn::PathArguments::AngleBracketed(args) = &cow.arguments else {
        return false;
    };
    let mut args = args.args.iter();
    let Some(syn::GenericArgument::Lifetime(lt)) = args.next() else {
        return false;
    };
    let Some(syn::GenericArgument::Type(inner)) = args.next() else {
        return false;
    };
    lt.ident == "static" && last_segment(inner).is_some_and(|seg| seg.ident == "str")
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    let Type::Path(path) = ty else {
        return None;
    };
    path.path.segments.last()
}

fn first_type_arg(args: &syn::PathArguments) -> Option<&Type> {
    let syn::PathArguments::AngleBracketed(args) = args else {
        return None;
    };
    match args.args.first()? {
        syn::GenericArgument::Type(ty) => Some(ty),
        _ => None,
    }
}
