use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, LitStr, Type};

pub fn derive_command(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let attrs = match parse_struct_attrs(&input) {
        Ok(attrs) => attrs,
        Err(err) => return err.to_compile_error().into(),
    };

    let command_name = attrs.name.unwrap_or_else(|| name.to_string());
    let response = attrs
        .response
        .map(|ty| quote! { #ty })
        .unwrap_or_else(|| quote! { microbus::Value });

    let expanded = quote! {
        impl #impl_generics microbus::Command for #name #ty_generics #where_clause {
            const NAME: &'static str = #command_name;
            type Response = #response;
        }
    };

    TokenStream::from(expanded)
}

#[derive(Default)]
struct CommandAttrs {
    name: Option<String>,
    response: Option<Type>,
}

fn parse_struct_attrs(input: &DeriveInput) -> syn::Result<CommandAttrs> {
    let mut attrs = CommandAttrs::default();

    for attr in &input.attrs {
        if !attr.path().is_ident("command") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.name = Some(value.value());
            } else if meta.path.is_ident("response") {
                let value: LitStr = meta.value()?.parse()?;
                attrs.response = Some(value.parse()?);
            } else {
                return Err(meta.error("unsupported command attribute, expected `name` or `response`"));
            }
            Ok(())
        })?;
    }

    Ok(attrs)
}
