use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DataStruct, DeriveInput, Field, Fields};

/// `Cx4` is the only type in this workspace that derives `PartialClone`, and it's always a
/// plain named-field struct with at most one `#[partial_clone(default)]` field (its ROM image,
/// which a partial clone should not duplicate). Enum support and the `partial` attribute variant
/// that the upstream macro also handles are dropped here since nothing in this workspace needs
/// them.
pub fn partial_clone(input: TokenStream) -> TokenStream {
    let input: DeriveInput = syn::parse(input).expect("Unable to parse input");

    let type_ident = &input.ident;
    let body = match &input.data {
        Data::Struct(data) => partial_clone_struct_body(data),
        _ => panic!("PartialClone only supports named-field structs; {type_ident} is not one"),
    };

    let (impl_generics, type_generics, where_clause) = input.generics.split_for_impl();

    let generated = quote! {
        impl #impl_generics ::jgenesis_common::frontend::PartialClone for #type_ident #type_generics #where_clause {
            fn partial_clone(&self) -> Self {
                #body
            }
        }
    };

    generated.into()
}

fn partial_clone_struct_body(data: &DataStruct) -> proc_macro2::TokenStream {
    let Fields::Named(fields) = &data.fields else {
        panic!("PartialClone only supports named-field structs");
    };

    let constructor_fields: Vec<_> = fields
        .named
        .iter()
        .map(|field| {
            let field_ident = field.ident.as_ref().expect("Nested inside Fields::Named match arm");
            if is_default_field(field) {
                quote! { #field_ident: ::std::default::Default::default() }
            } else {
                quote! { #field_ident: ::std::clone::Clone::clone(&self.#field_ident) }
            }
        })
        .collect();

    quote! {
        Self {
            #(#constructor_fields,)*
        }
    }
}

fn is_default_field(field: &Field) -> bool {
    field.attrs.iter().any(|attr| {
        if !attr.path().is_ident("partial_clone") {
            return false;
        }

        let mut default = false;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                default = true;
                Ok(())
            } else {
                Err(meta.error("nested partial_clone attribute must be 'default'"))
            }
        })
        .expect("partial_clone attribute missing nested 'default' attribute");
        default
    })
}
