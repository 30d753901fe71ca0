use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use std::collections::HashSet;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, Type, parse_macro_input, spanned::Spanned};

#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_entity(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct EntityOptions {
    type_name: Option<String>,
}

#[derive(Default)]
struct FieldOptions {
    skip: bool,
    readonly: bool,
    rename: Option<String>,
}

struct EntityField {
    ident: Ident,
    ty: Type,
    property_name: String,
    readonly: bool,
}

fn expand_entity(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            input.generics,
            "Entity does not support generic structs",
        ));
    }

    let options = parse_entity_options(&input.attrs)?;

    let data_struct = match input.data {
        Data::Struct(data) => data,
        _ => {
            return Err(syn::Error::new(
                struct_name.span(),
                "Entity can only be derived for structs",
            ));
        }
    };

    let named_fields = match data_struct.fields {
        Fields::Named(fields) => fields.named.into_iter().collect::<Vec<_>>(),
        Fields::Unit => Vec::new(),
        Fields::Unnamed(_) => {
            return Err(syn::Error::new(
                struct_name.span(),
                "Entity requires named fields",
            ));
        }
    };

    let mut fields = Vec::<EntityField>::new();
    let mut seen = HashSet::<String>::new();
    for field in named_fields {
        let field_options = parse_field_options(&field.attrs)?;
        if field_options.skip {
            continue;
        }

        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new(field.span(), "Entity requires named fields"))?;
        let property_name = field_options
            .rename
            .unwrap_or_else(|| ident.to_string().trim_start_matches("r#").to_string());

        if !seen.insert(property_name.clone()) {
            return Err(syn::Error::new(
                field.span(),
                format!("Duplicate entity property name '{}'", property_name),
            ));
        }

        fields.push(EntityField {
            ident,
            ty: field.ty,
            property_name,
            readonly: field_options.readonly,
        });
    }

    let specs = fields.iter().map(|field| {
        let ident = &field.ident;
        let ty = &field.ty;
        let name = field.property_name.as_str();
        let getter = quote! {
            |entity: &Self| ::editable_collections::PropertyValue::to_value(&entity.#ident)
        };

        if field.readonly {
            quote! {
                ::editable_collections::PropertySpec::typed::<#ty>(#name, #getter)
            }
        } else {
            quote! {
                ::editable_collections::PropertySpec::typed::<#ty>(#name, #getter)
                    .with_setter(|entity: &mut Self, value: ::editable_collections::Value| {
                        entity.#ident =
                            <#ty as ::editable_collections::PropertyValue>::from_value(value)?;
                        ::std::result::Result::Ok(())
                    })
            }
        }
    });

    let type_name_method = options.type_name.map(|type_name| {
        quote! {
            fn type_name() -> &'static str {
                #type_name
            }
        }
    });

    Ok(quote! {
        impl ::editable_collections::Entity for #struct_name {
            #type_name_method

            fn properties() -> ::std::vec::Vec<::editable_collections::PropertySpec<Self>> {
                ::std::vec![#(#specs),*]
            }
        }
    })
}

fn parse_entity_options(attrs: &[syn::Attribute]) -> syn::Result<EntityOptions> {
    let mut options = EntityOptions::default();

    for attr in attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value = meta.value()?;
                let lit: LitStr = value.parse()?;
                options.type_name = Some(lit.value());
                return Ok(());
            }

            Err(meta.error("Unsupported #[entity(...)] option on struct. Supported: name = \"...\""))
        })?;
    }

    Ok(options)
}

fn parse_field_options(attrs: &[syn::Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();

    for attr in attrs {
        if !attr.path().is_ident("entity") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                options.skip = true;
                return Ok(());
            }

            if meta.path.is_ident("readonly") {
                options.readonly = true;
                return Ok(());
            }

            if meta.path.is_ident("rename") {
                let value = meta.value()?;
                let lit: LitStr = value.parse()?;
                options.rename = Some(lit.value());
                return Ok(());
            }

            Err(meta.error(
                "Unsupported #[entity(...)] option. Supported: skip, readonly, rename = \"...\"",
            ))
        })?;

        if options.skip && (options.readonly || options.rename.is_some()) {
            return Err(syn::Error::new(
                attr.span(),
                "#[entity(skip)] cannot be combined with other options",
            ));
        }
    }

    Ok(options)
}
