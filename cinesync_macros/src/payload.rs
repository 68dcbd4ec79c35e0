use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, LitStr};

struct PayloadArgs {
    collection: Option<String>,
    owner: Option<String>,
    parent: Option<String>,
    subject: Option<String>,
}

pub fn derive_payload(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let args = match extract_args(&input) {
        Ok(args) => args,
        Err(err) => return err.to_compile_error().into(),
    };

    let snake = to_snake_case(&name.to_string());
    // Default: snake_case struct name + "s"
    let collection = args.collection.unwrap_or_else(|| format!("{}s", snake));
    let owner = args.owner.unwrap_or_else(|| "user_id".to_string());
    // Default: the record hangs off its owner
    let parent = args.parent.unwrap_or_else(|| owner.clone());
    let subject = args.subject.unwrap_or_else(|| snake.replace('_', " "));

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics cinesync::Payload for #name #ty_generics #where_clause {
            const COLLECTION: &'static str = #collection;
            const OWNER_FIELD: &'static str = #owner;
            const PARENT_FIELD: &'static str = #parent;
            const SUBJECT: &'static str = #subject;
        }
    };

    TokenStream::from(expanded)
}

fn extract_args(input: &DeriveInput) -> syn::Result<PayloadArgs> {
    let mut args = PayloadArgs {
        collection: None,
        owner: None,
        parent: None,
        subject: None,
    };

    for attr in &input.attrs {
        if !attr.path().is_ident("payload") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let slot = if meta.path.is_ident("collection") {
                &mut args.collection
            } else if meta.path.is_ident("owner") {
                &mut args.owner
            } else if meta.path.is_ident("parent") {
                &mut args.parent
            } else if meta.path.is_ident("subject") {
                &mut args.subject
            } else {
                return Err(meta.error("expected `collection`, `owner`, `parent` or `subject`"));
            };
            let value: LitStr = meta.value()?.parse()?;
            *slot = Some(value.value());
            Ok(())
        })?;
    }

    Ok(args)
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}
