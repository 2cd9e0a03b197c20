use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    Data, DeriveInput, Fields, Ident, LitStr, Type, parse_macro_input, spanned::Spanned,
};

/// Derives the `Message` mapping contract for a struct of `Option<T>` fields.
#[proc_macro_derive(Message, attributes(message, column))]
pub fn derive_message(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_message(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Derives `Enumeration` for a C-like enum, one code per variant.
#[proc_macro_derive(Enumeration)]
pub fn derive_enumeration(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_enumeration(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct MessageAttrOptions {
    table: Option<LitStr>,
    primary_key: Option<LitStr>,
}

#[derive(Clone, Copy, PartialEq)]
enum ColumnAttr {
    Plain,
    DateTime,
    Timestamp,
    Enumeration,
}

enum RuntimeTy {
    Text,
    Integer,
    Long,
    Float,
    Double,
    Boolean,
    Enum(Type),
}

struct MappedField {
    ident: Ident,
    name: String,
    column: ColumnAttr,
    runtime: RuntimeTy,
    inner_ty: Type,
}

fn expand_message(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = input.ident;
    let vis = input.vis;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            input.generics,
            "Message does not support generic structs",
        ));
    }

    let options = parse_message_options(&input.attrs)?;

    let data_struct = match input.data {
        Data::Struct(data) => data,
        _ => {
            return Err(syn::Error::new(
                struct_name.span(),
                "Message can only be derived for structs",
            ));
        }
    };

    let named_fields = match data_struct.fields {
        Fields::Named(fields) => fields,
        _ => {
            return Err(syn::Error::new(
                struct_name.span(),
                "Message requires named fields",
            ));
        }
    };

    let mut mapped = Vec::<MappedField>::new();
    for field in named_fields.named {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| syn::Error::new(field.span(), "Message requires named fields"))?;
        let column = parse_column_attr(&field.attrs)?;
        let Some(inner_ty) = option_inner_type(&field.ty) else {
            return Err(syn::Error::new(
                field.ty.span(),
                "Mapped fields must be Option<T>; unset means absent, not default",
            ));
        };
        let runtime = runtime_ty(&inner_ty, column)?;
        mapped.push(MappedField {
            name: ident.to_string(),
            ident,
            column,
            runtime,
            inner_ty,
        });
    }

    if mapped.is_empty() {
        return Err(syn::Error::new(
            struct_name.span(),
            "Message requires at least one field",
        ));
    }

    let builder_name = format_ident!("{}Builder", struct_name);
    let struct_name_lit = struct_name.to_string();

    let table_call = options.table.map(|lit| quote!(.table(#lit)));
    let primary_key_call = options.primary_key.map(|lit| quote!(.primary_key(#lit)));

    let descriptor_fields = mapped.iter().map(field_descriptor_expr);
    let collect_steps = mapped
        .iter()
        .enumerate()
        .map(|(index, field)| collect_step(index, field));
    let builder_arms = mapped.iter().map(builder_arm);
    let setters = mapped.iter().map(|field| {
        let ident = &field.ident;
        let inner_ty = &field.inner_ty;
        quote! {
            pub fn #ident(mut self, value: #inner_ty) -> Self {
                self.message.#ident = Some(value);
                self
            }
        }
    });
    let field_idents = mapped.iter().map(|field| &field.ident);

    Ok(quote! {
        #vis struct #builder_name {
            message: #struct_name,
        }

        impl #builder_name {
            #(#setters)*
        }

        impl ::protosql::MessageBuilder for #builder_name {
            type Message = #struct_name;

            fn set_field(
                &mut self,
                field: &::protosql::FieldDescriptor,
                value: ::protosql::Value,
            ) -> ::protosql::Result<()> {
                match field.name() {
                    #(#builder_arms)*
                    _ => {}
                }
                Ok(())
            }

            fn build(self) -> #struct_name {
                self.message
            }
        }

        impl ::protosql::Message for #struct_name {
            type Builder = #builder_name;

            fn descriptor() -> &'static ::protosql::MessageDescriptor {
                static DESCRIPTOR: ::std::sync::LazyLock<::protosql::MessageDescriptor> =
                    ::std::sync::LazyLock::new(|| {
                        ::protosql::MessageDescriptor::new(#struct_name_lit)
                            #table_call
                            #primary_key_call
                            #(.field(#descriptor_fields))*
                    });
                &DESCRIPTOR
            }

            fn new_builder() -> #builder_name {
                #builder_name {
                    message: #struct_name {
                        #(#field_idents: None,)*
                    },
                }
            }

            fn set_fields(
                &self,
            ) -> Vec<(&'static ::protosql::FieldDescriptor, ::protosql::Value)> {
                let descriptor = <Self as ::protosql::Message>::descriptor();
                let mut fields = Vec::new();
                #(#collect_steps)*
                fields
            }
        }
    })
}

fn field_descriptor_expr(field: &MappedField) -> TokenStream2 {
    let name = field.name.as_str();
    let kind = match field.column {
        ColumnAttr::Plain => quote!(::protosql::ColumnKind::Plain),
        ColumnAttr::DateTime => quote!(::protosql::ColumnKind::DateTime),
        ColumnAttr::Timestamp => quote!(::protosql::ColumnKind::Timestamp),
        ColumnAttr::Enumeration => quote!(::protosql::ColumnKind::Enum),
    };

    match &field.runtime {
        RuntimeTy::Enum(enum_ty) => quote! {
            {
                let values = <#enum_ty as ::protosql::Enumeration>::values();
                let default = values
                    .first()
                    .cloned()
                    .unwrap_or_else(|| ::protosql::EnumValue::new("", 0));
                ::protosql::FieldDescriptor::new(
                    #name,
                    #kind,
                    ::protosql::Value::Enum(default),
                )
                .with_enum_values(values)
            }
        },
        runtime => {
            let default = match runtime {
                RuntimeTy::Text => quote!(::protosql::Value::Text(String::new())),
                RuntimeTy::Integer => quote!(::protosql::Value::Integer(0)),
                RuntimeTy::Long => quote!(::protosql::Value::Long(0)),
                RuntimeTy::Float => quote!(::protosql::Value::Float(0.0)),
                RuntimeTy::Double => quote!(::protosql::Value::Double(0.0)),
                RuntimeTy::Boolean => quote!(::protosql::Value::Boolean(false)),
                RuntimeTy::Enum(_) => unreachable!(),
            };
            quote! {
                ::protosql::FieldDescriptor::new(#name, #kind, #default)
            }
        }
    }
}

fn collect_step(index: usize, field: &MappedField) -> TokenStream2 {
    let ident = &field.ident;
    let index = syn::Index::from(index);
    let value_expr = match &field.runtime {
        RuntimeTy::Text => quote!(::protosql::Value::Text(value.clone())),
        RuntimeTy::Integer => quote!(::protosql::Value::Integer(*value)),
        RuntimeTy::Long => quote!(::protosql::Value::Long(*value)),
        RuntimeTy::Float => quote!(::protosql::Value::Float(*value)),
        RuntimeTy::Double => quote!(::protosql::Value::Double(*value)),
        RuntimeTy::Boolean => quote!(::protosql::Value::Boolean(*value)),
        RuntimeTy::Enum(enum_ty) => quote! {
            ::protosql::Value::Enum(::protosql::EnumValue::new(
                <#enum_ty as ::protosql::Enumeration>::name(value),
                <#enum_ty as ::protosql::Enumeration>::number(value),
            ))
        },
    };
    quote! {
        if let Some(value) = &self.#ident {
            fields.push((&descriptor.fields()[#index], #value_expr));
        }
    }
}

fn builder_arm(field: &MappedField) -> TokenStream2 {
    let name = field.name.as_str();
    let ident = &field.ident;

    if let RuntimeTy::Enum(enum_ty) = &field.runtime {
        let enum_name = type_ident_string(enum_ty).unwrap_or_else(|| "ENUM".to_string());
        return quote! {
            #name => match value {
                ::protosql::Value::Enum(v) => {
                    match <#enum_ty as ::protosql::Enumeration>::from_number(v.number) {
                        Some(parsed) => self.message.#ident = Some(parsed),
                        None => {
                            return Err(::protosql::MapperError::TypeCoercion {
                                field: field.name().to_string(),
                                from: format!("unknown enum code {}", v.number),
                                target: #enum_name.to_string(),
                            });
                        }
                    }
                }
                other => {
                    return Err(::protosql::MapperError::TypeCoercion {
                        field: field.name().to_string(),
                        from: other.type_name().to_string(),
                        target: "ENUM".to_string(),
                    });
                }
            },
        };
    }

    let (variant, target) = match field.runtime {
        RuntimeTy::Text => (quote!(::protosql::Value::Text(v)), "TEXT"),
        RuntimeTy::Integer => (quote!(::protosql::Value::Integer(v)), "INTEGER"),
        RuntimeTy::Long => (quote!(::protosql::Value::Long(v)), "LONG"),
        RuntimeTy::Float => (quote!(::protosql::Value::Float(v)), "FLOAT"),
        RuntimeTy::Double => (quote!(::protosql::Value::Double(v)), "DOUBLE"),
        RuntimeTy::Boolean => (quote!(::protosql::Value::Boolean(v)), "BOOLEAN"),
        RuntimeTy::Enum(_) => unreachable!(),
    };
    quote! {
        #name => match value {
            #variant => self.message.#ident = Some(v),
            other => {
                return Err(::protosql::MapperError::TypeCoercion {
                    field: field.name().to_string(),
                    from: other.type_name().to_string(),
                    target: #target.to_string(),
                });
            }
        },
    }
}

fn expand_enumeration(input: DeriveInput) -> syn::Result<TokenStream2> {
    let enum_name = input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            input.generics,
            "Enumeration does not support generic enums",
        ));
    }

    let data_enum = match input.data {
        Data::Enum(data) => data,
        _ => {
            return Err(syn::Error::new(
                enum_name.span(),
                "Enumeration can only be derived for enums",
            ));
        }
    };

    if data_enum.variants.is_empty() {
        return Err(syn::Error::new(
            enum_name.span(),
            "Enumeration requires at least one variant",
        ));
    }

    let mut idents = Vec::<Ident>::new();
    let mut names = Vec::<String>::new();
    let mut numbers = Vec::<i32>::new();
    let mut next = 0i32;
    for variant in data_enum.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new(
                variant.span(),
                "Enumeration requires unit variants",
            ));
        }
        let number = match &variant.discriminant {
            Some((_, expr)) => parse_discriminant(expr)?,
            None => next,
        };
        next = number.wrapping_add(1);
        names.push(variant.ident.to_string());
        idents.push(variant.ident);
        numbers.push(number);
    }

    Ok(quote! {
        impl ::protosql::Enumeration for #enum_name {
            fn number(&self) -> i32 {
                match self {
                    #( Self::#idents => #numbers, )*
                }
            }

            fn name(&self) -> &'static str {
                match self {
                    #( Self::#idents => #names, )*
                }
            }

            fn from_number(number: i32) -> Option<Self> {
                match number {
                    #( #numbers => Some(Self::#idents), )*
                    _ => None,
                }
            }

            fn values() -> Vec<::protosql::EnumValue> {
                vec![
                    #( ::protosql::EnumValue::new(#names, #numbers), )*
                ]
            }
        }
    })
}

fn parse_message_options(attrs: &[syn::Attribute]) -> syn::Result<MessageAttrOptions> {
    let mut options = MessageAttrOptions {
        table: None,
        primary_key: None,
    };

    for attr in attrs {
        if !attr.path().is_ident("message") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let value = meta.value()?;
                options.table = Some(value.parse()?);
                return Ok(());
            }

            if meta.path.is_ident("primary_key") {
                let value = meta.value()?;
                options.primary_key = Some(value.parse()?);
                return Ok(());
            }

            Err(meta.error(
                "Unsupported message attribute. Supported: table = \"...\", primary_key = \"...\"",
            ))
        })?;
    }

    Ok(options)
}

fn parse_column_attr(attrs: &[syn::Attribute]) -> syn::Result<ColumnAttr> {
    let mut parsed: Option<ColumnAttr> = None;

    for attr in attrs {
        if !attr.path().is_ident("column") {
            continue;
        }

        if parsed.is_some() {
            return Err(syn::Error::new(
                attr.span(),
                "Duplicate #[column(...)] attribute on field",
            ));
        }

        let mut kind: Option<ColumnAttr> = None;
        attr.parse_nested_meta(|meta| {
            let next = if meta.path.is_ident("datetime") {
                ColumnAttr::DateTime
            } else if meta.path.is_ident("timestamp") {
                ColumnAttr::Timestamp
            } else if meta.path.is_ident("enumeration") {
                ColumnAttr::Enumeration
            } else {
                return Err(meta.error(
                    "Unsupported column attribute. Supported: datetime, timestamp, enumeration",
                ));
            };

            if kind.is_some() {
                return Err(meta.error("A field declares at most one column kind"));
            }
            kind = Some(next);
            Ok(())
        })?;

        parsed = Some(kind.ok_or_else(|| {
            syn::Error::new(
                attr.span(),
                "#[column(...)] requires one of: datetime, timestamp, enumeration",
            )
        })?);
    }

    Ok(parsed.unwrap_or(ColumnAttr::Plain))
}

fn runtime_ty(inner: &Type, column: ColumnAttr) -> syn::Result<RuntimeTy> {
    if column == ColumnAttr::Enumeration {
        return Ok(RuntimeTy::Enum(inner.clone()));
    }

    let runtime = match type_ident_string(inner).as_deref() {
        Some("String") => RuntimeTy::Text,
        Some("i32") => RuntimeTy::Integer,
        Some("i64") => RuntimeTy::Long,
        Some("f32") => RuntimeTy::Float,
        Some("f64") => RuntimeTy::Double,
        Some("bool") => RuntimeTy::Boolean,
        _ => {
            return Err(syn::Error::new(
                inner.span(),
                "Unsupported mapped field type. Supported: String, i32, i64, f32, f64, bool, \
                 or an Enumeration with #[column(enumeration)]",
            ));
        }
    };

    if matches!(column, ColumnAttr::DateTime | ColumnAttr::Timestamp)
        && !matches!(runtime, RuntimeTy::Long)
    {
        return Err(syn::Error::new(
            inner.span(),
            "datetime and timestamp fields store epoch milliseconds and must be Option<i64>",
        ));
    }

    Ok(runtime)
}

fn option_inner_type(ty: &Type) -> Option<Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    first_generic_type(segment)
}

fn first_generic_type(segment: &syn::PathSegment) -> Option<Type> {
    let syn::PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return None;
    };

    for arg in &arguments.args {
        if let syn::GenericArgument::Type(ty) = arg {
            return Some(ty.clone());
        }
    }
    None
}

fn type_ident_string(ty: &Type) -> Option<String> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    type_path
        .path
        .segments
        .last()
        .map(|segment| segment.ident.to_string())
}

fn parse_discriminant(expr: &syn::Expr) -> syn::Result<i32> {
    match expr {
        syn::Expr::Lit(lit) => {
            if let syn::Lit::Int(int) = &lit.lit {
                return int.base10_parse::<i32>();
            }
            Err(syn::Error::new(
                expr.span(),
                "Enumeration discriminants must be integer literals",
            ))
        }
        syn::Expr::Unary(unary) if matches!(unary.op, syn::UnOp::Neg(_)) => {
            Ok(-parse_discriminant(&unary.expr)?)
        }
        _ => Err(syn::Error::new(
            expr.span(),
            "Enumeration discriminants must be integer literals",
        )),
    }
}
