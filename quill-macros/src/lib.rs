//! Shape derive macros for Quill.
//!
//! `#[derive(Model)]`, `#[derive(View)]`, and `#[derive(Filter)]` turn a
//! struct with named fields into a shape: an ordered field table plus
//! the bind or extract code the engines dispatch through.
//! `#[derive(Enumeration)]` maps a fieldless enum to INTEGER ordinals
//! and TEXT variant names.
//!
//! Field annotations:
//!
//! ```ignore
//! #[derive(Model)]
//! struct User {
//!     #[quill(cast = "blob")]
//!     uuid: Vec<u8>,
//!     #[quill(cast = "text")]
//!     name: String,
//!     age: i64,
//!     #[quill(cast = "blob")]
//!     bio: Option<Vec<u8>>,
//! }
//! ```
//!
//! Malformed shapes (a model without a non-optional blob-cast `uuid`,
//! a cast on a view, an annotated filter field) fail compilation.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Ident, LitStr, Type};

// ============================================================================
// Field analysis
// ============================================================================

/// Descriptor a field resolved to, mirroring the core vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Int,
    Bool,
    Float,
    Slice,
    Text,
    IntEnum,
    TextEnum,
    Json,
    TextBytes,
    Blob,
    AnyEnum,
    AnyJson,
}

impl FieldKind {
    fn descriptor_tokens(self) -> TokenStream2 {
        let variant = match self {
            FieldKind::Int => quote!(Int),
            FieldKind::Bool => quote!(Bool),
            FieldKind::Float => quote!(Float),
            FieldKind::Slice => quote!(Slice),
            FieldKind::Text => quote!(Text),
            FieldKind::IntEnum => quote!(IntEnum),
            FieldKind::TextEnum => quote!(TextEnum),
            FieldKind::Json => quote!(Json),
            FieldKind::TextBytes => quote!(TextBytes),
            FieldKind::Blob => quote!(Blob),
            FieldKind::AnyEnum => quote!(AnyEnum),
            FieldKind::AnyJson => quote!(AnyJson),
        };
        quote!(::quill_core::types::Descriptor::#variant)
    }
}

/// One analysed struct field.
struct ShapeField {
    ident: Ident,
    label: String,
    kind: FieldKind,
    optional: bool,
}

/// The `#[quill(...)]` annotation on a field, if any.
enum Annotation {
    None,
    Cast(String),
    Any(String),
}

fn parse_annotation(field: &syn::Field) -> syn::Result<Annotation> {
    let mut annotation = Annotation::None;
    for attr in &field.attrs {
        if !attr.path().is_ident("quill") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let value: LitStr = meta.value()?.parse()?;
            if meta.path.is_ident("cast") {
                annotation = Annotation::Cast(value.value());
                Ok(())
            } else if meta.path.is_ident("any") {
                annotation = Annotation::Any(value.value());
                Ok(())
            } else {
                Err(meta.error("expected `cast = \"...\"` or `any = \"...\"`"))
            }
        })?;
    }
    Ok(annotation)
}

/// Unwrap `Option<T>`, reporting whether the field is optional.
fn unwrap_optional(ty: &Type) -> (bool, &Type) {
    if let Type::Path(path) = ty {
        if let Some(segment) = path.path.segments.last() {
            if segment.ident == "Option" {
                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
                        return (true, inner);
                    }
                }
            }
        }
    }
    (false, ty)
}

fn is_named(ty: &Type, name: &str) -> bool {
    if let Type::Path(path) = ty {
        if let Some(segment) = path.path.segments.last() {
            return segment.ident == name && segment.arguments.is_empty();
        }
    }
    false
}

fn is_byte_vec(ty: &Type) -> bool {
    if let Type::Path(path) = ty {
        if let Some(segment) = path.path.segments.last() {
            if segment.ident == "Vec" {
                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(syn::GenericArgument::Type(inner)) = args.args.first() {
                        return is_named(inner, "u8");
                    }
                }
            }
        }
    }
    false
}

/// Which shape a derive is analysing; drives annotation legality and
/// scalar inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShapeRole {
    Model,
    View,
    Filter,
}

fn analyse_field(field: &syn::Field, role: ShapeRole) -> syn::Result<ShapeField> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "shape fields must be named"))?;
    let label = ident.to_string();
    let (optional, inner) = unwrap_optional(&field.ty);
    let annotation = parse_annotation(field)?;

    let kind = match (&annotation, role) {
        (Annotation::Cast(cast), ShapeRole::Model) => match cast.as_str() {
            "int_enum" => FieldKind::IntEnum,
            "text_enum" => FieldKind::TextEnum,
            "json" => FieldKind::Json,
            "text" => FieldKind::TextBytes,
            "blob" => FieldKind::Blob,
            other => {
                return Err(syn::Error::new_spanned(
                    field,
                    format!(
                        "unknown cast '{other}'; expected int_enum, text_enum, json, text, or blob"
                    ),
                ))
            }
        },
        (Annotation::Any(any), ShapeRole::View) => match any.as_str() {
            "enum" => FieldKind::AnyEnum,
            "json" => FieldKind::AnyJson,
            other => {
                return Err(syn::Error::new_spanned(
                    field,
                    format!("unknown any '{other}'; expected enum or json"),
                ))
            }
        },
        (Annotation::Cast(_), _) => {
            return Err(syn::Error::new_spanned(
                field,
                "cast annotations belong to model shapes",
            ))
        }
        (Annotation::Any(_), _) => {
            return Err(syn::Error::new_spanned(
                field,
                "any annotations belong to view shapes",
            ))
        }
        (Annotation::None, _) => infer_scalar(field, inner, role)?,
    };

    Ok(ShapeField {
        ident,
        label,
        kind,
        optional,
    })
}

fn infer_scalar(field: &syn::Field, ty: &Type, role: ShapeRole) -> syn::Result<FieldKind> {
    if is_named(ty, "i64") {
        return Ok(FieldKind::Int);
    }
    if is_named(ty, "bool") {
        return Ok(FieldKind::Bool);
    }
    if is_named(ty, "f64") {
        return Ok(FieldKind::Float);
    }
    match role {
        ShapeRole::Model => Err(syn::Error::new_spanned(
            field,
            "model fields beyond i64/bool/f64 need a #[quill(cast = \"...\")] annotation",
        )),
        ShapeRole::View => {
            if is_byte_vec(ty) {
                Ok(FieldKind::Slice)
            } else {
                Err(syn::Error::new_spanned(
                    field,
                    "view fields are i64, bool, f64, Vec<u8>, or #[quill(any = \"...\")]",
                ))
            }
        }
        ShapeRole::Filter => {
            if is_named(ty, "String") {
                Ok(FieldKind::Text)
            } else if is_byte_vec(ty) {
                Ok(FieldKind::Slice)
            } else {
                Err(syn::Error::new_spanned(
                    field,
                    "filter fields are raw scalars: i64, bool, f64, String, or Vec<u8>",
                ))
            }
        }
    }
}

fn shape_fields(input: &DeriveInput, role: ShapeRole) -> syn::Result<Vec<ShapeField>> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(input, "shapes are structs"));
    };
    let Fields::Named(named) = &data.fields else {
        return Err(syn::Error::new_spanned(
            input,
            "shapes are structs with named fields",
        ));
    };
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "shapes cannot be generic",
        ));
    }
    named
        .named
        .iter()
        .map(|field| analyse_field(field, role))
        .collect()
}

fn field_table(fields: &[ShapeField]) -> TokenStream2 {
    let entries = fields.iter().map(|f| {
        let label = &f.label;
        let descriptor = f.kind.descriptor_tokens();
        let optional = f.optional;
        quote!(::quill_core::shape::FieldDef::new(#label, #descriptor, #optional))
    });
    quote!(&[ #(#entries),* ])
}

// ============================================================================
// Model derive
// ============================================================================

fn validate_model(input: &DeriveInput, fields: &[ShapeField]) -> syn::Result<()> {
    let Some(uuid) = fields.iter().find(|f| f.label == "uuid") else {
        return Err(syn::Error::new_spanned(
            input,
            "model shapes need a field labelled 'uuid'",
        ));
    };
    if uuid.optional {
        return Err(syn::Error::new_spanned(
            input,
            "the 'uuid' field cannot be optional",
        ));
    }
    if uuid.kind != FieldKind::Blob {
        return Err(syn::Error::new_spanned(
            input,
            "the 'uuid' field must be annotated #[quill(cast = \"blob\")]",
        ));
    }
    Ok(())
}

/// Bind expression for a borrowed carrier `x`.
fn bind_expr(kind: FieldKind, x: TokenStream2) -> TokenStream2 {
    match kind {
        FieldKind::Int => quote!(::quill_core::types::Bindable::Int(*#x)),
        FieldKind::Bool => quote!(::quill_core::types::Bindable::Bool(*#x)),
        FieldKind::Float => quote!(::quill_core::types::Bindable::Float(*#x)),
        FieldKind::IntEnum => quote!(::quill_core::types::Bindable::Ordinal(
            ::quill_core::shape::Enumeration::ordinal(#x)
        )),
        FieldKind::TextEnum => quote!(::quill_core::types::Bindable::VariantName(
            ::quill_core::shape::Enumeration::variant_name(#x)
        )),
        FieldKind::Json => quote!(::quill_core::types::Bindable::Json(
            ::quill_core::serde_json::to_string(#x)?
        )),
        FieldKind::TextBytes => quote!(::quill_core::types::Bindable::Text(#x.as_str())),
        FieldKind::Blob => quote!(::quill_core::types::Bindable::Blob(#x.as_slice())),
        // Unreachable: the remaining kinds never pass model analysis.
        _ => quote!(::quill_core::types::Bindable::Null),
    }
}

fn derive_model_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let fields = shape_fields(&input, ShapeRole::Model)?;
    validate_model(&input, &fields)?;

    let name = &input.ident;
    let table = field_table(&fields);

    let arms = fields.iter().enumerate().map(|(index, f)| {
        let ident = &f.ident;
        if f.optional {
            let expr = bind_expr(f.kind, quote!(value));
            quote! {
                #index => match &self.#ident {
                    Some(value) => #expr,
                    None => ::quill_core::types::Bindable::Null,
                },
            }
        } else {
            let expr = bind_expr(f.kind, quote!((&self.#ident)));
            quote!(#index => #expr,)
        }
    });

    Ok(quote! {
        impl ::quill_core::shape::Model for #name {
            const FIELDS: &'static [::quill_core::shape::FieldDef] = #table;

            fn bind_value(
                &self,
                index: usize,
            ) -> ::quill_core::error::QuillResult<::quill_core::types::Bindable<'_>> {
                Ok(match index {
                    #(#arms)*
                    _ => {
                        return Err(::quill_core::error::QuillError::InterfaceMisuse(
                            format!("field index {index} out of range"),
                        ))
                    }
                })
            }
        }
    })
}

/// Derive the write shape of a record.
#[proc_macro_derive(Model, attributes(quill))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_model_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

// ============================================================================
// View derive
// ============================================================================

fn read_call(f: &ShapeField) -> TokenStream2 {
    let label = &f.label;
    let method = match (f.kind, f.optional) {
        (FieldKind::Int, false) => quote!(read_int),
        (FieldKind::Int, true) => quote!(read_opt_int),
        (FieldKind::Bool, false) => quote!(read_bool),
        (FieldKind::Bool, true) => quote!(read_opt_bool),
        (FieldKind::Float, false) => quote!(read_float),
        (FieldKind::Float, true) => quote!(read_opt_float),
        (FieldKind::Slice, false) => quote!(read_slice),
        (FieldKind::Slice, true) => quote!(read_opt_slice),
        (FieldKind::AnyEnum, false) => quote!(read_enum),
        (FieldKind::AnyEnum, true) => quote!(read_opt_enum),
        (FieldKind::AnyJson, false) => quote!(read_json),
        (FieldKind::AnyJson, true) => quote!(read_opt_json),
        // Unreachable: the remaining kinds never pass view analysis.
        _ => quote!(read_slice),
    };
    quote!(row.#method(#label)?)
}

fn derive_view_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let fields = shape_fields(&input, ShapeRole::View)?;
    let name = &input.ident;
    let table = field_table(&fields);

    let inits = fields.iter().map(|f| {
        let ident = &f.ident;
        let call = read_call(f);
        quote!(#ident: #call,)
    });

    Ok(quote! {
        impl ::quill_core::shape::View for #name {
            const FIELDS: &'static [::quill_core::shape::FieldDef] = #table;

            fn from_row(
                row: &::quill_core::extract::Row<'_, '_>,
            ) -> ::quill_core::error::QuillResult<Self> {
                row.check_shape(<Self as ::quill_core::shape::View>::FIELDS)?;
                Ok(Self {
                    #(#inits)*
                })
            }
        }
    })
}

/// Derive the read shape of a record.
#[proc_macro_derive(View, attributes(quill))]
pub fn derive_view(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_view_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

// ============================================================================
// Filter derive
// ============================================================================

fn derive_filter_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let fields = shape_fields(&input, ShapeRole::Filter)?;
    for f in &fields {
        if f.optional {
            return Err(syn::Error::new_spanned(
                &input,
                format!("filter field '{}' cannot be optional", f.label),
            ));
        }
    }
    let name = &input.ident;
    let table = field_table(&fields);

    Ok(quote! {
        impl ::quill_core::shape::Filter for #name {
            const FIELDS: &'static [::quill_core::shape::FieldDef] = #table;
        }
    })
}

/// Derive the shape restricting WHERE/ORDER BY labels.
#[proc_macro_derive(Filter, attributes(quill))]
pub fn derive_filter(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_filter_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

// ============================================================================
// Enumeration derive
// ============================================================================

fn derive_enumeration_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(input, "Enumeration derives enums"));
    };
    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            input,
            "Enumeration needs at least one variant",
        ));
    }
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Enumeration variants carry no data",
            ));
        }
    }

    let name = &input.ident;
    let idents: Vec<&Ident> = data.variants.iter().map(|v| &v.ident).collect();
    let ordinals: Vec<i32> = (0..idents.len() as i32).collect();
    let names: Vec<String> = idents.iter().map(|i| i.to_string()).collect();

    Ok(quote! {
        impl ::quill_core::shape::Enumeration for #name {
            fn ordinal(&self) -> i32 {
                match self {
                    #(Self::#idents => #ordinals,)*
                }
            }

            fn from_ordinal(ordinal: i32) -> Option<Self> {
                match ordinal {
                    #(#ordinals => Some(Self::#idents),)*
                    _ => None,
                }
            }

            fn variant_name(&self) -> &'static str {
                match self {
                    #(Self::#idents => #names,)*
                }
            }

            fn from_variant_name(name: &str) -> Option<Self> {
                match name {
                    #(#names => Some(Self::#idents),)*
                    _ => None,
                }
            }
        }
    })
}

/// Derive ordinal and variant-name mappings for a fieldless enum.
#[proc_macro_derive(Enumeration)]
pub fn derive_enumeration(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_enumeration_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
