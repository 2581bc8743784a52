use convert_case::{Case, Casing};
use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_error::{abort_call_site, proc_macro_error, ResultExt};
use quote::{quote, ToTokens};
use syn::{self, ext::IdentExt, Attribute, DataEnum, DataStruct, DeriveInput, Fields, Variant};

fn has_attr(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|a| match a.path.get_ident() {
        None => false,
        Some(ident) => ident.unraw().to_string().eq(name),
    })
}

fn find_attr_field<'a>(fields: &'a Fields, name: &str) -> Option<&'a Ident> {
    let fields = fields
        .iter()
        .filter(|f| has_attr(&f.attrs, name))
        .collect::<Vec<_>>();
    match fields.len() {
        0 => None,
        1 => fields[0].ident.as_ref(),
        _ => abort_call_site!(format!("Multiple fields found with attribute #[{name}]")),
    }
}

/// Implements `MIDIEvent` for an event struct.
///
/// `#[channel]` and `#[key]` mark the fields holding the channel and key, and
/// generate `VoiceEvent` / `KeyEvent`. A struct marked `#[voice]` must also
/// implement `VoiceMessage`, and exposes its raw message bytes through
/// `MIDIEvent::voice_bytes`.
#[proc_macro_derive(MIDIEvent, attributes(key, channel, voice))]
#[proc_macro_error]
pub fn midi_event(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse(input).expect_or_abort("Couldn't parse for MIDIEvent");

    let name = &ast.ident;
    let generics = &ast.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    if let syn::Data::Struct(DataStruct { ref fields, .. }) = ast.data {
        let key_field = find_attr_field(fields, "key");
        let channel_field = find_attr_field(fields, "channel");

        let voice_event = has_attr(&ast.attrs, "voice");

        if key_field.is_some() && channel_field.is_none() {
            abort_call_site!(
                "Key events must also have a channel (use #[channel] along with #[key])!"
            );
        }
        if voice_event && channel_field.is_none() {
            abort_call_site!("Voice messages are always sent on a channel (add #[channel])!");
        }

        let mut generated_impl = Vec::new();
        let mut generated_trait_impl = Vec::new();
        let mut generated_traits = Vec::new();

        if voice_event {
            generated_impl.push(quote! {
                #[inline(always)]
                pub fn message_bytes(&self) -> Vec<u8> {
                    VoiceMessage::message_bytes(self)
                }
            });

            generated_trait_impl.push(quote! {
                #[inline(always)]
                fn voice_bytes(&self) -> Option<Vec<u8>> {
                    Some(VoiceMessage::message_bytes(self))
                }
            });
        } else {
            generated_trait_impl.push(quote! {
                #[inline(always)]
                fn voice_bytes(&self) -> Option<Vec<u8>> {
                    None
                }
            });
        }

        match key_field {
            None => {
                generated_trait_impl.push(quote! {
                    #[inline(always)]
                    fn key(&self) -> Option<u8> {
                        None
                    }

                    #[inline(always)]
                    fn key_mut(&mut self) -> Option<&mut u8> {
                        None
                    }
                });
            }
            Some(ident) => {
                generated_impl.push(quote! {
                    #[inline(always)]
                    pub fn key(&self) -> u8 {
                        self.#ident
                    }

                    #[inline(always)]
                    pub fn key_mut(&mut self) -> &mut u8 {
                        &mut self.#ident
                    }
                });

                generated_trait_impl.push(quote! {
                    #[inline(always)]
                    fn key(&self) -> Option<u8> {
                        Some(self.#ident)
                    }

                    #[inline(always)]
                    fn key_mut(&mut self) -> Option<&mut u8> {
                        Some(&mut self.#ident)
                    }
                });

                generated_traits.push(quote! {
                    impl #impl_generics KeyEvent for #name #ty_generics #where_clause {
                        #[inline(always)]
                        fn key(&self) -> u8 {
                            self.#ident
                        }

                        #[inline(always)]
                        fn key_mut(&mut self) -> &mut u8 {
                            &mut self.#ident
                        }
                    }
                });
            }
        }

        match channel_field {
            None => {
                generated_trait_impl.push(quote! {
                    #[inline(always)]
                    fn channel(&self) -> Option<u8> {
                        None
                    }

                    #[inline(always)]
                    fn channel_mut(&mut self) -> Option<&mut u8> {
                        None
                    }
                });
            }
            Some(ident) => {
                generated_impl.push(quote! {
                    #[inline(always)]
                    pub fn channel(&self) -> u8 {
                        self.#ident
                    }

                    #[inline(always)]
                    pub fn channel_mut(&mut self) -> &mut u8 {
                        &mut self.#ident
                    }
                });

                generated_trait_impl.push(quote! {
                    #[inline(always)]
                    fn channel(&self) -> Option<u8> {
                        Some(self.#ident)
                    }

                    #[inline(always)]
                    fn channel_mut(&mut self) -> Option<&mut u8> {
                        Some(&mut self.#ident)
                    }
                });

                generated_traits.push(quote! {
                    impl #impl_generics VoiceEvent for #name #ty_generics #where_clause {
                        #[inline(always)]
                        fn channel(&self) -> u8 {
                            self.#ident
                        }

                        #[inline(always)]
                        fn channel_mut(&mut self) -> &mut u8 {
                            &mut self.#ident
                        }
                    }
                });
            }
        }

        let gen = quote! {
            #(#generated_traits)*

            impl #impl_generics MIDIEvent for #name #ty_generics #where_clause {
                #(#generated_trait_impl)*
            }

            impl #impl_generics #name #ty_generics #where_clause {
                #(#generated_impl)*
            }
        };

        gen.into()
    } else {
        abort_call_site!("#[derive(MIDIEvent)] is only defined for structs, not for enums!");
    }
}

fn event_variant_from_struct(name: &Ident) -> Ident {
    let event_name = name.unraw().to_string();
    let event_name = event_name.strip_suffix("Event").unwrap_or(&event_name[..]);
    Ident::new(event_name, name.span())
}

fn event_struct_from_variant(name: &Ident) -> Ident {
    let event_name = name.unraw().to_string();
    let event_name = event_name + "Event";
    Ident::new(&event_name[..], name.span())
}

/// Generates `new` for an event struct, plus `Event::new_*` and
/// `Event::new_delta_*` constructors wrapping it.
#[proc_macro_derive(NewEvent)]
#[proc_macro_error]
pub fn create_new_event(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse(input).expect_or_abort("Couldn't parse for NewEvent");

    let name = &ast.ident;
    let generics = &ast.generics;
    let (impl_generics, _ty_generics, where_clause) = generics.split_for_impl();

    if let syn::Data::Struct(DataStruct { ref fields, .. }) = ast.data {
        let mut new_args = Vec::new();
        let mut assign = Vec::new();

        let variant_ident = event_variant_from_struct(name);
        let snake_case = name.unraw().to_string()[..].to_case(Case::Snake);
        let new_ident = Ident::new(&format!("new_{snake_case}")[..], Span::call_site());
        let new_delta_ident = Ident::new(&format!("new_delta_{snake_case}")[..], Span::call_site());

        let doc_str = &format!("Creates a new `{name}`.");
        let doc_str_event = &format!(
            "Creates a new [`{name}`](crate::events::{name}) wrapped in [`Event::{ident}`](crate::events::Event::{ident}).",
            ident = variant_ident.unraw(),
        );
        let doc_str_delta = &format!(
            "Creates a new [`{name}`](crate::events::{name}) wrapped in [`Event::{ident}`](crate::events::Event::{ident}), preceded by a delta time.",
            ident = variant_ident.unraw(),
        );

        for field in fields.iter() {
            if let Some(ident) = &field.ident {
                let ty = &field.ty;
                new_args.push(quote! {#ident: #ty,});
                assign.push(quote! {#ident,});
            }
        }

        let gen = quote! {
            impl #impl_generics #name #where_clause {
                #[doc=#doc_str]
                #[inline(always)]
                pub fn new(#(#new_args)*) -> Self {
                    Self {
                        #(#assign)*
                    }
                }
            }

            impl Event {
                #[doc=#doc_str_event]
                #[inline(always)]
                pub fn #new_ident(#(#new_args)*) -> Event {
                    (#name :: new(#(#assign)*)).as_event()
                }

                #[doc=#doc_str_delta]
                #[inline(always)]
                pub fn #new_delta_ident<D: MIDINum>(delta: D, #(#new_args)*) -> Delta<D, Event> {
                    Delta::new(delta, (#name :: new(#(#assign)*)).as_event())
                }
            }
        };

        gen.into()
    } else {
        abort_call_site!("#[derive(NewEvent)] is only defined for structs, not for enums!");
    }
}

/// Implements `Clone` and `MIDIEvent` for the `Event` enum by dispatching to the
/// wrapped event structs, and generates `as_event` on every struct.
///
/// Variants must be named after their struct without the `Event` suffix.
#[proc_macro_derive(EventImpl, attributes(channel, key, voice))]
#[proc_macro_error]
pub fn event_impl(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = syn::parse(input).expect_or_abort("Couldn't parse for EventImpl");

    let name = &ast.ident;
    let generics = &ast.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    if let syn::Data::Enum(DataEnum { variants, .. }) = ast.data {
        fn is_key(v: &Variant) -> bool {
            has_attr(&v.attrs, "key")
        }
        fn is_channel(v: &Variant) -> bool {
            has_attr(&v.attrs, "channel")
        }
        fn is_voice(v: &Variant) -> bool {
            has_attr(&v.attrs, "voice")
        }

        fn match_all(lines: Vec<TokenStream2>) -> TokenStream2 {
            quote! {
                match self {
                    #(#lines)*
                }
            }
        }

        fn make_match_line(ident: &Ident, res: TokenStream2) -> TokenStream2 {
            quote! {
                Event::#ident(event) => #res,
            }
        }

        fn is_boxed(variant: &Variant) -> bool {
            let field = match variant.fields.iter().next() {
                Some(field) => field,
                None => abort_call_site!("Event variants must wrap exactly one event struct"),
            };
            let mut tokens = TokenStream2::new();
            field.ty.to_tokens(&mut tokens);
            tokens.to_string().starts_with("Box <")
        }

        fn wrap_if(enabled: bool, tokens: TokenStream2) -> TokenStream2 {
            if enabled {
                quote! { Some(#tokens) }
            } else {
                quote! { None }
            }
        }

        let variants = variants.iter().collect::<Vec<_>>();

        let create_match = |map: &dyn Fn(&Variant) -> TokenStream2| {
            match_all(
                variants
                    .iter()
                    .map(|v| make_match_line(&v.ident, map(v)))
                    .collect::<Vec<_>>(),
            )
        };

        let clone_match = create_match(&|v| {
            let ident = &v.ident;
            if is_boxed(v) {
                quote! { Event::#ident(Box::new(event.as_ref().clone())) }
            } else {
                quote! { Event::#ident(event.clone()) }
            }
        });

        let key = create_match(&|v| wrap_if(is_key(v), quote! { event.key() }));
        let key_mut = create_match(&|v| wrap_if(is_key(v), quote! { event.key_mut() }));
        let channel = create_match(&|v| wrap_if(is_channel(v), quote! { event.channel() }));
        let channel_mut =
            create_match(&|v| wrap_if(is_channel(v), quote! { event.channel_mut() }));
        let voice_bytes =
            create_match(&|v| wrap_if(is_voice(v), quote! { event.message_bytes() }));

        let mut event_wrap_impl = Vec::new();
        for variant in variants.iter() {
            let ident = &variant.ident;
            let struct_ident = event_struct_from_variant(ident);
            let doc_str = &format!(
                "Wraps the `{}` in a `Event::{}`.",
                struct_ident.unraw(),
                ident.unraw()
            );
            let wrapped = if is_boxed(variant) {
                quote! { #name::#ident(Box::new(self)) }
            } else {
                quote! { #name::#ident(self) }
            };
            event_wrap_impl.push(quote! {
                impl #struct_ident {
                    #[doc=#doc_str]
                    #[inline(always)]
                    pub fn as_event(self) -> #name #ty_generics {
                        #wrapped
                    }
                }
            });
        }

        let gen = quote! {
            impl #impl_generics Clone for #name #ty_generics #where_clause {
                #[inline(always)]
                fn clone(&self) -> #name #ty_generics {
                    #clone_match
                }
            }

            impl #impl_generics MIDIEvent for #name #ty_generics #where_clause {
                #[inline(always)]
                fn key(&self) -> Option<u8> {
                    #key
                }

                #[inline(always)]
                fn key_mut(&mut self) -> Option<&mut u8> {
                    #key_mut
                }

                #[inline(always)]
                fn channel(&self) -> Option<u8> {
                    #channel
                }

                #[inline(always)]
                fn channel_mut(&mut self) -> Option<&mut u8> {
                    #channel_mut
                }

                #[inline(always)]
                fn voice_bytes(&self) -> Option<Vec<u8>> {
                    #voice_bytes
                }
            }

            #(#event_wrap_impl)*
        };

        gen.into()
    } else {
        abort_call_site!("#[derive(EventImpl)] is only defined for enums, not for structs!");
    }
}
