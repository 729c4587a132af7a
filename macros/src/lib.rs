use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, Ident, ItemFn, LitStr};

/// Test attribute for rxlite.
///
/// - `#[rxlite_macro::test]` on a sync fn expands to `#[test]`.
/// - `#[rxlite_macro::test]` on an `async fn` drives the body on the
///   thread-local `LocalScheduler`, so tasks spawned by stream and future
///   bridges make progress while the test awaits.
/// - `#[rxlite_macro::test(tokio)]` on an `async fn` runs the body inside a
///   current-thread tokio runtime and a `LocalSet`, which is what
///   `TokioLocalScheduler` spawns onto.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let input = parse_macro_input!(item as ItemFn);
  let is_async = input.sig.asyncness.is_some();

  let raw_args = proc_macro2::TokenStream::from(attr);
  let on_tokio = if raw_args.is_empty() {
    false
  } else {
    if !is_async {
      return TokenStream::from(
        syn::Error::new(
          raw_args.span(),
          "rxlite_macro::test flavor args are only supported for async tests. Use \
           #[rxlite_macro::test] for sync tests, or make the function async.",
        )
        .to_compile_error(),
      );
    }

    let flavor = if let Ok(ident) = syn::parse2::<Ident>(raw_args.clone()) {
      Some((ident.to_string(), ident.span()))
    } else if let Ok(lit) = syn::parse2::<LitStr>(raw_args.clone()) {
      Some((lit.value(), lit.span()))
    } else {
      None
    };

    match flavor {
      Some((name, _)) if name == "tokio" => true,
      Some((name, _)) if name == "local" => false,
      Some((_, span)) => {
        return TokenStream::from(
          syn::Error::new(
            span,
            "rxlite_macro::test only accepts: #[rxlite_macro::test], \
             #[rxlite_macro::test(local)] or #[rxlite_macro::test(tokio)]",
          )
          .to_compile_error(),
        );
      }
      None => {
        return TokenStream::from(
          syn::Error::new(
            raw_args.span(),
            "rxlite_macro::test only accepts an identifier or a string literal flavor",
          )
          .to_compile_error(),
        );
      }
    }
  };

  if !is_async {
    return TokenStream::from(quote! {
      #[test]
      #input
    });
  }

  let ItemFn { attrs, vis, mut sig, block } = input;
  sig.asyncness = None;

  let body = if on_tokio {
    quote! {
      let runtime = ::tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build the test runtime");
      ::tokio::task::LocalSet::new().block_on(&runtime, async move #block)
    }
  } else {
    quote! {
      ::rxlite::scheduler::LocalScheduler::block_on(async move #block)
    }
  };

  TokenStream::from(quote! {
    #[test]
    #(#attrs)*
    #vis #sig {
      #body
    }
  })
}
