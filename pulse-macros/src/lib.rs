use proc_macro::{Delimiter, Group, TokenStream, TokenTree};

/// Runs an `async fn` test body on a fresh `pulse::Loop`.
///
/// The body runs as the loop's initial task and may use `?` on
/// `pulse::Result` values. The test fails if the computation fails or is
/// cancelled. `pulse::Loop::current()` gives the body access to its loop.
///
/// ```rust,ignore
/// #[pulse::test]
/// async fn answer() {
///     let event_loop = pulse::Loop::current().unwrap();
///     let future = pulse::Future::new(&event_loop, "answer");
///     future.set_result(42)?;
///     assert_eq!(future.await?, 42);
/// }
/// ```
#[proc_macro_attribute]
pub fn test(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut tokens = item.into_iter().collect::<Vec<_>>();

    if let Some(pos) = tokens
        .iter()
        .position(|t| matches!(t, TokenTree::Ident(id) if id.to_string() == "async"))
    {
        tokens.remove(pos);
    }

    let Some(pos) = tokens
        .iter()
        .rposition(|t| matches!(t, TokenTree::Group(g) if g.delimiter() == Delimiter::Brace))
    else {
        return "compile_error!(\"#[pulse::test] expects a function with a body\");"
            .parse()
            .unwrap_or_default();
    };

    let block = match &tokens[pos] {
        TokenTree::Group(g) => g.stream().to_string(),
        _ => unreachable!(),
    };

    let new_block = format!(
        "{{
        let event_loop = ::pulse::LoopBuilder::new().name(\"test\").build();
        let outcome = event_loop.run(async move {{
            {{ {} }};
            ::core::result::Result::Ok::<(), ::pulse::Error>(())
        }});
        if let ::core::result::Result::Err(err) = outcome {{
            panic!(\"test computation failed: {{err}}\");
        }}
    }}",
        block
    );

    let body = match new_block.parse() {
        Ok(ts) => ts,
        Err(err) => {
            let msg = format!("pulse::test macro error: {err}");
            return format!("compile_error!({msg:?});")
                .parse()
                .unwrap_or_default();
        }
    };

    tokens[pos] = TokenTree::Group(Group::new(Delimiter::Brace, body));

    let test_attr: TokenStream = "#[test]".parse().unwrap_or_default();
    let mut result: Vec<TokenTree> = test_attr.into_iter().collect();
    result.extend(tokens);

    result.into_iter().collect()
}
