use proc_macro::TokenStream as TokenStream1;
use quote::ToTokens;

/// This macro is added before a method of `Table` in the impl block.
/// Use this macro to first check if the current table phase is exactly the
/// phase in the attribute.
///
/// For example, `#[allowed_phase(PlayerTurn)]` will make a method first check
/// if the table is in `TablePhase::PlayerTurn`. If not, the method returns
/// `BlackjackError::InvalidAction` naming the method and both phases.
#[proc_macro_attribute]
pub fn allowed_phase(attr: TokenStream1, item: TokenStream1) -> TokenStream1 {
    let mut ast: syn::ImplItemFn = match syn::parse(item) {
        Ok(ast) => ast,
        Err(err) => return err.to_compile_error().into(),
    };
    let phase = attr.to_string();
    let function_name = ast.sig.ident.to_string();
    let code = format!(
        r#"
    if self.phase != crate::table::TablePhase::{phase} {{
        return Err(crate::BlackjackError::InvalidAction(format!(
            "{function_name} is only allowed in {phase} phase, table is in {{:?}} phase",
            self.phase
        )));
    }}
"#
    );
    let early_return: syn::Stmt = match syn::parse_str(&code) {
        Ok(stmt) => stmt,
        Err(err) => return err.to_compile_error().into(),
    };
    ast.block.stmts.insert(0, early_return);
    ast.into_token_stream().into()
}
