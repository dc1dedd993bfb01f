use crate::rewrite::Rewrite;
use crate::SchemaError;
use std::path::Path;
use tracing::debug;

const ZSTU_ON: &str = "ZSTU=1";
const ZSTU_OFF: &str = "ZSTU=0";

/// Set the `ZSTU` line of a CPF file to `on` and return its previous value.
///
/// Every `ZSTU=0`/`ZSTU=1` line is rewritten; the returned value is the one
/// held by the last of them. A file without a `ZSTU` line is left untouched.
pub fn toggle_zstu(cpf_path: &Path, on: bool) -> Result<bool, SchemaError> {
    let replacement = if on { ZSTU_ON } else { ZSTU_OFF };
    let mut original = None;

    let rewrite = Rewrite::stage(cpf_path, |line| match line {
        ZSTU_ON | ZSTU_OFF => {
            original = Some(line == ZSTU_ON);
            Some(replacement.to_owned())
        }
        _ => None,
    })?;

    let Some(original) = original else {
        return Err(SchemaError::PatternNotFound("ZSTU=[01]".to_owned()));
    };

    rewrite.commit()?;
    debug!(path = %cpf_path.display(), original, on, "toggled ZSTU");
    Ok(original)
}
