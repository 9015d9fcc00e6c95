use serde_json::Value;

use crate::error::CliError;

/// Writes `document` to stdout as a single JSON document.
pub fn render(document: &Value, pretty: bool) -> Result<(), CliError> {
    println!("{}", to_json(document, pretty)?);
    Ok(())
}

fn to_json(document: &Value, pretty: bool) -> Result<String, CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(document)?
    } else {
        serde_json::to_string(document)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_output_is_one_line() {
        let document = serde_json::json!({"articles": [{"id": 1}]});

        assert_eq!(to_json(&document, false).expect("json"), r#"{"articles":[{"id":1}]}"#);
        assert!(to_json(&document, true).expect("json").contains('\n'));
    }
}
