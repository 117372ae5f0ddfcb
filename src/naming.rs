//! Identifier casing for generated code.

/// Convert an identifier or path-ish string to snake_case.
///
/// Word breaks are inserted at lower→upper transitions, before the last
/// capital of an acronym run (`HTTPServer` → `http_server`), and for any
/// non-alphanumeric character.
///
/// ```rust,ignore
/// assert_eq!(to_snake_case("getOwnerById"), "get_owner_by_id");
/// assert_eq!(to_snake_case("/v1/owner/{id}"), "v1_owner_id");
/// ```
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);
    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_alphanumeric() {
            if ch.is_uppercase() && i > 0 {
                let prev = chars[i - 1];
                let next_is_lower = chars.get(i + 1).map(|c| c.is_lowercase()).unwrap_or(false);
                let breaks = prev.is_lowercase()
                    || prev.is_ascii_digit()
                    || (prev.is_uppercase() && next_is_lower);
                if breaks && !result.is_empty() && !result.ends_with('_') {
                    result.push('_');
                }
            }
            result.extend(ch.to_lowercase());
        } else if !result.is_empty() && !result.ends_with('_') {
            result.push('_');
        }
    }
    while result.ends_with('_') {
        result.pop();
    }
    result
}

/// Convert to PascalCase by way of snake_case.
pub fn to_pascal_case(s: &str) -> String {
    to_snake_case(s)
        .split('_')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
