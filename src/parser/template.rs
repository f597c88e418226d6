/// Replace the first occurrence of `placeholder` with `value`.
///
/// Request skeletons carry a single literal marker (`@seed`, `@pszXML`);
/// no other templating is applied, and later occurrences are left alone.
pub fn substitute_first(template: &str, placeholder: &str, value: &str) -> String {
    template.replacen(placeholder, value, 1)
}
