pub mod benchmark;
pub mod flavor;
pub mod report;
pub mod result;
pub mod site;
pub mod user;

/// Split a space separated `terms` query value into search terms.
pub(crate) fn split_terms(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_terms_handles_missing_and_blank() {
        assert!(split_terms(None).is_empty());
        assert!(split_terms(Some("   ")).is_empty());
        assert_eq!(split_terms(Some("gpu  epyc")), vec!["gpu", "epyc"]);
    }
}
