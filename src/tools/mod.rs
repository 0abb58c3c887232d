pub mod analysis;
pub mod confluence;
pub mod merge_requests;

/// Use the tool argument when given, otherwise the configured default project.
pub fn project_or_default<'a>(project_id: &'a Option<String>, default: &'a str) -> &'a str {
    match project_id.as_deref().map(str::trim) {
        Some(p) if !p.is_empty() => p,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_or_default() {
        assert_eq!(project_or_default(&Some("group/repo".to_string()), "7"), "group/repo");
        assert_eq!(project_or_default(&Some("  ".to_string()), "7"), "7");
        assert_eq!(project_or_default(&None, "7"), "7");
    }
}
