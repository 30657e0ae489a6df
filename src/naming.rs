//! Naming helpers shared by the projector and the diminishers

/// Role name + MetaEd name, collapsed when the role is absent or repeats the name
pub fn prefixed_name(role_name: Option<&str>, name: &str) -> String {
    match role_name {
        Some(role) if !role.is_empty() && role != name => format!("{}{}", role, name),
        _ => name.to_string(),
    }
}

/// Prepend a prefix unless the name already starts with it
pub fn prepend_with_collapse(prefix: &str, name: &str) -> String {
    if prefix.is_empty() || name.starts_with(prefix) {
        name.to_string()
    } else {
        format!("{}{}", prefix, name)
    }
}

/// Apply a chain of prefixes, innermost last
pub fn prefix_chain(prefixes: &[String], name: &str) -> String {
    prefixes
        .iter()
        .rev()
        .fold(name.to_string(), |acc, prefix| prepend_with_collapse(prefix, &acc))
}

/// Lower the first character (e.g., `SchoolId` -> `schoolId`)
pub fn uncapitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// English plural for collection names
pub fn pluralize(s: &str) -> String {
    let lower = s.to_ascii_lowercase();
    if lower.ends_with('y') && !ends_with_vowel_y(&lower) {
        return format!("{}ies", &s[..s.len() - 1]);
    }
    if ["s", "x", "z", "ch", "sh"].iter().any(|suffix| lower.ends_with(suffix)) {
        return format!("{}es", s);
    }
    format!("{}s", s)
}

fn ends_with_vowel_y(lower: &str) -> bool {
    ["ay", "ey", "iy", "oy", "uy"].iter().any(|suffix| lower.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_name() {
        assert_eq!(prefixed_name(Some("Parent"), "EducationOrganization"), "ParentEducationOrganization");
        assert_eq!(prefixed_name(Some("Program"), "Program"), "Program");
        assert_eq!(prefixed_name(None, "School"), "School");
    }

    #[test]
    fn test_collapse() {
        assert_eq!(prepend_with_collapse("Program", "EducationOrganizationId"), "ProgramEducationOrganizationId");
        assert_eq!(prepend_with_collapse("Parent", "ParentEdOrgId"), "ParentEdOrgId");
        assert_eq!(prepend_with_collapse("", "SchoolId"), "SchoolId");
    }

    #[test]
    fn test_prefix_chain() {
        let prefixes = vec!["Reported".to_string(), "Program".to_string()];
        assert_eq!(prefix_chain(&prefixes, "EducationOrganizationId"), "ReportedProgramEducationOrganizationId");
        assert_eq!(prefix_chain(&[], "SchoolId"), "SchoolId");
    }

    #[test]
    fn test_uncapitalize() {
        assert_eq!(uncapitalize("StudentUniqueId"), "studentUniqueId");
        assert_eq!(uncapitalize(""), "");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize("Address"), "Addresses");
        assert_eq!(pluralize("Category"), "Categories");
        assert_eq!(pluralize("Day"), "Days");
        assert_eq!(pluralize("GradeLevel"), "GradeLevels");
        assert_eq!(pluralize("Box"), "Boxes");
    }
}
