//! The hardcoded diminishers shipped with the linker

use super::diminisher::{HardcodedSecurityDiminisher, SecurableTarget};

/// Releases that introduced the role-named securable references
const SUPPORTED_VERSIONS: &str = ">=3.3.0";

const PROGRAM_EDUCATION_ORGANIZATION_ID: &str = "ProgramEducationOrganizationId";

pub fn organization_department() -> HardcodedSecurityDiminisher {
    HardcodedSecurityDiminisher::new(
        "OrganizationDepartmentHardcodedSecurityDiminisher",
        SUPPORTED_VERSIONS,
        vec![SecurableTarget {
            entity: "OrganizationDepartment",
            chain: &["EducationOrganization"],
            resource: "ParentEducationOrganization",
            property: "ParentEducationOrganizationId",
        }],
    )
}

pub fn student_assessment() -> HardcodedSecurityDiminisher {
    HardcodedSecurityDiminisher::new(
        "StudentAssessmentHardcodedSecurityDiminisher",
        SUPPORTED_VERSIONS,
        vec![SecurableTarget {
            entity: "StudentAssessment",
            chain: &["School"],
            resource: "ReportedSchool",
            property: "ReportedSchoolId",
        }],
    )
}

/// Program evaluation hierarchy, each level secured through its parent
pub fn program_role_name() -> HardcodedSecurityDiminisher {
    HardcodedSecurityDiminisher::new(
        "ProgramRoleNameHardcodedSecurityDiminisher",
        SUPPORTED_VERSIONS,
        vec![
            SecurableTarget {
                entity: "ProgramEvaluation",
                chain: &["Program", "EducationOrganization"],
                resource: "Program",
                property: PROGRAM_EDUCATION_ORGANIZATION_ID,
            },
            SecurableTarget {
                entity: "ProgramEvaluationElement",
                chain: &["ProgramEvaluation", "Program", "EducationOrganization"],
                resource: "ProgramEvaluation",
                property: PROGRAM_EDUCATION_ORGANIZATION_ID,
            },
            SecurableTarget {
                entity: "ProgramEvaluationObjective",
                chain: &["ProgramEvaluation", "Program", "EducationOrganization"],
                resource: "ProgramEvaluation",
                property: PROGRAM_EDUCATION_ORGANIZATION_ID,
            },
            SecurableTarget {
                entity: "EvaluationRubricDimension",
                chain: &[
                    "ProgramEvaluationElement",
                    "ProgramEvaluation",
                    "Program",
                    "EducationOrganization",
                ],
                resource: "ProgramEvaluationElement",
                property: PROGRAM_EDUCATION_ORGANIZATION_ID,
            },
        ],
    )
}

/// Every diminisher, in run order
pub fn all() -> Vec<HardcodedSecurityDiminisher> {
    vec![organization_department(), student_assessment(), program_role_name()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pass;

    #[test]
    fn test_catalog_order() {
        let names: Vec<&str> = all().iter().map(|d| d.name()).collect();
        assert_eq!(
            names,
            vec![
                "OrganizationDepartmentHardcodedSecurityDiminisher",
                "StudentAssessmentHardcodedSecurityDiminisher",
                "ProgramRoleNameHardcodedSecurityDiminisher",
            ]
        );
        assert_eq!(program_role_name().targets().len(), 4);
    }
}
