//! Hardcoded Security Diminisher Tests
//!
//! Each diminisher against the model shapes it was authored for, and against
//! the drifted shapes that must abort the run.

use metaed_linker::model::PropertyType;
use metaed_linker::security::{catalog, HardcodedSecurityDiminisher};
use metaed_linker::{
    DataStandardVersion, LinkContext, LinkError, ModelBuilder, ModelRepository, Pipeline,
    SecurableElement,
};
use rstest::rstest;

fn link(repository: ModelRepository, diminisher: HardcodedSecurityDiminisher, version: &str) -> Result<LinkContext, LinkError> {
    Pipeline::core()
        .with_stage(diminisher)
        .link(repository, DataStandardVersion::parse(version).unwrap())
}

fn elements(context: &LinkContext, entity: &str) -> Vec<SecurableElement> {
    let id = context.find_resource(entity).unwrap();
    context.securable_elements(id).unwrap_or(&[]).to_vec()
}

fn element(json_path: &str, meta_ed_name: &str) -> Vec<SecurableElement> {
    vec![SecurableElement::new(json_path, meta_ed_name)]
}

// =============================================================================
// Models
// =============================================================================

fn education_organization(identity: &str) -> ModelBuilder {
    ModelBuilder::new()
        .namespace("EdFi")
        .abstract_entity("EducationOrganization")
        .integer_identity(identity)
}

fn organization_department(identity: &str, role: &str) -> ModelRepository {
    education_organization(identity)
        .domain_entity_subclass("OrganizationDepartment", "EducationOrganization")
        .domain_entity_identity("EducationOrganization", role)
        .build()
        .unwrap()
}

fn school(identity: &str) -> ModelBuilder {
    ModelBuilder::new()
        .namespace("EdFi")
        .domain_entity("Student")
        .identity(PropertyType::String, "UniqueId", "Student")
        .domain_entity("School")
        .string_identity(identity)
        .descriptor_identity("SchoolType")
        .descriptor("SchoolType")
}

fn student_assessment(identity: &str, role: &str) -> ModelRepository {
    school(identity)
        .domain_entity("StudentAssessment")
        .domain_entity_identity("School", role)
        .build()
        .unwrap()
}

/// Program hierarchy down to `depth` levels below Program
fn program_hierarchy(depth: usize) -> ModelRepository {
    let mut builder = education_organization("EducationOrganizationId")
        .domain_entity("Program")
        .domain_entity_identity("EducationOrganization", "");

    if depth >= 1 {
        builder = builder
            .domain_entity("ProgramEvaluation")
            .domain_entity_identity("Program", "Program");
    }
    if depth >= 2 {
        builder = builder
            .domain_entity("ProgramEvaluationElement")
            .domain_entity_identity("ProgramEvaluation", "");
    }
    if depth >= 3 {
        builder = builder
            .domain_entity("ProgramEvaluationObjective")
            .domain_entity_identity("ProgramEvaluation", "");
    }
    if depth >= 4 {
        builder = builder
            .domain_entity("EvaluationRubricDimension")
            .domain_entity_identity("ProgramEvaluationElement", "");
    }
    builder.build().unwrap()
}

// =============================================================================
// Emitted Elements
// =============================================================================

#[test]
fn test_organization_department_parent_reference() {
    let context = link(
        organization_department("EducationOrganizationId", "Parent"),
        catalog::organization_department(),
        "3.3.0-a",
    )
    .unwrap();

    assert_eq!(
        elements(&context, "OrganizationDepartment"),
        element(
            "$.parentEducationOrganizationReference.educationOrganizationId",
            "ParentEducationOrganization"
        )
    );
}

#[test]
fn test_student_assessment_reported_school() {
    let context = link(
        student_assessment("SchoolId", "Reported"),
        catalog::student_assessment(),
        "4.0",
    )
    .unwrap();

    assert_eq!(
        elements(&context, "StudentAssessment"),
        element("$.reportedSchoolReference.schoolId", "ReportedSchool")
    );
}

#[test]
fn test_program_hierarchy_points_at_parent_reference() {
    let context = link(program_hierarchy(4), catalog::program_role_name(), "5.0.0").unwrap();

    assert_eq!(
        elements(&context, "ProgramEvaluation"),
        element("$.programReference.educationOrganizationId", "Program")
    );
    assert_eq!(
        elements(&context, "ProgramEvaluationElement"),
        element("$.programEvaluationReference.programEducationOrganizationId", "ProgramEvaluation")
    );
    assert_eq!(
        elements(&context, "ProgramEvaluationObjective"),
        element("$.programEvaluationReference.programEducationOrganizationId", "ProgramEvaluation")
    );
    assert_eq!(
        elements(&context, "EvaluationRubricDimension"),
        element(
            "$.programEvaluationElementReference.programEducationOrganizationId",
            "ProgramEvaluationElement"
        )
    );
    assert!(elements(&context, "Program").is_empty());
}

#[rstest]
#[case::initial_release("3.3.0-a")]
#[case::later_prerelease("3.3.1-b")]
#[case::tagged_major("5.0.0-pre.1")]
fn test_prerelease_standards_are_in_range(#[case] version: &str) {
    let context = link(
        organization_department("EducationOrganizationId", "Parent"),
        catalog::organization_department(),
        version,
    )
    .unwrap();

    assert_eq!(
        elements(&context, "OrganizationDepartment"),
        element(
            "$.parentEducationOrganizationReference.educationOrganizationId",
            "ParentEducationOrganization"
        )
    );
}

#[test]
fn test_prerelease_standard_missing_entity_is_fatal() {
    let err = link(
        education_organization("EducationOrganizationId").build().unwrap(),
        catalog::organization_department(),
        "3.3.1-b",
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "OrganizationDepartmentHardcodedSecurityDiminisher: Fatal Error: 'OrganizationDepartment' not found in EdFi Data Standard 3.3.1-b"
    );
}

#[test]
fn test_extension_entity_of_same_name_is_ignored() {
    let repository = ModelBuilder::new()
        .extension_namespace("Sample", &["EdFi"])
        .domain_entity("OrganizationDepartment")
        .string_identity("LocalDepartmentCode")
        .namespace("EdFi")
        .abstract_entity("EducationOrganization")
        .integer_identity("EducationOrganizationId")
        .domain_entity_subclass("OrganizationDepartment", "EducationOrganization")
        .domain_entity_identity("EducationOrganization", "Parent")
        .build()
        .unwrap();

    let context = link(repository, catalog::organization_department(), "5.0.0").unwrap();
    let core = context.find_core_resource("OrganizationDepartment").unwrap();
    assert_ne!(context.find_resource("OrganizationDepartment"), Some(core));

    assert_eq!(
        context.securable_elements(core).unwrap_or(&[]).to_vec(),
        element(
            "$.parentEducationOrganizationReference.educationOrganizationId",
            "ParentEducationOrganization"
        )
    );
}

#[test]
fn test_skipped_before_supported_releases() {
    let context = link(
        organization_department("EducationOrganizationId", ""),
        catalog::organization_department(),
        "3.2.0",
    )
    .unwrap();
    assert!(elements(&context, "OrganizationDepartment").is_empty());
}

// =============================================================================
// Fatal Drift
// =============================================================================

#[rstest]
#[case::organization_department_missing(
    education_organization("EducationOrganizationId").build().unwrap(),
    catalog::organization_department(),
    "OrganizationDepartmentHardcodedSecurityDiminisher: Fatal Error: 'OrganizationDepartment' not found in EdFi Data Standard 8.0"
)]
#[case::organization_department_resource_removed(
    organization_department("EducationOrganizationId", ""),
    catalog::organization_department(),
    "OrganizationDepartmentHardcodedSecurityDiminisher: Fatal Error: EdFi Data Standard 8.0 has removed ParentEducationOrganization resource from 'OrganizationDepartment'"
)]
#[case::organization_department_property_removed(
    organization_department("ParentEdOrgId", "Parent"),
    catalog::organization_department(),
    "OrganizationDepartmentHardcodedSecurityDiminisher: Fatal Error: EdFi Data Standard 8.0 has removed ParentEducationOrganizationId property from 'OrganizationDepartment'"
)]
#[case::student_assessment_missing(
    school("SchoolId").build().unwrap(),
    catalog::student_assessment(),
    "StudentAssessmentHardcodedSecurityDiminisher: Fatal Error: 'StudentAssessment' not found in EdFi Data Standard 8.0"
)]
#[case::student_assessment_resource_removed(
    student_assessment("SchoolId", ""),
    catalog::student_assessment(),
    "StudentAssessmentHardcodedSecurityDiminisher: Fatal Error: EdFi Data Standard 8.0 has removed ReportedSchool resource from 'StudentAssessment'"
)]
#[case::student_assessment_property_removed(
    student_assessment("ParentSchoolId", "Reported"),
    catalog::student_assessment(),
    "StudentAssessmentHardcodedSecurityDiminisher: Fatal Error: EdFi Data Standard 8.0 has removed ReportedSchoolId property from 'StudentAssessment'"
)]
#[case::program_evaluation_missing(
    program_hierarchy(0),
    catalog::program_role_name(),
    "ProgramRoleNameHardcodedSecurityDiminisher: Fatal Error: 'ProgramEvaluation' not found in EdFi Data Standard 8.0"
)]
#[case::program_evaluation_element_missing(
    program_hierarchy(1),
    catalog::program_role_name(),
    "ProgramRoleNameHardcodedSecurityDiminisher: Fatal Error: 'ProgramEvaluationElement' not found in EdFi Data Standard 8.0"
)]
#[case::program_evaluation_objective_missing(
    program_hierarchy(2),
    catalog::program_role_name(),
    "ProgramRoleNameHardcodedSecurityDiminisher: Fatal Error: 'ProgramEvaluationObjective' not found in EdFi Data Standard 8.0"
)]
#[case::evaluation_rubric_dimension_missing(
    program_hierarchy(3),
    catalog::program_role_name(),
    "ProgramRoleNameHardcodedSecurityDiminisher: Fatal Error: 'EvaluationRubricDimension' not found in EdFi Data Standard 8.0"
)]
fn test_drift_is_fatal(
    #[case] repository: ModelRepository,
    #[case] diminisher: HardcodedSecurityDiminisher,
    #[case] expected: &str,
) {
    let err = link(repository, diminisher, "8.0").unwrap_err();
    assert!(matches!(err, LinkError::DiminisherFatal { .. }));
    assert_eq!(err.to_string(), expected);
}

#[test]
fn test_no_path_through_chain_is_fatal() {
    let repository = education_organization("EducationOrganizationId")
        .domain_entity("Program")
        .domain_entity_identity("EducationOrganization", "")
        .domain_entity("ProgramEvaluation")
        .integer_identity("EdorgId")
        .build()
        .unwrap();

    let err = link(repository, catalog::program_role_name(), "8.0").unwrap_err();
    assert_eq!(
        err.to_string(),
        "ProgramRoleNameHardcodedSecurityDiminisher: Fatal Error: No securable paths found for entity 'ProgramEvaluation'"
    );
}

#[test]
fn test_standard_pipeline_over_complete_model() {
    let repository = education_organization("EducationOrganizationId")
        .domain_entity_subclass("OrganizationDepartment", "EducationOrganization")
        .domain_entity_identity("EducationOrganization", "Parent")
        .domain_entity("School")
        .string_identity("SchoolId")
        .domain_entity("StudentAssessment")
        .string_identity("StudentAssessmentIdentifier")
        .domain_entity_identity("School", "Reported")
        .domain_entity("Program")
        .domain_entity_identity("EducationOrganization", "")
        .domain_entity("ProgramEvaluation")
        .domain_entity_identity("Program", "Program")
        .domain_entity("ProgramEvaluationElement")
        .domain_entity_identity("ProgramEvaluation", "")
        .domain_entity("ProgramEvaluationObjective")
        .domain_entity_identity("ProgramEvaluation", "")
        .domain_entity("EvaluationRubricDimension")
        .domain_entity_identity("ProgramEvaluationElement", "")
        .build()
        .unwrap();

    let context = Pipeline::standard()
        .link(repository, DataStandardVersion::parse("5.0.0").unwrap())
        .unwrap()
        .into_result()
        .unwrap();

    assert_eq!(context.api_schema().backend(), "api_schema");
    for entity in [
        "OrganizationDepartment",
        "StudentAssessment",
        "ProgramEvaluation",
        "ProgramEvaluationElement",
        "ProgramEvaluationObjective",
        "EvaluationRubricDimension",
    ] {
        assert_eq!(elements(&context, entity).len(), 1, "{}", entity);
    }
}
