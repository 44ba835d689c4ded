use crate::api::user::{PasswordChange, StatusChange};
use crate::auth::handlers::{LoginRequest, TokenResponse};
use crate::model::{
    attendance::{Attendance, AttendanceStatus, MarkAttendance, PunchLocation},
    document::{Document, DocumentUpdate, NewDocument},
    leave::{CreateLeave, Leave, LeaveStatus, LeaveType, RejectLeave},
    payroll::{CreatePayroll, GeneratePayroll, Payroll, PayrollBatchReport, PayrollFailure, PayrollStatus, UpdatePayroll},
    performance::{
        Performance, PerformanceStatus, RejectPerformance, ReviewPerformance, ReviewType, SubmitPerformance,
        UpdatePerformance,
    },
    project::{NewProject, Project, ProjectStatus, ProjectUpdate},
    review::{NewReview, Review, ReviewUpdate},
    role::Role,
    statistics::{
        AttendanceStatistics, DashboardStatistics, DepartmentAttendanceStatistics, EmployeeDashboard,
        LeaveStatistics, PayrollStatistics, PerformanceStatistics, UserAttendanceStatistics,
    },
    user::{Department, NewUser, User, UserStatus, UserUpdate},
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Service API",
        version = "1.0.0",
        description = r#"
## Human Resource Management (HRM) Service

Backend for the day-to-day HR operations of an organisation.

### Key Features
- **Attendance**
  - Punch in and out, working hours, absent / half-day / leave marks
- **Leave**
  - Apply, approve, reject and cancel requests
- **Payroll**
  - Per-employee payrolls, monthly batch generation, processing and payment
- **Performance**
  - Self-review submission, rating, completion and rejection
- **Users, documents, projects and reviews**
  - Directory, records and feedback with per-role access
- **Statistics and dashboards**

### Security
Endpoints under `/api/v1` need a **JWT Bearer** access token from `/auth/login`.
ADMIN and HR manage everyone; MANAGER acts on direct reports; EMPLOYEE on own records.

### Response Format
- JSON everywhere; list endpoints are paginated with `page` and `per_page`
- Errors carry a `message`, and validation errors a `fields` list
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::me,

        crate::api::user::create_user,
        crate::api::user::list_users,
        crate::api::user::search_users,
        crate::api::user::exists,
        crate::api::user::count_users,
        crate::api::user::team,
        crate::api::user::get_user,
        crate::api::user::update_user,
        crate::api::user::update_status,
        crate::api::user::change_password,
        crate::api::user::delete_user,

        crate::api::attendance::punch_in,
        crate::api::attendance::punch_out,
        crate::api::attendance::today,
        crate::api::attendance::working_hours,
        crate::api::attendance::mark_absent,
        crate::api::attendance::mark_half_day,
        crate::api::attendance::mark_on_leave,
        crate::api::attendance::list_attendance,
        crate::api::attendance::by_date,
        crate::api::attendance::by_department,
        crate::api::attendance::by_status,
        crate::api::attendance::get_attendance,
        crate::api::attendance::delete_attendance,

        crate::api::leave::apply_leave,
        crate::api::leave::list_leaves,
        crate::api::leave::pending_leaves,
        crate::api::leave::get_leave,
        crate::api::leave::approve_leave,
        crate::api::leave::reject_leave,
        crate::api::leave::cancel_leave,
        crate::api::leave::delete_leave,

        crate::api::payroll::create_payroll,
        crate::api::payroll::generate_payroll,
        crate::api::payroll::update_payroll,
        crate::api::payroll::process_payroll,
        crate::api::payroll::pay_payroll,
        crate::api::payroll::list_payrolls,
        crate::api::payroll::get_payroll,
        crate::api::payroll::delete_payroll,

        crate::api::performance::submit_performance,
        crate::api::performance::list_performances,
        crate::api::performance::get_performance,
        crate::api::performance::update_performance,
        crate::api::performance::review_performance,
        crate::api::performance::approve_performance,
        crate::api::performance::reject_performance,
        crate::api::performance::delete_performance,

        crate::api::document::create_document,
        crate::api::document::list_documents,
        crate::api::document::search_documents,
        crate::api::document::get_document,
        crate::api::document::update_document,
        crate::api::document::delete_document,

        crate::api::project::create_project,
        crate::api::project::list_projects,
        crate::api::project::search_projects,
        crate::api::project::get_project,
        crate::api::project::update_project,
        crate::api::project::delete_project,

        crate::api::review::create_review,
        crate::api::review::list_reviews,
        crate::api::review::search_reviews,
        crate::api::review::get_review,
        crate::api::review::update_review,
        crate::api::review::delete_review,

        crate::api::statistics::attendance,
        crate::api::statistics::department_attendance,
        crate::api::statistics::user_attendance,
        crate::api::statistics::leave,
        crate::api::statistics::payroll,
        crate::api::statistics::performance,

        crate::api::dashboard::organisation,
        crate::api::dashboard::mine,
        crate::api::dashboard::employee
    ),
    components(
        schemas(
            LoginRequest,
            TokenResponse,
            Role,
            Department,
            UserStatus,
            User,
            NewUser,
            UserUpdate,
            StatusChange,
            PasswordChange,
            AttendanceStatus,
            Attendance,
            PunchLocation,
            MarkAttendance,
            LeaveType,
            LeaveStatus,
            Leave,
            CreateLeave,
            RejectLeave,
            PayrollStatus,
            Payroll,
            CreatePayroll,
            UpdatePayroll,
            GeneratePayroll,
            PayrollBatchReport,
            PayrollFailure,
            ReviewType,
            PerformanceStatus,
            Performance,
            SubmitPerformance,
            UpdatePerformance,
            ReviewPerformance,
            RejectPerformance,
            Document,
            NewDocument,
            DocumentUpdate,
            ProjectStatus,
            Project,
            NewProject,
            ProjectUpdate,
            Review,
            NewReview,
            ReviewUpdate,
            AttendanceStatistics,
            DepartmentAttendanceStatistics,
            UserAttendanceStatistics,
            LeaveStatistics,
            PayrollStatistics,
            PerformanceStatistics,
            DashboardStatistics,
            EmployeeDashboard
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and token refresh"),
        (name = "User", description = "Employee directory"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Payroll", description = "Payroll management APIs"),
        (name = "Performance", description = "Performance review APIs"),
        (name = "Document", description = "Employee documents"),
        (name = "Project", description = "Projects"),
        (name = "Review", description = "Peer feedback"),
        (name = "Statistics", description = "Aggregated figures"),
        (name = "Dashboard", description = "Dashboards"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme the protected paths refer to.
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_bearer_scheme_and_paths() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(doc.paths.paths.contains_key("/api/v1/attendance/punch-in"));
        assert!(doc.paths.paths.contains_key("/auth/login"));
    }
}
