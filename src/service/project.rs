use std::sync::Arc;

use chrono::NaiveDate;
use validator::Validate;

use super::{Guard, fetch, remove};
use crate::access::Caller;
use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::model::project::{NewProject, Project, ProjectFilter, ProjectStatus, ProjectUpdate};
use crate::store::{Page, PageRequest, SharedStore, find_page};

#[derive(Clone)]
pub struct ProjectService {
    projects: SharedStore<Project>,
    guard: Guard,
    clock: Arc<dyn Clock>,
}

fn check_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> ServiceResult<()> {
    match (start, end) {
        (Some(start), Some(end)) if start > end => Err(ServiceError::InvalidDateRange { start, end }),
        _ => Ok(()),
    }
}

impl ProjectService {
    pub fn new(projects: SharedStore<Project>, guard: Guard, clock: Arc<dyn Clock>) -> Self {
        Self { projects, guard, clock }
    }

    pub async fn create_project(&self, owner_id: u64, req: NewProject) -> ServiceResult<Project> {
        req.validate()?;
        check_dates(req.start_date, req.end_date)?;
        self.guard.owner(owner_id).await?;
        if let Some(assignee) = req.assignee_id {
            self.guard.owner(assignee).await?;
        }

        let now = self.clock.now();
        let project = self
            .projects
            .save(Project {
                id: 0,
                name: req.name,
                description: req.description,
                owner_id,
                assignee_id: req.assignee_id,
                status: req.status.unwrap_or(ProjectStatus::Planned),
                start_date: req.start_date,
                end_date: req.end_date,
                created_at: now,
                updated_at: now,
            })
            .await?;
        tracing::info!(id = project.id, owner_id, "Project created");
        Ok(project)
    }

    pub async fn get_project(&self, id: u64) -> ServiceResult<Project> {
        fetch(self.projects.as_ref(), id).await
    }

    pub async fn update_project(&self, id: u64, update: ProjectUpdate) -> ServiceResult<Project> {
        update.validate()?;
        let mut project = self.get_project(id).await?;

        if let Some(assignee) = update.assignee_id {
            self.guard.owner(assignee).await?;
            project.assignee_id = Some(assignee);
        }
        if let Some(name) = update.name {
            project.name = name;
        }
        if update.description.is_some() {
            project.description = update.description;
        }
        if let Some(status) = update.status {
            project.status = status;
        }
        if update.start_date.is_some() {
            project.start_date = update.start_date;
        }
        if update.end_date.is_some() {
            project.end_date = update.end_date;
        }
        check_dates(project.start_date, project.end_date)?;
        project.updated_at = self.clock.now();

        Ok(self.projects.save(project).await?)
    }

    pub async fn delete_project(&self, id: u64) -> ServiceResult<()> {
        remove(self.projects.as_ref(), id).await?;
        tracing::info!(id, "Project deleted");
        Ok(())
    }

    pub async fn list_projects(&self, filter: &ProjectFilter, page: PageRequest) -> ServiceResult<Page<Project>> {
        Ok(find_page(self.projects.as_ref(), filter, page).await?)
    }

    pub async fn search_projects(&self, term: &str, page: PageRequest) -> ServiceResult<Page<Project>> {
        let filter = ProjectFilter {
            search: Some(term.to_string()),
            ..Default::default()
        };
        self.list_projects(&filter, page).await
    }

    pub async fn count_projects(&self, filter: &ProjectFilter) -> ServiceResult<u64> {
        Ok(self.projects.count(filter).await?)
    }

    /// The owner's side of the reporting line, or the assignee.
    pub async fn is_owner(&self, id: u64, caller: &Caller) -> ServiceResult<bool> {
        let project = self.get_project(id).await?;
        if project.assignee_id == Some(caller.user_id) {
            return Ok(true);
        }
        self.guard.is_owner(caller, project.owner_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use crate::model::user::Department;
    use crate::service::testing::{day, fixture};

    fn revamp() -> NewProject {
        NewProject {
            name: "Payroll revamp".into(),
            description: None,
            assignee_id: None,
            status: None,
            start_date: Some(day(2025, 6, 1)),
            end_date: Some(day(2025, 9, 30)),
        }
    }

    #[actix_web::test]
    async fn create_defaults_to_planned() {
        let fx = fixture();
        let boss = fx.user("MGR-1", Role::Manager, Department::Engineering, None).await;
        let dev = fx.user("EMP-1", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.projects;

        let project = svc
            .create_project(
                boss.id,
                NewProject {
                    assignee_id: Some(dev.id),
                    ..revamp()
                },
            )
            .await
            .unwrap();
        assert_eq!(project.status, ProjectStatus::Planned);
        assert!(svc.is_owner(project.id, &Caller::of(&dev)).await.unwrap());
        assert!(svc.is_owner(project.id, &Caller::of(&boss)).await.unwrap());

        let err = svc
            .create_project(
                boss.id,
                NewProject {
                    assignee_id: Some(404),
                    ..revamp()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "user", .. }));
    }

    #[actix_web::test]
    async fn update_rejects_inverted_dates() {
        let fx = fixture();
        let boss = fx.user("MGR-1", Role::Manager, Department::Engineering, None).await;
        let svc = &fx.services.projects;
        let project = svc.create_project(boss.id, revamp()).await.unwrap();

        let err = svc
            .update_project(
                project.id,
                ProjectUpdate {
                    end_date: Some(day(2025, 5, 1)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidDateRange { .. }));

        let active = svc
            .update_project(
                project.id,
                ProjectUpdate {
                    status: Some(ProjectStatus::Active),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(active.name, "Payroll revamp");

        let filter = ProjectFilter {
            status: Some(ProjectStatus::Active),
            ..Default::default()
        };
        assert_eq!(svc.count_projects(&filter).await.unwrap(), 1);
        assert_eq!(svc.search_projects("REVAMP", PageRequest::default()).await.unwrap().total, 1);

        svc.delete_project(project.id).await.unwrap();
        assert!(svc.delete_project(project.id).await.is_err());
    }
}
