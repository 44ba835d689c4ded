use std::sync::Arc;

use tracing::instrument;
use validator::Validate;

use super::{Guard, fetch, remove};
use crate::access::{Action, Caller};
use crate::auth::password::{hash_password, verify_password};
use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::model::user::{Department, NewUser, User, UserFilter, UserStatus, UserUpdate};
use crate::store::{Page, PageRequest, SharedStore, find_page};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Clone)]
pub struct UserService {
    users: SharedStore<User>,
    guard: Guard,
    clock: Arc<dyn Clock>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn hash(password: &str) -> ServiceResult<String> {
    hash_password(password).map_err(|e| ServiceError::Internal(format!("password hashing failed: {}", e)))
}

impl UserService {
    pub fn new(users: SharedStore<User>, guard: Guard, clock: Arc<dyn Clock>) -> Self {
        Self { users, guard, clock }
    }

    #[instrument(skip(self, req), fields(employee_id = %req.employee_id))]
    pub async fn create_user(&self, req: NewUser) -> ServiceResult<User> {
        req.validate()?;
        let email = normalize_email(&req.email);

        if self.exists_by_email(&email).await? {
            return Err(ServiceError::DuplicateKey("email".to_string()));
        }
        if self.exists_by_employee_id(&req.employee_id).await? {
            return Err(ServiceError::DuplicateKey("employee_id".to_string()));
        }
        if let Some(manager_id) = req.manager_id {
            self.require_manager(manager_id).await?;
        }

        let now = self.clock.now();
        let user = self
            .users
            .save(User {
                id: 0,
                employee_id: req.employee_id,
                first_name: req.first_name,
                last_name: req.last_name,
                email,
                password_hash: hash(&req.password)?,
                phone: req.phone,
                role: req.role,
                department: req.department,
                status: UserStatus::Active,
                manager_id: req.manager_id,
                position: req.position,
                base_salary: req.base_salary,
                hire_date: req.hire_date,
                created_at: now,
                updated_at: now,
            })
            .await?;

        tracing::info!(id = user.id, role = %user.role, "User created");
        Ok(user)
    }

    async fn require_manager(&self, manager_id: u64) -> ServiceResult<()> {
        match self.users.find_by_id(manager_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::invalid("manager_id")),
        }
    }

    pub async fn get_user(&self, id: u64) -> ServiceResult<User> {
        fetch(self.users.as_ref(), id).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> ServiceResult<User> {
        let email = normalize_email(email);
        self.find_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::not_found("user", email))
    }

    pub async fn get_user_by_employee_id(&self, employee_id: &str) -> ServiceResult<User> {
        let filter = UserFilter {
            employee_id: Some(employee_id.to_string()),
            ..Default::default()
        };
        self.users
            .find_one(&filter)
            .await?
            .ok_or_else(|| ServiceError::not_found("user", employee_id))
    }

    async fn find_by_email(&self, email: &str) -> ServiceResult<Option<User>> {
        let filter = UserFilter {
            email: Some(email.to_string()),
            ..Default::default()
        };
        Ok(self.users.find_one(&filter).await?)
    }

    pub async fn update_user(&self, id: u64, update: UserUpdate) -> ServiceResult<User> {
        update.validate()?;
        let mut user = self.get_user(id).await?;

        if let Some(email) = update.email {
            let email = normalize_email(&email);
            if email != user.email && self.exists_by_email(&email).await? {
                return Err(ServiceError::DuplicateKey("email".to_string()));
            }
            user.email = email;
        }
        if let Some(employee_id) = update.employee_id {
            if employee_id != user.employee_id && self.exists_by_employee_id(&employee_id).await? {
                return Err(ServiceError::DuplicateKey("employee_id".to_string()));
            }
            user.employee_id = employee_id;
        }
        if let Some(manager_id) = update.manager_id {
            if manager_id == id {
                return Err(ServiceError::invalid("manager_id"));
            }
            self.require_manager(manager_id).await?;
            user.manager_id = Some(manager_id);
        }
        if let Some(v) = update.first_name {
            user.first_name = v;
        }
        if let Some(v) = update.last_name {
            user.last_name = v;
        }
        if update.phone.is_some() {
            user.phone = update.phone;
        }
        if let Some(v) = update.role {
            user.role = v;
        }
        if let Some(v) = update.department {
            user.department = v;
        }
        if update.position.is_some() {
            user.position = update.position;
        }
        if let Some(v) = update.base_salary {
            user.base_salary = v;
        }
        if let Some(v) = update.hire_date {
            user.hire_date = v;
        }
        user.updated_at = self.clock.now();

        let user = self.users.save(user).await?;
        tracing::info!(id, "User updated");
        Ok(user)
    }

    pub async fn update_status(&self, id: u64, status: UserStatus) -> ServiceResult<User> {
        let mut user = self.get_user(id).await?;
        user.status = status;
        user.updated_at = self.clock.now();
        let user = self.users.save(user).await?;
        tracing::info!(id, %status, "User status changed");
        Ok(user)
    }

    pub async fn change_password(&self, id: u64, current: &str, new_password: &str) -> ServiceResult<()> {
        let mut user = self.get_user(id).await?;
        if !self.password_matches(&user, current) {
            return Err(ServiceError::InvalidCredentials);
        }
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ServiceError::invalid("new_password"));
        }
        user.password_hash = hash(new_password)?;
        user.updated_at = self.clock.now();
        self.users.save(user).await?;
        tracing::info!(id, "Password changed");
        Ok(())
    }

    fn password_matches(&self, user: &User, password: &str) -> bool {
        match verify_password(password, &user.password_hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::error!(user_id = user.id, error = %e, "Stored password hash unreadable");
                false
            }
        }
    }

    /// Active user with a matching password. Unknown email, wrong password
    /// and inactive accounts are indistinguishable to the caller.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> ServiceResult<User> {
        let user = self.find_by_email(&normalize_email(email)).await?;
        match user {
            Some(user) if user.is_active() && self.password_matches(&user, password) => {
                tracing::info!(user_id = user.id, "Authenticated");
                Ok(user)
            }
            _ => {
                tracing::info!("Invalid credentials");
                Err(ServiceError::InvalidCredentials)
            }
        }
    }

    pub async fn delete_user(&self, id: u64) -> ServiceResult<()> {
        remove(self.users.as_ref(), id).await?;
        tracing::info!(id, "User deleted");
        Ok(())
    }

    pub async fn list_users(&self, filter: &UserFilter, page: PageRequest) -> ServiceResult<Page<User>> {
        Ok(find_page(self.users.as_ref(), filter, page).await?)
    }

    /// Case-insensitive substring over names and email.
    pub async fn search_users(&self, term: &str, page: PageRequest) -> ServiceResult<Page<User>> {
        let filter = UserFilter {
            search: Some(term.to_string()),
            ..Default::default()
        };
        self.list_users(&filter, page).await
    }

    pub async fn exists_by_email(&self, email: &str) -> ServiceResult<bool> {
        Ok(self.find_by_email(&normalize_email(email)).await?.is_some())
    }

    pub async fn exists_by_employee_id(&self, employee_id: &str) -> ServiceResult<bool> {
        let filter = UserFilter {
            employee_id: Some(employee_id.to_string()),
            ..Default::default()
        };
        Ok(self.users.count(&filter).await? > 0)
    }

    pub async fn count_users(&self, filter: &UserFilter) -> ServiceResult<u64> {
        Ok(self.users.count(filter).await?)
    }

    pub async fn count_active(&self) -> ServiceResult<u64> {
        self.count_users(&UserFilter {
            status: Some(UserStatus::Active),
            ..Default::default()
        })
        .await
    }

    pub async fn count_by_department(&self, department: Department) -> ServiceResult<u64> {
        self.count_users(&UserFilter {
            department: Some(department),
            ..Default::default()
        })
        .await
    }

    /// Direct reports of a manager.
    pub async fn get_team(&self, manager_id: u64) -> ServiceResult<Vec<User>> {
        let filter = UserFilter {
            manager_id: Some(manager_id),
            ..Default::default()
        };
        Ok(self.users.find_all(&filter, None).await?)
    }

    pub async fn has_access_to_user(&self, caller: &Caller, user_id: u64) -> ServiceResult<bool> {
        self.guard.allows(caller, user_id, Action::Read).await
    }

    pub fn has_access_to_department(&self, caller: &Caller, department: Department) -> bool {
        self.guard.access().can_access_department(caller, department)
    }

    pub async fn is_owner(&self, id: u64, caller: &Caller) -> ServiceResult<bool> {
        self.get_user(id).await?;
        self.guard.is_owner(caller, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use crate::service::testing::{day, fixture};

    fn new_user(code: &str, email: &str) -> NewUser {
        NewUser {
            employee_id: code.to_string(),
            first_name: "Erin".to_string(),
            last_name: "Example".to_string(),
            email: email.to_string(),
            password: "correct-horse".to_string(),
            phone: None,
            role: Role::Employee,
            department: Department::Engineering,
            manager_id: None,
            position: Some("Engineer".to_string()),
            base_salary: 4200.0,
            hire_date: day(2024, 3, 1),
        }
    }

    #[actix_web::test]
    async fn duplicate_email_is_rejected() {
        let fx = fixture();
        let svc = &fx.services.users;

        let user = svc.create_user(new_user("EMP-1", "e@x.com")).await.unwrap();
        assert_ne!(user.password_hash, "correct-horse");

        let err = svc.create_user(new_user("EMP-2", "E@X.com")).await.unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateKey(ref key) if key == "email"));

        let err = svc.create_user(new_user("EMP-1", "other@x.com")).await.unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateKey(ref key) if key == "employee_id"));
    }

    #[actix_web::test]
    async fn validation_lists_offending_fields() {
        let fx = fixture();
        let mut req = new_user("EMP-1", "not-an-email");
        req.password = "short".to_string();

        let err = fx.services.users.create_user(req).await.unwrap_err();
        match err {
            ServiceError::Validation(fields) => assert_eq!(fields, vec!["email", "password"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[actix_web::test]
    async fn authenticate_and_change_password() {
        let fx = fixture();
        let svc = &fx.services.users;
        let user = svc.create_user(new_user("EMP-1", "e@x.com")).await.unwrap();

        assert_eq!(svc.authenticate("E@x.com", "correct-horse").await.unwrap().id, user.id);
        let err = svc.authenticate("e@x.com", "wrong").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));

        let err = svc.change_password(user.id, "wrong", "new-password").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
        let err = svc.change_password(user.id, "correct-horse", "short").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        svc.change_password(user.id, "correct-horse", "new-password").await.unwrap();
        svc.authenticate("e@x.com", "new-password").await.unwrap();

        svc.update_status(user.id, UserStatus::Inactive).await.unwrap();
        let err = svc.authenticate("e@x.com", "new-password").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));
        assert_eq!(svc.count_active().await.unwrap(), 0);
    }

    #[actix_web::test]
    async fn partial_update_keeps_other_fields() {
        let fx = fixture();
        let svc = &fx.services.users;
        let boss = svc.create_user(new_user("MGR-1", "boss@x.com")).await.unwrap();
        let user = svc.create_user(new_user("EMP-1", "e@x.com")).await.unwrap();

        let updated = svc
            .update_user(
                user.id,
                UserUpdate {
                    last_name: Some("Renamed".to_string()),
                    manager_id: Some(boss.id),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.last_name, "Renamed");
        assert_eq!(updated.first_name, "Erin");
        assert_eq!(updated.email, "e@x.com");
        assert_eq!(svc.get_team(boss.id).await.unwrap().len(), 1);

        let err = svc
            .update_user(
                user.id,
                UserUpdate {
                    email: Some("boss@x.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateKey(_)));

        let err = svc.update_user(999, UserUpdate::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[actix_web::test]
    async fn search_count_and_delete() {
        let fx = fixture();
        let svc = &fx.services.users;
        svc.create_user(new_user("EMP-1", "erin@x.com")).await.unwrap();
        let mut sales = new_user("EMP-2", "sam@x.com");
        sales.first_name = "Sam".to_string();
        sales.department = Department::Sales;
        let sam = svc.create_user(sales).await.unwrap();

        let found = svc.search_users("SAM", PageRequest::default()).await.unwrap();
        assert_eq!(found.total, 1);
        assert_eq!(found.data[0].id, sam.id);

        assert_eq!(svc.count_by_department(Department::Sales).await.unwrap(), 1);
        assert!(svc.exists_by_employee_id("EMP-2").await.unwrap());
        assert!(svc.get_user_by_employee_id("EMP-9").await.is_err());
        assert_eq!(svc.get_user_by_email("Sam@X.com").await.unwrap().id, sam.id);

        svc.delete_user(sam.id).await.unwrap();
        let err = svc.delete_user(sam.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "user", .. }));
        assert!(!svc.exists_by_email("sam@x.com").await.unwrap());
    }

    #[actix_web::test]
    async fn access_checks_delegate_to_policy() {
        let fx = fixture();
        let boss = fx.user("MGR-1", Role::Manager, Department::Engineering, None).await;
        let report = fx.user("EMP-1", Role::Employee, Department::Engineering, Some(boss.id)).await;
        let stranger = fx.user("EMP-2", Role::Employee, Department::Sales, None).await;
        let colleague = fx.user("EMP-3", Role::Employee, Department::Engineering, None).await;
        let svc = &fx.services.users;

        assert!(svc.has_access_to_user(&Caller::of(&boss), report.id).await.unwrap());
        assert!(svc.has_access_to_user(&Caller::of(&boss), colleague.id).await.unwrap());
        assert!(!svc.has_access_to_user(&Caller::of(&boss), stranger.id).await.unwrap());
        assert!(svc.has_access_to_department(&Caller::of(&boss), Department::Engineering));
        assert!(!svc.has_access_to_department(&Caller::of(&report), Department::Engineering));
    }
}
