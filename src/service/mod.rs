//! Domain services
//!
//! Stateless facades over the entity stores. Each call loads what it needs,
//! applies the domain rules and writes back; nothing is held between calls.

pub mod attendance;
pub mod dashboard;
pub mod document;
pub mod leave;
pub mod payroll;
pub mod performance;
pub mod project;
pub mod review;
pub mod statistics;
pub mod user;

use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::MySqlPool;

use crate::access::{AccessControl, Action, Caller, Owner};
use crate::clock::Clock;
use crate::error::{ServiceError, ServiceResult};
use crate::model::{
    attendance::Attendance, document::Document, leave::Leave, payroll::Payroll,
    performance::Performance, project::Project, review::Review, user::User,
};
use crate::store::{Entity, MemoryStore, MySqlStore, SharedStore, Store};

pub use attendance::AttendanceService;
pub use dashboard::DashboardService;
pub use document::DocumentService;
pub use leave::LeaveService;
pub use payroll::PayrollService;
pub use performance::PerformanceService;
pub use project::ProjectService;
pub use review::ReviewService;
pub use statistics::StatisticsService;
pub use user::UserService;

/// One store per table.
#[derive(Clone)]
pub struct Stores {
    pub users: SharedStore<User>,
    pub attendance: SharedStore<Attendance>,
    pub leaves: SharedStore<Leave>,
    pub payrolls: SharedStore<Payroll>,
    pub performances: SharedStore<Performance>,
    pub documents: SharedStore<Document>,
    pub projects: SharedStore<Project>,
    pub reviews: SharedStore<Review>,
}

impl Stores {
    pub fn mysql(pool: MySqlPool) -> Self {
        Self {
            users: Arc::new(MySqlStore::new(pool.clone())),
            attendance: Arc::new(MySqlStore::new(pool.clone())),
            leaves: Arc::new(MySqlStore::new(pool.clone())),
            payrolls: Arc::new(MySqlStore::new(pool.clone())),
            performances: Arc::new(MySqlStore::new(pool.clone())),
            documents: Arc::new(MySqlStore::new(pool.clone())),
            projects: Arc::new(MySqlStore::new(pool.clone())),
            reviews: Arc::new(MySqlStore::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryStore::new()),
            attendance: Arc::new(MemoryStore::new()),
            leaves: Arc::new(MemoryStore::new()),
            payrolls: Arc::new(MemoryStore::new()),
            performances: Arc::new(MemoryStore::new()),
            documents: Arc::new(MemoryStore::new()),
            projects: Arc::new(MemoryStore::new()),
            reviews: Arc::new(MemoryStore::new()),
        }
    }
}

/// Business knobs that come from configuration.
#[derive(Debug, Clone, Copy)]
pub struct Policy {
    /// Completed days shorter than this are derived as HALF_DAY.
    pub half_day_threshold_minutes: i64,
    pub allow_cancel_approved_leave: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            half_day_threshold_minutes: 240,
            allow_cancel_approved_leave: true,
        }
    }
}

/// Every facade, wired to the same stores, clock and access policy.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub attendance: AttendanceService,
    pub statistics: StatisticsService,
    pub leaves: LeaveService,
    pub payroll: PayrollService,
    pub performance: PerformanceService,
    pub documents: DocumentService,
    pub projects: ProjectService,
    pub reviews: ReviewService,
    pub dashboard: DashboardService,
    clock: Arc<dyn Clock>,
}

impl Services {
    pub fn new(
        stores: Stores,
        clock: Arc<dyn Clock>,
        access: Arc<dyn AccessControl>,
        policy: Policy,
    ) -> Self {
        let guard = Guard::new(stores.users.clone(), access);
        let statistics = StatisticsService::new(&stores, clock.clone());

        Self {
            users: UserService::new(stores.users.clone(), guard.clone(), clock.clone()),
            attendance: AttendanceService::new(
                stores.attendance.clone(),
                stores.users.clone(),
                guard.clone(),
                clock.clone(),
                policy.half_day_threshold_minutes,
            ),
            leaves: LeaveService::new(
                stores.leaves.clone(),
                guard.clone(),
                clock.clone(),
                policy.allow_cancel_approved_leave,
            ),
            payroll: PayrollService::new(
                stores.payrolls.clone(),
                stores.users.clone(),
                stores.attendance.clone(),
                guard.clone(),
                clock.clone(),
            ),
            performance: PerformanceService::new(
                stores.performances.clone(),
                guard.clone(),
                clock.clone(),
            ),
            documents: DocumentService::new(stores.documents.clone(), guard.clone(), clock.clone()),
            projects: ProjectService::new(stores.projects.clone(), guard.clone(), clock.clone()),
            reviews: ReviewService::new(stores.reviews.clone(), guard.clone(), clock.clone()),
            dashboard: DashboardService::new(&stores, statistics.clone()),
            statistics,
            clock,
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }
}

/// Ownership checks shared by every facade.
#[derive(Clone)]
pub struct Guard {
    users: SharedStore<User>,
    access: Arc<dyn AccessControl>,
}

impl Guard {
    pub fn new(users: SharedStore<User>, access: Arc<dyn AccessControl>) -> Self {
        Self { users, access }
    }

    pub fn access(&self) -> &dyn AccessControl {
        self.access.as_ref()
    }

    /// The owning user; fails with `NotFound` when the user does not exist.
    pub async fn owner(&self, user_id: u64) -> ServiceResult<Owner> {
        let user = fetch(self.users.as_ref(), user_id).await?;
        Ok(Owner::of(&user))
    }

    pub async fn allows(&self, caller: &Caller, owner_id: u64, action: Action) -> ServiceResult<bool> {
        match self.users.find_by_id(owner_id).await? {
            Some(user) => Ok(self
                .access
                .can_access_user(caller, &Owner::of(&user), action)),
            // records of removed users are only reachable administratively
            None => Ok(self.access.can_administer(caller)),
        }
    }

    pub async fn require(&self, caller: &Caller, owner_id: u64, action: Action) -> ServiceResult<()> {
        if self.allows(caller, owner_id, action).await? {
            Ok(())
        } else {
            tracing::warn!(caller = caller.user_id, owner_id, ?action, "Access denied");
            Err(ServiceError::NotAuthorized(format!(
                "user {} may not {:?} records of user {}",
                caller.user_id, action, owner_id
            )))
        }
    }

    /// Creator, their manager, or an administrative role.
    pub async fn is_owner(&self, caller: &Caller, owner_id: u64) -> ServiceResult<bool> {
        self.allows(caller, owner_id, Action::Mutate).await
    }
}

/// Load by id or fail with `NotFound`.
pub async fn fetch<T: Entity>(store: &dyn Store<T>, id: u64) -> ServiceResult<T> {
    store
        .find_by_id(id)
        .await?
        .ok_or_else(|| ServiceError::not_found(T::NAME, id))
}

/// Delete by id or fail with `NotFound`.
pub async fn remove<T: Entity>(store: &dyn Store<T>, id: u64) -> ServiceResult<()> {
    if store.delete(id).await? {
        Ok(())
    } else {
        Err(ServiceError::not_found(T::NAME, id))
    }
}
