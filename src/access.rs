//! Access control
//!
//! One collaborator answers every "may this caller touch that record"
//! question so the role/department rules live in a single place.

use crate::model::role::Role;
use crate::model::user::{Department, User};

/// Identity of whoever is invoking a service operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Caller {
    pub user_id: u64,
    pub role: Role,
    pub department: Department,
}

impl Caller {
    pub fn of(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            department: user.department,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Mutate,
    /// Approve, reject, review or otherwise decide on someone's request.
    Approve,
}

/// The user that owns a record, as far as access rules are concerned.
#[derive(Debug, Clone, PartialEq)]
pub struct Owner {
    pub user_id: u64,
    pub manager_id: Option<u64>,
    pub department: Department,
}

impl Owner {
    pub fn of(user: &User) -> Self {
        Self {
            user_id: user.id,
            manager_id: user.manager_id,
            department: user.department,
        }
    }
}

pub trait AccessControl: Send + Sync {
    fn can_access_user(&self, caller: &Caller, owner: &Owner, action: Action) -> bool;

    fn can_access_department(&self, caller: &Caller, department: Department) -> bool;

    /// Organisation-wide operations: payroll runs, administrative marks.
    fn can_administer(&self, caller: &Caller) -> bool;
}

/// Default policy.
///
/// - ADMIN: everything, including approving own records.
/// - HR: everything except approving own records.
/// - MANAGER: own records and direct reports' records; approves reports only;
///   reads own department.
/// - EMPLOYEE: reads and mutates own records.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoleBasedAccess;

impl AccessControl for RoleBasedAccess {
    fn can_access_user(&self, caller: &Caller, owner: &Owner, action: Action) -> bool {
        let is_self = caller.user_id == owner.user_id;
        let is_manager = owner.manager_id == Some(caller.user_id);

        match (caller.role, action) {
            (Role::Admin, _) => true,
            (Role::Hr, Action::Approve) => !is_self,
            (Role::Hr, _) => true,
            (Role::Manager, Action::Approve) => is_manager,
            (Role::Manager, Action::Read) => is_self || is_manager || caller.department == owner.department,
            (Role::Manager, Action::Mutate) => is_self || is_manager,
            (Role::Employee, Action::Approve) => false,
            (Role::Employee, _) => is_self,
        }
    }

    fn can_access_department(&self, caller: &Caller, department: Department) -> bool {
        match caller.role {
            Role::Admin | Role::Hr => true,
            Role::Manager => caller.department == department,
            Role::Employee => false,
        }
    }

    fn can_administer(&self, caller: &Caller) -> bool {
        caller.role.is_administrative()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(user_id: u64, role: Role) -> Caller {
        Caller {
            user_id,
            role,
            department: Department::Engineering,
        }
    }

    fn owner(user_id: u64, manager_id: Option<u64>) -> Owner {
        Owner {
            user_id,
            manager_id,
            department: Department::Engineering,
        }
    }

    #[test]
    fn employees_only_touch_their_own_records() {
        let acl = RoleBasedAccess;
        let me = caller(1, Role::Employee);
        assert!(acl.can_access_user(&me, &owner(1, None), Action::Mutate));
        assert!(!acl.can_access_user(&me, &owner(2, None), Action::Read));
        assert!(!acl.can_access_user(&me, &owner(1, None), Action::Approve));
        assert!(!acl.can_access_department(&me, Department::Engineering));
    }

    #[test]
    fn managers_approve_direct_reports_only() {
        let acl = RoleBasedAccess;
        let boss = caller(10, Role::Manager);
        assert!(acl.can_access_user(&boss, &owner(2, Some(10)), Action::Approve));
        assert!(!acl.can_access_user(&boss, &owner(3, Some(11)), Action::Mutate));
        assert!(!acl.can_access_user(&boss, &owner(3, Some(11)), Action::Approve));
        assert!(!acl.can_access_user(&boss, &owner(10, None), Action::Approve));
        assert!(acl.can_access_department(&boss, Department::Engineering));
        assert!(!acl.can_access_department(&boss, Department::Finance));
    }

    #[test]
    fn managers_read_their_whole_department() {
        let acl = RoleBasedAccess;
        let boss = caller(10, Role::Manager);
        let peer = owner(3, Some(11));
        let finance = Owner {
            department: Department::Finance,
            ..owner(4, Some(11))
        };

        assert!(acl.can_access_user(&boss, &peer, Action::Read));
        assert_eq!(
            acl.can_access_user(&boss, &peer, Action::Read),
            acl.can_access_department(&boss, peer.department)
        );
        assert!(!acl.can_access_user(&boss, &finance, Action::Read));
        assert!(!acl.can_access_department(&boss, finance.department));
    }

    #[test]
    fn hr_cannot_approve_self_but_admin_can() {
        let acl = RoleBasedAccess;
        assert!(!acl.can_access_user(&caller(5, Role::Hr), &owner(5, None), Action::Approve));
        assert!(acl.can_access_user(&caller(5, Role::Hr), &owner(6, None), Action::Approve));
        assert!(acl.can_access_user(&caller(5, Role::Admin), &owner(5, None), Action::Approve));
        assert!(acl.can_administer(&caller(5, Role::Hr)));
        assert!(!acl.can_administer(&caller(5, Role::Manager)));
    }
}
