//! Role/verb access table for the order resource.
//!
//! Instead of branching on the caller's type inside each handler, every
//! (verb, role) pair resolves here to an explicit decision: whether the call
//! is allowed, which rows it may see, and which representation it gets.

use crate::{error::AppError, middleware::auth::AuthUser};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderVerb {
    List,
    Retrieve,
    Create,
    UpdateStatus,
    Delete,
    Pay,
}

/// Which orders the caller may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderScope {
    /// Only orders whose customer maps to the caller's identity.
    Own,
    /// Every order.
    All,
}

/// Which shape the orders are rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderRepr {
    /// Customer-facing: no customer contact block.
    Customer,
    /// Staff-facing: includes the customer block.
    Admin,
}

#[derive(Debug, Clone, Copy)]
pub struct OrderAccess {
    pub allowed: bool,
    pub scope: OrderScope,
    pub repr: OrderRepr,
}

/// The lookup table. Staff get the admin representation and full visibility;
/// status updates and deletion are staff-only verbs.
pub fn order_access(verb: OrderVerb, staff: bool) -> OrderAccess {
    use OrderRepr::{Admin, Customer};
    use OrderScope::{All, Own};
    use OrderVerb::*;

    let (allowed, scope, repr) = match (verb, staff) {
        (List | Retrieve, false) => (true, Own, Customer),
        (List | Retrieve, true) => (true, All, Admin),
        (Create, false) => (true, Own, Customer),
        (Create, true) => (true, Own, Admin),
        (Pay, _) => (true, Own, Customer),
        (UpdateStatus | Delete, true) => (true, All, Admin),
        (UpdateStatus | Delete, false) => (false, Own, Customer),
    };
    OrderAccess {
        allowed,
        scope,
        repr,
    }
}

/// Resolve the caller's access for `verb`, failing with 403 when the table
/// says the verb is not theirs.
pub fn require_order_access(user: &AuthUser, verb: OrderVerb) -> Result<OrderAccess, AppError> {
    let access = order_access(verb, user.staff);
    if !access.allowed {
        return Err(AppError::Forbidden);
    }
    Ok(access)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_see_all_orders_with_admin_repr() {
        let access = order_access(OrderVerb::List, true);
        assert!(access.allowed);
        assert_eq!(access.scope, OrderScope::All);
        assert_eq!(access.repr, OrderRepr::Admin);
    }

    #[test]
    fn regular_users_are_scoped_to_their_own_orders() {
        let access = order_access(OrderVerb::List, false);
        assert!(access.allowed);
        assert_eq!(access.scope, OrderScope::Own);
        assert_eq!(access.repr, OrderRepr::Customer);
    }

    #[test]
    fn mutation_verbs_are_staff_only() {
        assert!(!order_access(OrderVerb::UpdateStatus, false).allowed);
        assert!(!order_access(OrderVerb::Delete, false).allowed);
        assert!(order_access(OrderVerb::UpdateStatus, true).allowed);
        assert!(order_access(OrderVerb::Delete, true).allowed);
    }

    #[test]
    fn everyone_may_pay_their_own_order() {
        for staff in [false, true] {
            let access = order_access(OrderVerb::Pay, staff);
            assert!(access.allowed);
            assert_eq!(access.scope, OrderScope::Own);
        }
    }
}
