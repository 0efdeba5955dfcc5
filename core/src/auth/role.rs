// lustre/src/auth/role.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
  MainAdmin,
  SupportAdmin,
  Staff,
  ProductManager,
}

/// Everything an admin surface can do. Checked against `AdminRole::permits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminAction {
  ViewOrders,
  UpdateOrderStatus,
  DeleteOrder,
  ViewReturns,
  UpdateReturnStatus,
  /// Re-approving a rejected return.
  OverrideReturnRejection,
  ManageProducts,
  BroadcastNotification,
  ManageCoupons,
  ManageAdmins,
  ViewDashboard,
}

impl AdminAction {
  pub fn as_str(&self) -> &'static str {
    match self {
      AdminAction::ViewOrders => "view_orders",
      AdminAction::UpdateOrderStatus => "update_order_status",
      AdminAction::DeleteOrder => "delete_order",
      AdminAction::ViewReturns => "view_returns",
      AdminAction::UpdateReturnStatus => "update_return_status",
      AdminAction::OverrideReturnRejection => "override_return_rejection",
      AdminAction::ManageProducts => "manage_products",
      AdminAction::BroadcastNotification => "broadcast_notification",
      AdminAction::ManageCoupons => "manage_coupons",
      AdminAction::ManageAdmins => "manage_admins",
      AdminAction::ViewDashboard => "view_dashboard",
    }
  }
}

impl fmt::Display for AdminAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl AdminRole {
  pub const ALL: [AdminRole; 4] = [
    AdminRole::MainAdmin,
    AdminRole::SupportAdmin,
    AdminRole::Staff,
    AdminRole::ProductManager,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      AdminRole::MainAdmin => "main_admin",
      AdminRole::SupportAdmin => "support_admin",
      AdminRole::Staff => "staff",
      AdminRole::ProductManager => "product_manager",
    }
  }

  pub fn permits(self, action: AdminAction) -> bool {
    use AdminAction::*;
    match self {
      AdminRole::MainAdmin => true,
      AdminRole::SupportAdmin => matches!(
        action,
        ViewOrders | UpdateOrderStatus | ViewReturns | UpdateReturnStatus | ViewDashboard
      ),
      AdminRole::Staff => matches!(action, ViewOrders | UpdateOrderStatus | ViewReturns | ViewDashboard),
      AdminRole::ProductManager => matches!(
        action,
        ManageProducts | BroadcastNotification | ManageCoupons | ViewDashboard | ViewOrders
      ),
    }
  }
}

impl fmt::Display for AdminRole {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for AdminRole {
  type Err = UnknownVariant;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    AdminRole::ALL
      .into_iter()
      .find(|role| role.as_str() == s)
      .ok_or_else(|| UnknownVariant::new("admin role", s))
  }
}
